//! Transport error types.

use thiserror::Error;

/// Failures raised while moving operations to or from the native host.
#[derive(Debug, Error)]
pub enum TransportError {
	/// Reading from or writing to the underlying stream failed.
	#[error("transport I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// A frame could not be encoded or decoded.
	#[error("malformed frame: {0}")]
	Codec(#[from] serde_json::Error),

	/// The native host answered a request with an error.
	#[error("native host error: {0}")]
	Host(String),

	/// A frame arrived that does not fit the current exchange.
	#[error("unexpected frame: {0}")]
	UnexpectedFrame(String),

	/// The host closed the connection.
	#[error("connection to native host closed")]
	Closed,
}

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;
