//! Hard and soft error types.
//!
//! [`BridgeError`] is returned to the immediate caller and indicates misuse or
//! a broken transport. [`Diagnostic`] describes a recoverable programmer error;
//! it is reported through [`Diagnostics`](crate::Diagnostics) and never
//! interrupts control flow.

use thiserror::Error;
use trellis_rpc::{ProxyId, TransportError};

/// Failures surfaced synchronously to callers of the proxy contract.
#[derive(Debug, Error)]
pub enum BridgeError {
	/// A native operation was attempted on a disposed object.
	#[error("Object is disposed: {id}")]
	Disposed {
		/// Identifier of the disposed object.
		id: ProxyId,
	},

	/// The native host could not be reached or rejected a request.
	#[error(transparent)]
	Transport(#[from] TransportError),
}

/// Result type for proxy operations.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Recoverable programmer error, reported and then ignored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
	/// Read or write of a property the type does not declare.
	#[error("Unknown property \"{property}\" on {type_name}")]
	UnknownProperty {
		/// Native type name of the target.
		type_name: String,
		/// Requested property.
		property: String,
	},

	/// A written value failed coercion.
	#[error("Unsupported value for property \"{property}\" on {type_name}: {reason}")]
	InvalidValue {
		/// Native type name of the target.
		type_name: String,
		/// Written property.
		property: String,
		/// Coercion failure message.
		reason: String,
	},

	/// A value cannot be represented on the wire.
	#[error("Cannot send \"{name}\" to native: {reason}")]
	NotTransmittable {
		/// Property, parameter or method name.
		name: String,
		/// Why the value is not representable.
		reason: String,
	},

	/// An identifier was registered twice.
	#[error("Proxy {id} is already registered")]
	DuplicateRegistration {
		/// The colliding identifier.
		id: ProxyId,
	},

	/// A type-specific rule rejected an operation.
	#[error("{message}")]
	Rejected {
		/// Identifier of the object the rule applies to.
		id: ProxyId,
		/// Human-readable explanation.
		message: String,
	},
}
