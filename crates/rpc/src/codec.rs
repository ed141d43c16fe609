//! Line-delimited JSON framing.
//!
//! Every frame is a single JSON document terminated by `\n`. Outbound frames
//! carry either a batch of fire-and-forget operations or one blocking request
//! tagged with a sequence number; inbound frames carry replies correlated by
//! that number, or notifications keyed by proxy identifier.

use std::io::{BufRead, Write};

use serde::{Deserialize, Serialize};

use crate::protocol::{Notify, Operation, WireValue};
use crate::{Result, TransportError};

/// Frame written to the native host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Outbound {
	/// Ordered fire-and-forget operations.
	Batch {
		/// Operations in issue order.
		ops: Vec<Operation>,
	},
	/// A get or call awaiting a reply.
	Request {
		/// Correlation number echoed by the reply.
		seq: u64,
		/// The blocking operation.
		op: Operation,
	},
}

/// Frame read from the native host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Inbound {
	/// Successful answer to a request.
	Reply {
		/// Sequence number of the request being answered.
		seq: u64,
		/// Returned value.
		#[serde(default)]
		value: WireValue,
	},
	/// Failed answer to a request.
	Error {
		/// Sequence number of the request being answered.
		seq: u64,
		/// Host-provided description.
		message: String,
	},
	/// Asynchronous event.
	Notify(Notify),
}

/// Writes one frame followed by a newline and flushes.
pub fn write_frame(output: &mut impl Write, frame: &Outbound) -> Result<()> {
	serde_json::to_writer(&mut *output, frame)?;
	output.write_all(b"\n")?;
	output.flush()?;
	Ok(())
}

/// Reads the next non-empty line as an inbound frame.
///
/// Returns [`TransportError::Closed`] at end of stream.
pub fn read_frame(input: &mut impl BufRead) -> Result<Inbound> {
	let mut line = String::new();
	loop {
		line.clear();
		if input.read_line(&mut line)? == 0 {
			return Err(TransportError::Closed);
		}
		let trimmed = line.trim();
		if !trimmed.is_empty() {
			return Ok(serde_json::from_str(trimmed)?);
		}
	}
}
