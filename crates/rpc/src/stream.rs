//! [`NativeClient`] over a byte stream pair.

use std::io::{BufRead, Write};

use crate::codec::{self, Inbound, Outbound};
use crate::protocol::{CounterIdGen, NativeClient, Operation, WireValue};
use crate::queue::NotifySender;
use crate::{Result, TransportError};

/// Line-framed JSON client talking to a host process over `input`/`output`.
///
/// Requests are correlated by sequence number. Notifications that arrive while
/// a reply is awaited are forwarded to the notify queue untouched; they are
/// dispatched later, at the channel's next processing point.
pub struct StreamClient<R, W> {
	input: R,
	output: W,
	seq: CounterIdGen,
	notify: NotifySender,
}

impl<R: BufRead, W: Write> StreamClient<R, W> {
	/// Creates a client reading frames from `input` and writing to `output`.
	pub fn new(input: R, output: W, notify: NotifySender) -> Self {
		Self {
			input,
			output,
			seq: CounterIdGen::new(),
			notify,
		}
	}

	/// Reads frames until none are buffered, queueing notifications.
	///
	/// Used by hosts that push events without a pending request. Stops at the
	/// first frame that is not a notification.
	pub fn pump_notifications(&mut self) -> Result<usize> {
		let mut count = 0;
		while !self.input.fill_buf()?.is_empty() {
			match codec::read_frame(&mut self.input)? {
				Inbound::Notify(notify) => {
					self.notify.push(notify);
					count += 1;
				}
				other => return Err(TransportError::UnexpectedFrame(format!("{other:?}"))),
			}
		}
		Ok(count)
	}

	/// Consumes the client, returning the underlying streams.
	pub fn into_inner(self) -> (R, W) {
		(self.input, self.output)
	}
}

impl<R: BufRead, W: Write> NativeClient for StreamClient<R, W> {
	fn send(&mut self, batch: Vec<Operation>) -> Result<()> {
		if batch.is_empty() {
			return Ok(());
		}
		tracing::trace!(len = batch.len(), "stream.batch");
		codec::write_frame(&mut self.output, &Outbound::Batch { ops: batch })
	}

	fn request(&mut self, op: Operation) -> Result<WireValue> {
		let seq = self.seq.next();
		tracing::trace!(seq, kind = ?op.kind(), id = %op.id(), "stream.request");
		codec::write_frame(&mut self.output, &Outbound::Request { seq, op })?;

		loop {
			match codec::read_frame(&mut self.input)? {
				Inbound::Notify(notify) => {
					self.notify.push(notify);
				}
				Inbound::Reply { seq: got, value } if got == seq => return Ok(value),
				Inbound::Error { seq: got, message } if got == seq => {
					return Err(TransportError::Host(message));
				}
				Inbound::Reply { seq: got, .. } | Inbound::Error { seq: got, .. } => {
					return Err(TransportError::UnexpectedFrame(format!(
						"reply for request {got} while awaiting {seq}"
					)));
				}
			}
		}
	}
}
