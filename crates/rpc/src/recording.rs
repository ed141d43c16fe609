//! In-process stub host that records every operation it receives.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap as HashMap;

use crate::protocol::{NativeClient, OpKind, Operation, ProxyId, WireValue};
use crate::{Result, TransportError};

#[derive(Debug, Default)]
struct LogInner {
	ops: Vec<Operation>,
	batches: usize,
	replies: HashMap<(OpKind, String), WireValue>,
	failure: Option<String>,
}

/// Shared view of everything a [`RecordingClient`] has received.
///
/// Cloning yields another handle to the same log, so tests keep one while the
/// client itself is moved into a channel.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
	inner: Rc<RefCell<LogInner>>,
}

impl CallLog {
	/// Returns every recorded operation in arrival order.
	pub fn calls(&self) -> Vec<Operation> {
		self.inner.borrow().ops.clone()
	}

	/// Returns operations of `kind`, optionally restricted to target `id`.
	pub fn matching(&self, kind: OpKind, id: Option<&ProxyId>) -> Vec<Operation> {
		self.inner
			.borrow()
			.ops
			.iter()
			.filter(|op| op.kind() == kind && id.is_none_or(|id| op.id() == id))
			.cloned()
			.collect()
	}

	/// Returns every operation targeting `id`.
	pub fn for_id(&self, id: &ProxyId) -> Vec<Operation> {
		self.inner
			.borrow()
			.ops
			.iter()
			.filter(|op| op.id() == id)
			.cloned()
			.collect()
	}

	/// Number of recorded operations.
	pub fn len(&self) -> usize {
		self.inner.borrow().ops.len()
	}

	/// Returns true if nothing has been recorded.
	pub fn is_empty(&self) -> bool {
		self.inner.borrow().ops.is_empty()
	}

	/// Number of non-empty batches delivered through `send`.
	pub fn batches(&self) -> usize {
		self.inner.borrow().batches
	}

	/// Forgets recorded operations; canned replies are kept.
	pub fn reset(&self) {
		let mut inner = self.inner.borrow_mut();
		inner.ops.clear();
		inner.batches = 0;
	}

	/// Answers future `get` operations for `property` with `value`.
	pub fn reply_get(&self, property: &str, value: WireValue) {
		self.inner
			.borrow_mut()
			.replies
			.insert((OpKind::Get, property.to_string()), value);
	}

	/// Answers future `call` operations for `method` with `value`.
	pub fn reply_call(&self, method: &str, value: WireValue) {
		self.inner
			.borrow_mut()
			.replies
			.insert((OpKind::Call, method.to_string()), value);
	}

	/// Makes every future request fail with a host error.
	pub fn fail_requests(&self, message: &str) {
		self.inner.borrow_mut().failure = Some(message.to_string());
	}
}

/// [`NativeClient`] that records operations instead of driving a host.
#[derive(Debug, Clone, Default)]
pub struct RecordingClient {
	log: CallLog,
}

impl RecordingClient {
	/// Creates a client and returns it together with its log handle.
	pub fn new() -> (Self, CallLog) {
		let client = Self::default();
		let log = client.log.clone();
		(client, log)
	}
}

impl NativeClient for RecordingClient {
	fn send(&mut self, batch: Vec<Operation>) -> Result<()> {
		if batch.is_empty() {
			return Ok(());
		}
		let mut inner = self.log.inner.borrow_mut();
		inner.batches += 1;
		inner.ops.extend(batch);
		Ok(())
	}

	fn request(&mut self, op: Operation) -> Result<WireValue> {
		let mut inner = self.log.inner.borrow_mut();
		let key = match &op {
			Operation::Get { property, .. } => (OpKind::Get, property.clone()),
			Operation::Call { method, .. } => (OpKind::Call, method.clone()),
			other => {
				return Err(TransportError::UnexpectedFrame(format!(
					"{:?} is not a request",
					other.kind()
				)));
			}
		};
		inner.ops.push(op);
		if let Some(message) = &inner.failure {
			return Err(TransportError::Host(message.clone()));
		}
		Ok(inner.replies.get(&key).cloned().unwrap_or(WireValue::Null))
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::protocol::Properties;

	#[test]
	fn records_batches_and_requests_in_order() {
		let (mut client, log) = RecordingClient::new();
		let id = ProxyId::from("$1");
		client
			.send(vec![Operation::Create {
				id: id.clone(),
				type_name: "T".into(),
				properties: Properties::new(),
			}])
			.unwrap();
		client
			.request(Operation::Get {
				id: id.clone(),
				property: "x".into(),
			})
			.unwrap();

		let kinds: Vec<_> = log.calls().iter().map(Operation::kind).collect();
		assert_eq!(kinds, vec![OpKind::Create, OpKind::Get]);
		assert_eq!(log.batches(), 1);
		assert_eq!(log.matching(OpKind::Get, Some(&id)).len(), 1);
	}

	#[test]
	fn canned_replies() {
		let (mut client, log) = RecordingClient::new();
		log.reply_call("measure", json!(42));
		let value = client
			.request(Operation::Call {
				id: ProxyId::from("$1"),
				method: "measure".into(),
				parameters: Properties::new(),
			})
			.unwrap();
		assert_eq!(value, json!(42));
	}

	#[test]
	fn unknown_get_answers_null() {
		let (mut client, _log) = RecordingClient::new();
		let value = client
			.request(Operation::Get {
				id: ProxyId::from("$1"),
				property: "missing".into(),
			})
			.unwrap();
		assert_eq!(value, WireValue::Null);
	}

	#[test]
	fn failing_requests() {
		let (mut client, log) = RecordingClient::new();
		log.fail_requests("boom");
		let result = client.request(Operation::Get {
			id: ProxyId::from("$1"),
			property: "x".into(),
		});
		assert!(matches!(result, Err(TransportError::Host(_))));
	}
}
