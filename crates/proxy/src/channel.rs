//! Ordered operation channel to the native host.
//!
//! Fire-and-forget operations (create, set, listen, destroy) are queued in
//! issue order and delivered as one batch at the next flush. Blocking
//! operations (get, call) flush the queue first so the host always observes
//! operations in the order they were issued.
//!
//! Inbound notifications are parked in a [`NotifyQueue`] and dispatched only
//! from [`CommandChannel::process`], never from inside another operation.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashSet as HashSet;
use trellis_config::{BatchConfig, BridgeConfig};
use trellis_rpc::{
	IdAllocator, NativeClient, NotifyQueue, NotifySender, OpKind, Operation, Properties, ProxyId,
	WireValue,
};

use crate::diagnostics::Diagnostics;
use crate::error::{BridgeError, Result};
use crate::registry::ProxyRegistry;
use crate::value::Value;

struct Shared {
	client: RefCell<Box<dyn NativeClient>>,
	pending: RefCell<Vec<Operation>>,
	ids: RefCell<IdAllocator>,
	destroyed: RefCell<HashSet<ProxyId>>,
	inbound: RefCell<NotifyQueue>,
	notify_tx: NotifySender,
	registry: ProxyRegistry,
	diagnostics: Diagnostics,
	batch: BatchConfig,
}

/// Handle to the command channel.
///
/// Cloning yields another handle to the same channel. One channel exists per
/// running application; every proxy holds a handle to the channel it was
/// created on.
#[derive(Clone)]
pub struct CommandChannel {
	shared: Rc<Shared>,
}

impl std::fmt::Debug for CommandChannel {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CommandChannel")
			.field("pending", &self.shared.pending.borrow().len())
			.field("registered", &self.shared.registry.len())
			.finish()
	}
}

impl CommandChannel {
	/// Creates a channel with its own notification queue.
	pub fn new(client: impl NativeClient + 'static, config: &BridgeConfig) -> Self {
		let (tx, queue) = NotifyQueue::new();
		Self::with_notify_queue(client, tx, queue, config)
	}

	/// Creates a channel draining a queue whose sender was already handed to
	/// `client` (for example a [`StreamClient`](trellis_rpc::StreamClient)).
	pub fn with_notify_queue(
		client: impl NativeClient + 'static,
		notify_tx: NotifySender,
		inbound: NotifyQueue,
		config: &BridgeConfig,
	) -> Self {
		Self {
			shared: Rc::new(Shared {
				client: RefCell::new(Box::new(client)),
				pending: RefCell::new(Vec::new()),
				ids: RefCell::new(IdAllocator::new(config.ids.prefix.clone())),
				destroyed: RefCell::new(HashSet::default()),
				inbound: RefCell::new(inbound),
				notify_tx,
				registry: ProxyRegistry::new(),
				diagnostics: Diagnostics::new(config.diagnostics.history),
				batch: config.batch.clone(),
			}),
		}
	}

	/// Mints a fresh proxy identifier.
	pub fn allocate_id(&self) -> ProxyId {
		self.shared.ids.borrow_mut().allocate()
	}

	/// Registry resolving identifiers created on this channel.
	pub fn registry(&self) -> &ProxyRegistry {
		&self.shared.registry
	}

	/// Soft-error funnel shared by every proxy on this channel.
	pub fn diagnostics(&self) -> &Diagnostics {
		&self.shared.diagnostics
	}

	/// Sender for hosts that deliver notifications out of band.
	pub fn notify_sender(&self) -> NotifySender {
		self.shared.notify_tx.clone()
	}

	/// Returns true once `destroy` has been issued for `id`.
	pub fn is_destroyed(&self, id: &ProxyId) -> bool {
		self.shared.destroyed.borrow().contains(id)
	}

	/// Number of operations waiting for the next flush.
	pub fn pending_len(&self) -> usize {
		self.shared.pending.borrow().len()
	}

	/// Queues construction of a native object.
	pub fn create(&self, id: &ProxyId, type_name: &str, properties: Properties) -> Result<()> {
		self.ensure_open(id)?;
		self.push(Operation::Create {
			id: id.clone(),
			type_name: type_name.to_string(),
			properties,
		})
	}

	/// Queues a property write.
	///
	/// A write for the target of the most recently queued create is folded into
	/// that create. With `merge_sets` enabled, the same applies to a trailing set.
	pub fn set(&self, id: &ProxyId, name: &str, value: WireValue) -> Result<()> {
		self.ensure_open(id)?;
		tracing::trace!(id = %id, property = name, "channel.set");
		{
			let mut pending = self.shared.pending.borrow_mut();
			if let Some(last) = pending.last_mut()
				&& (self.shared.batch.merge_sets || last.kind() == OpKind::Create)
				&& last.absorb_set(id, name, &value)
			{
				return Ok(());
			}
		}
		let mut properties = Properties::new();
		properties.insert(name.to_string(), value);
		self.push(Operation::Set {
			id: id.clone(),
			properties,
		})
	}

	/// Reads a property from the native object, blocking for the answer.
	pub fn get(&self, id: &ProxyId, name: &str) -> Result<WireValue> {
		self.ensure_open(id)?;
		self.request(Operation::Get {
			id: id.clone(),
			property: name.to_string(),
		})
	}

	/// Invokes a native method, blocking for its result.
	pub fn call(&self, id: &ProxyId, method: &str, parameters: Properties) -> Result<WireValue> {
		self.ensure_open(id)?;
		self.request(Operation::Call {
			id: id.clone(),
			method: method.to_string(),
			parameters,
		})
	}

	/// Queues a toggle of native delivery for `event`.
	pub fn listen(&self, id: &ProxyId, event: &str, enabled: bool) -> Result<()> {
		self.ensure_open(id)?;
		self.push(Operation::Listen {
			id: id.clone(),
			event: event.to_string(),
			listen: enabled,
		})
	}

	/// Queues destruction of the native object.
	///
	/// Destroying an identifier twice is a no-op.
	pub fn destroy(&self, id: &ProxyId) -> Result<()> {
		if !self.shared.destroyed.borrow_mut().insert(id.clone()) {
			return Ok(());
		}
		self.push(Operation::Destroy { id: id.clone() })
	}

	/// Delivers every queued operation to the host as one batch.
	pub fn flush(&self) -> Result<()> {
		let batch = std::mem::take(&mut *self.shared.pending.borrow_mut());
		if batch.is_empty() {
			return Ok(());
		}
		tracing::trace!(len = batch.len(), "channel.flush");
		self.shared.client.borrow_mut().send(batch)?;
		Ok(())
	}

	/// Processing point: flushes outbound operations, then dispatches every
	/// queued notification to its proxy.
	///
	/// Notifications for identifiers that are no longer registered are
	/// dropped. Returns the number of notifications delivered.
	pub fn process(&self) -> Result<usize> {
		self.flush()?;
		let drained = self.shared.inbound.borrow_mut().drain();
		let mut delivered = 0;
		for notify in drained {
			let Some(proxy) = self.shared.registry.find(&notify.id) else {
				tracing::debug!(id = %notify.id, event = %notify.event, "channel.notify_unresolved");
				continue;
			};
			let fields = Value::bag_from_wire(notify.payload);
			if let Err(err) = proxy.handle_notify(&notify.event, fields) {
				tracing::warn!(id = %notify.id, event = %notify.event, error = %err, "channel.notify_failed");
			}
			delivered += 1;
		}
		if delivered > 0 {
			self.flush()?;
		}
		Ok(delivered)
	}

	fn ensure_open(&self, id: &ProxyId) -> Result<()> {
		if self.is_destroyed(id) {
			return Err(BridgeError::Disposed { id: id.clone() });
		}
		Ok(())
	}

	// Flushes before appending so the newest operation stays queued and can
	// still absorb later sets.
	fn push(&self, op: Operation) -> Result<()> {
		let max_len = self.shared.batch.max_len;
		if max_len > 0 && self.pending_len() >= max_len {
			self.flush()?;
		}
		self.shared.pending.borrow_mut().push(op);
		Ok(())
	}

	fn request(&self, op: Operation) -> Result<WireValue> {
		self.flush()?;
		tracing::trace!(kind = ?op.kind(), id = %op.id(), "channel.request");
		Ok(self.shared.client.borrow_mut().request(op)?)
	}
}
