//! Buffer for inbound notifications.
//!
//! The native host may produce notifications at any time, including while a
//! blocking request is in flight. They are parked here and only handed to the
//! proxy layer at a processing point, so delivery never interrupts an
//! operation that is already running.

use tokio::sync::mpsc;

use crate::protocol::Notify;

/// Producer half handed to transports and host adapters.
#[derive(Debug, Clone)]
pub struct NotifySender {
	tx: mpsc::UnboundedSender<Notify>,
}

impl NotifySender {
	/// Queues a notification. Returns false if the queue has been dropped.
	pub fn push(&self, notify: Notify) -> bool {
		match self.tx.send(notify) {
			Ok(()) => true,
			Err(err) => {
				tracing::debug!(id = %err.0.id, event = %err.0.event, "notify.dropped_closed");
				false
			}
		}
	}
}

/// Consumer half drained by the command channel.
#[derive(Debug)]
pub struct NotifyQueue {
	rx: mpsc::UnboundedReceiver<Notify>,
}

impl NotifyQueue {
	/// Creates a connected sender/queue pair.
	pub fn new() -> (NotifySender, Self) {
		let (tx, rx) = mpsc::unbounded_channel();
		(NotifySender { tx }, Self { rx })
	}

	/// Takes every notification currently queued, in arrival order.
	pub fn drain(&mut self) -> Vec<Notify> {
		let mut out = Vec::new();
		while let Ok(notify) = self.rx.try_recv() {
			out.push(notify);
		}
		out
	}

	/// Returns true if nothing is waiting.
	pub fn is_empty(&self) -> bool {
		self.rx.is_empty()
	}
}
