//! Listener table and event records.

use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap as HashMap;
use smallvec::SmallVec;

use super::Proxy;
use crate::value::{PropertyBag, Value};

/// Handle returned by [`Proxy::on`], used to remove the listener again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Event listener callable.
pub type Listener = Rc<dyn Fn(&Event)>;

/// Record passed to listeners.
#[derive(Clone)]
pub struct Event {
	name: String,
	target: Proxy,
	fields: PropertyBag,
}

impl Event {
	pub(crate) fn new(name: &str, target: Proxy, fields: PropertyBag) -> Self {
		Self {
			name: name.to_string(),
			target,
			fields,
		}
	}

	/// Event name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// The proxy the event was triggered on.
	pub fn target(&self) -> &Proxy {
		&self.target
	}

	/// Looks up a kind-specific field.
	pub fn get(&self, field: &str) -> Option<&Value> {
		self.fields.get(field)
	}

	/// All kind-specific fields.
	pub fn fields(&self) -> &PropertyBag {
		&self.fields
	}
}

impl fmt::Debug for Event {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Event")
			.field("name", &self.name)
			.field("target", self.target.cid())
			.field("fields", &self.fields)
			.finish()
	}
}

type Entries = SmallVec<[(ListenerId, Listener); 2]>;

/// Event name to ordered listeners.
#[derive(Default)]
pub(crate) struct ListenerTable {
	by_event: HashMap<String, Entries>,
	next_id: u64,
}

impl ListenerTable {
	pub fn next_id(&mut self) -> ListenerId {
		self.next_id += 1;
		ListenerId(self.next_id)
	}

	/// Appends a listener. Returns true if it is the first for `event`.
	pub fn add(&mut self, event: &str, id: ListenerId, listener: Listener) -> bool {
		let entries = self.by_event.entry(event.to_string()).or_default();
		entries.push((id, listener));
		entries.len() == 1
	}

	/// Removes a listener. Returns true if `event` has no listeners left
	/// because of this removal.
	pub fn remove(&mut self, event: &str, id: ListenerId) -> bool {
		let Some(entries) = self.by_event.get_mut(event) else {
			return false;
		};
		let Some(pos) = entries.iter().position(|(lid, _)| *lid == id) else {
			return false;
		};
		entries.remove(pos);
		if entries.is_empty() {
			self.by_event.remove(event);
			return true;
		}
		false
	}

	/// Copies the current listeners for `event` so they can be invoked while
	/// the table is mutated.
	pub fn snapshot(&self, event: &str) -> Vec<Listener> {
		self.by_event
			.get(event)
			.map(|entries| entries.iter().map(|(_, l)| l.clone()).collect())
			.unwrap_or_default()
	}

	pub fn count(&self, event: &str) -> usize {
		self.by_event.get(event).map_or(0, SmallVec::len)
	}

	pub fn clear(&mut self) {
		self.by_event.clear();
	}
}
