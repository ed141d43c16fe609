//! Operation records and the native host seam.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Value crossing the bridge boundary.
///
/// Restricted to primitives, strings, arrays and records of these. Proxies
/// travel as their [`ProxyId`] string, never as live references.
pub type WireValue = serde_json::Value;

/// Insertion-ordered property or parameter bag.
pub type Properties = IndexMap<String, WireValue>;

/// Simple counter-based ID generator.
///
/// Used for request sequence numbers on framed transports.
#[derive(Debug, Default, Clone, Copy)]
pub struct CounterIdGen(pub u64);

impl CounterIdGen {
	/// Creates a new counter starting at 0.
	#[must_use]
	pub const fn new() -> Self {
		Self(0)
	}

	/// Generates the next unique ID and increments the counter.
	#[allow(clippy::should_implement_trait, reason = "convention")]
	pub fn next(&mut self) -> u64 {
		let id = self.0;
		self.0 += 1;
		id
	}
}

/// Opaque identifier correlating a proxy with its native counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProxyId(String);

impl ProxyId {
	/// Returns the identifier as sent over the wire.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for ProxyId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for ProxyId {
	fn from(value: &str) -> Self {
		Self(value.to_string())
	}
}

/// Mints process-unique proxy identifiers.
///
/// Identifiers are `prefix` followed by a counter starting at 1. They are
/// never reused for the lifetime of the allocator.
#[derive(Debug, Clone)]
pub struct IdAllocator {
	prefix: String,
	counter: CounterIdGen,
}

impl Default for IdAllocator {
	fn default() -> Self {
		Self::new("$")
	}
}

impl IdAllocator {
	/// Creates an allocator that prefixes every identifier with `prefix`.
	pub fn new(prefix: impl Into<String>) -> Self {
		Self {
			prefix: prefix.into(),
			counter: CounterIdGen(1),
		}
	}

	/// Returns the next unused identifier.
	pub fn allocate(&mut self) -> ProxyId {
		ProxyId(format!("{}{}", self.prefix, self.counter.next()))
	}
}

/// Discriminant of an [`Operation`], used for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
	/// Native object construction.
	Create,
	/// Property write.
	Set,
	/// Property read.
	Get,
	/// Method invocation.
	Call,
	/// Event subscription toggle.
	Listen,
	/// Native object destruction.
	Destroy,
}

impl OpKind {
	/// Returns true for kinds that block for a reply from the host.
	pub fn is_blocking(self) -> bool {
		matches!(self, OpKind::Get | OpKind::Call)
	}
}

/// A single outbound operation against one native object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Operation {
	/// Construct a native object of `type_name` with initial properties.
	Create {
		/// Target identifier.
		id: ProxyId,
		/// Native type name.
		#[serde(rename = "type")]
		type_name: String,
		/// Initial properties, applied atomically with construction.
		properties: Properties,
	},
	/// Write one or more properties.
	Set {
		/// Target identifier.
		id: ProxyId,
		/// Properties in application order.
		properties: Properties,
	},
	/// Read one property.
	Get {
		/// Target identifier.
		id: ProxyId,
		/// Property name.
		property: String,
	},
	/// Invoke a native method.
	Call {
		/// Target identifier.
		id: ProxyId,
		/// Method name.
		method: String,
		/// Method parameters.
		parameters: Properties,
	},
	/// Toggle native delivery of one event.
	Listen {
		/// Target identifier.
		id: ProxyId,
		/// Event name.
		event: String,
		/// Whether the event should be delivered.
		listen: bool,
	},
	/// Destroy the native object. Terminal for `id`.
	Destroy {
		/// Target identifier.
		id: ProxyId,
	},
}

impl Operation {
	/// Returns the identifier this operation targets.
	pub fn id(&self) -> &ProxyId {
		match self {
			Operation::Create { id, .. }
			| Operation::Set { id, .. }
			| Operation::Get { id, .. }
			| Operation::Call { id, .. }
			| Operation::Listen { id, .. }
			| Operation::Destroy { id } => id,
		}
	}

	/// Returns the operation kind.
	pub fn kind(&self) -> OpKind {
		match self {
			Operation::Create { .. } => OpKind::Create,
			Operation::Set { .. } => OpKind::Set,
			Operation::Get { .. } => OpKind::Get,
			Operation::Call { .. } => OpKind::Call,
			Operation::Listen { .. } => OpKind::Listen,
			Operation::Destroy { .. } => OpKind::Destroy,
		}
	}

	/// Returns the property bag of a create or set operation.
	pub fn properties(&self) -> Option<&Properties> {
		match self {
			Operation::Create { properties, .. } | Operation::Set { properties, .. } => {
				Some(properties)
			}
			_ => None,
		}
	}

	/// Merges a property write into this operation if it is a pending
	/// create or set for `target`. Returns false when the write must be
	/// queued as a separate operation.
	///
	/// A property already present is never absorbed: replacing it in place or
	/// moving it would reorder it relative to the writes that followed it.
	pub fn absorb_set(&mut self, target: &ProxyId, name: &str, value: &WireValue) -> bool {
		match self {
			Operation::Create { id, properties, .. } | Operation::Set { id, properties }
				if *id == *target && !properties.contains_key(name) =>
			{
				properties.insert(name.to_string(), value.clone());
				true
			}
			_ => false,
		}
	}
}

/// Asynchronous event delivered by the native host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notify {
	/// Identifier of the object the event originates from.
	pub id: ProxyId,
	/// Event name.
	pub event: String,
	/// Event-specific fields.
	#[serde(default)]
	pub payload: Properties,
}

/// Connection to the native host.
///
/// Fire-and-forget operations arrive in batches through [`send`](Self::send),
/// in issue order. Blocking operations (get, call) arrive through
/// [`request`](Self::request) after every earlier batch has been sent.
pub trait NativeClient {
	/// Delivers a batch of create, set, listen and destroy operations.
	fn send(&mut self, batch: Vec<Operation>) -> Result<()>;

	/// Delivers a get or call operation and waits for the host's answer.
	fn request(&mut self, op: Operation) -> Result<WireValue>;
}

impl<C: NativeClient + ?Sized> NativeClient for Box<C> {
	fn send(&mut self, batch: Vec<Operation>) -> Result<()> {
		(**self).send(batch)
	}

	fn request(&mut self, op: Operation) -> Result<WireValue> {
		(**self).request(op)
	}
}
