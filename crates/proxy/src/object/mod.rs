//! Proxy object base
//!
//! A [`Proxy`] is the script-side stand-in for one native object. It owns the
//! property cache and listener table, resolves reads and writes through its
//! type's [`PropertySchema`](crate::property::PropertySchema) and forwards
//! native work through the [`CommandChannel`] it was created on.
//!
//! # Lifecycle
//!
//! `Constructing -> Live -> Disposed`. Construction allocates an identifier,
//! registers it, queues the create and applies the initial properties, which
//! merge into the pending create. Disposal triggers `dispose` listeners while
//! the object is still intact, then queues the destroy and unregisters.
//! Native forwarding on a disposed proxy fails with
//! [`BridgeError::Disposed`] before anything is queued.

mod events;
mod kind;
mod lifecycle;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap as HashMap;
use trellis_rpc::{Properties, ProxyId, WireValue};

pub use self::events::{Event, Listener, ListenerId};
use self::events::ListenerTable;
pub use self::kind::{
	CHANGE_EVENT_PREFIX, DISPOSE_EVENT, ProxyKind, ProxyType, default_native_event,
};
pub use self::lifecycle::Lifecycle;
use crate::channel::CommandChannel;
use crate::error::{BridgeError, Diagnostic, Result};
use crate::property::{DefaultValue, Mirror};
use crate::registry::AlreadyRegistered;
use crate::value::{PropertyBag, Value};

pub(crate) struct ProxyInner {
	id: ProxyId,
	kind: Rc<dyn ProxyKind>,
	channel: CommandChannel,
	lifecycle: Cell<Lifecycle>,
	disposing: Cell<bool>,
	cache: RefCell<HashMap<String, Value>>,
	listeners: RefCell<ListenerTable>,
	/// Script events with listeners, per native event they depend on.
	native_subs: RefCell<HashMap<String, usize>>,
}

impl fmt::Debug for ProxyInner {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ProxyInner")
			.field("id", &self.id)
			.field("type", &self.kind.native_type())
			.field("lifecycle", &self.lifecycle.get())
			.finish_non_exhaustive()
	}
}

/// Handle to a script-side proxy.
///
/// Cloning yields another handle to the same proxy; equality is identity.
#[derive(Clone)]
pub struct Proxy {
	inner: Rc<ProxyInner>,
}

impl PartialEq for Proxy {
	fn eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.inner, &other.inner)
	}
}

impl fmt::Debug for Proxy {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Proxy({} {})", self.inner.kind.native_type(), self.inner.id)
	}
}

impl Proxy {
	/// Constructs a proxy of `kind` on `channel` with the given initial
	/// properties.
	///
	/// Exactly one create is queued; the coerced initial properties are carried
	/// by it in the type's apply order. If applying them fails, the proxy is
	/// disposed before the error is returned.
	pub fn create(
		channel: &CommandChannel,
		kind: Rc<dyn ProxyKind>,
		properties: PropertyBag,
	) -> Result<Proxy> {
		let id = channel.allocate_id();
		let proxy = Proxy {
			inner: Rc::new(ProxyInner {
				id: id.clone(),
				kind: Rc::clone(&kind),
				channel: channel.clone(),
				lifecycle: Cell::new(Lifecycle::Constructing),
				disposing: Cell::new(false),
				cache: RefCell::new(HashMap::default()),
				listeners: RefCell::new(ListenerTable::default()),
				native_subs: RefCell::new(HashMap::default()),
			}),
		};
		if let Err(AlreadyRegistered(id)) = channel.registry().register(id.clone(), &proxy) {
			channel
				.diagnostics()
				.emit(Diagnostic::DuplicateRegistration { id });
		}

		let mut properties = properties;
		kind.initial_properties(&mut properties);
		tracing::debug!(id = %id, type_name = kind.native_type(), "proxy.create");
		if let Err(err) = channel.create(&id, kind.native_type(), Properties::new()) {
			channel.registry().remove(&id);
			return Err(err);
		}
		if let Err(err) = proxy.set_all(properties) {
			tracing::debug!(id = %id, error = %err, "proxy.create_failed");
			// The create is already queued, so the native side is torn down too.
			if let Err(cleanup) = proxy.dispose() {
				tracing::warn!(id = %id, error = %cleanup, "proxy.create_cleanup_failed");
			}
			return Err(err);
		}
		proxy.inner.lifecycle.set(Lifecycle::Live);
		Ok(proxy)
	}

	/// Identifier shared with the native object.
	pub fn cid(&self) -> &ProxyId {
		&self.inner.id
	}

	/// Type behavior of this proxy.
	pub fn kind(&self) -> &Rc<dyn ProxyKind> {
		&self.inner.kind
	}

	/// Channel this proxy was created on.
	pub fn channel(&self) -> &CommandChannel {
		&self.inner.channel
	}

	pub fn lifecycle(&self) -> Lifecycle {
		self.inner.lifecycle.get()
	}

	pub fn is_disposed(&self) -> bool {
		self.lifecycle() == Lifecycle::Disposed
	}

	/// Reads a property.
	///
	/// Returns `None` for undeclared names (after a diagnostic). A custom
	/// getter wins; native-read properties query the host; otherwise the cached
	/// value or the default is returned.
	pub fn get(&self, name: &str) -> Result<Option<Value>> {
		self.ensure_open()?;
		let kind = Rc::clone(&self.inner.kind);
		let Some(def) = kind.schema().get(name) else {
			self.unknown_property(name);
			return Ok(None);
		};
		if let Some(getter) = def.custom_getter() {
			return getter(self, name).map(Some);
		}
		if def.is_native_read() {
			let wire = self.native_get(name)?;
			return Ok(Some(def.ty().decode(wire, self.inner.channel.registry())));
		}
		if let Some(value) = self.stored_property(name) {
			return Ok(Some(value));
		}
		let value = match def.default() {
			None => Value::Null,
			Some(DefaultValue::Value(value)) => value.clone(),
			Some(DefaultValue::Lazy(make)) => {
				let value = make();
				self.store_property(name, value.clone());
				value
			}
		};
		Ok(Some(value))
	}

	/// Writes a property.
	///
	/// Undeclared names and values failing coercion are reported as
	/// diagnostics and leave state untouched.
	pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<()> {
		self.ensure_open()?;
		let value = value.into();
		let kind = Rc::clone(&self.inner.kind);
		let Some(def) = kind.schema().get(name) else {
			self.unknown_property(name);
			return Ok(());
		};
		if let Some(setter) = def.custom_setter() {
			return setter(self, name, value);
		}

		let coerced = match def.ty().coerce(value) {
			Ok(coerced) => coerced,
			Err(reason) => {
				self.diagnose(Diagnostic::InvalidValue {
					type_name: kind.native_type().to_string(),
					property: name.to_string(),
					reason,
				});
				return Ok(());
			}
		};
		let wire = match def.mirror() {
			Mirror::Local => None,
			Mirror::Native => match coerced.to_wire() {
				Ok(wire) => Some(wire),
				Err(reason) => {
					self.diagnose(Diagnostic::NotTransmittable {
						name: name.to_string(),
						reason,
					});
					return Ok(());
				}
			},
		};

		let previous = self
			.inner
			.cache
			.borrow_mut()
			.insert(name.to_string(), coerced.clone());
		if let Some(wire) = wire {
			self.inner.channel.set(&self.inner.id, name, wire)?;
		}
		if previous.as_ref() != Some(&coerced) {
			self.trigger_change_event(name, coerced);
		}
		Ok(())
	}

	/// Writes several properties, honoring the type's apply order.
	pub fn set_all(&self, properties: PropertyBag) -> Result<()> {
		let kind = Rc::clone(&self.inner.kind);
		let order: Vec<String> = kind
			.schema()
			.reorder(properties.keys().map(String::as_str))
			.into_iter()
			.map(str::to_string)
			.collect();
		let mut properties = properties;
		for name in order {
			if let Some(value) = properties.shift_remove(&name) {
				self.set(&name, value)?;
			}
		}
		Ok(())
	}

	/// Registers `listener` for `event`.
	///
	/// The first listener for an event that depends on a native event
	/// subscribes to it. On a disposed proxy this is inert.
	pub fn on(&self, event: &str, listener: impl Fn(&Event) + 'static) -> Result<ListenerId> {
		let (id, first) = {
			let mut listeners = self.inner.listeners.borrow_mut();
			let id = listeners.next_id();
			if self.is_disposed() {
				return Ok(id);
			}
			(id, listeners.add(event, id, Rc::new(listener)))
		};
		if first && let Some(native) = self.inner.kind.native_event(event) {
			self.subscribe(native)?;
		}
		Ok(id)
	}

	/// Removes a listener. Removing the last listener for an event releases
	/// its native subscription. On a disposed proxy this is a no-op.
	pub fn off(&self, event: &str, listener: ListenerId) -> Result<()> {
		if self.is_disposed() {
			return Ok(());
		}
		let last = self.inner.listeners.borrow_mut().remove(event, listener);
		if last && let Some(native) = self.inner.kind.native_event(event) {
			self.unsubscribe(native)?;
		}
		Ok(())
	}

	/// Number of listeners currently registered for `event`.
	pub fn listener_count(&self, event: &str) -> usize {
		self.inner.listeners.borrow().count(event)
	}

	/// Invokes the listeners registered for `event` in registration order.
	///
	/// The listener list is captured before the first call, so listeners may
	/// add or remove listeners, or dispose the proxy.
	pub fn trigger(&self, event: &str, fields: PropertyBag) {
		let listeners = self.inner.listeners.borrow().snapshot(event);
		if listeners.is_empty() {
			return;
		}
		tracing::trace!(id = %self.inner.id, event, count = listeners.len(), "proxy.trigger");
		let record = Event::new(event, self.clone(), fields);
		for listener in listeners {
			listener(&record);
		}
	}

	/// Triggers `change:<name>` with the new value.
	pub fn trigger_change_event(&self, name: &str, value: Value) {
		let mut fields = PropertyBag::new();
		fields.insert("value".to_string(), value);
		self.trigger(&format!("{CHANGE_EVENT_PREFIX}{name}"), fields);
	}

	/// Disposes the proxy and its native object.
	///
	/// Idempotent, including when called from a `dispose` listener.
	pub fn dispose(&self) -> Result<()> {
		if self.is_disposed() || self.inner.disposing.replace(true) {
			return Ok(());
		}
		tracing::debug!(id = %self.inner.id, "proxy.dispose");
		self.trigger(DISPOSE_EVENT, PropertyBag::new());

		let destroyed = self.inner.channel.destroy(&self.inner.id);
		self.inner.channel.registry().remove(&self.inner.id);
		self.inner.listeners.borrow_mut().clear();
		self.inner.native_subs.borrow_mut().clear();
		self.inner.cache.borrow_mut().clear();
		self.inner.lifecycle.set(Lifecycle::Disposed);
		destroyed
	}

	/// Cached value of `name`, without defaults or accessors.
	pub fn stored_property(&self, name: &str) -> Option<Value> {
		self.inner.cache.borrow().get(name).cloned()
	}

	/// Stores `value` in the cache without forwarding it.
	pub fn store_property(&self, name: &str, value: Value) {
		self.inner.cache.borrow_mut().insert(name.to_string(), value);
	}

	/// Forwards a property write to the native object.
	///
	/// Values that cannot cross the wire are reported and dropped.
	pub fn native_set(&self, name: &str, value: impl Into<Value>) -> Result<()> {
		self.ensure_open()?;
		match value.into().to_wire() {
			Ok(wire) => self.inner.channel.set(&self.inner.id, name, wire),
			Err(reason) => {
				self.diagnose(Diagnostic::NotTransmittable {
					name: name.to_string(),
					reason,
				});
				Ok(())
			}
		}
	}

	/// Reads a property from the native object.
	pub fn native_get(&self, name: &str) -> Result<WireValue> {
		self.ensure_open()?;
		self.inner.channel.get(&self.inner.id, name)
	}

	/// Invokes a native method and returns its untyped result.
	///
	/// If a parameter cannot cross the wire, nothing is sent and `Null` is
	/// returned after a diagnostic.
	pub fn native_call(&self, method: &str, parameters: PropertyBag) -> Result<Value> {
		self.ensure_open()?;
		let parameters = match Value::bag_to_wire(&parameters) {
			Ok(parameters) => parameters,
			Err((name, reason)) => {
				self.diagnose(Diagnostic::NotTransmittable {
					name: format!("{method}({name})"),
					reason,
				});
				return Ok(Value::Null);
			}
		};
		let result = self.inner.channel.call(&self.inner.id, method, parameters)?;
		Ok(Value::from_wire(result))
	}

	/// Toggles native delivery of `event`.
	pub fn native_listen(&self, event: &str, enabled: bool) -> Result<()> {
		self.ensure_open()?;
		self.inner.channel.listen(&self.inner.id, event, enabled)
	}

	/// Resolves an identifier reported by the host to a live proxy.
	pub fn resolve(&self, wire: &WireValue) -> Option<Proxy> {
		Value::resolve_proxy(wire, self.inner.channel.registry())
			.as_proxy()
			.cloned()
	}

	/// Reports a soft error through the channel's diagnostics.
	pub fn diagnose(&self, diagnostic: Diagnostic) {
		self.inner.channel.diagnostics().emit(diagnostic);
	}

	/// Entry point for notifications routed by the channel.
	pub(crate) fn handle_notify(&self, event: &str, fields: PropertyBag) -> Result<()> {
		if self.is_disposed() {
			return Ok(());
		}
		let kind = Rc::clone(&self.inner.kind);
		kind.dispatch(self, event, fields)
	}

	pub(crate) fn downgrade(&self) -> Weak<ProxyInner> {
		Rc::downgrade(&self.inner)
	}

	pub(crate) fn from_inner(inner: Rc<ProxyInner>) -> Proxy {
		Proxy { inner }
	}

	fn ensure_open(&self) -> Result<()> {
		if !self.lifecycle().is_open() {
			return Err(BridgeError::Disposed {
				id: self.inner.id.clone(),
			});
		}
		Ok(())
	}

	fn unknown_property(&self, name: &str) {
		self.diagnose(Diagnostic::UnknownProperty {
			type_name: self.inner.kind.native_type().to_string(),
			property: name.to_string(),
		});
	}

	fn subscribe(&self, native: &str) -> Result<()> {
		let first = {
			let mut subs = self.inner.native_subs.borrow_mut();
			let count = subs.entry(native.to_string()).or_insert(0);
			*count += 1;
			*count == 1
		};
		if first {
			self.native_listen(native, true)?;
		}
		Ok(())
	}

	fn unsubscribe(&self, native: &str) -> Result<()> {
		let last = {
			let mut subs = self.inner.native_subs.borrow_mut();
			match subs.get_mut(native) {
				Some(count) if *count > 1 => {
					*count -= 1;
					false
				}
				Some(_) => {
					subs.remove(native);
					true
				}
				None => false,
			}
		};
		if last {
			self.native_listen(native, false)?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests;
