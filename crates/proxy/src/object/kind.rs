//! Per-type behavior of proxies.

use crate::error::Result;
use crate::property::PropertySchema;
use crate::value::PropertyBag;

use super::Proxy;

/// Event name the base triggers right before a proxy is destroyed.
pub const DISPOSE_EVENT: &str = "dispose";

/// Prefix of script-side property change events.
pub const CHANGE_EVENT_PREFIX: &str = "change:";

/// Behavior shared by every proxy of one type.
///
/// Concrete types provide the native type name and descriptor table; the
/// remaining hooks have defaults that suit plain declarative types.
pub trait ProxyKind {
	/// Type name sent with the create operation.
	fn native_type(&self) -> &str;

	/// Descriptor table for this type.
	fn schema(&self) -> &PropertySchema;

	/// Adjusts the constructor properties before they are applied.
	fn initial_properties(&self, properties: &mut PropertyBag) {
		let _ = properties;
	}

	/// Native event that must be subscribed while `event` has listeners, or
	/// `None` for events that are raised script-side only.
	fn native_event<'a>(&self, event: &'a str) -> Option<&'a str> {
		default_native_event(event)
	}

	/// Handles a notification from the native object.
	fn dispatch(&self, proxy: &Proxy, event: &str, fields: PropertyBag) -> Result<()> {
		proxy.trigger(event, fields);
		Ok(())
	}
}

/// `dispose` and `change:*` events are script-local; every other event name is
/// delivered by the native object under the same name.
pub fn default_native_event(event: &str) -> Option<&str> {
	if event == DISPOSE_EVENT || event.starts_with(CHANGE_EVENT_PREFIX) {
		None
	} else {
		Some(event)
	}
}

/// Declarative proxy type with default behavior.
#[derive(Debug, Clone)]
pub struct ProxyType {
	native_type: String,
	schema: PropertySchema,
}

impl ProxyType {
	/// Creates a type sent to native as `native_type`.
	pub fn new(native_type: impl Into<String>, schema: PropertySchema) -> Self {
		Self {
			native_type: native_type.into(),
			schema,
		}
	}
}

impl ProxyKind for ProxyType {
	fn native_type(&self) -> &str {
		&self.native_type
	}

	fn schema(&self) -> &PropertySchema {
		&self.schema
	}
}
