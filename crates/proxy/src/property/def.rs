use std::fmt;
use std::rc::Rc;

use super::types::PropertyType;
use crate::error::Result;
use crate::object::Proxy;
use crate::value::Value;

/// Custom read accessor. Receives the proxy and the property name.
pub type Getter = Rc<dyn Fn(&Proxy, &str) -> Result<Value>>;

/// Custom write accessor. Fully responsible for coercion, caching and
/// forwarding of the raw value.
pub type Setter = Rc<dyn Fn(&Proxy, &str, Value) -> Result<()>>;

/// Where a property's state lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mirror {
	/// Writes are cached and forwarded to the native object.
	Native,
	/// Writes are cached only.
	Local,
}

/// Default value of a property.
#[derive(Clone)]
pub enum DefaultValue {
	/// Returned as-is while nothing was written.
	Value(Value),
	/// Materialized on first read and cached from then on.
	Lazy(Rc<dyn Fn() -> Value>),
}

impl fmt::Debug for DefaultValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			DefaultValue::Value(v) => f.debug_tuple("Value").field(v).finish(),
			DefaultValue::Lazy(_) => f.write_str("Lazy(..)"),
		}
	}
}

/// Declarative rule set for one named property.
#[derive(Clone)]
pub struct PropertyDef {
	ty: PropertyType,
	default: Option<DefaultValue>,
	getter: Option<Getter>,
	setter: Option<Setter>,
	mirror: Mirror,
	native_read: bool,
}

impl fmt::Debug for PropertyDef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PropertyDef")
			.field("ty", &self.ty)
			.field("default", &self.default)
			.field("custom_get", &self.getter.is_some())
			.field("custom_set", &self.setter.is_some())
			.field("mirror", &self.mirror)
			.field("native_read", &self.native_read)
			.finish()
	}
}

impl PropertyDef {
	/// Declares a native-mirrored property of type `ty` without default.
	pub fn new(ty: PropertyType) -> Self {
		Self {
			ty,
			default: None,
			getter: None,
			setter: None,
			mirror: Mirror::Native,
			native_read: false,
		}
	}

	/// Sets a constant default.
	pub fn default_value(mut self, value: impl Into<Value>) -> Self {
		self.default = Some(DefaultValue::Value(value.into()));
		self
	}

	/// Sets a default produced on first read.
	pub fn default_with(mut self, f: impl Fn() -> Value + 'static) -> Self {
		self.default = Some(DefaultValue::Lazy(Rc::new(f)));
		self
	}

	/// Installs a custom read accessor.
	pub fn getter(mut self, f: impl Fn(&Proxy, &str) -> Result<Value> + 'static) -> Self {
		self.getter = Some(Rc::new(f));
		self
	}

	/// Installs a custom write accessor.
	pub fn setter(mut self, f: impl Fn(&Proxy, &str, Value) -> Result<()> + 'static) -> Self {
		self.setter = Some(Rc::new(f));
		self
	}

	/// Keeps the property script-side only.
	pub fn local(mut self) -> Self {
		self.mirror = Mirror::Local;
		self
	}

	/// Reads fetch the current native value instead of the cache.
	pub fn native_read(mut self) -> Self {
		self.native_read = true;
		self
	}

	pub fn ty(&self) -> &PropertyType {
		&self.ty
	}

	pub fn default(&self) -> Option<&DefaultValue> {
		self.default.as_ref()
	}

	pub fn custom_getter(&self) -> Option<&Getter> {
		self.getter.as_ref()
	}

	pub fn custom_setter(&self) -> Option<&Setter> {
		self.setter.as_ref()
	}

	pub fn mirror(&self) -> Mirror {
		self.mirror
	}

	pub fn is_native_read(&self) -> bool {
		self.native_read
	}
}

impl From<PropertyType> for PropertyDef {
	fn from(ty: PropertyType) -> Self {
		Self::new(ty)
	}
}
