//! Script-side values and their translation to and from the wire.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use trellis_rpc::{Properties, ProxyId, WireValue};

use crate::object::Proxy;
use crate::registry::ProxyRegistry;

/// Insertion-ordered bag of named values.
pub type PropertyBag = IndexMap<String, Value>;

/// Builds a [`PropertyBag`] from name/value pairs, keeping their order.
pub fn properties<K, V, I>(pairs: I) -> PropertyBag
where
	K: Into<String>,
	V: Into<Value>,
	I: IntoIterator<Item = (K, V)>,
{
	pairs
		.into_iter()
		.map(|(k, v)| (k.into(), v.into()))
		.collect()
}

/// Script-side callable stored in function-typed properties.
#[derive(Clone)]
pub struct Callback(Rc<dyn Fn(&[Value]) -> Value>);

impl Callback {
	/// Wraps a closure.
	pub fn new(f: impl Fn(&[Value]) -> Value + 'static) -> Self {
		Self(Rc::new(f))
	}

	/// Invokes the callable.
	pub fn call(&self, args: &[Value]) -> Value {
		(self.0)(args)
	}
}

impl PartialEq for Callback {
	fn eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

impl fmt::Debug for Callback {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("Callback(..)")
	}
}

/// Any value a property, parameter or event field can hold.
///
/// `Proxy` and `Function` only exist on the script side: proxies cross the
/// wire as their identifier, and functions never cross it.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
	/// Absent or reset value.
	#[default]
	Null,
	/// Boolean.
	Bool(bool),
	/// Number.
	Number(f64),
	/// String.
	String(String),
	/// Ordered list.
	Array(Vec<Value>),
	/// Record.
	Object(PropertyBag),
	/// Live reference to another proxy.
	Proxy(Proxy),
	/// Script-side callable.
	Function(Callback),
}

impl Value {
	/// Returns true for [`Value::Null`].
	pub fn is_null(&self) -> bool {
		matches!(self, Value::Null)
	}

	/// Returns the boolean if this is a `Bool`.
	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Value::Bool(v) => Some(*v),
			_ => None,
		}
	}

	/// Returns the number if this is a `Number`.
	pub fn as_f64(&self) -> Option<f64> {
		match self {
			Value::Number(v) => Some(*v),
			_ => None,
		}
	}

	/// Returns the number as an index if it is a non-negative integer.
	pub fn as_index(&self) -> Option<usize> {
		match self {
			Value::Number(v) if *v >= 0.0 && v.fract() == 0.0 => Some(*v as usize),
			_ => None,
		}
	}

	/// Returns the string slice if this is a `String`.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::String(v) => Some(v),
			_ => None,
		}
	}

	/// Returns the elements if this is an `Array`.
	pub fn as_array(&self) -> Option<&[Value]> {
		match self {
			Value::Array(v) => Some(v),
			_ => None,
		}
	}

	/// Returns the proxy if this is a `Proxy`.
	pub fn as_proxy(&self) -> Option<&Proxy> {
		match self {
			Value::Proxy(v) => Some(v),
			_ => None,
		}
	}

	/// Returns the callable if this is a `Function`.
	pub fn as_callback(&self) -> Option<&Callback> {
		match self {
			Value::Function(v) => Some(v),
			_ => None,
		}
	}

	/// Short type name used in diagnostics.
	pub fn type_name(&self) -> &'static str {
		match self {
			Value::Null => "null",
			Value::Bool(_) => "boolean",
			Value::Number(_) => "number",
			Value::String(_) => "string",
			Value::Array(_) => "array",
			Value::Object(_) => "object",
			Value::Proxy(_) => "proxy",
			Value::Function(_) => "function",
		}
	}

	/// Translates to a wire value. Proxies become their identifier.
	pub fn to_wire(&self) -> Result<WireValue, String> {
		Ok(match self {
			Value::Null => WireValue::Null,
			Value::Bool(v) => WireValue::Bool(*v),
			Value::Number(v) => number_to_wire(*v)?,
			Value::String(v) => WireValue::String(v.clone()),
			Value::Array(items) => {
				WireValue::Array(items.iter().map(Value::to_wire).collect::<Result<_, _>>()?)
			}
			Value::Object(fields) => {
				let mut map = serde_json::Map::with_capacity(fields.len());
				for (k, v) in fields {
					map.insert(k.clone(), v.to_wire()?);
				}
				WireValue::Object(map)
			}
			Value::Proxy(proxy) => WireValue::String(proxy.cid().as_str().to_string()),
			Value::Function(_) => return Err("functions cannot be sent to native".into()),
		})
	}

	/// Translates a bag into wire properties, preserving order.
	pub fn bag_to_wire(bag: &PropertyBag) -> Result<Properties, (String, String)> {
		bag.iter()
			.map(|(k, v)| {
				v.to_wire()
					.map(|w| (k.clone(), w))
					.map_err(|reason| (k.clone(), reason))
			})
			.collect()
	}

	/// Translates a wire value without type information.
	pub fn from_wire(wire: WireValue) -> Self {
		match wire {
			WireValue::Null => Value::Null,
			WireValue::Bool(v) => Value::Bool(v),
			WireValue::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
			WireValue::String(v) => Value::String(v),
			WireValue::Array(items) => Value::Array(items.into_iter().map(Value::from_wire).collect()),
			WireValue::Object(map) => {
				Value::Object(map.into_iter().map(|(k, v)| (k, Value::from_wire(v))).collect())
			}
		}
	}

	/// Translates wire properties into a bag.
	pub fn bag_from_wire(properties: Properties) -> PropertyBag {
		properties
			.into_iter()
			.map(|(k, v)| (k, Value::from_wire(v)))
			.collect()
	}

	/// Resolves a wire identifier back to a live proxy. Unknown identifiers
	/// and non-strings become `Null`.
	pub fn resolve_proxy(wire: &WireValue, registry: &ProxyRegistry) -> Self {
		wire.as_str()
			.and_then(|id| registry.find(&ProxyId::from(id)))
			.map_or(Value::Null, Value::Proxy)
	}
}

fn number_to_wire(v: f64) -> Result<WireValue, String> {
	if v.fract() == 0.0 && v.abs() < 9.0e15 {
		return Ok(WireValue::from(v as i64));
	}
	serde_json::Number::from_f64(v)
		.map(WireValue::Number)
		.ok_or_else(|| format!("{v} is not a finite number"))
}

impl From<bool> for Value {
	fn from(v: bool) -> Self {
		Value::Bool(v)
	}
}

impl From<f64> for Value {
	fn from(v: f64) -> Self {
		Value::Number(v)
	}
}

impl From<i32> for Value {
	fn from(v: i32) -> Self {
		Value::Number(v.into())
	}
}

impl From<i64> for Value {
	fn from(v: i64) -> Self {
		Value::Number(v as f64)
	}
}

impl From<usize> for Value {
	fn from(v: usize) -> Self {
		Value::Number(v as f64)
	}
}

impl From<&str> for Value {
	fn from(v: &str) -> Self {
		Value::String(v.to_string())
	}
}

impl From<String> for Value {
	fn from(v: String) -> Self {
		Value::String(v)
	}
}

impl From<Proxy> for Value {
	fn from(v: Proxy) -> Self {
		Value::Proxy(v)
	}
}

impl From<&Proxy> for Value {
	fn from(v: &Proxy) -> Self {
		Value::Proxy(v.clone())
	}
}

impl From<Callback> for Value {
	fn from(v: Callback) -> Self {
		Value::Function(v)
	}
}

impl<T: Into<Value>> From<Vec<T>> for Value {
	fn from(v: Vec<T>) -> Self {
		Value::Array(v.into_iter().map(Into::into).collect())
	}
}

impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(v: Option<T>) -> Self {
		v.map_or(Value::Null, Into::into)
	}
}
