//! Property types and their coercion rules.

use trellis_rpc::WireValue;

use super::color::parse_color;
use super::font::parse_font;
use crate::registry::ProxyRegistry;
use crate::value::Value;

/// Coercion and validation rule of a declared property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyType {
	/// Accepts anything unchanged.
	Any,
	/// Truthiness of the written value.
	Boolean,
	/// Finite number.
	Number,
	/// Finite number rounded to the nearest non-negative integer.
	Natural,
	/// Finite number rounded to the nearest integer.
	Integer,
	/// String; numbers and booleans are stringified, null becomes empty.
	String,
	/// One of a fixed set of strings.
	Choice(Vec<&'static str>),
	/// List; null becomes empty. Elements are coerced by the item type if given.
	Array(Option<Box<PropertyType>>),
	/// Reference to another proxy, or null.
	Proxy,
	/// Script-side callable, or null.
	Function,
	/// Color string or channel list, normalized to `[r, g, b, a]`.
	Color,
	/// Font shorthand, normalized to a record.
	Font,
	/// Number in `0..=1`.
	Opacity,
	/// Null passes through, anything else is coerced by the inner type.
	Nullable(Box<PropertyType>),
}

impl PropertyType {
	/// Shorthand for [`PropertyType::Choice`].
	pub fn choice(values: &[&'static str]) -> Self {
		PropertyType::Choice(values.to_vec())
	}

	/// Shorthand for an array with coerced elements.
	pub fn array_of(item: PropertyType) -> Self {
		PropertyType::Array(Some(Box::new(item)))
	}

	/// Shorthand for [`PropertyType::Nullable`].
	pub fn nullable(inner: PropertyType) -> Self {
		PropertyType::Nullable(Box::new(inner))
	}

	/// Coerces a written value. Returns the failure reason on rejection.
	pub fn coerce(&self, value: Value) -> Result<Value, String> {
		match self {
			PropertyType::Any => Ok(value),
			PropertyType::Boolean => Ok(Value::Bool(truthy(&value))),
			PropertyType::Number => finite(&value).map(Value::Number),
			PropertyType::Natural => finite(&value).map(|n| Value::Number(n.round().max(0.0))),
			PropertyType::Integer => finite(&value).map(|n| Value::Number(n.round())),
			PropertyType::String => match value {
				Value::Null => Ok(Value::String(String::new())),
				Value::String(_) => Ok(value),
				Value::Bool(b) => Ok(Value::String(b.to_string())),
				Value::Number(n) => Ok(Value::String(format_number(n))),
				other => Err(format!("not a string: {}", other.type_name())),
			},
			PropertyType::Choice(accepted) => {
				if value
					.as_str()
					.is_some_and(|s| accepted.iter().any(|a| *a == s))
				{
					Ok(value)
				} else {
					Err(format!(
						"accepting only {}, but got {}",
						accepted.join(", "),
						describe(&value)
					))
				}
			}
			PropertyType::Array(item) => match value {
				Value::Null => Ok(Value::Array(Vec::new())),
				Value::Array(items) => match item {
					Some(ty) => items
						.into_iter()
						.map(|v| ty.coerce(v))
						.collect::<Result<_, _>>()
						.map(Value::Array),
					None => Ok(Value::Array(items)),
				},
				other => Err(format!("not an array: {}", other.type_name())),
			},
			PropertyType::Proxy => match value {
				Value::Null | Value::Proxy(_) => Ok(value),
				other => Err(format!("not a proxy: {}", other.type_name())),
			},
			PropertyType::Function => match value {
				Value::Null | Value::Function(_) => Ok(value),
				other => Err(format!("not a function: {}", other.type_name())),
			},
			PropertyType::Color => match &value {
				Value::Null => Ok(Value::Null),
				Value::String(s) if s == "initial" => Ok(Value::Null),
				Value::String(s) => parse_color(s).map(channels),
				Value::Array(items) => color_from_channels(items).map(channels),
				other => Err(format!("not a color: {}", other.type_name())),
			},
			PropertyType::Font => match &value {
				Value::Null => Ok(Value::Null),
				Value::String(s) if s == "initial" => Ok(Value::Null),
				Value::String(s) => parse_font(s).map(|font| font.to_value()),
				Value::Object(record) => Ok(Value::Object(record.clone())),
				other => Err(format!("not a font: {}", other.type_name())),
			},
			PropertyType::Opacity => {
				let n = finite(&value)?;
				if (0.0..=1.0).contains(&n) {
					Ok(Value::Number(n))
				} else {
					Err(format!("opacity out of range: {}", format_number(n)))
				}
			}
			PropertyType::Nullable(inner) => match value {
				Value::Null => Ok(Value::Null),
				other => inner.coerce(other),
			},
		}
	}

	/// Decodes a value reported by the native host.
	///
	/// Proxy identifiers resolve back through `registry`; identifiers that are
	/// no longer registered decode to null.
	pub fn decode(&self, wire: WireValue, registry: &ProxyRegistry) -> Value {
		match self {
			PropertyType::Proxy => Value::resolve_proxy(&wire, registry),
			PropertyType::Nullable(inner) => match wire {
				WireValue::Null => Value::Null,
				other => inner.decode(other, registry),
			},
			PropertyType::Array(Some(item)) if **item == PropertyType::Proxy => match wire {
				WireValue::Array(items) => Value::Array(
					items
						.iter()
						.map(|w| Value::resolve_proxy(w, registry))
						.collect(),
				),
				other => Value::from_wire(other),
			},
			_ => Value::from_wire(wire),
		}
	}
}

fn truthy(value: &Value) -> bool {
	match value {
		Value::Null => false,
		Value::Bool(b) => *b,
		Value::Number(n) => *n != 0.0 && !n.is_nan(),
		Value::String(s) => !s.is_empty(),
		_ => true,
	}
}

fn finite(value: &Value) -> Result<f64, String> {
	match value {
		Value::Number(n) if n.is_finite() => Ok(*n),
		Value::Number(n) => Err(format!("invalid number: {n}")),
		other => Err(format!("not a number: {}", describe(other))),
	}
}

fn describe(value: &Value) -> String {
	match value {
		Value::String(s) => format!("\"{s}\""),
		Value::Number(n) => format_number(*n),
		other => other.type_name().to_string(),
	}
}

fn format_number(n: f64) -> String {
	if n.fract() == 0.0 && n.abs() < 9.0e15 {
		format!("{}", n as i64)
	} else {
		n.to_string()
	}
}

fn channels(rgba: [u8; 4]) -> Value {
	Value::Array(rgba.iter().map(|c| Value::Number(f64::from(*c))).collect())
}

fn color_from_channels(items: &[Value]) -> Result<[u8; 4], String> {
	if items.len() != 3 && items.len() != 4 {
		return Err(format!("color needs 3 or 4 channels, got {}", items.len()));
	}
	let mut out = [0u8, 0, 0, 255];
	for (slot, item) in out.iter_mut().zip(items) {
		let n = finite(item)?;
		if !(0.0..=255.0).contains(&n) {
			return Err(format!("color channel out of range: {}", format_number(n)));
		}
		*slot = n.round() as u8;
	}
	Ok(out)
}
