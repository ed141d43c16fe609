//! Properties shared by every visual widget.

use trellis_proxy::{Diagnostic, PropertyDef, PropertySchema, PropertyType, Proxy, Value};

/// Base descriptor table concrete widgets inherit from.
pub fn widget_schema() -> PropertySchema {
	PropertySchema::new()
		.define("enabled", PropertyDef::new(PropertyType::Boolean).default_value(true))
		.define("visible", PropertyDef::new(PropertyType::Boolean).default_value(true))
		.define("background", PropertyType::Color)
		.define("opacity", PropertyDef::new(PropertyType::Opacity).default_value(1.0))
		.define("font", PropertyType::Font)
		.define("textColor", PropertyType::Color)
		.define("id", PropertyDef::new(PropertyType::String).local())
}

/// Coerces a raw value inside a custom setter, reporting failures the same way
/// the default write path does.
pub(crate) fn coerce_or_report(
	proxy: &Proxy,
	name: &str,
	ty: &PropertyType,
	value: Value,
) -> Option<Value> {
	match ty.coerce(value) {
		Ok(value) => Some(value),
		Err(reason) => {
			proxy.diagnose(Diagnostic::InvalidValue {
				type_name: proxy.kind().native_type().to_string(),
				property: name.to_string(),
				reason,
			});
			None
		}
	}
}

/// Human-readable rendering used in labels and messages.
pub(crate) fn display(value: &Value) -> String {
	match value {
		Value::Null => String::new(),
		Value::String(s) => s.clone(),
		Value::Bool(b) => b.to_string(),
		Value::Number(_) => PropertyType::String
			.coerce(value.clone())
			.ok()
			.and_then(|v| v.as_str().map(str::to_string))
			.unwrap_or_default(),
		Value::Proxy(proxy) => proxy.cid().to_string(),
		other => format!("[{}]", other.type_name()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn display_renders_integral_numbers_without_fraction() {
		assert_eq!(display(&Value::from(3)), "3");
		assert_eq!(display(&Value::from(1.5)), "1.5");
		assert_eq!(display(&Value::Null), "");
		assert_eq!(display(&Value::Array(Vec::new())), "[array]");
	}

	#[test]
	fn base_schema_declares_common_properties() {
		let schema = widget_schema();
		for name in ["enabled", "visible", "background", "opacity", "font", "textColor", "id"] {
			assert!(schema.contains(name), "{name}");
		}
	}
}
