//! Font shorthand parsing.
//!
//! Accepts `[style] [weight] <size>px <family>[, <family>]*`, for example
//! `italic bold 12px "Helvetica Neue", sans-serif`. The result is encoded as a
//! record `{family: [..], size, style, weight}`.

use crate::value::{PropertyBag, Value};

const STYLES: &[&str] = &["normal", "italic"];
const WEIGHTS: &[&str] = &["normal", "thin", "light", "medium", "bold", "black"];

/// Parsed font shorthand.
#[derive(Debug, Clone, PartialEq)]
pub struct Font {
	/// Family names in preference order.
	pub family: Vec<String>,
	/// Size in device-independent pixels.
	pub size: f64,
	/// `normal` or `italic`.
	pub style: String,
	/// Named weight.
	pub weight: String,
}

impl Font {
	/// Encodes as the record stored in properties and sent to native.
	pub fn to_value(&self) -> Value {
		let mut record = PropertyBag::new();
		record.insert(
			"family".into(),
			Value::Array(self.family.iter().cloned().map(Value::String).collect()),
		);
		record.insert("size".into(), Value::Number(self.size));
		record.insert("style".into(), Value::String(self.style.clone()));
		record.insert("weight".into(), Value::String(self.weight.clone()));
		Value::Object(record)
	}
}

/// Parses a font shorthand string.
pub fn parse_font(value: &str) -> Result<Font, String> {
	let err = || format!("invalid font: {value}");
	let mut style = "normal";
	let mut weight = "normal";
	let mut rest = value.trim();
	let mut size = None;

	while let Some((token, tail)) = split_token(rest) {
		if let Some(px) = token.strip_suffix("px") {
			let parsed: f64 = px.parse().map_err(|_| err())?;
			if !parsed.is_finite() || parsed < 0.0 {
				return Err(err());
			}
			size = Some(parsed);
			rest = tail;
			break;
		} else if let Some(s) = STYLES.iter().find(|s| **s == token) {
			style = *s;
		} else if let Some(w) = WEIGHTS.iter().find(|w| **w == token) {
			weight = *w;
		} else {
			return Err(err());
		}
		rest = tail;
	}

	let size = size.ok_or_else(err)?;
	let family = rest
		.split(',')
		.map(|name| name.trim().trim_matches(|c| c == '"' || c == '\'').to_string())
		.filter(|name| !name.is_empty())
		.collect();

	Ok(Font {
		family,
		size,
		style: style.to_string(),
		weight: weight.to_string(),
	})
}

fn split_token(input: &str) -> Option<(&str, &str)> {
	let input = input.trim_start();
	if input.is_empty() {
		return None;
	}
	Some(match input.find(char::is_whitespace) {
		Some(end) => (&input[..end], &input[end..]),
		None => (input, ""),
	})
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn size_and_family() {
		let font = parse_font("12px sans-serif").unwrap();
		assert_eq!(
			font,
			Font {
				family: vec!["sans-serif".into()],
				size: 12.0,
				style: "normal".into(),
				weight: "normal".into(),
			}
		);
	}

	#[test]
	fn style_weight_and_quoted_families() {
		let font = parse_font("italic bold 16px \"Helvetica Neue\", serif").unwrap();
		assert_eq!(font.style, "italic");
		assert_eq!(font.weight, "bold");
		assert_eq!(font.family, vec!["Helvetica Neue".to_string(), "serif".to_string()]);
	}

	#[test]
	fn family_is_optional() {
		assert!(parse_font("bold 10px").unwrap().family.is_empty());
	}

	#[test]
	fn missing_size_is_rejected() {
		assert!(parse_font("bold serif").is_err());
		assert!(parse_font("").is_err());
	}

	#[test]
	fn record_shape() {
		let value = parse_font("8px mono").unwrap().to_value();
		let Value::Object(record) = value else {
			panic!("expected record");
		};
		let keys: Vec<_> = record.keys().map(String::as_str).collect();
		assert_eq!(keys, vec!["family", "size", "style", "weight"]);
	}
}
