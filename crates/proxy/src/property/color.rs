//! Color parsing.
//!
//! Colors are normalized to `[r, g, b, a]` with every channel in `0..=255`,
//! which is also their wire representation.

/// Parses a CSS-style color string into RGBA channels.
///
/// Supports hex (`#RGB`, `#RRGGBB`, `#RRGGBBAA`), `rgb(r, g, b)`,
/// `rgba(r, g, b, a)` with `a` in `0..=1`, `transparent`, and the sixteen
/// basic named colors.
pub fn parse_color(value: &str) -> Result<[u8; 4], String> {
	let value = value.trim();

	if let Some(hex) = value.strip_prefix('#') {
		return parse_hex_color(hex);
	}

	let lower = value.to_ascii_lowercase();
	if let Some(args) = lower
		.strip_prefix("rgba(")
		.or_else(|| lower.strip_prefix("rgb("))
		.and_then(|rest| rest.strip_suffix(')'))
	{
		return parse_rgb_function(args, value);
	}

	parse_named_color(&lower).ok_or_else(|| format!("invalid color: {value}"))
}

fn parse_hex_color(hex: &str) -> Result<[u8; 4], String> {
	let err = || format!("invalid color: #{hex}");
	let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| err());

	if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
		return Err(err());
	}
	match hex.len() {
		3 => Ok([
			channel(&hex[0..1].repeat(2))?,
			channel(&hex[1..2].repeat(2))?,
			channel(&hex[2..3].repeat(2))?,
			255,
		]),
		6 | 8 => Ok([
			channel(&hex[0..2])?,
			channel(&hex[2..4])?,
			channel(&hex[4..6])?,
			if hex.len() == 8 { channel(&hex[6..8])? } else { 255 },
		]),
		_ => Err(err()),
	}
}

fn parse_rgb_function(args: &str, original: &str) -> Result<[u8; 4], String> {
	let err = || format!("invalid color: {original}");
	let parts: Vec<&str> = args.split(',').map(str::trim).collect();
	if parts.len() != 3 && parts.len() != 4 {
		return Err(err());
	}

	let mut out = [0u8, 0, 0, 255];
	for (slot, part) in out.iter_mut().zip(&parts[..3]) {
		let channel: f64 = part.parse().map_err(|_| err())?;
		if !(0.0..=255.0).contains(&channel) {
			return Err(err());
		}
		*slot = channel.round() as u8;
	}
	if let Some(alpha) = parts.get(3) {
		let alpha: f64 = alpha.parse().map_err(|_| err())?;
		if !(0.0..=1.0).contains(&alpha) {
			return Err(err());
		}
		out[3] = (alpha * 255.0).round() as u8;
	}
	Ok(out)
}

fn parse_named_color(name: &str) -> Option<[u8; 4]> {
	let rgb = match name {
		"transparent" => return Some([0, 0, 0, 0]),
		"black" => [0, 0, 0],
		"silver" => [192, 192, 192],
		"gray" | "grey" => [128, 128, 128],
		"white" => [255, 255, 255],
		"maroon" => [128, 0, 0],
		"red" => [255, 0, 0],
		"purple" => [128, 0, 128],
		"fuchsia" | "magenta" => [255, 0, 255],
		"green" => [0, 128, 0],
		"lime" => [0, 255, 0],
		"olive" => [128, 128, 0],
		"yellow" => [255, 255, 0],
		"navy" => [0, 0, 128],
		"blue" => [0, 0, 255],
		"teal" => [0, 128, 128],
		"aqua" | "cyan" => [0, 255, 255],
		_ => return None,
	};
	Some([rgb[0], rgb[1], rgb[2], 255])
}
