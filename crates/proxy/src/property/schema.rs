//! Per-type descriptor tables.

use indexmap::IndexMap;

use super::def::PropertyDef;

/// Immutable table of property descriptors for one proxy type.
///
/// Built once at type-definition time. A derived schema starts from its
/// parent's table; redefining a name replaces the parent's descriptor.
#[derive(Debug, Clone, Default)]
pub struct PropertySchema {
	defs: IndexMap<String, PropertyDef>,
	apply_order: Vec<String>,
}

impl PropertySchema {
	/// Creates an empty schema.
	pub fn new() -> Self {
		Self::default()
	}

	/// Starts a derived schema from `parent`.
	pub fn inherit(parent: &PropertySchema) -> Self {
		parent.clone()
	}

	/// Declares or overrides one property.
	pub fn define(mut self, name: &str, def: impl Into<PropertyDef>) -> Self {
		self.defs.insert(name.to_string(), def.into());
		self
	}

	/// Declares names whose writes must be applied in this order whenever
	/// several of them are written together.
	///
	/// Replaces any order inherited from the parent.
	pub fn apply_order(mut self, names: &[&str]) -> Self {
		self.apply_order = names.iter().map(|s| s.to_string()).collect();
		self
	}

	/// Looks up the descriptor for `name`.
	pub fn get(&self, name: &str) -> Option<&PropertyDef> {
		self.defs.get(name)
	}

	/// Returns true if `name` is declared.
	pub fn contains(&self, name: &str) -> bool {
		self.defs.contains_key(name)
	}

	/// Declared names in declaration order.
	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.defs.keys().map(String::as_str)
	}

	/// Orders a batch of property names for application.
	///
	/// Names outside the apply order keep the caller's order and come first;
	/// names in the apply order follow in declared order.
	pub fn reorder<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
		let names: Vec<&'a str> = names.into_iter().collect();
		let is_ordered = |name: &str| self.apply_order.iter().any(|o| o == name);

		let mut out: Vec<&'a str> = names.iter().copied().filter(|n| !is_ordered(n)).collect();
		for ordered in &self.apply_order {
			if let Some(name) = names.iter().find(|n| **n == ordered.as_str()) {
				out.push(*name);
			}
		}
		out
	}
}
