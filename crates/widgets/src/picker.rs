//! Drop-down selection widget.
//!
//! The native picker only knows item labels and a selection index. Items are
//! kept script-side in full and rendered to labels through `itemText`;
//! `selection` is derived from `items` and `selectionIndex`.

use std::ops::Deref;
use std::rc::Rc;

use trellis_proxy::object::{ProxyKind, default_native_event};
use trellis_proxy::{
	Callback, CommandChannel, Diagnostic, ListenerId, PropertyBag, PropertyDef, PropertySchema,
	PropertyType, Proxy, Result, Value,
};

use crate::widget::{coerce_or_report, display, widget_schema};

/// Type name of the native picker.
pub const NATIVE_TYPE: &str = "trellis.Picker";

const ITEMS: &str = "items";
const ITEM_TEXT: &str = "itemText";
const SELECTION: &str = "selection";
const SELECTION_INDEX: &str = "selectionIndex";
const SELECT: &str = "select";

thread_local! {
	static SHARED: Rc<PickerKind> = Rc::new(PickerKind::new());
}

/// Picker type behavior.
#[derive(Debug)]
pub struct PickerKind {
	schema: PropertySchema,
}

impl PickerKind {
	fn new() -> Self {
		let schema = PropertySchema::inherit(&widget_schema())
			.define(
				ITEMS,
				PropertyDef::new(PropertyType::Array(None))
					.default_with(|| Value::Array(Vec::new()))
					.setter(set_items),
			)
			.define(
				ITEM_TEXT,
				PropertyDef::new(PropertyType::Function)
					.local()
					.default_with(|| Value::Function(default_item_text()))
					.setter(set_item_text),
			)
			.define(
				SELECTION_INDEX,
				PropertyDef::new(PropertyType::Natural)
					.native_read()
					.setter(set_selection_index),
			)
			.define(
				SELECTION,
				PropertyDef::new(PropertyType::Any)
					.getter(get_selection)
					.setter(set_selection),
			)
			.define("fillColor", PropertyType::Color)
			.define("borderColor", PropertyType::Color)
			// itemText is not listed so it always lands before items.
			.apply_order(&[ITEMS, SELECTION, SELECTION_INDEX]);
		Self { schema }
	}

	/// Shared instance for the current thread.
	pub fn shared() -> Rc<PickerKind> {
		SHARED.with(Rc::clone)
	}
}

impl ProxyKind for PickerKind {
	fn native_type(&self) -> &str {
		NATIVE_TYPE
	}

	fn schema(&self) -> &PropertySchema {
		&self.schema
	}

	fn initial_properties(&self, properties: &mut PropertyBag) {
		if !properties.contains_key(SELECTION) && !properties.contains_key(SELECTION_INDEX) {
			properties.insert(SELECTION_INDEX.to_string(), Value::from(0));
		}
	}

	fn native_event<'a>(&self, event: &'a str) -> Option<&'a str> {
		match event {
			"change:selection" | "change:selectionIndex" => Some(SELECT),
			_ => default_native_event(event),
		}
	}

	fn dispatch(&self, proxy: &Proxy, event: &str, fields: PropertyBag) -> Result<()> {
		if event != SELECT {
			proxy.trigger(event, fields);
			return Ok(());
		}
		let Some(index) = fields.get(SELECTION_INDEX).and_then(Value::as_index) else {
			tracing::debug!(id = %proxy.cid(), "picker.select_without_index");
			return Ok(());
		};
		let item = item_at(proxy, index)?;
		let mut payload = PropertyBag::new();
		payload.insert("item".to_string(), item.clone());
		payload.insert("index".to_string(), Value::from(index));
		proxy.trigger(SELECT, payload);
		proxy.trigger_change_event(SELECTION, item);
		proxy.trigger_change_event(SELECTION_INDEX, Value::from(index));
		Ok(())
	}
}

fn default_item_text() -> Callback {
	Callback::new(|args| Value::String(args.first().map(display).unwrap_or_default()))
}

fn item_text(proxy: &Proxy) -> Result<Callback> {
	Ok(proxy
		.get(ITEM_TEXT)?
		.and_then(|v| v.as_callback().cloned())
		.unwrap_or_else(default_item_text))
}

fn items(proxy: &Proxy) -> Result<Vec<Value>> {
	Ok(proxy
		.get(ITEMS)?
		.and_then(|v| v.as_array().map(<[Value]>::to_vec))
		.unwrap_or_default())
}

fn item_at(proxy: &Proxy, index: usize) -> Result<Value> {
	Ok(items(proxy)?.get(index).cloned().unwrap_or_default())
}

fn set_items(proxy: &Proxy, name: &str, value: Value) -> Result<()> {
	let Some(items) = coerce_or_report(proxy, name, &PropertyType::Array(None), value) else {
		return Ok(());
	};
	proxy.store_property(name, items.clone());
	let text = item_text(proxy)?;
	let labels: Vec<Value> = items
		.as_array()
		.unwrap_or_default()
		.iter()
		.map(|item| Value::String(display(&text.call(std::slice::from_ref(item)))))
		.collect();
	proxy.native_set(name, labels)
}

fn set_item_text(proxy: &Proxy, name: &str, value: Value) -> Result<()> {
	if let Some(text) = coerce_or_report(proxy, name, &PropertyType::Function, value) {
		proxy.store_property(name, text);
	}
	Ok(())
}

fn set_selection_index(proxy: &Proxy, name: &str, value: Value) -> Result<()> {
	let Some(index) = coerce_or_report(proxy, name, &PropertyType::Natural, value) else {
		return Ok(());
	};
	proxy.native_set(name, index.clone())?;
	proxy.trigger_change_event(name, index);
	Ok(())
}

fn get_selection(proxy: &Proxy, _name: &str) -> Result<Value> {
	let index = proxy.get(SELECTION_INDEX)?.and_then(|v| v.as_index());
	match index {
		Some(index) => item_at(proxy, index),
		None => Ok(Value::Null),
	}
}

fn set_selection(proxy: &Proxy, name: &str, item: Value) -> Result<()> {
	match items(proxy)?.iter().position(|candidate| *candidate == item) {
		Some(index) => {
			proxy.set(SELECTION_INDEX, index)?;
			proxy.trigger_change_event(name, item);
		}
		None => proxy.diagnose(Diagnostic::Rejected {
			id: proxy.cid().clone(),
			message: format!("Could not set picker selection {}: item not found", display(&item)),
		}),
	}
	Ok(())
}

/// Typed handle to a picker proxy.
#[derive(Debug, Clone, PartialEq)]
pub struct Picker {
	proxy: Proxy,
}

impl Picker {
	/// Creates a picker. Without `selection`, the first item is selected.
	pub fn create(channel: &CommandChannel, properties: PropertyBag) -> Result<Self> {
		let kind: Rc<dyn ProxyKind> = PickerKind::shared();
		Ok(Self {
			proxy: Proxy::create(channel, kind, properties)?,
		})
	}

	/// Wraps `proxy` if it is a picker.
	pub fn from_proxy(proxy: Proxy) -> Option<Self> {
		(proxy.kind().native_type() == NATIVE_TYPE).then_some(Self { proxy })
	}

	pub fn proxy(&self) -> &Proxy {
		&self.proxy
	}

	pub fn items(&self) -> Result<Vec<Value>> {
		items(&self.proxy)
	}

	pub fn set_items(&self, items: impl Into<Value>) -> Result<()> {
		self.proxy.set(ITEMS, items)
	}

	/// Renders items to labels with `text` from now on.
	///
	/// Items already shown keep their labels until `items` is written again.
	pub fn set_item_text(&self, text: impl Fn(&Value) -> Value + 'static) -> Result<()> {
		let callback = Callback::new(move |args| args.first().map(&text).unwrap_or_default());
		self.proxy.set(ITEM_TEXT, callback)
	}

	/// Current native selection index.
	pub fn selection_index(&self) -> Result<Option<usize>> {
		Ok(self.proxy.get(SELECTION_INDEX)?.and_then(|v| v.as_index()))
	}

	pub fn set_selection_index(&self, index: usize) -> Result<()> {
		self.proxy.set(SELECTION_INDEX, index)
	}

	/// Item at the current selection index, or null.
	pub fn selection(&self) -> Result<Value> {
		Ok(self.proxy.get(SELECTION)?.unwrap_or_default())
	}

	/// Selects `item` by value. Unknown items are reported and ignored.
	pub fn select(&self, item: impl Into<Value>) -> Result<()> {
		self.proxy.set(SELECTION, item)
	}

	/// Registers a listener for user selection.
	pub fn on_select(&self, listener: impl Fn(&Value, usize) + 'static) -> Result<ListenerId> {
		self.proxy.on(SELECT, move |event| {
			let index = event.get("index").and_then(Value::as_index).unwrap_or_default();
			let item = event.get("item").cloned().unwrap_or_default();
			listener(&item, index);
		})
	}
}

impl Deref for Picker {
	type Target = Proxy;

	fn deref(&self) -> &Proxy {
		&self.proxy
	}
}
