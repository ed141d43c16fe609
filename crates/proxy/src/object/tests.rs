use std::cell::{Cell, RefCell};
use std::rc::Rc;

use pretty_assertions::assert_eq;
use serde_json::json;
use trellis_config::BridgeConfig;
use trellis_rpc::{CallLog, Notify, OpKind, Operation, Properties, RecordingClient};

use super::*;
use crate::property::{PropertyDef, PropertySchema, PropertyType};
use crate::value::properties;

fn schema() -> PropertySchema {
	PropertySchema::new()
		.define("text", PropertyType::String)
		.define("count", PropertyDef::new(PropertyType::Natural).default_value(0))
		.define("note", PropertyDef::new(PropertyType::String).local())
		.define("peer", PropertyType::nullable(PropertyType::Proxy))
		.define("width", PropertyDef::new(PropertyType::Number).native_read())
		.define(
			"label",
			PropertyDef::new(PropertyType::String).getter(|proxy, _| {
				let text = proxy.get("text")?.unwrap_or_default();
				Ok(Value::from(format!("[{}]", text.as_str().unwrap_or(""))))
			}),
		)
		.define("callback", PropertyDef::new(PropertyType::Function).local())
		.define("raw", PropertyType::Any)
}

fn setup() -> (CommandChannel, CallLog, Rc<dyn ProxyKind>) {
	let _ = tracing_subscriber::fmt::try_init();
	let (client, log) = RecordingClient::new();
	let channel = CommandChannel::new(client, &BridgeConfig::default());
	let kind: Rc<dyn ProxyKind> = Rc::new(ProxyType::new("Widget", schema()));
	(channel, log, kind)
}

fn widget(channel: &CommandChannel, kind: &Rc<dyn ProxyKind>) -> Proxy {
	Proxy::create(channel, Rc::clone(kind), PropertyBag::new()).unwrap()
}

fn kinds(log: &CallLog) -> Vec<OpKind> {
	log.calls().iter().map(Operation::kind).collect()
}

#[test]
fn create_carries_coerced_properties() {
	let (channel, log, kind) = setup();
	let props = properties([("text", Value::from(5)), ("count", Value::from(2.6))]);
	let proxy = Proxy::create(&channel, kind, props).unwrap();
	channel.flush().unwrap();

	let mut expected = Properties::new();
	expected.insert("text".into(), json!("5"));
	expected.insert("count".into(), json!(3));
	assert_eq!(
		log.calls(),
		vec![Operation::Create {
			id: proxy.cid().clone(),
			type_name: "Widget".into(),
			properties: expected,
		}]
	);
	assert_eq!(proxy.lifecycle(), Lifecycle::Live);
}

#[test]
fn create_registers_proxy() {
	let (channel, _, kind) = setup();
	let proxy = widget(&channel, &kind);
	assert_eq!(channel.registry().find(proxy.cid()), Some(proxy.clone()));
}

#[test]
fn ids_are_unique() {
	let (channel, _, kind) = setup();
	let a = widget(&channel, &kind);
	let b = widget(&channel, &kind);
	assert_ne!(a.cid(), b.cid());
}

#[test]
fn round_trip_reads_cache_without_native_traffic() {
	let (channel, log, kind) = setup();
	let proxy = widget(&channel, &kind);
	proxy.set("count", 4.4).unwrap();
	assert_eq!(proxy.get("count").unwrap(), Some(Value::Number(4.0)));
	channel.flush().unwrap();
	assert!(log.matching(OpKind::Get, None).is_empty());
}

#[test]
fn default_is_returned_until_written() {
	let (channel, _, kind) = setup();
	let proxy = widget(&channel, &kind);
	assert_eq!(proxy.get("count").unwrap(), Some(Value::Number(0.0)));
	assert_eq!(proxy.get("text").unwrap(), Some(Value::Null));
}

#[test]
fn lazy_default_is_materialized_once() {
	let (channel, _, _) = setup();
	let calls = Rc::new(Cell::new(0));
	let counter = Rc::clone(&calls);
	let schema = PropertySchema::new().define(
		"items",
		PropertyDef::new(PropertyType::Array(None)).default_with(move || {
			counter.set(counter.get() + 1);
			Value::Array(Vec::new())
		}),
	);
	let kind: Rc<dyn ProxyKind> = Rc::new(ProxyType::new("List", schema));
	let proxy = widget(&channel, &kind);

	proxy.get("items").unwrap();
	proxy.get("items").unwrap();
	assert_eq!(calls.get(), 1);
	assert_eq!(proxy.stored_property("items"), Some(Value::Array(Vec::new())));
}

#[test]
fn unknown_property_is_diagnosed_and_ignored() {
	let (channel, log, kind) = setup();
	let proxy = widget(&channel, &kind);
	channel.flush().unwrap();
	log.reset();

	proxy.set("unknown", "x").unwrap();
	assert_eq!(proxy.get("unknown").unwrap(), None);
	channel.flush().unwrap();

	assert!(log.is_empty());
	assert_eq!(proxy.stored_property("unknown"), None);
	assert_eq!(
		channel.diagnostics().take(),
		vec![
			Diagnostic::UnknownProperty {
				type_name: "Widget".into(),
				property: "unknown".into(),
			};
			2
		]
	);
}

#[test]
fn invalid_value_keeps_prior_state() {
	let (channel, log, kind) = setup();
	let proxy = widget(&channel, &kind);
	proxy.set("count", 2).unwrap();
	channel.flush().unwrap();
	log.reset();

	proxy.set("count", "many").unwrap();
	channel.flush().unwrap();
	assert!(log.is_empty());
	assert_eq!(proxy.get("count").unwrap(), Some(Value::Number(2.0)));
	let recent = channel.diagnostics().recent();
	assert!(matches!(
		recent.as_slice(),
		[Diagnostic::InvalidValue { property, .. }] if property == "count"
	));
}

#[test]
fn local_property_is_not_forwarded() {
	let (channel, log, kind) = setup();
	let proxy = widget(&channel, &kind);
	channel.flush().unwrap();
	log.reset();

	proxy.set("note", "memo").unwrap();
	channel.flush().unwrap();
	assert!(log.is_empty());
	assert_eq!(proxy.get("note").unwrap(), Some(Value::from("memo")));
}

#[test]
fn function_properties_stay_local() {
	let (channel, log, kind) = setup();
	let proxy = widget(&channel, &kind);
	channel.flush().unwrap();
	log.reset();

	let callback = crate::value::Callback::new(|args| args.first().cloned().unwrap_or_default());
	proxy.set("callback", callback.clone()).unwrap();
	channel.flush().unwrap();
	assert!(log.is_empty());
	assert_eq!(proxy.get("callback").unwrap(), Some(Value::Function(callback)));
}

#[test]
fn untransmittable_value_is_rejected() {
	let (channel, log, kind) = setup();
	let proxy = widget(&channel, &kind);
	channel.flush().unwrap();
	log.reset();

	proxy
		.set("raw", crate::value::Callback::new(|_| Value::Null))
		.unwrap();
	channel.flush().unwrap();
	assert!(log.is_empty());
	assert_eq!(proxy.stored_property("raw"), None);
	assert!(matches!(
		channel.diagnostics().recent().as_slice(),
		[Diagnostic::NotTransmittable { name, .. }] if name == "raw"
	));
}

#[test]
fn proxy_values_cross_the_wire_as_ids() {
	let (channel, log, kind) = setup();
	let target = widget(&channel, &kind);
	let proxy = widget(&channel, &kind);
	channel.flush().unwrap();
	log.reset();

	proxy.set("peer", &target).unwrap();
	channel.flush().unwrap();
	let sets = log.matching(OpKind::Set, Some(proxy.cid()));
	assert_eq!(
		sets[0].properties().unwrap()["peer"],
		json!(target.cid().as_str())
	);
	assert_eq!(proxy.get("peer").unwrap(), Some(Value::Proxy(target)));
}

#[test]
fn native_read_queries_host() {
	let (channel, log, kind) = setup();
	log.reply_get("width", json!(42));
	let proxy = widget(&channel, &kind);

	assert_eq!(proxy.get("width").unwrap(), Some(Value::Number(42.0)));
	assert_eq!(log.matching(OpKind::Get, Some(proxy.cid())).len(), 1);
}

#[test]
fn custom_getter_wins() {
	let (channel, _, kind) = setup();
	let proxy = widget(&channel, &kind);
	proxy.set("text", "hi").unwrap();
	assert_eq!(proxy.get("label").unwrap(), Some(Value::from("[hi]")));
}

#[test]
fn set_all_follows_apply_order() {
	let (channel, log, _) = setup();
	let schema = PropertySchema::new()
		.define("items", PropertyType::Array(None))
		.define("selectionIndex", PropertyType::Natural)
		.define("enabled", PropertyType::Boolean)
		.apply_order(&["items", "selectionIndex"]);
	let kind: Rc<dyn ProxyKind> = Rc::new(ProxyType::new("Picker", schema));
	let props = properties([
		("selectionIndex", Value::from(2)),
		("items", Value::from(vec!["a", "b", "c"])),
		("enabled", Value::from(true)),
	]);
	Proxy::create(&channel, kind, props).unwrap();
	channel.flush().unwrap();

	let keys: Vec<String> = log.calls()[0]
		.properties()
		.unwrap()
		.keys()
		.cloned()
		.collect();
	assert_eq!(keys, vec!["enabled", "items", "selectionIndex"]);
}

#[test]
fn change_event_only_on_change() {
	let (channel, _, kind) = setup();
	let proxy = widget(&channel, &kind);
	let seen = Rc::new(RefCell::new(Vec::new()));
	let sink = Rc::clone(&seen);
	proxy
		.on("change:text", move |event| {
			sink.borrow_mut().push(event.get("value").cloned());
		})
		.unwrap();

	proxy.set("text", "a").unwrap();
	proxy.set("text", "a").unwrap();
	proxy.set("text", "b").unwrap();
	assert_eq!(
		*seen.borrow(),
		vec![Some(Value::from("a")), Some(Value::from("b"))]
	);
}

#[test]
fn listen_is_reference_counted() {
	let (channel, log, kind) = setup();
	let proxy = widget(&channel, &kind);
	channel.flush().unwrap();
	log.reset();

	let first = proxy.on("select", |_| {}).unwrap();
	let second = proxy.on("select", |_| {}).unwrap();
	channel.flush().unwrap();
	assert_eq!(
		log.calls(),
		vec![Operation::Listen {
			id: proxy.cid().clone(),
			event: "select".into(),
			listen: true,
		}]
	);

	log.reset();
	proxy.off("select", first).unwrap();
	channel.flush().unwrap();
	assert!(log.is_empty());

	proxy.off("select", second).unwrap();
	channel.flush().unwrap();
	assert_eq!(
		log.calls(),
		vec![Operation::Listen {
			id: proxy.cid().clone(),
			event: "select".into(),
			listen: false,
		}]
	);
}

#[test]
fn local_events_never_listen() {
	let (channel, log, kind) = setup();
	let proxy = widget(&channel, &kind);
	channel.flush().unwrap();
	log.reset();

	proxy.on("dispose", |_| {}).unwrap();
	proxy.on("change:text", |_| {}).unwrap();
	channel.flush().unwrap();
	assert!(log.is_empty());
}

#[test]
fn listeners_run_in_registration_order() {
	let (channel, _, kind) = setup();
	let proxy = widget(&channel, &kind);
	let order = Rc::new(RefCell::new(Vec::new()));
	for n in 0..3 {
		let order = Rc::clone(&order);
		proxy.on("tap", move |_| order.borrow_mut().push(n)).unwrap();
	}
	proxy.trigger("tap", PropertyBag::new());
	assert_eq!(*order.borrow(), vec![0, 1, 2]);
}

#[test]
fn trigger_snapshots_listeners() {
	let (channel, _, kind) = setup();
	let proxy = widget(&channel, &kind);
	let hits = Rc::new(Cell::new(0));
	let late = Rc::clone(&hits);
	let slot: Rc<Cell<Option<ListenerId>>> = Rc::new(Cell::new(None));
	let own = Rc::clone(&slot);
	let id = proxy
		.on("tap", move |event| {
			let target = event.target();
			if let Some(id) = own.get() {
				target.off("tap", id).unwrap();
			}
			let late = Rc::clone(&late);
			target
				.on("tap", move |_| late.set(late.get() + 1))
				.unwrap();
		})
		.unwrap();
	slot.set(Some(id));

	proxy.trigger("tap", PropertyBag::new());
	assert_eq!(hits.get(), 0);
	assert_eq!(proxy.listener_count("tap"), 1);
	proxy.trigger("tap", PropertyBag::new());
	assert_eq!(hits.get(), 1);
}

#[test]
fn event_carries_target_and_fields() {
	let (channel, _, kind) = setup();
	let proxy = widget(&channel, &kind);
	let seen = Rc::new(RefCell::new(None));
	let sink = Rc::clone(&seen);
	proxy
		.on("tap", move |event| {
			*sink.borrow_mut() = Some((event.target().clone(), event.get("x").cloned()));
		})
		.unwrap();
	proxy.trigger("tap", properties([("x", 3)]));
	assert_eq!(
		*seen.borrow(),
		Some((proxy.clone(), Some(Value::Number(3.0))))
	);
}

#[test]
fn dispose_listener_sees_pre_destroy_state() {
	let (channel, _, kind) = setup();
	let proxy = widget(&channel, &kind);
	proxy.set("text", "alive").unwrap();
	let observed = Rc::new(RefCell::new(None));
	let sink = Rc::clone(&observed);
	proxy
		.on("dispose", move |event| {
			let target = event.target();
			let destroyed = target.channel().is_destroyed(target.cid());
			let text = target.get("text").unwrap();
			*sink.borrow_mut() = Some((destroyed, text));
		})
		.unwrap();

	proxy.dispose().unwrap();
	assert_eq!(
		*observed.borrow(),
		Some((false, Some(Value::from("alive"))))
	);
}

#[test]
fn dispose_is_idempotent() {
	let (channel, log, kind) = setup();
	let proxy = widget(&channel, &kind);
	proxy.dispose().unwrap();
	proxy.dispose().unwrap();
	channel.flush().unwrap();

	assert_eq!(log.matching(OpKind::Destroy, Some(proxy.cid())).len(), 1);
	assert!(proxy.is_disposed());
	assert_eq!(channel.registry().find(proxy.cid()), None);
}

#[test]
fn dispose_from_dispose_listener() {
	let (channel, log, kind) = setup();
	let proxy = widget(&channel, &kind);
	let calls = Rc::new(Cell::new(0));
	let counter = Rc::clone(&calls);
	proxy
		.on("dispose", move |event| {
			counter.set(counter.get() + 1);
			event.target().dispose().unwrap();
		})
		.unwrap();

	proxy.dispose().unwrap();
	channel.flush().unwrap();
	assert_eq!(calls.get(), 1);
	assert_eq!(log.matching(OpKind::Destroy, None).len(), 1);
}

#[test]
fn dispose_from_other_listener() {
	let (channel, log, kind) = setup();
	let proxy = widget(&channel, &kind);
	let after = Rc::new(Cell::new(false));
	proxy
		.on("tap", |event| event.target().dispose().unwrap())
		.unwrap();
	let flag = Rc::clone(&after);
	proxy.on("tap", move |_| flag.set(true)).unwrap();

	proxy.trigger("tap", PropertyBag::new());
	channel.flush().unwrap();
	assert!(after.get());
	assert_eq!(log.matching(OpKind::Destroy, None).len(), 1);
}

#[test]
fn disposed_proxy_fails_fast() {
	let (channel, log, kind) = setup();
	let proxy = widget(&channel, &kind);
	proxy.dispose().unwrap();
	channel.flush().unwrap();
	log.reset();

	assert!(matches!(proxy.get("text"), Err(BridgeError::Disposed { .. })));
	assert!(matches!(proxy.set("text", "x"), Err(BridgeError::Disposed { .. })));
	assert!(matches!(
		proxy.native_call("focus", PropertyBag::new()),
		Err(BridgeError::Disposed { .. })
	));
	assert!(matches!(
		proxy.native_listen("select", true),
		Err(BridgeError::Disposed { .. })
	));
	channel.flush().unwrap();
	assert!(log.is_empty());
}

#[test]
fn on_off_after_dispose_are_inert() {
	let (channel, log, kind) = setup();
	let proxy = widget(&channel, &kind);
	let id = proxy.on("select", |_| {}).unwrap();
	proxy.dispose().unwrap();
	channel.flush().unwrap();
	log.reset();

	proxy.off("select", id).unwrap();
	proxy.on("select", |_| {}).unwrap();
	channel.flush().unwrap();
	assert!(log.is_empty());
	assert_eq!(proxy.listener_count("select"), 0);
}

#[test]
fn native_call_translates_parameters() {
	let (channel, log, kind) = setup();
	log.reply_call("measure", json!({"width": 12}));
	let target = widget(&channel, &kind);
	let proxy = widget(&channel, &kind);

	let result = proxy
		.native_call("measure", properties([("relativeTo", &target)]))
		.unwrap();
	assert_eq!(
		result,
		Value::Object(properties([("width", 12)]))
	);
	let calls = log.matching(OpKind::Call, Some(proxy.cid()));
	let Operation::Call { parameters, .. } = &calls[0] else {
		panic!("expected call");
	};
	assert_eq!(parameters["relativeTo"], json!(target.cid().as_str()));
}

#[test]
fn notifications_reach_listeners() {
	let (channel, _, kind) = setup();
	let proxy = widget(&channel, &kind);
	let seen = Rc::new(RefCell::new(Vec::new()));
	let sink = Rc::clone(&seen);
	proxy
		.on("select", move |event| {
			sink.borrow_mut().push(event.get("index").cloned());
		})
		.unwrap();

	let mut payload = Properties::new();
	payload.insert("index".into(), json!(1));
	channel.notify_sender().push(Notify {
		id: proxy.cid().clone(),
		event: "select".into(),
		payload,
	});
	assert!(seen.borrow().is_empty());
	assert_eq!(channel.process().unwrap(), 1);
	assert_eq!(*seen.borrow(), vec![Some(Value::Number(1.0))]);
}

#[test]
fn notification_after_dispose_is_dropped() {
	let (channel, _, kind) = setup();
	let proxy = widget(&channel, &kind);
	let hits = Rc::new(Cell::new(0));
	let counter = Rc::clone(&hits);
	proxy.on("select", move |_| counter.set(counter.get() + 1)).unwrap();
	channel.notify_sender().push(Notify {
		id: proxy.cid().clone(),
		event: "select".into(),
		payload: Properties::new(),
	});
	proxy.dispose().unwrap();

	assert_eq!(channel.process().unwrap(), 0);
	assert_eq!(hits.get(), 0);
}

#[test]
fn registry_does_not_keep_proxies_alive() {
	let (channel, _, kind) = setup();
	let proxy = widget(&channel, &kind);
	let id = proxy.cid().clone();
	assert!(channel.registry().contains(&id));
	drop(proxy);
	assert_eq!(channel.registry().find(&id), None);
	assert!(channel.registry().is_empty());
}

#[test]
fn registry_rejects_live_duplicate() {
	let (channel, _, kind) = setup();
	let a = widget(&channel, &kind);
	let b = widget(&channel, &kind);
	let err = channel.registry().register(a.cid().clone(), &b).unwrap_err();
	assert_eq!(err, AlreadyRegistered(a.cid().clone()));
	assert_eq!(channel.registry().find(a.cid()), Some(a.clone()));
}

#[test]
fn registry_remove_is_idempotent() {
	let (channel, _, kind) = setup();
	let proxy = widget(&channel, &kind);
	channel.registry().remove(proxy.cid());
	channel.registry().remove(proxy.cid());
	assert_eq!(channel.registry().find(proxy.cid()), None);
}

#[test]
fn failed_construction_disposes_proxy() {
	let (channel, log, _) = setup();
	let schema = PropertySchema::new().define(
		"size",
		PropertyDef::new(PropertyType::Number).setter(|proxy, name, _| {
			proxy.native_get(name)?;
			Ok(())
		}),
	);
	let kind: Rc<dyn ProxyKind> = Rc::new(ProxyType::new("Measured", schema));
	log.fail_requests("not ready");

	let err = Proxy::create(&channel, kind, properties([("size", Value::from(4))])).unwrap_err();
	assert!(matches!(err, BridgeError::Transport(_)));
	assert!(channel.registry().is_empty());
	channel.flush().unwrap();
	assert_eq!(kinds(&log), vec![OpKind::Create, OpKind::Get, OpKind::Destroy]);
}
