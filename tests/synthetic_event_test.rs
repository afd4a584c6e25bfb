use serde_json::{json, Value};
use synthetic_events::{
    base_interface, get_event_target, DispatchConfig, NativeEvent, SyntheticEvent,
};

fn create_event(native: Value) -> SyntheticEvent {
    let native = NativeEvent::from_value(native);
    let target = get_event_target(&native);
    SyntheticEvent::new(base_interface(), DispatchConfig::default(), None, native, target)
}

#[test]
fn normalizes_target_from_src_element() {
    let div = json!({"nodeName": "DIV", "nodeType": 1});
    let event = create_event(json!({"srcElement": div.clone()}));

    assert_eq!(event.target().unwrap(), Some(&div));
    assert!(event.field("type").unwrap().is_unavailable());
    assert_eq!(event.event_type(), None);
}

#[test]
fn construction_resolves_target_without_explicit_native_target() {
    let div = json!({"nodeName": "DIV", "nodeType": 1});
    let native = NativeEvent::from_value(json!({"srcElement": div.clone()}));
    let event = SyntheticEvent::new(base_interface(), DispatchConfig::default(), None, native, None);

    assert_eq!(event.target().unwrap(), Some(&div));
}

#[test]
fn explicit_native_target_wins_over_native_properties() {
    let span = json!({"nodeName": "SPAN", "nodeType": 1});
    let native = NativeEvent::from_value(json!({"target": {"nodeName": "DIV", "nodeType": 1}}));
    let event = SyntheticEvent::new(
        base_interface(),
        DispatchConfig::default(),
        None,
        native,
        Some(span.clone()),
    );

    assert_eq!(event.target().unwrap(), Some(&span));
}

#[test]
fn prevent_default_falls_back_to_return_value() {
    let mut event = create_event(json!({}));

    assert!(!event.is_default_prevented());
    event.prevent_default();
    assert!(event.is_default_prevented());
    assert!(event.is_default_prevented());

    assert_eq!(event.value("defaultPrevented").unwrap(), Some(&json!(true)));
    let native = event.native_event().expect("native event");
    assert_eq!(native.get("returnValue"), Some(&json!(false)));
}

#[test]
fn prevented_native_event_is_reported() {
    assert!(create_event(json!({"defaultPrevented": true})).is_default_prevented());
    assert!(create_event(json!({"returnValue": false})).is_default_prevented());
}

#[test]
fn stop_propagation_falls_back_to_cancel_bubble() {
    let mut event = create_event(json!({}));

    assert!(!event.is_propagation_stopped());
    event.stop_propagation();
    assert!(event.is_propagation_stopped());

    let native = event.native_event().expect("native event");
    assert_eq!(native.get("cancelBubble"), Some(&json!(true)));
}

#[test]
fn standard_host_operations_are_used_when_present() {
    let props = json!({"type": "submit", "cancelable": true})
        .as_object()
        .cloned()
        .expect("object");
    let native = NativeEvent::standard(props);
    let mut event = SyntheticEvent::new(base_interface(), DispatchConfig::default(), None, native, None);

    event.prevent_default();
    event.stop_propagation();

    let native = event.native_event().expect("native event");
    assert_eq!(native.get("defaultPrevented"), Some(&json!(true)));
    assert_eq!(native.get("propagationStopped"), Some(&json!(true)));
    assert!(native.get("returnValue").is_none());
    assert!(native.get("cancelBubble").is_none());
}
