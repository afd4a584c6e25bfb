use std::fmt;

use serde_json::{Map, Value};

const TEXT_NODE: u64 = 3;

type HostOperation = Box<dyn FnMut(&mut Map<String, Value>)>;

/// A raw event as delivered by the hosting environment.
///
/// Properties are kept in whatever shape the host produced them. Hosts that
/// implement `preventDefault`/`stopPropagation` register those operations;
/// for hosts that do not, the legacy `returnValue`/`cancelBubble` properties
/// are written instead.
pub struct NativeEvent {
    props: Map<String, Value>,
    prevent_default: Option<HostOperation>,
    stop_propagation: Option<HostOperation>,
}

impl NativeEvent {
    /// Wrap a property bag without any host operations (legacy host).
    pub fn new(props: Map<String, Value>) -> Self {
        Self {
            props,
            prevent_default: None,
            stop_propagation: None,
        }
    }

    /// Build from an arbitrary JSON value. Anything other than an object
    /// yields an event with no properties.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(props) => Self::new(props),
            _ => Self::new(Map::new()),
        }
    }

    /// A host implementing the standard DOM operations: `preventDefault`
    /// flips `defaultPrevented` on cancelable events, `stopPropagation`
    /// records `propagationStopped`.
    pub fn standard(props: Map<String, Value>) -> Self {
        Self::new(props)
            .with_prevent_default(|props| {
                let cancelable = props.get("cancelable").map_or(true, truthy);
                if cancelable {
                    props.insert("defaultPrevented".to_string(), Value::Bool(true));
                }
            })
            .with_stop_propagation(|props| {
                props.insert("propagationStopped".to_string(), Value::Bool(true));
            })
    }

    pub fn with_prevent_default(
        mut self,
        operation: impl FnMut(&mut Map<String, Value>) + 'static,
    ) -> Self {
        self.prevent_default = Some(Box::new(operation));
        self
    }

    pub fn with_stop_propagation(
        mut self,
        operation: impl FnMut(&mut Map<String, Value>) + 'static,
    ) -> Self {
        self.stop_propagation = Some(Box::new(operation));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.props.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.props.contains_key(name)
    }

    pub fn props(&self) -> &Map<String, Value> {
        &self.props
    }

    pub fn event_type(&self) -> Option<&str> {
        self.get("type").and_then(Value::as_str)
    }

    pub fn supports_prevent_default(&self) -> bool {
        self.prevent_default.is_some()
    }

    pub fn supports_stop_propagation(&self) -> bool {
        self.stop_propagation.is_some()
    }

    /// Whether the host already considers the default action prevented.
    ///
    /// `defaultPrevented` wins when present and not null; otherwise a legacy
    /// `returnValue` of `false` counts as prevented.
    pub fn reports_default_prevented(&self) -> bool {
        match self.get("defaultPrevented") {
            Some(value) if !value.is_null() => truthy(value),
            _ => matches!(self.get("returnValue"), Some(Value::Bool(false))),
        }
    }

    pub(crate) fn prevent_default(&mut self) {
        match &mut self.prevent_default {
            Some(operation) => operation(&mut self.props),
            None => {
                self.props
                    .insert("returnValue".to_string(), Value::Bool(false));
            }
        }
    }

    pub(crate) fn stop_propagation(&mut self) {
        match &mut self.stop_propagation {
            Some(operation) => operation(&mut self.props),
            None => {
                self.props
                    .insert("cancelBubble".to_string(), Value::Bool(true));
            }
        }
    }
}

impl fmt::Debug for NativeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeEvent")
            .field("props", &self.props)
            .field("prevent_default", &self.prevent_default.is_some())
            .field("stop_propagation", &self.stop_propagation.is_some())
            .finish()
    }
}

impl From<Map<String, Value>> for NativeEvent {
    fn from(props: Map<String, Value>) -> Self {
        Self::new(props)
    }
}

/// Resolve the node an interaction happened on.
///
/// Uses `target`, falling back to the legacy `srcElement`. Instances inside
/// an SVG `<use>` resolve to their `correspondingUseElement`, and text nodes
/// resolve to their parent element.
pub fn get_event_target(native: &NativeEvent) -> Option<Value> {
    let mut target = present(native.get("target")).or_else(|| present(native.get("srcElement")))?;

    if let Some(used) = present(target.get("correspondingUseElement")) {
        target = used;
    }

    if target.get("nodeType").and_then(Value::as_u64) == Some(TEXT_NODE) {
        if let Some(parent) = present(target.get("parentNode")) {
            return Some(parent.clone());
        }
    }

    Some(target.clone())
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|value| !value.is_null())
}

/// Loose truthiness for host-supplied values.
pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn target_prefers_target_over_src_element() {
        let native = NativeEvent::from_value(json!({
            "target": {"id": "a"},
            "srcElement": {"id": "b"},
        }));
        assert_eq!(get_event_target(&native), Some(json!({"id": "a"})));
    }

    #[test]
    fn target_falls_back_to_src_element() {
        let native = NativeEvent::from_value(json!({"target": null, "srcElement": {"id": "b"}}));
        assert_eq!(get_event_target(&native), Some(json!({"id": "b"})));
    }

    #[test]
    fn text_node_resolves_to_parent() {
        let native = NativeEvent::from_value(json!({
            "target": {"nodeType": 3, "parentNode": {"nodeType": 1, "id": "p"}},
        }));
        assert_eq!(
            get_event_target(&native),
            Some(json!({"nodeType": 1, "id": "p"}))
        );
    }

    #[test]
    fn use_element_instance_resolves_to_use_element() {
        let native = NativeEvent::from_value(json!({
            "target": {"correspondingUseElement": {"id": "use"}},
        }));
        assert_eq!(get_event_target(&native), Some(json!({"id": "use"})));
    }

    #[test]
    fn missing_target_is_none() {
        assert_eq!(get_event_target(&NativeEvent::from_value(json!({}))), None);
    }

    #[test]
    fn legacy_host_gets_return_value_and_cancel_bubble() {
        let mut native = NativeEvent::from_value(json!({}));
        native.prevent_default();
        native.stop_propagation();
        assert_eq!(native.get("returnValue"), Some(&json!(false)));
        assert_eq!(native.get("cancelBubble"), Some(&json!(true)));
    }

    #[test]
    fn host_operations_replace_legacy_fields() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let mut native = NativeEvent::from_value(json!({}))
            .with_prevent_default(move |_| counter.set(counter.get() + 1));
        native.prevent_default();
        assert_eq!(calls.get(), 1);
        assert!(native.get("returnValue").is_none());
    }

    #[test]
    fn standard_host_respects_cancelable() {
        let mut native = NativeEvent::standard(
            json!({"cancelable": false}).as_object().cloned().unwrap_or_default(),
        );
        native.prevent_default();
        assert!(!native.reports_default_prevented());
    }

    #[test]
    fn default_prevented_detection() {
        assert!(NativeEvent::from_value(json!({"defaultPrevented": true})).reports_default_prevented());
        assert!(NativeEvent::from_value(json!({"returnValue": false})).reports_default_prevented());
        assert!(!NativeEvent::from_value(json!({"defaultPrevented": false, "returnValue": false}))
            .reports_default_prevented());
        assert!(!NativeEvent::from_value(json!({})).reports_default_prevented());
    }
}
