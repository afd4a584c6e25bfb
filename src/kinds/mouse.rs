use std::sync::{Arc, LazyLock};

use serde_json::Value;

use crate::event::InstanceHandle;
use crate::interface::{EventInterface, FieldSpec};
use crate::native::NativeEvent;

static MOUSE: LazyLock<Arc<EventInterface>> = LazyLock::new(|| {
    Arc::new(super::ui().extend(
        "mouse",
        [
            ("screenX", FieldSpec::Native),
            ("screenY", FieldSpec::Native),
            ("clientX", FieldSpec::Native),
            ("clientY", FieldSpec::Native),
            ("pageX", FieldSpec::Derive(page_x)),
            ("pageY", FieldSpec::Derive(page_y)),
            ("ctrlKey", FieldSpec::Native),
            ("shiftKey", FieldSpec::Native),
            ("altKey", FieldSpec::Native),
            ("metaKey", FieldSpec::Native),
            ("button", FieldSpec::Native),
            ("buttons", FieldSpec::Native),
            ("relatedTarget", FieldSpec::Derive(related_target)),
        ],
    ))
});

pub fn mouse() -> Arc<EventInterface> {
    Arc::clone(&MOUSE)
}

fn page_x(native: &NativeEvent, _: Option<InstanceHandle>) -> Option<Value> {
    page_coordinate(native, "pageX", "clientX", "scrollX")
}

fn page_y(native: &NativeEvent, _: Option<InstanceHandle>) -> Option<Value> {
    page_coordinate(native, "pageY", "clientY", "scrollY")
}

// Hosts without page coordinates get client coordinates plus the scroll
// offset of the view.
fn page_coordinate(native: &NativeEvent, page: &str, client: &str, scroll: &str) -> Option<Value> {
    if native.contains(page) {
        return native.get(page).cloned();
    }
    let client = native.get(client).and_then(Value::as_f64)?;
    let scroll = native
        .get("view")
        .and_then(|view| view.get(scroll))
        .and_then(Value::as_f64)
        .unwrap_or(0.0);
    serde_json::Number::from_f64(client + scroll).map(Value::Number)
}

fn related_target(native: &NativeEvent, _: Option<InstanceHandle>) -> Option<Value> {
    if let Some(related) = native.get("relatedTarget").filter(|value| !value.is_null()) {
        return Some(related.clone());
    }
    let from = native.get("fromElement");
    if from == native.get("srcElement") {
        native.get("toElement").cloned()
    } else {
        from.cloned()
    }
}
