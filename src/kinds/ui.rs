use std::sync::{Arc, LazyLock};

use serde_json::Value;

use crate::event::InstanceHandle;
use crate::interface::{base_interface, EventInterface, FieldSpec};
use crate::native::{get_event_target, NativeEvent};

static UI: LazyLock<Arc<EventInterface>> = LazyLock::new(|| {
    Arc::new(base_interface().extend(
        "ui",
        [
            ("view", FieldSpec::Derive(view)),
            ("detail", FieldSpec::Native),
        ],
    ))
});

static FOCUS: LazyLock<Arc<EventInterface>> = LazyLock::new(|| {
    Arc::new(ui().extend("focus", [("relatedTarget", FieldSpec::Native)]))
});

pub fn ui() -> Arc<EventInterface> {
    Arc::clone(&UI)
}

pub fn focus() -> Arc<EventInterface> {
    Arc::clone(&FOCUS)
}

/// The window the event happened in: the event's own `view`, else the
/// default view of the target's owner document.
fn view(native: &NativeEvent, _: Option<InstanceHandle>) -> Option<Value> {
    if let Some(view) = native.get("view").filter(|view| !view.is_null()) {
        return Some(view.clone());
    }
    let target = get_event_target(native)?;
    target
        .get("ownerDocument")
        .and_then(|document| {
            document
                .get("defaultView")
                .or_else(|| document.get("parentWindow"))
        })
        .cloned()
}
