use std::sync::{Arc, LazyLock};

use serde_json::Value;

use crate::event::InstanceHandle;
use crate::interface::{base_interface, EventInterface, FieldSpec};
use crate::native::NativeEvent;

static CLIPBOARD: LazyLock<Arc<EventInterface>> = LazyLock::new(|| {
    Arc::new(base_interface().extend(
        "clipboard",
        [("clipboardData", FieldSpec::Derive(clipboard_data))],
    ))
});

/// Copy, cut and paste.
pub fn clipboard() -> Arc<EventInterface> {
    Arc::clone(&CLIPBOARD)
}

// Hosts without `clipboardData` on the event expose it on the window.
fn clipboard_data(native: &NativeEvent, _: Option<InstanceHandle>) -> Option<Value> {
    if native.contains("clipboardData") {
        return native.get("clipboardData").cloned();
    }
    native
        .get("view")
        .and_then(|view| view.get("clipboardData"))
        .cloned()
}
