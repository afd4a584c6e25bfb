use std::sync::{Arc, LazyLock};

use serde_json::Value;

use crate::event::InstanceHandle;
use crate::interface::{base_interface, EventInterface, FieldSpec};
use crate::native::NativeEvent;

// `touchHistory` never comes from the native event. Declaring it means the
// responder plugin can fill it in and the pool still clears it on release.
static RESPONDER: LazyLock<Arc<EventInterface>> = LazyLock::new(|| {
    Arc::new(base_interface().extend(
        "responder",
        [("touchHistory", FieldSpec::Derive(touch_history))],
    ))
});

/// Gesture responder events.
pub fn responder() -> Arc<EventInterface> {
    Arc::clone(&RESPONDER)
}

fn touch_history(_: &NativeEvent, _: Option<InstanceHandle>) -> Option<Value> {
    Some(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{DispatchConfig, SyntheticEvent};
    use serde_json::json;

    #[test]
    fn touch_history_ignores_native_event() {
        let mut event = SyntheticEvent::new(
            responder(),
            DispatchConfig::default(),
            Some(InstanceHandle(3)),
            NativeEvent::from_value(json!({"touchHistory": {"bogus": true}})),
            None,
        );
        assert_eq!(event.value("touchHistory").unwrap(), Some(&Value::Null));

        event
            .set_field("touchHistory", json!({"numberActiveTouches": 1}))
            .unwrap();
        assert_eq!(
            event.value("touchHistory").unwrap(),
            Some(&json!({"numberActiveTouches": 1}))
        );
    }
}
