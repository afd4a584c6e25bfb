use std::str::FromStr;
use std::sync::{Arc, LazyLock};

use keyboard_types::{Key, Modifiers};
use serde_json::Value;

use crate::event::{InstanceHandle, SyntheticEvent};
use crate::interface::{EventInterface, FieldSpec};
use crate::native::{truthy, NativeEvent};

static KEYBOARD: LazyLock<Arc<EventInterface>> = LazyLock::new(|| {
    Arc::new(super::ui().extend(
        "keyboard",
        [
            ("key", FieldSpec::Derive(key)),
            ("code", FieldSpec::Native),
            ("location", FieldSpec::Native),
            ("ctrlKey", FieldSpec::Native),
            ("shiftKey", FieldSpec::Native),
            ("altKey", FieldSpec::Native),
            ("metaKey", FieldSpec::Native),
            ("repeat", FieldSpec::Native),
            ("locale", FieldSpec::Native),
            ("charCode", FieldSpec::Derive(char_code)),
            ("keyCode", FieldSpec::Derive(key_code)),
            ("which", FieldSpec::Derive(which)),
        ],
    ))
});

pub fn keyboard() -> Arc<EventInterface> {
    Arc::clone(&KEYBOARD)
}

const MODIFIER_FIELDS: [(Modifiers, &str); 4] = [
    (Modifiers::ALT, "altKey"),
    (Modifiers::CONTROL, "ctrlKey"),
    (Modifiers::META, "metaKey"),
    (Modifiers::SHIFT, "shiftKey"),
];

impl SyntheticEvent {
    /// Modifier keys held when the event fired. Kinds without modifier
    /// fields report none.
    pub fn modifiers(&self) -> Modifiers {
        MODIFIER_FIELDS
            .iter()
            .filter(|(_, field)| self.value(field).ok().flatten().is_some_and(truthy))
            .fold(Modifiers::empty(), |held, (flag, _)| held | *flag)
    }

    /// `getModifierState` for the four keys every host reports.
    pub fn modifier_state(&self, key: &str) -> bool {
        let flag = match key {
            "Alt" => Modifiers::ALT,
            "Control" => Modifiers::CONTROL,
            "Meta" => Modifiers::META,
            "Shift" => Modifiers::SHIFT,
            _ => return false,
        };
        self.modifiers().contains(flag)
    }
}

/// Map legacy key names onto the standard ones; anything the standard does
/// not know becomes `Unidentified`.
pub fn normalize_key(raw: &str) -> String {
    let name = match raw {
        "Esc" => "Escape",
        "Spacebar" => " ",
        "Left" => "ArrowLeft",
        "Up" => "ArrowUp",
        "Right" => "ArrowRight",
        "Down" => "ArrowDown",
        "Del" => "Delete",
        "Win" => "Meta",
        "Menu" | "Apps" => "ContextMenu",
        "Scroll" => "ScrollLock",
        "MozPrintableKey" => "Unidentified",
        other => other,
    };
    Key::from_str(name)
        .unwrap_or(Key::Unidentified)
        .to_string()
}

fn key(native: &NativeEvent, _: Option<InstanceHandle>) -> Option<Value> {
    if let Some(raw) = native
        .get("key")
        .and_then(Value::as_str)
        .filter(|raw| !raw.is_empty())
    {
        let key = normalize_key(raw);
        if key != "Unidentified" {
            return Some(Value::String(key));
        }
    }

    let key = match native.event_type() {
        Some("keypress") => match event_char_code(native) {
            13 => String::from("Enter"),
            code => char::from_u32(code).map(String::from).unwrap_or_default(),
        },
        Some("keydown" | "keyup") => {
            translate_key_code(number(native, "keyCode")).unwrap_or_else(|| String::from("Unidentified"))
        }
        _ => String::new(),
    };
    Some(Value::String(key))
}

fn char_code(native: &NativeEvent, _: Option<InstanceHandle>) -> Option<Value> {
    match native.event_type() {
        Some("keypress") => Some(Value::from(event_char_code(native))),
        _ => Some(Value::from(0)),
    }
}

fn key_code(native: &NativeEvent, _: Option<InstanceHandle>) -> Option<Value> {
    match native.event_type() {
        Some("keydown" | "keyup") => Some(Value::from(number(native, "keyCode"))),
        _ => Some(Value::from(0)),
    }
}

fn which(native: &NativeEvent, _: Option<InstanceHandle>) -> Option<Value> {
    match native.event_type() {
        Some("keypress") => Some(Value::from(event_char_code(native))),
        Some("keydown" | "keyup") => Some(Value::from(number(native, "keyCode"))),
        _ => Some(Value::from(0)),
    }
}

fn number(native: &NativeEvent, name: &str) -> u32 {
    native
        .get(name)
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(0)
}

/// Printable character code of a keypress; control characters other than
/// Enter report 0.
fn event_char_code(native: &NativeEvent) -> u32 {
    let key_code = number(native, "keyCode");
    let mut code = if native.contains("charCode") {
        match number(native, "charCode") {
            0 if key_code == 13 => 13,
            code => code,
        }
    } else {
        key_code
    };

    // Ctrl+Enter reports a line feed on some hosts.
    if code == 10 {
        code = 13;
    }

    if code >= 32 || code == 13 {
        code
    } else {
        0
    }
}

fn translate_key_code(key_code: u32) -> Option<String> {
    let name = match key_code {
        8 => "Backspace",
        9 => "Tab",
        12 => "Clear",
        13 => "Enter",
        16 => "Shift",
        17 => "Control",
        18 => "Alt",
        19 => "Pause",
        20 => "CapsLock",
        27 => "Escape",
        32 => " ",
        33 => "PageUp",
        34 => "PageDown",
        35 => "End",
        36 => "Home",
        37 => "ArrowLeft",
        38 => "ArrowUp",
        39 => "ArrowRight",
        40 => "ArrowDown",
        45 => "Insert",
        46 => "Delete",
        112..=123 => return Some(format!("F{}", key_code - 111)),
        144 => "NumLock",
        145 => "ScrollLock",
        224 => "Meta",
        _ => return None,
    };
    Some(name.to_string())
}
