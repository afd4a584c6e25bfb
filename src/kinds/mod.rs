//! Interfaces for the concrete event kinds.
//!
//! Each kind is the base interface extended with its own fields. The shared
//! instances are built once and handed out as cheap `Arc` clones.

use std::sync::Arc;

use crate::interface::{base_interface, EventInterface};

mod clipboard;
mod input;
mod keyboard;
mod mouse;
mod responder;
mod ui;

pub use clipboard::clipboard;
pub use input::{composition, input};
pub use keyboard::{keyboard, normalize_key};
pub use mouse::mouse;
pub use responder::responder;
pub use ui::{focus, ui};

/// Look up a shared interface by its kind name.
pub fn by_name(name: &str) -> Option<Arc<EventInterface>> {
    let interface = match name {
        "event" => base_interface(),
        "clipboard" => clipboard(),
        "composition" => composition(),
        "input" => input(),
        "responder" => responder(),
        "ui" => ui(),
        "focus" => focus(),
        "keyboard" => keyboard(),
        "mouse" => mouse(),
        _ => return None,
    };
    Some(interface)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for name in [
            "event",
            "clipboard",
            "composition",
            "input",
            "responder",
            "ui",
            "focus",
            "keyboard",
            "mouse",
        ] {
            let interface = by_name(name).expect("known kind");
            assert_eq!(interface.name(), name);
        }
        assert!(by_name("wheel").is_none());
    }

    #[test]
    fn every_kind_keeps_base_fields() {
        let base = base_interface();
        for interface in [clipboard(), input(), responder(), focus(), keyboard(), mouse()] {
            for (field, _) in base.fields() {
                assert!(interface.declares(field), "{} lost {field}", interface.name());
            }
        }
    }

    #[test]
    fn shared_instances_are_reused() {
        assert!(Arc::ptr_eq(&clipboard(), &clipboard()));
    }
}
