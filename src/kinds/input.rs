use std::sync::{Arc, LazyLock};

use crate::interface::{base_interface, EventInterface, FieldSpec};

static COMPOSITION: LazyLock<Arc<EventInterface>> = LazyLock::new(|| {
    Arc::new(base_interface().extend("composition", [("data", FieldSpec::Native)]))
});

static INPUT: LazyLock<Arc<EventInterface>> =
    LazyLock::new(|| Arc::new(base_interface().extend("input", [("data", FieldSpec::Native)])));

/// IME composition start, update and end.
pub fn composition() -> Arc<EventInterface> {
    Arc::clone(&COMPOSITION)
}

/// `beforeinput`/`textInput`, carrying the inserted characters.
pub fn input() -> Arc<EventInterface> {
    Arc::clone(&INPUT)
}
