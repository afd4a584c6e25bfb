//! Declarative field interfaces.
//!
//! An [`EventInterface`] lists every normalized field an event kind carries
//! and how to derive it from the native event. Specialized kinds are built by
//! [`extend`]ing the base interface rather than by overriding behavior.

use std::sync::{Arc, LazyLock};
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{json, Value};

use crate::event::InstanceHandle;
use crate::native::{truthy, NativeEvent};

/// Derives a field from the native event and the owning instance.
/// `None` means the value is not available on this host.
pub type Extractor = fn(&NativeEvent, Option<InstanceHandle>) -> Option<Value>;

#[derive(Debug, Clone)]
pub enum FieldSpec {
    /// Copy the native property with the same name.
    Native,
    /// Always this value.
    Constant(Value),
    Derive(Extractor),
    /// The resolved interaction target.
    Target,
}

#[derive(Debug, Clone)]
pub struct EventInterface {
    name: String,
    fields: Vec<(&'static str, FieldSpec)>,
}

impl EventInterface {
    pub fn new(
        name: impl Into<String>,
        fields: impl IntoIterator<Item = (&'static str, FieldSpec)>,
    ) -> Self {
        let mut interface = Self {
            name: name.into(),
            fields: Vec::new(),
        };
        interface.merge(fields);
        interface
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &FieldSpec)> + '_ {
        self.fields.iter().map(|(name, spec)| (*name, spec))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn spec(&self, field: &str) -> Option<&FieldSpec> {
        self.position(field).map(|idx| &self.fields[idx].1)
    }

    pub fn declares(&self, field: &str) -> bool {
        self.position(field).is_some()
    }

    pub(crate) fn position(&self, field: &str) -> Option<usize> {
        self.fields.iter().position(|(name, _)| *name == field)
    }

    /// See [`extend`].
    pub fn extend(
        &self,
        name: impl Into<String>,
        additions: impl IntoIterator<Item = (&'static str, FieldSpec)>,
    ) -> Self {
        extend(self, name, additions)
    }

    fn merge(&mut self, additions: impl IntoIterator<Item = (&'static str, FieldSpec)>) {
        for (field, spec) in additions {
            match self.position(field) {
                Some(idx) => self.fields[idx].1 = spec,
                None => self.fields.push((field, spec)),
            }
        }
    }
}

/// Produce a new interface holding every field of `base` plus `additions`.
///
/// Shallow merge: an addition replaces a base field of the same name in
/// place, new fields are appended. Neither input is modified.
pub fn extend(
    base: &EventInterface,
    name: impl Into<String>,
    additions: impl IntoIterator<Item = (&'static str, FieldSpec)>,
) -> EventInterface {
    let mut merged = EventInterface {
        name: name.into(),
        fields: base.fields.clone(),
    };
    merged.merge(additions);
    merged
}

static BASE: LazyLock<Arc<EventInterface>> = LazyLock::new(|| {
    Arc::new(EventInterface::new(
        "event",
        [
            ("type", FieldSpec::Native),
            ("target", FieldSpec::Target),
            ("currentTarget", FieldSpec::Constant(Value::Null)),
            ("eventPhase", FieldSpec::Native),
            ("bubbles", FieldSpec::Native),
            ("cancelable", FieldSpec::Native),
            ("timeStamp", FieldSpec::Derive(time_stamp)),
            ("defaultPrevented", FieldSpec::Native),
            ("isTrusted", FieldSpec::Native),
        ],
    ))
});

/// The interface every event kind starts from.
pub fn base_interface() -> Arc<EventInterface> {
    Arc::clone(&BASE)
}

fn time_stamp(native: &NativeEvent, _: Option<InstanceHandle>) -> Option<Value> {
    match native.get("timeStamp") {
        Some(value) if truthy(value) => Some(value.clone()),
        _ => Some(json!(now_millis())),
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}
