use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::interface::{EventInterface, FieldSpec};
use crate::native::{get_event_target, NativeEvent};

/// Opaque handle to the component instance that owns a listener or target.
/// Issued and interpreted by the reconciler; never dereferenced here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceHandle(pub u64);

/// Routing metadata supplied by the dispatch pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchConfig {
    #[serde(default)]
    pub registration_name: Option<String>,
    #[serde(default)]
    pub phased_registration_names: Option<PhasedRegistrationNames>,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhasedRegistrationNames {
    pub bubbled: String,
    pub captured: String,
}

pub type Listener = Rc<dyn Fn(&mut SyntheticEvent) -> anyhow::Result<()>>;

/// A normalized field as stored on an event.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Value(Value),
    /// Declared by the interface but not provided by the host.
    Unavailable,
    /// The event went back to its pool.
    Released,
}

impl FieldValue {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Unavailable | Self::Released => None,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable)
    }

    pub fn is_released(&self) -> bool {
        matches!(self, Self::Released)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventError {
    #[error("field `{field}` accessed on a released event")]
    Released { field: String },
    #[error("`{interface}` does not declare field `{field}`")]
    UnknownField { interface: String, field: String },
}

/// The event object handed to listeners.
///
/// Every field declared by the event's interface is always present, either
/// as a value or as [`FieldValue::Unavailable`]. Once released to a pool,
/// every field reads as [`FieldValue::Released`] and accessors fail with
/// [`EventError::Released`].
pub struct SyntheticEvent {
    interface: Arc<EventInterface>,
    dispatch_config: Option<DispatchConfig>,
    target_inst: Option<InstanceHandle>,
    native_event: Option<NativeEvent>,
    fields: Vec<FieldValue>,
    default_prevented: bool,
    propagation_stopped: bool,
    persistent: bool,
    released: bool,
    dispatch_listeners: Vec<Listener>,
    dispatch_instances: Vec<InstanceHandle>,
}

impl SyntheticEvent {
    pub fn new(
        interface: Arc<EventInterface>,
        dispatch_config: DispatchConfig,
        target_inst: Option<InstanceHandle>,
        native_event: NativeEvent,
        native_target: Option<Value>,
    ) -> Self {
        let mut event = Self::empty(interface);
        event.initialize(dispatch_config, target_inst, Some(native_event), native_target);
        event
    }

    /// An event with no native counterpart, e.g. one raised by a plugin.
    pub fn synthetic(interface: Arc<EventInterface>, dispatch_config: DispatchConfig) -> Self {
        let mut event = Self::empty(interface);
        event.initialize(dispatch_config, None, None, None);
        event
    }

    fn empty(interface: Arc<EventInterface>) -> Self {
        Self {
            interface,
            dispatch_config: None,
            target_inst: None,
            native_event: None,
            fields: Vec::new(),
            default_prevented: false,
            propagation_stopped: false,
            persistent: false,
            released: true,
            dispatch_listeners: Vec::new(),
            dispatch_instances: Vec::new(),
        }
    }

    /// Overwrite every field from the interface. Used for fresh construction
    /// and for pooled reuse, so nothing from a previous dispatch survives.
    pub(crate) fn initialize(
        &mut self,
        dispatch_config: DispatchConfig,
        target_inst: Option<InstanceHandle>,
        native_event: Option<NativeEvent>,
        native_target: Option<Value>,
    ) {
        let interface = &self.interface;
        self.fields.clear();
        self.fields.extend(interface.fields().map(|(name, spec)| {
            resolve_field(
                name,
                spec,
                native_event.as_ref(),
                target_inst,
                native_target.as_ref(),
            )
        }));

        self.default_prevented = native_event
            .as_ref()
            .is_some_and(NativeEvent::reports_default_prevented);
        self.propagation_stopped = false;
        self.persistent = false;
        self.released = false;
        self.dispatch_listeners.clear();
        self.dispatch_instances.clear();
        self.dispatch_config = Some(dispatch_config);
        self.target_inst = target_inst;
        self.native_event = native_event;
    }

    pub(crate) fn reinitialize(
        &mut self,
        interface: &Arc<EventInterface>,
        dispatch_config: DispatchConfig,
        target_inst: Option<InstanceHandle>,
        native_event: NativeEvent,
        native_target: Option<Value>,
    ) {
        if !Arc::ptr_eq(&self.interface, interface) {
            self.interface = Arc::clone(interface);
        }
        self.initialize(dispatch_config, target_inst, Some(native_event), native_target);
    }

    /// Poison the event before it goes back to a pool.
    pub(crate) fn destruct(&mut self) {
        for field in &mut self.fields {
            *field = FieldValue::Released;
        }
        self.dispatch_config = None;
        self.target_inst = None;
        self.native_event = None;
        self.default_prevented = false;
        self.propagation_stopped = false;
        self.persistent = false;
        self.dispatch_listeners.clear();
        self.dispatch_instances.clear();
        self.released = true;
    }

    pub fn interface(&self) -> &Arc<EventInterface> {
        &self.interface
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn field(&self, name: &str) -> Result<&FieldValue, EventError> {
        if self.released {
            warn!(target: "event", field = name, kind = self.interface.name(), "read of released event");
            return Err(EventError::Released {
                field: name.to_string(),
            });
        }
        let idx = self.position(name)?;
        Ok(&self.fields[idx])
    }

    /// The field's value, or `None` when the host did not provide it.
    pub fn value(&self, name: &str) -> Result<Option<&Value>, EventError> {
        self.field(name).map(FieldValue::as_value)
    }

    /// Overwrite a declared field, e.g. when a plugin fills in data the
    /// native event does not carry.
    pub fn set_field(&mut self, name: &str, value: Value) -> Result<(), EventError> {
        if self.released {
            warn!(target: "event", field = name, kind = self.interface.name(), "write to released event");
            return Err(EventError::Released {
                field: name.to_string(),
            });
        }
        let idx = self.position(name)?;
        self.fields[idx] = FieldValue::Value(value);
        Ok(())
    }

    fn position(&self, name: &str) -> Result<usize, EventError> {
        self.interface
            .position(name)
            .ok_or_else(|| EventError::UnknownField {
                interface: self.interface.name().to_string(),
                field: name.to_string(),
            })
    }

    pub fn event_type(&self) -> Option<&str> {
        self.value("type").ok().flatten().and_then(Value::as_str)
    }

    pub fn target(&self) -> Result<Option<&Value>, EventError> {
        self.value("target")
    }

    pub fn native_event(&self) -> Option<&NativeEvent> {
        self.native_event.as_ref()
    }

    pub fn dispatch_config(&self) -> Option<&DispatchConfig> {
        self.dispatch_config.as_ref()
    }

    pub fn target_inst(&self) -> Option<InstanceHandle> {
        self.target_inst
    }

    pub fn prevent_default(&mut self) {
        if self.released {
            warn!(target: "event", kind = self.interface.name(), "preventDefault on released event");
            return;
        }
        self.default_prevented = true;
        if let Some(idx) = self.interface.position("defaultPrevented") {
            self.fields[idx] = FieldValue::Value(Value::Bool(true));
        }
        if let Some(native) = self.native_event.as_mut() {
            native.prevent_default();
        }
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn stop_propagation(&mut self) {
        if self.released {
            warn!(target: "event", kind = self.interface.name(), "stopPropagation on released event");
            return;
        }
        self.propagation_stopped = true;
        if let Some(native) = self.native_event.as_mut() {
            native.stop_propagation();
        }
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    /// Keep this event out of the pool after the current dispatch so it can
    /// be held past it.
    pub fn persist(&mut self) {
        self.persistent = true;
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    pub fn accumulate_dispatch(&mut self, listener: Listener, instance: InstanceHandle) {
        self.dispatch_listeners.push(listener);
        self.dispatch_instances.push(instance);
    }

    pub fn dispatch_listeners(&self) -> &[Listener] {
        &self.dispatch_listeners
    }

    pub fn dispatch_instances(&self) -> &[InstanceHandle] {
        &self.dispatch_instances
    }

    pub(crate) fn take_dispatches(&mut self) -> (Vec<Listener>, Vec<InstanceHandle>) {
        (
            std::mem::take(&mut self.dispatch_listeners),
            std::mem::take(&mut self.dispatch_instances),
        )
    }

    pub(crate) fn set_current_target(&mut self, instance: Option<InstanceHandle>) {
        if let Some(idx) = self.interface.position("currentTarget") {
            self.fields[idx] = FieldValue::Value(match instance {
                Some(InstanceHandle(id)) => Value::from(id),
                None => Value::Null,
            });
        }
    }

    /// Normalized fields as a JSON object; unavailable fields are omitted.
    pub fn to_json(&self) -> Result<Value, EventError> {
        if self.released {
            return Err(EventError::Released {
                field: String::from("*"),
            });
        }
        let mut map = Map::new();
        for ((name, _), field) in self.interface.fields().zip(&self.fields) {
            if let FieldValue::Value(value) = field {
                map.insert(name.to_string(), value.clone());
            }
        }
        Ok(Value::Object(map))
    }
}

fn resolve_field(
    name: &str,
    spec: &FieldSpec,
    native: Option<&NativeEvent>,
    target_inst: Option<InstanceHandle>,
    native_target: Option<&Value>,
) -> FieldValue {
    let value = match spec {
        FieldSpec::Constant(value) => Some(value.clone()),
        FieldSpec::Target => native_target
            .cloned()
            .or_else(|| native.and_then(get_event_target)),
        FieldSpec::Native => native.and_then(|native| native.get(name).cloned()),
        FieldSpec::Derive(extract) => native.and_then(|native| extract(native, target_inst)),
    };
    value.map_or(FieldValue::Unavailable, FieldValue::Value)
}

impl fmt::Debug for SyntheticEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntheticEvent")
            .field("kind", &self.interface.name())
            .field("fields", &self.fields)
            .field("native_event", &self.native_event)
            .field("default_prevented", &self.default_prevented)
            .field("propagation_stopped", &self.propagation_stopped)
            .field("persistent", &self.persistent)
            .field("released", &self.released)
            .field("dispatch_instances", &self.dispatch_instances)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::base_interface;
    use serde_json::json;

    fn event_for(native: Value) -> SyntheticEvent {
        SyntheticEvent::new(
            base_interface(),
            DispatchConfig::default(),
            None,
            NativeEvent::from_value(native),
            None,
        )
    }

    #[test]
    fn every_declared_field_is_present() {
        let event = event_for(json!({"type": "click", "bubbles": true}));
        for (name, _) in base_interface().fields() {
            assert!(event.field(name).is_ok(), "missing {name}");
        }
        assert_eq!(event.value("type").unwrap(), Some(&json!("click")));
        assert!(event.field("eventPhase").unwrap().is_unavailable());
        assert_eq!(event.value("currentTarget").unwrap(), Some(&Value::Null));
    }

    #[test]
    fn present_null_differs_from_absent() {
        let event = event_for(json!({"isTrusted": null}));
        assert_eq!(event.value("isTrusted").unwrap(), Some(&Value::Null));
        assert!(event.field("cancelable").unwrap().is_unavailable());
    }

    #[test]
    fn undeclared_field_is_an_error() {
        let event = event_for(json!({"clientX": 4}));
        assert!(matches!(
            event.field("clientX"),
            Err(EventError::UnknownField { .. })
        ));
    }

    #[test]
    fn prevent_default_marks_field_and_flag() {
        let mut event = event_for(json!({}));
        assert!(!event.is_default_prevented());
        event.prevent_default();
        assert!(event.is_default_prevented());
        assert!(event.is_default_prevented());
        assert_eq!(event.value("defaultPrevented").unwrap(), Some(&json!(true)));
    }

    #[test]
    fn synthetic_only_event_is_safe() {
        let mut event = SyntheticEvent::synthetic(base_interface(), DispatchConfig::default());
        event.prevent_default();
        event.stop_propagation();
        assert!(event.is_default_prevented());
        assert!(event.is_propagation_stopped());
        assert!(event.native_event().is_none());
        assert!(event.field("type").unwrap().is_unavailable());
    }

    #[test]
    fn destruct_poisons_everything() {
        let mut event = event_for(json!({"type": "click"}));
        event.persist();
        let noop: Listener = Rc::new(|_: &mut SyntheticEvent| Ok(()));
        event.accumulate_dispatch(noop, InstanceHandle(1));
        event.destruct();

        assert!(event.is_released());
        assert!(event.fields.iter().all(FieldValue::is_released));
        assert!(event.native_event().is_none());
        assert!(event.dispatch_config().is_none());
        assert!(event.dispatch_listeners().is_empty());
        assert!(!event.is_persistent());
        assert_eq!(
            event.value("type"),
            Err(EventError::Released {
                field: "type".to_string()
            })
        );
        assert!(event.to_json().is_err());
    }

    #[test]
    fn to_json_skips_unavailable_fields() {
        let event = event_for(json!({"type": "copy", "timeStamp": 7}));
        let json = event.to_json().unwrap();
        assert_eq!(json["type"], json!("copy"));
        assert_eq!(json["timeStamp"], json!(7));
        assert!(json.get("eventPhase").is_none());
    }
}
