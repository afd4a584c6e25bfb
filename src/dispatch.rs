//! Reference dispatch pipeline.
//!
//! Acquires an event from a pool, runs the listeners collected for it in
//! order and always hands the event back to the pool, whether the listeners
//! succeed, fail or panic.

use std::rc::Rc;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::event::{DispatchConfig, InstanceHandle, Listener, SyntheticEvent};
use crate::interface::EventInterface;
use crate::native::NativeEvent;
use crate::pool::{EventId, EventPool, PoolError, ReleaseOutcome};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("listener on instance {} failed: {error:#}", .instance.0)]
    Listener {
        instance: InstanceHandle,
        error: anyhow::Error,
    },
    #[error("pool error: {0}")]
    Pool(#[from] PoolError),
}

/// Everything needed to build the event for one dispatch.
#[derive(Debug)]
pub struct DispatchRequest {
    pub interface: Arc<EventInterface>,
    pub dispatch_config: DispatchConfig,
    pub target_inst: Option<InstanceHandle>,
    pub native_event: NativeEvent,
    pub native_target: Option<Value>,
}

impl DispatchRequest {
    pub fn new(interface: Arc<EventInterface>, native_event: NativeEvent) -> Self {
        Self {
            interface,
            dispatch_config: DispatchConfig::default(),
            target_inst: None,
            native_event,
            native_target: None,
        }
    }

    pub fn with_dispatch_config(mut self, dispatch_config: DispatchConfig) -> Self {
        self.dispatch_config = dispatch_config;
        self
    }

    pub fn with_target_inst(mut self, target_inst: InstanceHandle) -> Self {
        self.target_inst = Some(target_inst);
        self
    }

    pub fn with_native_target(mut self, native_target: Value) -> Self {
        self.native_target = Some(native_target);
        self
    }
}

#[derive(Debug)]
pub struct DispatchOutcome {
    pub default_prevented: bool,
    pub propagation_stopped: bool,
    pub listeners_run: usize,
    /// The event, when a listener asked to keep it past the dispatch.
    pub persisted: Option<SyntheticEvent>,
}

/// Run the accumulated listeners in order.
///
/// Stops before the next listener once propagation is stopped, and on the
/// first listener error. `currentTarget` names the listener's owner while it
/// runs. The accumulated sequences are consumed.
pub fn execute_dispatches_in_order(event: &mut SyntheticEvent) -> Result<usize, DispatchError> {
    let (listeners, instances) = event.take_dispatches();
    let mut run = 0;

    for (listener, instance) in listeners.iter().zip(instances) {
        if event.is_propagation_stopped() {
            break;
        }
        event.set_current_target(Some(instance));
        let result = listener(&mut *event);
        event.set_current_target(None);
        run += 1;
        result.map_err(|error| DispatchError::Listener { instance, error })?;
    }

    Ok(run)
}

/// Dispatch one native event to `listeners`, given in traversal order as
/// `(listener, owner)` pairs.
pub fn dispatch(
    pool: &mut EventPool,
    request: DispatchRequest,
    listeners: &[(Listener, InstanceHandle)],
) -> Result<DispatchOutcome, DispatchError> {
    let id = pool.acquire(
        &request.interface,
        request.dispatch_config,
        request.target_inst,
        request.native_event,
        request.native_target,
    );
    debug!(
        target: "dispatch",
        kind = request.interface.name(),
        ?id,
        listeners = listeners.len(),
        "dispatching event"
    );

    let mut guard = ReleaseGuard {
        pool,
        id,
        armed: true,
    };

    let event = guard.event_mut()?;
    for (listener, instance) in listeners {
        event.accumulate_dispatch(Rc::clone(listener), *instance);
    }
    let listeners_run = execute_dispatches_in_order(event)?;
    let default_prevented = event.is_default_prevented();
    let propagation_stopped = event.is_propagation_stopped();

    let persisted = guard.finish()?;
    Ok(DispatchOutcome {
        default_prevented,
        propagation_stopped,
        listeners_run,
        persisted,
    })
}

/// Releases the event on drop unless [`finish`](Self::finish) already did.
struct ReleaseGuard<'a> {
    pool: &'a mut EventPool,
    id: EventId,
    armed: bool,
}

impl ReleaseGuard<'_> {
    fn event_mut(&mut self) -> Result<&mut SyntheticEvent, PoolError> {
        self.pool.event_mut(self.id)
    }

    fn finish(mut self) -> Result<Option<SyntheticEvent>, PoolError> {
        self.armed = false;
        match self.pool.release(self.id)? {
            ReleaseOutcome::Persisted => Ok(Some(self.pool.detach(self.id)?)),
            ReleaseOutcome::Pooled | ReleaseOutcome::Dropped => Ok(None),
        }
    }
}

impl Drop for ReleaseGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        // Nobody can retrieve the event on this path, so a persisted one
        // is detached and dropped here.
        match self.pool.release(self.id) {
            Ok(ReleaseOutcome::Persisted) => {
                warn!(target: "dispatch", id = ?self.id, "dispatch failed, dropping persisted event");
                if let Err(err) = self.pool.detach(self.id) {
                    warn!(target: "dispatch", id = ?self.id, error = %err, "failed to detach event");
                }
            }
            Ok(_) => {}
            Err(err) => {
                warn!(target: "dispatch", id = ?self.id, error = %err, "failed to release event");
            }
        }
    }
}
