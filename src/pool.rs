//! Per-kind free lists of synthetic events.
//!
//! Acquired events live in slots addressed by [`EventId`], a generational
//! handle: once an event is released its id goes stale, so reads through a
//! handle kept past release fail instead of observing a recycled event.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::config::PoolConfig;
use crate::event::{DispatchConfig, InstanceHandle, SyntheticEvent};
use crate::interface::EventInterface;
use crate::native::NativeEvent;

/// Handle to an acquired event.
///
/// A slot starts at generation 1 and moves to the next generation each time
/// it is reused, so an id never aliases a later occupant of its slot.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct EventId {
    idx: u32,
    generation: u32,
}

impl EventId {
    fn idx(self) -> usize {
        self.idx as usize
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    #[error("event {0:?} was released")]
    Released(EventId),
    #[error("event {0:?} was already released")]
    AlreadyReleased(EventId),
    #[error("event {0:?} was not persisted")]
    NotPersisted(EventId),
    #[error("thread pool is already in use on this thread")]
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReleaseOutcome {
    /// Poisoned and kept for reuse.
    Pooled,
    /// Poisoned and dropped; the free list was full.
    Dropped,
    /// Left alone for whoever called `persist`.
    Persisted,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub live: usize,
    pub persisted: usize,
    pub pooled: usize,
    pub constructed: u64,
    pub reused: u64,
    pub dropped: u64,
}

#[derive(Debug)]
enum SlotState {
    Vacant,
    Live(SyntheticEvent),
    Persisted(SyntheticEvent),
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    state: SlotState,
}

#[derive(Debug, Default)]
pub struct EventPool {
    config: PoolConfig,
    slots: Vec<Slot>,
    vacant: Vec<u32>,
    free_lists: HashMap<String, Vec<SyntheticEvent>>,
    constructed: u64,
    reused: u64,
    dropped: u64,
}

impl EventPool {
    pub fn new(config: PoolConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Hand out an event of the given kind, reusing a pooled one when the
    /// kind's free list is not empty.
    pub fn acquire(
        &mut self,
        interface: &Arc<EventInterface>,
        dispatch_config: DispatchConfig,
        target_inst: Option<InstanceHandle>,
        native_event: NativeEvent,
        native_target: Option<Value>,
    ) -> EventId {
        let pooled = self
            .free_lists
            .get_mut(interface.name())
            .and_then(Vec::pop);
        let reused = pooled.is_some();
        let event = match pooled {
            Some(mut event) => {
                event.reinitialize(
                    interface,
                    dispatch_config,
                    target_inst,
                    native_event,
                    native_target,
                );
                self.reused += 1;
                event
            }
            None => {
                self.constructed += 1;
                SyntheticEvent::new(
                    Arc::clone(interface),
                    dispatch_config,
                    target_inst,
                    native_event,
                    native_target,
                )
            }
        };

        let id = self.insert(event);
        debug!(target: "pool", kind = interface.name(), ?id, reused, "acquired event");
        id
    }

    fn insert(&mut self, event: SyntheticEvent) -> EventId {
        if let Some(idx) = self.vacant.pop() {
            let slot = &mut self.slots[idx as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.state = SlotState::Live(event);
            return EventId {
                idx,
                generation: slot.generation,
            };
        }

        let idx = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 1,
            state: SlotState::Live(event),
        });
        EventId { idx, generation: 1 }
    }

    fn slot(&self, id: EventId) -> Option<&Slot> {
        self.slots
            .get(id.idx())
            .filter(|slot| slot.generation == id.generation)
    }

    fn slot_mut(&mut self, id: EventId) -> Option<&mut Slot> {
        self.slots
            .get_mut(id.idx())
            .filter(|slot| slot.generation == id.generation)
    }

    pub fn is_live(&self, id: EventId) -> bool {
        matches!(
            self.slot(id).map(|slot| &slot.state),
            Some(SlotState::Live(_))
        )
    }

    /// Read an acquired or persisted event.
    pub fn event(&self, id: EventId) -> Result<&SyntheticEvent, PoolError> {
        match self.slot(id).map(|slot| &slot.state) {
            Some(SlotState::Live(event) | SlotState::Persisted(event)) => Ok(event),
            _ => {
                warn!(target: "pool", ?id, "access to released event");
                Err(PoolError::Released(id))
            }
        }
    }

    pub fn event_mut(&mut self, id: EventId) -> Result<&mut SyntheticEvent, PoolError> {
        match self.slot_mut(id).map(|slot| &mut slot.state) {
            Some(SlotState::Live(event) | SlotState::Persisted(event)) => Ok(event),
            _ => {
                warn!(target: "pool", ?id, "access to released event");
                Err(PoolError::Released(id))
            }
        }
    }

    /// Return an event to its kind's free list.
    ///
    /// Persisted events are not recycled: they stay readable through `id`
    /// until [`detach`](Self::detach) hands them to the retainer. Releasing
    /// the same id twice is an error.
    pub fn release(&mut self, id: EventId) -> Result<ReleaseOutcome, PoolError> {
        let Some(slot) = self.slot_mut(id) else {
            warn!(target: "pool", ?id, "double release");
            return Err(PoolError::AlreadyReleased(id));
        };

        let mut event = match std::mem::replace(&mut slot.state, SlotState::Vacant) {
            SlotState::Live(event) if event.is_persistent() => {
                slot.state = SlotState::Persisted(event);
                debug!(target: "pool", ?id, "event persisted, skipping recycle");
                return Ok(ReleaseOutcome::Persisted);
            }
            SlotState::Live(event) => event,
            state @ SlotState::Persisted(_) => {
                slot.state = state;
                warn!(target: "pool", ?id, "double release of persisted event");
                return Err(PoolError::AlreadyReleased(id));
            }
            SlotState::Vacant => {
                warn!(target: "pool", ?id, "double release");
                return Err(PoolError::AlreadyReleased(id));
            }
        };
        self.vacant.push(id.idx);

        event.destruct();
        let kind = event.interface().name().to_string();
        let capacity = self.config.capacity_for(&kind);
        let free_list = self.free_lists.entry(kind).or_default();
        if free_list.len() < capacity {
            free_list.push(event);
            debug!(target: "pool", ?id, pooled = free_list.len(), "released event");
            Ok(ReleaseOutcome::Pooled)
        } else {
            self.dropped += 1;
            trace!(target: "pool", ?id, capacity, "free list full, dropping event");
            Ok(ReleaseOutcome::Dropped)
        }
    }

    /// Take a persisted event out of the pool. Its id goes stale and the
    /// caller owns the event from here on.
    pub fn detach(&mut self, id: EventId) -> Result<SyntheticEvent, PoolError> {
        let slot = self.slot_mut(id).ok_or(PoolError::Released(id))?;
        match std::mem::replace(&mut slot.state, SlotState::Vacant) {
            SlotState::Persisted(event) => {
                self.vacant.push(id.idx);
                Ok(event)
            }
            SlotState::Live(event) => {
                slot.state = SlotState::Live(event);
                Err(PoolError::NotPersisted(id))
            }
            SlotState::Vacant => Err(PoolError::Released(id)),
        }
    }

    /// Number of pooled events waiting for reuse for `kind`.
    pub fn pooled(&self, kind: &str) -> usize {
        self.free_lists.get(kind).map_or(0, Vec::len)
    }

    pub fn stats(&self) -> PoolStats {
        let (live, persisted) =
            self.slots
                .iter()
                .fold((0, 0), |(live, persisted), slot| match slot.state {
                    SlotState::Live(_) => (live + 1, persisted),
                    SlotState::Persisted(_) => (live, persisted + 1),
                    SlotState::Vacant => (live, persisted),
                });
        PoolStats {
            live,
            persisted,
            pooled: self.free_lists.values().map(Vec::len).sum(),
            constructed: self.constructed,
            reused: self.reused,
            dropped: self.dropped,
        }
    }

    #[cfg(test)]
    fn free_list(&self, kind: &str) -> &[SyntheticEvent] {
        self.free_lists.get(kind).map(Vec::as_slice).unwrap_or_default()
    }
}

thread_local! {
    static THREAD_POOL: RefCell<EventPool> = RefCell::new(EventPool::default());
}

/// Run `f` against this thread's shared pool.
///
/// The pool lives as long as the thread. Calling back into this function
/// from inside `f`, e.g. from a listener during a dispatch on the shared
/// pool, fails with [`PoolError::Busy`].
pub fn with_thread_pool<R>(f: impl FnOnce(&mut EventPool) -> R) -> Result<R, PoolError> {
    THREAD_POOL.with(|pool| {
        let Ok(mut pool) = pool.try_borrow_mut() else {
            warn!(target: "pool", "re-entrant use of the thread pool");
            return Err(PoolError::Busy);
        };
        Ok(f(&mut pool))
    })
}
