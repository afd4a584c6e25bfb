//! Pooled, normalized event objects for UI event dispatch.
//!
//! Native events arrive in host-specific shapes. [`SyntheticEvent`] gives
//! listeners one shape per event kind, described by an [`EventInterface`],
//! and [`EventPool`] recycles the event objects between dispatches.

pub mod config;
pub mod dispatch;
pub mod event;
pub mod interface;
pub mod kinds;
pub mod native;
pub mod pool;

// Re-export commonly used types
pub use config::PoolConfig;
pub use dispatch::{dispatch, DispatchError, DispatchOutcome, DispatchRequest};
pub use event::{
    DispatchConfig, EventError, FieldValue, InstanceHandle, Listener, SyntheticEvent,
};
pub use interface::{base_interface, extend, EventInterface, FieldSpec};
pub use native::{get_event_target, NativeEvent};
pub use pool::{with_thread_pool, EventId, EventPool, PoolError, PoolStats, ReleaseOutcome};
