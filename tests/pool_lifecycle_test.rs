use serde_json::{json, Value};
use synthetic_events::{
    kinds, DispatchConfig, EventPool, InstanceHandle, NativeEvent, PoolConfig, PoolError,
    ReleaseOutcome,
};

fn acquire(pool: &mut EventPool, native: Value) -> synthetic_events::EventId {
    pool.acquire(
        &kinds::clipboard(),
        DispatchConfig::default(),
        Some(InstanceHandle(1)),
        NativeEvent::from_value(native),
        None,
    )
}

#[test]
fn second_acquisition_sees_only_its_own_inputs() {
    let mut pool = EventPool::new(PoolConfig::default());

    let first = acquire(
        &mut pool,
        json!({
            "type": "copy",
            "target": {"id": "editor"},
            "clipboardData": {"text/plain": "secret"},
            "isTrusted": true,
        }),
    );
    {
        let event = pool.event_mut(first).unwrap();
        event.stop_propagation();
        event.prevent_default();
    }
    assert_eq!(pool.release(first), Ok(ReleaseOutcome::Pooled));

    let second = acquire(&mut pool, json!({"type": "paste"}));
    let event = pool.event(second).unwrap();

    assert_eq!(event.event_type(), Some("paste"));
    assert!(event.target().unwrap().is_none());
    assert!(event.field("clipboardData").unwrap().is_unavailable());
    assert!(event.field("isTrusted").unwrap().is_unavailable());
    assert!(!event.is_default_prevented());
    assert!(!event.is_propagation_stopped());
    assert!(!event.native_event().unwrap().contains("cancelBubble"));
    assert_eq!(pool.stats().reused, 1);
}

#[test]
fn reads_through_a_released_handle_fail() {
    let mut pool = EventPool::default();
    let id = acquire(&mut pool, json!({"type": "cut"}));
    pool.release(id).unwrap();

    assert_eq!(pool.event(id).unwrap_err(), PoolError::Released(id));
    assert!(pool.event_mut(id).is_err());
    assert_eq!(pool.release(id), Err(PoolError::AlreadyReleased(id)));
}

#[test]
fn per_kind_capacity_override() {
    let config = PoolConfig::default().with_kind_capacity("clipboard", 1);
    let mut pool = EventPool::new(config);

    let a = acquire(&mut pool, json!({}));
    let b = acquire(&mut pool, json!({}));
    assert_eq!(pool.release(a), Ok(ReleaseOutcome::Pooled));
    assert_eq!(pool.release(b), Ok(ReleaseOutcome::Dropped));
    assert_eq!(pool.pooled("clipboard"), 1);
}

#[tokio::test]
async fn persisted_event_survives_an_await() {
    let mut pool = EventPool::default();
    let id = acquire(&mut pool, json!({"type": "paste", "clipboardData": {"text/plain": "kept"}}));
    pool.event_mut(id).unwrap().persist();

    assert_eq!(pool.release(id), Ok(ReleaseOutcome::Persisted));
    let event = pool.detach(id).unwrap();

    // Later acquisitions must not be able to recycle the retained event.
    let other = acquire(&mut pool, json!({"type": "copy"}));
    pool.release(other).unwrap();

    tokio::task::yield_now().await;

    assert!(!event.is_released());
    assert_eq!(
        event.value("clipboardData").unwrap(),
        Some(&json!({"text/plain": "kept"}))
    );
    assert_eq!(pool.stats().persisted, 0);
}
