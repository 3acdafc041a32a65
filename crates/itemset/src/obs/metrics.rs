use serde::{Deserialize, Serialize};
use std::cell::RefCell;

///
/// Metrics
/// Ephemeral, in-memory counters for remote calls and cache activity.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventOps {
    // Remote collaborator calls
    pub find_calls: u64,
    pub fetch_calls: u64,
    pub delete_calls: u64,

    // Cache activity
    pub cache_fills: u64,

    // Rows touched
    pub rows_listed: u64,
    pub rows_fetched: u64,
    pub rows_deleted: u64,
}

thread_local! {
    static EVENT_OPS: RefCell<EventOps> = RefCell::new(EventOps::default());
}

/// Borrow metrics immutably.
fn with_state<R>(f: impl FnOnce(&EventOps) -> R) -> R {
    EVENT_OPS.with(|m| f(&m.borrow()))
}

/// Borrow metrics mutably.
fn with_state_mut<R>(f: impl FnOnce(&mut EventOps) -> R) -> R {
    EVENT_OPS.with(|m| f(&mut m.borrow_mut()))
}

/// Reset all counters (useful in tests).
pub fn reset() {
    with_state_mut(|m| *m = EventOps::default());
}

/// Point-in-time snapshot of the counters.
#[must_use]
pub fn snapshot() -> EventOps {
    with_state(Clone::clone)
}

#[allow(clippy::cast_possible_truncation)]
pub(crate) fn record_find(rows: usize) {
    with_state_mut(|m| {
        m.find_calls += 1;
        m.rows_listed += rows as u64;
    });
}

#[allow(clippy::cast_possible_truncation)]
pub(crate) fn record_fetch(rows: usize) {
    with_state_mut(|m| {
        m.fetch_calls += 1;
        m.rows_fetched += rows as u64;
    });
}

#[allow(clippy::cast_possible_truncation)]
pub(crate) fn record_delete(rows: usize) {
    with_state_mut(|m| {
        m.delete_calls += 1;
        m.rows_deleted += rows as u64;
    });
}

pub(crate) fn record_cache_fill() {
    with_state_mut(|m| m.cache_fills += 1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_and_reset() {
        reset();
        record_find(3);
        record_fetch(2);
        record_cache_fill();

        let ops = snapshot();
        assert_eq!(ops.find_calls, 1);
        assert_eq!(ops.rows_listed, 3);
        assert_eq!(ops.fetch_calls, 1);
        assert_eq!(ops.rows_fetched, 2);
        assert_eq!(ops.cache_fills, 1);

        reset();
        assert_eq!(snapshot().find_calls, 0);
    }

    #[test]
    fn snapshot_serializes_for_reporting() {
        reset();
        record_delete(4);

        let json = serde_json::to_value(snapshot()).unwrap();
        assert_eq!(json["delete_calls"], 1);
        assert_eq!(json["rows_deleted"], 4);
    }
}
