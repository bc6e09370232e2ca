//! Bounded record of processed delivery ids.

use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, PoisonError};

/// Default number of delivery ids remembered.
pub const DEFAULT_DELIVERY_LOG_CAPACITY: usize = 10_000;

/// Remembers the `X-Shopify-Webhook-Id` of recently processed deliveries so
/// redeliveries of an already handled event are acknowledged without running
/// handlers again.
///
/// Oldest ids are evicted first once `capacity` is reached. Two concurrent
/// deliveries of the same id may both be processed; handlers stay idempotent
/// regardless.
#[derive(Debug)]
pub struct DeliveryLog {
    capacity: usize,
    inner: Mutex<LogState>,
}

#[derive(Debug, Default)]
struct LogState {
    seen: HashSet<String>,
    order: VecDeque<String>,
}

impl DeliveryLog {
    /// Creates a log holding at most `capacity` ids. A capacity of 0
    /// disables deduplication.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(LogState::default()),
        }
    }

    /// Returns `true` if `id` was recorded and not yet evicted.
    pub fn contains(&self, id: &str) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .seen
            .contains(id)
    }

    /// Records `id` as processed.
    pub fn record(&self, id: &str) {
        if self.capacity == 0 {
            return;
        }
        let mut state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if !state.seen.insert(id.to_string()) {
            return;
        }
        state.order.push_back(id.to_string());
        while state.order.len() > self.capacity {
            if let Some(evicted) = state.order.pop_front() {
                state.seen.remove(&evicted);
            }
        }
    }

    /// Returns the number of remembered ids.
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .order
            .len()
    }

    /// Returns `true` if no ids are remembered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for DeliveryLog {
    fn default() -> Self {
        Self::new(DEFAULT_DELIVERY_LOG_CAPACITY)
    }
}
