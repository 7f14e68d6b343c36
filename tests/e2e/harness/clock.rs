use chrono::{DateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Controllable time for `seenAt` stamps.
///
/// Pass `as_provider()` to `MetadataStore::with_time_provider()`.
#[derive(Clone)]
pub struct MockClock {
    current: Arc<AtomicI64>,
}

impl MockClock {
    /// Create a clock at the given unix timestamp.
    pub fn at(timestamp: i64) -> Self {
        Self {
            current: Arc::new(AtomicI64::new(timestamp)),
        }
    }

    /// Creates a time provider function suitable for the ledger.
    pub fn as_provider(&self) -> impl Fn() -> DateTime<Utc> + Send + Sync + 'static {
        let current = self.current.clone();
        move || {
            Utc.timestamp_opt(current.load(Ordering::SeqCst), 0)
                .single()
                .unwrap_or_default()
        }
    }

    /// Current time.
    pub fn now(&self) -> DateTime<Utc> {
        (self.as_provider())()
    }
}
