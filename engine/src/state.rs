//! Keeping state in wxplace
//!
//! One `RefreshState` is shared between the scheduler (the only writer) and the responder.
//! The document is published by swapping an `Arc` so a reader either gets the old or the new
//! one, never a mix.
//!

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::trace;

use wxplace_formats::AlertCollection;

/// Fetch timestamps.  No `cache_valid_until` means a refresh is due now.
///
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Timing {
    pub last_fetch_at: Option<DateTime<Utc>>,
    pub cache_valid_until: Option<DateTime<Utc>>,
}

/// What `/status` reports.
///
#[derive(Clone, Debug, Serialize)]
pub struct StatusReport {
    pub ready: bool,
    pub locked: bool,
    pub last_fetch_at: Option<DateTime<Utc>>,
    pub cache_valid_until: Option<DateTime<Utc>>,
    pub features: usize,
}

/// Register the state of the refresh engine.
///
#[derive(Debug, Default)]
pub struct RefreshState {
    /// Set while a fetch-and-rebuild cycle is in flight
    locked: AtomicBool,
    timing: RwLock<Timing>,
    /// Latest document, empty means not available yet
    document: RwLock<Arc<String>>,
    /// Latest decoded feed
    alerts: RwLock<Arc<AlertCollection>>,
}

/// Held for the duration of one cycle, releases the lock when dropped.
///
#[derive(Debug)]
pub struct CycleGuard<'a> {
    locked: &'a AtomicBool,
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.locked.store(false, Ordering::Release);
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl RefreshState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the cycle lock, `None` if a cycle is already running.
    ///
    pub fn try_lock(&self) -> Option<CycleGuard<'_>> {
        self.locked
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| CycleGuard {
                locked: &self.locked,
            })
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }

    pub fn timing(&self) -> Timing {
        *read(&self.timing)
    }

    /// Is the cache stale at `now`?
    ///
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        read(&self.timing)
            .cache_valid_until
            .map_or(true, |until| now >= until)
    }

    /// Record the end of a cycle at `now`; the cache is valid for `refresh`.
    ///
    pub fn finish(&self, now: DateTime<Utc>, refresh: Duration) {
        let until = chrono::Duration::from_std(refresh)
            .ok()
            .and_then(|d| now.checked_add_signed(d))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        trace!("cache valid until {until}");

        *write(&self.timing) = Timing {
            last_fetch_at: Some(now),
            cache_valid_until: Some(until),
        };
    }

    /// Current document, cheap to clone.
    ///
    pub fn document(&self) -> Arc<String> {
        Arc::clone(&read(&self.document))
    }

    /// Replace the document in one go.
    ///
    pub fn publish(&self, document: String) {
        trace!("publishing {} bytes", document.len());
        *write(&self.document) = Arc::new(document);
    }

    /// We have something to serve.
    ///
    pub fn is_ready(&self) -> bool {
        !read(&self.document).is_empty()
    }

    pub fn alerts(&self) -> Arc<AlertCollection> {
        Arc::clone(&read(&self.alerts))
    }

    pub fn set_alerts(&self, alerts: AlertCollection) {
        *write(&self.alerts) = Arc::new(alerts);
    }

    pub fn status(&self) -> StatusReport {
        let timing = self.timing();
        StatusReport {
            ready: self.is_ready(),
            locked: self.is_locked(),
            last_fetch_at: timing.last_fetch_at,
            cache_valid_until: timing.cache_valid_until,
            features: self.alerts().len(),
        }
    }
}
