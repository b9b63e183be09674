//! Refresh scheduler.
//!
//! This is a very small state machine over `{Idle, Fetching}`:
//!
//! - every tick, if no cycle is running and the cache is stale, we take the lock and fetch,
//! - on success the feed is stored, saved as a snapshot and the document rebuilt,
//! - success or failure, the cache is then valid for `refresh` and the lock released,
//! - a fetch failure is fatal and handed back to the caller of `run()`.
//!
//! Only one cycle can run at a time, the lock is an atomic compare-and-swap on the shared
//! `RefreshState`.
//!

use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, trace, warn};

use wxplace_formats::{render, AlertCollection, BuildOptions, DEFAULT_REFRESH};
use wxplace_sources::{FetchError, Fetchable, Snapshot};

use crate::{EngineStatus, RefreshState};

/// Default interval between two checks of the cache
pub const DEF_TICK: Duration = Duration::from_millis(250);

/// Where "now" comes from.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Called with every document rebuilt after a fetch, on the blocking pool.
pub type Hook = Arc<dyn Fn(&str) + Send + Sync>;

/// Shortest interval `run()` accepts
const MIN_TICK: Duration = Duration::from_millis(1);

/// What a tick did.
///
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Tick {
    /// A cycle is already in flight
    Busy,
    /// The cache is still valid
    Fresh,
    /// We went through a full cycle
    Refreshed,
}

pub struct Scheduler {
    state: Arc<RefreshState>,
    source: Box<dyn Fetchable>,
    snapshot: Box<dyn Snapshot>,
    options: BuildOptions,
    refresh: Duration,
    every: Duration,
    clock: Clock,
    hook: Option<Hook>,
}

impl Debug for Scheduler {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("state", &self.state)
            .field("source", &self.source)
            .field("snapshot", &self.snapshot)
            .field("options", &self.options)
            .field("refresh", &self.refresh)
            .field("every", &self.every)
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

impl Scheduler {
    pub fn new(source: Box<dyn Fetchable>, snapshot: Box<dyn Snapshot>) -> Self {
        Scheduler {
            state: Arc::new(RefreshState::new()),
            source,
            snapshot,
            options: BuildOptions::default(),
            refresh: DEFAULT_REFRESH,
            every: DEF_TICK,
            clock: Arc::new(Utc::now),
            hook: None,
        }
    }

    /// Staleness window, also used as the document refresh unless the options say otherwise.
    ///
    pub fn with_refresh(mut self, refresh: Duration) -> Self {
        self.refresh = refresh;
        self
    }

    /// How often `run()` checks the cache, at least every millisecond.
    ///
    pub fn with_tick(mut self, every: Duration) -> Self {
        if every < MIN_TICK {
            warn!("tick of {every:?} too short, using {MIN_TICK:?}");
        }
        self.every = every.max(MIN_TICK);
        self
    }

    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_hook(mut self, hook: Hook) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Shared state, for the responder.
    ///
    pub fn state(&self) -> Arc<RefreshState> {
        Arc::clone(&self.state)
    }

    #[inline]
    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Seed the state from the last snapshot, if any, and build a first document from it.
    ///
    #[tracing::instrument(skip(self))]
    pub async fn prime(&self) {
        let alerts = match self.snapshot.load().await {
            Ok(Some(raw)) => match AlertCollection::from_json(&raw) {
                Ok(alerts) => alerts,
                Err(e) => {
                    warn!("Ignoring snapshot: {e}");
                    return;
                }
            },
            Ok(None) => {
                debug!("No snapshot");
                return;
            }
            Err(e) => {
                warn!("{e}");
                return;
            }
        };
        info!("Loaded {} alerts from snapshot", alerts.len());
        self.state.set_alerts(alerts);
        self.rebuild();
    }

    /// Rebuild the document from the stored feed and publish it.
    ///
    fn rebuild(&self) {
        let opts = BuildOptions {
            refresh: self.options.refresh.or(Some(self.refresh)),
            ..self.options.clone()
        };
        let doc = render(&self.state.alerts(), &opts);
        self.state.publish(doc);
    }

    /// Hand the new document to the hook, off the async threads.
    ///
    async fn notify(&self) {
        let Some(hook) = &self.hook else {
            return;
        };
        let hook = Arc::clone(hook);
        let doc = self.state.document();
        if let Err(e) = tokio::task::spawn_blocking(move || hook(doc.as_str())).await {
            error!("hook failed: {e}");
        }
    }

    /// Fetch, store, save and rebuild.
    ///
    async fn cycle(&self) -> Result<(), EngineStatus> {
        let name = self.source.name();
        trace!("fetching from {name}");

        let raw = self
            .source
            .fetch()
            .await
            .map_err(|e| EngineStatus::Fetch(name.clone(), e))?;
        let alerts = AlertCollection::from_json(&raw)
            .map_err(|e| EngineStatus::Fetch(name.clone(), FetchError::Decode(e.to_string())))?;
        info!("{} alerts fetched", alerts.len());

        self.state.set_alerts(alerts);
        if let Err(e) = self.snapshot.save(&raw).await {
            error!("{e}");
        }
        self.rebuild();
        self.notify().await;
        Ok(())
    }

    /// One check: start a cycle if none is running and the cache is stale.
    ///
    #[tracing::instrument(skip(self))]
    pub async fn tick(&self) -> Result<Tick, EngineStatus> {
        if self.state.is_locked() {
            return Ok(Tick::Busy);
        }
        if !self.state.is_due(self.now()) {
            return Ok(Tick::Fresh);
        }

        // Idle -> Fetching
        //
        let Some(_guard) = self.state.try_lock() else {
            return Ok(Tick::Busy);
        };
        // Someone may have finished a cycle in between.
        if !self.state.is_due(self.now()) {
            return Ok(Tick::Fresh);
        }

        let res = self.cycle().await;

        // Fetching -> Idle, the guard releases the lock after this
        //
        self.state.finish(self.now(), self.refresh);
        res.map(|_| Tick::Refreshed)
    }

    /// Tick forever, only returns on a fatal error.
    ///
    #[tracing::instrument(skip(self))]
    pub async fn run(&self) -> Result<(), EngineStatus> {
        info!("Refreshing every {:?} from {}", self.refresh, self.source.name());

        let mut interval = tokio::time::interval(self.every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            let tick = self.tick().await?;
            trace!("{tick:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;
    use tokio::sync::Notify;
    use wxplace_sources::SnapshotError;

    use super::*;

    fn payload() -> String {
        json!({
            "features": [
                {
                    "id": "1",
                    "geometry": { "type": "Polygon", "coordinates": [[[-97.0, 35.0], [-96.0, 35.5]]] },
                    "properties": { "event": "Tornado Warning", "headline": "H", "description": "D" }
                },
                {
                    "id": "2",
                    "geometry": null,
                    "properties": { "event": "Flood Warning" }
                }
            ]
        })
        .to_string()
    }

    #[derive(Debug, Default)]
    struct MockFeed {
        calls: Arc<AtomicUsize>,
        payload: String,
        fail: bool,
        started: Option<Arc<Notify>>,
        gate: Option<Arc<Notify>>,
    }

    #[async_trait]
    impl Fetchable for MockFeed {
        fn name(&self) -> String {
            "mock".to_string()
        }

        async fn fetch(&self) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(started) = &self.started {
                started.notify_one();
            }
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.fail {
                return Err(FetchError::Status(500, "mock".to_string()));
            }
            Ok(self.payload.clone())
        }
    }

    #[derive(Debug, Default)]
    struct MemSnapshot {
        data: Arc<Mutex<Option<String>>>,
    }

    #[async_trait]
    impl Snapshot for MemSnapshot {
        async fn save(&self, raw: &str) -> Result<(), SnapshotError> {
            *self.data.lock().unwrap() = Some(raw.to_string());
            Ok(())
        }

        async fn load(&self) -> Result<Option<String>, SnapshotError> {
            Ok(self.data.lock().unwrap().clone())
        }
    }

    fn fixed_clock(start: DateTime<Utc>) -> (Arc<Mutex<DateTime<Utc>>>, Clock) {
        let now = Arc::new(Mutex::new(start));
        let n = Arc::clone(&now);
        (now, Arc::new(move || *n.lock().unwrap()))
    }

    #[tokio::test]
    async fn test_scheduler_refresh() {
        let calls = Arc::new(AtomicUsize::new(0));
        let feed = MockFeed {
            calls: Arc::clone(&calls),
            payload: payload(),
            ..Default::default()
        };
        let snap = MemSnapshot::default();
        let saved = Arc::clone(&snap.data);
        let sched = Scheduler::new(Box::new(feed), Box::new(snap));
        let state = sched.state();

        assert!(!state.is_ready());
        assert_eq!(Tick::Refreshed, sched.tick().await.unwrap());
        assert_eq!(1, calls.load(Ordering::SeqCst));
        assert!(!state.is_locked());
        assert!(state.is_ready());
        assert_eq!(2, state.alerts().len());
        assert_eq!(Some(payload()), *saved.lock().unwrap());

        let doc = state.document();
        assert!(doc.starts_with("Title: NWS Active Warnings "));
        assert!(doc.contains("Refresh: 3\n"));
        assert_eq!(1, doc.matches("End:").count());
    }

    #[tokio::test]
    async fn test_scheduler_staleness() {
        let start = Utc::now();
        let (now, clock) = fixed_clock(start);
        let calls = Arc::new(AtomicUsize::new(0));
        let feed = MockFeed {
            calls: Arc::clone(&calls),
            payload: payload(),
            ..Default::default()
        };
        let sched = Scheduler::new(Box::new(feed), Box::new(MemSnapshot::default()))
            .with_refresh(Duration::from_secs(180))
            .with_clock(clock);
        let state = sched.state();

        assert_eq!(Tick::Refreshed, sched.tick().await.unwrap());
        let t = state.timing();
        let last = t.last_fetch_at.unwrap();
        let until = t.cache_valid_until.unwrap();
        assert_eq!(start, last);
        assert_eq!(last + chrono::Duration::seconds(180), until);

        // Nothing before the window closes
        //
        assert_eq!(Tick::Fresh, sched.tick().await.unwrap());
        *now.lock().unwrap() = until - chrono::Duration::milliseconds(1);
        assert_eq!(Tick::Fresh, sched.tick().await.unwrap());
        assert_eq!(1, calls.load(Ordering::SeqCst));

        *now.lock().unwrap() = until;
        assert_eq!(Tick::Refreshed, sched.tick().await.unwrap());
        assert_eq!(2, calls.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_scheduler_single_cycle() {
        let calls = Arc::new(AtomicUsize::new(0));
        let started = Arc::new(Notify::new());
        let gate = Arc::new(Notify::new());
        let feed = MockFeed {
            calls: Arc::clone(&calls),
            payload: payload(),
            started: Some(Arc::clone(&started)),
            gate: Some(Arc::clone(&gate)),
            ..Default::default()
        };
        let sched = Arc::new(Scheduler::new(Box::new(feed), Box::new(MemSnapshot::default())));
        let state = sched.state();

        let first = Arc::clone(&sched);
        let h = tokio::spawn(async move { first.tick().await });

        // First cycle is now blocked inside fetch
        //
        started.notified().await;
        assert!(state.is_locked());
        assert_eq!(Tick::Busy, sched.tick().await.unwrap());
        assert_eq!(Tick::Busy, sched.tick().await.unwrap());

        gate.notify_one();
        assert_eq!(Tick::Refreshed, h.await.unwrap().unwrap());
        assert_eq!(1, calls.load(Ordering::SeqCst));
        assert!(!state.is_locked());
    }

    #[tokio::test]
    async fn test_scheduler_fetch_failure() {
        let feed = MockFeed {
            fail: true,
            ..Default::default()
        };
        let sched = Scheduler::new(Box::new(feed), Box::new(MemSnapshot::default()));
        let state = sched.state();

        let res = sched.tick().await;
        assert!(matches!(res, Err(EngineStatus::Fetch(_, FetchError::Status(500, _)))));
        assert!(!state.is_locked());
        assert!(state.timing().cache_valid_until.is_some());
        assert!(!state.is_ready());
    }

    #[tokio::test]
    async fn test_scheduler_bad_payload() {
        let feed = MockFeed {
            payload: "<html>".to_string(),
            ..Default::default()
        };
        let sched = Scheduler::new(Box::new(feed), Box::new(MemSnapshot::default()));

        let res = sched.tick().await;
        assert!(matches!(res, Err(EngineStatus::Fetch(_, FetchError::Decode(_)))));
        assert!(!sched.state().is_locked());
    }

    #[tokio::test]
    async fn test_scheduler_run_stops_on_failure() {
        let feed = MockFeed {
            fail: true,
            ..Default::default()
        };
        let sched = Scheduler::new(Box::new(feed), Box::new(MemSnapshot::default()))
            .with_tick(Duration::from_millis(1));
        assert!(sched.run().await.is_err());
    }

    #[tokio::test]
    async fn test_scheduler_zero_tick() {
        let feed = MockFeed {
            fail: true,
            ..Default::default()
        };
        let sched = Scheduler::new(Box::new(feed), Box::new(MemSnapshot::default()))
            .with_tick(Duration::ZERO);
        assert_eq!(MIN_TICK, sched.every);
        assert!(sched.run().await.is_err());
    }

    #[tokio::test]
    async fn test_scheduler_empty_feed() {
        let feed = MockFeed {
            payload: "{}".to_string(),
            ..Default::default()
        };
        let sched = Scheduler::new(Box::new(feed), Box::new(MemSnapshot::default()));

        assert_eq!(Tick::Refreshed, sched.tick().await.unwrap());
        assert!(!sched.state().is_ready());
        assert_eq!("", sched.state().document().as_str());
    }

    #[tokio::test]
    async fn test_scheduler_hook_and_options() {
        let seen = Arc::new(Mutex::new(String::new()));
        let s = Arc::clone(&seen);
        let feed = MockFeed {
            payload: payload(),
            ..Default::default()
        };
        let sched = Scheduler::new(Box::new(feed), Box::new(MemSnapshot::default()))
            .with_refresh(Duration::from_secs(60))
            .with_options(BuildOptions::new().title("Dev"))
            .with_hook(Arc::new(move |doc: &str| *s.lock().unwrap() = doc.to_string()));

        sched.tick().await.unwrap();
        let doc = seen.lock().unwrap().clone();
        assert!(doc.starts_with("Title: Dev\nRefresh: 1\n"));
        assert_eq!(doc, sched.state().document().as_str());
    }

    #[tokio::test]
    async fn test_scheduler_prime() {
        let snap = MemSnapshot::default();
        snap.save(&payload()).await.unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);

        let sched = Scheduler::new(Box::new(MockFeed::default()), Box::new(snap)).with_hook(
            Arc::new(move |_: &str| {
                c.fetch_add(1, Ordering::SeqCst);
            }),
        );
        sched.prime().await;
        assert!(sched.state().is_ready());
        assert_eq!(2, sched.state().alerts().len());
        assert!(sched.state().timing().last_fetch_at.is_none());

        // Only a fetch triggers the hook
        //
        assert_eq!(0, calls.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_scheduler_prime_bad_snapshot() {
        let snap = MemSnapshot::default();
        snap.save("not json").await.unwrap();

        let sched = Scheduler::new(Box::new(MockFeed::default()), Box::new(snap));
        sched.prime().await;
        assert!(!sched.state().is_ready());
        assert!(sched.state().alerts().is_empty());
    }

    #[tokio::test]
    async fn test_scheduler_prime_nothing() {
        let sched = Scheduler::new(Box::new(MockFeed::default()), Box::new(MemSnapshot::default()));
        sched.prime().await;
        assert!(!sched.state().is_ready());
    }
}
