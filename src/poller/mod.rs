//! Summary poller for the live dashboard.
//!
//! Each tick issues an independent fetch tagged with a sequence number. A
//! response is applied only if it is newer than the last applied one, so a
//! slow request can never overwrite fresher data.

use crate::provider::{ProviderError, SummaryDriverData, SummarySource};
use crate::session::SessionState;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::{broadcast, watch, Semaphore};

/// Max fetches in flight at once.
const MAX_IN_FLIGHT: usize = 5;

/// Outcome of the most recent poll, for the dashboard's error banner.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollStatus {
    pub has_error: bool,
    pub last_error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Latest applied value and poll status, plus the sequence guard protecting
/// both.
pub struct LatestSnapshot<T> {
    issued: AtomicU64,
    inner: RwLock<Applied<T>>,
}

struct Applied<T> {
    seq: u64,
    error_seq: u64,
    value: Option<Arc<T>>,
    status: PollStatus,
}

impl<T> Default for LatestSnapshot<T> {
    fn default() -> Self {
        Self {
            issued: AtomicU64::new(0),
            inner: RwLock::new(Applied {
                seq: 0,
                error_seq: 0,
                value: None,
                status: PollStatus::default(),
            }),
        }
    }
}

impl<T> LatestSnapshot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag a request at dispatch time.
    pub fn begin(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Replace the snapshot if `seq` is newer than the last applied tag.
    /// Returns false for a stale response, which is dropped.
    pub fn apply(&self, seq: u64, value: T) -> bool {
        let mut inner = self.inner.write().unwrap();
        if seq <= inner.seq {
            return false;
        }
        inner.seq = seq;
        inner.value = Some(Arc::new(value));
        inner.status.last_updated = Some(Utc::now());
        // A newer failure keeps its banner even if an older request lands late.
        if seq > inner.error_seq {
            inner.status.has_error = false;
            inner.status.last_error = None;
        }
        true
    }

    /// Record a failed request. Ignored unless `seq` is newer than both the
    /// applied value and the last recorded failure.
    pub fn fail(&self, seq: u64, message: String) -> bool {
        let mut inner = self.inner.write().unwrap();
        if seq <= inner.seq || seq <= inner.error_seq {
            return false;
        }
        inner.error_seq = seq;
        inner.status.has_error = true;
        inner.status.last_error = Some(message);
        true
    }

    /// Drop the value and status. Requests already in flight become stale.
    pub fn clear(&self) {
        let mut inner = self.inner.write().unwrap();
        let issued = self.issued.load(Ordering::SeqCst);
        inner.seq = issued;
        inner.error_seq = issued;
        inner.value = None;
        inner.status = PollStatus::default();
    }

    pub fn latest(&self) -> Option<Arc<T>> {
        self.inner.read().unwrap().value.clone()
    }

    pub fn status(&self) -> PollStatus {
        self.inner.read().unwrap().status.clone()
    }
}

/// Polls the summary endpoint on a fixed interval.
pub struct SummaryPoller<S> {
    source: Arc<S>,
    interval: Duration,
    snapshot: Arc<LatestSnapshot<SummaryDriverData>>,
    stop_tx: broadcast::Sender<()>,
}

impl<S: SummarySource> SummaryPoller<S> {
    pub fn new(source: Arc<S>, interval: Duration) -> Self {
        let (stop_tx, _) = broadcast::channel(1);
        Self {
            source,
            interval: if interval.is_zero() { Duration::from_secs(1) } else { interval },
            snapshot: Arc::new(LatestSnapshot::new()),
            stop_tx,
        }
    }

    /// Spawn the poll loop. It runs until `stop` is called.
    pub fn start(&self) {
        tracing::info!("Poller: Starting summary polling every {:?}", self.interval);

        let worker = PollWorker {
            source: self.source.clone(),
            snapshot: self.snapshot.clone(),
        };
        tokio::spawn(run_poll_loop(worker, self.interval, self.stop_tx.subscribe()));
    }

    /// Drop the cached summary whenever the session ends, so a signed-out
    /// dashboard never shows the previous user's fleet.
    pub fn follow_session(&self, session_rx: watch::Receiver<SessionState>) {
        tokio::spawn(run_session_watch(
            self.snapshot.clone(),
            session_rx,
            self.stop_tx.subscribe(),
        ));
    }

    pub fn stop(&self) {
        if self.stop_tx.send(()).is_ok() {
            tracing::info!("Poller: Stopped summary polling");
        }
    }

    /// Fetch once right now, outside the interval.
    pub async fn refresh(&self) -> bool {
        let worker = PollWorker {
            source: self.source.clone(),
            snapshot: self.snapshot.clone(),
        };
        let seq = worker.snapshot.begin();
        worker.poll_once(seq).await
    }

    pub fn latest(&self) -> Option<Arc<SummaryDriverData>> {
        self.snapshot.latest()
    }

    pub fn status(&self) -> PollStatus {
        self.snapshot.status()
    }
}

struct PollWorker<S> {
    source: Arc<S>,
    snapshot: Arc<LatestSnapshot<SummaryDriverData>>,
}

impl<S: SummarySource> PollWorker<S> {
    /// Returns true if the fetched summary became the current snapshot.
    async fn poll_once(&self, seq: u64) -> bool {
        let result = self.source.fetch_summary().await;

        match result {
            Ok(summary) => {
                if !self.snapshot.apply(seq, summary) {
                    tracing::debug!("Poller: Dropping stale response #{}", seq);
                    return false;
                }
                true
            }
            Err(ProviderError::MissingToken) => {
                tracing::debug!("Poller: Not signed in, skipping poll #{}", seq);
                false
            }
            Err(e) => {
                if self.snapshot.fail(seq, e.to_string()) {
                    tracing::error!("Poller: Error fetching summary data: {}", e);
                } else {
                    tracing::debug!("Poller: Dropping stale error #{}: {}", seq, e);
                }
                false
            }
        }
    }
}

async fn run_poll_loop<S: SummarySource>(
    worker: PollWorker<S>,
    interval_duration: Duration,
    mut stop_rx: broadcast::Receiver<()>,
) {
    let worker = Arc::new(worker);
    let semaphore = Arc::new(Semaphore::new(MAX_IN_FLIGHT));

    let mut interval = tokio::time::interval(interval_duration);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = stop_rx.recv() => {
                break;
            }
            _ = interval.tick() => {
                let permit = match semaphore.clone().try_acquire_owned() {
                    Ok(p) => p,
                    Err(_) => {
                        tracing::warn!("Poller: Skipping summary poll due to overlap limit");
                        continue;
                    }
                };

                let seq = worker.snapshot.begin();
                let worker = worker.clone();

                tokio::spawn(async move {
                    let _permit = permit;

                    let jitter = rand::random::<u64>() % 100;
                    tokio::time::sleep(Duration::from_millis(jitter)).await;

                    worker.poll_once(seq).await;
                });
            }
        }
    }
}

async fn run_session_watch(
    snapshot: Arc<LatestSnapshot<SummaryDriverData>>,
    mut session_rx: watch::Receiver<SessionState>,
    mut stop_rx: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = stop_rx.recv() => {
                break;
            }
            changed = session_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let logged_in = session_rx.borrow_and_update().logged_in;
                if !logged_in {
                    tracing::info!("Poller: Session ended, clearing cached summary");
                    snapshot.clear();
                }
            }
        }
    }
}
