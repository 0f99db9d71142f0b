//! Cancellable polling loop feeding a [`ViewState`] channel.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use super::fetcher::HealthFetcher;
use super::view::ViewState;
use crate::metrics;

/// Polls a [`HealthFetcher`] on a fixed interval.
#[derive(Debug)]
pub struct Poller<F> {
    fetcher: Arc<F>,
    interval: Duration,
}

impl<F: HealthFetcher> Poller<F> {
    /// Create a poller; nothing runs until [`Poller::start`].
    pub fn new(fetcher: Arc<F>, interval: Duration) -> Self {
        Self { fetcher, interval }
    }

    /// Fetch once now, then once per interval, until the handle is stopped or dropped.
    pub fn start(self) -> PollHandle {
        let (tx, rx) = watch::channel(ViewState::default());
        let task = tokio::spawn(poll_loop(self.fetcher, self.interval, Arc::new(tx)));

        PollHandle {
            state: rx,
            task: Some(task),
        }
    }
}

/// Owner of a running poll loop.
///
/// Stopping or dropping the handle cancels the timer and every in-flight cycle.
#[derive(Debug)]
pub struct PollHandle {
    state: watch::Receiver<ViewState>,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    /// A receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state.clone()
    }

    /// Copy of the current state.
    pub fn current(&self) -> ViewState {
        self.state.borrow().clone()
    }

    /// Cancel polling and wait until the loop is gone.
    pub async fn stop(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
        debug!("Polling stopped");
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn poll_loop<F: HealthFetcher>(
    fetcher: Arc<F>,
    period: Duration,
    state: Arc<watch::Sender<ViewState>>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // Dropping the set on abort cancels in-flight cycles with it.
    let mut cycles = JoinSet::new();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // Cycles are not serialized: a slow fetch may overlap the next one.
                cycles.spawn(fetch_cycle(Arc::clone(&fetcher), Arc::clone(&state)));
            }
            Some(joined) = cycles.join_next(), if !cycles.is_empty() => {
                if let Err(e) = joined {
                    warn!("Fetch cycle ended abnormally: {}", e);
                }
            }
        }
    }
}

async fn fetch_cycle<F: HealthFetcher>(fetcher: Arc<F>, state: Arc<watch::Sender<ViewState>>) {
    state.send_modify(ViewState::begin_fetch);

    let start = Instant::now();
    let result = fetcher.fetch().await;
    metrics::record_fetch(start, result.is_ok());

    if let Err(e) = &result {
        warn!("Error fetching backend status: {}", e);
    }

    state.send_modify(|s| s.apply(result));
}
