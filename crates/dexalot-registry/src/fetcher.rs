//! Generic polling fetcher.
//!
//! A [`Fetcher`] pulls one JSON resource on a fixed interval, validates and
//! casts it, and hands the typed payload to its [`FetchHandler`]. The handler
//! runs to completion before the next tick is scheduled. Cycles of one
//! fetcher never overlap, including across a stop/start: a restarted task
//! waits for the cycle still in flight on the stopped one. A failed cycle is
//! logged and skipped; the schedule carries on.

use crate::client::{BoxFuture, DynRequester, RequestDescriptor};
use crate::error::RegistryError;
use crate::responses::{validate_and_cast, Validate};
use dexalot_telemetry::Metrics;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Consumer of a validated payload.
pub trait FetchHandler<T>: Send + Sync {
    fn handle(&self, payload: T) -> BoxFuture<'_, ()>;
}

/// Outcome of one polling cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Ok,
    RequestError,
    ValidationError,
}

impl CycleOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::RequestError => "request_error",
            Self::ValidationError => "validation_error",
        }
    }
}

/// Start/stop control over a polling schedule.
pub trait Poller: Send + Sync {
    /// Start polling. No-op if already polling.
    fn start_polling(&self);

    /// Stop scheduling new cycles. An in-flight cycle completes.
    fn stop_polling(&self);

    fn is_polling(&self) -> bool;
}

struct FetcherInner<T> {
    name: &'static str,
    request: RequestDescriptor,
    interval: Duration,
    requester: DynRequester,
    handler: Arc<dyn FetchHandler<T>>,
    // Held for a whole cycle, request through handler.
    cycle: tokio::sync::Mutex<()>,
    _payload: PhantomData<fn() -> T>,
}

impl<T> FetcherInner<T>
where
    T: DeserializeOwned + Validate + Send + 'static,
{
    async fn run_cycle(&self) -> CycleOutcome {
        let _cycle = self.cycle.lock().await;
        let started = Instant::now();
        let result = self.requester.execute(self.request.clone()).await;
        Metrics::fetch_latency(self.name, started.elapsed().as_secs_f64() * 1000.0);

        let outcome = match result.and_then(validate_and_cast::<T>) {
            Ok(payload) => {
                self.handler.handle(payload).await;
                CycleOutcome::Ok
            }
            Err(e @ RegistryError::Validation { .. }) => {
                warn!(fetcher = self.name, error = %e, "Dropping invalid response");
                CycleOutcome::ValidationError
            }
            Err(e) => {
                warn!(fetcher = self.name, error = %e, "Fetch failed, skipping cycle");
                CycleOutcome::RequestError
            }
        };

        Metrics::fetch_cycle(self.name, outcome.as_str());
        outcome
    }

    async fn poll_loop(self: Arc<Self>, token: CancellationToken) {
        loop {
            self.run_cycle().await;

            tokio::select! {
                () = token.cancelled() => {
                    debug!(fetcher = self.name, "Polling stopped");
                    return;
                }
                () = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}

struct PollingTask {
    token: CancellationToken,
    _handle: JoinHandle<()>,
}

/// Scheduled puller of one JSON resource.
pub struct Fetcher<T> {
    inner: Arc<FetcherInner<T>>,
    task: Mutex<Option<PollingTask>>,
}

impl<T> Fetcher<T>
where
    T: DeserializeOwned + Validate + Send + 'static,
{
    pub fn new(
        name: &'static str,
        request: RequestDescriptor,
        interval: Duration,
        requester: DynRequester,
        handler: Arc<dyn FetchHandler<T>>,
    ) -> Self {
        Self {
            inner: Arc::new(FetcherInner {
                name,
                request,
                interval,
                requester,
                handler,
                cycle: tokio::sync::Mutex::new(()),
                _payload: PhantomData,
            }),
            task: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    pub fn interval(&self) -> Duration {
        self.inner.interval
    }

    /// Run one cycle now, outside the schedule.
    pub async fn fetch_once(&self) -> CycleOutcome {
        self.inner.run_cycle().await
    }
}

impl<T> Poller for Fetcher<T>
where
    T: DeserializeOwned + Validate + Send + 'static,
{
    fn start_polling(&self) {
        let mut task = self.task.lock();
        if task.as_ref().is_some_and(|t| !t.token.is_cancelled()) {
            debug!(fetcher = self.inner.name, "Already polling");
            return;
        }

        let token = CancellationToken::new();
        let handle = tokio::spawn(self.inner.clone().poll_loop(token.clone()));
        *task = Some(PollingTask {
            token,
            _handle: handle,
        });
        info!(
            fetcher = self.inner.name,
            interval_ms = self.inner.interval.as_millis() as u64,
            "Polling started"
        );
    }

    fn stop_polling(&self) {
        if let Some(task) = self.task.lock().take() {
            task.token.cancel();
            info!(fetcher = self.inner.name, "Polling stop requested");
        }
    }

    fn is_polling(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .is_some_and(|t| !t.token.is_cancelled())
    }
}

impl<T> Drop for Fetcher<T> {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.token.cancel();
        }
    }
}
