//! Pairs → Prices dependency.
//!
//! Prices can only be attributed to pairs that are known, so every pairs
//! refresh stops the prices fetcher, swaps the pair directory and restarts
//! the prices fetcher, in that order.

use crate::fetcher::Poller;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

/// Observed state of the prices feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    Idle,
    Polling,
}

/// Restarts the prices feed around each pairs update.
pub struct PriceFeedCoordinator {
    prices: Arc<dyn Poller>,
    // Serializes transitions; never held across an await.
    transition: Mutex<()>,
}

impl PriceFeedCoordinator {
    pub fn new(prices: Arc<dyn Poller>) -> Self {
        Self {
            prices,
            transition: Mutex::new(()),
        }
    }

    pub fn state(&self) -> FeedState {
        if self.prices.is_polling() {
            FeedState::Polling
        } else {
            FeedState::Idle
        }
    }

    /// Stop prices, apply the new pair set, start prices.
    pub fn on_pairs_updated(&self, apply: impl FnOnce()) {
        let _guard = self.transition.lock();
        if self.prices.is_polling() {
            self.prices.stop_polling();
        }
        apply();
        self.prices.start_polling();
        debug!("Prices feed restarted after pairs update");
    }

    /// Stop the prices feed without a pairs update.
    pub fn stop(&self) {
        let _guard = self.transition.lock();
        self.prices.stop_polling();
    }
}

/// Mock poller for testing.
///
/// Records `start`/`stop` calls into a shared event log.
pub struct MockPoller {
    polling: Mutex<bool>,
    events: Arc<Mutex<Vec<&'static str>>>,
}

impl MockPoller {
    pub fn new(events: Arc<Mutex<Vec<&'static str>>>) -> Self {
        Self {
            polling: Mutex::new(false),
            events,
        }
    }
}

impl Poller for MockPoller {
    fn start_polling(&self) {
        let mut polling = self.polling.lock();
        if !*polling {
            *polling = true;
            self.events.lock().push("start");
        }
    }

    fn stop_polling(&self) {
        *self.polling.lock() = false;
        self.events.lock().push("stop");
    }

    fn is_polling(&self) -> bool {
        *self.polling.lock()
    }
}
