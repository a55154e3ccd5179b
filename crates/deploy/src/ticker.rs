//! Injectable poll clock.
//!
//! The orchestrator never sleeps directly; it waits on a [`Ticker`]. The
//! production ticker sleeps wall-clock time, test tickers return at once, so
//! poll-until-timeout behavior is testable without real delay.

use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait Ticker: Send + Sync {
    /// Waits until the next poll should happen.
    async fn tick(&self);
}

/// Wall-clock ticker used in production.
pub struct IntervalTicker {
    period: Duration,
}

impl IntervalTicker {
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self { period }
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&self) {
        tokio::time::sleep(self.period).await;
    }
}
