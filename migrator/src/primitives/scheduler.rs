use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

/// Source of time for the migration protocol.
///
/// Every suspension point of a migration (poll ticks and the settle delay) goes through
/// [`Scheduler::sleep`], and every timestamp written into storage comes from
/// [`Scheduler::now_millis`]. Tests swap in a scheduler that records requested delays and
/// returns immediately.
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Suspends the current migration for `duration`.
    async fn sleep(&self, duration: Duration);

    /// Current wall-clock time in milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

/// Default [`Scheduler`] backed by tokio timers and the system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioScheduler;

#[async_trait]
impl Scheduler for TokioScheduler {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}
