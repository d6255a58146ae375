//! Minimum spacing between upstream requests.
//!
//! The league API allows a fixed number of calls per minute per caller. The
//! pacer enforces that by holding every request until `interval` has passed
//! since the previous one. It is a correctness constraint: collectors call
//! [`RequestPacer::wait`] before every request, success or failure.

use std::time::Duration;

use tokio::time::{Instant, sleep_until};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct RequestPacer {
    interval: Duration,
    last_request: Option<Instant>,
}

impl RequestPacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_request: None,
        }
    }

    /// Wait until the next request is allowed, then mark it as sent.
    ///
    /// The first request never waits.
    pub async fn wait(&mut self) {
        if let Some(last) = self.last_request {
            let ready = last + self.interval;
            let now = Instant::now();
            if ready > now {
                debug!(wait_ms = (ready - now).as_millis(), "pacing next request");
                sleep_until(ready).await;
            }
        }
        self.last_request = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_request_is_immediate() {
        let mut pacer = RequestPacer::new(Duration::from_secs(12));
        let start = Instant::now();
        pacer.wait().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_requests_are_spaced_by_interval() {
        let mut pacer = RequestPacer::new(Duration::from_secs(12));
        let start = Instant::now();
        for _ in 0..3 {
            pacer.wait().await;
        }
        assert!(start.elapsed() >= Duration::from_secs(24));
        assert!(start.elapsed() < Duration::from_secs(25));
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_time_counts_toward_interval() {
        let mut pacer = RequestPacer::new(Duration::from_secs(12));
        pacer.wait().await;
        tokio::time::sleep(Duration::from_secs(20)).await;
        let before = Instant::now();
        pacer.wait().await;
        assert_eq!(before.elapsed(), Duration::ZERO);
    }
}
