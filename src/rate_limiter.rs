use log::debug;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

const WINDOW: Duration = Duration::from_secs(1);

/// Sliding-window request throttle.
///
/// Keeps the timestamps of the requests issued during the trailing second and
/// makes `acquire` wait until one more request fits under the limit. Every
/// video job builds its own limiter, so the limit applies per worker.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests_per_second: Option<usize>,
    window: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// A limit of 0 disables throttling.
    pub fn new(max_requests_per_second: u32) -> Self {
        let limit = (max_requests_per_second > 0).then_some(max_requests_per_second as usize);
        Self {
            max_requests_per_second: limit,
            window: Mutex::new(VecDeque::with_capacity(limit.unwrap_or(0))),
        }
    }

    pub async fn acquire(&self) {
        let Some(limit) = self.max_requests_per_second else {
            return;
        };

        // Held across the sleep so concurrent callers queue behind each other.
        let mut window = self.window.lock().await;
        loop {
            let now = Instant::now();
            while window
                .front()
                .is_some_and(|&issued| now.duration_since(issued) >= WINDOW)
            {
                window.pop_front();
            }

            if window.len() < limit {
                window.push_back(now);
                return;
            }

            if let Some(&oldest) = window.front() {
                let wait = WINDOW.saturating_sub(now.duration_since(oldest));
                debug!(
                    "Rate limiting: {} requests in window, waiting {:?}",
                    window.len(),
                    wait
                );
                sleep(wait).await;
            }
        }
    }
}
