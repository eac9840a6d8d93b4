use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::task::JoinHandle;

/// Per-identifier window state. Entries are ephemeral and live only in
/// process memory; a restart resets all counters.
#[derive(Debug, Clone)]
struct WindowEntry {
    count: u32,
    reset_at_ms: u64,
}

/// Outcome of a rate limit check for a single request.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at_ms: u64,
}

impl RateLimitDecision {
    /// Window reset as epoch seconds, rounded up, for the X-RateLimit-Reset header.
    pub fn reset_epoch_secs(&self) -> u64 {
        self.reset_at_ms.div_ceil(1000)
    }
}

/// Fixed-window request counter keyed by client identifier.
///
/// The whole read-compare-increment step runs under one lock so concurrent
/// bursts from the same identifier cannot undercount.
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    entries: Mutex<HashMap<String, WindowEntry>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Admit or reject a request from `identifier`.
    ///
    /// A missing entry or one whose window has closed starts a fresh window
    /// with count 1. Within an open window the counter never exceeds the
    /// configured maximum; once it is reached requests are rejected until the
    /// window resets.
    pub fn check(&self, identifier: &str) -> RateLimitDecision {
        let now = current_epoch_ms();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        match entries.get_mut(identifier) {
            Some(entry) if now <= entry.reset_at_ms => {
                if entry.count >= self.max_requests {
                    return RateLimitDecision {
                        allowed: false,
                        remaining: 0,
                        reset_at_ms: entry.reset_at_ms,
                    };
                }
                entry.count += 1;
                RateLimitDecision {
                    allowed: true,
                    remaining: self.max_requests - entry.count,
                    reset_at_ms: entry.reset_at_ms,
                }
            }
            _ => {
                let entry = WindowEntry {
                    count: 1,
                    reset_at_ms: now + self.window.as_millis() as u64,
                };
                let reset_at_ms = entry.reset_at_ms;
                entries.insert(identifier.to_string(), entry);
                RateLimitDecision {
                    allowed: true,
                    remaining: self.max_requests.saturating_sub(1),
                    reset_at_ms,
                }
            }
        }
    }

    /// Remove entries whose window has closed. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = current_epoch_ms();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        let before = entries.len();
        entries.retain(|_, entry| now <= entry.reset_at_ms);
        before - entries.len()
    }

    /// Number of identifiers currently tracked.
    pub fn tracked_identifiers(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

fn current_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Spawn the periodic expiry sweep. Runs once per window duration until the
/// returned handle is aborted at shutdown.
pub fn start_sweeper(limiter: Arc<RateLimiter>) -> JoinHandle<()> {
    let period = limiter.window();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // The first tick fires immediately; skip it so the first sweep
        // happens one full window after startup.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = limiter.sweep();
            if removed > 0 {
                tracing::debug!(removed, "swept expired rate limit windows");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn counts_down_remaining_within_window() {
        let limiter = RateLimiter::new(5, Duration::from_secs(900));

        for expected_remaining in [4, 3, 2, 1, 0] {
            let decision = limiter.check("1.2.3.4");
            assert!(decision.allowed);
            assert_eq!(decision.remaining, expected_remaining);
        }
    }

    #[test]
    fn rejects_after_max_within_window() {
        let limiter = RateLimiter::new(5, Duration::from_secs(900));

        let first = limiter.check("1.2.3.4");
        for _ in 0..4 {
            limiter.check("1.2.3.4");
        }

        let sixth = limiter.check("1.2.3.4");
        assert!(!sixth.allowed);
        assert_eq!(sixth.remaining, 0);
        // Rejection leaves the window deadline unchanged.
        assert_eq!(sixth.reset_at_ms, first.reset_at_ms);
    }

    #[test]
    fn identifiers_are_tracked_independently() {
        let limiter = RateLimiter::new(2, Duration::from_secs(900));

        limiter.check("10.0.0.1");
        limiter.check("10.0.0.1");
        assert!(!limiter.check("10.0.0.1").allowed);
        assert!(limiter.check("10.0.0.2").allowed);
    }

    #[test]
    fn expired_window_is_replaced_even_after_rejection() {
        let limiter = RateLimiter::new(1, Duration::from_millis(30));

        assert!(limiter.check("1.2.3.4").allowed);
        assert!(!limiter.check("1.2.3.4").allowed);

        thread::sleep(Duration::from_millis(50));

        let decision = limiter.check("1.2.3.4");
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 0);
    }

    #[test]
    fn sweep_removes_only_expired_entries() {
        let limiter = RateLimiter::new(5, Duration::from_millis(30));

        limiter.check("stale");
        thread::sleep(Duration::from_millis(50));
        limiter.check("fresh");

        assert_eq!(limiter.sweep(), 1);
        assert_eq!(limiter.tracked_identifiers(), 1);

        // A fresh window must survive the sweep intact.
        let decision = limiter.check("fresh");
        assert_eq!(decision.remaining, 3);
    }

    #[test]
    fn concurrent_burst_never_undercounts() {
        let limiter = Arc::new(RateLimiter::new(5, Duration::from_secs(900)));

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                thread::spawn(move || limiter.check("1.2.3.4").allowed)
            })
            .collect();

        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&allowed| allowed)
            .count();
        assert_eq!(admitted, 5);
    }

    #[tokio::test]
    async fn sweeper_task_stops_on_abort() {
        let limiter = Arc::new(RateLimiter::new(5, Duration::from_millis(10)));
        let handle = start_sweeper(Arc::clone(&limiter));
        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
    }
}
