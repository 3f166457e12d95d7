//! Per-IP failed-attempt tracking with adaptive lockout.
//!
//! # Design Decisions
//! - One atomic update-or-insert per failure; two simultaneous failures from
//!   the same IP both land, never racing to a stale counter
//! - The lockout deadline is set exactly when the counter reaches the
//!   threshold and survives until a success or window expiry
//! - An elapsed lockout removes the record entirely, resetting the counter

use std::net::IpAddr;
use std::time::{Duration, Instant};

use dashmap::DashMap;

#[derive(Debug, Clone, Copy)]
struct FailureRecord {
    failures: u32,
    locked_until: Option<Instant>,
}

/// Tracks authentication failures per client IP.
#[derive(Debug)]
pub struct LockoutTracker {
    records: DashMap<IpAddr, FailureRecord>,
    max_failures: u32,
    window: Duration,
}

impl LockoutTracker {
    pub fn new(max_failures: u32, window: Duration) -> Self {
        Self {
            records: DashMap::new(),
            max_failures,
            window,
        }
    }

    /// Remaining lockout for `ip`, if it is currently locked.
    ///
    /// An expired lockout is removed here (lazy cleanup), so the next
    /// failure run starts from a zero counter.
    pub fn check(&self, ip: IpAddr) -> Option<Duration> {
        let now = Instant::now();
        let expired = match self.records.get(&ip) {
            None => return None,
            Some(record) => match record.locked_until {
                Some(until) if now < until => return Some(until - now),
                Some(_) => true,
                None => return None,
            },
        };

        if expired {
            self.records
                .remove_if(&ip, |_, record| matches!(record.locked_until, Some(until) if now >= until));
        }
        None
    }

    /// Record one failed attempt. Returns the updated consecutive count.
    pub fn record_failure(&self, ip: IpAddr) -> u32 {
        let mut entry = self.records.entry(ip).or_insert(FailureRecord {
            failures: 0,
            locked_until: None,
        });

        entry.failures += 1;
        if entry.failures >= self.max_failures && entry.locked_until.is_none() {
            entry.locked_until = Some(Instant::now() + self.window);
            tracing::warn!(
                client = %ip,
                failures = entry.failures,
                window_secs = self.window.as_secs(),
                "Client locked out after repeated authentication failures"
            );
        }
        entry.failures
    }

    /// A successful authentication wipes the IP's record.
    pub fn record_success(&self, ip: IpAddr) {
        self.records.remove(&ip);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(last: u8) -> IpAddr {
        IpAddr::from([127, 0, 0, last])
    }

    fn tracker(max: u32, window_secs: u64) -> LockoutTracker {
        LockoutTracker::new(max, Duration::from_secs(window_secs))
    }

    #[test]
    fn below_threshold_does_not_lock() {
        let t = tracker(5, 900);
        for _ in 0..4 {
            t.record_failure(ip(1));
        }
        assert!(t.check(ip(1)).is_none());
    }

    #[test]
    fn threshold_locks_for_the_window() {
        let t = tracker(5, 900);
        for _ in 0..5 {
            t.record_failure(ip(1));
        }
        let remaining = t.check(ip(1)).expect("should be locked");
        assert!(remaining <= Duration::from_secs(900));
        assert!(remaining > Duration::from_secs(895));
    }

    #[test]
    fn success_resets_the_counter() {
        let t = tracker(5, 900);
        for _ in 0..4 {
            t.record_failure(ip(1));
        }
        t.record_success(ip(1));
        for _ in 0..4 {
            t.record_failure(ip(1));
        }
        assert!(t.check(ip(1)).is_none());
    }

    #[test]
    fn distinct_ips_are_independent() {
        let t = tracker(5, 900);
        for _ in 0..5 {
            t.record_failure(ip(1));
        }
        assert!(t.check(ip(1)).is_some());
        assert!(t.check(ip(2)).is_none());
    }

    #[test]
    fn elapsed_lockout_clears_the_record() {
        let t = tracker(2, 0);
        t.record_failure(ip(1));
        t.record_failure(ip(1));
        std::thread::sleep(Duration::from_millis(5));

        assert!(t.check(ip(1)).is_none());
        assert!(t.records.get(&ip(1)).is_none());
    }

    #[test]
    fn concurrent_failures_all_count() {
        use std::sync::Arc;

        let t = Arc::new(tracker(1000, 900));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let t = t.clone();
            handles.push(std::thread::spawn(move || {
                for _ in 0..50 {
                    t.record_failure(ip(1));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(t.records.get(&ip(1)).unwrap().failures, 400);
    }
}
