//! Time-boxed reachability cache for the remote service.
//!
//! A probe result is trusted for `interval` (30 s by default). The check
//! stamps `last_checked` before the probe is sent, so callers arriving while
//! a probe is in flight reuse the cached answer instead of starting another
//! one. A live request that sees a timeout, network error, or 5xx calls
//! [`HealthCheck::invalidate`] and the next query probes again.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::config::schema::TimeoutConfig;
use crate::oplog::OperatorLog;

/// Cached reachability answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReachabilityState {
    pub reachable: bool,
    /// `None` forces the next check to probe.
    pub last_checked: Option<Instant>,
}

impl Default for ReachabilityState {
    fn default() -> Self {
        Self {
            reachable: true,
            last_checked: None,
        }
    }
}

/// Reachability cache for one service. Share it with `Arc`.
#[derive(Debug)]
pub struct HealthCheck {
    url: String,
    bearer: String,
    interval: Duration,
    probe_timeout: Duration,
    state: Mutex<ReachabilityState>,
    log: OperatorLog,
}

impl HealthCheck {
    /// Build a cache probing `{base_url}/health` with the anonymous key.
    pub fn new(base_url: &str, anon_key: &str, timeouts: &TimeoutConfig, log: OperatorLog) -> Self {
        Self {
            url: format!("{}/health", base_url.trim_end_matches('/')),
            bearer: anon_key.to_string(),
            interval: timeouts.health_check_interval(),
            probe_timeout: timeouts.probe(),
            state: Mutex::new(ReachabilityState::default()),
            log,
        }
    }

    /// Whether the service is believed reachable, probing if the cached
    /// answer is older than the interval.
    pub fn is_reachable(&self) -> bool {
        self.check_with(|| self.probe())
    }

    /// Forget the cached answer so the next query re-probes.
    pub fn invalidate(&self) {
        let mut state = self.lock();
        state.reachable = false;
        state.last_checked = None;
    }

    pub fn snapshot(&self) -> ReachabilityState {
        *self.lock()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Cache logic with the probe supplied by the caller.
    pub(crate) fn check_with<F>(&self, probe: F) -> bool
    where
        F: FnOnce() -> bool,
    {
        {
            let mut state = self.lock();
            if let Some(checked_at) = state.last_checked
                && checked_at.elapsed() < self.interval
            {
                return state.reachable;
            }
            state.last_checked = Some(Instant::now());
        }

        let reachable = probe();
        self.lock().reachable = reachable;
        reachable
    }

    fn probe(&self) -> bool {
        let result = ureq::get(&self.url)
            .timeout(self.probe_timeout)
            .set("Authorization", &format!("Bearer {}", self.bearer))
            .call();

        match result {
            Ok(resp) if (200..300).contains(&resp.status()) => true,
            Ok(resp) => {
                self.log
                    .warn(&format!("health probe returned status {}", resp.status()));
                false
            }
            Err(ureq::Error::Status(status, _)) => {
                self.log.warn(&format!("health probe failed: status {status}"));
                false
            }
            Err(error) => {
                self.log.warn(&format!("health probe error: {error}"));
                false
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, ReachabilityState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn cache(interval_ms: u64) -> HealthCheck {
        let timeouts = TimeoutConfig {
            health_check_interval_ms: interval_ms,
            ..TimeoutConfig::default()
        };
        HealthCheck::new("http://127.0.0.1:1", "anon", &timeouts, OperatorLog::disabled())
    }

    #[test]
    fn url_is_built_from_base() {
        let hc = cache(30_000);
        assert_eq!(hc.url, "http://127.0.0.1:1/health");
    }

    #[test]
    fn first_check_probes() {
        let hc = cache(30_000);
        let probes = Cell::new(0);
        assert!(!hc.check_with(|| {
            probes.set(probes.get() + 1);
            false
        }));
        assert_eq!(probes.get(), 1);
        assert!(!hc.snapshot().reachable);
    }

    #[test]
    fn second_check_within_interval_uses_cache() {
        let hc = cache(30_000);
        let probes = Cell::new(0);
        let probe = || {
            probes.set(probes.get() + 1);
            true
        };

        assert!(hc.check_with(probe));
        assert!(hc.check_with(probe));
        assert_eq!(probes.get(), 1);
    }

    #[test]
    fn invalidate_forces_reprobe() {
        let hc = cache(30_000);
        let probes = Cell::new(0);
        let probe = || {
            probes.set(probes.get() + 1);
            true
        };

        hc.check_with(probe);
        hc.invalidate();
        assert_eq!(hc.snapshot().last_checked, None);
        assert!(!hc.snapshot().reachable);

        assert!(hc.check_with(probe));
        assert_eq!(probes.get(), 2);
    }

    #[test]
    fn expired_interval_reprobes() {
        let hc = cache(0);
        let probes = Cell::new(0);
        let probe = || {
            probes.set(probes.get() + 1);
            true
        };

        hc.check_with(probe);
        std::thread::sleep(Duration::from_millis(5));
        hc.check_with(probe);
        assert_eq!(probes.get(), 2);
    }

    #[test]
    fn unreachable_port_reports_false() {
        // Port 1 is never listening; connection is refused immediately.
        let hc = cache(30_000);
        assert!(!hc.is_reachable());
    }
}
