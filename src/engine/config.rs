//! Configuration types for the verification engine

use std::time::Duration;

/// Default per-call probe timeout
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(20);

/// Bounds accepted for the per-call probe timeout
pub const MIN_PROBE_TIMEOUT: Duration = Duration::from_secs(1);
pub const MAX_PROBE_TIMEOUT: Duration = Duration::from_secs(120);

/// Upper bound on concurrent checks
pub const MAX_WORKERS: usize = 8;

/// Extra time the watchdog allows on top of the probe timeouts of a check
pub const DEFAULT_WATCHDOG_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum time a single probe call may take
    pub probe_timeout: Duration,
    /// Worker count; `None` means one worker per check (capped at MAX_WORKERS)
    pub max_workers: Option<usize>,
    /// Slack added to a check's deadline before the watchdog gives up on it
    pub watchdog_grace: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            max_workers: None,
            watchdog_grace: DEFAULT_WATCHDOG_GRACE,
        }
    }
}

impl EngineConfig {
    /// Create a configuration with a custom probe timeout, clamped to sane bounds
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            probe_timeout: timeout.clamp(MIN_PROBE_TIMEOUT, MAX_PROBE_TIMEOUT),
            ..Self::default()
        }
    }

    /// Run checks one after another
    pub fn sequential(mut self) -> Self {
        self.max_workers = Some(1);
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.max_workers = Some(workers);
        self
    }

    /// Worker pool size for a set of `checks` checks
    pub fn workers_for(&self, checks: usize) -> usize {
        let wanted = self.max_workers.unwrap_or(checks);
        wanted.clamp(1, MAX_WORKERS).min(checks.max(1))
    }

    /// How long a check making `probes` calls may run before it is abandoned
    pub fn deadline_for(&self, probes: u32) -> Duration {
        self.probe_timeout.saturating_mul(probes.max(1)) + self.watchdog_grace
    }
}
