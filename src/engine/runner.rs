//! Bounded worker pool that runs an assertion set and collects a report

use chrono::Utc;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::cancel::CancelToken;
use super::config::EngineConfig;
use super::state::EngineState;
use crate::checks::{AssertionSet, CheckSpec};
use crate::config::Environment;
use crate::error::{HarnessError, HarnessResult};
use crate::probe::{Credential, EndpointSpec, Probe, Transport};
use crate::report::{FailureKind, ProbeResult, Report};
use crate::utils::format_duration;

/// How often the collector wakes up to look at deadlines and cancellation
const POLL_INTERVAL: Duration = Duration::from_millis(25);

pub(super) enum WorkerEvent {
    Started(usize),
    Finished(usize, ProbeResult),
}

/// Result slots in declaration order, plus the checks currently in flight
pub(super) struct Collector {
    slots: Vec<Option<ProbeResult>>,
    in_flight: HashMap<usize, Instant>,
    remaining: usize,
}

impl Collector {
    pub(super) fn new(checks: usize) -> Self {
        Self {
            slots: vec![None; checks],
            in_flight: HashMap::new(),
            remaining: checks,
        }
    }

    pub(super) fn remaining(&self) -> usize {
        self.remaining
    }

    #[cfg(test)]
    pub(super) fn result(&self, index: usize) -> Option<&ProbeResult> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub(super) fn record(&mut self, event: WorkerEvent) {
        match event {
            WorkerEvent::Started(index) => {
                self.in_flight.insert(index, Instant::now());
            }
            WorkerEvent::Finished(index, result) => {
                self.in_flight.remove(&index);
                if self.slots[index].is_some() {
                    debug!(check = %result.name, "discarding result of abandoned check");
                    return;
                }
                info!(
                    check = %result.name,
                    status = result.status.label(),
                    duration_ms = result.duration.as_millis() as u64,
                    "check finished"
                );
                self.slots[index] = Some(result);
                self.remaining -= 1;
            }
        }
    }

    /// Record every event already queued, without waiting for more
    pub(super) fn drain(&mut self, events: &Receiver<WorkerEvent>) {
        while let Ok(event) = events.try_recv() {
            self.record(event);
        }
    }

    pub(super) fn overdue(&self, checks: &[CheckSpec], config: &EngineConfig) -> Vec<usize> {
        self.in_flight
            .iter()
            .filter(|(index, since)| {
                since.elapsed() > config.deadline_for(checks[**index].probe_count())
            })
            .map(|(index, _)| *index)
            .collect()
    }

    /// Give up on a check that outlived `deadline`; its worker's late result is dropped
    pub(super) fn abandon(&mut self, index: usize, check: &CheckSpec, deadline: Duration) {
        let elapsed = self
            .in_flight
            .remove(&index)
            .map(|since| since.elapsed())
            .unwrap_or(deadline);
        warn!(
            check = %check.name,
            deadline = %format_duration(deadline),
            "check exceeded its deadline, abandoning worker"
        );
        self.slots[index] = Some(
            ProbeResult::fail(
                &check.name,
                FailureKind::Network,
                format!(
                    "timeout: no result within {}, check abandoned",
                    format_duration(deadline)
                ),
            )
            .with_duration(elapsed)
            .with_mutating(check.is_mutating()),
        );
        self.remaining -= 1;
    }

    /// Results in declaration order, and the names of checks that never finished
    pub(super) fn finish(self, checks: &[CheckSpec]) -> (Vec<ProbeResult>, Vec<String>) {
        let not_run = checks
            .iter()
            .zip(&self.slots)
            .filter(|(_, slot)| slot.is_none())
            .map(|(check, _)| check.name.clone())
            .collect();
        (self.slots.into_iter().flatten().collect(), not_run)
    }
}

/// State shared by every worker of one run
struct Pool {
    checks: Arc<Vec<CheckSpec>>,
    env: Arc<Environment>,
    transport: Arc<dyn Transport>,
    cancel: CancelToken,
    next: Arc<AtomicUsize>,
    events: Sender<WorkerEvent>,
    spawned: usize,
}

impl Pool {
    fn spawn_worker(&mut self) -> HarnessResult<()> {
        let checks = Arc::clone(&self.checks);
        let env = Arc::clone(&self.env);
        let transport = Arc::clone(&self.transport);
        let cancel = self.cancel.clone();
        let next = Arc::clone(&self.next);
        let events = self.events.clone();

        self.spawned += 1;
        thread::Builder::new()
            .name(format!("postflight-worker-{}", self.spawned))
            .spawn(move || worker_loop(&checks, &env, transport.as_ref(), &cancel, &next, &events))
            .map_err(|e| HarnessError::WorkerPool(format!("cannot spawn worker thread: {e}")))?;
        Ok(())
    }
}

fn worker_loop(
    checks: &[CheckSpec],
    env: &Environment,
    transport: &dyn Transport,
    cancel: &CancelToken,
    next: &AtomicUsize,
    events: &Sender<WorkerEvent>,
) {
    while !cancel.is_cancelled() {
        let index = next.fetch_add(1, Ordering::SeqCst);
        let Some(check) = checks.get(index) else {
            return;
        };
        if events.send(WorkerEvent::Started(index)).is_err() {
            return;
        }
        debug!(check = %check.name, "check dispatched");
        let result = run_contained(check, env, transport);
        if events.send(WorkerEvent::Finished(index, result)).is_err() {
            return;
        }
    }
}

/// Run one check, turning a panic into a Fail result for that check alone
fn run_contained(check: &CheckSpec, env: &Environment, transport: &dyn Transport) -> ProbeResult {
    let started = Instant::now();
    match panic::catch_unwind(AssertUnwindSafe(|| check.run(env, transport))) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            warn!(check = %check.name, %message, "check panicked");
            ProbeResult::fail(
                &check.name,
                FailureKind::CheckFault,
                format!("check panicked: {message}"),
            )
            .with_duration(started.elapsed())
            .with_mutating(check.is_mutating())
        }
    }
}

/// Executes an assertion set once and produces the report
pub struct Engine {
    config: EngineConfig,
    transport: Arc<dyn Transport>,
    cancel: CancelToken,
    state: EngineState,
}

impl Engine {
    pub fn new(config: EngineConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            cancel: CancelToken::new(),
            state: EngineState::Idle,
        }
    }

    /// Share an externally owned token (e.g. one set from a signal handler)
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Confirm the data store answers at all before spending time on checks.
    ///
    /// Any HTTP status counts as reachable; only a transport failure aborts.
    pub fn preflight(&self, env: &Environment) -> HarnessResult<()> {
        let probe = Probe::new("preflight", EndpointSpec::get("", Credential::Service));
        let request = probe.request(env)?;
        match self.transport.execute(&request) {
            Ok(raw) => {
                info!(url = %request.url, status = raw.status, "data store reachable");
                Ok(())
            }
            Err(err) => Err(HarnessError::Unreachable {
                url: request.url.to_string(),
                reason: err.to_string(),
            }),
        }
    }

    /// Run every check in `set` and return results in declaration order.
    ///
    /// Endpoint failures are never errors here; only an invalid set or a
    /// broken worker pool is.
    pub fn run(&mut self, set: AssertionSet, env: Arc<Environment>) -> HarnessResult<Report> {
        set.validate(&env)?;
        self.state = self.state.try_transition(EngineState::Running)?;

        let started_at = Utc::now();
        let clock = Instant::now();
        let checks = Arc::new(set.into_checks());
        let workers = self.config.workers_for(checks.len());
        info!(checks = checks.len(), workers, "starting verification run");

        let (tx, rx) = mpsc::channel();
        let mut pool = Pool {
            checks: Arc::clone(&checks),
            env,
            transport: Arc::clone(&self.transport),
            cancel: self.cancel.clone(),
            next: Arc::new(AtomicUsize::new(0)),
            events: tx,
            spawned: 0,
        };
        for _ in 0..workers {
            pool.spawn_worker()?;
        }

        let mut collector = Collector::new(checks.len());
        let mut cancelled = false;

        while collector.remaining() > 0 {
            if self.cancel.is_cancelled() {
                // Results that arrived alongside the cancel still count
                collector.drain(&rx);
                warn!(remaining = collector.remaining(), "run cancelled");
                cancelled = true;
                break;
            }

            match rx.recv_timeout(POLL_INTERVAL) {
                Ok(event) => collector.record(event),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(HarnessError::WorkerPool(
                        "all workers exited before the run completed".into(),
                    ));
                }
            }

            for index in collector.overdue(&checks, &self.config) {
                let check = &checks[index];
                collector.abandon(index, check, self.config.deadline_for(check.probe_count()));
                // The stuck worker keeps its thread; replace it so the pool stays at size
                if pool.next.load(Ordering::SeqCst) < checks.len() {
                    pool.spawn_worker()?;
                }
            }
        }

        let duration = clock.elapsed();
        let (results, not_run) = collector.finish(&checks);

        self.state = self.state.try_transition(EngineState::Completed)?;
        let report = Report::new(started_at, duration, results);
        if cancelled {
            Ok(report.partial(not_run))
        } else {
            info!(
                overall = report.overall().label(),
                duration_ms = duration.as_millis() as u64,
                "verification run complete"
            );
            Ok(report)
        }
    }
}
