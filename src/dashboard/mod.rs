//! Dashboard data orchestrator.
//!
//! Mounting shows the built-in demo data synchronously, then starts a
//! background refresh that fetches `/health-metrics` and `/insights` in
//! parallel under one shared deadline. A slice is replaced only by a clean
//! success; every other outcome keeps what is on screen and is reported to
//! the operator log, never to the user.
//!
//! ```text
//! Initializing ──▶ DemoDisplayed ──▶ LiveDisplayed
//!                        │
//!                        └──(no success before deadline)── stays
//! ```
//!
//! Each mount bumps a generation token (`epoch`) stored with the state.
//! A result is applied only while its refresh's epoch is still current, so
//! a response for an old date range can never overwrite a newer mount.

pub mod state;

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::client::{Executor, RequestOptions, RequestOutcome};
use crate::model::{DateRange, HealthDataset, Insight};
use crate::oplog::OperatorLog;

pub use state::{DashboardData, DashboardState, DataSource, Phase};

// ---------------------------------------------------------------------------
// Refresh report
// ---------------------------------------------------------------------------

/// What happened to one slice during a background refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "detail")]
pub enum SliceReport {
    /// Live payload replaced the slice.
    Applied,
    /// The call failed; the slice was left alone. Reported even when a
    /// newer mount already owns the state.
    Failed(String),
    /// The call succeeded but a newer mount owns the state.
    Stale,
    /// No result before the shared deadline.
    Abandoned,
}

/// Operator-facing summary of one background refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshReport {
    pub epoch: u64,
    pub date_range: DateRange,
    pub metrics: SliceReport,
    pub insights: SliceReport,
    pub deadline_elapsed: bool,
}

impl RefreshReport {
    fn new(epoch: u64, date_range: DateRange) -> Self {
        Self {
            epoch,
            date_range,
            metrics: SliceReport::Abandoned,
            insights: SliceReport::Abandoned,
            deadline_elapsed: false,
        }
    }

    pub fn any_applied(&self) -> bool {
        self.metrics == SliceReport::Applied || self.insights == SliceReport::Applied
    }
}

/// Handle to an in-flight background refresh.
///
/// Dropping it detaches the refresh; it still finishes and still respects
/// the epoch guard.
#[derive(Debug)]
pub struct RefreshHandle {
    epoch: u64,
    date_range: DateRange,
    handle: JoinHandle<RefreshReport>,
}

impl RefreshHandle {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Block until the refresh has been decided.
    pub fn wait(self) -> RefreshReport {
        let Self {
            epoch,
            date_range,
            handle,
        } = self;
        handle
            .join()
            .unwrap_or_else(|_| RefreshReport::new(epoch, date_range))
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

enum SliceResult {
    Metrics(RequestOutcome<HealthDataset>),
    Insights(RequestOutcome<Vec<Insight>>),
}

/// Owns the dashboard state and drives refreshes against one executor.
#[derive(Debug)]
pub struct Dashboard {
    executor: Arc<Executor>,
    state: Arc<Mutex<DashboardState>>,
    refresh_deadline: Duration,
    log: OperatorLog,
}

impl Dashboard {
    pub fn new(executor: Arc<Executor>, refresh_deadline: Duration) -> Self {
        let log = executor.log().clone();
        Self {
            executor,
            state: Arc::new(Mutex::new(DashboardState::initializing(
                0,
                DateRange::default(),
            ))),
            refresh_deadline,
            log,
        }
    }

    /// Show demo data for `date_range` and start a background refresh.
    ///
    /// Demo data is in place when this returns. Any refresh still running
    /// for an earlier mount is invalidated.
    pub fn mount(&self, date_range: DateRange) -> RefreshHandle {
        let epoch = {
            let mut state = lock(&self.state);
            let epoch = state.epoch + 1;
            *state = DashboardState::initializing(epoch, date_range.clone());
            state.show_demo();
            epoch
        };

        let refresh = Refresh {
            executor: Arc::clone(&self.executor),
            state: Arc::clone(&self.state),
            deadline: self.refresh_deadline,
            log: self.log.clone(),
            epoch,
            date_range: date_range.clone(),
        };
        let handle = thread::spawn(move || refresh.run());

        RefreshHandle {
            epoch,
            date_range,
            handle,
        }
    }

    /// Switch ranges. Restarts from demo data for the new range.
    pub fn set_date_range(&self, date_range: DateRange) -> RefreshHandle {
        self.mount(date_range)
    }

    pub fn snapshot(&self) -> DashboardState {
        lock(&self.state).clone()
    }

    pub fn current_epoch(&self) -> u64 {
        lock(&self.state).epoch
    }
}

fn lock(state: &Mutex<DashboardState>) -> MutexGuard<'_, DashboardState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Background refresh
// ---------------------------------------------------------------------------

struct Refresh {
    executor: Arc<Executor>,
    state: Arc<Mutex<DashboardState>>,
    deadline: Duration,
    log: OperatorLog,
    epoch: u64,
    date_range: DateRange,
}

impl Refresh {
    fn run(self) -> RefreshReport {
        let (tx, rx) = mpsc::channel();

        let metrics_endpoint = format!(
            "/health-metrics?dateRange={}",
            encode_query_value(self.date_range.as_str())
        );
        spawn_fetch(&self.executor, tx.clone(), move |executor| {
            SliceResult::Metrics(executor.execute(&metrics_endpoint, &RequestOptions::get()))
        });
        spawn_fetch(&self.executor, tx, |executor| {
            SliceResult::Insights(executor.execute("/insights", &RequestOptions::get()))
        });

        let deadline = Instant::now() + self.deadline;
        let mut report = RefreshReport::new(self.epoch, self.date_range.clone());
        let mut outstanding = 2;

        while outstanding > 0 {
            let wait = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(wait) {
                Ok(result) => {
                    outstanding -= 1;
                    self.apply(result, &mut report);
                }
                Err(RecvTimeoutError::Timeout) => {
                    report.deadline_elapsed = true;
                    self.log.warn(&format!(
                        "background refresh for {} timed out after {} ms, continuing with current data",
                        self.date_range,
                        self.deadline.as_millis()
                    ));
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        // Late results now fail to send and are dropped with the channel.
        drop(rx);

        if report.any_applied() {
            self.log.info(&format!(
                "loaded live dashboard data for {} (metrics: {:?}, insights: {:?})",
                self.date_range, report.metrics, report.insights
            ));
        }
        report
    }

    fn apply(&self, result: SliceResult, report: &mut RefreshReport) {
        let mut state = lock(&self.state);

        if state.epoch != self.epoch {
            let (slice, succeeded, label) = match &result {
                SliceResult::Metrics(outcome) => {
                    (&mut report.metrics, outcome.is_success(), outcome.label())
                }
                SliceResult::Insights(outcome) => {
                    (&mut report.insights, outcome.is_success(), outcome.label())
                }
            };
            self.log.info(&format!(
                "discarding {label} result for {} (epoch {} superseded by {})",
                self.date_range, self.epoch, state.epoch
            ));
            *slice = if succeeded {
                SliceReport::Stale
            } else {
                SliceReport::Failed(label)
            };
            return;
        }

        match result {
            SliceResult::Metrics(RequestOutcome::Success(metrics)) => {
                state.apply_metrics(metrics);
                report.metrics = SliceReport::Applied;
            }
            SliceResult::Metrics(outcome) => {
                self.log.warn(&format!(
                    "failed to fetch health metrics, keeping current data: {outcome}"
                ));
                report.metrics = SliceReport::Failed(outcome.label());
            }
            SliceResult::Insights(RequestOutcome::Success(insights)) => {
                state.apply_insights(insights);
                report.insights = SliceReport::Applied;
            }
            SliceResult::Insights(outcome) => {
                self.log.warn(&format!(
                    "failed to fetch insights, keeping current data: {outcome}"
                ));
                report.insights = SliceReport::Failed(outcome.label());
            }
        }
    }
}

fn spawn_fetch<F>(executor: &Arc<Executor>, tx: mpsc::Sender<SliceResult>, fetch: F)
where
    F: FnOnce(&Executor) -> SliceResult + Send + 'static,
{
    let executor = Arc::clone(executor);
    thread::spawn(move || {
        let _ = tx.send(fetch(&executor));
    });
}

/// Percent-encode a query value, leaving unreserved characters alone.
fn encode_query_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
