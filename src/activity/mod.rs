//! Activity log sink.
//!
//! Best-effort telemetry of user actions. Each record is posted to
//! `/log-activity` with the short telemetry deadline; when delivery fails
//! for any reason the record is kept in the local [`PendingStore`] instead.
//! Callers never see an error.
//!
//! Buffered records are not replayed. `healthsync pending` lists them and
//! `healthsync pending --clear` drops them.

pub mod pending;

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use chrono::Utc;
use serde_json::{Value, json};

use crate::client::{Executor, RequestOptions, RequestOutcome};
use crate::config::HealthsyncConfig;
use crate::oplog::OperatorLog;

pub use pending::{PendingActivity, PendingStore};

#[derive(Debug, Clone)]
pub struct ActivitySink {
    executor: Arc<Executor>,
    pending: Arc<PendingStore>,
    log: OperatorLog,
}

impl ActivitySink {
    pub fn new(executor: Arc<Executor>, pending: Arc<PendingStore>) -> Self {
        let log = executor.log().clone();
        Self {
            executor,
            pending,
            log,
        }
    }

    /// Build the sink with the spillover file from `[activity]`.
    ///
    /// Returns `None` only when no spillover path can be determined.
    pub fn from_config(executor: Arc<Executor>, config: &HealthsyncConfig) -> Option<Self> {
        let path = if config.activity.pending_file.is_empty() {
            PendingStore::default_path()?
        } else {
            config.activity.pending_file.clone().into()
        };
        let store = PendingStore::new(path, config.activity.pending_capacity);
        Some(Self::new(executor, Arc::new(store)))
    }

    /// Fire-and-forget: deliver on a background thread.
    ///
    /// The returned handle may be dropped; it exists so short-lived hosts
    /// can wait before exiting.
    pub fn log(&self, kind: &str, data: Value) -> JoinHandle<bool> {
        let sink = self.clone();
        let kind = kind.to_string();
        thread::spawn(move || sink.deliver(&kind, data))
    }

    /// Deliver one record, buffering it locally on failure.
    ///
    /// Returns `true` when the service accepted the record.
    pub fn deliver(&self, kind: &str, data: Value) -> bool {
        let timestamp = Utc::now().to_rfc3339();
        let body = json!({ "type": kind, "data": data });

        let outcome: RequestOutcome<Value> = self
            .executor
            .execute("/log-activity", &RequestOptions::telemetry(body));

        if outcome.is_success() {
            return true;
        }

        self.log
            .warn(&format!("activity logging failed for {kind}: {outcome}"));

        let record = PendingActivity {
            kind: kind.to_string(),
            data,
            timestamp,
            pending: true,
        };
        match self.pending.push(record) {
            Ok(()) => self
                .log
                .info(&format!("stored {kind} activity locally for later sync")),
            Err(error) => self
                .log
                .error(&format!("failed to store activity locally: {error:#}")),
        }
        false
    }

    pub fn pending(&self) -> Vec<PendingActivity> {
        self.pending.entries()
    }

    pub fn clear_pending(&self) -> anyhow::Result<usize> {
        self.pending.clear()
    }

    pub fn store(&self) -> &PendingStore {
        &self.pending
    }
}
