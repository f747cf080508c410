//! Foreground operations: goals, preferences, profile.
//!
//! Unlike the dashboard refresh and activity logging, these run because
//! the user asked for them, so failures come back as a short readable
//! `anyhow::Error` ("request timed out: /profile") for the caller to show.
//! Successful writes are recorded through the activity sink.

pub mod goals;
pub mod settings;

use std::sync::Arc;

use serde_json::Value;

use crate::activity::ActivitySink;
use crate::client::Executor;

pub use goals::NewGoal;

pub struct Api {
    executor: Arc<Executor>,
    activity: Option<ActivitySink>,
}

impl Api {
    pub fn new(executor: Arc<Executor>, activity: Option<ActivitySink>) -> Self {
        Self { executor, activity }
    }

    /// Record an activity synchronously so short-lived callers don't lose it.
    fn record(&self, kind: &str, data: Value) {
        if let Some(sink) = &self.activity {
            sink.deliver(kind, data);
        }
    }
}
