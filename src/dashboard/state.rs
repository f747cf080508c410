//! Dashboard view state.

use std::fmt;

use serde::Serialize;

use crate::demo;
use crate::model::{DateRange, HealthDataset, Insight};

/// Where a slice of the view came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    #[default]
    Demo,
    Live,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Demo => write!(f, "demo"),
            Self::Live => write!(f, "live"),
        }
    }
}

/// Orchestrator phase for the current mount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Initializing,
    DemoDisplayed,
    LiveDisplayed,
}

/// The two independently refreshed slices.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardData {
    pub metrics: HealthDataset,
    pub insights: Vec<Insight>,
}

impl DashboardData {
    pub fn demo() -> Self {
        Self {
            metrics: demo::default_dataset(),
            insights: demo::default_insights(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardState {
    /// Generation token of the mount that owns this state.
    pub epoch: u64,
    pub date_range: DateRange,
    pub phase: Phase,
    pub data: DashboardData,
    pub metrics_source: DataSource,
    pub insights_source: DataSource,
    pub loading: bool,
}

impl DashboardState {
    /// Fresh state for a new mount: demo data, still loading.
    pub fn initializing(epoch: u64, date_range: DateRange) -> Self {
        Self {
            epoch,
            date_range,
            phase: Phase::Initializing,
            data: DashboardData::demo(),
            metrics_source: DataSource::Demo,
            insights_source: DataSource::Demo,
            loading: true,
        }
    }

    /// Aggregate label. Live as soon as either slice is live.
    pub fn source(&self) -> DataSource {
        if self.metrics_source == DataSource::Live || self.insights_source == DataSource::Live {
            DataSource::Live
        } else {
            DataSource::Demo
        }
    }

    /// True when every slice came from the service.
    pub fn is_fully_live(&self) -> bool {
        self.metrics_source == DataSource::Live && self.insights_source == DataSource::Live
    }

    pub(crate) fn show_demo(&mut self) {
        self.phase = Phase::DemoDisplayed;
        self.loading = false;
    }

    pub(crate) fn apply_metrics(&mut self, metrics: HealthDataset) {
        self.data.metrics = metrics;
        self.metrics_source = DataSource::Live;
        self.phase = Phase::LiveDisplayed;
    }

    pub(crate) fn apply_insights(&mut self, insights: Vec<Insight>) {
        self.data.insights = insights;
        self.insights_source = DataSource::Live;
        self.phase = Phase::LiveDisplayed;
    }
}
