//! Domain types exchanged with the health service.
//!
//! Wire names follow the service's camelCase JSON. Every dataset series is
//! `#[serde(default)]` so a live payload that omits a series still decodes;
//! the dashboard treats the dataset as an opaque payload either way.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Date range
// ---------------------------------------------------------------------------

/// Time window requested from `/health-metrics`.
///
/// The four recognized values are enumerated; anything else is carried
/// verbatim in [`DateRange::Other`] and left for the service to reject.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum DateRange {
    Last24Hours,
    #[default]
    Last7Days,
    Last30Days,
    Last90Days,
    Other(String),
}

impl DateRange {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Last24Hours => "24hours",
            Self::Last7Days => "7days",
            Self::Last30Days => "30days",
            Self::Last90Days => "90days",
            Self::Other(raw) => raw,
        }
    }

    /// Whether this is one of the enumerated ranges.
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DateRange {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "24hours" => Self::Last24Hours,
            "7days" => Self::Last7Days,
            "30days" => Self::Last30Days,
            "90days" => Self::Last90Days,
            other => Self::Other(other.to_string()),
        })
    }
}

impl Serialize for DateRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DateRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.parse().unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Dashboard dataset
// ---------------------------------------------------------------------------

/// Everything the dashboard charts and metric cards render.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HealthDataset {
    pub step_data: Vec<StepPoint>,
    pub heart_rate_data: Vec<HeartRatePoint>,
    pub sleep_data: Vec<SleepPoint>,
    pub activity_distribution: Vec<ActivityShare>,
    pub health_metrics: Vec<MetricCard>,
}

impl HealthDataset {
    /// True when no series carries any data.
    pub fn is_empty(&self) -> bool {
        self.step_data.is_empty()
            && self.heart_rate_data.is_empty()
            && self.sleep_data.is_empty()
            && self.activity_distribution.is_empty()
            && self.health_metrics.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepPoint {
    pub date: String,
    pub steps: u32,
    pub goal: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartRatePoint {
    pub time: String,
    pub resting: u16,
    pub active: u16,
    pub max: u16,
}

/// Hours spent in each sleep stage for one night.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepPoint {
    pub date: String,
    pub deep: f64,
    pub light: f64,
    pub rem: f64,
    pub awake: f64,
}

impl SleepPoint {
    pub fn total_hours(&self) -> f64 {
        self.deep + self.light + self.rem + self.awake
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityShare {
    pub name: String,
    pub value: u32,
    pub color: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

/// A single headline metric card ("Steps", "Sleep", ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricCard {
    pub title: String,
    pub value: String,
    pub target: String,
    pub progress: u32,
    pub trend: Trend,
    pub change: String,
}

// ---------------------------------------------------------------------------
// Insights
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Achievement,
    Recommendation,
    Pattern,
    Alert,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub title: String,
    pub description: String,
    pub priority: Priority,
}

// ---------------------------------------------------------------------------
// Goals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    #[default]
    Active,
    Completed,
    Paused,
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Completed => write!(f, "completed"),
            Self::Paused => write!(f, "paused"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub id: String,
    pub title: String,
    pub target_value: f64,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub target_value: f64,
    #[serde(default)]
    pub current_value: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: GoalStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
}

impl Goal {
    /// Percentage of the target reached, capped at 100.
    pub fn progress_pct(&self) -> f64 {
        if self.target_value <= 0.0 {
            return 0.0;
        }
        (self.current_value / self.target_value * 100.0).min(100.0)
    }

    /// Record a new current value.
    ///
    /// Completes the goal once the target is reached and stamps every
    /// milestone whose target has been passed. Returns `true` only when this
    /// call moved the goal into [`GoalStatus::Completed`].
    pub fn apply_progress(&mut self, value: f64, now: DateTime<Utc>) -> bool {
        self.current_value = value;

        for milestone in &mut self.milestones {
            if value >= milestone.target_value && !milestone.completed {
                milestone.completed = true;
                milestone.completed_at = Some(now);
            }
        }

        if value >= self.target_value && self.status != GoalStatus::Completed {
            self.status = GoalStatus::Completed;
            return true;
        }
        false
    }
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BasicInfo {
    pub age: String,
    pub height: String,
    pub weight: String,
    pub activity_level: String,
    pub health_conditions: String,
    pub medications: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Profile {
    pub full_name: String,
    pub email: String,
    pub basic_info: BasicInfo,
}
