/// Configuration schema and defaults for healthsync.
///
/// Defines the TOML-serializable configuration structure with the sections
/// `[service]`, `[timeouts]`, `[dashboard]`, `[activity]`, `[logging]`, and
/// `[server]`.
///
/// Every field has a built-in default. Users only need to set the values
/// they want to override.
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::model::DateRange;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level healthsync configuration.
///
/// Maps directly to the `~/.healthsync/config.toml` and `.healthsync.toml`
/// file schemas. Missing sections and fields fall back to defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthsyncConfig {
    pub service: ServiceConfig,
    pub timeouts: TimeoutConfig,
    pub dashboard: DashboardConfig,
    pub activity: ActivityConfig,
    pub logging: LoggingConfig,
    pub server: ServerConfig,
}

// ---------------------------------------------------------------------------
// [service]
// ---------------------------------------------------------------------------

/// Remote service location and credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL every endpoint path is appended to.
    pub base_url: String,
    /// Public key sent as the bearer credential when no session exists.
    pub anon_key: String,
    /// Session access token. Empty means anonymous.
    pub access_token: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:9747".to_string(),
            anon_key: "public-anon-key".to_string(),
            access_token: String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// [timeouts]
// ---------------------------------------------------------------------------

/// Deadlines and the reachability cache interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// How long a reachability result is trusted.
    pub health_check_interval_ms: u64,
    /// Deadline for the `/health` probe.
    pub probe_ms: u64,
    /// Deadline for data reads and foreground writes.
    pub data_ms: u64,
    /// Deadline for telemetry writes (`/log-activity`).
    pub telemetry_ms: u64,
    /// Outer deadline shared by the two background dashboard calls.
    pub refresh_deadline_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            health_check_interval_ms: 30_000,
            probe_ms: 5_000,
            data_ms: 10_000,
            telemetry_ms: 3_000,
            refresh_deadline_ms: 8_000,
        }
    }
}

impl TimeoutConfig {
    pub fn health_check_interval(&self) -> Duration {
        Duration::from_millis(self.health_check_interval_ms)
    }

    pub fn probe(&self) -> Duration {
        Duration::from_millis(self.probe_ms)
    }

    pub fn data(&self) -> Duration {
        Duration::from_millis(self.data_ms)
    }

    pub fn telemetry(&self) -> Duration {
        Duration::from_millis(self.telemetry_ms)
    }

    pub fn refresh_deadline(&self) -> Duration {
        Duration::from_millis(self.refresh_deadline_ms)
    }
}

// ---------------------------------------------------------------------------
// [dashboard]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Range used when none is given on the command line.
    pub default_range: DateRange,
}

// ---------------------------------------------------------------------------
// [activity]
// ---------------------------------------------------------------------------

/// Local spillover for activity records that could not be delivered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityConfig {
    /// Maximum buffered records; the oldest are evicted first.
    pub pending_capacity: usize,
    /// Spillover file. Empty means `~/.healthsync/pending-activities.json`.
    pub pending_file: String,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            pending_capacity: 50,
            pending_file: String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Operator log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,
    /// Log file. Empty means `~/.healthsync/client.log`.
    pub file: String,
    /// Echo every line to stderr as well.
    pub stderr: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            file: String::new(),
            stderr: false,
        }
    }
}

// ---------------------------------------------------------------------------
// [server]
// ---------------------------------------------------------------------------

/// Local development service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:9747".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Annotated default file
// ---------------------------------------------------------------------------

impl HealthsyncConfig {
    /// The annotated default config written by `healthsync config init`.
    pub fn default_toml() -> String {
        r#"# healthsync configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (HEALTHSYNC_*)
#   2. Project config (.healthsync.toml in current directory)
#   3. User global config (~/.healthsync/config.toml)
#   4. Built-in defaults

[service]
base_url = "http://127.0.0.1:9747"
anon_key = "public-anon-key"
access_token = ""                     # empty = anonymous

[timeouts]
health_check_interval_ms = 30000      # reuse a reachability result this long
probe_ms = 5000
data_ms = 10000
telemetry_ms = 3000
refresh_deadline_ms = 8000            # shared deadline for metrics + insights

[dashboard]
default_range = "7days"               # 24hours | 7days | 30days | 90days

[activity]
pending_capacity = 50
pending_file = ""                     # empty = ~/.healthsync/pending-activities.json

[logging]
enabled = true
file = ""                             # empty = ~/.healthsync/client.log
stderr = false

[server]
addr = "127.0.0.1:9747"
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
