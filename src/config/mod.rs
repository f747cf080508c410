/// Configuration system for healthsync.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults**: [`schema::HealthsyncConfig::default()`]
/// 2. **User global config**: `~/.healthsync/config.toml`
/// 3. **Project local config**: `.healthsync.toml` in the current directory
/// 4. **Environment variables**: `HEALTHSYNC_*` overrides (highest precedence)
///
/// Later layers override earlier ones at the key level: a file that only
/// sets `[timeouts] data_ms` leaves every other value from the layer below.
pub mod schema;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub use schema::HealthsyncConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
///
/// Malformed or unreadable files are skipped so a bad config never stops
/// the dashboard from showing its fallback data. A file that parses but
/// holds a value of the wrong type is skipped as a whole; the other layers
/// still apply.
pub fn load() -> HealthsyncConfig {
    let layers = [global_config_path(), project_config_path()]
        .into_iter()
        .filter_map(load_toml_value);
    with_env(resolve_layers(layers))
}

/// Merge file layers over the built-in defaults, dropping any layer that
/// would make the result fail to deserialize.
fn resolve_layers(layers: impl IntoIterator<Item = toml::Value>) -> HealthsyncConfig {
    let mut config = HealthsyncConfig::default();
    let Ok(mut merged) = toml::Value::try_from(&config) else {
        return config;
    };

    for overlay in layers {
        let mut candidate = merged.clone();
        merge_values(&mut candidate, overlay);
        let resolved: Result<HealthsyncConfig, toml::de::Error> = candidate.clone().try_into();
        if let Ok(resolved) = resolved {
            merged = candidate;
            config = resolved;
        }
    }
    config
}

fn with_env(mut config: HealthsyncConfig) -> HealthsyncConfig {
    apply_env_overrides(&mut config);
    config
}

/// Read a TOML file as an untyped value tree.
fn load_toml_value(path: Option<PathBuf>) -> Option<toml::Value> {
    let path = path?;
    let content = fs::read_to_string(&path).ok()?;
    toml::from_str(&content).ok()
}

/// Deep-merge `overlay` into `base`: tables merge key by key, anything else
/// replaces the base value.
fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Path to the user global config: `~/.healthsync/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".healthsync").join("config.toml"))
}

/// Path to the project local config: `.healthsync.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".healthsync.toml"))
}

pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `HEALTHSYNC_URL`: service base URL
/// - `HEALTHSYNC_ANON_KEY`: anonymous bearer key
/// - `HEALTHSYNC_ACCESS_TOKEN`: session token
/// - `HEALTHSYNC_DATA_TIMEOUT_MS`, `HEALTHSYNC_TELEMETRY_TIMEOUT_MS`,
///   `HEALTHSYNC_REFRESH_DEADLINE_MS`: deadlines
/// - `HEALTHSYNC_RANGE`: default dashboard date range
/// - `HEALTHSYNC_PENDING_FILE`: activity spillover file
/// - `HEALTHSYNC_LOG_STDERR`: echo operator log to stderr
fn apply_env_overrides(config: &mut HealthsyncConfig) {
    if let Ok(val) = std::env::var("HEALTHSYNC_URL")
        && !val.is_empty()
    {
        config.service.base_url = val;
    }
    if let Ok(val) = std::env::var("HEALTHSYNC_ANON_KEY")
        && !val.is_empty()
    {
        config.service.anon_key = val;
    }
    if let Ok(val) = std::env::var("HEALTHSYNC_ACCESS_TOKEN") {
        config.service.access_token = val;
    }

    if let Ok(val) = std::env::var("HEALTHSYNC_DATA_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.timeouts.data_ms = ms;
    }
    if let Ok(val) = std::env::var("HEALTHSYNC_TELEMETRY_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.timeouts.telemetry_ms = ms;
    }
    if let Ok(val) = std::env::var("HEALTHSYNC_REFRESH_DEADLINE_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.timeouts.refresh_deadline_ms = ms;
    }

    if let Ok(val) = std::env::var("HEALTHSYNC_RANGE")
        && !val.is_empty()
    {
        config.dashboard.default_range = val.parse().unwrap_or_default();
    }
    if let Ok(val) = std::env::var("HEALTHSYNC_PENDING_FILE")
        && !val.is_empty()
    {
        config.activity.pending_file = val;
    }
    if let Ok(val) = std::env::var("HEALTHSYNC_LOG_STDERR") {
        config.logging.stderr = is_truthy(&val);
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / show
// ---------------------------------------------------------------------------

/// Write the annotated default config to `~/.healthsync/config.toml`.
///
/// Refuses to overwrite an existing file unless `force` is set.
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.healthsync/ directory")?;
    }

    fs::write(&path, HealthsyncConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Show the effective (fully resolved) config as TOML.
///
/// The access token is masked.
pub fn show_effective_config() -> Result<String> {
    let mut config = load();
    if !config.service.access_token.is_empty() {
        config.service.access_token = "********".to_string();
    }
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
