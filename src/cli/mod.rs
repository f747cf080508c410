//! CLI command implementations for healthsync.
//!
//! Provides subcommand handlers for:
//! - `healthsync dashboard`: demo-first dashboard load with background refresh
//! - `healthsync health`: reachability probe and config summary
//! - `healthsync log` / `healthsync pending`: activity telemetry
//! - `healthsync goals ...`, `preferences`, `profile`: foreground operations
//! - `healthsync serve`: local development service
//! - `healthsync config show|init|path`: configuration management

use std::sync::Arc;

use anyhow::{Context as _, Result};
use colored::Colorize;
use serde_json::Value;

use crate::activity::ActivitySink;
use crate::api::{Api, NewGoal};
use crate::client::{Credentials, Executor};
use crate::config::{self, HealthsyncConfig};
use crate::dashboard::{Dashboard, DashboardState, DataSource, RefreshReport, SliceReport};
use crate::demo;
use crate::model::{DateRange, Goal, Priority};
use crate::oplog::OperatorLog;
use crate::server::LocalService;

/// Output format for listing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            _ => Self::Table,
        }
    }
}

// ---------------------------------------------------------------------------
// Shared wiring
// ---------------------------------------------------------------------------

struct Context {
    config: HealthsyncConfig,
    executor: Arc<Executor>,
}

impl Context {
    fn load() -> Self {
        let config = config::load();
        let log = OperatorLog::from_config(&config.logging);
        let executor = Arc::new(Executor::from_config(&config, log));
        Self { config, executor }
    }

    fn activity(&self) -> Option<ActivitySink> {
        ActivitySink::from_config(Arc::clone(&self.executor), &self.config)
    }

    fn api(&self) -> Api {
        Api::new(Arc::clone(&self.executor), self.activity())
    }
}

// ---------------------------------------------------------------------------
// healthsync dashboard
// ---------------------------------------------------------------------------

pub fn run_dashboard(range: Option<String>, format: OutputFormat) -> Result<()> {
    let ctx = Context::load();
    let range = range
        .map(|r| r.parse::<DateRange>().unwrap_or_default())
        .unwrap_or_else(|| ctx.config.dashboard.default_range.clone());

    let dashboard = Dashboard::new(
        Arc::clone(&ctx.executor),
        ctx.config.timeouts.refresh_deadline(),
    );
    let handle = dashboard.mount(range);

    if format == OutputFormat::Table {
        let initial = dashboard.snapshot();
        println!(
            "{} showing {} data for {} while refreshing...",
            "▸".cyan(),
            initial.source(),
            initial.date_range
        );
    }

    let report = handle.wait();
    let state = dashboard.snapshot();

    match format {
        OutputFormat::Json => {
            let out = serde_json::json!({ "state": state, "source": state.source(), "report": report });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Table => print_dashboard(&state, &report),
    }
    Ok(())
}

fn print_dashboard(state: &DashboardState, report: &RefreshReport) {
    println!();
    println!("{}", "Health Dashboard".bold().cyan());
    println!("{}", "=".repeat(60));
    let source = match state.source() {
        DataSource::Live => "live".green(),
        DataSource::Demo => "demo".yellow(),
    };
    println!(
        "  {} {}   {} {}",
        "Range:".bold(),
        state.date_range,
        "Source:".bold(),
        source
    );
    println!();

    for card in &state.data.metrics.health_metrics {
        println!(
            "  {:<12} {:>10}  target {:<8} {:>4}%  {}",
            card.title,
            card.value,
            card.target,
            card.progress,
            card.change.dimmed()
        );
    }

    if !state.data.metrics.step_data.is_empty() {
        let total: u64 = state
            .data
            .metrics
            .step_data
            .iter()
            .map(|p| u64::from(p.steps))
            .sum();
        println!();
        println!(
            "  {} {} steps over {} days",
            "Steps:".bold(),
            format_number(total),
            state.data.metrics.step_data.len()
        );
    }

    let sleep = &state.data.metrics.sleep_data;
    if !sleep.is_empty() {
        let average = sleep.iter().map(|night| night.total_hours()).sum::<f64>() / sleep.len() as f64;
        println!(
            "  {} {:.1} h average over {} nights",
            "Sleep:".bold(),
            average,
            sleep.len()
        );
    }

    if !state.data.insights.is_empty() {
        println!();
        println!("{}", "Insights".bold().cyan());
        for insight in &state.data.insights {
            println!("  [{}] {}", insight.priority, insight.title.bold());
            println!("      {}", insight.description.dimmed());
        }
    }

    println!();
    println!("{}", "Refresh".bold().cyan());
    println!("  metrics:  {}", describe_slice(&report.metrics));
    println!("  insights: {}", describe_slice(&report.insights));
    if report.deadline_elapsed {
        println!("  {}", "deadline elapsed before all data arrived".yellow());
    }
}

fn describe_slice(slice: &SliceReport) -> String {
    match slice {
        SliceReport::Applied => "live".to_string(),
        SliceReport::Failed(reason) => format!("kept demo ({reason})"),
        SliceReport::Stale => "discarded (superseded)".to_string(),
        SliceReport::Abandoned => "kept demo (no response)".to_string(),
    }
}

// ---------------------------------------------------------------------------
// healthsync health
// ---------------------------------------------------------------------------

pub fn run_health() -> Result<()> {
    let ctx = Context::load();
    println!("{}", "healthsync Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    print_health_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.healthsync/config.toml found"
        } else {
            "not found (run `healthsync config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists {
            ".healthsync.toml found"
        } else {
            "none (optional)"
        },
    );

    let reachable = ctx.executor.health().is_reachable();
    let detail = if reachable {
        format!("reachable at {}", ctx.executor.base_url())
    } else {
        format!("not reachable at {}", ctx.executor.base_url())
    };
    print_health_item("Service", reachable, &detail);

    let session = Credentials::from_config(&ctx.config.service).has_session();
    print_health_item(
        "Credentials",
        true,
        if session { "session token" } else { "anonymous key" },
    );

    if let Some(sink) = ctx.activity() {
        let count = sink.pending().len();
        print_health_item(
            "Pending activities",
            count == 0,
            &format!("{count} buffered (capacity {})", sink.store().capacity()),
        );
    }

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<25} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// healthsync log | pending
// ---------------------------------------------------------------------------

pub fn run_log(kind: &str, data: Option<&str>) -> Result<()> {
    let ctx = Context::load();
    let data: Value = match data {
        Some(raw) => serde_json::from_str(raw).context("--data must be valid JSON")?,
        None => Value::Object(Default::default()),
    };

    let sink = ctx
        .activity()
        .context("could not determine a location for pending activities")?;

    if sink.deliver(kind, data) {
        println!("{} logged {kind}", "✓".green().bold());
    } else {
        println!(
            "{} service unavailable, {kind} stored locally ({} pending)",
            "•".yellow().bold(),
            sink.pending().len()
        );
    }
    Ok(())
}

pub fn run_pending(clear: bool, format: OutputFormat) -> Result<()> {
    let ctx = Context::load();
    let sink = ctx
        .activity()
        .context("could not determine a location for pending activities")?;

    if clear {
        let removed = sink.clear_pending()?;
        println!("Removed {removed} pending activities.");
        return Ok(());
    }

    let entries = sink.pending();
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("{}", "No pending activities.".green());
        return Ok(());
    }

    println!("{}", "Pending Activities".bold().cyan());
    println!("  {:<27} {:<20} Data", "Timestamp", "Type");
    println!("  {}", "-".repeat(70));
    for entry in &entries {
        println!(
            "  {:<27} {:<20} {}",
            truncate(&entry.timestamp, 27),
            truncate(&entry.kind, 20),
            truncate(&entry.data.to_string(), 40).dimmed()
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// healthsync goals
// ---------------------------------------------------------------------------

pub fn run_goals_list(format: OutputFormat) -> Result<()> {
    let ctx = Context::load();
    let (goals, live) = match ctx.api().list_goals() {
        Ok(goals) => (goals, true),
        Err(e) => {
            eprintln!("{} {e}; showing sample goals", "warning:".yellow().bold());
            (demo::default_goals(), false)
        }
    };

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&goals)?);
        return Ok(());
    }

    let title = if live { "Goals" } else { "Goals (sample)" };
    println!("{}", title.bold().cyan());
    if goals.is_empty() {
        println!("  No goals yet. Add one with `healthsync goals add`.");
        return Ok(());
    }
    for goal in &goals {
        print_goal(goal);
    }
    Ok(())
}

fn print_goal(goal: &Goal) {
    println!(
        "  {:<14} {:<28} {:>6.1}%  {} / {} {}  [{}]",
        truncate(&goal.id, 14),
        truncate(&goal.title, 28),
        goal.progress_pct(),
        goal.current_value,
        goal.target_value,
        goal.unit,
        goal.status
    );
}

pub fn run_goals_add(
    title: String,
    target: f64,
    unit: String,
    category: String,
    priority: Option<String>,
) -> Result<()> {
    let priority = match priority.as_deref() {
        Some("low") => Priority::Low,
        Some("high") => Priority::High,
        Some("medium") | None => Priority::Medium,
        Some(other) => anyhow::bail!("unknown priority '{other}' (low | medium | high)"),
    };
    let goal = NewGoal {
        title,
        description: String::new(),
        category,
        target_value: target,
        unit,
        priority,
    }
    .into_goal();

    let ctx = Context::load();
    ctx.api().save_goal(&goal, true)?;
    println!("{} created goal {}", "✓".green().bold(), goal.id);
    Ok(())
}

pub fn run_goals_progress(id: &str, value: f64) -> Result<()> {
    let ctx = Context::load();
    let api = ctx.api();
    let mut goal = api.find_goal(id)?;
    let completed = api.update_progress(&mut goal, value)?;
    print_goal(&goal);
    if completed {
        println!("{} goal completed!", "★".green().bold());
    }
    Ok(())
}

pub fn run_goals_delete(id: &str) -> Result<()> {
    let ctx = Context::load();
    ctx.api().delete_goal(id)?;
    println!("{} deleted goal {id}", "✓".green().bold());
    Ok(())
}

// ---------------------------------------------------------------------------
// healthsync preferences | profile
// ---------------------------------------------------------------------------

pub fn run_preferences(set: Option<&str>) -> Result<()> {
    let ctx = Context::load();
    let api = ctx.api();

    if let Some(raw) = set {
        let prefs: Value = serde_json::from_str(raw).context("--set must be valid JSON")?;
        api.put_preferences(&prefs)?;
        println!("{} preferences saved", "✓".green().bold());
        return Ok(());
    }

    let prefs = api.get_preferences()?;
    println!("{}", serde_json::to_string_pretty(&prefs)?);
    Ok(())
}

pub fn run_profile() -> Result<()> {
    let ctx = Context::load();
    let profile = ctx.api().get_profile()?;
    println!("{}", serde_json::to_string_pretty(&profile)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// healthsync serve
// ---------------------------------------------------------------------------

pub fn run_serve(addr: Option<String>) -> Result<()> {
    let cfg = config::load();
    let addr = addr.unwrap_or(cfg.server.addr.clone());
    let log = OperatorLog::from_config(&cfg.logging);

    let service = LocalService::bind(&addr, log)?;
    println!("healthsync service running at http://{}", service.local_addr()?);
    println!("Press Ctrl+C to stop.\n");
    service.run()
}

// ---------------------------------------------------------------------------
// healthsync config show | init | path
// ---------------------------------------------------------------------------

pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective healthsync Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");
    Ok(())
}

pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!("{} wrote {}", "✓".green().bold(), path.display());
    Ok(())
}

pub fn run_config_path() -> Result<()> {
    if let Some(path) = config::global_config_file() {
        println!("global:  {}", path.display());
    }
    if let Some(path) = config::project_config_file() {
        println!("project: {}", path.display());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

/// Truncate a string to `max_len` characters, appending "…" if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}
