/// Dashboard orchestrator tests.
///
/// Exercises demo-first display, partial live upgrades, the shared refresh
/// deadline, and the epoch guard against a scripted local service.
mod common;

use std::time::Duration;

use common::{DEAD_URL, ScriptedService, executor, fast_timeouts};
use healthsync::dashboard::{Dashboard, DashboardData, DataSource, Phase, SliceReport};
use healthsync::demo;
use healthsync::model::DateRange;

fn steps_payload(steps: u32) -> String {
    format!(r#"{{"stepData":[{{"date":"2024-01-01","steps":{steps},"goal":10000}}]}}"#)
}

const INSIGHTS: &str =
    r#"[{"type":"pattern","title":"Live insight","description":"from the service","priority":"low"}]"#;

#[test]
fn demo_is_displayed_before_mount_returns() {
    let service = ScriptedService::start();
    service.reply_after(
        "/health-metrics",
        200,
        &steps_payload(1),
        Duration::from_millis(500),
    );
    service.reply_after("/insights", 200, INSIGHTS, Duration::from_millis(500));
    let dashboard = Dashboard::new(executor(service.url(), &fast_timeouts()), Duration::from_secs(2));

    let handle = dashboard.mount(DateRange::Last7Days);
    let state = dashboard.snapshot();

    assert_eq!(state.phase, Phase::DemoDisplayed);
    assert_eq!(state.source(), DataSource::Demo);
    assert_eq!(state.data, DashboardData::demo());
    assert!(!state.loading);

    handle.wait();
    assert_eq!(dashboard.snapshot().source(), DataSource::Live);
}

#[test]
fn full_success_goes_live() {
    let service = ScriptedService::start();
    service.reply("/health-metrics", 200, &steps_payload(4321));
    service.reply("/insights", 200, INSIGHTS);
    let dashboard = Dashboard::new(executor(service.url(), &fast_timeouts()), Duration::from_secs(2));

    let report = dashboard.mount(DateRange::Last30Days).wait();
    assert_eq!(report.metrics, SliceReport::Applied);
    assert_eq!(report.insights, SliceReport::Applied);
    assert!(!report.deadline_elapsed);

    let state = dashboard.snapshot();
    assert!(state.is_fully_live());
    assert_eq!(state.phase, Phase::LiveDisplayed);
    assert_eq!(state.data.metrics.step_data[0].steps, 4321);
    assert_eq!(state.data.insights[0].title, "Live insight");
}

#[test]
fn failures_leave_demo_untouched() {
    let service = ScriptedService::start();
    service.reply("/health-metrics", 500, r#"{"error":"boom"}"#);
    service.reply("/insights", 503, r#"{"error":"busy"}"#);
    let dashboard = Dashboard::new(executor(service.url(), &fast_timeouts()), Duration::from_secs(2));

    let report = dashboard.mount(DateRange::Last7Days).wait();
    assert!(!report.any_applied());

    let state = dashboard.snapshot();
    assert_eq!(state.phase, Phase::DemoDisplayed);
    assert_eq!(state.source(), DataSource::Demo);
    assert_eq!(state.data, DashboardData::demo());
}

#[test]
fn offline_service_keeps_demo() {
    let dashboard = Dashboard::new(executor(DEAD_URL, &fast_timeouts()), Duration::from_secs(2));
    let report = dashboard.mount(DateRange::Last90Days).wait();

    assert!(matches!(report.metrics, SliceReport::Failed(_)));
    assert!(matches!(report.insights, SliceReport::Failed(_)));
    assert_eq!(dashboard.snapshot().data.metrics, demo::default_dataset());
}

#[test]
fn metrics_success_with_insights_timeout_is_partially_live() {
    let service = ScriptedService::start();
    service.reply("/health-metrics", 200, &steps_payload(777));
    service.reply_after("/insights", 200, INSIGHTS, Duration::from_millis(1_500));
    let timeouts = fast_timeouts();
    let dashboard = Dashboard::new(executor(service.url(), &timeouts), Duration::from_secs(3));

    let report = dashboard.mount(DateRange::Last7Days).wait();
    assert_eq!(report.metrics, SliceReport::Applied);
    assert_eq!(report.insights, SliceReport::Failed("timeout".to_string()));

    let state = dashboard.snapshot();
    assert_eq!(state.source(), DataSource::Live);
    assert!(!state.is_fully_live());
    assert_eq!(state.metrics_source, DataSource::Live);
    assert_eq!(state.insights_source, DataSource::Demo);
    assert_eq!(state.data.metrics.step_data[0].steps, 777);
    assert_eq!(state.data.insights, demo::default_insights());
}

#[test]
fn outer_deadline_abandons_slow_calls() {
    let service = ScriptedService::start();
    service.reply_after(
        "/health-metrics",
        200,
        &steps_payload(1),
        Duration::from_millis(1_500),
    );
    service.reply_after("/insights", 200, INSIGHTS, Duration::from_millis(1_500));
    let mut timeouts = fast_timeouts();
    timeouts.data_ms = 5_000;
    let dashboard = Dashboard::new(executor(service.url(), &timeouts), Duration::from_millis(300));

    let report = dashboard.mount(DateRange::Last7Days).wait();
    assert!(report.deadline_elapsed);
    assert_eq!(report.metrics, SliceReport::Abandoned);
    assert_eq!(report.insights, SliceReport::Abandoned);

    // Late responses are dropped; nothing changes after the deadline.
    std::thread::sleep(Duration::from_millis(1_500));
    let state = dashboard.snapshot();
    assert_eq!(state.source(), DataSource::Demo);
    assert_eq!(state.data, DashboardData::demo());
}

#[test]
fn range_switch_discards_superseded_results() {
    let service = ScriptedService::start();
    service.reply_after(
        "/health-metrics?dateRange=7days",
        200,
        &steps_payload(7),
        Duration::from_millis(800),
    );
    service.reply("/health-metrics?dateRange=30days", 200, &steps_payload(30));
    service.reply("/insights", 200, INSIGHTS);
    let dashboard = Dashboard::new(executor(service.url(), &fast_timeouts()), Duration::from_secs(3));

    let first = dashboard.mount(DateRange::Last7Days);
    let second = dashboard.set_date_range(DateRange::Last30Days);

    let second_report = second.wait();
    let first_report = first.wait();

    assert_eq!(second_report.metrics, SliceReport::Applied);
    assert_eq!(first_report.metrics, SliceReport::Stale);

    let state = dashboard.snapshot();
    assert_eq!(state.epoch, second_report.epoch);
    assert_eq!(state.date_range, DateRange::Last30Days);
    assert_eq!(state.data.metrics.step_data[0].steps, 30);
}

#[test]
fn date_range_is_sent_as_query() {
    let service = ScriptedService::start();
    service.reply("/health-metrics?dateRange=24hours", 200, &steps_payload(24));
    service.reply("/insights", 200, "[]");
    let dashboard = Dashboard::new(executor(service.url(), &fast_timeouts()), Duration::from_secs(2));

    dashboard.mount(DateRange::Last24Hours).wait();
    assert_eq!(dashboard.snapshot().data.metrics.step_data[0].steps, 24);
    assert_eq!(service.hits("/health-metrics"), 1);
}

#[test]
fn superseded_failure_is_reported_as_failure() {
    let service = ScriptedService::start();
    service.reply_after(
        "/health-metrics?dateRange=7days",
        500,
        r#"{"error":"boom"}"#,
        Duration::from_millis(600),
    );
    service.reply("/health-metrics?dateRange=90days", 200, &steps_payload(90));
    service.reply("/insights", 200, INSIGHTS);
    let dashboard = Dashboard::new(executor(service.url(), &fast_timeouts()), Duration::from_secs(3));

    let first = dashboard.mount(DateRange::Last7Days);
    let second = dashboard.set_date_range(DateRange::Last90Days);

    assert_eq!(second.wait().metrics, SliceReport::Applied);
    assert_eq!(
        first.wait().metrics,
        SliceReport::Failed("server error 500".to_string())
    );
    assert_eq!(dashboard.snapshot().data.metrics.step_data[0].steps, 90);
}
