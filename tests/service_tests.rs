/// End-to-end tests against the bundled local service.
///
/// Starts `LocalService` on an ephemeral port and drives it through the
/// same client stack the CLI uses.
mod common;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use common::{executor, fast_timeouts, scratch_file};
use healthsync::activity::{ActivitySink, PendingStore};
use healthsync::api::{Api, NewGoal};
use healthsync::dashboard::{Dashboard, DataSource};
use healthsync::model::{DateRange, GoalStatus, Priority};
use healthsync::oplog::OperatorLog;
use healthsync::server::LocalService;
use serde_json::json;

fn start_service() -> String {
    let service = LocalService::bind("127.0.0.1:0", OperatorLog::disabled()).unwrap();
    let addr = service.local_addr().unwrap();
    thread::spawn(move || service.run());
    format!("http://{addr}")
}

fn api(url: &str, pending_name: &str) -> (Api, Arc<PendingStore>) {
    let exec = executor(url, &fast_timeouts());
    let store = Arc::new(PendingStore::new(scratch_file(pending_name), 50));
    let sink = ActivitySink::new(Arc::clone(&exec), Arc::clone(&store));
    (Api::new(exec, Some(sink)), store)
}

#[test]
fn goal_lifecycle() {
    let url = start_service();
    let (api, pending) = api(&url, "goals.json");

    assert!(api.list_goals().unwrap().is_empty());

    let goal = NewGoal {
        title: "Daily walk".to_string(),
        category: "fitness".to_string(),
        target_value: 100.0,
        unit: "minutes".to_string(),
        priority: Priority::High,
        ..NewGoal::default()
    }
    .into_goal();
    api.save_goal(&goal, true).unwrap();

    let listed = api.list_goals().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].title, "Daily walk");

    let mut stored = api.find_goal(&goal.id).unwrap();
    assert!(!api.update_progress(&mut stored, 40.0).unwrap());
    assert!(api.update_progress(&mut stored, 100.0).unwrap());
    assert_eq!(stored.status, GoalStatus::Completed);
    assert_eq!(api.find_goal(&goal.id).unwrap().status, GoalStatus::Completed);

    api.delete_goal(&goal.id).unwrap();
    assert!(api.list_goals().unwrap().is_empty());
    assert!(api.delete_goal(&goal.id).is_err());

    // Every activity event reached the service.
    assert!(pending.is_empty());
}

#[test]
fn preferences_round_trip() {
    let url = start_service();
    let (api, _) = api(&url, "prefs.json");

    let prefs = json!({ "notifications": { "email": false }, "units": "metric" });
    api.put_preferences(&prefs).unwrap();
    assert_eq!(api.get_preferences().unwrap(), prefs);

    assert!(api.put_preferences(&json!([1, 2])).is_err());
}

#[test]
fn missing_profile_reads_as_default() {
    let url = start_service();
    let (api, _) = api(&url, "profile.json");

    let profile = api.get_profile().unwrap();
    assert!(profile.full_name.is_empty());

    let mut updated = profile.clone();
    updated.full_name = "Sam Doe".to_string();
    api.put_profile(&updated).unwrap();
    assert_eq!(api.get_profile().unwrap().full_name, "Sam Doe");
}

#[test]
fn dashboard_goes_live_against_local_service() {
    let url = start_service();
    let dashboard = Dashboard::new(executor(&url, &fast_timeouts()), Duration::from_secs(3));

    let report = dashboard.mount(DateRange::Last7Days).wait();
    assert!(report.any_applied());
    assert_eq!(dashboard.snapshot().source(), DataSource::Live);
}

#[test]
fn unknown_range_is_rejected_and_demo_kept() {
    let url = start_service();
    let dashboard = Dashboard::new(executor(&url, &fast_timeouts()), Duration::from_secs(3));

    let report = dashboard.mount("1year".parse().unwrap()).wait();
    let state = dashboard.snapshot();
    assert_eq!(state.metrics_source, DataSource::Demo);
    assert_eq!(
        report.metrics,
        healthsync::dashboard::SliceReport::Failed("client error 400".to_string())
    );
}
