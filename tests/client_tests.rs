/// Executor and reachability cache tests.
///
/// Runs the executor against a scripted local HTTP service to check how
/// each kind of failure is classified and when the cache re-probes.
mod common;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use common::{DEAD_URL, ScriptedService, executor, executor_split, fast_timeouts};
use healthsync::client::{RequestOptions, RequestOutcome};
use serde_json::{Value, json};

// ---------------------------------------------------------------------------
// Reachability cache
// ---------------------------------------------------------------------------

#[test]
fn at_most_one_probe_within_interval() {
    let service = ScriptedService::start();
    service.reply("/insights", 200, "[]");
    let exec = executor(service.url(), &fast_timeouts());

    for _ in 0..5 {
        let outcome: RequestOutcome<Value> = exec.execute("/insights", &RequestOptions::get());
        assert!(outcome.is_success());
    }

    assert_eq!(service.hits("/health"), 1);
    assert_eq!(service.hits("/insights"), 5);
}

#[test]
fn concurrent_checks_share_one_probe() {
    let service = ScriptedService::start();
    service.reply_after("/health", 200, r#"{"status":"ok"}"#, Duration::from_millis(300));
    let exec = executor(service.url(), &fast_timeouts());

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let health = Arc::clone(exec.health());
            thread::spawn(move || health.is_reachable())
        })
        .collect();
    for worker in workers {
        assert!(worker.join().unwrap());
    }

    assert_eq!(service.hits("/health"), 1);
}

#[test]
fn server_error_forces_reprobe() {
    let service = ScriptedService::start();
    service.reply("/insights", 500, r#"{"error":"boom"}"#);
    let exec = executor(service.url(), &fast_timeouts());

    let first: RequestOutcome<Value> = exec.execute("/insights", &RequestOptions::get());
    assert_eq!(first, RequestOutcome::ServerError(500));
    assert_eq!(exec.health().snapshot().last_checked, None);

    let _: RequestOutcome<Value> = exec.execute("/insights", &RequestOptions::get());
    assert_eq!(service.hits("/health"), 2);
}

#[test]
fn client_error_keeps_cache() {
    let service = ScriptedService::start();
    service.reply("/profile", 404, r#"{"error":"nope"}"#);
    let exec = executor(service.url(), &fast_timeouts());

    let outcome: RequestOutcome<Value> = exec.execute("/profile", &RequestOptions::get());
    assert_eq!(outcome, RequestOutcome::ClientError(404));

    let state = exec.health().snapshot();
    assert!(state.reachable);
    assert!(state.last_checked.is_some());

    let _: RequestOutcome<Value> = exec.execute("/profile", &RequestOptions::get());
    assert_eq!(service.hits("/health"), 1);
}

#[test]
fn unauthorized_is_client_error() {
    let service = ScriptedService::start();
    service.reply("/preferences", 401, r#"{"error":"missing bearer token"}"#);
    let exec = executor(service.url(), &fast_timeouts());

    let outcome: RequestOutcome<Value> = exec.execute("/preferences", &RequestOptions::get());
    assert_eq!(outcome, RequestOutcome::ClientError(401));
    let err = outcome.into_result("/preferences").unwrap_err();
    assert_eq!(err.to_string(), "not authorized: /preferences");
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[test]
fn slow_response_is_timeout() {
    let service = ScriptedService::start();
    service.reply_after("/insights", 200, "[]", Duration::from_millis(800));
    let exec = executor(service.url(), &fast_timeouts());

    let options = RequestOptions::get().with_timeout(Duration::from_millis(150));
    let outcome: RequestOutcome<Value> = exec.execute("/insights", &options);

    assert_eq!(outcome, RequestOutcome::Timeout);
    assert!(!exec.health().snapshot().reachable);
}

#[test]
fn refused_connection_is_network_error() {
    let service = ScriptedService::start();
    // Probe succeeds against the live service, data goes to a dead port.
    let exec = executor_split(service.url(), DEAD_URL, &fast_timeouts());

    let outcome: RequestOutcome<Value> = exec.execute("/insights", &RequestOptions::get());
    assert!(matches!(outcome, RequestOutcome::NetworkError(_)), "{outcome:?}");
    assert_eq!(exec.health().snapshot().last_checked, None);
}

#[test]
fn undecodable_body_is_invalid_payload() {
    let service = ScriptedService::start();
    service.reply("/insights", 200, "<html>oops</html>");
    let exec = executor(service.url(), &fast_timeouts());

    let outcome: RequestOutcome<Vec<Value>> = exec.execute("/insights", &RequestOptions::get());
    assert!(matches!(outcome, RequestOutcome::InvalidPayload(_)));
    assert!(exec.health().snapshot().reachable);
}

#[test]
fn empty_body_decodes_as_null() {
    let service = ScriptedService::start();
    service.reply("/profile", 200, "");
    let exec = executor(service.url(), &fast_timeouts());

    let outcome: RequestOutcome<Option<Value>> = exec.execute("/profile", &RequestOptions::get());
    assert_eq!(outcome, RequestOutcome::Success(None));
}

#[test]
fn bodies_are_sent_as_json() {
    let service = ScriptedService::start();
    service.reply("/preferences", 200, r#"{"success":true}"#);
    let exec = executor(service.url(), &fast_timeouts());

    let prefs = json!({ "notifications": { "email": true } });
    let outcome: RequestOutcome<Value> =
        exec.execute("/preferences", &RequestOptions::put(prefs.clone()));
    assert!(outcome.is_success());

    let sent: Value = serde_json::from_str(&service.bodies("/preferences")[0]).unwrap();
    assert_eq!(sent, prefs);
}

// ---------------------------------------------------------------------------
// Short-circuit
// ---------------------------------------------------------------------------

#[test]
fn unreachable_service_sends_no_data_request() {
    let service = ScriptedService::start();
    service.reply("/health", 503, r#"{"status":"down"}"#);
    service.reply("/insights", 200, "[]");
    let exec = executor(service.url(), &fast_timeouts());

    for _ in 0..3 {
        let outcome: RequestOutcome<Value> = exec.execute("/insights", &RequestOptions::get());
        assert_eq!(outcome, RequestOutcome::ServerUnavailable);
    }

    assert_eq!(service.hits("/health"), 1);
    assert_eq!(service.hits("/insights"), 0);
}

#[test]
fn dead_service_short_circuits() {
    let exec = executor(DEAD_URL, &fast_timeouts());
    let outcome: RequestOutcome<Value> = exec.execute("/insights", &RequestOptions::get());
    assert_eq!(outcome, RequestOutcome::ServerUnavailable);
    assert!(
        outcome
            .into_result("/insights")
            .unwrap_err()
            .to_string()
            .contains("server not available")
    );
}
