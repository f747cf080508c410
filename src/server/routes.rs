//! Route handlers for the local service.
//!
//! Each handler returns a `Response<Cursor<Vec<u8>>>` with a JSON body.

use std::io::Cursor;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use serde_json::{Value, json};
use tiny_http::{Method, Response, StatusCode};

use super::content_type_json;
use super::store::{KvStore, user_key};
use crate::demo;
use crate::model::{DateRange, Goal};

/// Maximum activity records kept per user.
const ACTIVITY_LIMIT: usize = 1000;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn json_response<T: Serialize>(data: &T) -> Result<Response<Cursor<Vec<u8>>>> {
    json_with_status(data, 200)
}

fn json_with_status<T: Serialize>(data: &T, status: u16) -> Result<Response<Cursor<Vec<u8>>>> {
    let body = serde_json::to_string(data).context("failed to serialize JSON response")?;
    Ok(Response::from_data(body.into_bytes())
        .with_header(content_type_json())
        .with_status_code(StatusCode(status)))
}

pub(super) fn error_response(status: u16, message: &str) -> Response<Cursor<Vec<u8>>> {
    let body = json!({ "error": message }).to_string();
    Response::from_data(body.into_bytes())
        .with_header(content_type_json())
        .with_status_code(StatusCode(status))
}

fn parse_body(body: Option<&str>) -> Result<Value> {
    serde_json::from_str(body.unwrap_or("null")).context("request body is not valid JSON")
}

/// Read `?dateRange=...` from a URL.
fn parse_date_range(url: &str) -> DateRange {
    url.split('?')
        .nth(1)
        .and_then(|query| {
            query.split('&').find_map(|pair| {
                let (k, v) = pair.split_once('=')?;
                (k == "dateRange").then(|| v.to_string())
            })
        })
        .map(|raw| raw.parse::<DateRange>().unwrap_or_default())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Dispatch one request. `token` is the bearer credential, if any.
pub fn dispatch(
    store: &KvStore,
    method: &Method,
    url: &str,
    token: Option<&str>,
    body: Option<&str>,
) -> Result<Response<Cursor<Vec<u8>>>> {
    let path = url.split('?').next().unwrap_or(url);

    if (method, path) == (&Method::Get, "/health") {
        return json_response(&json!({ "status": "ok", "timestamp": Utc::now().to_rfc3339() }));
    }

    let Some(token) = token else {
        return Ok(error_response(401, "missing bearer token"));
    };

    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    match (method, segments.as_slice()) {
        (&Method::Get, ["health-metrics"]) => get_metrics(store, token, url),
        (&Method::Get, ["insights"]) => get_insights(store, token),
        (&Method::Post, ["log-activity"]) => post_activity(store, token, body),

        (&Method::Get, ["health-goals"]) => json_response(&load_goals(store, token)),
        (&Method::Post, ["health-goals"]) => post_goal(store, token, body),
        (&Method::Put, ["health-goals", id, "progress"]) => put_progress(store, token, id, body),
        (&Method::Delete, ["health-goals", id]) => delete_goal(store, token, id),

        (&Method::Get, ["preferences"]) => get_document(store, token, "preferences"),
        (&Method::Put, ["preferences"]) => put_document(store, token, "preferences", body),
        (&Method::Get, ["profile"]) => get_document(store, token, "profile"),
        (&Method::Put, ["profile"]) => put_document(store, token, "profile", body),

        _ => Ok(error_response(404, "not found")),
    }
}

// ---------------------------------------------------------------------------
// Dashboard data
// ---------------------------------------------------------------------------

/// `GET /health-metrics?dateRange=R`: stored dataset, or the seeded one.
fn get_metrics(store: &KvStore, token: &str, url: &str) -> Result<Response<Cursor<Vec<u8>>>> {
    let range = parse_date_range(url);
    if !range.is_recognized() {
        return Ok(error_response(400, &format!("unsupported dateRange: {range}")));
    }
    match store.get(&user_key(token, &format!("metrics:{range}"))) {
        Some(stored) => json_response(&stored),
        None => json_response(&demo::default_dataset()),
    }
}

/// `GET /insights`
fn get_insights(store: &KvStore, token: &str) -> Result<Response<Cursor<Vec<u8>>>> {
    match store.get(&user_key(token, "insights")) {
        Some(stored) => json_response(&stored),
        None => json_response(&demo::default_insights()),
    }
}

/// `POST /log-activity` with `{ "type", "data" }`.
fn post_activity(
    store: &KvStore,
    token: &str,
    body: Option<&str>,
) -> Result<Response<Cursor<Vec<u8>>>> {
    let body = parse_body(body)?;
    let Some(kind) = body.get("type").and_then(Value::as_str) else {
        return Ok(error_response(400, "activity type is required"));
    };

    let record = json!({
        "type": kind,
        "data": body.get("data").cloned().unwrap_or(Value::Null),
        "timestamp": Utc::now().to_rfc3339(),
    });
    store.append(&user_key(token, "activities"), record, ACTIVITY_LIMIT);
    json_response(&json!({ "success": true }))
}

// ---------------------------------------------------------------------------
// Goals
// ---------------------------------------------------------------------------

fn load_goals(store: &KvStore, token: &str) -> Vec<Goal> {
    store
        .get(&user_key(token, "goals"))
        .and_then(|value| serde_json::from_value(value).ok())
        .unwrap_or_default()
}

fn save_goals(store: &KvStore, token: &str, goals: &[Goal]) -> Result<()> {
    let value = serde_json::to_value(goals).context("failed to serialize goals")?;
    store.set(&user_key(token, "goals"), value);
    Ok(())
}

/// `POST /health-goals`: upsert by id.
fn post_goal(store: &KvStore, token: &str, body: Option<&str>) -> Result<Response<Cursor<Vec<u8>>>> {
    let Ok(goal) = serde_json::from_value::<Goal>(parse_body(body)?) else {
        return Ok(error_response(400, "invalid goal"));
    };

    let mut goals = load_goals(store, token);
    match goals.iter_mut().find(|g| g.id == goal.id) {
        Some(existing) => *existing = goal.clone(),
        None => goals.push(goal.clone()),
    }
    save_goals(store, token, &goals)?;
    json_with_status(&goal, 201)
}

/// `PUT /health-goals/{id}/progress` with `{ "currentValue" }`.
fn put_progress(
    store: &KvStore,
    token: &str,
    id: &str,
    body: Option<&str>,
) -> Result<Response<Cursor<Vec<u8>>>> {
    let Some(value) = parse_body(body)?.get("currentValue").and_then(Value::as_f64) else {
        return Ok(error_response(400, "currentValue is required"));
    };

    let mut goals = load_goals(store, token);
    let Some(goal) = goals.iter_mut().find(|g| g.id == id) else {
        return Ok(error_response(404, "goal not found"));
    };
    goal.apply_progress(value, Utc::now());
    let updated = goal.clone();

    save_goals(store, token, &goals)?;
    json_response(&updated)
}

/// `DELETE /health-goals/{id}`
fn delete_goal(store: &KvStore, token: &str, id: &str) -> Result<Response<Cursor<Vec<u8>>>> {
    let mut goals = load_goals(store, token);
    let before = goals.len();
    goals.retain(|g| g.id != id);
    if goals.len() == before {
        return Ok(error_response(404, "goal not found"));
    }
    save_goals(store, token, &goals)?;
    json_response(&json!({ "success": true }))
}

// ---------------------------------------------------------------------------
// Preferences / profile
// ---------------------------------------------------------------------------

fn get_document(store: &KvStore, token: &str, name: &str) -> Result<Response<Cursor<Vec<u8>>>> {
    json_response(&store.get(&user_key(token, name)).unwrap_or(Value::Null))
}

fn put_document(
    store: &KvStore,
    token: &str,
    name: &str,
    body: Option<&str>,
) -> Result<Response<Cursor<Vec<u8>>>> {
    let value = parse_body(body)?;
    if !value.is_object() {
        return Ok(error_response(400, &format!("{name} must be a JSON object")));
    }
    store.set(&user_key(token, name), value);
    json_response(&json!({ "success": true }))
}
