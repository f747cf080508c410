//! Shared fixtures for integration tests.
//!
//! `ScriptedService` is an in-process `tiny_http` server that answers each
//! path with a canned status, body, and optional delay, and counts hits per
//! path. Each request is answered on its own thread so a slow route never
//! blocks a fast one.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Read;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use healthsync::client::{Credentials, Executor, HealthCheck};
use healthsync::config::schema::TimeoutConfig;
use healthsync::oplog::OperatorLog;
use tiny_http::{Header, Response, Server, StatusCode};

/// An address nothing listens on; connections are refused immediately.
pub const DEAD_URL: &str = "http://127.0.0.1:1";

#[derive(Debug, Clone)]
struct Reply {
    status: u16,
    body: String,
    delay: Duration,
}

#[derive(Default)]
struct Script {
    replies: HashMap<String, Reply>,
    hits: HashMap<String, usize>,
    bodies: HashMap<String, Vec<String>>,
}

pub struct ScriptedService {
    server: Arc<Server>,
    url: String,
    script: Arc<Mutex<Script>>,
}

impl ScriptedService {
    /// Bind to an ephemeral port. `/health` answers 200 until overridden.
    pub fn start() -> Self {
        let server = Arc::new(Server::http("127.0.0.1:0").unwrap());
        let addr = server.server_addr().to_ip().unwrap();
        let script = Arc::new(Mutex::new(Script::default()));

        let service = Self {
            server: Arc::clone(&server),
            url: format!("http://{addr}"),
            script: Arc::clone(&script),
        };
        service.reply("/health", 200, r#"{"status":"ok"}"#);

        thread::spawn(move || {
            for mut request in server.incoming_requests() {
                let url = request.url().to_string();
                let path = url.split('?').next().unwrap_or(&url).to_string();

                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);

                let reply = {
                    let mut script = script.lock().unwrap();
                    *script.hits.entry(path.clone()).or_default() += 1;
                    script.bodies.entry(path.clone()).or_default().push(body);
                    script
                        .replies
                        .get(&url)
                        .or_else(|| script.replies.get(&path))
                        .cloned()
                };

                thread::spawn(move || {
                    let reply = reply.unwrap_or(Reply {
                        status: 404,
                        body: r#"{"error":"not found"}"#.to_string(),
                        delay: Duration::ZERO,
                    });
                    thread::sleep(reply.delay);
                    let header =
                        Header::from_bytes("Content-Type", "application/json").unwrap();
                    let response = Response::from_string(reply.body)
                        .with_header(header)
                        .with_status_code(StatusCode(reply.status));
                    let _ = request.respond(response);
                });
            }
        });

        service
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Answer `route` (a path, or a path with its exact query) immediately.
    pub fn reply(&self, route: &str, status: u16, body: &str) {
        self.reply_after(route, status, body, Duration::ZERO);
    }

    pub fn reply_after(&self, route: &str, status: u16, body: &str, delay: Duration) {
        self.script.lock().unwrap().replies.insert(
            route.to_string(),
            Reply {
                status,
                body: body.to_string(),
                delay,
            },
        );
    }

    /// Requests received for `path`, ignoring the query string.
    pub fn hits(&self, path: &str) -> usize {
        self.script.lock().unwrap().hits.get(path).copied().unwrap_or(0)
    }

    pub fn bodies(&self, path: &str) -> Vec<String> {
        self.script
            .lock()
            .unwrap()
            .bodies
            .get(path)
            .cloned()
            .unwrap_or_default()
    }
}

impl Drop for ScriptedService {
    fn drop(&mut self) {
        self.server.unblock();
    }
}

/// Timeouts short enough for tests.
pub fn fast_timeouts() -> TimeoutConfig {
    TimeoutConfig {
        health_check_interval_ms: 30_000,
        probe_ms: 1_000,
        data_ms: 1_000,
        telemetry_ms: 500,
        refresh_deadline_ms: 2_000,
    }
}

/// Executor whose data calls and reachability probe both target `base_url`.
pub fn executor(base_url: &str, timeouts: &TimeoutConfig) -> Arc<Executor> {
    executor_split(base_url, base_url, timeouts)
}

/// Executor probing `health_url` but sending data calls to `data_url`.
pub fn executor_split(health_url: &str, data_url: &str, timeouts: &TimeoutConfig) -> Arc<Executor> {
    let health = Arc::new(HealthCheck::new(
        health_url,
        "anon",
        timeouts,
        OperatorLog::disabled(),
    ));
    Arc::new(Executor::new(
        data_url,
        Credentials::with_session("anon", "test-token"),
        health,
        timeouts,
        OperatorLog::disabled(),
    ))
}

static SCRATCH: AtomicUsize = AtomicUsize::new(0);

/// A fresh, not-yet-existing file path under the system temp dir.
pub fn scratch_file(name: &str) -> PathBuf {
    let n = SCRATCH.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!("healthsync-tests-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(format!("{n}-{name}"));
    let _ = std::fs::remove_file(&path);
    path
}
