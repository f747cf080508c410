//! Bounded request executor.
//!
//! Issues exactly one HTTP call per [`Executor::execute`] with a deadline
//! attached, and classifies the result into a [`RequestOutcome`]. The
//! reachability cache is consulted first; when it says the service is
//! down the call is short-circuited without any I/O.
//!
//! Uses the synchronous `ureq` client. The deadline is passed as the
//! request's overall timeout, so the call is abandoned when it elapses.

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::Credentials;
use super::health::HealthCheck;
use super::outcome::RequestOutcome;
use crate::config::HealthsyncConfig;
use crate::config::schema::TimeoutConfig;
use crate::oplog::OperatorLog;

// ---------------------------------------------------------------------------
// Request options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

/// Which default deadline applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Reads and foreground writes (10 s default).
    Data,
    /// Fire-and-forget telemetry writes (3 s default).
    Telemetry,
}

#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,
    pub kind: RequestKind,
    /// Overrides the kind's default deadline.
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self {
            method: Method::Get,
            body: None,
            kind: RequestKind::Data,
            timeout: None,
        }
    }

    pub fn post(body: Value) -> Self {
        Self {
            method: Method::Post,
            body: Some(body),
            ..Self::get()
        }
    }

    pub fn put(body: Value) -> Self {
        Self {
            method: Method::Put,
            body: Some(body),
            ..Self::get()
        }
    }

    pub fn delete() -> Self {
        Self {
            method: Method::Delete,
            ..Self::get()
        }
    }

    /// A telemetry write: `POST` with the short telemetry deadline.
    pub fn telemetry(body: Value) -> Self {
        Self {
            kind: RequestKind::Telemetry,
            ..Self::post(body)
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

// ---------------------------------------------------------------------------
// Executor
// ---------------------------------------------------------------------------

/// Single-attempt HTTP executor bound to one service.
#[derive(Debug)]
pub struct Executor {
    base_url: String,
    credentials: Credentials,
    health: Arc<HealthCheck>,
    data_timeout: Duration,
    telemetry_timeout: Duration,
    log: OperatorLog,
}

impl Executor {
    pub fn new(
        base_url: &str,
        credentials: Credentials,
        health: Arc<HealthCheck>,
        timeouts: &TimeoutConfig,
        log: OperatorLog,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            health,
            data_timeout: timeouts.data(),
            telemetry_timeout: timeouts.telemetry(),
            log,
        }
    }

    /// Build an executor and its reachability cache from the resolved config.
    pub fn from_config(config: &HealthsyncConfig, log: OperatorLog) -> Self {
        let service = &config.service;
        let health = Arc::new(HealthCheck::new(
            &service.base_url,
            &service.anon_key,
            &config.timeouts,
            log.clone(),
        ));
        Self::new(
            &service.base_url,
            Credentials::from_config(service),
            health,
            &config.timeouts,
            log,
        )
    }

    pub fn health(&self) -> &Arc<HealthCheck> {
        &self.health
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn log(&self) -> &OperatorLog {
        &self.log
    }

    /// Issue one request to `endpoint` (a path such as `/insights`) and
    /// classify the result.
    pub fn execute<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: &RequestOptions,
    ) -> RequestOutcome<T> {
        if !self.health.is_reachable() {
            self.log
                .warn(&format!("server not available, skipping request to {endpoint}"));
            return RequestOutcome::ServerUnavailable;
        }

        let timeout = options.timeout.unwrap_or(match options.kind {
            RequestKind::Data => self.data_timeout,
            RequestKind::Telemetry => self.telemetry_timeout,
        });

        let outcome = self.send(endpoint, options, timeout);

        if outcome.demotes_reachability() {
            self.health.invalidate();
        }
        if !outcome.is_success() {
            self.log.error(&format!(
                "{} {endpoint} failed: {outcome}",
                options.method.as_str()
            ));
        }

        outcome
    }

    fn send<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: &RequestOptions,
        timeout: Duration,
    ) -> RequestOutcome<T> {
        let url = format!("{}{}", self.base_url, endpoint);
        let request = ureq::request(options.method.as_str(), &url)
            .timeout(timeout)
            .set("Content-Type", "application/json")
            .set(
                "Authorization",
                &format!("Bearer {}", self.credentials.bearer()),
            );

        let started = Instant::now();
        let result = match &options.body {
            Some(body) => request.send_string(&body.to_string()),
            None => request.call(),
        };

        match result {
            Ok(resp) => decode_body(resp, started, timeout),
            Err(ureq::Error::Status(status, resp)) => {
                let detail = resp.into_string().unwrap_or_default();
                if !detail.is_empty() {
                    self.log
                        .error(&format!("{endpoint} returned {status}: {}", truncate(&detail)));
                }
                if status >= 500 {
                    RequestOutcome::ServerError(status)
                } else {
                    RequestOutcome::ClientError(status)
                }
            }
            Err(ureq::Error::Transport(transport)) => {
                let io_kind = std::error::Error::source(&transport)
                    .and_then(|source| source.downcast_ref::<io::Error>())
                    .map(io::Error::kind);
                if is_timeout(io_kind, started.elapsed(), timeout) {
                    RequestOutcome::Timeout
                } else {
                    RequestOutcome::NetworkError(transport.to_string())
                }
            }
        }
    }
}

/// Decode a 2xx body. An empty body decodes as JSON `null`.
fn decode_body<T: DeserializeOwned>(
    resp: ureq::Response,
    started: Instant,
    timeout: Duration,
) -> RequestOutcome<T> {
    let text = match resp.into_string() {
        Ok(text) => text,
        Err(error) => {
            return if is_timeout(Some(error.kind()), started.elapsed(), timeout) {
                RequestOutcome::Timeout
            } else {
                RequestOutcome::NetworkError(error.to_string())
            };
        }
    };

    let text = if text.trim().is_empty() { "null" } else { text.as_str() };
    match serde_json::from_str(text) {
        Ok(value) => RequestOutcome::Success(value),
        Err(error) => RequestOutcome::InvalidPayload(error.to_string()),
    }
}

/// A transport failure counts as a timeout when the socket reported one or
/// the deadline has already passed.
fn is_timeout(io_kind: Option<io::ErrorKind>, elapsed: Duration, deadline: Duration) -> bool {
    elapsed >= deadline
        || matches!(
            io_kind,
            Some(io::ErrorKind::TimedOut) | Some(io::ErrorKind::WouldBlock)
        )
}

fn truncate(text: &str) -> String {
    let text = text.replace(['\r', '\n'], " ");
    match text.char_indices().nth(200) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text,
    }
}
