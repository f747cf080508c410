//! Resilient client for the health service.
//!
//! - [`health`]: time-boxed reachability cache (the circuit breaker)
//! - [`executor`]: single-attempt, deadline-bounded HTTP calls
//! - [`outcome`]: the tagged result every call produces
//!
//! Data flows one way: callers hand an endpoint to the [`Executor`], which
//! asks the [`HealthCheck`] whether to try at all, sends the request, and
//! returns a [`RequestOutcome`]. Failures that suggest the service is down
//! invalidate the cache so the next caller re-probes.

pub mod executor;
pub mod health;
pub mod outcome;

pub use executor::{Executor, Method, RequestKind, RequestOptions};
pub use health::{HealthCheck, ReachabilityState};
pub use outcome::RequestOutcome;

use crate::config::schema::ServiceConfig;

/// Bearer credential source: the session token when signed in, the
/// public anonymous key otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    anon_key: String,
    access_token: Option<String>,
}

impl Credentials {
    pub fn anonymous(anon_key: impl Into<String>) -> Self {
        Self {
            anon_key: anon_key.into(),
            access_token: None,
        }
    }

    pub fn with_session(anon_key: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            anon_key: anon_key.into(),
            access_token: Some(access_token.into()),
        }
    }

    pub fn from_config(service: &ServiceConfig) -> Self {
        if service.access_token.is_empty() {
            Self::anonymous(&service.anon_key)
        } else {
            Self::with_session(&service.anon_key, &service.access_token)
        }
    }

    /// The token to send as `Authorization: Bearer <token>`.
    pub fn bearer(&self) -> &str {
        self.access_token.as_deref().unwrap_or(&self.anon_key)
    }

    pub fn has_session(&self) -> bool {
        self.access_token.is_some()
    }
}
