//! Classification of a single request attempt.

use std::fmt;

/// Result of one [`Executor::execute`](super::executor::Executor::execute)
/// call. Every failure is a variant; nothing escapes as a panic or `Err`.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome<T> {
    /// 2xx with a body that decoded into `T`.
    Success(T),
    /// The per-request deadline elapsed before a response arrived.
    Timeout,
    /// Connection refused, DNS failure, reset, ...
    NetworkError(String),
    /// Status ≥ 500.
    ServerError(u16),
    /// Any other non-2xx status.
    ClientError(u16),
    /// Short-circuited by the reachability cache; no request was sent.
    ServerUnavailable,
    /// 2xx whose body did not decode into `T`.
    InvalidPayload(String),
}

impl<T> RequestOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Whether this failure should make the reachability cache re-probe.
    pub fn demotes_reachability(&self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::NetworkError(_) | Self::ServerError(_)
        )
    }

    pub fn success(self) -> Option<T> {
        match self {
            Self::Success(value) => Some(value),
            _ => None,
        }
    }

    /// Short label for reports and logs (`"success"`, `"timeout"`, ...).
    pub fn label(&self) -> String {
        match self {
            Self::Success(_) => "success".to_string(),
            Self::Timeout => "timeout".to_string(),
            Self::NetworkError(_) => "network error".to_string(),
            Self::ServerError(status) => format!("server error {status}"),
            Self::ClientError(status) => format!("client error {status}"),
            Self::ServerUnavailable => "server unavailable".to_string(),
            Self::InvalidPayload(_) => "invalid payload".to_string(),
        }
    }

    /// Convert into a `Result` carrying a short human-readable message.
    ///
    /// Foreground operations use this to surface an inline error.
    pub fn into_result(self, endpoint: &str) -> anyhow::Result<T> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Timeout => anyhow::bail!("request timed out: {endpoint}"),
            Self::NetworkError(detail) => anyhow::bail!("network error: {endpoint} ({detail})"),
            Self::ServerError(status) => anyhow::bail!("server error {status}: {endpoint}"),
            Self::ClientError(401) | Self::ClientError(403) => {
                anyhow::bail!("not authorized: {endpoint}")
            }
            Self::ClientError(status) => anyhow::bail!("request rejected ({status}): {endpoint}"),
            Self::ServerUnavailable => anyhow::bail!("server not available: {endpoint}"),
            Self::InvalidPayload(detail) => {
                anyhow::bail!("unexpected response from {endpoint}: {detail}")
            }
        }
    }
}

impl<T> fmt::Display for RequestOutcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NetworkError(detail) | Self::InvalidPayload(detail) => {
                write!(f, "{} ({detail})", self.label())
            }
            _ => f.write_str(&self.label()),
        }
    }
}
