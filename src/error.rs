use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// A labeled failure from one retrieval method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodFailure {
    pub method: String,
    pub message: String,
}

impl fmt::Display for MethodFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.method, self.message)
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {message}")]
    Network { message: String },

    #[error("parse error: {message}")]
    Parse { message: String },

    #[error("upstream rejected request to {url} with status {status}")]
    UpstreamRejected { url: String, status: u16 },

    #[error("no retrieval method succeeded for @{account}: {}", join_failures(.failures))]
    NoMethodSucceeded {
        account: String,
        failures: Vec<MethodFailure>,
    },

    #[error("image host rejected upload: {message}")]
    UploadRejected { message: String },

    #[error("invalid account id '{input}': {reason}")]
    InvalidAccount { input: String, reason: String },

    #[error("invalid image URL '{input}': {reason}")]
    InvalidUrl { input: String, reason: String },

    #[error("storage error at {}: {source}", .path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Whether the resolver should record this error and move on to the next method.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::Parse { .. } | Self::UpstreamRejected { .. }
        )
    }

    /// Whether this error was caused by bad caller input rather than upstream trouble.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidAccount { .. } | Self::InvalidUrl { .. })
    }
}

/// Request URL without query and fragment, which may carry credentials.
fn redacted_url(url: &reqwest::Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.to_string()
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::UpstreamRejected {
                url: err.url().map(redacted_url).unwrap_or_default(),
                status: status.as_u16(),
            };
        }
        // The error text embeds the full request URL; keep it out of messages.
        let err = err.without_url();
        if err.is_decode() {
            return Self::Parse {
                message: err.to_string(),
            };
        }
        let message = if err.is_timeout() {
            format!("request timed out: {err}")
        } else {
            err.to_string()
        };
        Self::Network { message }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse {
            message: err.to_string(),
        }
    }
}

fn join_failures(failures: &[MethodFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
