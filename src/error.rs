//! Failure taxonomy for upstream fetches and gateway configuration
//!
//! A `FetchFailure` is what the fetch path raises: the upstream could not be
//! reached, it answered with a non-success status, or a required credential was
//! missing before any request was attempted. Failures are never cached.

use bytes::Bytes;
use thiserror::Error;

/// The broad category of a [`FetchFailure`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    TransportError,
    UpstreamError,
    ConfigurationError,
}

/// Errors raised while fetching from an upstream feed
#[derive(Debug, Clone, Error)]
pub enum FetchFailure {
    /// DNS, connection, or transport-level timeout failure
    #[error("{message}")]
    Transport { message: String },

    /// The upstream answered with a non-2xx status; `body` is kept verbatim
    #[error("upstream responded with status {status}")]
    Upstream { status: u16, body: Bytes },

    /// A required setting was absent, detected before any network call
    #[error("{message}")]
    Configuration { message: String },
}

impl FetchFailure {
    /// Creates a transport failure from any displayable cause
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a configuration failure
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transport { .. } => FailureKind::TransportError,
            Self::Upstream { .. } => FailureKind::UpstreamError,
            Self::Configuration { .. } => FailureKind::ConfigurationError,
        }
    }

    /// Status code reported by the upstream, only for `Upstream` failures
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchFailure {
    fn from(err: reqwest::Error) -> Self {
        // Strip the URL: it may carry a credential in its query string
        Self::transport(err.without_url().to_string())
    }
}

/// Errors that can occur while loading gateway configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A setting was present but could not be parsed
    #[error("Invalid value for {name}: '{value}'")]
    InvalidValue { name: &'static str, value: String },
}
