//! Error types shared by the collaborator traits.

use thiserror::Error;

/// A blocking operation observed the shutdown signal and gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled by shutdown")]
pub struct Cancelled;

/// Errors loading or validating the rules file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read rules file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse rules file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid size guard {guard:?}: {reason}")]
    InvalidGuard { guard: String, reason: String },

    #[error("invalid cron expression {expr:?}: {reason}")]
    InvalidCron { expr: String, reason: String },
}

/// Errors from the metrics backend.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("metrics transport error: {0}")]
    Transport(String),

    #[error("metrics api error ({error_type}): {message}")]
    Api { error_type: String, message: String },

    #[error("failed to decode metrics response: {0}")]
    Decode(String),

    #[error("expected vector result, got {0}")]
    UnexpectedResultShape(&'static str),
}

/// Errors from the remote command channel.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("failed to connect to remote console: {0}")]
    Connect(String),

    #[error("remote console authentication failed")]
    AuthFailed,

    #[error("remote console i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("remote console operation timed out")]
    Timeout,

    #[error("remote console protocol error: {0}")]
    Protocol(String),
}

/// Errors from the cloud provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider transport error: {0}")]
    Transport(String),

    #[error("provider api error ({code}): {message}")]
    Api { code: String, message: String },

    #[error("managed instance not found: {0}")]
    InstanceNotFound(String),

    #[error("unknown instance size: {0}")]
    UnknownSize(String),

    #[error("instance did not power off within {0:?}")]
    StopTimeout(std::time::Duration),

    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("provider action {id} failed: {message}")]
    ActionFailed { id: u64, message: String },

    #[error("provider action {id} did not complete in time")]
    ActionTimeout { id: u64 },

    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}
