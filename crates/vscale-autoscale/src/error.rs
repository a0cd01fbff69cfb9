use std::time::Duration;

use thiserror::Error;

use vscale_core::{Cancelled, ConsoleError, ProviderError, SizeName};

/// Everything that can end a scaling cycle or attempt.
#[derive(Debug, Error)]
pub enum ScaleError {
    #[error("metric query {query:?} failed: {message}")]
    QueryFailed { query: String, message: String },

    #[error("metric query {query:?} returned a {kind} result, expected a vector")]
    UnexpectedResultShape { query: String, kind: &'static str },

    #[error("size {0} is not among the allowed sizes offered by the provider")]
    SizeNotFound(SizeName),

    #[error("no eligible size in direction {direction:+} from {current}")]
    CannotScale { current: SizeName, direction: i32 },

    #[error("scaling already in progress")]
    ScalingInProgress,

    #[error("last scale was too recent, {remaining:?} of cooldown left")]
    TooSoon { remaining: Duration },

    #[error("server still had {online} player(s) online after {timeout:?}")]
    DrainTimeout { timeout: Duration, online: u32 },

    #[error("list response does not match the expected format: {0:?}")]
    ProtocolMismatch(String),

    #[error("remote console: {0}")]
    Console(#[from] ConsoleError),

    #[error("cloud provider: {0}")]
    Provider(ProviderError),

    #[error("resize to {target} failed: {message}")]
    ResizeFailed { target: SizeName, message: String },

    #[error("resize to {target} still running after {polls} polls")]
    ResizeTimeout { target: SizeName, polls: u32 },

    #[error("{resize}; power-on recovery also failed: {recovery}")]
    RecoveryFailed {
        resize: Box<ScaleError>,
        recovery: ProviderError,
    },

    #[error("cancelled by shutdown")]
    Cancelled,
}

impl ScaleError {
    /// Expected outcomes that end a cycle without anything going wrong.
    pub fn is_informational(&self) -> bool {
        matches!(
            self,
            ScaleError::CannotScale { .. } | ScaleError::ScalingInProgress | ScaleError::TooSoon { .. }
        )
    }
}

impl From<Cancelled> for ScaleError {
    fn from(_: Cancelled) -> Self {
        ScaleError::Cancelled
    }
}

impl From<ProviderError> for ScaleError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Cancelled(_) => ScaleError::Cancelled,
            other => ScaleError::Provider(other),
        }
    }
}
