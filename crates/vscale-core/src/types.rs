//! Shared types used across vscale crates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Provider-side identifier of an instance size (e.g. `cpx31`).
///
/// Opaque to everything but the provider adapter; only equality and
/// hashing matter to the autoscaler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SizeName(String);

impl SizeName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SizeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SizeName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SizeName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A size the managed instance could be moved to.
///
/// Providers only report sizes compatible with the instance (same CPU
/// architecture, priced in the instance's location).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeInfo {
    pub name: SizeName,
    /// Gross hourly price in the instance's location.
    pub hourly_cost: f64,
    pub architecture: String,
    pub location: String,
}

/// Status of a long-running provider-side operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionStatus {
    Running,
    Success,
    /// The action finished unsuccessfully; carries the provider's message.
    Error(String),
}

/// Handle to an asynchronous provider action. Polled, never pushed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsyncAction {
    pub id: u64,
    /// Status as of creation (or the last poll by whoever built this handle).
    pub status: ActionStatus,
}

impl AsyncAction {
    pub fn new(id: u64, status: ActionStatus) -> Self {
        Self { id, status }
    }
}
