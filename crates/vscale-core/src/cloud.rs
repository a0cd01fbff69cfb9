//! Cloud provider collaborator.

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::shutdown::ShutdownSignal;
use crate::types::{ActionStatus, AsyncAction, SizeInfo, SizeName};

/// The provider hosting the single managed instance.
///
/// Implementations may cache size metadata; callers re-validate a chosen
/// size against `available_sizes` before resizing.
#[async_trait]
pub trait CloudProvider: Send + Sync {
    /// Size the instance is currently running as.
    async fn current_size(&self) -> Result<SizeName, ProviderError>;

    /// Sizes the instance could be moved to, in no particular order.
    async fn available_sizes(&self) -> Result<Vec<SizeInfo>, ProviderError>;

    /// Stop the instance and return only once it is confirmed powered off.
    async fn stop_instance(&self, shutdown: &ShutdownSignal) -> Result<(), ProviderError>;

    /// Start a resize to `size`. The instance must already be off.
    async fn resize(&self, size: &SizeName) -> Result<AsyncAction, ProviderError>;

    /// Current status of a previously started action.
    async fn poll_action(&self, action: &AsyncAction) -> Result<ActionStatus, ProviderError>;

    /// Power the instance back on in whatever size it currently has.
    async fn power_on(&self) -> Result<(), ProviderError>;
}
