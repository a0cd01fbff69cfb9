//! Provider-side half of a scale: size lookup, resize and recovery.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use vscale_core::{ActionStatus, CloudProvider, ShutdownSignal, SizeName};

use crate::error::ScaleError;
use crate::ladder::SizeLadder;

#[derive(Debug, Clone)]
pub struct ResizeOptions {
    pub poll_interval: Duration,
    /// Polls of the resize action before giving up.
    pub max_polls: u32,
}

impl Default for ResizeOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            max_polls: 24,
        }
    }
}

pub struct ResizeCoordinator {
    provider: Arc<dyn CloudProvider>,
    allowed: Vec<SizeName>,
    opts: ResizeOptions,
}

impl ResizeCoordinator {
    pub fn new(provider: Arc<dyn CloudProvider>, allowed: Vec<SizeName>, opts: ResizeOptions) -> Self {
        Self {
            provider,
            allowed,
            opts,
        }
    }

    pub fn provider(&self) -> &Arc<dyn CloudProvider> {
        &self.provider
    }

    /// Current ladder position and the ladder itself.
    pub async fn current_and_available(&self) -> Result<(usize, SizeLadder), ScaleError> {
        let available = self.provider.available_sizes().await?;
        let ladder = SizeLadder::build(&available, &self.allowed);
        let current = self.provider.current_size().await?;
        debug!(%ladder, %current, "resolved size ladder");

        let index = ladder
            .index_of(&current)
            .ok_or(ScaleError::SizeNotFound(current))?;
        Ok((index, ladder))
    }

    /// Move the (stopped) instance to `target`.
    ///
    /// If anything goes wrong the instance is powered back on in its old
    /// size, exactly once. A failed power-on is reported alongside the
    /// resize error.
    pub async fn resize(&self, target: &SizeName, shutdown: &ShutdownSignal) -> Result<(), ScaleError> {
        let Err(err) = self.resize_and_wait(target, shutdown).await else {
            info!(%target, "server resized");
            return Ok(());
        };

        warn!(%target, error = %err, "resize failed, powering server back on");
        match self.provider.power_on().await {
            Ok(()) => Err(err),
            Err(recovery) => {
                error!(error = %recovery, "power-on after failed resize also failed");
                Err(ScaleError::RecoveryFailed {
                    resize: Box::new(err),
                    recovery,
                })
            }
        }
    }

    async fn resize_and_wait(&self, target: &SizeName, shutdown: &ShutdownSignal) -> Result<(), ScaleError> {
        // The size list may be cached by the provider; make sure the target
        // is still offered before committing.
        let available = self.provider.available_sizes().await?;
        if !available.iter().any(|s| &s.name == target) {
            return Err(ScaleError::SizeNotFound(target.clone()));
        }

        let action = self.provider.resize(target).await?;
        info!(%target, action = action.id, "resize issued");

        let mut status = action.status.clone();
        let mut polls = 0;
        loop {
            match status {
                ActionStatus::Success => return Ok(()),
                ActionStatus::Error(message) => {
                    return Err(ScaleError::ResizeFailed {
                        target: target.clone(),
                        message,
                    });
                }
                ActionStatus::Running if polls == self.opts.max_polls => {
                    return Err(ScaleError::ResizeTimeout {
                        target: target.clone(),
                        polls,
                    });
                }
                ActionStatus::Running => {}
            }

            shutdown.sleep(self.opts.poll_interval).await?;
            status = self.provider.poll_action(&action).await?;
            polls += 1;
            debug!(action = action.id, polls, ?status, "resize action status");
        }
    }
}
