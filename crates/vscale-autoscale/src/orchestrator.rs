//! The scaling state machine.
//!
//! ```text
//! Idle ─try_lock─► Locked ─► Draining ─► ProviderStopping ─► Resizing ─► Idle
//!   ▲                 │          │               │                │
//!   └─────────────────┴──────────┴───── error ───┴────────────────┘
//! ```
//!
//! At most one execution runs at a time; a concurrent attempt fails fast
//! with `ScalingInProgress`. `last_scaled_at` only moves on success.

use std::fmt;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::time::Instant;
use tracing::info;

use vscale_core::{ShutdownSignal, SizeName};

use crate::drain::DrainCoordinator;
use crate::error::ScaleError;
use crate::ladder::Step;
use crate::resize::ResizeCoordinator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalePhase {
    Idle,
    Locked,
    Draining,
    ProviderStopping,
    Resizing,
}

impl fmt::Display for ScalePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScalePhase::Idle => "idle",
            ScalePhase::Locked => "locked",
            ScalePhase::Draining => "draining",
            ScalePhase::ProviderStopping => "provider_stopping",
            ScalePhase::Resizing => "resizing",
        };
        f.write_str(s)
    }
}

/// A completed scale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaleOutcome {
    pub from: SizeName,
    pub to: SizeName,
}

/// Resets the published phase to `Idle` when an execution ends.
struct PhaseGuard<'a> {
    phase: &'a watch::Sender<ScalePhase>,
}

impl<'a> PhaseGuard<'a> {
    fn enter(phase: &'a watch::Sender<ScalePhase>) -> Self {
        phase.send_replace(ScalePhase::Locked);
        Self { phase }
    }

    fn advance(&self, next: ScalePhase) {
        self.phase.send_replace(next);
    }
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        self.phase.send_replace(ScalePhase::Idle);
    }
}

pub struct ScalingOrchestrator {
    lock: Mutex<()>,
    last_scaled_at: watch::Sender<Option<Instant>>,
    phase: watch::Sender<ScalePhase>,
    min_interval: Duration,
    drain: DrainCoordinator,
    resize: ResizeCoordinator,
}

impl ScalingOrchestrator {
    pub fn new(drain: DrainCoordinator, resize: ResizeCoordinator, min_interval: Duration) -> Self {
        Self {
            lock: Mutex::new(()),
            last_scaled_at: watch::Sender::new(None),
            phase: watch::Sender::new(ScalePhase::Idle),
            min_interval,
            drain,
            resize,
        }
    }

    pub fn resize_coordinator(&self) -> &ResizeCoordinator {
        &self.resize
    }

    /// Instant of the last successful scale, if any since startup.
    pub fn last_scaled_at(&self) -> Option<Instant> {
        *self.last_scaled_at.borrow()
    }

    /// Time left before another scale is allowed.
    pub fn cooldown_remaining(&self) -> Option<Duration> {
        let last = self.last_scaled_at()?;
        let remaining = (last + self.min_interval).saturating_duration_since(Instant::now());
        (!remaining.is_zero()).then_some(remaining)
    }

    pub fn phase(&self) -> ScalePhase {
        *self.phase.borrow()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<ScalePhase> {
        self.phase.subscribe()
    }

    pub fn is_busy(&self) -> bool {
        self.phase() != ScalePhase::Idle
    }

    /// Whether the ladder has a size in `direction` from the current one.
    /// Takes no lock.
    pub async fn can_scale(&self, direction: i32) -> Result<bool, ScaleError> {
        let (current, ladder) = self.resize.current_and_available().await?;
        let step = ladder.step(current, direction);
        if step == Step::CannotScale {
            info!(
                current = ?ladder.get(current),
                direction,
                %ladder,
                "cannot scale, no eligible size"
            );
            return Ok(false);
        }
        Ok(true)
    }

    /// Drain, stop and resize the instance one ladder step (or `direction`
    /// clamped steps) away.
    pub async fn execute(&self, direction: i32, shutdown: &ShutdownSignal) -> Result<ScaleOutcome, ScaleError> {
        let _lock = self.lock.try_lock().map_err(|_| ScaleError::ScalingInProgress)?;
        let phase = PhaseGuard::enter(&self.phase);

        if let Some(remaining) = self.cooldown_remaining() {
            return Err(ScaleError::TooSoon { remaining });
        }

        let (current, ladder) = self.resize.current_and_available().await?;
        let from = ladder
            .get(current)
            .cloned()
            .ok_or_else(|| ScaleError::SizeNotFound(SizeName::default()))?;
        let to = match ladder.step(current, direction) {
            Step::To { size, .. } => size,
            Step::CannotScale => {
                return Err(ScaleError::CannotScale {
                    current: from,
                    direction,
                });
            }
        };
        info!(%from, %to, direction, "scaling");

        phase.advance(ScalePhase::Draining);
        self.drain.drain(shutdown).await?;

        phase.advance(ScalePhase::ProviderStopping);
        info!("stopping server");
        self.resize.provider().stop_instance(shutdown).await?;

        phase.advance(ScalePhase::Resizing);
        info!("server stopped, resizing");
        self.resize.resize(&to, shutdown).await?;

        self.last_scaled_at.send_replace(Some(Instant::now()));
        Ok(ScaleOutcome { from, to })
    }
}
