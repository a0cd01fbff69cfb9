//! vscale-autoscale — vertical scaling of a single game server.
//!
//! Evaluates metric rules on an interval and cron schedules on their own
//! timers, and when a step along the size ladder is warranted, drains the
//! game server, stops the instance and resizes it. A failed resize powers
//! the instance back on in its old size.
//!
//! # Control flow
//!
//! ```text
//! Scheduler ──tick / cron fire──► DecisionEngine (MetricsSource)
//!     │
//!     └─► ScalingOrchestrator.can_scale(d)     (SizeLadder, no lock)
//!         ScalingOrchestrator.execute(d)       (try_lock + cooldown)
//!           ├── DrainCoordinator   notify → wait for 0 players → stop
//!           ├── CloudProvider      stop_instance (confirmed off)
//!           └── ResizeCoordinator  resize → poll ≤ 24× → power_on on failure
//! ```
//!
//! Informational outcomes (`CannotScale`, `ScalingInProgress`, `TooSoon`)
//! end a cycle quietly; other errors end only the current attempt.

pub mod decision;
pub mod drain;
pub mod error;
pub mod ladder;
pub mod orchestrator;
pub mod resize;
pub mod scheduler;

#[cfg(test)]
mod testing;

pub use decision::{DecisionEngine, RuleMatch};
pub use drain::{
    BroadcastMessage, DEFAULT_DRAIN_MESSAGE, DrainCoordinator, DrainOptions, ListResponseParser,
    OccupancyParser,
};
pub use error::ScaleError;
pub use ladder::{SizeLadder, Step};
pub use orchestrator::{ScaleOutcome, ScalePhase, ScalingOrchestrator};
pub use resize::{ResizeCoordinator, ResizeOptions};
pub use scheduler::Scheduler;
