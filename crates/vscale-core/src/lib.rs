//! vscale-core — shared types for the vscale workspace.
//!
//! Holds the pieces every other crate agrees on:
//!
//! - size metadata (`SizeName`, `SizeInfo`) and cloud-side actions
//! - the rules file (`ScaleRule`, `ScaleSchedule`, `SizeGuard`)
//! - the collaborator traits the autoscaler drives: `MetricsSource`,
//!   `ConsoleConnector` / `RemoteConsole` and `CloudProvider`
//! - `ShutdownSignal`, the cancellation handle threaded through every
//!   blocking poll loop
//!
//! # Architecture
//!
//! ```text
//! vscaled
//!   ├── vscale-autoscale (decision + orchestration, generic over the traits)
//!   ├── vscale-metrics   (MetricsSource   → Prometheus HTTP API)
//!   ├── vscale-rcon      (ConsoleConnector → Source RCON)
//!   └── vscale-hcloud    (CloudProvider   → Hetzner Cloud API)
//! ```

pub mod cloud;
pub mod config;
pub mod console;
pub mod error;
pub mod metrics;
pub mod shutdown;
pub mod types;

pub use cloud::CloudProvider;
pub use config::{Comparison, RulesFile, ScaleRule, ScaleSchedule, SizeGuard};
pub use console::{ConsoleConnector, RemoteConsole};
pub use error::{Cancelled, ConfigError, ConsoleError, MetricsError, ProviderError};
pub use metrics::{MetricsSource, QueryValue, Sample, Series};
pub use shutdown::ShutdownSignal;
pub use types::*;
