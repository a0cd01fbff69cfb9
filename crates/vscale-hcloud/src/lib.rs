//! vscale-hcloud — Hetzner Cloud provider.
//!
//! Implements `vscale_core::CloudProvider` for a single named server:
//! reading its server type, listing compatible server types with their
//! hourly price, shutting it down, changing its type and powering it back
//! on.
//!
//! # Architecture
//!
//! ```text
//! HcloudProvider (impl CloudProvider)
//!   ├── HcloudApi   (reqwest, bearer token, JSON error bodies)
//!   ├── Server      (refreshed on every size query)
//!   └── SizeCache   (server types, TTL-bounded)
//! ```

pub mod api;
pub mod cache;
pub mod provider;
pub mod types;

pub use api::HcloudApi;
pub use cache::SizeCache;
pub use provider::{HcloudOptions, HcloudProvider};
