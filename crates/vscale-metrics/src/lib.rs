//! vscale-metrics — point-in-time metric queries for scaling rules.
//!
//! Talks to the Prometheus HTTP API (`/api/v1/query`) and decodes the
//! result into `vscale_core::QueryValue`, keeping the result shape so the
//! decision engine can reject anything that is not an instant vector.
//!
//! # Architecture
//!
//! ```text
//! PrometheusClient (impl MetricsSource)
//!   ├── query() → GET /api/v1/query?query=..&time=..
//!   └── response::decode() → QueryValue
//! ```

pub mod prometheus;
pub mod response;

pub use prometheus::PrometheusClient;
