//! Prometheus HTTP API client.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tracing::debug;

use vscale_core::{MetricsError, MetricsSource, QueryValue};

use crate::response;

/// Instant-query client for a Prometheus-compatible server.
#[derive(Debug, Clone)]
pub struct PrometheusClient {
    http: reqwest::Client,
    address: String,
    auth: Option<(String, String)>,
}

impl PrometheusClient {
    /// Create a client for `address` (e.g. `http://prometheus:9090`).
    ///
    /// Basic auth is only used when both username and password are set.
    pub fn new(
        address: &str,
        username: &str,
        password: &str,
        timeout: Duration,
    ) -> Result<Self, MetricsError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("vscale/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MetricsError::Transport(e.to_string()))?;

        let auth = (!username.is_empty() && !password.is_empty())
            .then(|| (username.to_string(), password.to_string()));

        Ok(Self {
            http,
            address: address.trim_end_matches('/').to_string(),
            auth,
        })
    }

    fn query_url(&self) -> String {
        format!("{}/api/v1/query", self.address)
    }
}

#[async_trait]
impl MetricsSource for PrometheusClient {
    async fn query(&self, query: &str) -> Result<QueryValue, MetricsError> {
        debug!(%query, "querying prometheus");

        let time = format!("{:.3}", epoch_secs_f64());
        let mut req = self
            .http
            .get(self.query_url())
            .query(&[("query", query), ("time", time.as_str())]);
        if let Some((user, pass)) = &self.auth {
            req = req.basic_auth(user, Some(pass));
        }

        let resp = req
            .send()
            .await
            .map_err(|e| MetricsError::Transport(e.to_string()))?;
        let status = resp.status();
        let body = resp
            .bytes()
            .await
            .map_err(|e| MetricsError::Transport(e.to_string()))?;

        // Prometheus reports query errors as 4xx with a JSON error body.
        match response::decode(&body) {
            Err(MetricsError::Decode(reason)) if !status.is_success() => {
                Err(MetricsError::Transport(format!("http {status}: {reason}")))
            }
            other => other,
        }
    }
}

fn epoch_secs_f64() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
