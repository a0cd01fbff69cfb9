//! Thin JSON client for the Hetzner Cloud REST API.

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use vscale_core::ProviderError;

use crate::types::ErrorEnvelope;

pub const DEFAULT_ENDPOINT: &str = "https://api.hetzner.cloud/v1";

#[derive(Debug, Clone)]
pub struct HcloudApi {
    http: reqwest::Client,
    endpoint: String,
    token: String,
}

impl HcloudApi {
    pub fn new(endpoint: &str, token: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("vscale/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        debug!(%path, "hcloud GET");
        let req = self
            .http
            .get(self.url(path))
            .bearer_auth(&self.token)
            .query(query);
        Self::decode(req.send().await).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ProviderError> {
        debug!(%path, "hcloud POST");
        let req = self
            .http
            .post(self.url(path))
            .bearer_auth(&self.token)
            .json(body);
        Self::decode(req.send().await).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    async fn decode<T: DeserializeOwned>(
        sent: Result<reqwest::Response, reqwest::Error>,
    ) -> Result<T, ProviderError> {
        let resp = sent.map_err(|e| ProviderError::Transport(e.to_string()))?;
        let status = resp.status();
        let body = resp
            .bytes()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(match serde_json::from_slice::<ErrorEnvelope>(&body) {
                Ok(env) => ProviderError::Api {
                    code: env.error.code,
                    message: env.error.message,
                },
                Err(_) => ProviderError::Transport(format!("http {status}")),
            });
        }

        serde_json::from_slice(&body).map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }
}
