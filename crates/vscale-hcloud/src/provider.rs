//! `CloudProvider` implementation for one Hetzner Cloud server.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use vscale_core::{
    ActionStatus, AsyncAction, CloudProvider, ProviderError, ShutdownSignal, SizeInfo, SizeName,
};

use crate::api::{DEFAULT_ENDPOINT, HcloudApi};
use crate::cache::SizeCache;
use crate::types::{
    Action, ActionEnvelope, ChangeTypeRequest, Server, ServerEnvelope, ServerType,
    ServerTypesEnvelope, ServersEnvelope,
};

const SERVER_TYPES_PER_PAGE: u32 = 50;

#[derive(Debug, Clone)]
pub struct HcloudOptions {
    pub endpoint: String,
    /// How long the server type list is trusted before refetching.
    pub server_types_cache_lifetime: Duration,
    /// Interval between action / status polls while stopping.
    pub poll_interval: Duration,
    /// Maximum polls of the shutdown action.
    pub action_max_attempts: u32,
    /// Maximum wait for the server to report `off` after shutdown succeeded.
    pub power_off_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for HcloudOptions {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            server_types_cache_lifetime: Duration::from_secs(600),
            poll_interval: Duration::from_secs(5),
            action_max_attempts: 24,
            power_off_timeout: Duration::from_secs(300),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// The managed Hetzner Cloud server.
pub struct HcloudProvider {
    api: HcloudApi,
    server_id: u64,
    server: Mutex<Server>,
    sizes: Mutex<SizeCache>,
    opts: HcloudOptions,
}

impl HcloudProvider {
    /// Locate `server_name` and build a provider for it.
    ///
    /// Fails if the server does not exist; there is nothing to scale.
    pub async fn connect(
        token: &str,
        server_name: &str,
        opts: HcloudOptions,
    ) -> Result<Self, ProviderError> {
        let api = HcloudApi::new(&opts.endpoint, token, opts.request_timeout)?;
        let found: ServersEnvelope = api
            .get("/servers", &[("name", server_name.to_string())])
            .await?;
        let server = found
            .servers
            .into_iter()
            .find(|s| s.name == server_name)
            .ok_or_else(|| ProviderError::InstanceNotFound(server_name.to_string()))?;

        info!(
            server = %server.name,
            id = server.id,
            server_type = %server.server_type.name,
            location = %server.location(),
            "located managed server"
        );

        Ok(Self {
            api,
            server_id: server.id,
            server: Mutex::new(server),
            sizes: Mutex::new(SizeCache::new(opts.server_types_cache_lifetime)),
            opts,
        })
    }

    async fn refresh_server(&self) -> Result<Server, ProviderError> {
        let env: ServerEnvelope = self
            .api
            .get(&format!("/servers/{}", self.server_id), &[])
            .await
            .map_err(|e| match e {
                ProviderError::Api { code, .. } if code == "not_found" => {
                    ProviderError::InstanceNotFound(self.server_id.to_string())
                }
                other => other,
            })?;
        let mut server = self.server.lock().await;
        *server = env.server.clone();
        Ok(env.server)
    }

    async fn server_types(&self) -> Result<Vec<ServerType>, ProviderError> {
        let mut cache = self.sizes.lock().await;
        if let Some(types) = cache.get() {
            return Ok(types.to_vec());
        }

        debug!("updating server types cache");
        let mut types = Vec::new();
        let mut page = 1;
        loop {
            let env: ServerTypesEnvelope = self
                .api
                .get(
                    "/server_types",
                    &[
                        ("page", page.to_string()),
                        ("per_page", SERVER_TYPES_PER_PAGE.to_string()),
                    ],
                )
                .await?;
            types.extend(env.server_types);
            match env.meta.and_then(|m| m.pagination.next_page) {
                Some(next) if next > page => page = next,
                _ => break,
            }
        }

        cache.store(types.clone());
        Ok(types)
    }

    async fn wait_for_action(
        &self,
        action: &Action,
        shutdown: &ShutdownSignal,
    ) -> Result<(), ProviderError> {
        for attempt in 1..=self.opts.action_max_attempts {
            let env: ActionEnvelope = self.api.get(&format!("/actions/{}", action.id), &[]).await?;
            debug!(id = action.id, attempt, status = %env.action.status, "action status");
            match env.action.status() {
                ActionStatus::Success => return Ok(()),
                ActionStatus::Error(message) => {
                    return Err(ProviderError::ActionFailed {
                        id: action.id,
                        message,
                    });
                }
                ActionStatus::Running => {}
            }
            if attempt < self.opts.action_max_attempts {
                shutdown.sleep(self.opts.poll_interval).await?;
            }
        }
        Err(ProviderError::ActionTimeout { id: action.id })
    }
}

/// Server types the server can move to: same architecture, sold in its
/// location. The cost is the gross hourly price there.
pub fn compatible_sizes(types: &[ServerType], server: &Server) -> Result<Vec<SizeInfo>, ProviderError> {
    let architecture = &server.server_type.architecture;
    let location = server.location();

    types
        .iter()
        .filter(|t| &t.architecture == architecture)
        .filter_map(|t| t.hourly_gross_in(location).map(|gross| (t, gross)))
        .map(|(t, gross)| {
            let hourly_cost = gross.parse::<f64>().map_err(|e| {
                ProviderError::InvalidResponse(format!(
                    "server type {} has unparseable price {gross:?}: {e}",
                    t.name
                ))
            })?;
            Ok(SizeInfo {
                name: SizeName::new(&t.name),
                hourly_cost,
                architecture: t.architecture.clone(),
                location: location.to_string(),
            })
        })
        .collect()
}

#[async_trait]
impl CloudProvider for HcloudProvider {
    async fn current_size(&self) -> Result<SizeName, ProviderError> {
        let server = self.refresh_server().await?;
        Ok(SizeName::new(server.server_type.name))
    }

    async fn available_sizes(&self) -> Result<Vec<SizeInfo>, ProviderError> {
        let server = self.refresh_server().await?;
        let types = self.server_types().await?;
        compatible_sizes(&types, &server)
    }

    async fn stop_instance(&self, shutdown: &ShutdownSignal) -> Result<(), ProviderError> {
        if self.refresh_server().await?.is_off() {
            debug!("server already off");
            return Ok(());
        }

        let env: ActionEnvelope = self
            .api
            .post(
                &format!("/servers/{}/actions/shutdown", self.server_id),
                &serde_json::json!({}),
            )
            .await?;
        if env.action.status() != ActionStatus::Success {
            self.wait_for_action(&env.action, shutdown).await?;
        }

        // A successful shutdown action only means the guest was asked to halt.
        debug!("shutdown acknowledged, waiting for power off");
        let deadline = Instant::now() + self.opts.power_off_timeout;
        loop {
            let server = self.refresh_server().await?;
            if server.is_off() {
                info!("server powered off");
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(ProviderError::StopTimeout(self.opts.power_off_timeout));
            }
            debug!(status = %server.status, "still waiting for power off");
            shutdown.sleep(self.opts.poll_interval).await?;
        }
    }

    async fn resize(&self, size: &SizeName) -> Result<AsyncAction, ProviderError> {
        let types = self.server_types().await?;
        if !types.iter().any(|t| t.name == size.as_str()) {
            return Err(ProviderError::UnknownSize(size.to_string()));
        }

        let env: ActionEnvelope = self
            .api
            .post(
                &format!("/servers/{}/actions/change_type", self.server_id),
                &ChangeTypeRequest {
                    server_type: size.as_str(),
                    upgrade_disk: false,
                },
            )
            .await?;
        info!(id = env.action.id, target = %size, "change_type issued");
        Ok(AsyncAction::new(env.action.id, env.action.status()))
    }

    async fn poll_action(&self, action: &AsyncAction) -> Result<ActionStatus, ProviderError> {
        let env: ActionEnvelope = self.api.get(&format!("/actions/{}", action.id), &[]).await?;
        Ok(env.action.status())
    }

    async fn power_on(&self) -> Result<(), ProviderError> {
        let env: ActionEnvelope = self
            .api
            .post(
                &format!("/servers/{}/actions/poweron", self.server_id),
                &serde_json::json!({}),
            )
            .await?;
        if let ActionStatus::Error(message) = env.action.status() {
            warn!(id = env.action.id, %message, "poweron action reported an error");
            return Err(ProviderError::ActionFailed {
                id: env.action.id,
                message,
            });
        }
        info!(id = env.action.id, "poweron issued");
        Ok(())
    }
}
