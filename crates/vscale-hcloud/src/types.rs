//! Hetzner Cloud API models (only the fields vscale reads).

use serde::{Deserialize, Serialize};

use vscale_core::ActionStatus;

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub id: u64,
    pub name: String,
    /// `running`, `off`, `stopping`, `starting`, ...
    pub status: String,
    pub server_type: ServerType,
    pub datacenter: Datacenter,
}

impl Server {
    pub fn is_off(&self) -> bool {
        self.status == "off"
    }

    pub fn location(&self) -> &str {
        &self.datacenter.location.name
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Datacenter {
    pub name: String,
    pub location: Location,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Location {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerType {
    pub id: u64,
    pub name: String,
    pub architecture: String,
    #[serde(default)]
    pub prices: Vec<Price>,
}

impl ServerType {
    /// Gross hourly price in `location`, if the type is sold there.
    pub fn hourly_gross_in(&self, location: &str) -> Option<&str> {
        self.prices
            .iter()
            .find(|p| p.location == location)
            .map(|p| p.price_hourly.gross.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Price {
    pub location: String,
    pub price_hourly: Amount,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Amount {
    pub net: String,
    pub gross: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Action {
    pub id: u64,
    pub command: String,
    /// `running`, `success` or `error`.
    pub status: String,
    #[serde(default)]
    pub error: Option<ApiErrorBody>,
}

impl Action {
    pub fn status(&self) -> ActionStatus {
        match self.status.as_str() {
            "success" => ActionStatus::Success,
            "error" => ActionStatus::Error(
                self.error
                    .as_ref()
                    .map(|e| format!("{}: {}", e.code, e.message))
                    .unwrap_or_else(|| "unknown error".to_string()),
            ),
            _ => ActionStatus::Running,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

// ── Envelopes ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ServerEnvelope {
    pub server: Server,
}

#[derive(Debug, Deserialize)]
pub struct ServersEnvelope {
    pub servers: Vec<Server>,
}

#[derive(Debug, Deserialize)]
pub struct ServerTypesEnvelope {
    pub server_types: Vec<ServerType>,
    #[serde(default)]
    pub meta: Option<Meta>,
}

#[derive(Debug, Deserialize)]
pub struct ActionEnvelope {
    pub action: Action,
}

#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct Meta {
    pub pagination: Pagination,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub next_page: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct ChangeTypeRequest<'a> {
    pub server_type: &'a str,
    pub upgrade_disk: bool,
}
