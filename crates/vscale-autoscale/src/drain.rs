//! Graceful drain of the managed game server.
//!
//! ```text
//! connect ──► broadcast notice ──► poll `list` every 5s ──► `stop`
//!                                      │
//!                                      ├── 0 online     → continue
//!                                      ├── 5 min passed → DrainTimeout
//!                                      └── shutdown     → Cancelled
//! ```
//!
//! Any failure ends the attempt before the provider is touched.

use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use tokio::time::Instant;
use tracing::{debug, info};

use vscale_core::{ConsoleConnector, RemoteConsole, ShutdownSignal};

use crate::error::ScaleError;

pub const DEFAULT_DRAIN_MESSAGE: &str = "§3Heads up: §rthe server is eligible for resizing. \
It will be stopped and resized once nobody is online, which takes a few minutes. \
If the server is not empty within the next 5 minutes, the resize is cancelled.";

/// Pre-drain notice. A message starting with `{` is a JSON text component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BroadcastMessage {
    Plain(String),
    RichText(String),
}

impl BroadcastMessage {
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.starts_with('{') {
            BroadcastMessage::RichText(message)
        } else {
            BroadcastMessage::Plain(message)
        }
    }

    /// Console command that delivers the message to every player.
    pub fn command(&self) -> String {
        match self {
            BroadcastMessage::Plain(text) => format!("say {text}"),
            BroadcastMessage::RichText(json) => format!("tellraw @a {json}"),
        }
    }
}

impl Default for BroadcastMessage {
    fn default() -> Self {
        BroadcastMessage::new(DEFAULT_DRAIN_MESSAGE)
    }
}

/// Extracts the number of connected players from a `list` reply.
pub trait OccupancyParser: Send + Sync {
    /// `None` if the reply is not in the expected format.
    fn online(&self, response: &str) -> Option<u32>;
}

/// Parser for the vanilla `list` reply:
/// `There are <N> out of maximum <M> players online.`, possibly with
/// `§x` formatting codes mixed in.
#[derive(Debug, Clone)]
pub struct ListResponseParser {
    formatting: Regex,
    line: Regex,
}

impl ListResponseParser {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            formatting: Regex::new(r"(?i)§[0-9a-z]")?,
            line: Regex::new(r"There are (\d+) out of maximum \d+ players online\.")?,
        })
    }

    pub fn strip_formatting<'a>(&self, text: &'a str) -> std::borrow::Cow<'a, str> {
        self.formatting.replace_all(text, "")
    }
}

impl OccupancyParser for ListResponseParser {
    fn online(&self, response: &str) -> Option<u32> {
        let plain = self.strip_formatting(response);
        self.line
            .captures(&plain)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }
}

#[derive(Debug, Clone)]
pub struct DrainOptions {
    pub message: BroadcastMessage,
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for DrainOptions {
    fn default() -> Self {
        Self {
            message: BroadcastMessage::default(),
            poll_interval: Duration::from_secs(5),
            timeout: Duration::from_secs(300),
        }
    }
}

pub struct DrainCoordinator {
    connector: Arc<dyn ConsoleConnector>,
    parser: Arc<dyn OccupancyParser>,
    opts: DrainOptions,
}

impl DrainCoordinator {
    pub fn new(
        connector: Arc<dyn ConsoleConnector>,
        parser: Arc<dyn OccupancyParser>,
        opts: DrainOptions,
    ) -> Self {
        Self {
            connector,
            parser,
            opts,
        }
    }

    /// Notify players, wait for the server to empty, then stop it.
    pub async fn drain(&self, shutdown: &ShutdownSignal) -> Result<(), ScaleError> {
        let mut console = self.connector.connect().await?;

        debug!(message = ?self.opts.message, "sending pre-shutdown message");
        console.command(&self.opts.message.command()).await?;

        self.wait_for_empty(console.as_mut(), shutdown).await?;

        info!("server empty, stopping it");
        console.command("stop").await?;
        Ok(())
    }

    async fn wait_for_empty(
        &self,
        console: &mut dyn RemoteConsole,
        shutdown: &ShutdownSignal,
    ) -> Result<(), ScaleError> {
        let deadline = Instant::now() + self.opts.timeout;
        loop {
            let response = console.command("list").await?;
            debug!(%response, "list response");
            let online = self
                .parser
                .online(&response)
                .ok_or_else(|| ScaleError::ProtocolMismatch(response.clone()))?;
            info!(online, "players online");
            if online == 0 {
                return Ok(());
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining < self.opts.poll_interval {
                shutdown.sleep(remaining).await?;
                return Err(ScaleError::DrainTimeout {
                    timeout: self.opts.timeout,
                    online,
                });
            }
            shutdown.sleep(self.opts.poll_interval).await?;
        }
    }
}
