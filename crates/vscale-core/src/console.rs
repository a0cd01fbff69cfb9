//! Remote command channel collaborator.
//!
//! The drain protocol only needs three things from the managed process:
//! open a session, send a command, read the reply.

use async_trait::async_trait;

use crate::error::ConsoleError;

/// An authenticated session with the managed process.
#[async_trait]
pub trait RemoteConsole: Send {
    /// Send one command.
    async fn send(&mut self, command: &str) -> Result<(), ConsoleError>;

    /// Read the reply to the last command.
    async fn receive(&mut self) -> Result<String, ConsoleError>;

    /// Send a command and wait for its reply.
    async fn command(&mut self, command: &str) -> Result<String, ConsoleError> {
        self.send(command).await?;
        self.receive().await
    }
}

/// Opens console sessions. Holds the address and credential.
#[async_trait]
pub trait ConsoleConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn RemoteConsole>, ConsoleError>;
}
