//! RCON session over TCP.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tracing::debug;

use vscale_core::{ConsoleConnector, ConsoleError, RemoteConsole};

use crate::error::RconError;
use crate::packet::{MAX_COMMAND_BODY, Packet, PacketType, read_packet, write_packet};

/// An authenticated RCON session.
///
/// Every network operation is bounded by the session's I/O timeout.
#[derive(Debug)]
pub struct RconClient {
    stream: TcpStream,
    timeout: Duration,
    next_id: i32,
    /// Id of the last command sent, awaiting its response.
    pending: Option<i32>,
}

impl RconClient {
    /// Connect to `address` and authenticate with `password`.
    pub async fn connect(address: &str, password: &str, timeout: Duration) -> Result<Self, RconError> {
        let stream = with_timeout(timeout, async {
            TcpStream::connect(address)
                .await
                .map_err(|source| RconError::Connect {
                    address: address.to_string(),
                    source,
                })
        })
        .await?;
        stream.set_nodelay(true)?;

        let mut client = Self {
            stream,
            timeout,
            next_id: 1,
            pending: None,
        };
        client.authenticate(password).await?;
        debug!(%address, "rcon session established");
        Ok(client)
    }

    async fn authenticate(&mut self, password: &str) -> Result<(), RconError> {
        let id = self.take_id();
        let timeout = self.timeout;
        let stream = &mut self.stream;
        with_timeout(timeout, async {
            write_packet(stream, &Packet::new(id, PacketType::Auth, password)).await?;
            loop {
                let reply = read_packet(stream).await?;
                if reply.id == -1 {
                    return Err(RconError::AuthFailed);
                }
                // Some servers send an empty RESPONSE_VALUE ahead of the auth response.
                if reply.is(PacketType::ResponseValue) {
                    continue;
                }
                if reply.id != id {
                    return Err(RconError::UnexpectedId {
                        expected: id,
                        got: reply.id,
                    });
                }
                return Ok(());
            }
        })
        .await
    }

    /// Send one command without waiting for its reply.
    pub async fn send_command(&mut self, command: &str) -> Result<(), RconError> {
        if command.len() > MAX_COMMAND_BODY {
            return Err(RconError::CommandTooLong {
                len: command.len(),
                max: MAX_COMMAND_BODY,
            });
        }
        let id = self.take_id();
        let packet = Packet::new(id, PacketType::ExecCommand, command);
        with_timeout(self.timeout, write_packet(&mut self.stream, &packet)).await?;
        self.pending = Some(id);
        Ok(())
    }

    /// Read the reply to the last command sent.
    pub async fn read_response(&mut self) -> Result<String, RconError> {
        let reply = with_timeout(self.timeout, read_packet(&mut self.stream)).await?;
        if let Some(expected) = self.pending.take()
            && reply.id != expected
        {
            return Err(RconError::UnexpectedId {
                expected,
                got: reply.id,
            });
        }
        Ok(reply.body)
    }

    fn take_id(&mut self) -> i32 {
        let id = self.next_id;
        self.next_id = self.next_id.checked_add(1).unwrap_or(1);
        id
    }
}

#[async_trait]
impl RemoteConsole for RconClient {
    async fn send(&mut self, command: &str) -> Result<(), ConsoleError> {
        Ok(self.send_command(command).await?)
    }

    async fn receive(&mut self) -> Result<String, ConsoleError> {
        Ok(self.read_response().await?)
    }
}

/// Opens a fresh `RconClient` per drain attempt.
#[derive(Debug, Clone)]
pub struct RconConnector {
    address: String,
    password: String,
    timeout: Duration,
}

impl RconConnector {
    pub fn new(address: impl Into<String>, password: impl Into<String>, timeout: Duration) -> Self {
        Self {
            address: address.into(),
            password: password.into(),
            timeout,
        }
    }
}

#[async_trait]
impl ConsoleConnector for RconConnector {
    async fn connect(&self) -> Result<Box<dyn RemoteConsole>, ConsoleError> {
        let client = RconClient::connect(&self.address, &self.password, self.timeout).await?;
        Ok(Box::new(client))
    }
}

async fn with_timeout<T, F>(timeout: Duration, fut: F) -> Result<T, RconError>
where
    F: Future<Output = Result<T, RconError>>,
{
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| RconError::Timeout)?
}
