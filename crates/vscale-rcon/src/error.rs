//! RCON error types.

use thiserror::Error;

use vscale_core::ConsoleError;

#[derive(Debug, Error)]
pub enum RconError {
    #[error("failed to connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("authentication rejected by server")]
    AuthFailed,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("operation timed out")]
    Timeout,

    #[error("malformed packet: {0}")]
    Malformed(String),

    #[error("command is {len} bytes, server accepts at most {max}")]
    CommandTooLong { len: usize, max: usize },

    #[error("response id {got} does not match request id {expected}")]
    UnexpectedId { expected: i32, got: i32 },
}

impl From<RconError> for ConsoleError {
    fn from(err: RconError) -> Self {
        match err {
            RconError::Connect { .. } => ConsoleError::Connect(err.to_string()),
            RconError::AuthFailed => ConsoleError::AuthFailed,
            RconError::Io(e) => ConsoleError::Io(e),
            RconError::Timeout => ConsoleError::Timeout,
            other => ConsoleError::Protocol(other.to_string()),
        }
    }
}
