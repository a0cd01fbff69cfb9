//! vscale-rcon — Source RCON client.
//!
//! The drain protocol messages players, polls the player count and stops
//! the server over RCON. This crate provides the wire codec and a
//! `ConsoleConnector` implementation over `tokio::net::TcpStream`.
//!
//! # Wire format
//!
//! ```text
//! i32 LE length   (bytes that follow)
//! i32 LE id       (echoed back by the server; -1 on auth failure)
//! i32 LE type     (3 auth, 2 exec / auth response, 0 response value)
//! body            (ASCII/UTF-8, not NUL-terminated)
//! 0x00 0x00
//! ```

pub mod client;
pub mod error;
pub mod packet;

pub use client::{RconClient, RconConnector};
pub use error::RconError;
pub use packet::{Packet, PacketType};
