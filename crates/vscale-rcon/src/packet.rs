//! RCON packet codec.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::RconError;

/// Largest body a server sends in a single packet.
pub const MAX_RESPONSE_BODY: usize = 4096;

/// Largest command body a Minecraft server accepts.
pub const MAX_COMMAND_BODY: usize = 1446;

/// id + type + two terminating NULs.
const HEADER_AND_PADDING: usize = 4 + 4 + 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    Auth,
    /// Shares its wire value with `AuthResponse`; direction disambiguates.
    ExecCommand,
    AuthResponse,
    ResponseValue,
}

impl PacketType {
    fn wire(self) -> i32 {
        match self {
            PacketType::Auth => 3,
            PacketType::ExecCommand | PacketType::AuthResponse => 2,
            PacketType::ResponseValue => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub id: i32,
    /// Raw wire type. Interpret with the request direction in mind.
    pub kind: i32,
    pub body: String,
}

impl Packet {
    pub fn new(id: i32, kind: PacketType, body: impl Into<String>) -> Self {
        Self {
            id,
            kind: kind.wire(),
            body: body.into(),
        }
    }

    pub fn is(&self, kind: PacketType) -> bool {
        self.kind == kind.wire()
    }

    pub fn encode(&self) -> Vec<u8> {
        let body = self.body.as_bytes();
        let length = (HEADER_AND_PADDING + body.len()) as i32;
        let mut buf = Vec::with_capacity(4 + length as usize);
        buf.extend_from_slice(&length.to_le_bytes());
        buf.extend_from_slice(&self.id.to_le_bytes());
        buf.extend_from_slice(&self.kind.to_le_bytes());
        buf.extend_from_slice(body);
        buf.extend_from_slice(&[0, 0]);
        buf
    }
}

pub async fn write_packet<W>(writer: &mut W, packet: &Packet) -> Result<(), RconError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&packet.encode()).await?;
    writer.flush().await?;
    Ok(())
}

pub async fn read_packet<R>(reader: &mut R) -> Result<Packet, RconError>
where
    R: AsyncRead + Unpin,
{
    let length = reader.read_i32_le().await?;
    if length < HEADER_AND_PADDING as i32 {
        return Err(RconError::Malformed(format!("length {length} shorter than header")));
    }
    let length = length as usize;
    if length > HEADER_AND_PADDING + MAX_RESPONSE_BODY {
        return Err(RconError::Malformed(format!("length {length} exceeds maximum")));
    }

    let mut payload = vec![0u8; length];
    reader.read_exact(&mut payload).await?;

    let id = i32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]);
    let kind = i32::from_le_bytes([payload[4], payload[5], payload[6], payload[7]]);
    let body = &payload[8..length - 2];
    if payload[length - 2..] != [0, 0] {
        return Err(RconError::Malformed("missing terminating NULs".to_string()));
    }

    Ok(Packet {
        id,
        kind,
        body: String::from_utf8_lossy(body).into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_exec_packet() {
        let bytes = Packet::new(7, PacketType::ExecCommand, "list").encode();
        assert_eq!(
            bytes,
            vec![
                14, 0, 0, 0, // length
                7, 0, 0, 0, // id
                2, 0, 0, 0, // type
                b'l', b'i', b's', b't', // body
                0, 0,
            ]
        );
    }

    #[tokio::test]
    async fn read_response_with_style_markers() {
        let sent = Packet::new(3, PacketType::ResponseValue, "§6There are 0 out of maximum 20 players online.");
        let bytes = sent.encode();
        let mut reader = bytes.as_slice();
        let got = read_packet(&mut reader).await.unwrap();
        assert_eq!(got, sent);
        assert!(got.is(PacketType::ResponseValue));
    }

    #[tokio::test]
    async fn read_rejects_short_length() {
        let mut bytes = Packet::new(1, PacketType::ResponseValue, "").encode();
        bytes[0] = 4;
        let err = read_packet(&mut bytes.as_slice()).await.unwrap_err();
        assert!(matches!(err, RconError::Malformed(_)));
    }

    #[tokio::test]
    async fn read_rejects_oversized_length() {
        let bytes = 100_000i32.to_le_bytes();
        let err = read_packet(&mut bytes.as_slice()).await.unwrap_err();
        assert!(matches!(err, RconError::Malformed(_)));
    }

    #[tokio::test]
    async fn read_rejects_missing_terminator() {
        let mut bytes = Packet::new(1, PacketType::ResponseValue, "ok").encode();
        let last = bytes.len() - 1;
        bytes[last] = b'!';
        let err = read_packet(&mut bytes.as_slice()).await.unwrap_err();
        assert!(matches!(err, RconError::Malformed(_)));
    }

    #[tokio::test]
    async fn truncated_stream_is_an_io_error() {
        let bytes = Packet::new(1, PacketType::ResponseValue, "hello").encode();
        let err = read_packet(&mut &bytes[..9]).await.unwrap_err();
        assert!(matches!(err, RconError::Io(_)));
    }
}
