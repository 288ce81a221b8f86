use super::{Error, Result};

/// Size of the header preceding every multiplexed frame.
pub const HEADER_LEN: usize = 8;

/// Largest payload delivered per frame; the remainder is discarded.
pub const MAX_FRAME_PAYLOAD: usize = 64 * 1024;

/// Origin of a multiplexed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdin,
    Stdout,
    Stderr,
}

impl TryFrom<u8> for StreamKind {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Stdin),
            1 => Ok(Self::Stdout),
            2 => Ok(Self::Stderr),
            other => Err(Error::UnknownStream(other)),
        }
    }
}

/// Decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub stream: StreamKind,
    pub len: u32,
}

impl FrameHeader {
    /// Layout: stream type, three padding bytes, big-endian payload length.
    pub fn parse(raw: &[u8; HEADER_LEN]) -> Result<Self> {
        let stream = StreamKind::try_from(raw[0])?;
        let len = u32::from_be_bytes([raw[4], raw[5], raw[6], raw[7]]);
        Ok(Self { stream, len })
    }

    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let kind = match self.stream {
            StreamKind::Stdin => 0,
            StreamKind::Stdout => 1,
            StreamKind::Stderr => 2,
        };
        let len = self.len.to_be_bytes();
        [kind, 0, 0, 0, len[0], len[1], len[2], len[3]]
    }
}
