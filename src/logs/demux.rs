use tokio::io::{AsyncRead, AsyncReadExt};

use super::frame::{FrameHeader, HEADER_LEN, MAX_FRAME_PAYLOAD, StreamKind};
use super::{Error, Result};

/// One decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub stream: StreamKind,
    pub text: String,
}

/// Splits the runtime's multiplexed log stream into lines.
///
/// Payloads longer than the cap are cut; the rest of such a frame is read and
/// thrown away so the next header is found at the right offset.
#[derive(Debug)]
pub struct LogDemuxer<R> {
    reader: R,
    max_payload: usize,
}

impl<R: AsyncRead + Unpin> LogDemuxer<R> {
    pub fn new(reader: R) -> Self {
        Self::with_max_payload(reader, MAX_FRAME_PAYLOAD)
    }

    pub fn with_max_payload(reader: R, max_payload: usize) -> Self {
        Self {
            reader,
            max_payload,
        }
    }

    /// Reads the next non-empty frame.
    ///
    /// Returns `Ok(None)` on a clean end of stream, i.e. one that falls on a
    /// frame boundary. A payload cut short by the end of the stream is still
    /// returned; the following call then reports the end.
    ///
    /// # Errors
    ///
    /// Fails on read errors, on a stream ending inside a header and on an
    /// unknown stream type.
    pub async fn next_line(&mut self) -> Result<Option<LogLine>> {
        loop {
            let mut raw = [0u8; HEADER_LEN];
            match self.read_header(&mut raw).await? {
                0 => return Ok(None),
                HEADER_LEN => {}
                read => return Err(Error::TruncatedHeader { read }),
            }

            let header = FrameHeader::parse(&raw)?;
            if header.len == 0 {
                continue;
            }

            let len = header.len as usize;
            let keep = len.min(self.max_payload);
            let mut payload = Vec::with_capacity(keep);
            (&mut self.reader)
                .take(keep as u64)
                .read_to_end(&mut payload)
                .await?;

            if len > keep && payload.len() == keep {
                let excess = (len - keep) as u64;
                let discarded =
                    tokio::io::copy(&mut (&mut self.reader).take(excess), &mut tokio::io::sink())
                        .await?;
                log::debug!("log frame of {len} bytes cut to {keep}, discarded {discarded}");
            }

            return Ok(Some(LogLine {
                stream: header.stream,
                text: String::from_utf8_lossy(&payload).into_owned(),
            }));
        }
    }

    /// Fills `raw` as far as the stream allows and returns the bytes read.
    async fn read_header(&mut self, raw: &mut [u8; HEADER_LEN]) -> Result<usize> {
        let mut read = 0;
        while read < HEADER_LEN {
            let n = self.reader.read(&mut raw[read..]).await?;
            if n == 0 {
                break;
            }
            read += n;
        }
        Ok(read)
    }
}
