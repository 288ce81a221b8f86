use std::fmt::Display;

use futures_util::{Sink, SinkExt};
use tokio::io::AsyncRead;

use super::LogDemuxer;
use crate::api::models::{LogMessage, error_json, to_json};
use crate::broadcast::CloseWatch;

/// Why a log session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    UpstreamClosed,
    UpstreamFailed,
    ClientClosed,
    WriteFailed,
}

/// Forwards every frame of `reader` to `sink` as a `{"log": ...}` message.
///
/// Client closure is checked before each frame and also interrupts a read
/// that is waiting for the runtime. A protocol or read error is reported to
/// the client as `{"error": ...}` before the session ends.
pub async fn forward_logs<R, S>(reader: R, sink: &mut S, watch: &mut CloseWatch) -> SessionEnd
where
    R: AsyncRead + Unpin,
    S: Sink<String> + Unpin,
    S::Error: Display,
{
    let mut demuxer = LogDemuxer::new(reader);
    loop {
        if watch.is_closed() {
            return SessionEnd::ClientClosed;
        }

        let next = tokio::select! {
            biased;
            _ = watch.closed() => return SessionEnd::ClientClosed,
            next = demuxer.next_line() => next,
        };

        let message = match next {
            Ok(Some(line)) => to_json(&LogMessage { log: &line.text }),
            Ok(None) => return SessionEnd::UpstreamClosed,
            Err(err) => {
                log::warn!("log stream failed: {err}");
                if let Err(err) = sink.send(error_json(&err.to_string())).await {
                    log::debug!("failed to report log stream error: {err}");
                }
                return SessionEnd::UpstreamFailed;
            }
        };

        if let Err(err) = sink.send(message).await {
            log::debug!("failed to forward log line: {err}");
            return SessionEnd::WriteFailed;
        }
    }
}
