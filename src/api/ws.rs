//! WebSocket session drivers.
use std::sync::Arc;

use axum::Error;
use axum::extract::ws::{Message, WebSocket};
use futures_util::{Sink, SinkExt, Stream, StreamExt};

use super::models::{Status, StatusMessage, error_json, to_json};
use crate::action;
use crate::broadcast::{CloseWatch, Scheduler};
use crate::config::FeatureFlags;
use crate::container::ContainerID;
use crate::logs::forward_logs;
use crate::runtime::ContainerRuntime;

/// Adapts a WebSocket sink to accept JSON text.
fn text_sink<S>(sink: S) -> impl Sink<String, Error = Error> + Unpin
where
    S: Sink<Message, Error = Error> + Unpin,
{
    sink.with(|text: String| std::future::ready(Ok::<_, Error>(Message::Text(text.into()))))
}

/// Inbound frames up to the first close frame or error.
fn until_close<S>(stream: S) -> impl Stream<Item = Message> + Send + 'static
where
    S: Stream<Item = Result<Message, Error>> + Send + 'static,
{
    stream
        .take_while(|frame| std::future::ready(matches!(frame, Ok(msg) if !matches!(msg, Message::Close(_)))))
        .filter_map(|frame| std::future::ready(frame.ok()))
}

/// Pushes a payload right away and then on every scheduler tick.
pub(super) async fn broadcast<P, Fut>(socket: WebSocket, scheduler: Scheduler, produce: P)
where
    P: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = String> + Send,
{
    let (sink, stream) = socket.split();
    let mut sink = text_sink(sink);
    let mut watch = CloseWatch::spawn(until_close(stream));

    let reason = scheduler.run(produce, &mut sink, &mut watch).await;
    log::debug!("broadcast connection closed: {reason:?}");
    if let Err(err) = sink.close().await {
        log::trace!("failed to close broadcast connection: {err}");
    }
}

pub(super) async fn stream_logs<R: ContainerRuntime>(
    socket: WebSocket,
    runtime: Arc<R>,
    id: ContainerID,
) {
    let (sink, stream) = socket.split();
    let mut sink = text_sink(sink);
    let mut watch = CloseWatch::spawn(until_close(stream));

    match runtime.stream_logs(id.as_str()).await {
        Ok(reader) => {
            let end = forward_logs(reader, &mut sink, &mut watch).await;
            log::debug!("log session for `{id}` ended: {end:?}");
        }
        Err(err) => {
            log::error!("failed to open logs of `{id}`: {err}");
            let message = error_json(&format!("Failed to get logs: {}", err.upstream_message()));
            if let Err(err) = sink.send(message).await {
                log::debug!("failed to report log error: {err}");
            }
        }
    }

    if let Err(err) = sink.close().await {
        log::trace!("failed to close log connection: {err}");
    }
}

pub(super) async fn restart<R: ContainerRuntime>(
    mut socket: WebSocket,
    runtime: Arc<R>,
    flags: FeatureFlags,
    id: ContainerID,
) {
    let message = match action::restart(runtime.as_ref(), &flags, &id).await {
        Ok(message) => message,
        Err(err) => StatusMessage {
            status: Status::Error,
            message: err.to_string(),
        },
    };

    if let Err(err) = socket.send(Message::Text(to_json(&message).into())).await {
        log::debug!("failed to send restart result for `{id}`: {err}");
    }
    if let Err(err) = SinkExt::close(&mut socket).await {
        log::trace!("failed to close restart connection: {err}");
    }
}
