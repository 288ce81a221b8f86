//! Periodic push of freshly built payloads to one client connection.
use std::fmt::Display;
use std::time::Duration;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Default delay between two pushes.
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The client went away or sent a close frame.
    ClientClosed,
    /// A payload could not be written.
    WriteFailed,
}

/// Watches a connection's inbound half for closure.
///
/// A background task drains inbound frames and finishes when the stream
/// ends; callers race [`CloseWatch::closed`] against their own work. The
/// task is aborted when the watch is dropped.
#[derive(Debug)]
pub struct CloseWatch {
    reader: JoinHandle<()>,
    closed: bool,
}

impl CloseWatch {
    pub fn spawn<I>(inbound: I) -> Self
    where
        I: Stream + Send + 'static,
        I::Item: Send,
    {
        let reader = tokio::spawn(async move {
            let mut inbound = std::pin::pin!(inbound);
            while inbound.next().await.is_some() {}
        });
        Self {
            reader,
            closed: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed || self.reader.is_finished()
    }

    /// Resolves once the inbound half has ended. Cancel safe.
    pub async fn closed(&mut self) {
        if self.closed {
            return;
        }
        if let Err(err) = (&mut self.reader).await {
            if !err.is_cancelled() {
                log::warn!("connection reader failed: {err}");
            }
        }
        self.closed = true;
    }
}

impl Drop for CloseWatch {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// Pushes one payload immediately and another every `period` until the
/// client disconnects or a write fails.
#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    period: Duration,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(DEFAULT_PERIOD)
    }
}

impl Scheduler {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }

    /// Runs the push loop for one connection.
    ///
    /// `produce` is called once per tick. A payload that is being built when
    /// the client disconnects is still built, but not sent.
    pub async fn run<P, Fut, S>(
        &self,
        mut produce: P,
        sink: &mut S,
        watch: &mut CloseWatch,
    ) -> CloseReason
    where
        P: FnMut() -> Fut,
        Fut: Future<Output = String>,
        S: Sink<String> + Unpin,
        S::Error: Display,
    {
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = watch.closed() => return CloseReason::ClientClosed,
                _ = ticker.tick() => {}
            }

            let payload = produce().await;
            if watch.is_closed() {
                return CloseReason::ClientClosed;
            }
            log::trace!("pushing {} bytes", payload.len());
            if let Err(err) = sink.send(payload).await {
                log::debug!("failed to push payload: {err}");
                return CloseReason::WriteFailed;
            }
        }
    }
}
