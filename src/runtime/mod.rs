//! Access to the container runtime's control API.
//!
//! The runtime is any Docker-Engine-compatible daemon reachable over a Unix
//! socket. [`RuntimeClient`] is the production implementation of
//! [`ContainerRuntime`]; the rest of the crate only depends on the trait so the
//! telemetry pipeline can be driven by an in-memory runtime in tests.
use std::pin::Pin;

mod client;
mod error;
#[cfg(test)]
pub(crate) mod fake;
pub mod models;
mod transport;

pub use client::{CALL_TIMEOUT, RESTART_TIMEOUT, RuntimeClient};
pub use error::{Error, Result};
pub use models::{ContainerInspect, ContainerSummary, ImageInspect, StatsResponse};
pub use transport::UnixConnector;

/// Raw multiplexed log stream as delivered by the runtime.
pub type LogReader = Pin<Box<dyn tokio::io::AsyncRead + Send>>;

/// Operations the dashboard performs against the container runtime.
///
/// Implementations perform exactly one upstream attempt per call and never
/// retry.
pub trait ContainerRuntime: Send + Sync + 'static {
    /// Lists all containers, running and stopped, in runtime order.
    fn list_containers(&self) -> impl Future<Output = Result<Vec<ContainerSummary>>> + Send;

    fn inspect_container(&self, id: &str) -> impl Future<Output = Result<ContainerInspect>> + Send;

    fn inspect_image(&self, image_id: &str) -> impl Future<Output = Result<ImageInspect>> + Send;

    /// Requests one stats sample carrying both the current and the prior CPU
    /// accounting window.
    fn sample_stats(&self, id: &str) -> impl Future<Output = Result<StatsResponse>> + Send;

    /// Restarts a container. Only a `204 No Content` answer counts as success.
    fn restart_container(&self, id: &str) -> impl Future<Output = Result<()>> + Send;

    /// Opens a following stdout/stderr log stream for a container.
    fn stream_logs(&self, id: &str) -> impl Future<Output = Result<LogReader>> + Send;
}
