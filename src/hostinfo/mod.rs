//! Host-level metrics for the dashboard's system panel.
use std::sync::Arc;

mod models;
mod probe;

pub use models::{
    HostStat, LoadStat, MemoryStat, NetCounters, PartitionStat, SystemMetrics, UsageStat,
};
pub use probe::SysinfoProvider;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("system metrics state is poisoned")]
    Poisoned,
    #[error("system metrics task failed: {0}")]
    Task(#[source] tokio::task::JoinError),
}

/// Source of host metrics. Collection blocks; use [`collect_blocking`] from
/// async code.
pub trait SystemMetricsProvider: Send + Sync + 'static {
    fn collect(&self) -> Result<SystemMetrics>;
}

/// Runs a collection on the blocking pool.
pub async fn collect_blocking(provider: Arc<dyn SystemMetricsProvider>) -> Result<SystemMetrics> {
    tokio::task::spawn_blocking(move || provider.collect())
        .await
        .map_err(Error::Task)?
}
