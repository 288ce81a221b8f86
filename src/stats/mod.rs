//! Point-in-time CPU and memory samples for running containers.
use std::sync::Arc;

mod cpu;

pub use cpu::compute_cpu_cores;

use crate::container;
use crate::fanout::FanOut;
use crate::runtime::{self, ContainerRuntime, ContainerSummary, StatsResponse};

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ContainerStats {
    pub id: String,
    pub cpu_usage_cores: f64,
    pub memory_usage_bytes: u64,
}

impl ContainerStats {
    pub fn from_response(id: &str, stats: &StatsResponse) -> Self {
        Self {
            id: container::short_id(id).to_owned(),
            cpu_usage_cores: compute_cpu_cores(stats),
            memory_usage_bytes: stats.memory_stats.usage.unwrap_or(0),
        }
    }
}

/// Samples stats for running containers on a bounded [`FanOut`].
#[derive(Debug, Clone, Default)]
pub struct Sampler {
    fanout: FanOut,
}

impl Sampler {
    pub fn new(fanout: FanOut) -> Self {
        Self { fanout }
    }

    /// Samples one container.
    ///
    /// # Errors
    ///
    /// Returns the runtime error unchanged.
    pub async fn sample<R: ContainerRuntime>(
        runtime: &R,
        id: &str,
    ) -> runtime::Result<ContainerStats> {
        let stats = runtime.sample_stats(id).await?;
        Ok(ContainerStats::from_response(id, &stats))
    }

    /// Lists the containers and samples the running ones.
    ///
    /// # Errors
    ///
    /// Only a failed listing is an error.
    pub async fn sample_all<R: ContainerRuntime>(
        &self,
        runtime: &Arc<R>,
    ) -> runtime::Result<Vec<ContainerStats>> {
        let summaries = runtime.list_containers().await?;
        Ok(self.sample_running(runtime, summaries).await)
    }

    /// Samples the running containers among `summaries`, in their order.
    ///
    /// Containers that stopped or vanished in the meantime are skipped
    /// quietly; other failures are logged.
    pub async fn sample_running<R: ContainerRuntime>(
        &self,
        runtime: &Arc<R>,
        summaries: Vec<ContainerSummary>,
    ) -> Vec<ContainerStats> {
        let ids: Vec<String> = summaries
            .into_iter()
            .filter(|summary| summary.state == "running")
            .map(|summary| summary.id)
            .collect();

        let runtime = Arc::clone(runtime);
        let slots = self
            .fanout
            .run(ids, move |id| {
                let runtime = Arc::clone(&runtime);
                let id = id.clone();
                async move {
                    Self::sample(runtime.as_ref(), &id)
                        .await
                        .map_err(|err| (id, err))
                }
            })
            .await;

        slots
            .into_iter()
            .flatten()
            .filter_map(|result| match result {
                Ok(stats) => Some(stats),
                Err((id, err)) if err.is_not_running() => {
                    log::debug!("container `{id}` stopped before sampling: {err}");
                    None
                }
                Err((id, err)) => {
                    log::warn!("failed to sample stats of container `{id}`: {err}");
                    None
                }
            })
            .collect()
    }
}
