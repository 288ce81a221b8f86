//! Full dashboard snapshots: every container, flat and grouped.
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::FeatureFlags;
use crate::container::{ContainerGroup, ContainerRecord};
use crate::discovery::{self, Enricher};
use crate::grouping::group_containers;
use crate::runtime::ContainerRuntime;

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Snapshot {
    #[serde(rename = "snapshot_time")]
    pub timestamp: DateTime<Utc>,
    pub total: usize,
    pub containers: Vec<ContainerRecord>,
    pub groups: Vec<ContainerGroup>,
    #[serde(rename = "logs_show")]
    pub logs_enabled: bool,
    #[serde(rename = "container_restart")]
    pub restart_enabled: bool,
}

impl Snapshot {
    pub fn new(
        timestamp: DateTime<Utc>,
        containers: Vec<ContainerRecord>,
        flags: &FeatureFlags,
    ) -> Self {
        Self {
            timestamp,
            total: containers.len(),
            groups: group_containers(&containers),
            containers,
            logs_enabled: flags.logs_enabled(),
            restart_enabled: flags.restart_enabled(),
        }
    }
}

/// Builds snapshots on demand against one runtime.
pub struct SnapshotService<R> {
    runtime: Arc<R>,
    enricher: Enricher,
    flags: FeatureFlags,
}

impl<R> Clone for SnapshotService<R> {
    fn clone(&self) -> Self {
        Self {
            runtime: Arc::clone(&self.runtime),
            enricher: self.enricher.clone(),
            flags: self.flags,
        }
    }
}

impl<R: ContainerRuntime> SnapshotService<R> {
    pub fn new(runtime: Arc<R>, enricher: Enricher, flags: FeatureFlags) -> Self {
        Self {
            runtime,
            enricher,
            flags,
        }
    }

    /// Enumerates and enriches every container.
    ///
    /// # Errors
    ///
    /// Fails only when the runtime cannot list containers.
    pub async fn build(&self) -> discovery::Result<Snapshot> {
        let started = std::time::Instant::now();
        let containers = self.enricher.enumerate(&self.runtime).await?;
        log::trace!(
            "built snapshot of {} containers in {:?}",
            containers.len(),
            started.elapsed()
        );
        Ok(Snapshot::new(Utc::now(), containers, &self.flags))
    }
}
