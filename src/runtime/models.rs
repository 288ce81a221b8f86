//! Subsets of the Docker Engine API payloads consumed by the dashboard.
//!
//! Only fields that are read are declared; everything else in the runtime's
//! responses is ignored during deserialization. Missing fields default so
//! older engines and compatible runtimes (e.g. Podman) decode as well.

use std::collections::HashMap;

/// One entry of `GET /containers/json?all=1`.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ContainerSummary {
    pub id: String,
    pub names: Vec<String>,
    pub image: String,
    #[serde(rename = "ImageID")]
    pub image_id: String,
    pub created: i64,
    pub state: String,
    pub status: String,
    #[serde(deserialize_with = "null_as_default")]
    pub labels: HashMap<String, String>,
}

impl ContainerSummary {
    /// First name with the leading `/` separators stripped.
    pub fn display_name(&self) -> &str {
        self.names
            .first()
            .map(|name| name.trim_start_matches('/'))
            .unwrap_or_default()
    }
}

/// `GET /containers/{id}/json`.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ContainerInspect {
    pub created: String,
    pub state: InspectState,
    pub host_config: HostConfig,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct InspectState {
    pub status: String,
    pub running: bool,
    pub started_at: String,
    pub finished_at: String,
    pub health: Option<InspectHealth>,
    pub restarting: bool,
    pub restart_count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct InspectHealth {
    pub status: String,
}

/// Resource settings from `HostConfig`. Zero means "not configured".
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct HostConfig {
    pub nano_cpus: i64,
    pub cpu_quota: i64,
    pub cpu_period: i64,
    pub cpu_shares: i64,
    pub memory: i64,
    pub memory_reservation: i64,
}

/// `GET /images/{id}/json`.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ImageInspect {
    pub created: String,
    #[serde(deserialize_with = "null_as_default")]
    pub repo_tags: Vec<String>,
}

/// `GET /containers/{id}/stats?stream=false`.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct StatsResponse {
    pub cpu_stats: CpuStats,
    pub precpu_stats: CpuStats,
    pub memory_stats: MemoryStats,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct CpuStats {
    pub cpu_usage: CpuUsage,
    pub system_cpu_usage: Option<u64>,
    pub online_cpus: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct CpuUsage {
    pub total_usage: u64,
    pub percpu_usage: Option<Vec<u64>>,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct MemoryStats {
    pub usage: Option<u64>,
}

/// Error payload returned by the runtime on non-success responses.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct ErrorMessage {
    pub message: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + serde::Deserialize<'de>,
{
    let value: Option<T> = serde::Deserialize::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}
