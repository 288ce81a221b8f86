use std::collections::BTreeMap;
use std::str::FromStr;

use super::Error;

/// Lifecycle state of a container as reported by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerState {
    Created,
    Running,
    Paused,
    Restarting,
    Removing,
    Exited,
    Dead,
}

impl ContainerState {
    pub fn is_running(self) -> bool {
        matches!(self, ContainerState::Running)
    }
}

impl FromStr for ContainerState {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let state = match s {
            "created" => Self::Created,
            "running" => Self::Running,
            "paused" => Self::Paused,
            "restarting" => Self::Restarting,
            "removing" => Self::Removing,
            "exited" => Self::Exited,
            "dead" => Self::Dead,
            other => return Err(Error::UnknownState(other.to_owned())),
        };
        Ok(state)
    }
}

/// Health check status; [`HealthStatus::None`] when no health check is defined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub enum HealthStatus {
    #[default]
    #[serde(rename = "")]
    None,
    #[serde(rename = "starting")]
    Starting,
    #[serde(rename = "healthy")]
    Healthy,
    #[serde(rename = "unhealthy")]
    Unhealthy,
}

impl HealthStatus {
    /// Maps the runtime's health string. Anything unrecognised (including the
    /// runtime's own `"none"`) means no health check.
    pub fn from_runtime(status: &str) -> Self {
        match status {
            "starting" => Self::Starting,
            "healthy" => Self::Healthy,
            "unhealthy" => Self::Unhealthy,
            _ => Self::None,
        }
    }
}

/// Resource limits and reservations configured for a container.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct DeployResources {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_limit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_limit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_reservation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_reservation: Option<String>,
}

impl DeployResources {
    pub fn is_empty(&self) -> bool {
        self.cpu_limit.is_none()
            && self.memory_limit.is_none()
            && self.cpu_reservation.is_none()
            && self.memory_reservation.is_none()
    }

    /// Returns `None` when no limit or reservation is set.
    pub fn non_empty(self) -> Option<Self> {
        if self.is_empty() { None } else { Some(self) }
    }
}

/// Identity and observed state of one container at enumeration time.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerRecord {
    #[serde(rename = "ID")]
    pub id: String,
    pub name: String,
    pub image: String,
    pub tag_commit: String,
    pub image_created_at: String,
    pub created_at: String,
    pub uptime: String,
    pub state: ContainerState,
    pub health: HealthStatus,
    #[serde(rename = "Run")]
    pub running: bool,
    #[serde(rename = "Restart")]
    pub restarted: bool,
    pub labels: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compose_project: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deploy_resources: Option<DeployResources>,
}

/// Containers sharing one compose project.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ContainerGroup {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub project_name: String,
    pub containers: Vec<ContainerRecord>,
}
