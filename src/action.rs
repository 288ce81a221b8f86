//! One-shot container actions.
use crate::api::models::{Status, StatusMessage};
use crate::config::FeatureFlags;
use crate::container::ContainerID;
use crate::runtime::ContainerRuntime;

pub const RESTART_SUCCESS: &str = "Container restarted successfully";

#[derive(Debug, thiserror::Error)]
#[error("container restart is disabled")]
pub struct FeatureDisabled;

/// Restarts a container if the restart feature is enabled.
///
/// Exactly one restart request is sent. Upstream failures are not errors of
/// this function; they come back as a [`Status::Error`] message.
///
/// # Errors
///
/// Returns [`FeatureDisabled`] without contacting the runtime when restarts
/// are switched off.
pub async fn restart<R: ContainerRuntime>(
    runtime: &R,
    flags: &FeatureFlags,
    id: &ContainerID,
) -> Result<StatusMessage, FeatureDisabled> {
    if !flags.restart_enabled() {
        return Err(FeatureDisabled);
    }

    log::info!("restarting container `{id}`");
    let message = match runtime.restart_container(id.as_str()).await {
        Ok(()) => StatusMessage {
            status: Status::Success,
            message: RESTART_SUCCESS.to_owned(),
        },
        Err(err) => {
            log::error!("failed to restart container `{id}`: {err}");
            StatusMessage {
                status: Status::Error,
                message: format!("Failed to restart container: {}", err.upstream_message()),
            }
        }
    };
    Ok(message)
}
