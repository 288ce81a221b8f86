use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

mod error;
mod format;
mod record;

pub use error::{Error, Result};
pub use format::{format_cpu_cores, format_memory, format_uptime};
pub use record::{
    ContainerGroup, ContainerRecord, ContainerState, DeployResources, HealthStatus,
};

/// The maximum allowed length for a [`ContainerID`].
const CONTAINER_ID_MAX_LEN: usize = 255;

/// Length of the short identifier shown on the dashboard.
pub const SHORT_ID_LEN: usize = 12;

/// A validated container reference as supplied by a client.
///
/// Accepts full ids, short ids and container names. Only ASCII alphanumerics,
/// `_`, `.` and `-` are allowed so the value can be spliced into a runtime
/// request path as-is.
///
/// # Examples
///
/// ```
/// # use creo_dashboard::container::ContainerID;
/// let id = ContainerID::new("4f1c2a9be0d3").unwrap();
/// assert_eq!(id.as_ref(), "4f1c2a9be0d3");
/// assert!(ContainerID::new("../images/json").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerID(Arc<str>);

impl ContainerID {
    /// Creates a new `ContainerID` from the given raw id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidContainerID`] if the input is empty, longer than
    /// [`CONTAINER_ID_MAX_LEN`] or contains characters outside `[A-Za-z0-9_.-]`.
    pub fn new(src: impl AsRef<str>) -> Result<Self> {
        let src = src.as_ref();
        if src.is_empty() || src.len() > CONTAINER_ID_MAX_LEN || !is_id_charset(src.as_bytes()) {
            return Err(Error::InvalidContainerID(src.to_owned()));
        }

        Ok(Self(src.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ContainerID {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ContainerID {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_id_charset(src: &[u8]) -> bool {
    src.iter()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'-'))
}

/// Returns the first [`SHORT_ID_LEN`] characters of a runtime id.
pub fn short_id(id: &str) -> &str {
    id.get(..SHORT_ID_LEN).unwrap_or(id)
}
