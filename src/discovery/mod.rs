//! Container enumeration and enrichment.
mod enrich;
mod error;
mod labels;
mod resources;

pub use enrich::Enricher;
pub use error::{Error, Result};
pub use labels::{COMPOSE_PROJECT_LABEL, DEFAULT_COMMIT_LABEL, LabelPolicy, compose_project};
pub use resources::deploy_resources;
