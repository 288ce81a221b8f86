use crate::{container, runtime};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    List(runtime::Error),
    #[error("failed to inspect container `{id}`: {source}")]
    Inspect {
        id: String,
        #[source]
        source: runtime::Error,
    },
    #[error("container `{id}` reported an unsupported state: {source}")]
    State {
        id: String,
        #[source]
        source: container::Error,
    },
}
