#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid container id: {0:?}")]
    InvalidContainerID(String),
    #[error("unknown container state: {0:?}")]
    UnknownState(String),
}
pub type Result<T> = std::result::Result<T, Error>;
