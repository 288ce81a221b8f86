pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("log stream ended inside a frame header ({read} of 8 bytes)")]
    TruncatedHeader { read: usize },
    #[error("unknown log stream type {0}")]
    UnknownStream(u8),
    #[error("failed to read log stream: {0}")]
    Io(#[from] std::io::Error),
}
