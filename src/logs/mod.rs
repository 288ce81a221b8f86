//! Following container logs over the runtime's multiplexed stream format.
mod demux;
mod error;
mod frame;
mod session;

pub use demux::{LogDemuxer, LogLine};
pub use error::{Error, Result};
pub use frame::{FrameHeader, HEADER_LEN, MAX_FRAME_PAYLOAD, StreamKind};
pub use session::{SessionEnd, forward_logs};
