use adsp_ipc::wire::WireError;
use adsp_ipc::IpcError;
use thiserror::Error;

use crate::power::PowerError;

pub type Result<T> = std::result::Result<T, CtlError>;

#[derive(Debug, Error)]
pub enum CtlError {
    /// The DSP could not be resumed; the operation was aborted before
    /// any IPC.
    #[error("failed to resume the DSP: {0}")]
    Resume(#[source] PowerError),

    #[error("ipc: {0}")]
    Ipc(#[from] IpcError),

    #[error("malformed control data: {0}")]
    Wire(#[from] WireError),

    #[error("control max of {max} bytes exceeds the {capacity}-byte transfer capacity")]
    MaxExceedsCapacity { max: usize, capacity: usize },

    #[error("blob of {size} bytes exceeds the control max of {max} bytes")]
    BlobTooLarge { size: usize, max: usize },

    #[error("transfer header length {length} exceeds the control max of {max} bytes")]
    HeaderTooLong { length: usize, max: usize },

    #[error("transfer header id {numid:#x} does not match control command {expected:#x}")]
    HeaderIdMismatch { numid: u32, expected: u32 },

    #[error("transfer declares {length} bytes but only {available} were supplied")]
    TruncatedTransfer { length: usize, available: usize },

    #[error("bad blob magic {magic:#010x}")]
    BadMagic { magic: u32 },

    #[error("incompatible blob ABI version {abi:#010x}")]
    IncompatibleAbi { abi: u32 },

    #[error("hardware config index {index} out of range ({count} configs)")]
    InvalidHwConfig { index: usize, count: usize },
}
