//! Low-level transport primitives for the audio DSP: typed register I/O
//! over a BAR, mailbox byte-window access, and block copies with sub-word
//! tail handling.

mod bar;
mod mailbox;
pub mod regs;

pub use bar::{Bar, RamBar};
pub use mailbox::{block_read, block_write, MailboxWindow};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("mailbox access out of window: offset={offset} len={len} window_size={window}")]
    OutOfWindow { offset: u32, len: usize, window: u32 },

    #[error("integer overflow while computing a mailbox offset")]
    OffsetOverflow,
}
