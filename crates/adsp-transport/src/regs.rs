//! Doorbell register layout and bit definitions for the DSP IPC block.

use bitflags::bitflags;

/// Host → DSP doorbell (host IPC initiator).
pub const REG_IPC_INITIATOR: u32 = 0x48;
/// DSP → host acknowledge/target register.
pub const REG_IPC_ACK: u32 = 0x4C;

/// Default mailbox windows within the DSP BAR.
pub const MAILBOX_OUTBOX_OFFSET: u32 = 0x1000;
pub const MAILBOX_INBOX_OFFSET: u32 = 0x2000;
pub const MAILBOX_SIZE: u32 = 0x1000;

bitflags! {
    /// Bits shared by the initiator and acknowledge registers.
    ///
    /// BUSY is set by the host to hand a request to the DSP; DONE is set
    /// by the DSP when the reply is in the inbox and cleared by the host
    /// (write-1-to-clear) once the reply has been consumed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Doorbell: u32 {
        const BUSY = 1 << 31;
        const DONE = 1 << 30;
    }
}
