use adsp_transport::regs::{
    Doorbell, MAILBOX_INBOX_OFFSET, MAILBOX_OUTBOX_OFFSET, MAILBOX_SIZE, REG_IPC_ACK,
    REG_IPC_INITIATOR,
};
use adsp_transport::{Bar, MailboxWindow, TransportError};
use thiserror::Error;
use tracing::trace;

use crate::wire::{ReplyHeader, WireError, REPLY_HDR_SIZE};

#[derive(Debug, Error)]
pub enum IpcError {
    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    #[error("request of {len} bytes exceeds the {outbox}-byte outbox")]
    RequestTooLarge { len: usize, outbox: u32 },

    #[error("reply buffer of {len} bytes exceeds the {inbox}-byte inbox")]
    ReplyTooLarge { len: usize, inbox: u32 },

    #[error("reply buffer of {len} bytes cannot hold a reply header")]
    ReplyTooShort { len: usize },

    #[error("timed out waiting for the DSP to complete command {cmd:#010x}")]
    Timeout { cmd: u32 },

    #[error("DSP returned status {status} for command {cmd:#010x}")]
    Dsp { cmd: u32, status: i32 },

    #[error("malformed reply: {0}")]
    Wire(#[from] WireError),
}

/// Synchronous request/reply exchange with the DSP.
///
/// `send` blocks the caller until the DSP acknowledges or the transport
/// fails; at most one request is in flight per invocation. On failure
/// the reply buffer contents are unspecified.
pub trait IpcChannel {
    fn send(&mut self, cmd: u32, request: &[u8], reply: &mut [u8]) -> Result<(), IpcError>;
}

/// Mailbox-backed channel: request bytes go to the outbox window, the
/// host→DSP doorbell is rung, and completion is polled on the
/// acknowledge register before the reply is read from the inbox.
#[derive(Debug)]
pub struct MailboxIpc<B: Bar> {
    bar: B,
    outbox: MailboxWindow,
    inbox: MailboxWindow,
    spin_budget: u32,
}

impl<B: Bar> MailboxIpc<B> {
    pub fn new(bar: B) -> Self {
        Self::with_windows(
            bar,
            MailboxWindow::new(MAILBOX_OUTBOX_OFFSET, MAILBOX_SIZE),
            MailboxWindow::new(MAILBOX_INBOX_OFFSET, MAILBOX_SIZE),
        )
    }

    pub fn with_windows(bar: B, outbox: MailboxWindow, inbox: MailboxWindow) -> Self {
        Self {
            bar,
            outbox,
            inbox,
            spin_budget: 1_000_000,
        }
    }

    pub fn spin_budget(mut self, budget: u32) -> Self {
        self.spin_budget = budget;
        self
    }

    pub fn bar_mut(&mut self) -> &mut B {
        &mut self.bar
    }
}

impl<B: Bar> IpcChannel for MailboxIpc<B> {
    fn send(&mut self, cmd: u32, request: &[u8], reply: &mut [u8]) -> Result<(), IpcError> {
        if request.len() > self.outbox.size() as usize {
            return Err(IpcError::RequestTooLarge {
                len: request.len(),
                outbox: self.outbox.size(),
            });
        }
        if reply.len() > self.inbox.size() as usize {
            return Err(IpcError::ReplyTooLarge {
                len: reply.len(),
                inbox: self.inbox.size(),
            });
        }
        if reply.len() < REPLY_HDR_SIZE {
            return Err(IpcError::ReplyTooShort { len: reply.len() });
        }

        trace!(cmd, len = request.len(), "sending IPC");
        self.outbox.write(&mut self.bar, 0, request)?;
        self.bar
            .write_u32(REG_IPC_INITIATOR, Doorbell::BUSY.bits());

        let mut spins = 0u32;
        loop {
            let ack = Doorbell::from_bits_truncate(self.bar.read_u32(REG_IPC_ACK));
            if ack.contains(Doorbell::DONE) {
                break;
            }
            spins += 1;
            if spins >= self.spin_budget {
                return Err(IpcError::Timeout { cmd });
            }
            std::hint::spin_loop();
        }

        self.inbox.read(&mut self.bar, 0, reply)?;
        // Acknowledge completion (write-1-to-clear) so the DSP may post
        // the next message.
        self.bar.write_u32(REG_IPC_ACK, Doorbell::DONE.bits());

        let hdr = ReplyHeader::decode(reply)?;
        if hdr.status < 0 {
            return Err(IpcError::Dsp {
                cmd,
                status: hdr.status,
            });
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::testutil::FakeDspBar;
    use super::*;
    use crate::wire::{StreamMsg, STREAM_TRIG_START};

    fn ok_reply(cmd: u32) -> Vec<u8> {
        let mut out = Vec::new();
        ReplyHeader {
            size: REPLY_HDR_SIZE as u32,
            cmd,
            status: 0,
        }
        .encode_into(&mut out);
        out
    }

    #[test]
    fn send_round_trips_through_the_mailbox() {
        let bar = FakeDspBar::new(|cmd, request| {
            assert_eq!(cmd, STREAM_TRIG_START);
            assert_eq!(request.len(), 12);
            ok_reply(cmd)
        });
        let mut ipc = MailboxIpc::new(bar);

        let msg = StreamMsg { comp_id: 5 }.encode(STREAM_TRIG_START);
        let mut reply = vec![0u8; StreamMsg::reply_len()];
        ipc.send(STREAM_TRIG_START, &msg, &mut reply).unwrap();

        let hdr = ReplyHeader::decode(&reply).unwrap();
        assert_eq!(hdr.cmd, STREAM_TRIG_START);
        assert_eq!(hdr.status, 0);
        // The channel acked DONE.
        assert_eq!(ipc.bar_mut().mem.read_u32(REG_IPC_ACK), 0);
    }

    #[test]
    fn dsp_error_status_is_surfaced() {
        let bar = FakeDspBar::new(|cmd, _| {
            let mut out = Vec::new();
            ReplyHeader {
                size: REPLY_HDR_SIZE as u32,
                cmd,
                status: -22,
            }
            .encode_into(&mut out);
            out
        });
        let mut ipc = MailboxIpc::new(bar);

        let msg = StreamMsg { comp_id: 1 }.encode(STREAM_TRIG_START);
        let mut reply = vec![0u8; StreamMsg::reply_len()];
        let err = ipc.send(STREAM_TRIG_START, &msg, &mut reply).unwrap_err();
        assert!(matches!(err, IpcError::Dsp { status: -22, .. }));
    }

    #[test]
    fn unserviced_doorbell_times_out() {
        // A plain RamBar never raises DONE.
        let mut ipc = MailboxIpc::new(adsp_transport::RamBar::new(0x4000)).spin_budget(100);

        let msg = StreamMsg { comp_id: 1 }.encode(STREAM_TRIG_START);
        let mut reply = vec![0u8; StreamMsg::reply_len()];
        let err = ipc.send(STREAM_TRIG_START, &msg, &mut reply).unwrap_err();
        assert!(matches!(err, IpcError::Timeout { .. }));
    }

    #[test]
    fn oversized_request_is_rejected_before_any_traffic() {
        let bar = FakeDspBar::new(|_, _| unreachable!("no IPC expected"));
        let mut ipc = MailboxIpc::new(bar);

        let request = vec![0u8; 0x1001];
        let mut reply = vec![0u8; REPLY_HDR_SIZE];
        let err = ipc.send(0, &request, &mut reply).unwrap_err();
        assert!(matches!(err, IpcError::RequestTooLarge { .. }));
    }
}
