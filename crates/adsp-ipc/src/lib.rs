//! IPC message protocol and blocking request/reply channel for the audio
//! DSP.
//!
//! The wire format is deliberately small and endian-stable
//! (little-endian): every message starts with a `{ size, cmd }` header,
//! every reply with the same header plus a signed status. Requests and
//! replies are fixed-size per command; the caller sizes the reply buffer.

mod channel;
pub mod wire;

pub use channel::{IpcChannel, IpcError, MailboxIpc};
