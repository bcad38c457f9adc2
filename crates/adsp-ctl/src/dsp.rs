use adsp_ipc::IpcChannel;
use tracing::warn;

use crate::error::{CtlError, Result};
use crate::power::PowerHandle;

/// Handle to the DSP device: the IPC channel plus its runtime power
/// state.
#[derive(Debug)]
pub struct Dsp<C: IpcChannel, P: PowerHandle> {
    ipc: C,
    pm: P,
}

impl<C: IpcChannel, P: PowerHandle> Dsp<C, P> {
    pub fn new(ipc: C, pm: P) -> Self {
        Self { ipc, pm }
    }

    pub fn ipc_mut(&mut self) -> &mut C {
        &mut self.ipc
    }

    /// Run `body` with the DSP guaranteed powered.
    ///
    /// Resume failure aborts before any IPC and releases the reference
    /// without idle-marking. A failure to re-arm autosuspend afterwards
    /// is logged and never overrides the body's result.
    pub(crate) fn powered<T>(
        &mut self,
        op: &'static str,
        body: impl FnOnce(&mut C) -> Result<T>,
    ) -> Result<T> {
        if let Err(err) = self.pm.resume() {
            warn!(op, %err, "failed to resume DSP");
            self.pm.release_no_idle();
            return Err(CtlError::Resume(err));
        }

        let result = body(&mut self.ipc);

        self.pm.mark_last_busy();
        if let Err(err) = self.pm.release_autosuspend() {
            warn!(op, %err, "failed to re-arm autosuspend");
        }
        result
    }
}
