use thiserror::Error;

#[derive(Debug, Error)]
pub enum PowerError {
    #[error("resume failed with status {0}")]
    Resume(i32),

    #[error("autosuspend re-arm failed with status {0}")]
    Autosuspend(i32),
}

/// Runtime power management for the DSP device.
///
/// Usage counting and reentrancy are the implementation's concern; this
/// layer only guarantees matched acquire/release ordering around every
/// control access.
pub trait PowerHandle {
    /// Take a usage reference and bring the DSP to a powered state,
    /// blocking until the transition completes.
    fn resume(&mut self) -> Result<(), PowerError>;

    /// Record activity so the autosuspend timer is debounced from now.
    fn mark_last_busy(&mut self);

    /// Drop the usage reference and re-arm deferred autosuspend.
    fn release_autosuspend(&mut self) -> Result<(), PowerError>;

    /// Drop the usage reference without touching the idle timer; used
    /// when resume itself failed.
    fn release_no_idle(&mut self);
}
