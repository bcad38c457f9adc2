/// Mapping between user-visible mixer steps and DSP device units.
///
/// The table is ordered ascending; the index is the mixer step and the
/// entry the device-unit value sent to the DSP. Reads use a ceiling
/// search, writes a clamped index lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeTable {
    steps: Vec<u32>,
}

impl VolumeTable {
    /// `steps` must be non-empty and monotonic non-decreasing.
    pub fn new(steps: Vec<u32>) -> Self {
        assert!(!steps.is_empty(), "volume table must not be empty");
        debug_assert!(steps.windows(2).all(|w| w[0] <= w[1]));
        Self { steps }
    }

    pub fn max_step(&self) -> u32 {
        (self.steps.len() - 1) as u32
    }

    /// Mixer step → device units, clamped to the last table entry for
    /// out-of-range steps.
    pub fn mixer_to_ipc(&self, step: u32) -> u32 {
        match self.steps.get(step as usize) {
            Some(v) => *v,
            None => self.steps[self.steps.len() - 1],
        }
    }

    /// Device units → mixer step: the first step whose entry is >= the
    /// device value, or the last step when the value exceeds every
    /// entry.
    pub fn ipc_to_mixer(&self, value: u32) -> u32 {
        self.steps
            .iter()
            .position(|s| *s >= value)
            .unwrap_or(self.steps.len() - 1) as u32
    }
}
