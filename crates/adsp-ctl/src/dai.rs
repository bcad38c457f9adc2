use adsp_ipc::wire::{DaiConfig, DAI_CONFIG};
use adsp_ipc::IpcChannel;
use tracing::debug;

use crate::dsp::Dsp;
use crate::error::{CtlError, Result};
use crate::power::PowerHandle;

/// One hardware configuration a DAI link can run with, taken from the
/// topology file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DaiHwConfig {
    pub format: u32,
    pub mclk_rate: u32,
    pub bclk_rate: u32,
    pub fsync_rate: u32,
    pub tdm_slots: u32,
    pub tdm_slot_width: u32,
    pub mclk_direction: u32,
    pub rx_slots: u32,
    pub tx_slots: u32,
}

/// A physical DAI link and its candidate hardware configurations.
///
/// The machine layer selects one configuration; loading pushes it to
/// the DSP so the firmware clocks the interface accordingly.
#[derive(Debug, Clone)]
pub struct DaiLink {
    name: String,
    dai_index: u32,
    hw_configs: Vec<DaiHwConfig>,
    current: usize,
}

impl DaiLink {
    pub fn new(name: impl Into<String>, dai_index: u32, hw_configs: Vec<DaiHwConfig>) -> Self {
        assert!(!hw_configs.is_empty(), "a DAI link needs a hardware config");
        Self {
            name: name.into(),
            dai_index,
            hw_configs,
            current: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn current_hw_config(&self) -> &DaiHwConfig {
        &self.hw_configs[self.current]
    }

    pub fn select_hw_config(&mut self, index: usize) -> Result<()> {
        if index >= self.hw_configs.len() {
            return Err(CtlError::InvalidHwConfig {
                index,
                count: self.hw_configs.len(),
            });
        }
        self.current = index;
        Ok(())
    }

    /// Push the selected configuration to the DSP.
    pub fn load_hw_config<C: IpcChannel, P: PowerHandle>(
        &self,
        dsp: &mut Dsp<C, P>,
    ) -> Result<()> {
        let hw = self.hw_configs[self.current];
        let config = DaiConfig {
            dai_index: self.dai_index,
            format: hw.format,
            mclk_rate: hw.mclk_rate,
            bclk_rate: hw.bclk_rate,
            fsync_rate: hw.fsync_rate,
            tdm_slots: hw.tdm_slots,
            tdm_slot_width: hw.tdm_slot_width,
            mclk_direction: hw.mclk_direction,
            rx_slots: hw.rx_slots,
            tx_slots: hw.tx_slots,
        };
        debug!(link = %self.name, dai_index = self.dai_index, "loading DAI hardware config");

        let request = config.encode();
        let mut reply = vec![0u8; DaiConfig::reply_len()];
        dsp.powered("dai_config", |ipc| {
            ipc.send(DAI_CONFIG, &request, &mut reply)?;
            Ok(())
        })
    }
}
