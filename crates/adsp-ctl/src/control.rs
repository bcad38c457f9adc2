use adsp_ipc::wire::{
    abi_incompatible, data_reply_len, value_reply_len, AbiBlob, ChannelValue, CtrlCmd, CtrlData,
    CtrlPayload, WireError, ABI_MAGIC, ABI_VERSION, COMP_GET_DATA, COMP_GET_VALUE, COMP_SET_DATA,
    COMP_SET_VALUE, REPLY_HDR_SIZE,
};
use adsp_ipc::IpcChannel;
use tracing::debug;

use crate::card::CardRuntime;
use crate::dsp::Dsp;
use crate::error::{CtlError, Result};
use crate::power::PowerHandle;
use crate::siggen;
use crate::volume::VolumeTable;
use crate::widget::{SwitchPolicy, WidgetGraph};

/// `{ numid, length }` prefix on extended byte transfers at the user
/// boundary.
pub const TLV_HDR_SIZE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Volume,
    Switch,
    Enum,
    Bytes,
}

/// Static description of one mixer control, fixed at topology load.
#[derive(Debug, Clone)]
pub struct ControlConfig {
    pub comp_id: u32,
    pub kind: ControlKind,
    pub channels: usize,
    pub max_bytes: usize,
    pub volume_table: Option<VolumeTable>,
    pub link_name: Option<String>,
    pub numid: u32,
}

impl ControlConfig {
    pub fn volume(comp_id: u32, channels: usize, table: VolumeTable) -> Self {
        Self {
            comp_id,
            kind: ControlKind::Volume,
            channels,
            max_bytes: 0,
            volume_table: Some(table),
            link_name: None,
            numid: 0,
        }
    }

    pub fn switch(comp_id: u32, channels: usize) -> Self {
        Self {
            comp_id,
            kind: ControlKind::Switch,
            channels,
            max_bytes: 0,
            volume_table: None,
            link_name: None,
            numid: 0,
        }
    }

    pub fn enumerated(comp_id: u32, channels: usize) -> Self {
        Self {
            comp_id,
            kind: ControlKind::Enum,
            channels,
            max_bytes: 0,
            volume_table: None,
            link_name: None,
            numid: 0,
        }
    }

    pub fn bytes(comp_id: u32, numid: u32, max_bytes: usize) -> Self {
        Self {
            comp_id,
            kind: ControlKind::Bytes,
            channels: 0,
            max_bytes,
            volume_table: None,
            link_name: None,
            numid,
        }
    }

    /// Front-end link this control's widget feeds; used by generator
    /// switches to bring the pipeline up and down.
    pub fn link_name(mut self, name: impl Into<String>) -> Self {
        self.link_name = Some(name.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyncDir {
    Set,
    Get,
}

/// One user-visible control and its host-side shadow of the DSP
/// component state.
///
/// Puts write the shadow first and then push it to the DSP; gets pull
/// the component state into the shadow before reading it out. All IPC
/// runs with the DSP held powered for the duration of the exchange.
#[derive(Debug)]
pub struct Control {
    comp_id: u32,
    kind: ControlKind,
    cmd: CtrlCmd,
    max_bytes: usize,
    volume_table: Option<VolumeTable>,
    link_name: Option<String>,
    values: Vec<ChannelValue>,
    data: AbiBlob,
}

impl Control {
    pub fn new(config: ControlConfig) -> Self {
        let cmd = match config.kind {
            ControlKind::Volume => CtrlCmd::Volume,
            ControlKind::Switch => CtrlCmd::Switch,
            ControlKind::Enum => CtrlCmd::Enum,
            ControlKind::Bytes => CtrlCmd::Binary(config.numid),
        };
        if config.kind != ControlKind::Bytes {
            assert!(config.channels > 0, "scalar control needs a channel");
        }
        let values = (0..config.channels as u32)
            .map(|channel| ChannelValue { channel, value: 0 })
            .collect();
        Self {
            comp_id: config.comp_id,
            kind: config.kind,
            cmd,
            max_bytes: config.max_bytes,
            volume_table: config.volume_table,
            link_name: config.link_name,
            values,
            data: AbiBlob::empty(),
        }
    }

    pub fn comp_id(&self) -> u32 {
        self.comp_id
    }

    pub fn kind(&self) -> ControlKind {
        self.kind
    }

    /// Host-side shadow of the per-channel values.
    pub fn cached_values(&self) -> &[ChannelValue] {
        &self.values
    }

    /// Host-side shadow of the binary blob.
    pub fn cached_data(&self) -> &AbiBlob {
        &self.data
    }

    /// Pull the component state and translate it back to mixer steps.
    /// Controls without a table report raw device units.
    pub fn volume_get<C: IpcChannel, P: PowerHandle>(
        &mut self,
        dsp: &mut Dsp<C, P>,
    ) -> Result<Vec<u32>> {
        self.sync(dsp, "volume_get", SyncDir::Get)?;
        Ok(self
            .values
            .iter()
            .map(|cv| match &self.volume_table {
                Some(table) => table.ipc_to_mixer(cv.value),
                None => cv.value,
            })
            .collect())
    }

    /// Translate mixer steps to device units and push them. The push is
    /// unconditional; the returned flag only reports whether the shadow
    /// changed.
    pub fn volume_put<C: IpcChannel, P: PowerHandle>(
        &mut self,
        dsp: &mut Dsp<C, P>,
        steps: &[u32],
    ) -> Result<bool> {
        let mut changed = false;
        for (cv, step) in self.values.iter_mut().zip(steps) {
            let value = match &self.volume_table {
                Some(table) => table.mixer_to_ipc(*step),
                None => *step,
            };
            if cv.value != value {
                changed = true;
            }
            cv.value = value;
        }
        self.sync(dsp, "volume_put", SyncDir::Set)?;
        Ok(changed)
    }

    pub fn switch_get<C: IpcChannel, P: PowerHandle>(
        &mut self,
        dsp: &mut Dsp<C, P>,
    ) -> Result<Vec<u32>> {
        self.sync(dsp, "switch_get", SyncDir::Get)?;
        Ok(self.values.iter().map(|cv| cv.value).collect())
    }

    /// Apply a switch put under the owning widget's channel policy.
    ///
    /// Gain-stage switches take every channel independently; all other
    /// widgets treat channel 0 as authoritative for the whole control.
    /// No IPC is issued when nothing changed. A changed generator
    /// switch pushes the value and then runs its pipeline trigger under
    /// the same power hold.
    pub fn switch_put<C: IpcChannel, P: PowerHandle>(
        &mut self,
        dsp: &mut Dsp<C, P>,
        graph: &dyn WidgetGraph,
        card: &mut dyn CardRuntime,
        values: &[u32],
    ) -> Result<bool> {
        let policy = SwitchPolicy::resolve(graph, self.comp_id);
        let changed = match policy {
            SwitchPolicy::PerChannel => {
                let mut changed = false;
                for (cv, value) in self.values.iter_mut().zip(values) {
                    if cv.value != *value {
                        changed = true;
                    }
                    cv.value = *value;
                }
                changed
            }
            SwitchPolicy::Generator | SwitchPolicy::Shared => {
                let value = values.first().copied().unwrap_or(0);
                let mut changed = false;
                for cv in &mut self.values {
                    if cv.value != value {
                        changed = true;
                    }
                    cv.value = value;
                }
                changed
            }
        };
        if !changed {
            return Ok(false);
        }

        match policy {
            SwitchPolicy::Generator => {
                let active = self.values[0].value != 0;
                let comp_id = self.comp_id;
                let channels = self.values.len() as u32;
                let link = self.link_name.clone();
                let msg = CtrlData {
                    comp_id,
                    cmd: self.cmd,
                    payload: CtrlPayload::Channels(self.values.clone()),
                };
                let request = msg.encode(COMP_SET_VALUE);
                let mut reply = vec![0u8; REPLY_HDR_SIZE];
                dsp.powered("switch_put", |ipc| {
                    ipc.send(COMP_SET_VALUE, &request, &mut reply)?;
                    siggen::trigger_pipeline(ipc, card, comp_id, channels, link.as_deref(), active)
                })?;
            }
            _ => self.sync(dsp, "switch_put", SyncDir::Set)?,
        }
        Ok(true)
    }

    pub fn enum_get<C: IpcChannel, P: PowerHandle>(
        &mut self,
        dsp: &mut Dsp<C, P>,
    ) -> Result<Vec<u32>> {
        self.sync(dsp, "enum_get", SyncDir::Get)?;
        Ok(self.values.iter().map(|cv| cv.value).collect())
    }

    /// Unconditional push, like volume.
    pub fn enum_put<C: IpcChannel, P: PowerHandle>(
        &mut self,
        dsp: &mut Dsp<C, P>,
        items: &[u32],
    ) -> Result<bool> {
        let mut changed = false;
        for (cv, item) in self.values.iter_mut().zip(items) {
            if cv.value != *item {
                changed = true;
            }
            cv.value = *item;
        }
        self.sync(dsp, "enum_put", SyncDir::Set)?;
        Ok(changed)
    }

    /// Pull the blob and copy it (header included) into `out`, returning
    /// the copied length. `out` must be able to take `max_bytes`.
    pub fn bytes_get<C: IpcChannel, P: PowerHandle>(
        &mut self,
        dsp: &mut Dsp<C, P>,
        out: &mut [u8],
    ) -> Result<usize> {
        if self.max_bytes > out.len() {
            return Err(CtlError::MaxExceedsCapacity {
                max: self.max_bytes,
                capacity: out.len(),
            });
        }
        self.sync(dsp, "bytes_get", SyncDir::Get)?;
        let size = self.data.total_size();
        if size > self.max_bytes {
            return Err(CtlError::BlobTooLarge {
                size,
                max: self.max_bytes,
            });
        }
        let mut buf = Vec::with_capacity(size);
        self.data.encode_into(&mut buf);
        out[..size].copy_from_slice(&buf);
        Ok(size)
    }

    /// Push a self-describing blob. `data` is the encoded blob, header
    /// first; sizes are validated before the DSP is touched. The header
    /// words pass through untouched; only the extended path inspects
    /// them.
    pub fn bytes_put<C: IpcChannel, P: PowerHandle>(
        &mut self,
        dsp: &mut Dsp<C, P>,
        data: &[u8],
    ) -> Result<()> {
        if data.len() > self.max_bytes {
            return Err(CtlError::BlobTooLarge {
                size: data.len(),
                max: self.max_bytes,
            });
        }
        let blob = AbiBlob::decode(data)?;
        self.put_blob(dsp, blob, "bytes_put")
    }

    /// Pull the blob and wrap it in a `{ numid, length }` transfer
    /// header, returning the total length written to `out`.
    pub fn ext_get<C: IpcChannel, P: PowerHandle>(
        &mut self,
        dsp: &mut Dsp<C, P>,
        out: &mut [u8],
    ) -> Result<usize> {
        // The DSP echoes these back; stamp them so an empty component
        // still yields a well-formed blob.
        self.data.magic = ABI_MAGIC;
        self.data.abi = ABI_VERSION;
        self.sync(dsp, "ext_get", SyncDir::Get)?;

        let size = self.data.total_size();
        if size > self.max_bytes {
            return Err(CtlError::BlobTooLarge {
                size,
                max: self.max_bytes,
            });
        }
        let capacity = out.len().saturating_sub(TLV_HDR_SIZE);
        if size > capacity {
            return Err(CtlError::MaxExceedsCapacity {
                max: size,
                capacity,
            });
        }
        out[0..4].copy_from_slice(&self.cmd.to_u32().to_le_bytes());
        out[4..8].copy_from_slice(&(size as u32).to_le_bytes());
        let mut buf = Vec::with_capacity(size);
        self.data.encode_into(&mut buf);
        out[TLV_HDR_SIZE..TLV_HDR_SIZE + size].copy_from_slice(&buf);
        Ok(TLV_HDR_SIZE + size)
    }

    /// Push a blob carried behind a `{ numid, length }` transfer
    /// header. The header is validated before a single payload byte is
    /// read, and the embedded blob must carry the expected magic and a
    /// compatible ABI version.
    pub fn ext_put<C: IpcChannel, P: PowerHandle>(
        &mut self,
        dsp: &mut Dsp<C, P>,
        data: &[u8],
    ) -> Result<()> {
        if data.len() < TLV_HDR_SIZE {
            return Err(CtlError::TruncatedTransfer {
                length: TLV_HDR_SIZE,
                available: data.len(),
            });
        }
        let numid = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
        let length = u32::from_le_bytes([data[4], data[5], data[6], data[7]]) as usize;
        if length > self.max_bytes {
            return Err(CtlError::HeaderTooLong {
                length,
                max: self.max_bytes,
            });
        }
        let expected = self.cmd.to_u32();
        if numid != expected {
            return Err(CtlError::HeaderIdMismatch { numid, expected });
        }
        let available = data.len() - TLV_HDR_SIZE;
        if length > available {
            return Err(CtlError::TruncatedTransfer { length, available });
        }
        let blob = AbiBlob::decode(&data[TLV_HDR_SIZE..TLV_HDR_SIZE + length])?;
        if blob.magic != ABI_MAGIC {
            return Err(CtlError::BadMagic { magic: blob.magic });
        }
        if abi_incompatible(ABI_VERSION, blob.abi) {
            return Err(CtlError::IncompatibleAbi { abi: blob.abi });
        }
        self.put_blob(dsp, blob, "ext_put")
    }

    fn put_blob<C: IpcChannel, P: PowerHandle>(
        &mut self,
        dsp: &mut Dsp<C, P>,
        blob: AbiBlob,
        op: &'static str,
    ) -> Result<()> {
        if blob.total_size() > self.max_bytes {
            return Err(CtlError::BlobTooLarge {
                size: blob.total_size(),
                max: self.max_bytes,
            });
        }
        self.data = blob;
        self.sync(dsp, op, SyncDir::Set)
    }

    /// Exchange the shadow with the live component, powered for the
    /// duration of the IPC.
    fn sync<C: IpcChannel, P: PowerHandle>(
        &mut self,
        dsp: &mut Dsp<C, P>,
        op: &'static str,
        dir: SyncDir,
    ) -> Result<()> {
        let payload = match self.kind {
            ControlKind::Bytes => CtrlPayload::Data(self.data.clone()),
            _ => CtrlPayload::Channels(self.values.clone()),
        };
        let (msg_cmd, reply_len) = match (&payload, dir) {
            (CtrlPayload::Channels(_), SyncDir::Set) => (COMP_SET_VALUE, REPLY_HDR_SIZE),
            (CtrlPayload::Channels(v), SyncDir::Get) => (COMP_GET_VALUE, value_reply_len(v.len())),
            (CtrlPayload::Data(_), SyncDir::Set) => (COMP_SET_DATA, REPLY_HDR_SIZE),
            (CtrlPayload::Data(_), SyncDir::Get) => (COMP_GET_DATA, data_reply_len(self.max_bytes)),
        };
        let msg = CtrlData {
            comp_id: self.comp_id,
            cmd: self.cmd,
            payload,
        };
        let request = msg.encode(msg_cmd);
        let mut reply = vec![0u8; reply_len];
        debug!(comp_id = self.comp_id, cmd = msg_cmd, op, "control sync");
        dsp.powered(op, |ipc| {
            ipc.send(msg_cmd, &request, &mut reply)?;
            Ok(())
        })?;

        if dir == SyncDir::Get {
            let decoded = CtrlData::decode(&reply[REPLY_HDR_SIZE..])?;
            match decoded.payload {
                CtrlPayload::Channels(chanv) if self.kind != ControlKind::Bytes => {
                    self.values = chanv;
                }
                CtrlPayload::Data(blob) if self.kind == ControlKind::Bytes => {
                    self.data = blob;
                }
                _ => return Err(WireError::PayloadKindMismatch.into()),
            }
        }
        Ok(())
    }
}
