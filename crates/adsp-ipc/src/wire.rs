//! Wire-level message definitions shared by the host and the DSP
//! firmware.

use thiserror::Error;

// Command codes. The top nibble selects the message class, bits 23:16
// the command within the class; the rest is command-specific.
const GLB_TYPE_SHIFT: u32 = 28;
const MSG_TYPE_SHIFT: u32 = 16;

pub const GLB_COMP_MSG: u32 = 0x6 << GLB_TYPE_SHIFT;
pub const GLB_STREAM_MSG: u32 = 0x3 << GLB_TYPE_SHIFT;
pub const GLB_DAI_MSG: u32 = 0x8 << GLB_TYPE_SHIFT;

pub const COMP_SET_VALUE: u32 = GLB_COMP_MSG | (0x001 << MSG_TYPE_SHIFT);
pub const COMP_GET_VALUE: u32 = GLB_COMP_MSG | (0x002 << MSG_TYPE_SHIFT);
pub const COMP_SET_DATA: u32 = GLB_COMP_MSG | (0x003 << MSG_TYPE_SHIFT);
pub const COMP_GET_DATA: u32 = GLB_COMP_MSG | (0x004 << MSG_TYPE_SHIFT);

pub const STREAM_PCM_PARAMS: u32 = GLB_STREAM_MSG | (0x001 << MSG_TYPE_SHIFT);
pub const STREAM_TRIG_START: u32 = GLB_STREAM_MSG | (0x002 << MSG_TYPE_SHIFT);
pub const STREAM_PCM_FREE: u32 = GLB_STREAM_MSG | (0x003 << MSG_TYPE_SHIFT);

pub const DAI_CONFIG: u32 = GLB_DAI_MSG | (0x001 << MSG_TYPE_SHIFT);

/// `{ size, cmd }` prefix carried by every request.
pub const MSG_HDR_SIZE: usize = 8;
/// `{ size, cmd, status }` prefix carried by every reply.
pub const REPLY_HDR_SIZE: usize = 12;

// Self-describing binary blob header: magic, ABI version, payload size.
pub const ABI_HDR_SIZE: usize = 12;
pub const ABI_MAGIC: u32 = 0x00505344; // "DSP\0"

const ABI_MAJOR_SHIFT: u32 = 24;
const ABI_MINOR_SHIFT: u32 = 12;

pub const fn abi_version(major: u32, minor: u32, patch: u32) -> u32 {
    (major << ABI_MAJOR_SHIFT) | (minor << ABI_MINOR_SHIFT) | patch
}

pub const ABI_VERSION: u32 = abi_version(3, 6, 0);

/// Two ABI versions are incompatible when their major fields differ.
pub fn abi_incompatible(host: u32, other: u32) -> bool {
    (host >> ABI_MAJOR_SHIFT) != (other >> ABI_MAJOR_SHIFT)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    #[error("unexpected end of message")]
    UnexpectedEof,

    #[error("unknown payload tag {0}")]
    UnknownTag(u32),

    #[error("reply carried the wrong payload kind for this control")]
    PayloadKindMismatch,

    #[error("declared size {declared} exceeds the {available} available bytes")]
    DeclaredSizeTooLarge { declared: usize, available: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyHeader {
    pub size: u32,
    pub cmd: u32,
    pub status: i32,
}

impl ReplyHeader {
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        push_u32(out, self.size);
        push_u32(out, self.cmd);
        push_u32(out, self.status as u32);
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        let mut r = Reader::new(bytes);
        Ok(Self {
            size: r.read_u32()?,
            cmd: r.read_u32()?,
            status: r.read_u32()? as i32,
        })
    }
}

/// Which value a scalar control element carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtrlCmd {
    Volume,
    Switch,
    Enum,
    /// Opaque per-control identifier for byte-blob controls; doubles as
    /// the TLV `numid` at the user boundary.
    Binary(u32),
}

impl CtrlCmd {
    pub fn to_u32(self) -> u32 {
        match self {
            CtrlCmd::Volume => 0,
            CtrlCmd::Switch => 1,
            CtrlCmd::Enum => 2,
            CtrlCmd::Binary(id) => id,
        }
    }

    pub fn from_u32(v: u32) -> Self {
        match v {
            0 => CtrlCmd::Volume,
            1 => CtrlCmd::Switch,
            2 => CtrlCmd::Enum,
            id => CtrlCmd::Binary(id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelValue {
    pub channel: u32,
    pub value: u32,
}

/// Self-describing binary blob mirrored between the host scratch buffer
/// and the DSP. `data.len()` is the payload size the header declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbiBlob {
    pub magic: u32,
    pub abi: u32,
    pub data: Vec<u8>,
}

impl AbiBlob {
    pub fn empty() -> Self {
        Self {
            magic: ABI_MAGIC,
            abi: ABI_VERSION,
            data: Vec::new(),
        }
    }

    /// Payload size plus the blob header's own footprint.
    pub fn total_size(&self) -> usize {
        self.data.len() + ABI_HDR_SIZE
    }

    pub fn encode_into(&self, out: &mut Vec<u8>) {
        push_u32(out, self.magic);
        push_u32(out, self.abi);
        push_u32(out, self.data.len() as u32);
        out.extend_from_slice(&self.data);
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        let mut r = Reader::new(bytes);
        let magic = r.read_u32()?;
        let abi = r.read_u32()?;
        let declared = r.read_u32()? as usize;
        if declared > r.remaining() {
            return Err(WireError::DeclaredSizeTooLarge {
                declared,
                available: r.remaining(),
            });
        }
        let data = r.read_bytes(declared)?.to_vec();
        Ok(Self { magic, abi, data })
    }
}

const CTRL_PAYLOAD_CHANNELS: u32 = 0;
const CTRL_PAYLOAD_DATA: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CtrlPayload {
    Channels(Vec<ChannelValue>),
    Data(AbiBlob),
}

/// Control-data record exchanged with the DSP for every control kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CtrlData {
    pub comp_id: u32,
    pub cmd: CtrlCmd,
    pub payload: CtrlPayload,
}

impl CtrlData {
    /// Encode as a complete framed message for `msg_cmd` (one of the
    /// COMP_* command codes).
    pub fn encode(&self, msg_cmd: u32) -> Vec<u8> {
        let mut body = Vec::new();
        push_u32(&mut body, self.comp_id);
        push_u32(&mut body, self.cmd.to_u32());
        match &self.payload {
            CtrlPayload::Channels(chanv) => {
                push_u32(&mut body, CTRL_PAYLOAD_CHANNELS);
                push_u32(&mut body, chanv.len() as u32);
                for cv in chanv {
                    push_u32(&mut body, cv.channel);
                    push_u32(&mut body, cv.value);
                }
            }
            CtrlPayload::Data(blob) => {
                push_u32(&mut body, CTRL_PAYLOAD_DATA);
                push_u32(&mut body, blob.total_size() as u32);
                blob.encode_into(&mut body);
            }
        }

        let mut out = Vec::with_capacity(MSG_HDR_SIZE + body.len());
        push_u32(&mut out, (MSG_HDR_SIZE + body.len()) as u32);
        push_u32(&mut out, msg_cmd);
        out.extend_from_slice(&body);
        out
    }

    /// Decode the control-data body that follows a reply header.
    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        let mut r = Reader::new(bytes);
        let comp_id = r.read_u32()?;
        let cmd = CtrlCmd::from_u32(r.read_u32()?);
        let tag = r.read_u32()?;
        let num_elems = r.read_u32()? as usize;
        let payload = match tag {
            CTRL_PAYLOAD_CHANNELS => {
                if num_elems > r.remaining() / 8 {
                    return Err(WireError::DeclaredSizeTooLarge {
                        declared: num_elems * 8,
                        available: r.remaining(),
                    });
                }
                let mut chanv = Vec::with_capacity(num_elems);
                for _ in 0..num_elems {
                    chanv.push(ChannelValue {
                        channel: r.read_u32()?,
                        value: r.read_u32()?,
                    });
                }
                CtrlPayload::Channels(chanv)
            }
            CTRL_PAYLOAD_DATA => CtrlPayload::Data(AbiBlob::decode(r.rest())?),
            other => return Err(WireError::UnknownTag(other)),
        };
        Ok(Self {
            comp_id,
            cmd,
            payload,
        })
    }
}

/// Fixed part of the control-data body: comp_id, cmd, payload tag,
/// element count.
pub const CTRL_FIXED_SIZE: usize = 16;

/// Reply length for a COMP_GET_VALUE over `channels` channels.
pub fn value_reply_len(channels: usize) -> usize {
    REPLY_HDR_SIZE + CTRL_FIXED_SIZE + channels * 8
}

/// Reply length for a COMP_GET_DATA whose blob (header included) may be
/// up to `max_bytes`.
pub fn data_reply_len(max_bytes: usize) -> usize {
    REPLY_HDR_SIZE + CTRL_FIXED_SIZE + max_bytes
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Playback,
    Capture,
}

impl Direction {
    fn to_u32(self) -> u32 {
        match self {
            Direction::Playback => 0,
            Direction::Capture => 1,
        }
    }
}

/// PCM parameter negotiation for a stream pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmParams {
    pub comp_id: u32,
    pub channels: u32,
    pub direction: Direction,
}

impl PcmParams {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        push_u32(&mut out, (MSG_HDR_SIZE + 12) as u32);
        push_u32(&mut out, STREAM_PCM_PARAMS);
        push_u32(&mut out, self.comp_id);
        push_u32(&mut out, self.channels);
        push_u32(&mut out, self.direction.to_u32());
        out
    }

    pub fn reply_len() -> usize {
        // Reply header plus the negotiated host position offset.
        REPLY_HDR_SIZE + 4
    }
}

/// Stream trigger message (start / free).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamMsg {
    pub comp_id: u32,
}

impl StreamMsg {
    pub fn encode(&self, msg_cmd: u32) -> Vec<u8> {
        let mut out = Vec::new();
        push_u32(&mut out, (MSG_HDR_SIZE + 4) as u32);
        push_u32(&mut out, msg_cmd);
        push_u32(&mut out, self.comp_id);
        out
    }

    pub fn reply_len() -> usize {
        REPLY_HDR_SIZE
    }
}

/// Hardware configuration for one DAI link, sent on config load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DaiConfig {
    pub dai_index: u32,
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

impl DaiConfig {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        push_u32(&mut out, (MSG_HDR_SIZE + 40) as u32);
        push_u32(&mut out, DAI_CONFIG);
        for field in [
            self.dai_index,
            self.format,
            self.mclk_rate,
            self.bclk_rate,
            self.fsync_rate,
            self.tdm_slots,
            self.tdm_slot_width,
            self.mclk_direction,
            self.rx_slots,
            self.tx_slots,
        ] {
            push_u32(&mut out, field);
        }
        out
    }

    pub fn reply_len() -> usize {
        REPLY_HDR_SIZE
    }
}

pub(crate) fn push_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

pub(crate) struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub fn rest(&self) -> &'a [u8] {
        &self.bytes[self.pos..]
    }

    pub fn read_u32(&mut self) -> Result<u32, WireError> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], WireError> {
        if self.remaining() < len {
            return Err(WireError::UnexpectedEof);
        }
        let out = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ctrl_data_channels_round_trip() {
        let msg = CtrlData {
            comp_id: 7,
            cmd: CtrlCmd::Volume,
            payload: CtrlPayload::Channels(vec![
                ChannelValue {
                    channel: 0,
                    value: 0x20,
                },
                ChannelValue {
                    channel: 1,
                    value: 0x24,
                },
            ]),
        };

        let framed = msg.encode(COMP_SET_VALUE);
        assert_eq!(framed.len(), MSG_HDR_SIZE + CTRL_FIXED_SIZE + 16);
        // Header: total size then command.
        assert_eq!(
            u32::from_le_bytes(framed[0..4].try_into().unwrap()) as usize,
            framed.len()
        );
        assert_eq!(
            u32::from_le_bytes(framed[4..8].try_into().unwrap()),
            COMP_SET_VALUE
        );

        let decoded = CtrlData::decode(&framed[MSG_HDR_SIZE..]).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn ctrl_data_blob_round_trip() {
        let msg = CtrlData {
            comp_id: 3,
            cmd: CtrlCmd::Binary(0x100),
            payload: CtrlPayload::Data(AbiBlob {
                magic: ABI_MAGIC,
                abi: ABI_VERSION,
                data: vec![1, 2, 3, 4, 5],
            }),
        };

        let framed = msg.encode(COMP_SET_DATA);
        let decoded = CtrlData::decode(&framed[MSG_HDR_SIZE..]).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn abi_blob_rejects_size_beyond_buffer() {
        let mut bytes = Vec::new();
        push_u32(&mut bytes, ABI_MAGIC);
        push_u32(&mut bytes, ABI_VERSION);
        push_u32(&mut bytes, 100); // declares more payload than present
        bytes.extend_from_slice(&[0; 10]);

        assert!(matches!(
            AbiBlob::decode(&bytes),
            Err(WireError::DeclaredSizeTooLarge {
                declared: 100,
                available: 10
            })
        ));
    }

    #[test]
    fn abi_version_compatibility_tracks_major_only() {
        let host = abi_version(3, 6, 0);
        assert!(!abi_incompatible(host, abi_version(3, 0, 0)));
        assert!(!abi_incompatible(host, abi_version(3, 9, 12)));
        assert!(abi_incompatible(host, abi_version(2, 6, 0)));
        assert!(abi_incompatible(host, abi_version(4, 6, 0)));
    }

    #[test]
    fn reply_header_round_trip() {
        let hdr = ReplyHeader {
            size: 12,
            cmd: STREAM_TRIG_START,
            status: -22,
        };
        let mut bytes = Vec::new();
        hdr.encode_into(&mut bytes);
        assert_eq!(bytes.len(), REPLY_HDR_SIZE);
        assert_eq!(ReplyHeader::decode(&bytes).unwrap(), hdr);
    }

    #[test]
    fn command_codes_are_distinct() {
        let codes = [
            COMP_SET_VALUE,
            COMP_GET_VALUE,
            COMP_SET_DATA,
            COMP_GET_DATA,
            STREAM_PCM_PARAMS,
            STREAM_TRIG_START,
            STREAM_PCM_FREE,
            DAI_CONFIG,
        ];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
