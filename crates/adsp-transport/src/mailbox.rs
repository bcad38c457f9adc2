use crate::bar::Bar;
use crate::TransportError;

/// A byte window within a BAR used to exchange IPC payloads.
///
/// All accesses are bounds-checked against the window before touching the
/// BAR, so a bad offset can never spill into neighbouring registers.
#[derive(Debug, Clone, Copy)]
pub struct MailboxWindow {
    base: u32,
    size: u32,
}

impl MailboxWindow {
    pub fn new(base: u32, size: u32) -> Self {
        Self { base, size }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    fn checked_offset(&self, offset: u32, len: usize) -> Result<u32, TransportError> {
        let end = (offset as u64) + (len as u64);
        if end > self.size as u64 {
            return Err(TransportError::OutOfWindow {
                offset,
                len,
                window: self.size,
            });
        }
        self.base
            .checked_add(offset)
            .ok_or(TransportError::OffsetOverflow)
    }

    pub fn read(
        &self,
        bar: &mut dyn Bar,
        offset: u32,
        buf: &mut [u8],
    ) -> Result<(), TransportError> {
        let abs = self.checked_offset(offset, buf.len())?;
        bar.read(abs, buf);
        Ok(())
    }

    pub fn write(&self, bar: &mut dyn Bar, offset: u32, buf: &[u8]) -> Result<(), TransportError> {
        let abs = self.checked_offset(offset, buf.len())?;
        bar.write(abs, buf);
        Ok(())
    }
}

/// Copy `src` to a BAR offset. Whole words go through the bulk path; a
/// partial trailing word is merged with a read-modify-write so bytes
/// beyond the requested range keep their value. The DSP packs unrelated
/// fields into the same word, so the tail must not be widened to a full
/// word store.
pub fn block_write(bar: &mut dyn Bar, offset: u32, src: &[u8]) {
    let words = src.len() / 4;
    let tail = src.len() % 4;

    let (bulk, rest) = src.split_at(words * 4);
    bar.write(offset, bulk);

    if tail != 0 {
        let tail_offset = offset + (words as u32) * 4;
        let affected_mask = (1u32 << (8 * tail)) - 1;

        let mut merged = bar.read_u32(tail_offset) & !affected_mask;
        let mut incoming = [0u8; 4];
        incoming[..tail].copy_from_slice(rest);
        merged |= u32::from_le_bytes(incoming) & affected_mask;
        bar.write_u32(tail_offset, merged);
    }
}

/// Read `dst.len()` bytes from a BAR offset. Reads are never destructive,
/// so no partial-word handling is needed.
pub fn block_read(bar: &mut dyn Bar, offset: u32, dst: &mut [u8]) {
    bar.read(offset, dst);
}
