/// Abstraction for one device BAR: an opaque addressable byte range.
///
/// Register access never fails at this level; a faulting address is a
/// platform-fatal condition the implementation deals with. Reads take
/// `&mut self` so implementations with side effects (hardware status
/// registers, software DSP models) are possible.
pub trait Bar {
    fn read(&mut self, offset: u32, buf: &mut [u8]);
    fn write(&mut self, offset: u32, buf: &[u8]);

    fn read_u32(&mut self, offset: u32) -> u32 {
        let mut buf = [0u8; 4];
        self.read(offset, &mut buf);
        u32::from_le_bytes(buf)
    }

    fn write_u32(&mut self, offset: u32, val: u32) {
        self.write(offset, &val.to_le_bytes());
    }

    fn read_u64(&mut self, offset: u32) -> u64 {
        let mut buf = [0u8; 8];
        self.read(offset, &mut buf);
        u64::from_le_bytes(buf)
    }

    fn write_u64(&mut self, offset: u32, val: u64) {
        self.write(offset, &val.to_le_bytes());
    }
}

impl<B: Bar + ?Sized> Bar for &mut B {
    fn read(&mut self, offset: u32, buf: &mut [u8]) {
        (**self).read(offset, buf)
    }

    fn write(&mut self, offset: u32, buf: &[u8]) {
        (**self).write(offset, buf)
    }
}

/// RAM-backed BAR. Out-of-range accesses read as zero and drop writes,
/// like a device that ignores unimplemented offsets.
#[derive(Debug)]
pub struct RamBar {
    bytes: Vec<u8>,
}

impl RamBar {
    pub fn new(size: usize) -> Self {
        Self {
            bytes: vec![0; size],
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl Bar for RamBar {
    fn read(&mut self, offset: u32, buf: &mut [u8]) {
        let start = offset as usize;
        for (i, b) in buf.iter_mut().enumerate() {
            *b = self.bytes.get(start + i).copied().unwrap_or(0);
        }
    }

    fn write(&mut self, offset: u32, buf: &[u8]) {
        let start = offset as usize;
        for (i, b) in buf.iter().enumerate() {
            if let Some(slot) = self.bytes.get_mut(start + i) {
                *slot = *b;
            }
        }
    }
}
