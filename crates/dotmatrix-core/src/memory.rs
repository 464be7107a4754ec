/// A component that answers reads and writes for the addresses the bus
/// routes to it.
///
/// Implementors receive the full 16-bit address, not an offset into their
/// own window, so a single device can own several disjoint ranges (the PPU
/// owns VRAM, OAM and its register block).
pub trait Memory {
    fn read_byte(&self, addr: u16) -> u8;
    fn write_byte(&mut self, addr: u16, value: u8);
}

/// Plain RAM window starting at `base`.
///
/// Addresses past the end of the backing store wrap around, which is how the
/// echo region at 0xE000-0xFDFF mirrors work RAM.
#[derive(Debug, Clone)]
pub struct Ram {
    data: Vec<u8>,
    base: u16,
}

impl Ram {
    pub fn new(base: u16, size: usize) -> Self {
        Self {
            data: vec![0; size.max(1)],
            base,
        }
    }

    #[inline]
    fn index(&self, addr: u16) -> usize {
        addr.wrapping_sub(self.base) as usize % self.data.len()
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
    }
}

impl Memory for Ram {
    fn read_byte(&self, addr: u16) -> u8 {
        self.data[self.index(addr)]
    }

    fn write_byte(&mut self, addr: u16, value: u8) {
        let idx = self.index(addr);
        self.data[idx] = value;
    }
}
