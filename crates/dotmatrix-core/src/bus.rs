//! Address-space dispatch.
//!
//! Every CPU access goes through [`Bus`]. Ownership of each of the 65536
//! addresses is decided once, while the bus is wired, by a
//! [`MemoryMapBuilder`]; the resulting [`MemoryMap`] cannot be changed
//! afterwards. The bus owns the devices themselves and the map only holds
//! [`Owner`] tags, so dispatch is a table lookup followed by a match.

use crate::{
    apu::Apu,
    cartridge::Cartridge,
    hardware::DmgRevision,
    interrupts::{IF_ADDR, Interrupt, InterruptRegisters},
    joypad::{Button, Joypad},
    memory::{Memory, Ram},
    ppu::Ppu,
    serial::Serial,
    timer::Timer,
};

pub const DMA_ADDR: u16 = 0xFF46;
const OAM_BASE: u16 = 0xFE00;
const OAM_LEN: u16 = 0xA0;

const ADDRESS_SPACE: usize = 0x10000;

/// Component responsible for an address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Owner {
    #[default]
    Unmapped,
    Cartridge,
    Ppu,
    WorkRam,
    HighRam,
    Joypad,
    Serial,
    Timer,
    Interrupts,
    Apu,
    Dma,
}

/// Mutable address table used only while wiring.
pub struct MemoryMapBuilder {
    owners: Box<[Owner]>,
}

impl MemoryMapBuilder {
    pub fn new() -> Self {
        Self {
            owners: vec![Owner::Unmapped; ADDRESS_SPACE].into_boxed_slice(),
        }
    }

    /// Assign a single address. Replaces any earlier assignment.
    pub fn map_address(&mut self, addr: u16, owner: Owner) -> &mut Self {
        self.owners[addr as usize] = owner;
        self
    }

    /// Assign `start..=end`. Replaces any earlier assignment.
    pub fn map_range(&mut self, start: u16, end: u16, owner: Owner) -> &mut Self {
        for addr in start..=end {
            self.owners[addr as usize] = owner;
        }
        self
    }

    pub fn build(self) -> MemoryMap {
        MemoryMap {
            owners: self.owners,
        }
    }
}

impl Default for MemoryMapBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Frozen address table.
pub struct MemoryMap {
    owners: Box<[Owner]>,
}

impl MemoryMap {
    /// The DMG memory map (gbdev.io/pandocs/Memory_Map.html).
    pub fn dmg() -> Self {
        let mut builder = MemoryMapBuilder::new();
        builder
            .map_range(0x0000, 0x7FFF, Owner::Cartridge)
            .map_range(0x8000, 0x9FFF, Owner::Ppu)
            .map_range(0xA000, 0xBFFF, Owner::Cartridge)
            .map_range(0xC000, 0xFDFF, Owner::WorkRam)
            .map_range(0xFE00, 0xFE9F, Owner::Ppu)
            .map_address(0xFF00, Owner::Joypad)
            .map_range(0xFF01, 0xFF02, Owner::Serial)
            .map_range(0xFF04, 0xFF07, Owner::Timer)
            .map_address(IF_ADDR, Owner::Interrupts)
            .map_range(0xFF10, 0xFF3F, Owner::Apu)
            .map_range(0xFF40, 0xFF4B, Owner::Ppu)
            .map_address(DMA_ADDR, Owner::Dma)
            .map_range(0xFF80, 0xFFFE, Owner::HighRam)
            .map_address(0xFFFF, Owner::Interrupts);
        builder.build()
    }

    #[inline]
    pub fn owner(&self, addr: u16) -> Owner {
        self.owners[addr as usize]
    }
}

pub struct Bus {
    map: MemoryMap,
    pub cart: Cartridge,
    pub ppu: Ppu,
    pub timer: Timer,
    pub serial: Serial,
    pub joypad: Joypad,
    pub apu: Apu,
    pub interrupts: InterruptRegisters,
    wram: Ram,
    hram: Ram,
    dma: u8,
}

impl Bus {
    /// Wire a bus around `cart` with every other device in its post-boot
    /// state for `revision`.
    pub fn new(cart: Cartridge, revision: DmgRevision) -> Self {
        let mut bus = Self {
            map: MemoryMap::dmg(),
            cart,
            ppu: Ppu::post_boot(),
            timer: Timer::with_div_phase(revision.boot_div_phase()),
            serial: Serial::new(),
            joypad: Joypad::new(),
            apu: Apu::post_boot(),
            interrupts: InterruptRegisters::new(),
            wram: Ram::new(0xC000, 0x2000),
            hram: Ram::new(0xFF80, 0x7F),
            dma: 0xFF,
        };
        bus.interrupts.preset_flags(0x01);
        log::debug!("bus: wired DMG memory map ({revision:?})");
        bus
    }

    /// Return every device to its post-boot state. The cartridge keeps its
    /// RAM and the map is untouched.
    pub fn reset(&mut self, revision: DmgRevision) {
        self.cart.reset();
        self.ppu = Ppu::post_boot();
        self.timer = Timer::with_div_phase(revision.boot_div_phase());
        self.serial = Serial::new();
        self.joypad = Joypad::new();
        self.apu = Apu::post_boot();
        self.interrupts = InterruptRegisters::new();
        self.interrupts.preset_flags(0x01);
        self.wram.clear();
        self.hram.clear();
        self.dma = 0xFF;
    }

    pub fn owner(&self, addr: u16) -> Owner {
        self.map.owner(addr)
    }

    fn device(&self, owner: Owner) -> Option<&dyn Memory> {
        let device: &dyn Memory = match owner {
            Owner::Cartridge => &self.cart,
            Owner::Ppu => &self.ppu,
            Owner::WorkRam => &self.wram,
            Owner::HighRam => &self.hram,
            Owner::Joypad => &self.joypad,
            Owner::Serial => &self.serial,
            Owner::Timer => &self.timer,
            Owner::Interrupts => &self.interrupts,
            Owner::Apu => &self.apu,
            Owner::Unmapped | Owner::Dma => return None,
        };
        Some(device)
    }

    fn device_mut(&mut self, owner: Owner) -> Option<&mut dyn Memory> {
        let device: &mut dyn Memory = match owner {
            Owner::Cartridge => &mut self.cart,
            Owner::Ppu => &mut self.ppu,
            Owner::WorkRam => &mut self.wram,
            Owner::HighRam => &mut self.hram,
            Owner::Joypad => &mut self.joypad,
            Owner::Serial => &mut self.serial,
            Owner::Timer => &mut self.timer,
            Owner::Interrupts => &mut self.interrupts,
            Owner::Apu => &mut self.apu,
            Owner::Unmapped | Owner::Dma => return None,
        };
        Some(device)
    }

    pub fn read_byte(&self, addr: u16) -> u8 {
        match self.map.owner(addr) {
            Owner::Dma => self.dma,
            owner => self
                .device(owner)
                .map_or(0, |device| device.read_byte(addr)),
        }
    }

    pub fn write_byte(&mut self, addr: u16, value: u8) {
        match self.map.owner(addr) {
            Owner::Dma => self.start_dma(value),
            Owner::Serial => {
                self.serial.write_byte(addr, value);
                if self.serial.take_interrupt() {
                    self.request_interrupt(Interrupt::Serial);
                }
            }
            owner => {
                if let Some(device) = self.device_mut(owner) {
                    device.write_byte(addr, value);
                }
            }
        }
    }

    pub fn read_word(&self, addr: u16) -> u16 {
        u16::from_le_bytes([self.read_byte(addr), self.read_byte(addr.wrapping_add(1))])
    }

    pub fn write_word(&mut self, addr: u16, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.write_byte(addr, lo);
        self.write_byte(addr.wrapping_add(1), hi);
    }

    /// Set the IF bit for `interrupt` with an ordinary bus write.
    pub fn request_interrupt(&mut self, interrupt: Interrupt) {
        let flags = self.read_byte(IF_ADDR);
        self.write_byte(IF_ADDR, flags | interrupt.bit());
    }

    /// Request every interrupt whose bit is set in `mask`.
    pub fn request_interrupts(&mut self, mask: u8) {
        for interrupt in Interrupt::ALL {
            if mask & interrupt.bit() != 0 {
                self.request_interrupt(interrupt);
            }
        }
    }

    pub fn tick_timer(&mut self, cycles: u32) {
        if self.timer.tick(cycles) {
            self.request_interrupt(Interrupt::Timer);
        }
    }

    pub fn step_ppu(&mut self, cycles: u32) {
        let requested = self.ppu.step(cycles);
        self.request_interrupts(requested);
    }

    pub fn set_button(&mut self, button: Button, pressed: bool) {
        if self.joypad.set_button(button, pressed) {
            self.request_interrupt(Interrupt::Joypad);
        }
    }

    /// OAM DMA, performed in full on the register write.
    fn start_dma(&mut self, value: u8) {
        self.dma = value;
        // Sources past 0xDF read the work RAM echo.
        let page = if value >= 0xE0 { value - 0x20 } else { value };
        let src = u16::from(page) << 8;
        for i in 0..OAM_LEN {
            let byte = self.read_byte(src + i);
            self.write_byte(OAM_BASE + i, byte);
        }
        log::trace!("dma: copied {src:#06X} to OAM");
    }
}
