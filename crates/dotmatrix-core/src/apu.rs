//! Sound register file.
//!
//! Channels are not synthesized; this keeps the 0xFF10-0xFF3F registers
//! readable the way software expects, including the write-only bits that
//! always read back as 1 and the NR52 master power switch.

use crate::memory::Memory;

pub const NR52_ADDR: u16 = 0xFF26;
const REG_BASE: u16 = 0xFF10;
const WAVE_RAM: std::ops::RangeInclusive<u16> = 0xFF30..=0xFF3F;

/// Trigger registers (NRx4) in channel order.
const TRIGGER_REGS: [u16; 4] = [0xFF14, 0xFF19, 0xFF1E, 0xFF23];

/// Register values left by the DMG boot ROM.
const POST_BOOT: [(u16, u8); 19] = [
    (0xFF10, 0x80),
    (0xFF11, 0xBF),
    (0xFF12, 0xF3),
    (0xFF13, 0xFF),
    (0xFF14, 0xBF),
    (0xFF16, 0x3F),
    (0xFF17, 0x00),
    (0xFF18, 0xFF),
    (0xFF19, 0xBF),
    (0xFF1A, 0x7F),
    (0xFF1B, 0xFF),
    (0xFF1C, 0x9F),
    (0xFF1D, 0xFF),
    (0xFF1E, 0xBF),
    (0xFF20, 0xFF),
    (0xFF21, 0x00),
    (0xFF22, 0x00),
    (0xFF23, 0xBF),
    (0xFF24, 0x77),
];

pub struct Apu {
    regs: [u8; 0x20],
    wave_ram: [u8; 0x10],
    nr51: u8,
    powered: bool,
    /// NR52 bits 0-3.
    channels_on: u8,
}

impl Apu {
    pub fn new() -> Self {
        Self {
            regs: [0; 0x20],
            wave_ram: [0; 0x10],
            nr51: 0,
            powered: false,
            channels_on: 0,
        }
    }

    /// Registers as the boot ROM leaves them, with channel 1 still playing
    /// the startup chime.
    pub fn post_boot() -> Self {
        let mut apu = Self::new();
        apu.powered = true;
        for (addr, value) in POST_BOOT {
            apu.regs[(addr - REG_BASE) as usize] = value;
        }
        apu.nr51 = 0xF3;
        apu.channels_on = 0x01;
        apu
    }

    pub fn powered(&self) -> bool {
        self.powered
    }

    fn read_mask(addr: u16) -> u8 {
        match addr {
            0xFF10 => 0x80,
            0xFF11 | 0xFF16 => 0x3F,
            0xFF13 | 0xFF18 | 0xFF1B | 0xFF1D | 0xFF20 => 0xFF,
            0xFF14 | 0xFF19 | 0xFF1E | 0xFF23 => 0xBF,
            0xFF1A => 0x7F,
            0xFF1C => 0x9F,
            0xFF12 | 0xFF17 | 0xFF21 | 0xFF22 | 0xFF24 | 0xFF25 => 0x00,
            NR52_ADDR => 0x70,
            _ => 0xFF,
        }
    }

    fn power_off(&mut self) {
        self.regs.fill(0);
        self.nr51 = 0;
        self.channels_on = 0;
        self.powered = false;
        log::debug!("apu: powered off");
    }
}

impl Default for Apu {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory for Apu {
    fn read_byte(&self, addr: u16) -> u8 {
        if WAVE_RAM.contains(&addr) {
            return self.wave_ram[(addr - 0xFF30) as usize];
        }
        let value = match addr {
            NR52_ADDR => (u8::from(self.powered) << 7) | self.channels_on,
            0xFF25 => self.nr51,
            0xFF10..=0xFF2F => self.regs[(addr - REG_BASE) as usize],
            _ => 0,
        };
        value | Self::read_mask(addr)
    }

    fn write_byte(&mut self, addr: u16, value: u8) {
        if WAVE_RAM.contains(&addr) {
            self.wave_ram[(addr - 0xFF30) as usize] = value;
            return;
        }
        if addr == NR52_ADDR {
            if value & 0x80 == 0 {
                if self.powered {
                    self.power_off();
                }
            } else {
                self.powered = true;
            }
            return;
        }
        if !self.powered || !(0xFF10..=0xFF2F).contains(&addr) {
            return;
        }

        if addr == 0xFF25 {
            self.nr51 = value;
        } else {
            self.regs[(addr - REG_BASE) as usize] = value;
        }
        if value & 0x80 != 0
            && let Some(channel) = TRIGGER_REGS.iter().position(|&reg| reg == addr)
        {
            self.channels_on |= 1 << channel;
        }
    }
}
