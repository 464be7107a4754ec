use crate::memory::Memory;

/// Address of the interrupt flag register (IF).
pub const IF_ADDR: u16 = 0xFF0F;
/// Address of the interrupt enable register (IE).
pub const IE_ADDR: u16 = 0xFFFF;

const INTERRUPT_MASK: u8 = 0x1F;

/// Interrupt sources in dispatch priority order (gbdev.io/pandocs/Interrupts.html).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interrupt {
    VBlank = 0,
    LcdStat = 1,
    Timer = 2,
    Serial = 3,
    Joypad = 4,
}

impl Interrupt {
    pub const ALL: [Interrupt; 5] = [
        Interrupt::VBlank,
        Interrupt::LcdStat,
        Interrupt::Timer,
        Interrupt::Serial,
        Interrupt::Joypad,
    ];

    #[inline]
    pub const fn bit(self) -> u8 {
        1 << self as u8
    }

    /// Fixed handler address: 0x40, 0x48, 0x50, 0x58, 0x60.
    #[inline]
    pub const fn vector(self) -> u16 {
        0x40 + 8 * self as u16
    }

    /// Lowest set bit of `pending` wins.
    pub fn highest_priority(pending: u8) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|interrupt| pending & interrupt.bit() != 0)
    }
}

/// IF and IE as seen by the bus.
#[derive(Debug, Default, Clone)]
pub struct InterruptRegisters {
    flags: u8,
    enable: u8,
    flags_changed: bool,
}

impl InterruptRegisters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flags(&self) -> u8 {
        self.flags
    }

    pub fn enable(&self) -> u8 {
        self.enable
    }

    /// Requested and enabled sources (`IE & IF`).
    pub fn pending(&self) -> u8 {
        self.flags & self.enable & INTERRUPT_MASK
    }

    /// Returns whether a write changed IF since the last call, and resets the
    /// marker. A halted CPU wakes on this even with IME cleared.
    pub fn take_flags_changed(&mut self) -> bool {
        std::mem::take(&mut self.flags_changed)
    }

    /// Set IF without marking it as changed; used for the post-boot state.
    pub(crate) fn preset_flags(&mut self, flags: u8) {
        self.flags = flags & INTERRUPT_MASK;
        self.flags_changed = false;
    }
}

impl Memory for InterruptRegisters {
    fn read_byte(&self, addr: u16) -> u8 {
        match addr {
            IF_ADDR => self.flags | 0xE0,
            IE_ADDR => self.enable,
            _ => 0,
        }
    }

    fn write_byte(&mut self, addr: u16, value: u8) {
        match addr {
            IF_ADDR => {
                let flags = value & INTERRUPT_MASK;
                if flags != self.flags {
                    self.flags_changed = true;
                }
                self.flags = flags;
            }
            IE_ADDR => self.enable = value,
            _ => {}
        }
    }
}
