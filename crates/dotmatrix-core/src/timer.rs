use crate::memory::Memory;

pub const DIV_ADDR: u16 = 0xFF04;
pub const TIMA_ADDR: u16 = 0xFF05;
pub const TMA_ADDR: u16 = 0xFF06;
pub const TAC_ADDR: u16 = 0xFF07;

/// Master cycles per DIV increment.
const DIV_PERIOD: u32 = 256;

/// TIMA periods in master cycles, indexed by TAC bits 0-1.
const TIMA_PERIODS: [u32; 4] = [1024, 16, 64, 256];

const TAC_ENABLE: u8 = 0x04;

/// Divider/timer unit.
///
/// Both counters are driven by remainder accumulators: elapsed cycles are
/// added and whole periods are subtracted, so a batch longer than one period
/// never loses its remainder.
#[derive(Debug, Clone, Default)]
pub struct Timer {
    /// Divider register (0xFF04).
    pub div: u8,
    /// Timer counter
    pub tima: u8,
    /// Timer modulo
    pub tma: u8,
    /// Timer control, lower three bits.
    pub tac: u8,
    div_counter: u32,
    tima_counter: u32,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a 16-bit internal divider phase: the upper byte becomes DIV
    /// and the lower byte is the cycles already accumulated toward the next
    /// increment.
    pub fn with_div_phase(phase: u16) -> Self {
        Self {
            div: (phase >> 8) as u8,
            div_counter: (phase & 0xFF) as u32,
            ..Self::default()
        }
    }

    #[inline]
    pub fn enabled(&self) -> bool {
        self.tac & TAC_ENABLE != 0
    }

    /// Period of the currently selected TIMA frequency.
    #[inline]
    pub fn period(&self) -> u32 {
        TIMA_PERIODS[(self.tac & 0x03) as usize]
    }

    /// Advance by `cycles` master cycles. Returns true if TIMA overflowed and
    /// the timer interrupt must be requested.
    pub fn tick(&mut self, cycles: u32) -> bool {
        self.div_counter += cycles;
        while self.div_counter >= DIV_PERIOD {
            self.div_counter -= DIV_PERIOD;
            self.div = self.div.wrapping_add(1);
        }

        if !self.enabled() {
            return false;
        }

        let period = self.period();
        let mut overflowed = false;
        self.tima_counter += cycles;
        while self.tima_counter >= period {
            self.tima_counter -= period;
            overflowed |= self.increment();
        }
        overflowed
    }

    fn increment(&mut self) -> bool {
        match self.tima.checked_add(1) {
            Some(next) => {
                self.tima = next;
                false
            }
            None => {
                self.tima = self.tma;
                true
            }
        }
    }
}

impl Memory for Timer {
    fn read_byte(&self, addr: u16) -> u8 {
        match addr {
            DIV_ADDR => self.div,
            TIMA_ADDR => self.tima,
            TMA_ADDR => self.tma,
            TAC_ADDR => self.tac | 0xF8,
            _ => 0,
        }
    }

    fn write_byte(&mut self, addr: u16, value: u8) {
        match addr {
            DIV_ADDR => {
                self.div = 0;
                self.div_counter = 0;
            }
            TIMA_ADDR => self.tima = value,
            TMA_ADDR => self.tma = value,
            TAC_ADDR => {
                // A new frequency starts a fresh full period.
                if (value ^ self.tac) & 0x03 != 0 {
                    self.tima_counter = 0;
                }
                self.tac = value & 0x07;
            }
            _ => {}
        }
    }
}
