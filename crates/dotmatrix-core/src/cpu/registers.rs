// CPU flag bits as documented in gbdev.io/pandocs/The_CPU_Flags.html
pub const FLAG_Z: u8 = 0x80; // Zero
pub const FLAG_N: u8 = 0x40; // Subtract
pub const FLAG_H: u8 = 0x20; // Half Carry
pub const FLAG_C: u8 = 0x10; // Carry

/// 8-bit operand selector. `(HL)` is not a register and is handled by the
/// instruction that needs it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reg8 {
    A,
    B,
    C,
    D,
    E,
    H,
    L,
}

impl Reg8 {
    /// Decode the 3-bit register field used throughout the opcode map
    /// (B, C, D, E, H, L, (HL), A). Returns `None` for the `(HL)` slot.
    #[inline]
    pub const fn from_index(index: u8) -> Option<Self> {
        match index & 0x07 {
            0 => Some(Reg8::B),
            1 => Some(Reg8::C),
            2 => Some(Reg8::D),
            3 => Some(Reg8::E),
            4 => Some(Reg8::H),
            5 => Some(Reg8::L),
            6 => None,
            _ => Some(Reg8::A),
        }
    }
}

/// Register pairs. Pairs are views over the 8-bit registers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reg16 {
    AF,
    BC,
    DE,
    HL,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Registers {
    pub a: u8,
    pub f: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
}

impl Registers {
    #[inline]
    pub fn get(&self, reg: Reg8) -> u8 {
        match reg {
            Reg8::A => self.a,
            Reg8::B => self.b,
            Reg8::C => self.c,
            Reg8::D => self.d,
            Reg8::E => self.e,
            Reg8::H => self.h,
            Reg8::L => self.l,
        }
    }

    #[inline]
    pub fn set(&mut self, reg: Reg8, value: u8) {
        match reg {
            Reg8::A => self.a = value,
            Reg8::B => self.b = value,
            Reg8::C => self.c = value,
            Reg8::D => self.d = value,
            Reg8::E => self.e = value,
            Reg8::H => self.h = value,
            Reg8::L => self.l = value,
        }
    }

    #[inline]
    pub fn pair(&self, reg: Reg16) -> u16 {
        let (hi, lo) = match reg {
            Reg16::AF => (self.a, self.f),
            Reg16::BC => (self.b, self.c),
            Reg16::DE => (self.d, self.e),
            Reg16::HL => (self.h, self.l),
        };
        u16::from_be_bytes([hi, lo])
    }

    /// Write a pair. F only keeps its upper nibble.
    #[inline]
    pub fn set_pair(&mut self, reg: Reg16, value: u16) {
        let [hi, lo] = value.to_be_bytes();
        match reg {
            Reg16::AF => {
                self.a = hi;
                self.f = lo & 0xF0;
            }
            Reg16::BC => {
                self.b = hi;
                self.c = lo;
            }
            Reg16::DE => {
                self.d = hi;
                self.e = lo;
            }
            Reg16::HL => {
                self.h = hi;
                self.l = lo;
            }
        }
    }

    #[inline]
    pub fn flag(&self, mask: u8) -> bool {
        self.f & mask != 0
    }

    #[inline]
    pub fn set_flags(&mut self, flags: u8) {
        self.f = flags & 0xF0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_are_views_over_bytes() {
        let mut regs = Registers::default();
        regs.set_pair(Reg16::HL, 0xC0DE);
        assert_eq!(regs.h, 0xC0);
        assert_eq!(regs.l, 0xDE);
        regs.set(Reg8::L, 0x01);
        assert_eq!(regs.pair(Reg16::HL), 0xC001);
    }

    #[test]
    fn low_nibble_of_f_is_always_clear() {
        let mut regs = Registers::default();
        regs.set_pair(Reg16::AF, 0x12FF);
        assert_eq!(regs.pair(Reg16::AF), 0x12F0);
    }
}
