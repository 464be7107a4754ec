//! Arithmetic and logic with exact LR35902 flag behavior.
//!
//! Every function is pure: it takes operands (and the current flags where
//! some of them survive) and returns the result with the new F value.

use super::registers::{FLAG_C, FLAG_H, FLAG_N, FLAG_Z};

#[inline]
fn zero(value: u8) -> u8 {
    if value == 0 { FLAG_Z } else { 0 }
}

#[inline]
fn flag_if(condition: bool, flag: u8) -> u8 {
    if condition { flag } else { 0 }
}

/// ADD/ADC. Half carry includes the incoming carry.
pub fn add(a: u8, b: u8, carry: bool) -> (u8, u8) {
    let c = u8::from(carry);
    let result = a.wrapping_add(b).wrapping_add(c);
    let half = (a & 0x0F) + (b & 0x0F) + c > 0x0F;
    let full = a as u16 + b as u16 + c as u16 > 0xFF;
    (
        result,
        zero(result) | flag_if(half, FLAG_H) | flag_if(full, FLAG_C),
    )
}

/// SUB/SBC/CP. Half carry is a borrow into bit 4 including the carry.
pub fn sub(a: u8, b: u8, carry: bool) -> (u8, u8) {
    let c = u8::from(carry);
    let result = a.wrapping_sub(b).wrapping_sub(c);
    let half = (a & 0x0F) < (b & 0x0F) + c;
    let full = (a as u16) < b as u16 + c as u16;
    (
        result,
        zero(result) | FLAG_N | flag_if(half, FLAG_H) | flag_if(full, FLAG_C),
    )
}

pub fn and(a: u8, b: u8) -> (u8, u8) {
    let result = a & b;
    (result, zero(result) | FLAG_H)
}

pub fn or(a: u8, b: u8) -> (u8, u8) {
    let result = a | b;
    (result, zero(result))
}

pub fn xor(a: u8, b: u8) -> (u8, u8) {
    let result = a ^ b;
    (result, zero(result))
}

/// INC r. Carry is preserved.
pub fn inc(value: u8, flags: u8) -> (u8, u8) {
    let result = value.wrapping_add(1);
    (
        result,
        (flags & FLAG_C) | zero(result) | flag_if(value & 0x0F == 0x0F, FLAG_H),
    )
}

/// DEC r. Carry is preserved.
pub fn dec(value: u8, flags: u8) -> (u8, u8) {
    let result = value.wrapping_sub(1);
    (
        result,
        (flags & FLAG_C) | zero(result) | FLAG_N | flag_if(value & 0x0F == 0, FLAG_H),
    )
}

/// ADD HL,rr. Z is preserved, H from bit 11, C from bit 15.
pub fn add16(hl: u16, value: u16, flags: u8) -> (u16, u8) {
    let result = hl.wrapping_add(value);
    let half = (hl & 0x0FFF) + (value & 0x0FFF) > 0x0FFF;
    let full = hl as u32 + value as u32 > 0xFFFF;
    (
        result,
        (flags & FLAG_Z) | flag_if(half, FLAG_H) | flag_if(full, FLAG_C),
    )
}

/// SP plus a signed offset, shared by ADD SP,e and LD HL,SP+e.
///
/// Flags come from the unsigned low byte addition: bit 3 and bit 7 carries
/// recovered with `sp ^ offset ^ result`. Z and N are always clear.
pub fn add_sp_offset(sp: u16, offset: u8) -> (u16, u8) {
    let extended = offset as i8 as i16 as u16;
    let result = sp.wrapping_add(extended);
    let carries = sp ^ extended ^ result;
    (
        result,
        flag_if(carries & 0x0010 != 0, FLAG_H) | flag_if(carries & 0x0100 != 0, FLAG_C),
    )
}

pub fn rlc(value: u8) -> (u8, u8) {
    let result = value.rotate_left(1);
    (result, zero(result) | flag_if(value & 0x80 != 0, FLAG_C))
}

pub fn rrc(value: u8) -> (u8, u8) {
    let result = value.rotate_right(1);
    (result, zero(result) | flag_if(value & 0x01 != 0, FLAG_C))
}

pub fn rl(value: u8, carry: bool) -> (u8, u8) {
    let result = (value << 1) | u8::from(carry);
    (result, zero(result) | flag_if(value & 0x80 != 0, FLAG_C))
}

pub fn rr(value: u8, carry: bool) -> (u8, u8) {
    let result = (value >> 1) | (u8::from(carry) << 7);
    (result, zero(result) | flag_if(value & 0x01 != 0, FLAG_C))
}

pub fn sla(value: u8) -> (u8, u8) {
    let result = value << 1;
    (result, zero(result) | flag_if(value & 0x80 != 0, FLAG_C))
}

/// Arithmetic shift: bit 7 is kept.
pub fn sra(value: u8) -> (u8, u8) {
    let result = (value >> 1) | (value & 0x80);
    (result, zero(result) | flag_if(value & 0x01 != 0, FLAG_C))
}

pub fn srl(value: u8) -> (u8, u8) {
    let result = value >> 1;
    (result, zero(result) | flag_if(value & 0x01 != 0, FLAG_C))
}

pub fn swap(value: u8) -> (u8, u8) {
    let result = value.rotate_left(4);
    (result, zero(result))
}

/// BIT b,r. Returns only the new flags; carry is preserved.
pub fn bit(index: u8, value: u8, flags: u8) -> u8 {
    (flags & FLAG_C) | FLAG_H | flag_if(value & (1 << index) == 0, FLAG_Z)
}

/// Decimal adjust after an addition or subtraction.
///
/// After an addition the correction is driven by the flags and by the
/// digits themselves; after a subtraction only by the flags. Carry is set
/// by a 0x60 correction and never cleared.
pub fn daa(a: u8, flags: u8) -> (u8, u8) {
    let mut result = a;
    let mut carry = flags & FLAG_C != 0;
    let half = flags & FLAG_H != 0;

    if flags & FLAG_N == 0 {
        if carry || result > 0x99 {
            result = result.wrapping_add(0x60);
            carry = true;
        }
        if half || result & 0x0F > 0x09 {
            result = result.wrapping_add(0x06);
        }
    } else {
        if carry {
            result = result.wrapping_sub(0x60);
        }
        if half {
            result = result.wrapping_sub(0x06);
        }
    }

    (
        result,
        zero(result) | (flags & FLAG_N) | flag_if(carry, FLAG_C),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_sets_every_flag_on_full_overflow() {
        assert_eq!(add(0x3A, 0xC6, false), (0x00, FLAG_Z | FLAG_H | FLAG_C));
    }

    #[test]
    fn sub_of_equal_values_is_zero_without_borrow() {
        assert_eq!(sub(0x3E, 0x3E, false), (0x00, FLAG_Z | FLAG_N));
    }

    #[test]
    fn carry_in_participates_in_half_carry() {
        assert_eq!(add(0x0E, 0x01, true), (0x10, FLAG_H));
        assert_eq!(sub(0x10, 0x00, true), (0x0F, FLAG_N | FLAG_H));
        assert_eq!(sub(0x00, 0xFF, true), (0x00, FLAG_Z | FLAG_N | FLAG_H | FLAG_C));
    }

    #[test]
    fn logic_ops() {
        assert_eq!(and(0xF0, 0x0F), (0x00, FLAG_Z | FLAG_H));
        assert_eq!(or(0x00, 0x00), (0x00, FLAG_Z));
        assert_eq!(xor(0xFF, 0x0F), (0xF0, 0));
    }

    #[test]
    fn inc_dec_keep_carry() {
        assert_eq!(inc(0x0F, FLAG_C), (0x10, FLAG_C | FLAG_H));
        assert_eq!(inc(0xFF, 0), (0x00, FLAG_Z | FLAG_H));
        assert_eq!(dec(0x10, FLAG_C), (0x0F, FLAG_C | FLAG_N | FLAG_H));
        assert_eq!(dec(0x01, 0), (0x00, FLAG_Z | FLAG_N));
    }

    #[test]
    fn add16_uses_bits_11_and_15() {
        assert_eq!(add16(0x0FFF, 0x0001, FLAG_Z), (0x1000, FLAG_Z | FLAG_H));
        assert_eq!(add16(0xFFFF, 0x0001, 0), (0x0000, FLAG_H | FLAG_C));
        assert_eq!(add16(0x1000, 0x1000, FLAG_N), (0x2000, 0));
    }

    #[test]
    fn sp_offset_flags_follow_low_byte() {
        assert_eq!(add_sp_offset(0xFFF8, 0x08), (0x0000, FLAG_H | FLAG_C));
        assert_eq!(add_sp_offset(0x0000, 0xFF), (0xFFFF, 0));
        assert_eq!(add_sp_offset(0x00FF, 0xFF), (0x00FE, FLAG_H | FLAG_C));
        assert_eq!(add_sp_offset(0x1000, 0x01), (0x1001, 0));
    }

    #[test]
    fn shifts_and_rotates() {
        assert_eq!(rlc(0x80), (0x01, FLAG_C));
        assert_eq!(rrc(0x01), (0x80, FLAG_C));
        assert_eq!(rl(0x80, false), (0x00, FLAG_Z | FLAG_C));
        assert_eq!(rr(0x00, true), (0x80, 0));
        assert_eq!(sla(0xC0), (0x80, FLAG_C));
        assert_eq!(sra(0x81), (0xC0, FLAG_C));
        assert_eq!(srl(0x81), (0x40, FLAG_C));
        assert_eq!(swap(0xF1), (0x1F, 0));
        assert_eq!(swap(0x00), (0x00, FLAG_Z));
    }

    #[test]
    fn bit_test_preserves_carry() {
        assert_eq!(bit(7, 0x7F, FLAG_C | FLAG_N), FLAG_Z | FLAG_H | FLAG_C);
        assert_eq!(bit(0, 0x01, 0), FLAG_H);
    }

    #[test]
    fn daa_after_addition() {
        // 0x45 + 0x38 = 0x7D -> 83
        let (sum, flags) = add(0x45, 0x38, false);
        assert_eq!(daa(sum, flags), (0x83, 0));
        // 0x99 + 0x01 = 0x9A -> 00 with carry
        let (sum, flags) = add(0x99, 0x01, false);
        assert_eq!(daa(sum, flags), (0x00, FLAG_Z | FLAG_C));
    }

    #[test]
    fn daa_after_subtraction() {
        // 0x42 - 0x09 = 0x39 (half borrow) -> 33
        let (diff, flags) = sub(0x42, 0x09, false);
        assert_eq!(daa(diff, flags), (0x33, FLAG_N));
        // 0x10 - 0x20 = 0xF0 (borrow) -> 90, carry kept
        let (diff, flags) = sub(0x10, 0x20, false);
        assert_eq!(daa(diff, flags), (0x90, FLAG_N | FLAG_C));
    }
}
