//! Opcode tables.
//!
//! Both tables are built at compile time and indexed directly by opcode.
//! Executors decode their operands from the opcode bits, so one function
//! serves a whole row or column of the opcode map, and return the master
//! cycles the instruction actually took.

use super::{
    Cpu, alu,
    registers::{FLAG_C, FLAG_H, FLAG_N, FLAG_Z, Reg8, Reg16},
};
use crate::bus::Bus;

/// First byte of every two-byte CB instruction.
pub const PREFIX: u8 = 0xCB;

pub type Execute = fn(&mut Cpu, &mut Bus, u8) -> u32;

#[derive(Clone, Copy)]
pub struct Instruction {
    pub opcode: u8,
    pub mnemonic: &'static str,
    /// Bytes including the opcode (and the CB prefix).
    pub length: u8,
    pub execute: Execute,
}

impl std::fmt::Debug for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instruction")
            .field("opcode", &format_args!("{:#04X}", self.opcode))
            .field("mnemonic", &self.mnemonic)
            .field("length", &self.length)
            .finish()
    }
}

pub static PRIMARY: [Option<Instruction>; 256] = build_primary();
pub static PREFIXED: [Option<Instruction>; 256] = build_prefixed();

const fn build_primary() -> [Option<Instruction>; 256] {
    let mut table = [None; 256];
    let mut op = 0;
    while op < 256 {
        if let Some(execute) = primary_executor(op as u8) {
            table[op] = Some(Instruction {
                opcode: op as u8,
                mnemonic: MNEMONICS[op],
                length: primary_length(op as u8),
                execute,
            });
        }
        op += 1;
    }
    table
}

const fn build_prefixed() -> [Option<Instruction>; 256] {
    let mut table = [None; 256];
    let mut op = 0;
    while op < 256 {
        let execute: Execute = match op >> 6 {
            0 => cb_shift,
            1 => cb_bit,
            2 => cb_res,
            _ => cb_set,
        };
        table[op] = Some(Instruction {
            opcode: op as u8,
            mnemonic: CB_MNEMONICS[op],
            length: 2,
            execute,
        });
        op += 1;
    }
    table
}

const fn primary_length(op: u8) -> u8 {
    match op {
        0x01 | 0x11 | 0x21 | 0x31 | 0x08 | 0xC2 | 0xC3 | 0xC4 | 0xCA | 0xCC | 0xCD | 0xD2
        | 0xD4 | 0xDA | 0xDC | 0xEA | 0xFA => 3,
        0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E | 0x10 | 0x18 | 0x20 | 0x28
        | 0x30 | 0x38 | 0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE | 0xE0 | 0xF0
        | 0xE8 | 0xF8 | PREFIX => 2,
        _ => 1,
    }
}

/// Executor for each primary opcode. The CB prefix and the eleven unused
/// opcodes have none.
const fn primary_executor(op: u8) -> Option<Execute> {
    let execute: Execute = match op {
        0x00 => nop,
        0x10 => stop,
        0x76 => halt,
        0xF3 => di,
        0xFB => ei,

        0x01 | 0x11 | 0x21 | 0x31 => ld_rr_d16,
        0x02 | 0x12 | 0x22 | 0x32 => ld_ind_a,
        0x0A | 0x1A | 0x2A | 0x3A => ld_a_ind,
        0x03 | 0x13 | 0x23 | 0x33 => inc_rr,
        0x0B | 0x1B | 0x2B | 0x3B => dec_rr,
        0x09 | 0x19 | 0x29 | 0x39 => add_hl_rr,
        0x08 => ld_a16_sp,

        0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => inc_r,
        0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x35 | 0x3D => dec_r,
        0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => ld_r_d8,

        0x07 | 0x0F | 0x17 | 0x1F => rotate_a,
        0x27 => daa,
        0x2F => cpl,
        0x37 => scf,
        0x3F => ccf,

        0x18 => jr,
        0x20 | 0x28 | 0x30 | 0x38 => jr_cc,

        0x40..=0x7F => ld_r_r,
        0x80..=0xBF => alu_r,
        0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => alu_d8,

        0xC0 | 0xC8 | 0xD0 | 0xD8 => ret_cc,
        0xC9 => ret,
        0xD9 => reti,
        0xC2 | 0xCA | 0xD2 | 0xDA => jp_cc,
        0xC3 => jp,
        0xE9 => jp_hl,
        0xC4 | 0xCC | 0xD4 | 0xDC => call_cc,
        0xCD => call,
        0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => rst,
        0xC1 | 0xD1 | 0xE1 | 0xF1 => pop,
        0xC5 | 0xD5 | 0xE5 | 0xF5 => push,

        0xE0 => ldh_a8_a,
        0xF0 => ldh_a_a8,
        0xE2 => ld_c_ind_a,
        0xF2 => ld_a_c_ind,
        0xEA => ld_a16_a,
        0xFA => ld_a_a16,
        0xE8 => add_sp_e,
        0xF8 => ld_hl_sp_e,
        0xF9 => ld_sp_hl,

        _ => return None,
    };
    Some(execute)
}

// Operand helpers. The 3-bit register field uses slot 6 for (HL).

const HL_SLOT: u8 = 6;

#[inline]
fn read_r(cpu: &Cpu, bus: &Bus, index: u8) -> u8 {
    match Reg8::from_index(index) {
        Some(reg) => cpu.regs.get(reg),
        None => bus.read_byte(cpu.regs.pair(Reg16::HL)),
    }
}

#[inline]
fn write_r(cpu: &mut Cpu, bus: &mut Bus, index: u8, value: u8) {
    match Reg8::from_index(index) {
        Some(reg) => cpu.regs.set(reg, value),
        None => bus.write_byte(cpu.regs.pair(Reg16::HL), value),
    }
}

/// BC, DE, HL, SP selected by opcode bits 4-5.
#[inline]
fn read_rr(cpu: &Cpu, op: u8) -> u16 {
    match (op >> 4) & 0x03 {
        0 => cpu.regs.pair(Reg16::BC),
        1 => cpu.regs.pair(Reg16::DE),
        2 => cpu.regs.pair(Reg16::HL),
        _ => cpu.sp,
    }
}

#[inline]
fn write_rr(cpu: &mut Cpu, op: u8, value: u16) {
    match (op >> 4) & 0x03 {
        0 => cpu.regs.set_pair(Reg16::BC, value),
        1 => cpu.regs.set_pair(Reg16::DE, value),
        2 => cpu.regs.set_pair(Reg16::HL, value),
        _ => cpu.sp = value,
    }
}

/// BC, DE, HL, AF selected by opcode bits 4-5 (PUSH/POP).
#[inline]
fn stack_pair(op: u8) -> Reg16 {
    match (op >> 4) & 0x03 {
        0 => Reg16::BC,
        1 => Reg16::DE,
        2 => Reg16::HL,
        _ => Reg16::AF,
    }
}

/// NZ, Z, NC, C selected by opcode bits 3-4.
#[inline]
fn condition(cpu: &Cpu, op: u8) -> bool {
    match (op >> 3) & 0x03 {
        0 => !cpu.regs.flag(FLAG_Z),
        1 => cpu.regs.flag(FLAG_Z),
        2 => !cpu.regs.flag(FLAG_C),
        _ => cpu.regs.flag(FLAG_C),
    }
}

#[inline]
fn hl_cost(index: u8, register: u32, memory: u32) -> u32 {
    if index & 0x07 == HL_SLOT { memory } else { register }
}

// Control

fn nop(_cpu: &mut Cpu, _bus: &mut Bus, _op: u8) -> u32 {
    4
}

/// STOP is treated as a two-byte NOP that resets the divider.
fn stop(cpu: &mut Cpu, bus: &mut Bus, _op: u8) -> u32 {
    log::warn!("STOP executed at {:04X}; continuing as NOP", cpu.pc);
    bus.write_byte(crate::timer::DIV_ADDR, 0);
    4
}

fn halt(cpu: &mut Cpu, bus: &mut Bus, _op: u8) -> u32 {
    cpu.halted = true;
    bus.interrupts.take_flags_changed();
    4
}

fn di(cpu: &mut Cpu, _bus: &mut Bus, _op: u8) -> u32 {
    cpu.disable_ime();
    4
}

fn ei(cpu: &mut Cpu, _bus: &mut Bus, _op: u8) -> u32 {
    cpu.schedule_ime();
    4
}

// 16-bit loads and arithmetic

fn ld_rr_d16(cpu: &mut Cpu, bus: &mut Bus, op: u8) -> u32 {
    let value = cpu.imm16(bus);
    write_rr(cpu, op, value);
    12
}

/// Address for LD (BC)/(DE)/(HL+)/(HL-), applying the HL post-step.
fn indirect_addr(cpu: &mut Cpu, op: u8) -> u16 {
    match (op >> 4) & 0x03 {
        0 => cpu.regs.pair(Reg16::BC),
        1 => cpu.regs.pair(Reg16::DE),
        2 => {
            let hl = cpu.regs.pair(Reg16::HL);
            cpu.regs.set_pair(Reg16::HL, hl.wrapping_add(1));
            hl
        }
        _ => {
            let hl = cpu.regs.pair(Reg16::HL);
            cpu.regs.set_pair(Reg16::HL, hl.wrapping_sub(1));
            hl
        }
    }
}

fn ld_ind_a(cpu: &mut Cpu, bus: &mut Bus, op: u8) -> u32 {
    let addr = indirect_addr(cpu, op);
    bus.write_byte(addr, cpu.regs.a);
    8
}

fn ld_a_ind(cpu: &mut Cpu, bus: &mut Bus, op: u8) -> u32 {
    let addr = indirect_addr(cpu, op);
    cpu.regs.a = bus.read_byte(addr);
    8
}

fn inc_rr(cpu: &mut Cpu, _bus: &mut Bus, op: u8) -> u32 {
    let value = read_rr(cpu, op).wrapping_add(1);
    write_rr(cpu, op, value);
    8
}

fn dec_rr(cpu: &mut Cpu, _bus: &mut Bus, op: u8) -> u32 {
    let value = read_rr(cpu, op).wrapping_sub(1);
    write_rr(cpu, op, value);
    8
}

fn add_hl_rr(cpu: &mut Cpu, _bus: &mut Bus, op: u8) -> u32 {
    let (result, flags) = alu::add16(cpu.regs.pair(Reg16::HL), read_rr(cpu, op), cpu.regs.f);
    cpu.regs.set_pair(Reg16::HL, result);
    cpu.regs.set_flags(flags);
    8
}

fn ld_a16_sp(cpu: &mut Cpu, bus: &mut Bus, _op: u8) -> u32 {
    let addr = cpu.imm16(bus);
    bus.write_word(addr, cpu.sp);
    20
}

fn add_sp_e(cpu: &mut Cpu, bus: &mut Bus, _op: u8) -> u32 {
    let (result, flags) = alu::add_sp_offset(cpu.sp, cpu.imm8(bus));
    cpu.sp = result;
    cpu.regs.set_flags(flags);
    16
}

fn ld_hl_sp_e(cpu: &mut Cpu, bus: &mut Bus, _op: u8) -> u32 {
    let (result, flags) = alu::add_sp_offset(cpu.sp, cpu.imm8(bus));
    cpu.regs.set_pair(Reg16::HL, result);
    cpu.regs.set_flags(flags);
    12
}

fn ld_sp_hl(cpu: &mut Cpu, _bus: &mut Bus, _op: u8) -> u32 {
    cpu.sp = cpu.regs.pair(Reg16::HL);
    8
}

// 8-bit loads

fn ld_r_d8(cpu: &mut Cpu, bus: &mut Bus, op: u8) -> u32 {
    let dst = op >> 3;
    let value = cpu.imm8(bus);
    write_r(cpu, bus, dst, value);
    hl_cost(dst, 8, 12)
}

fn ld_r_r(cpu: &mut Cpu, bus: &mut Bus, op: u8) -> u32 {
    let dst = op >> 3;
    let src = op;
    let value = read_r(cpu, bus, src);
    write_r(cpu, bus, dst, value);
    if dst & 0x07 == HL_SLOT || src & 0x07 == HL_SLOT {
        8
    } else {
        4
    }
}

fn ldh_a8_a(cpu: &mut Cpu, bus: &mut Bus, _op: u8) -> u32 {
    let addr = 0xFF00 | cpu.imm8(bus) as u16;
    bus.write_byte(addr, cpu.regs.a);
    12
}

fn ldh_a_a8(cpu: &mut Cpu, bus: &mut Bus, _op: u8) -> u32 {
    let addr = 0xFF00 | cpu.imm8(bus) as u16;
    cpu.regs.a = bus.read_byte(addr);
    12
}

fn ld_c_ind_a(cpu: &mut Cpu, bus: &mut Bus, _op: u8) -> u32 {
    bus.write_byte(0xFF00 | cpu.regs.c as u16, cpu.regs.a);
    8
}

fn ld_a_c_ind(cpu: &mut Cpu, bus: &mut Bus, _op: u8) -> u32 {
    cpu.regs.a = bus.read_byte(0xFF00 | cpu.regs.c as u16);
    8
}

fn ld_a16_a(cpu: &mut Cpu, bus: &mut Bus, _op: u8) -> u32 {
    let addr = cpu.imm16(bus);
    bus.write_byte(addr, cpu.regs.a);
    16
}

fn ld_a_a16(cpu: &mut Cpu, bus: &mut Bus, _op: u8) -> u32 {
    let addr = cpu.imm16(bus);
    cpu.regs.a = bus.read_byte(addr);
    16
}

// 8-bit arithmetic

fn inc_r(cpu: &mut Cpu, bus: &mut Bus, op: u8) -> u32 {
    let index = op >> 3;
    let (result, flags) = alu::inc(read_r(cpu, bus, index), cpu.regs.f);
    write_r(cpu, bus, index, result);
    cpu.regs.set_flags(flags);
    hl_cost(index, 4, 12)
}

fn dec_r(cpu: &mut Cpu, bus: &mut Bus, op: u8) -> u32 {
    let index = op >> 3;
    let (result, flags) = alu::dec(read_r(cpu, bus, index), cpu.regs.f);
    write_r(cpu, bus, index, result);
    cpu.regs.set_flags(flags);
    hl_cost(index, 4, 12)
}

/// ADD, ADC, SUB, SBC, AND, XOR, OR, CP selected by opcode bits 3-5.
fn accumulate(cpu: &mut Cpu, op: u8, operand: u8) {
    let a = cpu.regs.a;
    let carry = cpu.regs.flag(FLAG_C);
    let (result, flags) = match (op >> 3) & 0x07 {
        0 => alu::add(a, operand, false),
        1 => alu::add(a, operand, carry),
        2 => alu::sub(a, operand, false),
        3 => alu::sub(a, operand, carry),
        4 => alu::and(a, operand),
        5 => alu::xor(a, operand),
        6 => alu::or(a, operand),
        _ => {
            let (_, flags) = alu::sub(a, operand, false);
            (a, flags)
        }
    };
    cpu.regs.a = result;
    cpu.regs.set_flags(flags);
}

fn alu_r(cpu: &mut Cpu, bus: &mut Bus, op: u8) -> u32 {
    let operand = read_r(cpu, bus, op);
    accumulate(cpu, op, operand);
    hl_cost(op, 4, 8)
}

fn alu_d8(cpu: &mut Cpu, bus: &mut Bus, op: u8) -> u32 {
    let operand = cpu.imm8(bus);
    accumulate(cpu, op, operand);
    8
}

fn daa(cpu: &mut Cpu, _bus: &mut Bus, _op: u8) -> u32 {
    let (result, flags) = alu::daa(cpu.regs.a, cpu.regs.f);
    cpu.regs.a = result;
    cpu.regs.set_flags(flags);
    4
}

fn cpl(cpu: &mut Cpu, _bus: &mut Bus, _op: u8) -> u32 {
    cpu.regs.a = !cpu.regs.a;
    cpu.regs.set_flags(cpu.regs.f | FLAG_N | FLAG_H);
    4
}

fn scf(cpu: &mut Cpu, _bus: &mut Bus, _op: u8) -> u32 {
    cpu.regs.set_flags((cpu.regs.f & FLAG_Z) | FLAG_C);
    4
}

fn ccf(cpu: &mut Cpu, _bus: &mut Bus, _op: u8) -> u32 {
    cpu.regs.set_flags((cpu.regs.f & FLAG_Z) | (!cpu.regs.f & FLAG_C));
    4
}

/// RLCA, RRCA, RLA, RRA. Z is always cleared.
fn rotate_a(cpu: &mut Cpu, _bus: &mut Bus, op: u8) -> u32 {
    let a = cpu.regs.a;
    let carry = cpu.regs.flag(FLAG_C);
    let (result, flags) = match (op >> 3) & 0x03 {
        0 => alu::rlc(a),
        1 => alu::rrc(a),
        2 => alu::rl(a, carry),
        _ => alu::rr(a, carry),
    };
    cpu.regs.a = result;
    cpu.regs.set_flags(flags & FLAG_C);
    4
}

// Jumps, calls and the stack

fn jr(cpu: &mut Cpu, bus: &mut Bus, _op: u8) -> u32 {
    let offset = cpu.imm8(bus) as i8;
    let target = cpu.pc.wrapping_add(2).wrapping_add_signed(offset as i16);
    cpu.jump(target);
    12
}

fn jr_cc(cpu: &mut Cpu, bus: &mut Bus, op: u8) -> u32 {
    if condition(cpu, op) { jr(cpu, bus, op) } else { 8 }
}

fn jp(cpu: &mut Cpu, bus: &mut Bus, _op: u8) -> u32 {
    let target = cpu.imm16(bus);
    cpu.jump(target);
    16
}

fn jp_cc(cpu: &mut Cpu, bus: &mut Bus, op: u8) -> u32 {
    if condition(cpu, op) { jp(cpu, bus, op) } else { 12 }
}

fn jp_hl(cpu: &mut Cpu, _bus: &mut Bus, _op: u8) -> u32 {
    let target = cpu.regs.pair(Reg16::HL);
    cpu.jump(target);
    4
}

/// Pushes the address of the next instruction.
fn call(cpu: &mut Cpu, bus: &mut Bus, _op: u8) -> u32 {
    let target = cpu.imm16(bus);
    let return_addr = cpu.pc.wrapping_add(3);
    cpu.push(bus, return_addr);
    cpu.jump(target);
    24
}

fn call_cc(cpu: &mut Cpu, bus: &mut Bus, op: u8) -> u32 {
    if condition(cpu, op) { call(cpu, bus, op) } else { 12 }
}

fn ret(cpu: &mut Cpu, bus: &mut Bus, _op: u8) -> u32 {
    let target = cpu.pop(bus);
    cpu.jump(target);
    16
}

fn ret_cc(cpu: &mut Cpu, bus: &mut Bus, op: u8) -> u32 {
    if condition(cpu, op) {
        ret(cpu, bus, op);
        20
    } else {
        8
    }
}

fn reti(cpu: &mut Cpu, bus: &mut Bus, op: u8) -> u32 {
    cpu.ime = true;
    ret(cpu, bus, op)
}

/// Like CALL, RST returns to the instruction after itself.
fn rst(cpu: &mut Cpu, bus: &mut Bus, op: u8) -> u32 {
    let return_addr = cpu.pc.wrapping_add(1);
    cpu.push(bus, return_addr);
    cpu.jump((op & 0x38) as u16);
    16
}

fn push(cpu: &mut Cpu, bus: &mut Bus, op: u8) -> u32 {
    let value = cpu.regs.pair(stack_pair(op));
    cpu.push(bus, value);
    16
}

fn pop(cpu: &mut Cpu, bus: &mut Bus, op: u8) -> u32 {
    let value = cpu.pop(bus);
    cpu.regs.set_pair(stack_pair(op), value);
    12
}

// CB-prefixed

fn cb_shift(cpu: &mut Cpu, bus: &mut Bus, op: u8) -> u32 {
    let value = read_r(cpu, bus, op);
    let carry = cpu.regs.flag(FLAG_C);
    let (result, flags) = match (op >> 3) & 0x07 {
        0 => alu::rlc(value),
        1 => alu::rrc(value),
        2 => alu::rl(value, carry),
        3 => alu::rr(value, carry),
        4 => alu::sla(value),
        5 => alu::sra(value),
        6 => alu::swap(value),
        _ => alu::srl(value),
    };
    write_r(cpu, bus, op, result);
    cpu.regs.set_flags(flags);
    hl_cost(op, 8, 16)
}

fn cb_bit(cpu: &mut Cpu, bus: &mut Bus, op: u8) -> u32 {
    let value = read_r(cpu, bus, op);
    let flags = alu::bit((op >> 3) & 0x07, value, cpu.regs.f);
    cpu.regs.set_flags(flags);
    hl_cost(op, 8, 12)
}

fn cb_res(cpu: &mut Cpu, bus: &mut Bus, op: u8) -> u32 {
    let value = read_r(cpu, bus, op) & !(1 << ((op >> 3) & 0x07));
    write_r(cpu, bus, op, value);
    hl_cost(op, 8, 16)
}

fn cb_set(cpu: &mut Cpu, bus: &mut Bus, op: u8) -> u32 {
    let value = read_r(cpu, bus, op) | (1 << ((op >> 3) & 0x07));
    write_r(cpu, bus, op, value);
    hl_cost(op, 8, 16)
}

#[rustfmt::skip]
const MNEMONICS: [&str; 256] = [
    "NOP", "LD BC,d16", "LD (BC),A", "INC BC",
    "INC B", "DEC B", "LD B,d8", "RLCA",
    "LD (a16),SP", "ADD HL,BC", "LD A,(BC)", "DEC BC",
    "INC C", "DEC C", "LD C,d8", "RRCA",
    "STOP", "LD DE,d16", "LD (DE),A", "INC DE",
    "INC D", "DEC D", "LD D,d8", "RLA",
    "JR r8", "ADD HL,DE", "LD A,(DE)", "DEC DE",
    "INC E", "DEC E", "LD E,d8", "RRA",
    "JR NZ,r8", "LD HL,d16", "LD (HL+),A", "INC HL",
    "INC H", "DEC H", "LD H,d8", "DAA",
    "JR Z,r8", "ADD HL,HL", "LD A,(HL+)", "DEC HL",
    "INC L", "DEC L", "LD L,d8", "CPL",
    "JR NC,r8", "LD SP,d16", "LD (HL-),A", "INC SP",
    "INC (HL)", "DEC (HL)", "LD (HL),d8", "SCF",
    "JR C,r8", "ADD HL,SP", "LD A,(HL-)", "DEC SP",
    "INC A", "DEC A", "LD A,d8", "CCF",
    "LD B,B", "LD B,C", "LD B,D", "LD B,E",
    "LD B,H", "LD B,L", "LD B,(HL)", "LD B,A",
    "LD C,B", "LD C,C", "LD C,D", "LD C,E",
    "LD C,H", "LD C,L", "LD C,(HL)", "LD C,A",
    "LD D,B", "LD D,C", "LD D,D", "LD D,E",
    "LD D,H", "LD D,L", "LD D,(HL)", "LD D,A",
    "LD E,B", "LD E,C", "LD E,D", "LD E,E",
    "LD E,H", "LD E,L", "LD E,(HL)", "LD E,A",
    "LD H,B", "LD H,C", "LD H,D", "LD H,E",
    "LD H,H", "LD H,L", "LD H,(HL)", "LD H,A",
    "LD L,B", "LD L,C", "LD L,D", "LD L,E",
    "LD L,H", "LD L,L", "LD L,(HL)", "LD L,A",
    "LD (HL),B", "LD (HL),C", "LD (HL),D", "LD (HL),E",
    "LD (HL),H", "LD (HL),L", "HALT", "LD (HL),A",
    "LD A,B", "LD A,C", "LD A,D", "LD A,E",
    "LD A,H", "LD A,L", "LD A,(HL)", "LD A,A",
    "ADD A,B", "ADD A,C", "ADD A,D", "ADD A,E",
    "ADD A,H", "ADD A,L", "ADD A,(HL)", "ADD A,A",
    "ADC A,B", "ADC A,C", "ADC A,D", "ADC A,E",
    "ADC A,H", "ADC A,L", "ADC A,(HL)", "ADC A,A",
    "SUB B", "SUB C", "SUB D", "SUB E",
    "SUB H", "SUB L", "SUB (HL)", "SUB A",
    "SBC A,B", "SBC A,C", "SBC A,D", "SBC A,E",
    "SBC A,H", "SBC A,L", "SBC A,(HL)", "SBC A,A",
    "AND B", "AND C", "AND D", "AND E",
    "AND H", "AND L", "AND (HL)", "AND A",
    "XOR B", "XOR C", "XOR D", "XOR E",
    "XOR H", "XOR L", "XOR (HL)", "XOR A",
    "OR B", "OR C", "OR D", "OR E",
    "OR H", "OR L", "OR (HL)", "OR A",
    "CP B", "CP C", "CP D", "CP E",
    "CP H", "CP L", "CP (HL)", "CP A",
    "RET NZ", "POP BC", "JP NZ,a16", "JP a16",
    "CALL NZ,a16", "PUSH BC", "ADD A,d8", "RST 00H",
    "RET Z", "RET", "JP Z,a16", "PREFIX CB",
    "CALL Z,a16", "CALL a16", "ADC A,d8", "RST 08H",
    "RET NC", "POP DE", "JP NC,a16", "ILLEGAL",
    "CALL NC,a16", "PUSH DE", "SUB d8", "RST 10H",
    "RET C", "RETI", "JP C,a16", "ILLEGAL",
    "CALL C,a16", "ILLEGAL", "SBC A,d8", "RST 18H",
    "LDH (a8),A", "POP HL", "LD (C),A", "ILLEGAL",
    "ILLEGAL", "PUSH HL", "AND d8", "RST 20H",
    "ADD SP,r8", "JP (HL)", "LD (a16),A", "ILLEGAL",
    "ILLEGAL", "ILLEGAL", "XOR d8", "RST 28H",
    "LDH A,(a8)", "POP AF", "LD A,(C)", "DI",
    "ILLEGAL", "PUSH AF", "OR d8", "RST 30H",
    "LD HL,SP+r8", "LD SP,HL", "LD A,(a16)", "EI",
    "ILLEGAL", "ILLEGAL", "CP d8", "RST 38H",
];

#[rustfmt::skip]
const CB_MNEMONICS: [&str; 256] = [
    "RLC B", "RLC C", "RLC D", "RLC E",
    "RLC H", "RLC L", "RLC (HL)", "RLC A",
    "RRC B", "RRC C", "RRC D", "RRC E",
    "RRC H", "RRC L", "RRC (HL)", "RRC A",
    "RL B", "RL C", "RL D", "RL E",
    "RL H", "RL L", "RL (HL)", "RL A",
    "RR B", "RR C", "RR D", "RR E",
    "RR H", "RR L", "RR (HL)", "RR A",
    "SLA B", "SLA C", "SLA D", "SLA E",
    "SLA H", "SLA L", "SLA (HL)", "SLA A",
    "SRA B", "SRA C", "SRA D", "SRA E",
    "SRA H", "SRA L", "SRA (HL)", "SRA A",
    "SWAP B", "SWAP C", "SWAP D", "SWAP E",
    "SWAP H", "SWAP L", "SWAP (HL)", "SWAP A",
    "SRL B", "SRL C", "SRL D", "SRL E",
    "SRL H", "SRL L", "SRL (HL)", "SRL A",
    "BIT 0,B", "BIT 0,C", "BIT 0,D", "BIT 0,E",
    "BIT 0,H", "BIT 0,L", "BIT 0,(HL)", "BIT 0,A",
    "BIT 1,B", "BIT 1,C", "BIT 1,D", "BIT 1,E",
    "BIT 1,H", "BIT 1,L", "BIT 1,(HL)", "BIT 1,A",
    "BIT 2,B", "BIT 2,C", "BIT 2,D", "BIT 2,E",
    "BIT 2,H", "BIT 2,L", "BIT 2,(HL)", "BIT 2,A",
    "BIT 3,B", "BIT 3,C", "BIT 3,D", "BIT 3,E",
    "BIT 3,H", "BIT 3,L", "BIT 3,(HL)", "BIT 3,A",
    "BIT 4,B", "BIT 4,C", "BIT 4,D", "BIT 4,E",
    "BIT 4,H", "BIT 4,L", "BIT 4,(HL)", "BIT 4,A",
    "BIT 5,B", "BIT 5,C", "BIT 5,D", "BIT 5,E",
    "BIT 5,H", "BIT 5,L", "BIT 5,(HL)", "BIT 5,A",
    "BIT 6,B", "BIT 6,C", "BIT 6,D", "BIT 6,E",
    "BIT 6,H", "BIT 6,L", "BIT 6,(HL)", "BIT 6,A",
    "BIT 7,B", "BIT 7,C", "BIT 7,D", "BIT 7,E",
    "BIT 7,H", "BIT 7,L", "BIT 7,(HL)", "BIT 7,A",
    "RES 0,B", "RES 0,C", "RES 0,D", "RES 0,E",
    "RES 0,H", "RES 0,L", "RES 0,(HL)", "RES 0,A",
    "RES 1,B", "RES 1,C", "RES 1,D", "RES 1,E",
    "RES 1,H", "RES 1,L", "RES 1,(HL)", "RES 1,A",
    "RES 2,B", "RES 2,C", "RES 2,D", "RES 2,E",
    "RES 2,H", "RES 2,L", "RES 2,(HL)", "RES 2,A",
    "RES 3,B", "RES 3,C", "RES 3,D", "RES 3,E",
    "RES 3,H", "RES 3,L", "RES 3,(HL)", "RES 3,A",
    "RES 4,B", "RES 4,C", "RES 4,D", "RES 4,E",
    "RES 4,H", "RES 4,L", "RES 4,(HL)", "RES 4,A",
    "RES 5,B", "RES 5,C", "RES 5,D", "RES 5,E",
    "RES 5,H", "RES 5,L", "RES 5,(HL)", "RES 5,A",
    "RES 6,B", "RES 6,C", "RES 6,D", "RES 6,E",
    "RES 6,H", "RES 6,L", "RES 6,(HL)", "RES 6,A",
    "RES 7,B", "RES 7,C", "RES 7,D", "RES 7,E",
    "RES 7,H", "RES 7,L", "RES 7,(HL)", "RES 7,A",
    "SET 0,B", "SET 0,C", "SET 0,D", "SET 0,E",
    "SET 0,H", "SET 0,L", "SET 0,(HL)", "SET 0,A",
    "SET 1,B", "SET 1,C", "SET 1,D", "SET 1,E",
    "SET 1,H", "SET 1,L", "SET 1,(HL)", "SET 1,A",
    "SET 2,B", "SET 2,C", "SET 2,D", "SET 2,E",
    "SET 2,H", "SET 2,L", "SET 2,(HL)", "SET 2,A",
    "SET 3,B", "SET 3,C", "SET 3,D", "SET 3,E",
    "SET 3,H", "SET 3,L", "SET 3,(HL)", "SET 3,A",
    "SET 4,B", "SET 4,C", "SET 4,D", "SET 4,E",
    "SET 4,H", "SET 4,L", "SET 4,(HL)", "SET 4,A",
    "SET 5,B", "SET 5,C", "SET 5,D", "SET 5,E",
    "SET 5,H", "SET 5,L", "SET 5,(HL)", "SET 5,A",
    "SET 6,B", "SET 6,C", "SET 6,D", "SET 6,E",
    "SET 6,H", "SET 6,L", "SET 6,(HL)", "SET 6,A",
    "SET 7,B", "SET 7,C", "SET 7,D", "SET 7,E",
    "SET 7,H", "SET 7,L", "SET 7,(HL)", "SET 7,A",
];

#[cfg(test)]
mod tests {
    use super::*;

    const UNUSED: [u8; 11] = [
        0xD3, 0xDB, 0xDD, 0xE3, 0xE4, 0xEB, 0xEC, 0xED, 0xF4, 0xFC, 0xFD,
    ];

    #[test]
    fn primary_table_covers_every_documented_opcode() {
        for op in 0..=255u8 {
            let entry = PRIMARY[op as usize].as_ref();
            if UNUSED.contains(&op) || op == PREFIX {
                assert!(entry.is_none(), "{op:#04X} should have no entry");
            } else {
                let entry = entry.unwrap_or_else(|| panic!("{op:#04X} missing"));
                assert_eq!(entry.opcode, op);
                assert_eq!(entry.mnemonic, MNEMONICS[op as usize]);
            }
        }
    }

    #[test]
    fn prefixed_table_is_complete() {
        assert!(PREFIXED.iter().all(|entry| entry.is_some_and(|i| i.length == 2)));
        assert_eq!(PREFIXED[0x7C].map(|i| i.mnemonic), Some("BIT 7,H"));
        assert_eq!(PREFIXED[0x37].map(|i| i.mnemonic), Some("SWAP A"));
    }

    #[test]
    fn lengths_match_operand_sizes() {
        let length = |op: usize| PRIMARY[op].map(|i| i.length);
        assert_eq!(length(0x00), Some(1));
        assert_eq!(length(0x10), Some(2));
        assert_eq!(length(0x3E), Some(2));
        assert_eq!(length(0xE0), Some(2));
        assert_eq!(length(0xF8), Some(2));
        assert_eq!(length(0x01), Some(3));
        assert_eq!(length(0xCD), Some(3));
        assert_eq!(length(0xFA), Some(3));
        assert_eq!(length(0xE9), Some(1));
    }
}
