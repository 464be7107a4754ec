use thiserror::Error;

use crate::{
    bus::Bus,
    hardware::DmgRevision,
    interrupts::{IF_ADDR, Interrupt},
};

pub mod alu;
pub mod instructions;
pub mod registers;

use instructions::Instruction;
pub use registers::{FLAG_C, FLAG_H, FLAG_N, FLAG_Z, Reg8, Reg16, Registers};

// Post-boot CPU state from gbdev.io/pandocs/Power_Up_State.html
const BOOT_PC: u16 = 0x0100;
const BOOT_SP: u16 = 0xFFFE;

const DMG0_BOOT: Registers = Registers {
    a: 0x01,
    f: 0x00,
    b: 0xFF,
    c: 0x13,
    d: 0x00,
    e: 0xC1,
    h: 0x84,
    l: 0x03,
};

const DMG_ABC_BOOT: Registers = Registers {
    a: 0x01,
    f: 0xB0,
    b: 0x00,
    c: 0x13,
    d: 0x00,
    e: 0xD8,
    h: 0x01,
    l: 0x4D,
};

/// A halted CPU idles one master cycle per step.
const HALT_STEP_CYCLES: u32 = 1;
/// Cycles spent dispatching an interrupt (two wait states, two pushes, jump).
const INTERRUPT_DISPATCH_CYCLES: u32 = 20;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CpuError {
    /// The opcode at `pc` has no table entry. Emulation cannot continue.
    #[error("unknown {}opcode {opcode:#04X} at {pc:#06X}", prefix_label(.prefixed))]
    UnknownOpcode { pc: u16, opcode: u8, prefixed: bool },
}

fn prefix_label(prefixed: &bool) -> &'static str {
    if *prefixed { "CB-prefixed " } else { "" }
}

pub struct Cpu {
    pub regs: Registers,
    pub pc: u16,
    pub sp: u16,
    pub cycles: u64,
    pub ime: bool,
    pub halted: bool,
    ime_enable_delay: u8,
    pc_written: bool,
    last_mnemonic: &'static str,
}

impl Cpu {
    pub fn new() -> Self {
        Self::new_with_revision(DmgRevision::default())
    }

    /// CPU in the state the boot ROM leaves behind on `revision`.
    pub fn new_with_revision(revision: DmgRevision) -> Self {
        let regs = match revision {
            DmgRevision::Rev0 => DMG0_BOOT,
            DmgRevision::RevA | DmgRevision::RevB | DmgRevision::RevC => DMG_ABC_BOOT,
        };
        Self {
            regs,
            pc: BOOT_PC,
            sp: BOOT_SP,
            cycles: 0,
            ime: false,
            halted: false,
            ime_enable_delay: 0,
            pc_written: false,
            last_mnemonic: "",
        }
    }

    pub fn debug_state(&self) -> String {
        format!(
            "AF:{:04X} BC:{:04X} DE:{:04X} HL:{:04X} PC:{:04X} SP:{:04X} IME:{} CY:{} last:{}",
            self.regs.pair(Reg16::AF),
            self.regs.pair(Reg16::BC),
            self.regs.pair(Reg16::DE),
            self.regs.pair(Reg16::HL),
            self.pc,
            self.sp,
            u8::from(self.ime),
            self.cycles,
            self.last_mnemonic
        )
    }

    /// Execute one instruction (or one idle cycle while halted) and return
    /// the elapsed master cycles.
    pub fn step(&mut self, bus: &mut Bus) -> Result<u32, CpuError> {
        if self.halted {
            self.advance_ime_delay();
            self.cycles += HALT_STEP_CYCLES as u64;
            return Ok(HALT_STEP_CYCLES);
        }

        let instruction = Self::decode(bus, self.pc).inspect_err(|e| log::error!("{e}"))?;

        #[cfg(feature = "cpu-trace")]
        log::trace!(
            "{:04X}: {:<14} {}",
            self.pc,
            instruction.mnemonic,
            self.debug_state()
        );

        self.pc_written = false;
        let elapsed = (instruction.execute)(self, bus, instruction.opcode);
        if !self.pc_written {
            self.pc = self.pc.wrapping_add(instruction.length as u16);
        }
        self.last_mnemonic = instruction.mnemonic;
        self.advance_ime_delay();
        self.cycles += elapsed as u64;
        Ok(elapsed)
    }

    /// Look up the instruction at `addr` without executing it.
    pub fn decode(bus: &Bus, addr: u16) -> Result<&'static Instruction, CpuError> {
        let opcode = bus.read_byte(addr);
        if opcode == instructions::PREFIX {
            let opcode = bus.read_byte(addr.wrapping_add(1));
            instructions::PREFIXED[opcode as usize]
                .as_ref()
                .ok_or(CpuError::UnknownOpcode {
                    pc: addr,
                    opcode,
                    prefixed: true,
                })
        } else {
            instructions::PRIMARY[opcode as usize]
                .as_ref()
                .ok_or(CpuError::UnknownOpcode {
                    pc: addr,
                    opcode,
                    prefixed: false,
                })
        }
    }

    /// Leave HALT if anything is pending, then dispatch the highest-priority
    /// pending interrupt when IME allows it. Returns the cycles spent.
    pub fn service_interrupts(&mut self, bus: &mut Bus) -> u32 {
        let pending = bus.interrupts.pending();
        // Any change to IF wakes the CPU, even one that leaves nothing
        // enabled and pending.
        let flags_changed = bus.interrupts.take_flags_changed();
        if self.halted && (pending != 0 || flags_changed) {
            self.halted = false;
        }

        if !self.ime {
            return 0;
        }
        let Some(interrupt) = Interrupt::highest_priority(pending) else {
            return 0;
        };

        self.ime = false;
        self.ime_enable_delay = 0;
        let flags = bus.read_byte(IF_ADDR);
        bus.write_byte(IF_ADDR, flags & !interrupt.bit());
        bus.interrupts.take_flags_changed();
        let return_pc = self.pc;
        self.push(bus, return_pc);
        self.pc = interrupt.vector();
        log::trace!("interrupt {interrupt:?} from {return_pc:04X}");

        self.cycles += INTERRUPT_DISPATCH_CYCLES as u64;
        INTERRUPT_DISPATCH_CYCLES
    }

    fn advance_ime_delay(&mut self) {
        if self.ime_enable_delay > 0 {
            self.ime_enable_delay -= 1;
            if self.ime_enable_delay == 0 {
                self.ime = true;
            }
        }
    }

    /// EI: IME turns on after the instruction following this one.
    pub(crate) fn schedule_ime(&mut self) {
        self.ime_enable_delay = 2;
    }

    pub(crate) fn disable_ime(&mut self) {
        self.ime = false;
        self.ime_enable_delay = 0;
    }

    /// Set PC from inside an instruction; suppresses the length advance.
    #[inline]
    pub(crate) fn jump(&mut self, addr: u16) {
        self.pc = addr;
        self.pc_written = true;
    }

    #[inline]
    pub(crate) fn imm8(&self, bus: &Bus) -> u8 {
        bus.read_byte(self.pc.wrapping_add(1))
    }

    #[inline]
    pub(crate) fn imm16(&self, bus: &Bus) -> u16 {
        bus.read_word(self.pc.wrapping_add(1))
    }

    pub fn push(&mut self, bus: &mut Bus, value: u16) {
        let [hi, lo] = value.to_be_bytes();
        self.sp = self.sp.wrapping_sub(1);
        bus.write_byte(self.sp, hi);
        self.sp = self.sp.wrapping_sub(1);
        bus.write_byte(self.sp, lo);
    }

    pub fn pop(&mut self, bus: &mut Bus) -> u16 {
        let lo = bus.read_byte(self.sp);
        self.sp = self.sp.wrapping_add(1);
        let hi = bus.read_byte(self.sp);
        self.sp = self.sp.wrapping_add(1);
        u16::from_be_bytes([hi, lo])
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}
