mod common;

use dotmatrix_core::{
    cpu::{CpuError, FLAG_C, FLAG_H, FLAG_N, FLAG_Z, Reg16},
    interrupts::{IE_ADDR, IF_ADDR, Interrupt},
};

#[test]
fn add_overflow_sets_z_h_and_c() {
    // LD A,$3A; LD B,$C6; ADD A,B
    let mut gb = common::machine(&[0x3E, 0x3A, 0x06, 0xC6, 0x80]);
    for _ in 0..3 {
        gb.step().unwrap();
    }
    assert_eq!(gb.cpu.regs.a, 0x00);
    assert_eq!(gb.cpu.regs.f, FLAG_Z | FLAG_H | FLAG_C);
    assert_eq!(gb.cpu.pc, 0x0105);
}

#[test]
fn sub_of_equal_values_sets_z_and_n() {
    // LD A,$3E; LD B,$3E; SUB B
    let mut gb = common::machine(&[0x3E, 0x3E, 0x06, 0x3E, 0x90]);
    for _ in 0..3 {
        gb.step().unwrap();
    }
    assert_eq!(gb.cpu.regs.a, 0x00);
    assert_eq!(gb.cpu.regs.f, FLAG_Z | FLAG_N);
}

#[test]
fn push_pop_round_trip() {
    // LD BC,$1234; PUSH BC; LD BC,$0000; POP BC
    let mut gb = common::machine(&[0x01, 0x34, 0x12, 0xC5, 0x01, 0x00, 0x00, 0xC1]);
    gb.step().unwrap();
    gb.step().unwrap();
    assert_eq!(gb.cpu.sp, 0xFFFC);
    assert_eq!(gb.bus.read_byte(0xFFFD), 0x12);
    assert_eq!(gb.bus.read_byte(0xFFFC), 0x34);

    gb.step().unwrap();
    assert_eq!(gb.cpu.regs.pair(Reg16::BC), 0x0000);
    gb.step().unwrap();
    assert_eq!(gb.cpu.regs.pair(Reg16::BC), 0x1234);
    assert_eq!(gb.cpu.sp, 0xFFFE);
}

#[test]
fn push_then_pop_restores_every_word() {
    let mut gb = common::machine(&[]);
    gb.cpu.sp = 0xD000;
    for value in 0..=u16::MAX {
        gb.cpu.push(&mut gb.bus, value);
        assert_eq!(gb.cpu.sp, 0xCFFE);
        assert_eq!(gb.cpu.pop(&mut gb.bus), value);
        assert_eq!(gb.cpu.sp, 0xD000);
    }
}

#[test]
fn push_pop_wraps_the_stack_pointer() {
    // SP=0 pushes into IE and the top of high RAM.
    let mut gb = common::machine(&[]);
    gb.cpu.sp = 0x0000;
    for value in [0x0000, 0xA55A, 0xFFFF] {
        gb.cpu.push(&mut gb.bus, value);
        assert_eq!(gb.cpu.sp, 0xFFFE);
        assert_eq!(gb.bus.read_byte(IE_ADDR), (value >> 8) as u8);
        assert_eq!(gb.cpu.pop(&mut gb.bus), value);
        assert_eq!(gb.cpu.sp, 0x0000);
    }
}

#[test]
fn pop_af_masks_low_flag_bits() {
    // LD BC,$12FF; PUSH BC; POP AF
    let mut gb = common::machine(&[0x01, 0xFF, 0x12, 0xC5, 0xF1]);
    for _ in 0..3 {
        gb.step().unwrap();
    }
    assert_eq!(gb.cpu.regs.pair(Reg16::AF), 0x12F0);
}

#[test]
fn call_pushes_following_address_and_ret_returns() {
    let mut program = vec![0u8; 0x101];
    program[..3].copy_from_slice(&[0xCD, 0x00, 0x02]); // CALL $0200
    program[0x100] = 0xC9; // RET at $0200
    let mut gb = common::machine(&program);

    assert_eq!(gb.step().unwrap(), 24);
    assert_eq!(gb.cpu.pc, 0x0200);
    assert_eq!(gb.bus.read_word(gb.cpu.sp), 0x0103);

    assert_eq!(gb.step().unwrap(), 16);
    assert_eq!(gb.cpu.pc, 0x0103);
    assert_eq!(gb.cpu.sp, 0xFFFE);
}

#[test]
fn rst_returns_past_itself() {
    // RST $38
    let mut gb = common::machine(&[0xFF]);
    assert_eq!(gb.step().unwrap(), 16);
    assert_eq!(gb.cpu.pc, 0x0038);
    assert_eq!(gb.bus.read_word(gb.cpu.sp), 0x0101);
}

#[test]
fn conditional_branches_cost_more_when_taken() {
    // XOR A; JR NZ,+2; JR Z,+0
    let mut gb = common::machine(&[0xAF, 0x20, 0x02, 0x28, 0x00]);
    assert_eq!(gb.step().unwrap(), 4);
    assert!(gb.cpu.regs.flag(FLAG_Z));
    assert_eq!(gb.step().unwrap(), 8);
    assert_eq!(gb.cpu.pc, 0x0103);
    assert_eq!(gb.step().unwrap(), 12);
    assert_eq!(gb.cpu.pc, 0x0105);
}

#[test]
fn jp_cc_and_call_cc_timing() {
    // SCF; JP NC,$0000; CALL NC,$0000; JP C,$0110
    let mut gb = common::machine(&[0x37, 0xD2, 0x00, 0x00, 0xD4, 0x00, 0x00, 0xDA, 0x10, 0x01]);
    gb.step().unwrap();
    assert_eq!(gb.step().unwrap(), 12);
    assert_eq!(gb.step().unwrap(), 12);
    assert_eq!(gb.cpu.sp, 0xFFFE);
    assert_eq!(gb.step().unwrap(), 16);
    assert_eq!(gb.cpu.pc, 0x0110);
}

#[test]
fn cb_prefixed_memory_forms() {
    // LD HL,$C000; LD (HL),$80; BIT 7,(HL); SET 0,(HL); SWAP (HL)
    let mut gb = common::machine(&[
        0x21, 0x00, 0xC0, 0x36, 0x80, 0xCB, 0x7E, 0xCB, 0xC6, 0xCB, 0x36,
    ]);
    gb.step().unwrap();
    gb.step().unwrap();
    assert_eq!(gb.step().unwrap(), 12);
    assert!(!gb.cpu.regs.flag(FLAG_Z));
    assert!(gb.cpu.regs.flag(FLAG_H));
    assert_eq!(gb.step().unwrap(), 16);
    assert_eq!(gb.bus.read_byte(0xC000), 0x81);
    gb.step().unwrap();
    assert_eq!(gb.bus.read_byte(0xC000), 0x18);
    assert_eq!(gb.cpu.pc, 0x010B);
}

#[test]
fn unknown_opcode_stops_emulation() {
    let mut gb = common::machine(&[0xD3]);
    let err = gb.step().unwrap_err();
    assert_eq!(
        err,
        CpuError::UnknownOpcode {
            pc: 0x0100,
            opcode: 0xD3,
            prefixed: false
        }
    );
    assert_eq!(err.to_string(), "unknown opcode 0xD3 at 0x0100");
}

#[test]
fn ei_takes_effect_after_next_instruction() {
    // EI; NOP; NOP
    let mut gb = common::machine(&[0xFB, 0x00, 0x00]);
    gb.bus.write_byte(IE_ADDR, Interrupt::Timer.bit());
    gb.bus.request_interrupt(Interrupt::Timer);

    assert_eq!(gb.step().unwrap(), 4);
    assert!(!gb.cpu.ime);
    assert_eq!(gb.cpu.pc, 0x0101);

    assert_eq!(gb.step().unwrap(), 4 + 20);
    assert_eq!(gb.cpu.pc, Interrupt::Timer.vector());
    assert!(!gb.cpu.ime);
    assert_eq!(gb.bus.read_word(gb.cpu.sp), 0x0102);
    assert_eq!(gb.bus.read_byte(IF_ADDR) & Interrupt::Timer.bit(), 0);
}

#[test]
fn highest_priority_interrupt_wins() {
    let mut gb = common::machine(&[]);
    gb.cpu.ime = true;
    gb.bus.write_byte(IE_ADDR, 0x1F);
    gb.bus.write_byte(IF_ADDR, Interrupt::Joypad.bit() | Interrupt::LcdStat.bit());
    gb.step().unwrap();
    assert_eq!(gb.cpu.pc, Interrupt::LcdStat.vector());
    assert_eq!(
        gb.bus.read_byte(IF_ADDR) & 0x1F,
        Interrupt::Joypad.bit()
    );
}

#[test]
fn halt_wakes_on_if_write_with_ime_clear() {
    // HALT; NOP
    let mut gb = common::machine(&[0x76, 0x00]);
    gb.bus.write_byte(IE_ADDR, 0x00);
    gb.step().unwrap();
    assert!(gb.cpu.halted);
    assert_eq!(gb.step().unwrap(), 1);
    assert_eq!(gb.step().unwrap(), 1);
    assert!(gb.cpu.halted);
    assert_eq!(gb.cpu.pc, 0x0101);

    let flags = gb.bus.read_byte(IF_ADDR);
    gb.bus.write_byte(IF_ADDR, flags | Interrupt::Serial.bit());
    gb.step().unwrap();
    assert!(!gb.cpu.halted);
    gb.step().unwrap();
    assert_eq!(gb.cpu.pc, 0x0102);
}

#[test]
fn halted_cpu_still_clocks_the_timer() {
    // HALT
    let mut gb = common::machine(&[0x76]);
    gb.bus.write_byte(IE_ADDR, Interrupt::Timer.bit());
    gb.bus.write_byte(0xFF06, 0x00);
    gb.bus.write_byte(0xFF05, 0xFE);
    gb.bus.write_byte(0xFF07, 0x05);
    gb.step().unwrap();
    assert!(gb.cpu.halted);

    let mut steps = 0;
    while gb.cpu.halted && steps < 256 {
        gb.step().unwrap();
        steps += 1;
    }
    assert!(!gb.cpu.halted);
    assert_ne!(gb.bus.read_byte(IF_ADDR) & Interrupt::Timer.bit(), 0);
}
