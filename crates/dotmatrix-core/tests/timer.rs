mod common;

use dotmatrix_core::{
    interrupts::{IF_ADDR, Interrupt},
    memory::Memory,
    timer::{DIV_ADDR, TAC_ADDR, TIMA_ADDR, TMA_ADDR, Timer},
};

#[test]
fn tima_keeps_the_remainder_between_batches() {
    let mut timer = Timer::new();
    timer.write_byte(TAC_ADDR, 0x05);

    // 6-cycle batches: 48 cycles is exactly three periods of 16.
    for _ in 0..8 {
        assert!(!timer.tick(6));
    }
    assert_eq!(timer.tima, 3);

    // A single batch spanning several periods counts each of them.
    timer.tick(40);
    assert_eq!(timer.tima, 5);
    timer.tick(8);
    assert_eq!(timer.tima, 6);
}

#[test]
fn overflow_reloads_tma_and_reports_once() {
    let mut timer = Timer::new();
    timer.write_byte(TMA_ADDR, 0x42);
    timer.write_byte(TIMA_ADDR, 0xFF);
    timer.write_byte(TAC_ADDR, 0x05);

    assert!(!timer.tick(15));
    assert!(timer.tick(1));
    assert_eq!(timer.read_byte(TIMA_ADDR), 0x42);
    assert!(!timer.tick(16));
    assert_eq!(timer.tima, 0x43);
}

#[test]
fn disabled_timer_only_runs_div() {
    let mut timer = Timer::new();
    timer.write_byte(TAC_ADDR, 0x01);
    timer.tick(1024);
    assert_eq!(timer.tima, 0);
    assert_eq!(timer.read_byte(DIV_ADDR), 4);
    assert_eq!(timer.read_byte(TAC_ADDR), 0xF9);
}

#[test]
fn div_write_resets_regardless_of_value() {
    let mut timer = Timer::new();
    timer.tick(255 + 256 * 3);
    assert_eq!(timer.div, 3);
    timer.write_byte(DIV_ADDR, 0xAB);
    assert_eq!(timer.div, 0);
    timer.tick(255);
    assert_eq!(timer.div, 0);
    timer.tick(1);
    assert_eq!(timer.div, 1);
}

#[test]
fn frequency_change_restarts_the_period() {
    let mut timer = Timer::new();
    timer.write_byte(TAC_ADDR, 0x05);
    timer.tick(12);
    timer.write_byte(TAC_ADDR, 0x06);
    timer.tick(63);
    assert_eq!(timer.tima, 0);
    timer.tick(1);
    assert_eq!(timer.tima, 1);
}

#[test]
fn overflow_requests_the_timer_interrupt_on_the_bus() {
    let mut gb = common::machine(&[]);
    gb.bus.write_byte(TIMA_ADDR, 0xFF);
    gb.bus.write_byte(TAC_ADDR, 0x05);
    let before = gb.bus.read_byte(IF_ADDR);
    assert_eq!(before & Interrupt::Timer.bit(), 0);

    // Four NOPs are 16 cycles.
    for _ in 0..4 {
        gb.step().unwrap();
    }
    assert_ne!(gb.bus.read_byte(IF_ADDR) & Interrupt::Timer.bit(), 0);
}
