//! Cycle-stepped DMG Game Boy emulation core.
//!
//! This crate contains the platform-agnostic emulator logic (CPU/bus/timer/PPU
//! and the smaller bus devices). Frontends live in separate crates and drive
//! the core through the [`gameboy`] facade.

/// APU register file (no sound synthesis).
pub mod apu;

/// Address-to-owner dispatch and the devices wired behind it.
pub mod bus;

/// Cartridge mappers (MBC) and ROM/RAM handling.
pub mod cartridge;

/// LR35902 CPU core.
pub mod cpu;

/// High-level facade that wires the CPU and bus into a single machine.
pub mod gameboy;

/// Hardware revisions and revision-specific post-boot state.
pub mod hardware;

/// IF/IE registers and interrupt priority.
pub mod interrupts;

/// Joypad input register.
pub mod joypad;

/// The byte-addressed device contract and plain RAM.
pub mod memory;

/// Pixel Processing Unit (PPU) emulation.
pub mod ppu;

/// Serial unit and link cable plumbing.
pub mod serial;

/// Divider/timer unit.
pub mod timer;
