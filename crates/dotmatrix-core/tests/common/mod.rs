use std::path::PathBuf;

use dotmatrix_core::{cartridge::Cartridge, gameboy::GameBoy};

/// Environment variable pointing at an extracted copy of the public
/// Game Boy test ROM suites.
pub const TEST_ROMS_ENV: &str = "DOTMATRIX_TEST_ROMS";

pub const ROM_BANK_SIZE: usize = 0x4000;

/// A ROM image with a valid header and `program` placed at the 0x0100 entry
/// point. Every bank starts with its own bank number.
#[allow(dead_code)]
pub fn rom_image(cart_type: u8, rom_code: u8, ram_code: u8, program: &[u8]) -> Vec<u8> {
    let banks = 2usize << rom_code;
    let mut rom = vec![0u8; banks * ROM_BANK_SIZE];
    for bank in 1..banks {
        rom[bank * ROM_BANK_SIZE] = bank as u8;
    }
    rom[0x0134..0x0138].copy_from_slice(b"TEST");
    rom[0x0147] = cart_type;
    rom[0x0148] = rom_code;
    rom[0x0149] = ram_code;
    rom[0x0100..0x0100 + program.len()].copy_from_slice(program);
    rom
}

/// A post-boot machine running `program` from a 32 KiB ROM-only cart. The
/// rest of the ROM is NOPs.
#[allow(dead_code)]
pub fn machine(program: &[u8]) -> GameBoy {
    let cart = Cartridge::load(rom_image(0x00, 0x00, 0x00, program))
        .expect("generated ROM should load");
    GameBoy::new(cart)
}

/// Path to a test ROM below `DOTMATRIX_TEST_ROMS`, or `None` when the
/// variable is unset and the test should be skipped.
#[allow(dead_code)]
pub fn test_rom_path(relative: &str) -> Option<PathBuf> {
    let root = std::env::var_os(TEST_ROMS_ENV)?;
    Some(PathBuf::from(root).join(relative))
}

#[allow(dead_code)]
pub fn serial_contains_result(serial: &[u8], checked_up_to: &mut usize) -> bool {
    const PASSED: &[u8] = b"Passed";
    const FAILED: &[u8] = b"Failed";

    let max_marker_len = PASSED.len().max(FAILED.len());
    let lookbehind = max_marker_len.saturating_sub(1);
    let start = checked_up_to.saturating_sub(lookbehind).min(serial.len());
    let window = &serial[start..];

    let found = window.windows(PASSED.len()).any(|chunk| chunk == PASSED)
        || window.windows(FAILED.len()).any(|chunk| chunk == FAILED);

    *checked_up_to = serial.len();
    found
}
