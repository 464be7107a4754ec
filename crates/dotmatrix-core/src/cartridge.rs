use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;

use crate::memory::Memory;

const ROM_BANK_SIZE: usize = 0x4000;
const RAM_BANK_SIZE: usize = 0x2000;
const HEADER_END: usize = 0x0150;
const MBC2_RAM_SIZE: usize = 0x0200;

#[derive(Debug, Error)]
pub enum CartridgeError {
    #[error("failed to access cartridge file: {0}")]
    Io(#[from] io::Error),
    #[error("ROM is {len} bytes, too short to hold a cartridge header")]
    TooShort { len: usize },
    #[error("unsupported cartridge type {0:#04X}")]
    UnsupportedMapper(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MbcType {
    NoMbc,
    Mbc1,
    Mbc2,
}

#[derive(Debug)]
enum MbcState {
    NoMbc,
    Mbc1 {
        rom_bank: u8,
        ram_bank: u8,
        mode: u8,
        ram_enable: bool,
    },
    Mbc2 {
        rom_bank: u8,
        ram_enable: bool,
    },
}

#[derive(Debug)]
pub struct Cartridge {
    rom: Vec<u8>,
    ram: Vec<u8>,
    mbc: MbcType,
    title: String,
    cart_type: u8,
    save_path: Option<PathBuf>,
    mbc_state: MbcState,
}

impl Cartridge {
    /// Load a ROM image and, for battery-backed carts, the `.sav` file next
    /// to it.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CartridgeError> {
        let data = fs::read(&path)?;
        let mut cart = Self::load(data)?;

        if cart.has_battery() {
            let mut save = PathBuf::from(path.as_ref());
            save.set_extension("sav");
            match fs::read(&save) {
                Ok(bytes) => {
                    for (d, s) in cart.ram.iter_mut().zip(bytes.iter()) {
                        *d = *s;
                    }
                    log::info!("Loaded battery RAM from {}", save.display());
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
            cart.save_path = Some(save);
        }

        Ok(cart)
    }

    pub fn load(mut data: Vec<u8>) -> Result<Self, CartridgeError> {
        if data.len() < HEADER_END {
            return Err(CartridgeError::TooShort { len: data.len() });
        }
        let header = Header::parse(&data);
        let cart_type = header.cart_type();
        let mbc = header.mbc_type()?;
        let title = header.title();
        let rom_size = header.rom_size();
        let ram_size = if mbc == MbcType::Mbc2 {
            MBC2_RAM_SIZE
        } else {
            header.ram_size()
        };

        if data.len() < rom_size {
            log::warn!(
                "ROM is {} bytes but the header declares {rom_size}; padding with 0xFF",
                data.len()
            );
            data.resize(rom_size, 0xFF);
        }
        if data.len() < 2 * ROM_BANK_SIZE {
            data.resize(2 * ROM_BANK_SIZE, 0xFF);
        }

        log::info!(
            "Loaded ROM: {title} (type {cart_type:#04X}, MBC: {mbc:?}, {} KiB ROM, {} KiB RAM)",
            data.len() / 1024,
            ram_size / 1024
        );

        Ok(Self {
            rom: data,
            ram: vec![0; ram_size],
            mbc,
            title,
            cart_type,
            save_path: None,
            mbc_state: Self::initial_state(mbc),
        })
    }

    /// Return the mapper to its power-on banking state. RAM contents survive.
    pub fn reset(&mut self) {
        self.mbc_state = Self::initial_state(self.mbc);
    }

    fn initial_state(mbc: MbcType) -> MbcState {
        match mbc {
            MbcType::NoMbc => MbcState::NoMbc,
            MbcType::Mbc1 => MbcState::Mbc1 {
                rom_bank: 1,
                ram_bank: 0,
                mode: 0,
                ram_enable: false,
            },
            MbcType::Mbc2 => MbcState::Mbc2 {
                rom_bank: 1,
                ram_enable: false,
            },
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn mbc(&self) -> MbcType {
        self.mbc
    }

    pub fn ram_len(&self) -> usize {
        self.ram.len()
    }

    /// Bank currently visible at 0x4000-0x7FFF.
    pub fn rom_bank(&self) -> usize {
        let bank = match &self.mbc_state {
            MbcState::NoMbc => 1,
            MbcState::Mbc1 {
                rom_bank, ram_bank, ..
            } => ((*ram_bank as usize) << 5) | *rom_bank as usize,
            MbcState::Mbc2 { rom_bank, .. } => *rom_bank as usize,
        };
        bank % self.rom_bank_count()
    }

    pub fn has_battery(&self) -> bool {
        matches!(self.cart_type, 0x03 | 0x06 | 0x09)
    }

    /// Write battery RAM to the `.sav` path chosen at load time. Does nothing
    /// for carts without a battery or that were not loaded from a file.
    pub fn save_ram(&self) -> Result<(), CartridgeError> {
        if let (true, Some(path)) = (self.has_battery(), &self.save_path)
            && !self.ram.is_empty()
        {
            fs::write(path, &self.ram)?;
            log::info!("Saved battery RAM to {}", path.display());
        }
        Ok(())
    }

    fn rom_bank_count(&self) -> usize {
        (self.rom.len() / ROM_BANK_SIZE).max(1)
    }

    fn read_rom(&self, bank: usize, addr: u16) -> u8 {
        let offset = (bank % self.rom_bank_count()) * ROM_BANK_SIZE + (addr as usize & 0x3FFF);
        self.rom.get(offset).copied().unwrap_or(0xFF)
    }

    fn ram_index(&self, addr: u16) -> usize {
        let offset = addr as usize - 0xA000;
        match &self.mbc_state {
            MbcState::NoMbc => offset,
            MbcState::Mbc2 { .. } => offset & 0x01FF,
            MbcState::Mbc1 { ram_bank, mode, .. } => {
                if *mode == 0 {
                    offset
                } else {
                    let bank_count = self.ram.len().div_ceil(RAM_BANK_SIZE).max(1);
                    (*ram_bank as usize % bank_count) * RAM_BANK_SIZE + offset
                }
            }
        }
    }

    fn read_ram(&self, addr: u16) -> u8 {
        if self.ram.is_empty() {
            return 0xFF;
        }
        self.ram[self.ram_index(addr) % self.ram.len()]
    }

    fn write_ram(&mut self, addr: u16, value: u8) {
        if self.ram.is_empty() {
            return;
        }
        let idx = self.ram_index(addr) % self.ram.len();
        self.ram[idx] = value;
    }
}

impl Memory for Cartridge {
    fn read_byte(&self, addr: u16) -> u8 {
        match (&self.mbc_state, addr) {
            (MbcState::NoMbc, 0x0000..=0x7FFF) => {
                self.rom.get(addr as usize).copied().unwrap_or(0xFF)
            }
            (MbcState::NoMbc, 0xA000..=0xBFFF) => self.read_ram(addr),
            (MbcState::Mbc1 { ram_bank, mode, .. }, 0x0000..=0x3FFF) => {
                let bank = if *mode == 0 {
                    0
                } else {
                    ((*ram_bank as usize) & 0x03) << 5
                };
                self.read_rom(bank, addr)
            }
            (MbcState::Mbc2 { .. }, 0x0000..=0x3FFF) => self.read_rom(0, addr),
            (MbcState::Mbc1 { .. } | MbcState::Mbc2 { .. }, 0x4000..=0x7FFF) => {
                self.read_rom(self.rom_bank(), addr)
            }
            (MbcState::Mbc1 { ram_enable, .. }, 0xA000..=0xBFFF) => {
                if *ram_enable {
                    self.read_ram(addr)
                } else {
                    0
                }
            }
            (MbcState::Mbc2 { ram_enable, .. }, 0xA000..=0xBFFF) => {
                if *ram_enable {
                    self.read_ram(addr) | 0xF0
                } else {
                    0
                }
            }
            _ => 0xFF,
        }
    }

    fn write_byte(&mut self, addr: u16, value: u8) {
        match (&mut self.mbc_state, addr) {
            (MbcState::NoMbc, 0xA000..=0xBFFF) => self.write_ram(addr, value),
            (MbcState::NoMbc, _) => {}
            (MbcState::Mbc1 { ram_enable, .. }, 0x0000..=0x1FFF) => {
                *ram_enable = value & 0x0F == 0x0A;
            }
            (MbcState::Mbc1 { rom_bank, .. }, 0x2000..=0x3FFF) => {
                *rom_bank = value & 0x1F;
                if *rom_bank == 0 {
                    *rom_bank = 1;
                }
                log::debug!("mbc1: ROM bank register {:#04X}", *rom_bank);
            }
            (MbcState::Mbc1 { ram_bank, .. }, 0x4000..=0x5FFF) => {
                *ram_bank = value & 0x03;
                log::debug!("mbc1: secondary bank register {:#03X}", *ram_bank);
            }
            (MbcState::Mbc1 { mode, .. }, 0x6000..=0x7FFF) => {
                *mode = value & 0x01;
            }
            (MbcState::Mbc1 { ram_enable, .. }, 0xA000..=0xBFFF) => {
                if *ram_enable {
                    self.write_ram(addr, value);
                }
            }
            (
                MbcState::Mbc2 {
                    rom_bank,
                    ram_enable,
                },
                0x0000..=0x3FFF,
            ) => {
                // Address bit 8 selects the register: clear for RAM enable,
                // set for ROM bank.
                if addr & 0x0100 == 0 {
                    *ram_enable = value & 0x0F == 0x0A;
                } else {
                    *rom_bank = value & 0x0F;
                    if *rom_bank == 0 {
                        *rom_bank = 1;
                    }
                    log::debug!("mbc2: ROM bank {:#03X}", *rom_bank);
                }
            }
            (MbcState::Mbc2 { ram_enable, .. }, 0xA000..=0xBFFF) => {
                if *ram_enable {
                    self.write_ram(addr, value & 0x0F);
                }
            }
            _ => {}
        }
    }
}

struct Header<'a> {
    data: &'a [u8],
}

impl<'a> Header<'a> {
    fn parse(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn title(&self) -> String {
        let mut slice = &self.data[0x0134..0x0143];
        if let Some(pos) = slice.iter().position(|&b| b == 0) {
            slice = &slice[..pos];
        }
        String::from_utf8_lossy(slice).trim().to_string()
    }

    fn cart_type(&self) -> u8 {
        self.data[0x0147]
    }

    fn mbc_type(&self) -> Result<MbcType, CartridgeError> {
        match self.cart_type() {
            0x00 | 0x08 | 0x09 => Ok(MbcType::NoMbc),
            0x01..=0x04 => Ok(MbcType::Mbc1),
            0x05 | 0x06 => Ok(MbcType::Mbc2),
            other => Err(CartridgeError::UnsupportedMapper(other)),
        }
    }

    fn rom_size(&self) -> usize {
        match self.data[0x0148] {
            code @ 0x00..=0x08 => (32 * 1024) << code,
            _ => 2 * ROM_BANK_SIZE,
        }
    }

    fn ram_size(&self) -> usize {
        match self.data[0x0149] {
            0x00 => 0,
            0x01 => 0x800,   // 2KB
            0x02 => 0x2000,  // 8KB
            0x03 => 0x8000,  // 32KB (4 banks)
            0x04 => 0x20000, // 128KB (16 banks)
            0x05 => 0x10000, // 64KB (8 banks)
            _ => 0x2000,
        }
    }
}
