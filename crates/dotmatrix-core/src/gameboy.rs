use crate::{
    bus::Bus,
    cartridge::Cartridge,
    cpu::{Cpu, CpuError},
    hardware::DmgRevision,
    joypad::Button,
    ppu::{FRAME_CYCLES, SCREEN_HEIGHT, SCREEN_WIDTH},
};

pub struct GameBoy {
    pub cpu: Cpu,
    pub bus: Bus,
    pub revision: DmgRevision,
}

impl GameBoy {
    pub fn new(cart: Cartridge) -> Self {
        Self::new_with_revision(cart, DmgRevision::default())
    }

    /// A machine in the post-boot state of `revision`, running `cart`.
    pub fn new_with_revision(cart: Cartridge, revision: DmgRevision) -> Self {
        log::debug!("gameboy: starting \"{}\" as DMG {revision:?}", cart.title());
        Self {
            cpu: Cpu::new_with_revision(revision),
            bus: Bus::new(cart, revision),
            revision,
        }
    }

    /// Reset to the post-boot state while keeping the loaded cartridge and
    /// its RAM.
    pub fn reset(&mut self) {
        self.cpu = Cpu::new_with_revision(self.revision);
        self.bus.reset(self.revision);
    }

    /// Run one CPU step and feed its cycles to the timer and then the PPU,
    /// then let the CPU take any interrupt they raised. Returns the cycles
    /// consumed, interrupt dispatch included.
    pub fn step(&mut self) -> Result<u32, CpuError> {
        let mut cycles = self.cpu.step(&mut self.bus)?;
        self.bus.tick_timer(cycles);
        self.bus.step_ppu(cycles);

        let dispatch = self.cpu.service_interrupts(&mut self.bus);
        if dispatch > 0 {
            self.bus.tick_timer(dispatch);
            self.bus.step_ppu(dispatch);
            cycles += dispatch;
        }
        Ok(cycles)
    }

    /// Run until at least `cycles` master cycles have elapsed. Returns the
    /// exact number run, which may overshoot by part of an instruction.
    pub fn run_cycles(&mut self, cycles: u64) -> Result<u64, CpuError> {
        let mut elapsed = 0u64;
        while elapsed < cycles {
            elapsed += u64::from(self.step()?);
        }
        Ok(elapsed)
    }

    /// Run until the PPU finishes a frame. With the LCD off no frame is ever
    /// produced, so this gives up after one frame's worth of cycles.
    pub fn run_frame(&mut self) -> Result<u64, CpuError> {
        self.bus.ppu.clear_frame_flag();
        let mut elapsed = 0u64;
        while !self.bus.ppu.frame_ready() && elapsed < u64::from(FRAME_CYCLES) {
            elapsed += u64::from(self.step()?);
        }
        self.bus.ppu.clear_frame_flag();
        Ok(elapsed)
    }

    pub fn framebuffer(&self) -> &[u32; SCREEN_WIDTH * SCREEN_HEIGHT] {
        self.bus.ppu.framebuffer()
    }

    pub fn frame_count(&self) -> u64 {
        self.bus.ppu.frames()
    }

    pub fn set_button(&mut self, button: Button, pressed: bool) {
        self.bus.set_button(button, pressed);
    }

    /// Serial output produced so far, without draining it.
    pub fn peek_serial(&self) -> &[u8] {
        self.bus.serial.peek_output()
    }

    pub fn take_serial(&mut self) -> Vec<u8> {
        self.bus.serial.take_output()
    }
}
