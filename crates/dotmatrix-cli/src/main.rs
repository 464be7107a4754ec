mod screenshot;

use std::{
    io::Write,
    path::PathBuf,
    process::ExitCode,
    time::{Duration, Instant},
};

use clap::{Parser, ValueEnum};
use log::{error, info};

use dotmatrix_core::{
    cartridge::Cartridge, gameboy::GameBoy, hardware::DmgRevision, ppu::FRAME_CYCLES,
};

const GB_FPS: f64 = 59.7275;
const FRAME_TIME: Duration = Duration::from_nanos((1e9_f64 / GB_FPS) as u64);

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Revision {
    Rev0,
    Reva,
    Revb,
    Revc,
}

impl From<Revision> for DmgRevision {
    fn from(rev: Revision) -> Self {
        match rev {
            Revision::Rev0 => DmgRevision::Rev0,
            Revision::Reva => DmgRevision::RevA,
            Revision::Revb => DmgRevision::RevB,
            Revision::Revc => DmgRevision::RevC,
        }
    }
}

#[derive(Parser)]
#[command(name = "dotmatrix", version, about = "Headless DMG Game Boy emulator")]
struct Args {
    /// Path to ROM file
    rom: PathBuf,

    /// DMG hardware revision to emulate
    #[arg(long, value_enum, default_value_t = Revision::Revc)]
    revision: Revision,

    /// Stop after this many frames
    #[arg(long)]
    frames: Option<u64>,

    /// Stop after this many CPU cycles
    #[arg(long)]
    cycles: Option<u64>,

    /// Echo serial output and stop when a test ROM reports Passed or Failed
    #[arg(long)]
    serial: bool,

    /// Write the last frame to this PNG file on exit
    #[arg(long)]
    screenshot: Option<PathBuf>,

    /// Enable debug logging and dump CPU state every 60 frames
    #[arg(long)]
    debug: bool,

    /// Pace emulation to the DMG frame rate
    #[arg(long)]
    realtime: bool,
}

/// Why the run loop ended.
enum Outcome {
    Limit,
    Serial { passed: bool },
    Fault,
}

/// Watches the serial sink for a test verdict.
#[derive(Default)]
struct SerialMonitor {
    transcript: Vec<u8>,
    checked_up_to: usize,
}

impl SerialMonitor {
    const PASSED: &'static [u8] = b"Passed";
    const FAILED: &'static [u8] = b"Failed";

    /// Append new output and report a verdict if one has appeared.
    fn feed(&mut self, bytes: &[u8]) -> Option<bool> {
        self.transcript.extend_from_slice(bytes);
        let lookbehind = Self::PASSED.len().max(Self::FAILED.len()) - 1;
        let start = self.checked_up_to.saturating_sub(lookbehind);
        let window = &self.transcript[start..];
        self.checked_up_to = self.transcript.len();

        if window.windows(Self::PASSED.len()).any(|w| w == Self::PASSED) {
            Some(true)
        } else if window.windows(Self::FAILED.len()).any(|w| w == Self::FAILED) {
            Some(false)
        } else {
            None
        }
    }
}

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

fn run(gb: &mut GameBoy, args: &Args) -> Outcome {
    let mut monitor = SerialMonitor::default();
    let mut frame_count = 0u64;
    let mut next_frame = Instant::now() + FRAME_TIME;
    let mut stdout = std::io::stdout();

    loop {
        let budget = args
            .cycles
            .map_or(u64::MAX, |max| max.saturating_sub(gb.cpu.cycles));
        if budget == 0 {
            return Outcome::Limit;
        }
        let ran = if budget < u64::from(FRAME_CYCLES) {
            gb.run_cycles(budget)
        } else {
            gb.run_frame()
        };
        if let Err(e) = ran {
            error!("emulation stopped: {e}");
            error!("{}", gb.cpu.debug_state());
            return Outcome::Fault;
        }
        frame_count += 1;

        if args.serial {
            let bytes = gb.take_serial();
            if !bytes.is_empty() {
                let _ = stdout.write_all(&bytes);
                let _ = stdout.flush();
            }
            if let Some(passed) = monitor.feed(&bytes) {
                return Outcome::Serial { passed };
            }
        }

        if args.debug && frame_count.is_multiple_of(60) {
            info!("{}", gb.cpu.debug_state());
        }

        if let Some(max) = args.frames
            && frame_count >= max
        {
            return Outcome::Limit;
        }

        if args.realtime {
            let now = Instant::now();
            if next_frame > now {
                std::thread::sleep(next_frame - now);
                next_frame += FRAME_TIME;
            } else {
                // Fell behind; do not try to catch up.
                next_frame = now + FRAME_TIME;
            }
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.debug);

    let cart = match Cartridge::from_file(&args.rom) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load ROM {}: {e}", args.rom.display());
            return ExitCode::FAILURE;
        }
    };

    let revision = DmgRevision::from(args.revision);
    let mut gb = GameBoy::new_with_revision(cart, revision);
    info!("Emulator initialized as DMG {revision:?}");

    let start = Instant::now();
    let outcome = run(&mut gb, &args);
    info!(
        "Ran {} cycles ({} frames) in {:.2?}",
        gb.cpu.cycles,
        gb.frame_count(),
        start.elapsed()
    );

    if let Err(e) = gb.bus.cart.save_ram() {
        error!("Failed to save cartridge RAM: {e}");
    }

    if let Some(path) = &args.screenshot {
        match screenshot::write_png(path, gb.framebuffer()) {
            Ok(()) => info!("Wrote screenshot to {}", path.display()),
            Err(e) => error!("Failed to write screenshot {}: {e}", path.display()),
        }
    }

    match outcome {
        Outcome::Limit | Outcome::Serial { passed: true } => ExitCode::SUCCESS,
        Outcome::Serial { passed: false } | Outcome::Fault => ExitCode::FAILURE,
    }
}
