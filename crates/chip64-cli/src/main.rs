//! Chip64 shell.

use std::{path::Path, path::PathBuf, process};

use argh::FromArgs;
use chip64_core::{
    core::cpu::seed_random,
    debugger::{Debugger, DebuggerContext, DebuggerStream},
    devices::{Fpu, MemoryExtension, Rom},
    emulator::{Emulator, EmulatorContext},
    errors::CResult,
    program::Program,
};
use tracing::info;

/// Chip64 virtual machine
#[derive(FromArgs)]
pub struct Args {
    /// verbose mode
    #[argh(switch, short = 'v')]
    pub verbose: bool,

    /// subcommand
    #[argh(subcommand)]
    pub nested: SubCommands,
}

/// Subcommands
#[derive(FromArgs)]
#[argh(subcommand)]
pub enum SubCommands {
    /// Run command
    Run(RunCommand),
    /// Debug command
    Debug(DebugCommand),
    /// Version command
    Version(VersionCommand),
}

/// run program
#[derive(FromArgs)]
#[argh(subcommand, name = "run")]
pub struct RunCommand {
    /// program path
    #[argh(positional)]
    pub file: PathBuf,

    /// trace output file ("-" for stdout)
    #[argh(option, short = 't')]
    pub trace: Option<String>,

    /// random seed
    #[argh(option)]
    pub seed: Option<u64>,

    /// bind a memory extension to a slot
    #[argh(option)]
    pub memext: Option<u8>,

    /// bind the ROM device to a slot
    #[argh(option)]
    pub rom: Option<u8>,

    /// ROM file path (defaults to rom.crm)
    #[argh(option)]
    pub rom_file: Option<PathBuf>,

    /// bind the floating-point device to a slot
    #[argh(option)]
    pub fpu: Option<u8>,
}

/// debug program
#[derive(FromArgs)]
#[argh(subcommand, name = "debug")]
pub struct DebugCommand {
    /// program path
    #[argh(positional)]
    pub file: PathBuf,

    /// add breakpoint at address
    #[argh(option, short = 'b')]
    pub breakpoint: Vec<String>,

    /// random seed
    #[argh(option)]
    pub seed: Option<u64>,

    /// bind a memory extension to a slot
    #[argh(option)]
    pub memext: Option<u8>,

    /// bind the ROM device to a slot
    #[argh(option)]
    pub rom: Option<u8>,

    /// ROM file path (defaults to rom.crm)
    #[argh(option)]
    pub rom_file: Option<PathBuf>,

    /// bind the floating-point device to a slot
    #[argh(option)]
    pub fpu: Option<u8>,
}

/// show version
#[derive(FromArgs)]
#[argh(subcommand, name = "version")]
pub struct VersionCommand {}

/// Device bindings shared by the run and debug commands.
struct DeviceOptions {
    seed: Option<u64>,
    memext: Option<u8>,
    rom: Option<u8>,
    rom_file: Option<PathBuf>,
    fpu: Option<u8>,
}

fn main() {
    let args: Args = argh::from_env();

    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).compact().init();

    match parse_args(args) {
        Ok(code) => process::exit(code),
        Err(error) => {
            eprintln!("error: {}", error);
            process::exit(1);
        }
    }
}

/// Parse arguments.
fn parse_args(args: Args) -> CResult<i32> {
    match args.nested {
        SubCommands::Version(_) => {
            println!("chip64 {}", env!("CARGO_PKG_VERSION"));
            Ok(0)
        }
        SubCommands::Run(cmd) => {
            let program = Program::load_from_file(&cmd.file)?;

            let mut emulator = Emulator::new();
            let mut ctx = EmulatorContext::new();

            if let Some(ref trace) = cmd.trace {
                emulator.set_tracefile(trace);
            }
            ctx.prepare_tracefile(&emulator.cpu.tracefile)?;

            setup_devices(
                &mut emulator,
                DeviceOptions {
                    seed: cmd.seed,
                    memext: cmd.memext,
                    rom: cmd.rom,
                    rom_file: cmd.rom_file,
                    fpu: cmd.fpu,
                },
            )?;

            info!("running program {}", program.get_title());
            emulator.load_program(&program);
            let status = emulator.run(&mut ctx);

            Ok(status.exit_code())
        }
        SubCommands::Debug(cmd) => {
            let program = Program::load_from_file(&cmd.file)?;

            let mut emulator = Emulator::new();
            let mut emulator_ctx = EmulatorContext::new();
            let mut debug_ctx = DebuggerContext::new();
            let mut stream = DebuggerStream::new();
            stream.use_console(true);

            setup_devices(
                &mut emulator,
                DeviceOptions {
                    seed: cmd.seed,
                    memext: cmd.memext,
                    rom: cmd.rom,
                    rom_file: cmd.rom_file,
                    fpu: cmd.fpu,
                },
            )?;

            for bp in &cmd.breakpoint {
                debug_ctx.register_breakpoint_str(bp)?;
            }

            info!("debugging program {}", program.get_title());
            emulator.load_program(&program);

            let debugger = Debugger::new();
            let status = debugger.run(&mut emulator, &mut emulator_ctx, &mut debug_ctx, &mut stream);

            Ok(status.exit_code())
        }
    }
}

/// Apply device options to an emulator.
fn setup_devices(emulator: &mut Emulator, options: DeviceOptions) -> CResult {
    if let Some(seed) = options.seed {
        seed_random(seed);
    }

    if let Some(slot) = options.memext {
        emulator
            .cpu
            .bus
            .attach(usize::from(slot), Box::new(MemoryExtension::new()))?;
    }

    if let Some(slot) = options.rom {
        let rom = match options.rom_file {
            Some(ref path) => Rom::from_file(path)?,
            None => Rom::from_file(Path::new(chip64_core::devices::ROM_FILENAME))?,
        };

        emulator.cpu.bus.attach(usize::from(slot), Box::new(rom))?;
    }

    if let Some(slot) = options.fpu {
        emulator.cpu.bus.attach(usize::from(slot), Box::new(Fpu::new()))?;
    }

    Ok(())
}
