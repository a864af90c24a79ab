//! Debugger module.

mod breakpoints;
mod context;
mod errors;
mod stream;

pub use breakpoints::Breakpoints;
pub use context::DebuggerContext;
use rustyline::error::ReadlineError;
pub use stream::DebuggerStream;

use crate::{
    core::{
        cpu::CPU,
        memory::MEMORY_SIZE,
        opcodes::{get_opcode_enum, get_opcode_str},
        types::{convert_hex_addr, C64Addr, C64RegIdx},
    },
    emulator::{EmulationState, Emulator, EmulatorContext, TerminalStatus},
};

/// Debugger.
#[derive(Default)]
pub struct Debugger;

/// Register kind.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum RegisterKind {
    /// General register.
    Register(C64RegIdx),
    /// Program counter.
    ProgramCounter,
    /// Memory pointer.
    MemoryPointer,
    /// Stack pointer.
    StackPointer,
}

/// Debugger command.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Quit.
    Quit,
    /// Continue.
    Continue,
    /// Show current line.
    Where,
    /// Current line with context.
    List(u16),
    /// Dump a component.
    Dump(String),
    /// Read register.
    ReadRegister(RegisterKind),
    /// Read memory at offset.
    ReadMemory(C64Addr, C64Addr),
    /// Step instruction.
    Step,
    /// Add breakpoint.
    AddBreakpoint(C64Addr),
    /// Remove breakpoint.
    RemoveBreakpoint(C64Addr),
    /// List breakpoints.
    ListBreakpoints,
    /// Save state to file.
    SaveState(String),
    /// Restore state from file.
    RestoreState(String),
    /// Show help.
    Help,
}

impl Debugger {
    /// Create new debugger.
    ///
    /// # Returns
    ///
    /// * Debugger instance.
    ///
    pub fn new() -> Self {
        Default::default()
    }

    /// Run the debugger until quit or termination.
    ///
    /// # Arguments
    ///
    /// * `emulator` - Emulator instance.
    /// * `emulator_ctx` - Emulator context.
    /// * `debug_ctx` - Debugger context.
    /// * `stream` - Debugger stream.
    ///
    /// # Returns
    ///
    /// * Terminal status.
    ///
    pub fn run(
        &self,
        emulator: &mut Emulator,
        emulator_ctx: &mut EmulatorContext,
        debug_ctx: &mut DebuggerContext,
        stream: &mut DebuggerStream,
    ) -> TerminalStatus {
        debug_ctx.set_address(emulator.cpu.pc);
        self.show_line(&emulator.cpu, stream, debug_ctx.address);

        loop {
            if debug_ctx.should_quit {
                break;
            }

            if debug_ctx.is_paused() {
                self.start_prompt(emulator, debug_ctx, stream);
                continue;
            }

            // Check for breakpoint.
            if debug_ctx.is_continuing && !debug_ctx.breakpoint_hit {
                let addr = emulator.cpu.pc;
                if debug_ctx.breakpoints.check_breakpoint(addr) {
                    stream.writeln_stdout(format!("breakpoint hit at {:03X}", addr));
                    debug_ctx.breakpoint_hit = true;
                    debug_ctx.pause();
                    self.show_line(&emulator.cpu, stream, addr);
                    continue;
                }
            }

            // Step.
            let state = emulator.step(emulator_ctx);
            debug_ctx.breakpoint_hit = false;
            debug_ctx.set_address(emulator.cpu.pc);

            match state {
                EmulationState::Normal => {
                    if debug_ctx.is_stepping {
                        debug_ctx.is_stepping = false;
                        self.show_line(&emulator.cpu, stream, debug_ctx.address);
                    }
                }
                EmulationState::Halted => {
                    stream.writeln_stdout("machine halted");
                    debug_ctx.pause();
                }
                EmulationState::OutOfBounds => {
                    stream.writeln_stdout("program counter left the address space");
                    debug_ctx.pause();
                }
            }
        }

        emulator.terminal_status()
    }

    /// Start prompt.
    ///
    /// # Arguments
    ///
    /// * `emulator` - Emulator instance.
    /// * `ctx` - Debugger context.
    /// * `stream` - Debugger stream.
    ///
    pub fn start_prompt(
        &self,
        emulator: &mut Emulator,
        ctx: &mut DebuggerContext,
        stream: &mut DebuggerStream,
    ) {
        'read: loop {
            let readline = ctx.editor.readline("> ");

            match readline {
                Ok(line) => {
                    ctx.editor.add_history_entry(&line);
                    let command = self.read_command(&line, stream);

                    if let Some(cmd) = command {
                        self.handle_command(emulator, ctx, stream, cmd);
                        break 'read;
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                    ctx.should_quit = true;
                    break 'read;
                }
                Err(err) => {
                    stream.writeln_stderr(format!("readline error: {}", err));
                }
            }
        }
    }

    /// Read command.
    ///
    /// # Arguments
    ///
    /// * `cmd` - Command line.
    /// * `stream` - Debugger stream.
    ///
    /// # Returns
    ///
    /// * Command option.
    ///
    pub fn read_command(&self, cmd: &str, stream: &mut DebuggerStream) -> Option<Command> {
        let cmd_split: Vec<&str> = cmd.split_whitespace().collect();
        if cmd_split.is_empty() {
            return None;
        }

        let command = cmd_split[0];

        match command {
            "quit" | "q" => Some(Command::Quit),
            "continue" | "c" => Some(Command::Continue),
            "step" | "s" | "next" | "n" => Some(Command::Step),
            "where" | "w" => Some(Command::Where),
            "help" | "h" => Some(Command::Help),
            "list" | "l" => {
                if cmd_split.len() == 1 {
                    // Default context size.
                    Some(Command::List(2))
                } else if let Ok(sz) = cmd_split[1].parse::<u16>() {
                    Some(Command::List(sz))
                } else {
                    stream.writeln_stdout("usage: list [context_size=2]");
                    None
                }
            }
            "dump" | "d" => {
                if cmd_split.len() == 2 {
                    Some(Command::Dump(cmd_split[1].to_string()))
                } else {
                    stream.writeln_stdout("usage: dump component");
                    stream.writeln_stdout("  components:");
                    stream.writeln_stdout("    - cpu");
                    stream.writeln_stdout("    - memory");
                    stream.writeln_stdout("    - registers");
                    stream.writeln_stdout("    - stack");
                    stream.writeln_stdout("    - devices");
                    None
                }
            }
            "read-reg" | "rreg" => {
                if cmd_split.len() == 2 {
                    self.parse_register(cmd_split[1], stream)
                        .map(Command::ReadRegister)
                } else {
                    stream.writeln_stdout("usage: read-reg reg");
                    None
                }
            }
            "read-mem" | "rmem" => {
                if cmd_split.len() == 3 {
                    match (
                        convert_hex_addr(cmd_split[1]),
                        convert_hex_addr(cmd_split[2]),
                    ) {
                        (Some(addr), Some(count)) => Some(Command::ReadMemory(addr, count)),
                        _ => {
                            stream.writeln_stderr("error: bad address or count");
                            None
                        }
                    }
                } else {
                    stream.writeln_stdout("usage: read-mem addr count");
                    None
                }
            }
            "add-bp" | "b" => {
                if cmd_split.len() == 2 {
                    if let Some(addr) = convert_hex_addr(cmd_split[1]) {
                        Some(Command::AddBreakpoint(addr))
                    } else {
                        stream.writeln_stderr(format!("error: bad address {}", cmd_split[1]));
                        None
                    }
                } else {
                    stream.writeln_stdout("usage: add-bp addr");
                    None
                }
            }
            "remove-bp" | "rb" => {
                if cmd_split.len() == 2 {
                    if let Some(addr) = convert_hex_addr(cmd_split[1]) {
                        Some(Command::RemoveBreakpoint(addr))
                    } else {
                        stream.writeln_stderr(format!("error: bad address {}", cmd_split[1]));
                        None
                    }
                } else {
                    stream.writeln_stdout("usage: remove-bp addr");
                    None
                }
            }
            "list-bp" | "lb" => Some(Command::ListBreakpoints),
            "save" => {
                if cmd_split.len() == 2 {
                    Some(Command::SaveState(cmd_split[1].to_string()))
                } else {
                    stream.writeln_stdout("usage: save path");
                    None
                }
            }
            "restore" => {
                if cmd_split.len() == 2 {
                    Some(Command::RestoreState(cmd_split[1].to_string()))
                } else {
                    stream.writeln_stdout("usage: restore path");
                    None
                }
            }
            _ => {
                stream.writeln_stderr(format!("unknown command: {}", command));
                None
            }
        }
    }

    fn parse_register(&self, arg: &str, stream: &mut DebuggerStream) -> Option<RegisterKind> {
        let arg = arg.to_ascii_lowercase();

        match &arg[..] {
            "pc" => return Some(RegisterKind::ProgramCounter),
            "mp" => return Some(RegisterKind::MemoryPointer),
            "sp" => return Some(RegisterKind::StackPointer),
            _ => (),
        }

        let mut chars = arg.chars();
        match chars.next() {
            Some('r') => {
                let reg_idx: String = chars.collect();
                match C64RegIdx::from_str_radix(&reg_idx, 16) {
                    Ok(idx) if idx <= 0xF => Some(RegisterKind::Register(idx)),
                    _ => {
                        stream.writeln_stderr(format!("error: bad register index: {}", reg_idx));
                        None
                    }
                }
            }
            _ => {
                stream.writeln_stderr(format!("error: unknown register kind: {}", arg));
                None
            }
        }
    }

    /// Handle command.
    ///
    /// # Arguments
    ///
    /// * `emulator` - Emulator instance.
    /// * `ctx` - Debugger context.
    /// * `stream` - Debugger stream.
    /// * `command` - Command.
    ///
    pub fn handle_command(
        &self,
        emulator: &mut Emulator,
        ctx: &mut DebuggerContext,
        stream: &mut DebuggerStream,
        command: Command,
    ) {
        match command {
            Command::Quit => ctx.should_quit = true,
            Command::Continue => {
                ctx.is_continuing = true;
            }
            Command::Step => {
                ctx.is_stepping = true;
            }
            Command::Where => self.show_line(&emulator.cpu, stream, emulator.cpu.pc),
            Command::List(sz) => {
                let around = i32::from(sz) * 2;
                let pc = i32::from(emulator.cpu.pc);

                for offset in (-around..=around).step_by(2) {
                    let addr = pc + offset;
                    if addr < 0 || addr as usize >= MEMORY_SIZE {
                        continue;
                    }

                    self.show_line_with_cursor(
                        &emulator.cpu,
                        stream,
                        addr as C64Addr,
                        offset == 0,
                    );
                }
            }
            Command::Dump(component) => self.dump(emulator, stream, &component),
            Command::ReadRegister(kind) => {
                let cpu = &emulator.cpu;
                match kind {
                    RegisterKind::Register(idx) => stream.writeln_stdout(format!(
                        "R{:X}: {:04X}",
                        idx,
                        cpu.registers.get_register(idx)
                    )),
                    RegisterKind::ProgramCounter => {
                        stream.writeln_stdout(format!("PC: {:03X}", cpu.pc))
                    }
                    RegisterKind::MemoryPointer => {
                        stream.writeln_stdout(format!("MP: {:03X}", cpu.memory.get_pointer()))
                    }
                    RegisterKind::StackPointer => {
                        stream.writeln_stdout(format!("SP: {:02X}", cpu.stack.get_pointer()))
                    }
                }
            }
            Command::ReadMemory(addr, count) => {
                let data = emulator.cpu.memory.read_data_at_offset(addr, count as usize);
                let bytes: Vec<String> = data.iter().map(|b| format!("{:02X}", b)).collect();
                stream.writeln_stdout(format!("{:03X}| {}", addr, bytes.join(" ")));
            }
            Command::AddBreakpoint(addr) => {
                stream.writeln_stdout(format!("breakpoint added at {:03X}", addr));
                ctx.register_breakpoint(addr);
            }
            Command::RemoveBreakpoint(addr) => {
                stream.writeln_stdout(format!("breakpoint removed at {:03X}", addr));
                ctx.unregister_breakpoint(addr);
            }
            Command::ListBreakpoints => {
                let addresses = ctx.breakpoints.get_addresses();
                if addresses.is_empty() {
                    stream.writeln_stdout("no breakpoints");
                } else {
                    for addr in addresses {
                        stream.writeln_stdout(format!("  - {:03X}", addr));
                    }
                }
            }
            Command::SaveState(path) => match emulator.save_state(&path) {
                Ok(()) => stream.writeln_stdout(format!("state saved to {}", path)),
                Err(e) => stream.writeln_stderr(format!("error: {}", e)),
            },
            Command::RestoreState(path) => match emulator.load_state(&path) {
                Ok(()) => {
                    ctx.set_address(emulator.cpu.pc);
                    stream.writeln_stdout(format!("state restored from {}", path));
                }
                Err(e) => stream.writeln_stderr(format!("error: {}", e)),
            },
            Command::Help => self.show_help(stream),
        }
    }

    fn show_line(&self, cpu: &CPU, stream: &mut DebuggerStream, addr: C64Addr) {
        self.show_line_with_cursor(cpu, stream, addr, false);
    }

    fn show_line_with_cursor(
        &self,
        cpu: &CPU,
        stream: &mut DebuggerStream,
        addr: C64Addr,
        cursor: bool,
    ) {
        let word = cpu.memory.read_word_at_address(addr);
        let opcode = get_opcode_enum(word);
        let (assembly, verbose) = get_opcode_str(&opcode);
        let marker = if cursor { "*" } else { " " };

        stream.writeln_stdout(format!(
            "{:03X}|{}({:04X})  {:20} ; {}",
            addr, marker, word, assembly, verbose
        ));
    }

    fn dump(&self, emulator: &Emulator, stream: &mut DebuggerStream, component: &str) {
        match component {
            "cpu" => stream.writeln_stdout(format!("{:?}", emulator.cpu)),
            "memory" => stream.writeln_stdout(format!("{:?}", emulator.cpu.memory)),
            "registers" => stream.writeln_stdout(format!("{:?}", emulator.cpu.registers)),
            "stack" => stream.writeln_stdout(format!("{:?}", emulator.cpu.stack)),
            "devices" => stream.writeln_stdout(format!("{:?}", emulator.cpu.bus)),
            _ => stream.writeln_stderr(format!("unknown component: {}", component)),
        }
    }

    fn show_help(&self, stream: &mut DebuggerStream) {
        stream.writeln_stdout("commands:");
        stream.writeln_stdout("  continue|c            resume execution");
        stream.writeln_stdout("  step|s|next|n         execute one instruction");
        stream.writeln_stdout("  where|w               show current instruction");
        stream.writeln_stdout("  list|l [size]         show instructions around PC");
        stream.writeln_stdout("  dump|d component      dump cpu/memory/registers/stack/devices");
        stream.writeln_stdout("  read-reg|rreg reg     read register (r0-rF, pc, mp, sp)");
        stream.writeln_stdout("  read-mem|rmem a n     read n bytes at address a");
        stream.writeln_stdout("  add-bp|b addr         add breakpoint");
        stream.writeln_stdout("  remove-bp|rb addr     remove breakpoint");
        stream.writeln_stdout("  list-bp|lb            list breakpoints");
        stream.writeln_stdout("  save path             save machine state");
        stream.writeln_stdout("  restore path          restore machine state");
        stream.writeln_stdout("  quit|q                quit");
    }
}
