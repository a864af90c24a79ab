//! Chip64 emulator.

use std::{
    fs::{File, OpenOptions},
    io::Write,
};

use crate::{
    core::{
        cpu::{ExecutionState, CPU},
        memory::MEMORY_SIZE,
        opcodes,
        savestate::SaveState,
    },
    errors::CResult,
    program::Program,
    trace_exec,
};

/// Chip64 emulator.
#[derive(Default)]
pub struct Emulator {
    /// CPU handle.
    pub cpu: CPU,
}

/// Emulation state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EmulationState {
    /// Normal.
    Normal,
    /// Halted.
    Halted,
    /// Program counter left the address space.
    OutOfBounds,
}

/// Terminal status.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TerminalStatus {
    /// Halted with the alert flag clear.
    HaltedCleanly,
    /// Halted with the alert flag raised.
    HaltedWithAlert,
    /// Program counter left the address space.
    OutOfBounds,
}

impl TerminalStatus {
    /// Get process exit code for this status.
    ///
    /// # Returns
    ///
    /// * Exit code.
    ///
    pub fn exit_code(self) -> i32 {
        match self {
            TerminalStatus::HaltedCleanly => 0,
            TerminalStatus::HaltedWithAlert => 1,
            TerminalStatus::OutOfBounds => 2,
        }
    }
}

/// Tracefile handle.
#[derive(Debug)]
pub enum TracefileHandle {
    /// File.
    File(File),
    /// Stdout.
    Stdout,
}

/// Emulator context.
#[derive(Default)]
pub struct EmulatorContext {
    tracefile_handle: Option<TracefileHandle>,
}

impl EmulatorContext {
    /// Create new emulator context.
    ///
    /// # Returns
    ///
    /// * Emulator context.
    ///
    pub fn new() -> Self {
        Default::default()
    }

    /// Prepare tracefile.
    ///
    /// # Arguments
    ///
    /// * `tracefile` - Tracefile.
    ///
    /// # Returns
    ///
    /// * Result.
    ///
    pub fn prepare_tracefile(&mut self, tracefile: &Option<String>) -> CResult {
        self.tracefile_handle = match tracefile {
            Some(ref path) => {
                if path == "-" {
                    Some(TracefileHandle::Stdout)
                } else {
                    Some(TracefileHandle::File(
                        OpenOptions::new().write(true).create(true).open(path)?,
                    ))
                }
            }
            None => None,
        };

        Ok(())
    }
}

impl Emulator {
    /// Create new Chip64 emulator.
    ///
    /// # Returns
    ///
    /// * Emulator instance.
    ///
    pub fn new() -> Self {
        Default::default()
    }

    /// Set CPU tracefile.
    ///
    /// # Arguments
    ///
    /// * `tracefile` - Tracefile.
    ///
    pub fn set_tracefile(&mut self, tracefile: &str) {
        self.cpu.tracefile(tracefile);
    }

    /// Load program.
    ///
    /// # Arguments
    ///
    /// * `program` - Program.
    ///
    pub fn load_program(&mut self, program: &Program) {
        self.cpu.load_program_data(program);
    }

    /// Save state.
    ///
    /// # Arguments
    ///
    /// * `path` - State file path.
    ///
    /// # Returns
    ///
    /// * Result.
    ///
    pub fn save_state(&self, path: &str) -> CResult {
        let savestate = SaveState::save_from_cpu(&self.cpu);
        savestate.write_to_file(path)
    }

    /// Load state.
    ///
    /// # Arguments
    ///
    /// * `path` - State file path.
    ///
    /// # Returns
    ///
    /// * Result.
    ///
    pub fn load_state(&mut self, path: &str) -> CResult {
        let savestate = SaveState::read_from_file(path)?;
        self.cpu.load_savestate(savestate);

        Ok(())
    }

    /// Reset.
    ///
    /// # Arguments
    ///
    /// * `program` - Program.
    ///
    pub fn reset(&mut self, program: &Program) {
        self.cpu.reset();
        self.cpu.load_program_data(program);
    }

    /// Step emulation.
    ///
    /// Fetches, decodes and executes one instruction.
    ///
    /// # Arguments
    ///
    /// * `ctx` - Emulator context.
    ///
    /// # Returns
    ///
    /// * Emulation state.
    ///
    pub fn step(&mut self, ctx: &mut EmulatorContext) -> EmulationState {
        match self.cpu.state {
            ExecutionState::Halted => return EmulationState::Halted,
            ExecutionState::OutOfBounds => return EmulationState::OutOfBounds,
            ExecutionState::Running => {}
        }

        if self.cpu.pc as usize >= MEMORY_SIZE {
            self.cpu.state = ExecutionState::OutOfBounds;
            return EmulationState::OutOfBounds;
        }

        // Read next instruction.
        let word = self.cpu.memory.read_word_at_address(self.cpu.pc);
        trace_exec!(
            ctx.tracefile_handle,
            "[{:08X}] {:03X} - reading word 0x{:04X}...",
            self.cpu.instruction_count,
            self.cpu.pc,
            word
        );

        // Trace.
        let opcode_enum = opcodes::get_opcode_enum(word);
        let (assembly, verbose) = opcodes::get_opcode_str(&opcode_enum);
        trace_exec!(ctx.tracefile_handle, "  - {:20} ; {}", assembly, verbose);

        // Execute instruction.
        self.cpu.execute_instruction(&opcode_enum);
        self.cpu.instruction_count += 1;

        match self.cpu.state {
            ExecutionState::Running => EmulationState::Normal,
            ExecutionState::Halted => EmulationState::Halted,
            ExecutionState::OutOfBounds => EmulationState::OutOfBounds,
        }
    }

    /// Run until halt or fault.
    ///
    /// # Arguments
    ///
    /// * `ctx` - Emulator context.
    ///
    /// # Returns
    ///
    /// * Terminal status.
    ///
    pub fn run(&mut self, ctx: &mut EmulatorContext) -> TerminalStatus {
        loop {
            match self.step(ctx) {
                EmulationState::Normal => {}
                EmulationState::Halted | EmulationState::OutOfBounds => {
                    return self.terminal_status();
                }
            }
        }
    }

    /// Get terminal status.
    ///
    /// # Returns
    ///
    /// * Terminal status.
    ///
    pub fn terminal_status(&self) -> TerminalStatus {
        match self.cpu.state {
            ExecutionState::OutOfBounds => TerminalStatus::OutOfBounds,
            _ if self.cpu.alert => TerminalStatus::HaltedWithAlert,
            _ => TerminalStatus::HaltedCleanly,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_program(bytes: &[u8]) -> (Emulator, TerminalStatus) {
        let program = Program::load_from_bytes("test", bytes).unwrap();
        let mut emulator = Emulator::new();
        let mut ctx = EmulatorContext::new();

        emulator.load_program(&program);
        let status = emulator.run(&mut ctx);

        (emulator, status)
    }

    #[test]
    fn test_halt() {
        let (emulator, status) = run_program(&[0x60, 0x05, 0x00, 0x00]);

        assert_eq!(status, TerminalStatus::HaltedCleanly);
        assert_eq!(emulator.cpu.registers.get_register(0), 5);
        assert_eq!(emulator.cpu.pc, 2);
    }

    #[test]
    fn test_implicit_halt_on_zeroed_memory() {
        // No HALT word: execution stops on the first zero word past the
        // program.
        let (emulator, status) = run_program(&[0x60, 0x05]);

        assert_eq!(status, TerminalStatus::HaltedCleanly);
        assert_eq!(emulator.cpu.pc, 2);
    }

    #[test]
    fn test_out_of_bounds() {
        // Jump to the last word; PC then leaves the address space.
        let mut bytes = vec![0; 4096];
        bytes[0] = 0x1F;
        bytes[1] = 0xFE; // GOTO FFE
        bytes[0xFFE] = 0x60;
        bytes[0xFFF] = 0x01; // ACR R0, 01

        let (emulator, status) = run_program(&bytes);
        assert_eq!(status, TerminalStatus::OutOfBounds);
        assert_eq!(emulator.cpu.registers.get_register(0), 1);
    }

    #[test]
    fn test_alert_status() {
        // 8018 is undecodable.
        let (emulator, status) = run_program(&[0x80, 0x18, 0x00, 0x00]);

        assert_eq!(status, TerminalStatus::HaltedWithAlert);
        assert!(emulator.cpu.alert);
        assert_eq!(status.exit_code(), 1);
    }
}
