//! Save state.

use std::{
    error::Error,
    fmt,
    fs::File,
    io::{Read, Write},
    path::Path,
};

use nanoserde::{DeBin, SerBin};

use super::{cpu::CPU, memory::Memory, registers::Registers, stack::Stack, types::C64Addr};
use crate::errors::CResult;

/// Missing save state.
#[derive(Debug)]
pub struct MissingSaveState(pub String);

impl Error for MissingSaveState {
    fn description(&self) -> &str {
        "missing save state"
    }
}

impl fmt::Display for MissingSaveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "save state is not found: {}", self.0)
    }
}

/// Save state.
///
/// Snapshot of the machine state. Devices keep their own state and are not
/// part of a snapshot.
#[derive(Clone, SerBin, DeBin, Debug)]
pub struct SaveState {
    /// Version.
    pub version: String,
    /// Registers.
    pub registers: Registers,
    /// Address space.
    pub memory: Memory,
    /// Call stack.
    pub stack: Stack,
    /// Program counter.
    pub pc: C64Addr,
    /// Alert flag.
    pub alert: bool,
    /// Instruction count.
    pub instruction_count: usize,
}

impl SaveState {
    /// Create save state from CPU.
    ///
    /// # Arguments
    ///
    /// * `cpu` - CPU.
    ///
    /// # Returns
    ///
    /// * Save state instance.
    ///
    pub fn save_from_cpu(cpu: &CPU) -> SaveState {
        SaveState {
            version: env!("CARGO_PKG_VERSION").to_owned(),
            registers: cpu.registers.clone(),
            memory: cpu.memory.clone(),
            stack: cpu.stack.clone(),
            pc: cpu.pc,
            alert: cpu.alert,
            instruction_count: cpu.instruction_count,
        }
    }

    /// Write save state to file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to file.
    ///
    /// # Returns
    ///
    /// * Result.
    ///
    pub fn write_to_file(&self, path: &str) -> CResult {
        let state_bin = SerBin::serialize_bin(self);
        let mut file = File::create(path)?;
        file.write_all(&state_bin)?;

        Ok(())
    }

    /// Read save state from file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to file.
    ///
    /// # Returns
    ///
    /// * Save state result.
    ///
    pub fn read_from_file(path: &str) -> CResult<SaveState> {
        let path_p = Path::new(path);
        if !path_p.exists() {
            return Err(Box::new(MissingSaveState(path.to_string())));
        }

        let mut file = File::open(path)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;

        DeBin::deserialize_bin(&data).map_err(|e| format!("corrupt save state: {:?}", e).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_roundtrip() {
        let mut cpu = CPU::new();
        cpu.registers.set_register(3, 0x1234);
        cpu.memory.set_pointer(0x200);
        cpu.pc = 0x042;
        cpu.alert = true;

        let state = SaveState::save_from_cpu(&cpu);
        let bin = SerBin::serialize_bin(&state);
        let restored: SaveState = DeBin::deserialize_bin(&bin).unwrap();

        let mut other = CPU::new();
        other.load_savestate(restored);
        assert_eq!(other.registers.get_register(3), 0x1234);
        assert_eq!(other.memory.get_pointer(), 0x200);
        assert_eq!(other.pc, 0x042);
        assert!(other.alert);
    }
}
