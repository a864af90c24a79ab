//! Address space.

use std::fmt;

use nanoserde::{DeBin, SerBin};

use super::{
    opcodes::extract_word_from_array,
    types::{C64Addr, C64Byte, C64Word},
};

/// Address space size.
pub const MEMORY_SIZE: usize = 4096;

/// Address mask (12 significant bits).
pub const ADDRESS_MASK: C64Addr = 0x0FFF;

/// Hexdump chunk size.
const CHUNK_SIZE: usize = 32;

/// Address space struct.
///
/// 4096 bytes of linear memory holding both program bytes and data, plus
/// the memory pointer (MP) used by the load/store and device opcodes.
#[derive(Clone, SerBin, DeBin, Default)]
pub struct Memory {
    data: Vec<C64Byte>,
    pointer: C64Addr,
}

impl Memory {
    /// Create new memory.
    ///
    /// # Returns
    ///
    /// * Memory instance.
    ///
    pub fn new() -> Self {
        Memory {
            data: vec![0; MEMORY_SIZE],
            pointer: 0,
        }
    }

    /// Check that a byte range fits in the address space.
    ///
    /// # Arguments
    ///
    /// * `offset` - Offset.
    /// * `count` - Count.
    ///
    /// # Returns
    ///
    /// * `true` if `[offset, offset + count)` is fully addressable.
    ///
    pub fn range_fits(&self, offset: C64Addr, count: usize) -> bool {
        (offset as usize).saturating_add(count) <= MEMORY_SIZE
    }

    /// Write data at offset, truncating at the top of memory.
    ///
    /// # Arguments
    ///
    /// * `offset` - Offset.
    /// * `data` - Data (bytes).
    ///
    /// # Returns
    ///
    /// * `true` if the range was truncated.
    ///
    pub fn write_data_at_offset(&mut self, offset: C64Addr, data: &[C64Byte]) -> bool {
        let start = offset as usize;

        for (idx, v) in data.iter().enumerate() {
            let addr = start + idx;
            if addr >= MEMORY_SIZE {
                return true;
            }

            self.data[addr] = *v;
        }

        false
    }

    /// Write byte at offset.
    ///
    /// # Arguments
    ///
    /// * `offset` - Offset.
    /// * `byte` - Byte.
    ///
    pub fn write_byte_at_offset(&mut self, offset: C64Addr, byte: C64Byte) {
        self.data[offset as usize] = byte
    }

    /// Get data at offset, truncated to the valid window.
    ///
    /// # Arguments
    ///
    /// * `offset` - Offset.
    /// * `count` - Count.
    ///
    /// # Returns
    ///
    /// * Data.
    ///
    pub fn read_data_at_offset(&self, offset: C64Addr, count: usize) -> &[C64Byte] {
        let start = (offset as usize).min(MEMORY_SIZE);
        let end = start.saturating_add(count).min(MEMORY_SIZE);

        &self.data[start..end]
    }

    /// Get byte at offset.
    ///
    /// # Arguments
    ///
    /// * `offset` - Offset.
    ///
    /// # Returns
    ///
    /// * Byte.
    ///
    pub fn read_byte_at_offset(&self, offset: C64Addr) -> C64Byte {
        self.data[offset as usize]
    }

    /// Read 16-bit word at address.
    ///
    /// Words are stored big-endian; the high-order byte occupies the lower
    /// address. An incomplete word at the top of memory reads as 0.
    ///
    /// # Arguments
    ///
    /// * `addr` - Address.
    ///
    /// # Returns
    ///
    /// * Word value.
    ///
    pub fn read_word_at_address(&self, addr: C64Addr) -> C64Word {
        extract_word_from_array(&self.data, addr as usize)
    }

    /// Set memory pointer.
    ///
    /// # Arguments
    ///
    /// * `pointer` - Pointer.
    ///
    pub fn set_pointer(&mut self, pointer: C64Addr) {
        self.pointer = pointer & ADDRESS_MASK;
    }

    /// Get memory pointer.
    ///
    /// # Returns
    ///
    /// * Pointer value.
    ///
    pub fn get_pointer(&self) -> C64Addr {
        self.pointer
    }

    /// Advance memory pointer, wrapping modulo 4096.
    ///
    /// # Arguments
    ///
    /// * `offset` - Offset to add.
    ///
    pub fn advance_pointer(&mut self, offset: C64Addr) {
        self.pointer = self.pointer.wrapping_add(offset) & ADDRESS_MASK;
    }

    /// Get data.
    ///
    /// # Returns
    ///
    /// * Data.
    ///
    pub fn get_data(&self) -> &[C64Byte] {
        &self.data
    }

    /// Reset memory.
    pub fn reset(&mut self) {
        self.data = vec![0; MEMORY_SIZE];
        self.pointer = 0;
    }

    /// Load from save.
    ///
    /// # Arguments
    ///
    /// * `memory` - Memory.
    ///
    pub fn load_from_save(&mut self, memory: Memory) {
        self.data = memory.data;
        self.pointer = memory.pointer;
    }
}

impl fmt::Debug for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, chunk) in self.data.chunks(CHUNK_SIZE).enumerate() {
            write!(
                f,
                "    {:04X}-{:04X} | ",
                idx * CHUNK_SIZE,
                (idx + 1) * CHUNK_SIZE
            )?;

            for chunk_value in chunk.iter() {
                write!(f, "{:02X} ", chunk_value)?;
            }

            writeln!(f)?;
        }

        writeln!(f, "    MP: {:03X}", self.pointer)
    }
}
