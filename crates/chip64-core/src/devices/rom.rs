//! Rom device.

use std::{
    error::Error,
    fmt,
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

use super::Device;
use crate::{core::types::C64Word, errors::CResult};

/// Default ROM file name.
pub const ROM_FILENAME: &str = "rom.crm";

/// ROM size limit.
pub const ROM_MAX_SIZE: usize = 65536;

/// Missing ROM error.
#[derive(Debug)]
pub struct MissingRomError(pub PathBuf);

impl Error for MissingRomError {
    fn description(&self) -> &str {
        "missing rom"
    }
}

impl fmt::Display for MissingRomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ROM file is not found: {:?}", self.0)
    }
}

/// ROM write error.
#[derive(Debug)]
pub struct RomWriteError;

impl Error for RomWriteError {
    fn description(&self) -> &str {
        "rom write"
    }
}

impl fmt::Display for RomWriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ROM device is read-only")
    }
}

/// Rom device.
///
/// Read-only view of a ROM image, addressed like the memory extension.
/// Bytes past the end of the image read as 0; writes are faults.
pub struct Rom {
    data: Vec<u8>,
    pointer: C64Word,
}

impl Rom {
    /// Load ROM from the default `rom.crm` file.
    ///
    /// # Returns
    ///
    /// * Rom result.
    ///
    pub fn open() -> CResult<Rom> {
        Rom::from_file(Path::new(ROM_FILENAME))
    }

    /// Load ROM from a file, keeping at most 65536 bytes.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to file.
    ///
    /// # Returns
    ///
    /// * Rom result.
    ///
    pub fn from_file(path: &Path) -> CResult<Rom> {
        let mut file =
            File::open(path).map_err(|_| MissingRomError(path.to_path_buf()))?;

        let mut contents = Vec::with_capacity(ROM_MAX_SIZE);
        file.read_to_end(&mut contents)?;
        contents.truncate(ROM_MAX_SIZE);

        Ok(Rom::from_bytes(contents))
    }

    /// Create ROM from bytes.
    ///
    /// # Arguments
    ///
    /// * `data` - ROM contents.
    ///
    /// # Returns
    ///
    /// * Rom instance.
    ///
    pub fn from_bytes(mut data: Vec<u8>) -> Rom {
        data.truncate(ROM_MAX_SIZE);

        Rom { data, pointer: 0 }
    }
}

impl Device for Rom {
    fn name(&self) -> &'static str {
        "rom"
    }

    fn write(&mut self, _bytes: &[u8]) -> CResult {
        Err(Box::new(RomWriteError))
    }

    fn read(&mut self, count: usize) -> CResult<Vec<u8>> {
        let mut bytes = Vec::with_capacity(count);

        for _ in 0..count {
            let byte = self.data.get(self.pointer as usize).copied().unwrap_or(0);
            bytes.push(byte);
            self.pointer = self.pointer.wrapping_add(1);
        }

        Ok(bytes)
    }

    fn set_pointer(&mut self, value: C64Word) {
        self.pointer = value;
    }

    fn get_pointer(&self) -> C64Word {
        self.pointer
    }
}
