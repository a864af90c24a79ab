//! Program image.

use std::{
    error::Error,
    fmt,
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

use crate::{core::memory::MEMORY_SIZE, core::types::C64Byte, errors::CResult};

/// Program max size.
pub const PROGRAM_MAX_SIZE: usize = MEMORY_SIZE;

/// Available extensions.
///
/// - No extension ("")
/// - C64 extension (.c64/.C64)
///
const AVAILABLE_EXTENSIONS: [&str; 3] = ["", "c64", "C64"];

/// Missing program error.
#[derive(Debug)]
pub struct MissingProgramError(pub PathBuf);

impl Error for MissingProgramError {
    fn description(&self) -> &str {
        "missing program"
    }
}

impl fmt::Display for MissingProgramError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "program image is not found: {:?}", self.0)
    }
}

/// Oversized program error.
#[derive(Debug)]
pub struct OversizedProgramError(pub usize);

impl Error for OversizedProgramError {
    fn description(&self) -> &str {
        "oversized program"
    }
}

impl fmt::Display for OversizedProgramError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "program image does not fit in the address space: {} bytes (max {})",
            self.0, PROGRAM_MAX_SIZE
        )
    }
}

/// Chip64 program image.
///
/// A sequence of at most 4096 bytes, loaded at address 0. Execution begins
/// at PC = 0.
pub struct Program {
    title: String,
    data: Vec<C64Byte>,
}

impl Program {
    /// Resolve a program path, trying the known extensions.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to file.
    ///
    fn resolve_path(path: &Path) -> Result<PathBuf, MissingProgramError> {
        let mut candidate = path.to_path_buf();

        for ext in &AVAILABLE_EXTENSIONS {
            candidate.set_extension(ext);

            if candidate.exists() {
                return Ok(candidate);
            }
        }

        if path.exists() {
            Ok(path.to_path_buf())
        } else {
            Err(MissingProgramError(path.to_path_buf()))
        }
    }

    /// Load program from a file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to file.
    ///
    /// # Returns
    ///
    /// * Program result.
    ///
    pub fn load_from_file(path: &Path) -> CResult<Program> {
        let resolved = Program::resolve_path(path)?;
        let mut file = File::open(&resolved)?;

        let mut contents = Vec::with_capacity(PROGRAM_MAX_SIZE);
        file.read_to_end(&mut contents)?;

        let title = resolved
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "program".to_string());

        Program::load_from_bytes(&title, &contents)
    }

    /// Load program from bytes.
    ///
    /// # Arguments
    ///
    /// * `title` - Program title.
    /// * `bytes` - Bytes contents.
    ///
    /// # Returns
    ///
    /// * Program result.
    ///
    pub fn load_from_bytes(title: &str, bytes: &[C64Byte]) -> CResult<Program> {
        if bytes.len() > PROGRAM_MAX_SIZE {
            return Err(Box::new(OversizedProgramError(bytes.len())));
        }

        Ok(Program {
            title: title.to_string(),
            data: bytes.to_vec(),
        })
    }

    /// Get program title.
    ///
    /// # Returns
    ///
    /// * Title.
    ///
    pub fn get_title(&self) -> &str {
        &self.title
    }

    /// Get program data.
    ///
    /// # Returns
    ///
    /// * Data.
    ///
    pub fn get_data(&self) -> &[C64Byte] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_bytes() {
        let program = Program::load_from_bytes("test", &[0x60, 0x05, 0x00, 0x00]).unwrap();
        assert_eq!(program.get_title(), "test");
        assert_eq!(program.get_data().len(), 4);
    }

    #[test]
    fn test_oversized_program() {
        let bytes = vec![0; PROGRAM_MAX_SIZE + 1];
        assert!(Program::load_from_bytes("big", &bytes).is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(Program::load_from_file(Path::new("does-not-exist.c64")).is_err());
    }
}
