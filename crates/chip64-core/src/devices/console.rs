//! Console device.

use std::{
    error::Error,
    fmt,
    io::{self, BufRead, BufReader, Write},
};

use super::Device;
use crate::{core::types::C64Word, errors::CResult};

/// Largest value the console can carry, in bytes.
const VALUE_MAX_BYTES: usize = 16;

/// Console parse error.
#[derive(Debug)]
pub struct ConsoleParseError(pub String);

impl Error for ConsoleParseError {
    fn description(&self) -> &str {
        "console parse error"
    }
}

impl fmt::Display for ConsoleParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "could not parse console input: {}", self.0)
    }
}

/// Console value error.
#[derive(Debug)]
pub struct ConsoleValueError(pub usize);

impl Error for ConsoleValueError {
    fn description(&self) -> &str {
        "console value error"
    }
}

impl fmt::Display for ConsoleValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "console value too wide: {} bytes", self.0)
    }
}

/// Console I/O device.
///
/// The device pointer is a format code: 0 selects decimal, 1 hexadecimal.
/// Values travel big-endian; reads are line-oriented and writes emit no
/// separator between calls. Streams default to stdin/stdout and can be
/// swapped out for tests.
pub struct ConsoleIO {
    format_code: C64Word,
    input: Box<dyn BufRead>,
    output: Box<dyn Write>,
}

impl ConsoleIO {
    /// Create console over stdin/stdout, in decimal format.
    ///
    /// # Returns
    ///
    /// * Console instance.
    ///
    pub fn new() -> Self {
        ConsoleIO {
            format_code: 0,
            input: Box::new(BufReader::new(io::stdin())),
            output: Box::new(io::stdout()),
        }
    }

    /// Create console over arbitrary streams.
    ///
    /// # Arguments
    ///
    /// * `input` - Input stream.
    /// * `output` - Output stream.
    ///
    /// # Returns
    ///
    /// * Console instance.
    ///
    pub fn with_streams(input: Box<dyn BufRead>, output: Box<dyn Write>) -> Self {
        ConsoleIO {
            format_code: 0,
            input,
            output,
        }
    }

    fn read_token(&mut self) -> CResult<String> {
        let mut line = String::new();
        self.input.read_line(&mut line)?;

        Ok(line.trim().to_string())
    }

    fn parse_token(&self, token: &str) -> CResult<u128> {
        let parsed = if self.format_code == 0 {
            token.parse::<u128>()
        } else {
            u128::from_str_radix(token, 16)
        };

        parsed.map_err(|_| Box::new(ConsoleParseError(token.to_string())) as Box<dyn Error>)
    }
}

/// Pack a value into `count` big-endian bytes, truncating or zero-extending.
fn value_to_bytes(value: u128, count: usize) -> Vec<u8> {
    let raw = value.to_be_bytes();

    if count <= VALUE_MAX_BYTES {
        raw[VALUE_MAX_BYTES - count..].to_vec()
    } else {
        let mut bytes = vec![0; count - VALUE_MAX_BYTES];
        bytes.extend_from_slice(&raw);
        bytes
    }
}

fn bytes_to_value(bytes: &[u8]) -> Result<u128, ConsoleValueError> {
    if bytes.len() > VALUE_MAX_BYTES {
        return Err(ConsoleValueError(bytes.len()));
    }

    Ok(bytes.iter().fold(0u128, |acc, b| (acc << 8) | u128::from(*b)))
}

impl Device for ConsoleIO {
    fn name(&self) -> &'static str {
        "console-io"
    }

    fn write(&mut self, bytes: &[u8]) -> CResult {
        if bytes.is_empty() {
            return Ok(());
        }

        if self.format_code == 0 {
            let value = bytes_to_value(bytes)?;
            write!(self.output, "{}", value)?;
        } else {
            for byte in bytes {
                write!(self.output, "{:02X}", byte)?;
            }
        }

        self.output.flush()?;
        Ok(())
    }

    fn read(&mut self, count: usize) -> CResult<Vec<u8>> {
        let token = self.read_token()?;
        let value = self.parse_token(&token)?;

        Ok(value_to_bytes(value, count))
    }

    fn set_pointer(&mut self, value: C64Word) {
        self.format_code = value & 1;
    }

    fn get_pointer(&self) -> C64Word {
        self.format_code
    }
}

impl Default for ConsoleIO {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, io::Cursor, rc::Rc};

    use super::*;

    #[derive(Clone, Default)]
    struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.borrow().clone()).unwrap()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn console_with(input: &str) -> (ConsoleIO, SharedBuffer) {
        let buffer = SharedBuffer::default();
        let console = ConsoleIO::with_streams(
            Box::new(Cursor::new(input.to_string())),
            Box::new(buffer.clone()),
        );

        (console, buffer)
    }

    #[test]
    fn test_write_decimal() {
        let (mut console, buffer) = console_with("");

        console.write(&[0x00, 0x2A]).unwrap();
        console.write(&[0x07]).unwrap();
        assert_eq!(buffer.contents(), "427");
    }

    #[test]
    fn test_write_hex() {
        let (mut console, buffer) = console_with("");

        console.set_pointer(1);
        console.write(&[0x00, 0x2A]).unwrap();
        assert_eq!(buffer.contents(), "002A");
    }

    #[test]
    fn test_write_empty() {
        let (mut console, buffer) = console_with("");

        console.write(&[]).unwrap();
        assert_eq!(buffer.contents(), "");
    }

    #[test]
    fn test_write_too_wide() {
        let (mut console, _) = console_with("");

        assert!(console.write(&[0; 17]).is_err());
    }

    #[test]
    fn test_read_decimal() {
        let (mut console, _) = console_with("42\n");

        assert_eq!(console.read(2).unwrap(), vec![0x00, 0x2A]);
    }

    #[test]
    fn test_read_hex() {
        let (mut console, _) = console_with("BEEF\n");

        console.set_pointer(1);
        assert_eq!(console.read(2).unwrap(), vec![0xBE, 0xEF]);
    }

    #[test]
    fn test_read_truncates_and_extends() {
        let (mut console, _) = console_with("65535\n300\n");

        // 0xFFFF truncated to one byte.
        assert_eq!(console.read(1).unwrap(), vec![0xFF]);
        // 300 zero-extended to four bytes.
        assert_eq!(console.read(4).unwrap(), vec![0x00, 0x00, 0x01, 0x2C]);
    }

    #[test]
    fn test_read_parse_failure() {
        let (mut console, _) = console_with("not-a-number\n");

        assert!(console.read(2).is_err());
    }

    #[test]
    fn test_format_code() {
        let (mut console, _) = console_with("");

        assert_eq!(console.get_pointer(), 0);
        console.set_pointer(0x0003);
        assert_eq!(console.get_pointer(), 1);
    }
}
