//! Device module.

mod console;
mod fpu;
mod memext;
mod rom;

use std::{error::Error, fmt};

pub use console::ConsoleIO;
pub use fpu::Fpu;
pub use memext::MemoryExtension;
pub use rom::{Rom, ROM_FILENAME};
use tracing::debug;

use crate::{
    core::types::{C64RegIdx, C64Word},
    errors::CResult,
};

/// Device slot count.
pub const DEVICE_SLOT_COUNT: usize = 16;

/// Device protocol.
///
/// A device is a pluggable object bound to one of 16 bus slots. The meaning
/// of its pointer is device-specific: a format code for the console, an
/// address for memory-like devices, a micro-operation selector for the
/// floating-point unit.
pub trait Device {
    /// Get device name.
    ///
    /// # Returns
    ///
    /// * Device name.
    ///
    fn name(&self) -> &'static str;

    /// Write bytes to the device.
    ///
    /// # Arguments
    ///
    /// * `bytes` - Bytes to write.
    ///
    /// # Returns
    ///
    /// * Write result.
    ///
    fn write(&mut self, bytes: &[u8]) -> CResult;

    /// Read bytes from the device.
    ///
    /// # Arguments
    ///
    /// * `count` - Byte count.
    ///
    /// # Returns
    ///
    /// * Bytes read.
    ///
    fn read(&mut self, count: usize) -> CResult<Vec<u8>>;

    /// Set device pointer.
    ///
    /// # Arguments
    ///
    /// * `value` - Pointer value.
    ///
    fn set_pointer(&mut self, value: C64Word);

    /// Get device pointer.
    ///
    /// # Returns
    ///
    /// * Pointer value.
    ///
    fn get_pointer(&self) -> C64Word;
}

/// Missing device error.
#[derive(Debug)]
pub struct MissingDeviceError(pub C64RegIdx);

impl Error for MissingDeviceError {
    fn description(&self) -> &str {
        "missing device"
    }
}

impl fmt::Display for MissingDeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no device bound to slot {:X}", self.0)
    }
}

/// Bad slot error.
#[derive(Debug)]
pub struct BadSlotError(pub usize);

impl Error for BadSlotError {
    fn description(&self) -> &str {
        "bad slot"
    }
}

impl fmt::Display for BadSlotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bad device slot index: {:X}", self.0)
    }
}

/// Device bus.
///
/// Routes the four device operations by slot index. The bus itself holds no
/// state beyond the slot table; slot 0 is pre-bound to the console.
pub struct DeviceBus {
    slots: Vec<Option<Box<dyn Device>>>,
}

impl DeviceBus {
    /// Create new device bus with the console bound to slot 0.
    ///
    /// # Returns
    ///
    /// * Device bus instance.
    ///
    pub fn new() -> Self {
        let mut slots: Vec<Option<Box<dyn Device>>> =
            (0..DEVICE_SLOT_COUNT).map(|_| None).collect();
        slots[0] = Some(Box::new(ConsoleIO::new()));

        DeviceBus { slots }
    }

    /// Create an empty device bus.
    ///
    /// # Returns
    ///
    /// * Device bus instance.
    ///
    pub fn empty() -> Self {
        DeviceBus {
            slots: (0..DEVICE_SLOT_COUNT).map(|_| None).collect(),
        }
    }

    /// Attach a device to a slot, replacing any previous binding.
    ///
    /// # Arguments
    ///
    /// * `slot` - Slot index.
    /// * `device` - Device handle.
    ///
    /// # Returns
    ///
    /// * Attach result.
    ///
    pub fn attach(&mut self, slot: usize, device: Box<dyn Device>) -> CResult {
        if slot >= DEVICE_SLOT_COUNT {
            return Err(Box::new(BadSlotError(slot)));
        }

        debug!("attaching device {} to slot {:X}", device.name(), slot);
        self.slots[slot] = Some(device);
        Ok(())
    }

    /// Detach the device bound to a slot.
    ///
    /// # Arguments
    ///
    /// * `slot` - Slot index.
    ///
    /// # Returns
    ///
    /// * Device handle, if the slot was bound.
    ///
    pub fn detach(&mut self, slot: usize) -> Option<Box<dyn Device>> {
        if slot >= DEVICE_SLOT_COUNT {
            return None;
        }

        self.slots[slot].take()
    }

    /// Get the device bound to a slot.
    ///
    /// # Arguments
    ///
    /// * `slot` - Slot index.
    ///
    /// # Returns
    ///
    /// * Device reference, if the slot is bound.
    ///
    pub fn device(&self, slot: usize) -> Option<&dyn Device> {
        self.slots.get(slot).and_then(|s| s.as_deref())
    }

    /// Write bytes to the device in a slot.
    ///
    /// # Arguments
    ///
    /// * `slot` - Slot index.
    /// * `bytes` - Bytes to write.
    ///
    /// # Returns
    ///
    /// * Write result.
    ///
    pub fn write(&mut self, slot: C64RegIdx, bytes: &[u8]) -> CResult {
        self.slot_mut(slot)?.write(bytes)
    }

    /// Read bytes from the device in a slot.
    ///
    /// # Arguments
    ///
    /// * `slot` - Slot index.
    /// * `count` - Byte count.
    ///
    /// # Returns
    ///
    /// * Bytes read.
    ///
    pub fn read(&mut self, slot: C64RegIdx, count: usize) -> CResult<Vec<u8>> {
        self.slot_mut(slot)?.read(count)
    }

    /// Set the pointer of the device in a slot.
    ///
    /// # Arguments
    ///
    /// * `slot` - Slot index.
    /// * `value` - Pointer value.
    ///
    /// # Returns
    ///
    /// * Result.
    ///
    pub fn set_pointer(&mut self, slot: C64RegIdx, value: C64Word) -> CResult {
        self.slot_mut(slot)?.set_pointer(value);
        Ok(())
    }

    /// Get the pointer of the device in a slot.
    ///
    /// # Arguments
    ///
    /// * `slot` - Slot index.
    ///
    /// # Returns
    ///
    /// * Pointer value.
    ///
    pub fn get_pointer(&mut self, slot: C64RegIdx) -> CResult<C64Word> {
        Ok(self.slot_mut(slot)?.get_pointer())
    }

    fn slot_mut(&mut self, slot: C64RegIdx) -> Result<&mut (dyn Device + 'static), MissingDeviceError> {
        self.slots[slot as usize]
            .as_deref_mut()
            .ok_or(MissingDeviceError(slot))
    }
}

impl Default for DeviceBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DeviceBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, slot) in self.slots.iter().enumerate() {
            match slot {
                Some(device) => writeln!(
                    f,
                    "    D{:X}: {} (pointer: {:04X}),",
                    idx,
                    device.name(),
                    device.get_pointer()
                )?,
                None => writeln!(f, "    D{:X}: (empty),", idx)?,
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bus_has_console() {
        let mut bus = DeviceBus::new();

        assert!(bus.device(0).is_some());
        assert_eq!(bus.device(0).map(|d| d.name()), Some("console-io"));
        assert!(bus.device(1).is_none());
        assert!(bus.get_pointer(0).is_ok());
    }

    #[test]
    fn test_missing_slot() {
        let mut bus = DeviceBus::empty();

        assert!(bus.write(3, &[1, 2]).is_err());
        assert!(bus.read(3, 2).is_err());
        assert!(bus.set_pointer(3, 0).is_err());
        assert!(bus.get_pointer(3).is_err());
    }

    #[test]
    fn test_attach_detach() {
        let mut bus = DeviceBus::empty();

        assert!(bus.attach(1, Box::new(MemoryExtension::new())).is_ok());
        assert!(bus.device(1).is_some());
        assert!(bus.attach(16, Box::new(MemoryExtension::new())).is_err());

        let device = bus.detach(1);
        assert!(device.is_some());
        assert!(bus.device(1).is_none());
    }
}
