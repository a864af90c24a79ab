//! Breakpoints.

use tracing::info;

use crate::core::types::C64Addr;

/// Breakpoints.
#[derive(Debug, Default)]
pub struct Breakpoints(Vec<C64Addr>);

impl Breakpoints {
    /// Create breakpoints handler.
    ///
    /// # Returns
    ///
    /// * Breakpoints instance.
    ///
    pub fn new() -> Self {
        Default::default()
    }

    /// Register breakpoint.
    ///
    /// # Arguments
    ///
    /// * `addr` - Address.
    ///
    pub fn register(&mut self, addr: C64Addr) {
        if !self.0.contains(&addr) {
            info!("registering breakpoint at {:03X}", addr);
            self.0.push(addr);
        }
    }

    /// Unregister breakpoint.
    ///
    /// # Arguments
    ///
    /// * `addr` - Address.
    ///
    pub fn unregister(&mut self, addr: C64Addr) {
        if let Some(idx) = self.0.iter().position(|&a| a == addr) {
            info!("unregistering breakpoint at {:03X}", addr);
            self.0.remove(idx);
        }
    }

    /// Check if a breakpoint is set at an address.
    ///
    /// # Arguments
    ///
    /// * `addr` - Address.
    ///
    /// # Returns
    ///
    /// * `true` if a breakpoint is set.
    ///
    pub fn check_breakpoint(&self, addr: C64Addr) -> bool {
        self.0.contains(&addr)
    }

    /// Get breakpoint addresses.
    ///
    /// # Returns
    ///
    /// * Addresses.
    ///
    pub fn get_addresses(&self) -> &[C64Addr] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breakpoints() {
        let mut bps = Breakpoints::new();

        assert!(!bps.check_breakpoint(0x123));

        bps.register(0x123);
        bps.register(0x123);
        assert!(bps.check_breakpoint(0x123));
        assert_eq!(bps.get_addresses().len(), 1);

        bps.unregister(0x123);
        assert!(!bps.check_breakpoint(0x123));
        bps.unregister(0x123);
    }
}
