// Licensed under the Apache-2.0 license

use rp2040_bus::{Bus, BusError};
use rp2040_types::{AccessSize, BusAddr, BusData};

/// Placeholder for a peripheral window with no model behind it. Reads return
/// zero, writes are dropped, and both are logged so firmware probing the
/// block is visible.
pub struct UnimplementedDevice {
    name: &'static str,
    size: u32,
}

impl UnimplementedDevice {
    pub fn new(name: &'static str, size: u32) -> Self {
        Self { name, size }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn size(&self) -> u32 {
        self.size
    }
}

impl Bus for UnimplementedDevice {
    fn read(&mut self, size: AccessSize, addr: BusAddr) -> Result<BusData, BusError> {
        log::debug!(
            "{}: unimplemented device read ({} bytes) at 0x{addr:x}",
            self.name,
            size.bytes()
        );
        Ok(0)
    }

    fn write(&mut self, size: AccessSize, addr: BusAddr, val: BusData) -> Result<(), BusError> {
        log::debug!(
            "{}: unimplemented device write ({} bytes) at 0x{addr:x} = 0x{val:x}",
            self.name,
            size.bytes()
        );
        Ok(())
    }
}
