/*++

Licensed under the Apache-2.0 license.

File Name:

    bus.rs

Abstract:

    File contains definition of the Bus trait.

--*/

use caliptra_emu_types::RvSize;
use rp2040_types::{AccessSize, BusAddr, BusData};
use thiserror::Error;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Error)]
pub enum BusError {
    /// Instruction access exception
    #[error("instruction access fault")]
    InstrAccessFault,

    /// Load address misaligned exception
    #[error("load address misaligned")]
    LoadAddrMisaligned,

    /// Load access fault exception
    #[error("load access fault")]
    LoadAccessFault,

    /// Store address misaligned exception
    #[error("store address misaligned")]
    StoreAddrMisaligned,

    /// Store access fault exception
    #[error("store access fault")]
    StoreAccessFault,
}

impl From<caliptra_emu_bus::BusError> for BusError {
    fn from(value: caliptra_emu_bus::BusError) -> Self {
        match value {
            caliptra_emu_bus::BusError::InstrAccessFault => BusError::InstrAccessFault,
            caliptra_emu_bus::BusError::LoadAddrMisaligned => BusError::LoadAddrMisaligned,
            caliptra_emu_bus::BusError::LoadAccessFault => BusError::LoadAccessFault,
            caliptra_emu_bus::BusError::StoreAddrMisaligned => BusError::StoreAddrMisaligned,
            caliptra_emu_bus::BusError::StoreAccessFault => BusError::StoreAccessFault,
        }
    }
}

impl From<BusError> for caliptra_emu_bus::BusError {
    fn from(value: BusError) -> Self {
        match value {
            BusError::InstrAccessFault => caliptra_emu_bus::BusError::InstrAccessFault,
            BusError::LoadAddrMisaligned => caliptra_emu_bus::BusError::LoadAddrMisaligned,
            BusError::LoadAccessFault => caliptra_emu_bus::BusError::LoadAccessFault,
            BusError::StoreAddrMisaligned => caliptra_emu_bus::BusError::StoreAddrMisaligned,
            BusError::StoreAccessFault => caliptra_emu_bus::BusError::StoreAccessFault,
        }
    }
}

/// Represents an abstract memory bus. Used to read and write from RAM and
/// peripheral addresses.
///
/// Every register block of the SoC implements this trait with `addr` relative
/// to the start of its window; the root bus translates physical addresses.
pub trait Bus {
    /// Read data of specified size from given address
    ///
    /// # Arguments
    ///
    /// * `size` - Size of the read
    /// * `addr` - Address to read from
    ///
    /// # Error
    ///
    /// * `BusError` - Exception with cause `BusError::LoadAccessFault` or `BusError::LoadAddrMisaligned`
    fn read(&mut self, size: AccessSize, addr: BusAddr) -> Result<BusData, BusError>;

    /// Write data of specified size to given address
    ///
    /// # Arguments
    ///
    /// * `size` - Size of the write
    /// * `addr` - Address to write
    /// * `val` - Data to write
    ///
    /// # Error
    ///
    /// * `BusError` - Exception with cause `BusError::StoreAccessFault` or `BusError::StoreAddrMisaligned`
    fn write(&mut self, size: AccessSize, addr: BusAddr, val: BusData) -> Result<(), BusError>;

    /// This method is used to notify peripherals of the passage of time. The
    /// owner of this bus MAY call this function periodically.
    fn poll(&mut self) {
        // By default, do nothing
    }

    /// Return the device to the state it had right after realize.
    fn warm_reset(&mut self) {
        // By default, do nothing
    }
}

/// Exposes a `caliptra_emu_bus` device (its `Ram` and `Rom` back the RP2040
/// memories) as a [`Bus`].
pub struct BusConverter<T: caliptra_emu_bus::Bus> {
    caliptra_bus: T,
}

impl<T: caliptra_emu_bus::Bus> BusConverter<T> {
    pub fn new(caliptra_bus: T) -> Self {
        Self { caliptra_bus }
    }

    pub fn inner(&self) -> &T {
        &self.caliptra_bus
    }

    pub fn inner_mut(&mut self) -> &mut T {
        &mut self.caliptra_bus
    }
}

impl<T: caliptra_emu_bus::Bus> Bus for BusConverter<T> {
    fn read(&mut self, size: AccessSize, addr: BusAddr) -> Result<BusData, BusError> {
        self.caliptra_bus
            .read(RvSize::from(usize::from(size)), addr)
            .map_err(|x| x.into())
    }

    fn write(&mut self, size: AccessSize, addr: BusAddr, val: BusData) -> Result<(), BusError> {
        self.caliptra_bus
            .write(RvSize::from(usize::from(size)), addr, val)
            .map_err(|x| x.into())
    }

    fn poll(&mut self) {
        self.caliptra_bus.poll();
    }

    fn warm_reset(&mut self) {
        self.caliptra_bus.warm_reset();
    }
}

/// The reverse of [`BusConverter`]: lends a [`Bus`] to code written against
/// `caliptra_emu_bus`, such as the timer actions of its `Clock`.
pub struct BusAdapter<'a, T: Bus + ?Sized> {
    bus: &'a mut T,
}

impl<'a, T: Bus + ?Sized> BusAdapter<'a, T> {
    pub fn new(bus: &'a mut T) -> Self {
        Self { bus }
    }
}

impl<T: Bus + ?Sized> caliptra_emu_bus::Bus for BusAdapter<'_, T> {
    fn read(
        &mut self,
        size: RvSize,
        addr: caliptra_emu_types::RvAddr,
    ) -> Result<caliptra_emu_types::RvData, caliptra_emu_bus::BusError> {
        self.bus
            .read(AccessSize::from(size as usize), addr)
            .map_err(|x| x.into())
    }

    fn write(
        &mut self,
        size: RvSize,
        addr: caliptra_emu_types::RvAddr,
        val: caliptra_emu_types::RvData,
    ) -> Result<(), caliptra_emu_bus::BusError> {
        self.bus
            .write(AccessSize::from(size as usize), addr, val)
            .map_err(|x| x.into())
    }

    fn poll(&mut self) {
        self.bus.poll();
    }

    fn warm_reset(&mut self) {
        self.bus.warm_reset();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use caliptra_emu_bus::{Ram, Rom};

    #[test]
    fn test_ram_little_endian() {
        let mut ram = BusConverter::new(Ram::new(vec![0; 16]));
        ram.write(AccessSize::Word, 4, 0x1234_5678).unwrap();
        assert_eq!(&ram.inner().data()[4..8], &[0x78, 0x56, 0x34, 0x12]);
        assert_eq!(ram.read(AccessSize::Byte, 5).unwrap(), 0x56);
        assert_eq!(ram.read(AccessSize::HalfWord, 6).unwrap(), 0x1234);

        ram.inner_mut().data_mut()[12..16].copy_from_slice(&[0xf7, 0x00, 0x00, 0x10]);
        assert_eq!(ram.read(AccessSize::Word, 12).unwrap(), 0x1000_00f7);
    }

    #[test]
    fn test_ram_faults() {
        let mut ram = BusConverter::new(Ram::new(vec![0; 16]));
        assert_eq!(
            ram.read(AccessSize::Word, 16),
            Err(BusError::LoadAccessFault)
        );
        assert_eq!(
            ram.write(AccessSize::Word, 16, 0),
            Err(BusError::StoreAccessFault)
        );
        assert!(ram.read(AccessSize::Word, 2).is_err());
        assert!(ram.write(AccessSize::HalfWord, 1, 0).is_err());
    }

    #[test]
    fn test_rom_is_read_only() {
        let mut rom = BusConverter::new(Rom::new(vec![0x01, 0x02, 0x03, 0x04]));
        assert_eq!(rom.read(AccessSize::Word, 0).unwrap(), 0x0403_0201);
        assert_eq!(
            rom.write(AccessSize::Word, 0, 0),
            Err(BusError::StoreAccessFault)
        );
        assert_eq!(rom.inner().data(), &[0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_adapter_round_trips_errors() {
        let mut ram = BusConverter::new(Ram::new(vec![0; 8]));
        let mut adapter = BusAdapter::new(&mut ram);
        caliptra_emu_bus::Bus::write(&mut adapter, RvSize::Word, 0, 0xcafe_f00d).unwrap();
        assert_eq!(
            caliptra_emu_bus::Bus::read(&mut adapter, RvSize::Word, 0).unwrap(),
            0xcafe_f00d
        );
        assert_eq!(
            caliptra_emu_bus::Bus::read(&mut adapter, RvSize::Word, 8),
            Err(caliptra_emu_bus::BusError::LoadAccessFault)
        );
    }
}
