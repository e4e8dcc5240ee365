/*++

Licensed under the Apache-2.0 license.

File Name:

    io_bank0.rs

Abstract:

    File contains the IO_BANK0 pin function select block.

--*/

use crate::pin::{check_pin, PinError};
use rp2040_bus::{Bus, BusError};
use rp2040_consts::NUM_GPIO;
use rp2040_types::{AccessSize, BusAddr, BusData};
use tock_registers::register_bitfields;
use tock_registers::LocalRegisterCopy;

register_bitfields![u32,
    pub GpioCtrl [
        FUNCSEL OFFSET(0) NUMBITS(5) [
            Spi = 1,
            Uart = 2,
            I2c = 3,
            Pwm = 4,
            Sio = 5,
            Pio0 = 6,
            Pio1 = 7,
            Clock = 8,
            Usb = 9,
            Null = 0x1f
        ]
    ]
];

/// Function a pin has been routed to by the guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinFunction {
    Spi,
    Uart,
    I2c,
    Pwm,
    Sio,
    Pio0,
    Pio1,
    Clock,
    Usb,
    Null,
    /// A FUNCSEL code with no function assigned on this pin.
    Reserved(u8),
}

impl From<u8> for PinFunction {
    fn from(funcsel: u8) -> Self {
        match funcsel {
            1 => PinFunction::Spi,
            2 => PinFunction::Uart,
            3 => PinFunction::I2c,
            4 => PinFunction::Pwm,
            5 => PinFunction::Sio,
            6 => PinFunction::Pio0,
            7 => PinFunction::Pio1,
            8 => PinFunction::Clock,
            9 => PinFunction::Usb,
            0x1f => PinFunction::Null,
            other => PinFunction::Reserved(other),
        }
    }
}

/// Per-pin STATUS/CTRL register pairs. Function selection is recorded but
/// does not gate the SIO block.
pub struct IoBank0 {
    ctrl: [LocalRegisterCopy<u32, GpioCtrl::Register>; NUM_GPIO],
}

impl Default for IoBank0 {
    fn default() -> Self {
        Self::new()
    }
}

impl IoBank0 {
    /// Bytes per pin: STATUS followed by CTRL.
    const PIN_STRIDE: BusAddr = 8;

    pub const STATUS: BusAddr = 0x0;
    pub const CTRL: BusAddr = 0x4;

    pub fn new() -> Self {
        Self {
            ctrl: [Self::reset_ctrl(); NUM_GPIO],
        }
    }

    fn reset_ctrl() -> LocalRegisterCopy<u32, GpioCtrl::Register> {
        let mut ctrl = LocalRegisterCopy::new(0);
        ctrl.write(GpioCtrl::FUNCSEL::Null);
        ctrl
    }

    /// Split a window offset into pin number and register offset.
    fn decode(addr: BusAddr) -> (usize, BusAddr) {
        (
            (addr / Self::PIN_STRIDE) as usize,
            addr % Self::PIN_STRIDE / 4 * 4,
        )
    }

    pub fn funcsel(&self, pin: usize) -> Result<u8, PinError> {
        Ok(self.ctrl[check_pin(pin)?].read(GpioCtrl::FUNCSEL) as u8)
    }

    pub fn pin_function(&self, pin: usize) -> Result<PinFunction, PinError> {
        self.funcsel(pin).map(PinFunction::from)
    }

    /// Returns true if the pin is routed to the SIO block.
    pub fn is_sio(&self, pin: usize) -> Result<bool, PinError> {
        Ok(self.pin_function(pin)? == PinFunction::Sio)
    }

    fn check_size(size: AccessSize, addr: BusAddr, fault: BusError) -> Result<(), BusError> {
        if size != AccessSize::Word || !size.is_aligned(addr) {
            log::warn!(
                "io_bank0: {}-byte access at 0x{addr:04x} rejected",
                size.bytes()
            );
            return Err(fault);
        }
        Ok(())
    }
}

impl Bus for IoBank0 {
    fn read(&mut self, size: AccessSize, addr: BusAddr) -> Result<BusData, BusError> {
        Self::check_size(size, addr, BusError::LoadAccessFault)?;
        let (pin, reg) = Self::decode(addr);
        if pin >= NUM_GPIO {
            log::warn!("io_bank0: invalid GPIO {pin}");
            return Ok(0);
        }
        match reg {
            Self::CTRL => Ok(self.ctrl[pin].get()),
            _ => Ok(0),
        }
    }

    fn write(&mut self, size: AccessSize, addr: BusAddr, val: BusData) -> Result<(), BusError> {
        Self::check_size(size, addr, BusError::StoreAccessFault)?;
        let (pin, reg) = Self::decode(addr);
        if pin >= NUM_GPIO {
            log::warn!("io_bank0: invalid GPIO {pin}");
            return Ok(());
        }
        if reg == Self::CTRL {
            self.ctrl[pin].write(GpioCtrl::FUNCSEL.val(val));
        }
        Ok(())
    }

    fn warm_reset(&mut self) {
        self.ctrl = [Self::reset_ctrl(); NUM_GPIO];
    }
}
