/*++

Licensed under the Apache-2.0 license.

File Name:

    sio.rs

Abstract:

    File contains the single-cycle I/O block (GPIO port) of the RP2040.

--*/

use crate::pin::{check_pin, PinError};
use rp2040_bus::{Bus, BusError};
use rp2040_consts::GPIO_MASK;
use rp2040_types::{AccessSize, BusAddr, BusData};

/// How a write to one of the OUT/OE aliases modifies the register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Write,
    Set,
    Clr,
    Xor,
}

impl Op {
    fn apply(self, current: u32, val: u32) -> u32 {
        let next = match self {
            Op::Write => val,
            Op::Set => current | val,
            Op::Clr => current & !val,
            Op::Xor => current ^ val,
        };
        next & GPIO_MASK
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SioReg {
    CpuId,
    GpioIn,
    GpioOut(Op),
    GpioOe(Op),
}

impl SioReg {
    fn decode(addr: BusAddr) -> Option<SioReg> {
        match addr {
            Sio::CPUID => Some(SioReg::CpuId),
            Sio::GPIO_IN => Some(SioReg::GpioIn),
            Sio::GPIO_OUT => Some(SioReg::GpioOut(Op::Write)),
            Sio::GPIO_OUT_SET => Some(SioReg::GpioOut(Op::Set)),
            Sio::GPIO_OUT_CLR => Some(SioReg::GpioOut(Op::Clr)),
            Sio::GPIO_OUT_XOR => Some(SioReg::GpioOut(Op::Xor)),
            Sio::GPIO_OE => Some(SioReg::GpioOe(Op::Write)),
            Sio::GPIO_OE_SET => Some(SioReg::GpioOe(Op::Set)),
            Sio::GPIO_OE_CLR => Some(SioReg::GpioOe(Op::Clr)),
            Sio::GPIO_OE_XOR => Some(SioReg::GpioOe(Op::Xor)),
            _ => None,
        }
    }
}

/// GPIO output, output-enable and external input state of bank 0.
///
/// The input view folds driven outputs into the externally supplied levels:
/// `GPIO_IN = gpio_in | (gpio_out & gpio_oe)`. Pads are not modeled, so a
/// driven pin and an external source never conflict.
#[derive(Default)]
pub struct Sio {
    gpio_out: u32,
    gpio_oe: u32,
    gpio_in: u32,
}

impl Sio {
    /// Processor core identifier
    pub const CPUID: BusAddr = 0x000;

    /// Input value for GPIO pins
    pub const GPIO_IN: BusAddr = 0x004;

    /// GPIO output value
    pub const GPIO_OUT: BusAddr = 0x010;
    pub const GPIO_OUT_SET: BusAddr = 0x014;
    pub const GPIO_OUT_CLR: BusAddr = 0x018;
    pub const GPIO_OUT_XOR: BusAddr = 0x01c;

    /// GPIO output enable
    pub const GPIO_OE: BusAddr = 0x020;
    pub const GPIO_OE_SET: BusAddr = 0x024;
    pub const GPIO_OE_CLR: BusAddr = 0x028;
    pub const GPIO_OE_XOR: BusAddr = 0x02c;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn gpio_out(&self) -> u32 {
        self.gpio_out
    }

    pub fn gpio_oe(&self) -> u32 {
        self.gpio_oe
    }

    /// Levels supplied by the environment, without the driven outputs.
    pub fn gpio_in(&self) -> u32 {
        self.gpio_in
    }

    /// The value the guest reads from GPIO_IN.
    pub fn effective_in(&self) -> u32 {
        self.gpio_in | (self.gpio_out & self.gpio_oe)
    }

    /// Replace the externally driven input levels of all pins.
    pub fn set_gpio_in(&mut self, levels: u32) {
        self.gpio_in = levels & GPIO_MASK;
    }

    /// Drive the external input level of a single pin.
    pub fn set_input_pin(&mut self, pin: usize, level: bool) -> Result<(), PinError> {
        let bit = 1 << check_pin(pin)?;
        if level {
            self.gpio_in |= bit;
        } else {
            self.gpio_in &= !bit;
        }
        Ok(())
    }

    /// Level the guest drives on `pin`, or `None` if its output is disabled.
    pub fn output_level(&self, pin: usize) -> Result<Option<bool>, PinError> {
        let bit = 1 << check_pin(pin)?;
        if self.gpio_oe & bit == 0 {
            return Ok(None);
        }
        Ok(Some(self.gpio_out & bit != 0))
    }

    fn check_size(size: AccessSize, addr: BusAddr, fault: BusError) -> Result<(), BusError> {
        if size != AccessSize::Word || !size.is_aligned(addr) {
            log::warn!("sio: {}-byte access at 0x{addr:03x} rejected", size.bytes());
            return Err(fault);
        }
        Ok(())
    }
}

impl Bus for Sio {
    fn read(&mut self, size: AccessSize, addr: BusAddr) -> Result<BusData, BusError> {
        Self::check_size(size, addr, BusError::LoadAccessFault)?;
        match SioReg::decode(addr) {
            // Only core 0 is emulated.
            Some(SioReg::CpuId) => Ok(0),
            Some(SioReg::GpioIn) => Ok(self.effective_in()),
            Some(SioReg::GpioOut(Op::Write)) => Ok(self.gpio_out),
            Some(SioReg::GpioOe(Op::Write)) => Ok(self.gpio_oe),
            _ => {
                log::debug!("sio: unimplemented read at 0x{addr:03x}");
                Ok(0)
            }
        }
    }

    fn write(&mut self, size: AccessSize, addr: BusAddr, val: BusData) -> Result<(), BusError> {
        Self::check_size(size, addr, BusError::StoreAccessFault)?;
        match SioReg::decode(addr) {
            Some(SioReg::GpioOut(op)) => self.gpio_out = op.apply(self.gpio_out, val),
            Some(SioReg::GpioOe(op)) => self.gpio_oe = op.apply(self.gpio_oe, val),
            _ => log::debug!("sio: unimplemented write at 0x{addr:03x} = 0x{val:08x}"),
        }
        Ok(())
    }

    fn warm_reset(&mut self) {
        self.gpio_out = 0;
        self.gpio_oe = 0;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const PATTERNS: [u32; 6] = [
        0,
        0xffff_ffff,
        0x0200_0000,
        0xc000_0001,
        0x5555_5555,
        0x3fff_fffe,
    ];

    fn write(sio: &mut Sio, addr: BusAddr, val: u32) {
        sio.write(AccessSize::Word, addr, val).unwrap();
    }

    fn read(sio: &mut Sio, addr: BusAddr) -> u32 {
        sio.read(AccessSize::Word, addr).unwrap()
    }

    fn check_aliases(base: BusAddr) {
        for old in PATTERNS {
            for v in PATTERNS {
                let mut sio = Sio::new();
                write(&mut sio, base, old);
                let old = read(&mut sio, base);

                write(&mut sio, base + 4, v);
                assert_eq!(read(&mut sio, base), (old | v) & GPIO_MASK);

                write(&mut sio, base, old);
                write(&mut sio, base + 8, v);
                assert_eq!(read(&mut sio, base), old & !v & GPIO_MASK);

                write(&mut sio, base, old);
                write(&mut sio, base + 12, v);
                assert_eq!(read(&mut sio, base), (old ^ v) & GPIO_MASK);
            }
        }
    }

    #[test]
    fn test_out_set_clr_xor() {
        check_aliases(Sio::GPIO_OUT);
    }

    #[test]
    fn test_oe_set_clr_xor() {
        check_aliases(Sio::GPIO_OE);
    }

    #[test]
    fn test_writes_mask_to_30_bits() {
        let mut sio = Sio::new();
        write(&mut sio, Sio::GPIO_OUT, 0xffff_ffff);
        write(&mut sio, Sio::GPIO_OE, 0xffff_ffff);
        assert_eq!(sio.gpio_out(), 0x3fff_ffff);
        assert_eq!(sio.gpio_oe(), 0x3fff_ffff);

        write(&mut sio, Sio::GPIO_OUT_XOR, 0xffff_ffff);
        assert_eq!(sio.gpio_out(), 0);
    }

    #[test]
    fn test_set_is_idempotent() {
        let mut once = Sio::new();
        let mut twice = Sio::new();
        write(&mut once, Sio::GPIO_OUT, 0x0000_00f0);
        write(&mut twice, Sio::GPIO_OUT, 0x0000_00f0);

        write(&mut once, Sio::GPIO_OUT_SET, 0x0200_0003);
        write(&mut twice, Sio::GPIO_OUT_SET, 0x0200_0003);
        write(&mut twice, Sio::GPIO_OUT_SET, 0x0200_0003);
        assert_eq!(read(&mut once, Sio::GPIO_OUT), read(&mut twice, Sio::GPIO_OUT));
    }

    #[test]
    fn test_gpio_in_folds_driven_outputs() {
        let mut sio = Sio::new();
        sio.set_gpio_in(0x0000_0101);
        write(&mut sio, Sio::GPIO_OE, 0xffff_ffff);
        write(&mut sio, Sio::GPIO_OUT, 0x0200_0000);
        assert_eq!(read(&mut sio, Sio::GPIO_IN), 0x0200_0101);
        assert_eq!(sio.gpio_in(), 0x0000_0101);

        // Outputs that are not enabled stay invisible.
        write(&mut sio, Sio::GPIO_OE, 0);
        assert_eq!(read(&mut sio, Sio::GPIO_IN), 0x0000_0101);
    }

    #[test]
    fn test_gpio_in_is_read_only() {
        let mut sio = Sio::new();
        write(&mut sio, Sio::GPIO_IN, 0x1234);
        assert_eq!(read(&mut sio, Sio::GPIO_IN), 0);
        write(&mut sio, Sio::CPUID, 1);
        assert_eq!(read(&mut sio, Sio::CPUID), 0);
    }

    #[test]
    fn test_unimplemented_offsets() {
        let mut sio = Sio::new();
        write(&mut sio, Sio::GPIO_OUT, 0x55);
        for addr in [0x008, 0x00c, 0x030, 0x0fc] {
            write(&mut sio, addr, 0xffff_ffff);
            assert_eq!(read(&mut sio, addr), 0);
        }
        // Aliases are write-only.
        assert_eq!(read(&mut sio, Sio::GPIO_OUT_SET), 0);
        assert_eq!(read(&mut sio, Sio::GPIO_OE_XOR), 0);
        assert_eq!(sio.gpio_out(), 0x55);
        assert_eq!(sio.gpio_oe(), 0);
    }

    #[test]
    fn test_word_access_only() {
        let mut sio = Sio::new();
        assert_eq!(
            sio.read(AccessSize::Byte, Sio::GPIO_IN),
            Err(BusError::LoadAccessFault)
        );
        assert_eq!(
            sio.write(AccessSize::HalfWord, Sio::GPIO_OUT, 1),
            Err(BusError::StoreAccessFault)
        );
        assert_eq!(
            sio.write(AccessSize::Word, Sio::GPIO_OUT_SET + 2, 1),
            Err(BusError::StoreAccessFault)
        );
        assert_eq!(sio.gpio_out(), 0);
    }

    #[test]
    fn test_host_pin_api() {
        let mut sio = Sio::new();
        sio.set_input_pin(3, true).unwrap();
        sio.set_input_pin(29, true).unwrap();
        assert_eq!(sio.gpio_in(), (1 << 29) | (1 << 3));
        sio.set_input_pin(3, false).unwrap();
        assert_eq!(sio.gpio_in(), 1 << 29);

        assert_eq!(sio.set_input_pin(30, true), Err(PinError::OutOfRange(30)));
        assert_eq!(sio.gpio_in(), 1 << 29);

        assert_eq!(sio.output_level(25), Ok(None));
        write(&mut sio, Sio::GPIO_OE_SET, 1 << 25);
        assert_eq!(sio.output_level(25), Ok(Some(false)));
        write(&mut sio, Sio::GPIO_OUT_SET, 1 << 25);
        assert_eq!(sio.output_level(25), Ok(Some(true)));
        assert_eq!(sio.output_level(30), Err(PinError::OutOfRange(30)));
    }

    #[test]
    fn test_warm_reset_keeps_inputs() {
        let mut sio = Sio::new();
        sio.set_gpio_in(0xffff_ffff);
        write(&mut sio, Sio::GPIO_OUT, 0xff);
        write(&mut sio, Sio::GPIO_OE, 0xff);
        sio.warm_reset();
        assert_eq!(sio.gpio_out(), 0);
        assert_eq!(sio.gpio_oe(), 0);
        assert_eq!(sio.gpio_in(), 0x3fff_ffff);
    }
}
