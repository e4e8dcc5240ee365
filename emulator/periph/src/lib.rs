/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains exports for the RP2040 Emulator Peripheral library.

--*/

mod io_bank0;
mod pin;
mod root_bus;
mod sio;
mod uart;
mod unimplemented;

pub use io_bank0::{GpioCtrl, IoBank0, PinFunction};
pub use pin::PinError;
pub use root_bus::{Mapping, Region, RootBusError, Rp2040RootBus, Rp2040RootBusArgs};
pub use sio::Sio;
pub use uart::{Uart, UartArgs};
pub use unimplemented::UnimplementedDevice;
