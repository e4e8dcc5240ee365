/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains exports for the RP2040 emulator bus library.

--*/

mod bus;
mod clock;

pub use bus::{Bus, BusAdapter, BusConverter, BusError};
pub use clock::SysClock;
