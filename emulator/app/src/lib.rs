/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    Library interface for the RP2040 Emulator.

--*/

pub mod boot;
pub mod elf;
pub mod emulator;
pub mod loader;
pub mod soc;

pub use boot::{boot_from_flash, BootVector};
pub use emulator::{Emulator, EmulatorArgs, LogLevel, EMULATOR_RUNNING};
pub use loader::{load_firmware, FirmwareImage, ImageFormat, LoadError, Segment};
pub use soc::{ConfigError, Rp2040Soc, SocArgs};
