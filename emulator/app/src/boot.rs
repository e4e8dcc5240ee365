// Licensed under the Apache-2.0 license

use rp2040_bus::{Bus, BusError};
use rp2040_consts::FLASH_ORG;
use rp2040_cpu::Cpu;
use rp2040_types::AccessSize;

/// Initial stack pointer and reset handler, the first two words of the
/// vector table at the start of flash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootVector {
    pub sp: u32,
    pub pc: u32,
}

/// Stand-in for the boot ROM: reset the core and start it from the vector
/// table in flash. Running it again with the same flash contents yields the
/// same core state.
pub fn boot_from_flash<TBus: Bus>(cpu: &mut Cpu<TBus>) -> Result<BootVector, BusError> {
    let sp = cpu.bus.read(AccessSize::Word, FLASH_ORG)?;
    let pc = cpu.bus.read(AccessSize::Word, FLASH_ORG + 4)?;

    cpu.reset();
    cpu.write_sp(sp);
    cpu.write_pc(pc);

    log::info!("Boot from flash: SP=0x{sp:08x} PC=0x{pc:08x}");
    Ok(BootVector { sp, pc })
}
