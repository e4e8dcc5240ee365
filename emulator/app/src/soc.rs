/*++

Licensed under the Apache-2.0 license.

File Name:

    soc.rs

Abstract:

    File contains the RP2040 SoC: realizes the memory map, wires the
    peripherals to the core and boots it from flash.

--*/

use crate::boot::{boot_from_flash, BootVector};
use crate::loader::{FirmwareImage, LoadError};
use rp2040_bus::{Bus, BusError, SysClock};
use rp2040_consts::{DEFAULT_CPU_ARGS, DEFAULT_SYSCLK_HZ, FLASH_SIZE, NUM_CORES};
use rp2040_cpu::{Cpu, CpuError, InstructionEngine, Nvic, StepAction};
use rp2040_periph::{
    IoBank0, PinError, PinFunction, RootBusError, Rp2040RootBus, Rp2040RootBusArgs, Sio, UartArgs,
};
use std::rc::Rc;
use thiserror::Error;

/// Errors that abort machine construction.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("invalid address map: {0}")]
    AddressMap(#[from] RootBusError),
    #[error("cannot realize cpu: {0}")]
    Cpu(#[from] CpuError),
    #[error("cannot read boot vector from flash: {0}")]
    Boot(#[from] BusError),
}

pub struct SocArgs {
    /// System clock. Driven at `sysclk_hz` unless something already sources it.
    pub clock: Rc<SysClock>,
    pub sysclk_hz: u32,
    pub flash_size: u32,
    pub uart0: UartArgs,
    pub uart1: UartArgs,
}

impl Default for SocArgs {
    fn default() -> Self {
        Self {
            clock: Rc::new(SysClock::new()),
            sysclk_hz: DEFAULT_SYSCLK_HZ,
            flash_size: FLASH_SIZE,
            uart0: UartArgs::default(),
            uart1: UartArgs::default(),
        }
    }
}

pub struct Rp2040Soc {
    cpu: Cpu<Rp2040RootBus>,
    clock: Rc<SysClock>,
    boot_vector: BootVector,
}

impl Rp2040Soc {
    /// Build the chip around `image`. The image is placed in memory before
    /// the core is created, and the core is booted from flash exactly once.
    pub fn realize(args: SocArgs, image: &FirmwareImage) -> Result<Self, ConfigError> {
        let clock = args.clock;
        if clock.has_source() {
            log::info!(
                "System clock already sourced at {} Hz",
                clock.freq_hz().unwrap_or_default()
            );
        } else {
            clock.set_hz(args.sysclk_hz);
            log::info!("System clock set to {} Hz", args.sysclk_hz);
        }

        let nvic = Rc::new(Nvic::new(DEFAULT_CPU_ARGS.num_irq));
        let mut bus = Rp2040RootBus::new(Rp2040RootBusArgs {
            nvic: nvic.clone(),
            flash_size: args.flash_size,
            uart0: args.uart0,
            uart1: args.uart1,
        })?;
        for m in bus.map() {
            log::debug!(
                "{:>8} 0x{:08x}..0x{:08x}",
                m.region.name(),
                m.base,
                u64::from(m.base) + u64::from(m.size)
            );
        }

        for segment in &image.segments {
            let region = bus.load(segment.addr, &segment.data)?;
            log::debug!(
                "Placed {} bytes at 0x{:08x} ({region})",
                segment.data.len(),
                segment.addr
            );
        }

        // Core 1 is held in reset; only core 0 is emulated.
        log::debug!("Realizing core 0 of {NUM_CORES}");
        let mut cpu = Cpu::new(bus, clock.clock(), nvic, DEFAULT_CPU_ARGS)?;
        let boot_vector = boot_from_flash(&mut cpu)?;

        Ok(Self {
            cpu,
            clock,
            boot_vector,
        })
    }

    /// Vector the core was last started from.
    pub fn boot_vector(&self) -> BootVector {
        self.boot_vector
    }

    pub fn cpu(&self) -> &Cpu<Rp2040RootBus> {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu<Rp2040RootBus> {
        &mut self.cpu
    }

    pub fn clock(&self) -> &SysClock {
        &self.clock
    }

    pub fn nvic(&self) -> Rc<Nvic> {
        self.cpu.nvic()
    }

    pub fn attach_engine(&mut self, engine: Box<dyn InstructionEngine>) {
        self.cpu.attach_engine(engine);
    }

    pub fn step(&mut self) -> StepAction {
        self.cpu.step()
    }

    /// Chip reset with the image still in flash: every device returns to its
    /// reset state and the core boots again.
    pub fn warm_reset(&mut self) -> Result<BootVector, BusError> {
        self.cpu.bus.warm_reset();
        self.boot_vector = boot_from_flash(&mut self.cpu)?;
        Ok(self.boot_vector)
    }

    pub fn sio(&self) -> &Sio {
        &self.cpu.bus.sio
    }

    pub fn io_bank0(&self) -> &IoBank0 {
        &self.cpu.bus.io_bank0
    }

    /// Drive the external input level of every pin at once.
    pub fn set_gpio_in(&mut self, levels: u32) {
        self.cpu.bus.sio.set_gpio_in(levels);
    }

    pub fn set_input_pin(&mut self, pin: usize, level: bool) -> Result<(), PinError> {
        self.cpu.bus.sio.set_input_pin(pin, level)
    }

    /// Level the guest drives on `pin`, or None while its output is disabled.
    pub fn output_level(&self, pin: usize) -> Result<Option<bool>, PinError> {
        self.cpu.bus.sio.output_level(pin)
    }

    pub fn pin_function(&self, pin: usize) -> Result<PinFunction, PinError> {
        self.cpu.bus.io_bank0.pin_function(pin)
    }
}
