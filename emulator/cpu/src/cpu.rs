/*++

Licensed under the Apache-2.0 license.

File Name:

    cpu.rs

Abstract:

    File contains the Cortex-M0 execution core: architectural state, reset,
    and the seam for the instruction engine.

--*/

use crate::Nvic;
use caliptra_emu_bus::Clock;
use rp2040_bus::{Bus, BusAdapter};
use std::rc::Rc;
use thiserror::Error;

/// Core types the SoC can be realized with.
const SUPPORTED_CPU_TYPES: [&str; 2] = ["cortex-m0", "cortex-m0plus"];

/// ARMv6-M implements at most 32 external interrupts.
const MAX_IRQ: u32 = 32;

/// xPSR value out of reset: Thumb state, everything else clear.
const XPSR_RESET: u32 = 1 << 24;

#[derive(Debug, Error)]
pub enum CpuError {
    #[error("unsupported cpu type {0:?}")]
    UnsupportedCpuType(String),
    #[error("invalid interrupt line count {0} (expected 1..={max})", max = MAX_IRQ)]
    InvalidIrqCount(u32),
    #[error("invalid priority bit width {0} (expected 2..=8)")]
    InvalidPriorityBits(u8),
    #[error("nvic has {actual} lines but the core was configured for {expected}")]
    NvicMismatch { expected: u32, actual: u32 },
    #[error("interrupt line {line} out of range (core has {num_irq} lines)")]
    IrqOutOfRange { line: u8, num_irq: u32 },
    #[error("no core register r{0}")]
    InvalidRegister(usize),
}

/// Construction-time configuration of the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuArgs {
    pub num_irq: u32,
    pub cpu_type: &'static str,
    pub num_prio_bits: u8,
}

impl Default for CpuArgs {
    fn default() -> Self {
        Self {
            num_irq: MAX_IRQ,
            cpu_type: "cortex-m0",
            num_prio_bits: 2,
        }
    }
}

impl CpuArgs {
    fn validate(&self) -> Result<(), CpuError> {
        if !SUPPORTED_CPU_TYPES.contains(&self.cpu_type) {
            return Err(CpuError::UnsupportedCpuType(self.cpu_type.to_string()));
        }
        if self.num_irq == 0 || self.num_irq > MAX_IRQ {
            return Err(CpuError::InvalidIrqCount(self.num_irq));
        }
        if !(2..=8).contains(&self.num_prio_bits) {
            return Err(CpuError::InvalidPriorityBits(self.num_prio_bits));
        }
        Ok(())
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum StepAction {
    Continue,
    Break,
    Fatal,
}

/// Architectural register state of the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreState {
    /// r0-r12, sp (r13), lr (r14), pc (r15)
    pub regs: [u32; 16],
    pub xpsr: u32,
    pub primask: u32,
    pub control: u32,
}

impl CoreState {
    pub const SP: usize = 13;
    pub const LR: usize = 14;
    pub const PC: usize = 15;
}

impl Default for CoreState {
    fn default() -> Self {
        Self {
            regs: [0; 16],
            xpsr: XPSR_RESET,
            primask: 0,
            control: 0,
        }
    }
}

/// Executes guest instructions against the core state and the bus. The
/// instruction engine lives outside this crate and is attached to the core.
pub trait InstructionEngine {
    fn step(&mut self, state: &mut CoreState, bus: &mut dyn Bus) -> StepAction;
}

/// Cortex-M0 core bound to a system bus.
pub struct Cpu<TBus: Bus> {
    /// System bus
    pub bus: TBus,

    pub clock: Rc<Clock>,

    state: CoreState,
    nvic: Rc<Nvic>,
    args: CpuArgs,
    engine: Option<Box<dyn InstructionEngine>>,
    halt_reported: bool,
}

impl<TBus: Bus> Cpu<TBus> {
    /// Realize the core: validate its configuration and bind it to `bus`,
    /// `clock` and `nvic`.
    pub fn new(
        bus: TBus,
        clock: Rc<Clock>,
        nvic: Rc<Nvic>,
        args: CpuArgs,
    ) -> Result<Self, CpuError> {
        args.validate()?;
        if nvic.num_irq() != args.num_irq {
            return Err(CpuError::NvicMismatch {
                expected: args.num_irq,
                actual: nvic.num_irq(),
            });
        }
        log::debug!(
            "realized {} core with {} irqs and {} priority bits",
            args.cpu_type,
            args.num_irq,
            args.num_prio_bits
        );
        Ok(Self {
            bus,
            clock,
            state: CoreState::default(),
            nvic,
            args,
            engine: None,
            halt_reported: false,
        })
    }

    pub fn args(&self) -> &CpuArgs {
        &self.args
    }

    pub fn nvic(&self) -> Rc<Nvic> {
        self.nvic.clone()
    }

    pub fn state(&self) -> &CoreState {
        &self.state
    }

    pub fn attach_engine(&mut self, engine: Box<dyn InstructionEngine>) {
        self.engine = Some(engine);
        self.halt_reported = false;
    }

    /// Put the core in its architectural reset state.
    pub fn reset(&mut self) {
        self.state = CoreState::default();
    }

    pub fn read_reg(&self, reg: usize) -> Result<u32, CpuError> {
        self.state
            .regs
            .get(reg)
            .copied()
            .ok_or(CpuError::InvalidRegister(reg))
    }

    pub fn write_reg(&mut self, reg: usize, val: u32) -> Result<(), CpuError> {
        let slot = self
            .state
            .regs
            .get_mut(reg)
            .ok_or(CpuError::InvalidRegister(reg))?;
        *slot = val;
        Ok(())
    }

    pub fn read_sp(&self) -> u32 {
        self.state.regs[CoreState::SP]
    }

    pub fn write_sp(&mut self, sp: u32) {
        self.state.regs[CoreState::SP] = sp;
    }

    pub fn read_pc(&self) -> u32 {
        self.state.regs[CoreState::PC]
    }

    pub fn write_pc(&mut self, pc: u32) {
        self.state.regs[CoreState::PC] = pc;
    }

    /// Execute one instruction through the attached engine and poll the
    /// peripherals.
    pub fn step(&mut self) -> StepAction {
        let Some(engine) = self.engine.as_mut() else {
            if !self.halt_reported {
                log::warn!(
                    "no instruction engine attached; core halted at pc=0x{:08x}",
                    self.state.regs[CoreState::PC]
                );
                self.halt_reported = true;
            }
            return StepAction::Break;
        };
        let action = engine.step(&mut self.state, &mut self.bus);
        self.clock
            .increment_and_process_timer_actions(1, &mut BusAdapter::new(&mut self.bus));
        self.bus.poll();
        action
    }
}
