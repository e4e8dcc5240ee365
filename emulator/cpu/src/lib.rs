/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains exports for the Cortex-M0 execution core library.

--*/

mod cpu;
mod nvic;

pub use cpu::{CoreState, Cpu, CpuArgs, CpuError, InstructionEngine, StepAction};
pub use nvic::{Irq, Nvic};
