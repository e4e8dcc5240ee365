/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains the RP2040 memory map and other fixed chip parameters.

--*/

use rp2040_cpu::CpuArgs;

pub const ROM_ORG: u32 = 0x0000_0000;
pub const ROM_SIZE: u32 = 16 * 1024;

/// Flash is mapped execute-in-place; this is the largest part the XIP window
/// addresses.
pub const FLASH_ORG: u32 = 0x1000_0000;
pub const FLASH_SIZE: u32 = 16 * 1024 * 1024;

pub const SRAM_ORG: u32 = 0x2000_0000;
pub const SRAM_SIZE: u32 = 264 * 1024;

pub const IO_BANK0_ORG: u32 = 0x4001_4000;
pub const IO_BANK0_SIZE: u32 = 0x3000;

pub const UART0_ORG: u32 = 0x4003_4000;
pub const UART1_ORG: u32 = 0x4003_8000;
pub const UART_SIZE: u32 = 0x1000;

pub const TIMER_ORG: u32 = 0x4005_4000;
pub const TIMER_SIZE: u32 = 0x1000;

pub const USB_ORG: u32 = 0x5010_0000;
pub const USB_SIZE: u32 = 0x1_0000;

pub const SIO_ORG: u32 = 0xd000_0000;
pub const SIO_SIZE: u32 = 0x100;

// NVIC lines
pub const TIMER_IRQ_0: u8 = 0;
pub const TIMER_IRQ_1: u8 = 1;
pub const TIMER_IRQ_2: u8 = 2;
pub const TIMER_IRQ_3: u8 = 3;
pub const IO_IRQ_BANK0: u8 = 13;
pub const IO_IRQ_QSPI: u8 = 14;
pub const SIO_IRQ_PROC0: u8 = 15;
pub const SIO_IRQ_PROC1: u8 = 16;
pub const UART0_IRQ: u8 = 20;
pub const UART1_IRQ: u8 = 21;

pub const NUM_CORES: usize = 2;
pub const NUM_GPIO: usize = 30;
pub const GPIO_MASK: u32 = (1 << NUM_GPIO) - 1;

pub const DEFAULT_SYSCLK_HZ: u32 = 133_000_000;

pub const DEFAULT_CPU_ARGS: CpuArgs = CpuArgs {
    num_irq: 32,
    cpu_type: "cortex-m0",
    num_prio_bits: 2,
};
