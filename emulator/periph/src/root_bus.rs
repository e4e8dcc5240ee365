/*++

Licensed under the Apache-2.0 license.

File Name:

    root_bus.rs

Abstract:

    File contains the root Bus implementation of the RP2040: the decode
    table that routes core accesses to memories and peripherals.

--*/

use crate::{IoBank0, Sio, Uart, UartArgs, UnimplementedDevice};
use caliptra_emu_bus::{Ram, Rom};
use rp2040_bus::{Bus, BusConverter, BusError};
use rp2040_consts::{
    FLASH_ORG, FLASH_SIZE, IO_BANK0_ORG, IO_BANK0_SIZE, ROM_ORG, ROM_SIZE, SIO_ORG, SIO_SIZE,
    SRAM_ORG, SRAM_SIZE, TIMER_ORG, TIMER_SIZE, UART0_IRQ, UART0_ORG, UART1_IRQ, UART1_ORG,
    UART_SIZE, USB_ORG, USB_SIZE,
};
use rp2040_cpu::{CpuError, Nvic};
use rp2040_types::{AccessSize, BusAddr, BusData};
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

/// Device behind a window of the address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Rom,
    Flash,
    Sram,
    IoBank0,
    Uart0,
    Uart1,
    Timer,
    Usb,
    Sio,
}

impl Region {
    pub fn name(&self) -> &'static str {
        match self {
            Region::Rom => "rom",
            Region::Flash => "flash",
            Region::Sram => "sram",
            Region::IoBank0 => "io_bank0",
            Region::Uart0 => "uart0",
            Region::Uart1 => "uart1",
            Region::Timer => "timer",
            Region::Usb => "usb",
            Region::Sio => "sio",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One entry of the decode table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    pub region: Region,
    pub base: BusAddr,
    pub size: u32,
}

impl Mapping {
    fn contains(&self, addr: BusAddr) -> bool {
        addr >= self.base && addr - self.base < self.size
    }

    /// Last address of the window, or None for an empty window.
    fn last(&self) -> Option<u64> {
        (self.size > 0).then(|| u64::from(self.base) + u64::from(self.size) - 1)
    }
}

#[derive(Debug, Error)]
pub enum RootBusError {
    #[error("{0} window is empty")]
    EmptyRegion(Region),
    #[error("flash size 0x{0:x} exceeds the 0x{window:x} byte XIP window", window = FLASH_SIZE)]
    FlashTooLarge(u32),
    #[error("{a} window at 0x{a_base:08x} overlaps {b} window at 0x{b_base:08x}")]
    Overlap {
        a: Region,
        a_base: BusAddr,
        b: Region,
        b_base: BusAddr,
    },
    #[error("segment 0x{addr:08x}..+0x{len:x} is not backed by rom, flash or sram")]
    SegmentOutOfRange { addr: BusAddr, len: usize },
    #[error("failed to connect interrupt: {0}")]
    Irq(#[from] CpuError),
}

/// Root Bus Arguments
pub struct Rp2040RootBusArgs {
    pub nvic: Rc<Nvic>,
    pub flash_size: u32,
    pub uart0: UartArgs,
    pub uart1: UartArgs,
}

pub struct Rp2040RootBus {
    pub rom: BusConverter<Rom>,
    pub flash: BusConverter<Ram>,
    pub sram: BusConverter<Ram>,
    pub sio: Sio,
    pub io_bank0: IoBank0,
    pub uart0: Uart,
    pub uart1: Uart,
    pub timer: UnimplementedDevice,
    pub usb: UnimplementedDevice,
    map: Vec<Mapping>,
}

impl Rp2040RootBus {
    pub fn new(args: Rp2040RootBusArgs) -> Result<Self, RootBusError> {
        if args.flash_size > FLASH_SIZE {
            return Err(RootBusError::FlashTooLarge(args.flash_size));
        }

        let map = vec![
            Mapping {
                region: Region::Rom,
                base: ROM_ORG,
                size: ROM_SIZE,
            },
            Mapping {
                region: Region::Flash,
                base: FLASH_ORG,
                size: args.flash_size,
            },
            Mapping {
                region: Region::Sram,
                base: SRAM_ORG,
                size: SRAM_SIZE,
            },
            Mapping {
                region: Region::IoBank0,
                base: IO_BANK0_ORG,
                size: IO_BANK0_SIZE,
            },
            Mapping {
                region: Region::Uart0,
                base: UART0_ORG,
                size: UART_SIZE,
            },
            Mapping {
                region: Region::Uart1,
                base: UART1_ORG,
                size: UART_SIZE,
            },
            Mapping {
                region: Region::Timer,
                base: TIMER_ORG,
                size: TIMER_SIZE,
            },
            Mapping {
                region: Region::Usb,
                base: USB_ORG,
                size: USB_SIZE,
            },
            Mapping {
                region: Region::Sio,
                base: SIO_ORG,
                size: SIO_SIZE,
            },
        ];
        check_map(&map)?;

        let uart0_irq = args.nvic.register_irq(UART0_IRQ)?;
        let uart1_irq = args.nvic.register_irq(UART1_IRQ)?;

        Ok(Self {
            rom: BusConverter::new(Rom::new(vec![0; ROM_SIZE as usize])),
            flash: BusConverter::new(Ram::new(vec![0; args.flash_size as usize])),
            sram: BusConverter::new(Ram::new(vec![0; SRAM_SIZE as usize])),
            sio: Sio::new(),
            io_bank0: IoBank0::new(),
            uart0: Uart::new("uart0", args.uart0, uart0_irq),
            uart1: Uart::new("uart1", args.uart1, uart1_irq),
            timer: UnimplementedDevice::new("timer", TIMER_SIZE),
            usb: UnimplementedDevice::new("usb", USB_SIZE),
            map,
        })
    }

    /// The decode table, in construction order.
    pub fn map(&self) -> &[Mapping] {
        &self.map
    }

    /// Region mapped at `addr`, if any.
    pub fn region_at(&self, addr: BusAddr) -> Option<Region> {
        self.find(addr).map(|m| m.region)
    }

    fn find(&self, addr: BusAddr) -> Option<Mapping> {
        self.map.iter().copied().find(|m| m.contains(addr))
    }

    fn device(&mut self, region: Region) -> &mut dyn Bus {
        match region {
            Region::Rom => &mut self.rom,
            Region::Flash => &mut self.flash,
            Region::Sram => &mut self.sram,
            Region::IoBank0 => &mut self.io_bank0,
            Region::Uart0 => &mut self.uart0,
            Region::Uart1 => &mut self.uart1,
            Region::Timer => &mut self.timer,
            Region::Usb => &mut self.usb,
            Region::Sio => &mut self.sio,
        }
    }

    /// Copy `data` into the memory backing `addr`. The whole range must fall
    /// inside a single ROM, flash or SRAM window.
    pub fn load(&mut self, addr: BusAddr, data: &[u8]) -> Result<Region, RootBusError> {
        let out_of_range = RootBusError::SegmentOutOfRange {
            addr,
            len: data.len(),
        };
        let Some(mapping) = self.find(addr) else {
            return Err(out_of_range);
        };
        let offset = (addr - mapping.base) as usize;
        let range = offset..offset + data.len();
        match mapping.region {
            Region::Rom => {
                // Rebuild the ROM image around the segment.
                let mut rom = self.rom.inner().data().to_vec();
                rom.get_mut(range)
                    .ok_or(out_of_range)?
                    .copy_from_slice(data);
                self.rom = BusConverter::new(Rom::new(rom));
            }
            Region::Flash => self
                .flash
                .inner_mut()
                .data_mut()
                .get_mut(range)
                .ok_or(out_of_range)?
                .copy_from_slice(data),
            Region::Sram => self
                .sram
                .inner_mut()
                .data_mut()
                .get_mut(range)
                .ok_or(out_of_range)?
                .copy_from_slice(data),
            _ => return Err(out_of_range),
        }
        Ok(mapping.region)
    }
}

/// Reject empty windows and overlapping windows.
fn check_map(map: &[Mapping]) -> Result<(), RootBusError> {
    for m in map {
        if m.size == 0 {
            return Err(RootBusError::EmptyRegion(m.region));
        }
    }
    for (i, a) in map.iter().enumerate() {
        for b in &map[i + 1..] {
            if let (Some(a_last), Some(b_last)) = (a.last(), b.last()) {
                if u64::from(a.base) <= b_last && u64::from(b.base) <= a_last {
                    return Err(RootBusError::Overlap {
                        a: a.region,
                        a_base: a.base,
                        b: b.region,
                        b_base: b.base,
                    });
                }
            }
        }
    }
    Ok(())
}

impl Bus for Rp2040RootBus {
    fn read(&mut self, size: AccessSize, addr: BusAddr) -> Result<BusData, BusError> {
        let Some(m) = self.find(addr) else {
            log::warn!("read of unmapped address 0x{addr:08x}");
            return Err(BusError::LoadAccessFault);
        };
        self.device(m.region).read(size, addr - m.base)
    }

    fn write(&mut self, size: AccessSize, addr: BusAddr, val: BusData) -> Result<(), BusError> {
        let Some(m) = self.find(addr) else {
            log::warn!("write of unmapped address 0x{addr:08x}");
            return Err(BusError::StoreAccessFault);
        };
        self.device(m.region).write(size, addr - m.base, val)
    }

    fn poll(&mut self) {
        self.rom.poll();
        self.flash.poll();
        self.sram.poll();
        self.sio.poll();
        self.io_bank0.poll();
        self.uart0.poll();
        self.uart1.poll();
        self.timer.poll();
        self.usb.poll();
    }

    fn warm_reset(&mut self) {
        self.rom.warm_reset();
        self.flash.warm_reset();
        self.sram.warm_reset();
        self.sio.warm_reset();
        self.io_bank0.warm_reset();
        self.uart0.warm_reset();
        self.uart1.warm_reset();
        self.timer.warm_reset();
        self.usb.warm_reset();
    }
}
