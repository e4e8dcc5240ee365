/*++

Licensed under the Apache-2.0 license.

File Name:

    uart.rs

Abstract:

    File contains the register contract of the PL011 UARTs. Only the
    registers firmware touches to send and receive bytes are modeled.

--*/

use rp2040_bus::{Bus, BusError};
use rp2040_cpu::Irq;
use rp2040_types::{AccessSize, BusAddr, BusData};
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

/// PrimeCell peripheral and cell identification, 0xFE0 to 0xFFC.
const PL011_ID: [u8; 8] = [0x11, 0x10, 0x34, 0x00, 0x0d, 0xf0, 0x05, 0xb1];

/// Interrupt bits shared by RIS, MIS, IMSC and ICR.
const INT_RX: u32 = 1 << 4;
const INT_TX: u32 = 1 << 5;

/// Byte streams a UART is attached to.
#[derive(Default, Clone)]
pub struct UartArgs {
    /// Transmitted bytes are appended here, or go to stderr when unset.
    pub output: Option<Rc<RefCell<Vec<u8>>>>,
    /// Next byte to receive, filled by the console thread.
    pub input: Option<Arc<Mutex<Option<u8>>>>,
}

pub struct Uart {
    name: &'static str,
    output: Option<Rc<RefCell<Vec<u8>>>>,
    input: Option<Arc<Mutex<Option<u8>>>>,
    ibrd: u32,
    fbrd: u32,
    lcr_h: u32,
    cr: u32,
    ifls: u32,
    imsc: u32,
    irq: Irq,
}

impl Uart {
    /// Data Register
    const UARTDR: BusAddr = 0x000;

    /// Receive Status / Error Clear Register
    const UARTRSR: BusAddr = 0x004;

    /// Flag Register
    const UARTFR: BusAddr = 0x018;

    /// Integer Baud Rate Register
    const UARTIBRD: BusAddr = 0x024;

    /// Fractional Baud Rate Register
    const UARTFBRD: BusAddr = 0x028;

    /// Line Control Register
    const UARTLCR_H: BusAddr = 0x02c;

    /// Control Register
    const UARTCR: BusAddr = 0x030;

    /// Interrupt FIFO Level Select Register
    const UARTIFLS: BusAddr = 0x034;

    /// Interrupt Mask Set/Clear Register
    const UARTIMSC: BusAddr = 0x038;

    /// Raw Interrupt Status Register
    const UARTRIS: BusAddr = 0x03c;

    /// Masked Interrupt Status Register
    const UARTMIS: BusAddr = 0x040;

    /// Interrupt Clear Register
    const UARTICR: BusAddr = 0x044;

    const UARTPERIPHID0: BusAddr = 0xfe0;
    const UARTPCELLID3: BusAddr = 0xffc;

    // UARTFR bits
    const FR_RXFE: u32 = 1 << 4;
    const FR_RXFF: u32 = 1 << 6;
    const FR_TXFE: u32 = 1 << 7;

    /// Reset values of CR (TXE | RXE) and IFLS (half full)
    const CR_RESET: u32 = 0x300;
    const IFLS_RESET: u32 = 0x12;

    pub fn new(name: &'static str, args: UartArgs, irq: Irq) -> Self {
        Self {
            name,
            output: args.output,
            input: args.input,
            ibrd: 0,
            fbrd: 0,
            lcr_h: 0,
            cr: Self::CR_RESET,
            ifls: Self::IFLS_RESET,
            imsc: 0,
            irq,
        }
    }

    /// NVIC line this UART's interrupt output is connected to.
    pub fn irq_line(&self) -> u8 {
        self.irq.id()
    }

    fn rx_pending(&self) -> bool {
        self.input
            .as_ref()
            .and_then(|input| input.lock().ok().map(|rx| rx.is_some()))
            .unwrap_or(false)
    }

    fn raw_interrupts(&self) -> u32 {
        // The transmit FIFO drains instantly, so TX is always requesting data.
        let mut ris = INT_TX;
        if self.rx_pending() {
            ris |= INT_RX;
        }
        ris
    }

    fn flags(&self) -> u32 {
        let rx = if self.rx_pending() {
            Self::FR_RXFF
        } else {
            Self::FR_RXFE
        };
        Self::FR_TXFE | rx
    }

    fn transmit(&mut self, byte: u8) {
        match &self.output {
            Some(output) => output.borrow_mut().push(byte),
            None => {
                let mut stderr = std::io::stderr();
                let _ = stderr.write_all(&[byte]);
                let _ = stderr.flush();
            }
        }
    }

    fn receive(&mut self) -> u32 {
        match &self.input {
            Some(input) => match input.lock() {
                Ok(mut rx) => rx.take().map(u32::from).unwrap_or(0),
                Err(_) => 0,
            },
            None => 0,
        }
    }

    fn update_irq(&self) {
        self.irq.set_level(self.raw_interrupts() & self.imsc != 0);
    }
}

impl Bus for Uart {
    fn poll(&mut self) {
        self.update_irq();
    }

    /// Read data of specified size from given address
    ///
    /// # Arguments
    ///
    /// * `size` - Size of the read
    /// * `addr` - Address to read from
    ///
    /// # Error
    ///
    /// * `BusError` - Exception with cause `BusError::LoadAccessFault`
    fn read(&mut self, size: AccessSize, addr: BusAddr) -> Result<BusData, BusError> {
        if size == AccessSize::Invalid {
            return Err(BusError::LoadAccessFault);
        }
        let val = match addr {
            Uart::UARTDR => self.receive(),
            Uart::UARTRSR => 0,
            Uart::UARTFR => self.flags(),
            Uart::UARTIBRD => self.ibrd,
            Uart::UARTFBRD => self.fbrd,
            Uart::UARTLCR_H => self.lcr_h,
            Uart::UARTCR => self.cr,
            Uart::UARTIFLS => self.ifls,
            Uart::UARTIMSC => self.imsc,
            Uart::UARTRIS => self.raw_interrupts(),
            Uart::UARTMIS => self.raw_interrupts() & self.imsc,
            Uart::UARTPERIPHID0..=Uart::UARTPCELLID3 if addr % 4 == 0 => {
                u32::from(PL011_ID[((addr - Uart::UARTPERIPHID0) / 4) as usize])
            }
            _ => {
                log::debug!("{}: unimplemented read at 0x{addr:03x}", self.name);
                0
            }
        };
        Ok(val)
    }

    /// Write data of specified size to given address
    ///
    /// # Arguments
    ///
    /// * `size` - Size of the write
    /// * `addr` - Address to write
    /// * `val` - Data to write
    ///
    /// # Error
    ///
    /// * `BusError` - Exception with cause `BusError::StoreAccessFault`
    fn write(&mut self, size: AccessSize, addr: BusAddr, val: BusData) -> Result<(), BusError> {
        if size == AccessSize::Invalid {
            return Err(BusError::StoreAccessFault);
        }
        match addr {
            Uart::UARTDR => self.transmit(val as u8),
            // Writing any value clears the (never set) error flags.
            Uart::UARTRSR => {}
            Uart::UARTIBRD => self.ibrd = val & 0xffff,
            Uart::UARTFBRD => self.fbrd = val & 0x3f,
            Uart::UARTLCR_H => self.lcr_h = val & 0xff,
            Uart::UARTCR => self.cr = val & 0xff87,
            Uart::UARTIFLS => self.ifls = val & 0x3f,
            Uart::UARTIMSC => self.imsc = val & 0x7ff,
            // RX and TX are level conditions; clearing them has no lasting effect.
            Uart::UARTICR => {}
            _ => log::debug!(
                "{}: unimplemented write at 0x{addr:03x} = 0x{val:08x}",
                self.name
            ),
        }
        self.update_irq();
        Ok(())
    }

    fn warm_reset(&mut self) {
        self.ibrd = 0;
        self.fbrd = 0;
        self.lcr_h = 0;
        self.cr = Self::CR_RESET;
        self.ifls = Self::IFLS_RESET;
        self.imsc = 0;
        self.update_irq();
    }
}
