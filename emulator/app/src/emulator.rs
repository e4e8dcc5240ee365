/*++

Licensed under the Apache-2.0 license.

File Name:

    emulator.rs

Abstract:

    File contains the Emulator struct implementation and its command line.

--*/

use crate::boot::BootVector;
use crate::loader::load_firmware;
use crate::soc::{ConfigError, Rp2040Soc, SocArgs};
use clap::{ArgAction, Parser, ValueEnum};
use clap_num::maybe_hex;
use crossterm::event::{Event, KeyCode, KeyEvent};
use rp2040_bus::{BusError, SysClock};
use rp2040_consts::{DEFAULT_SYSCLK_HZ, FLASH_SIZE};
use rp2040_cpu::StepAction;
use rp2040_periph::UartArgs;
use std::cell::RefCell;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Cleared by Ctrl-C; the run loop and the console thread stop when it drops.
pub static EMULATOR_RUNNING: AtomicBool = AtomicBool::new(true);

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, name = "RP2040 Emulator")]
pub struct EmulatorArgs {
    /// Firmware image: an ARM ELF executable, or a raw binary placed at the
    /// start of flash.
    #[arg(short, long)]
    pub firmware: Option<PathBuf>,

    /// System clock frequency in Hz, used when no external source drives the clock.
    #[arg(long, value_parser = maybe_hex::<u32>, default_value_t = DEFAULT_SYSCLK_HZ)]
    pub sysclk_frq: u32,

    /// Flash size in bytes (at most 16 MiB).
    #[arg(long, value_parser = maybe_hex::<u32>, default_value_t = FLASH_SIZE)]
    pub flash_size: u32,

    // These look backwards, but this is necessary so that the default is to capture stdin.
    /// Pass stdin to the UART0 Rx.
    #[arg(long = "no-stdin-uart", action = ArgAction::SetFalse)]
    pub stdin_uart: bool,

    // this is used only to set stdin_uart to false
    #[arg(long = "stdin-uart", overrides_with = "stdin_uart")]
    pub _no_stdin_uart: bool,

    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,
}

pub struct Emulator {
    pub soc: Rp2040Soc,
    stdin_uart: Option<Arc<Mutex<Option<u8>>>>,
    uart_output: Option<Rc<RefCell<Vec<u8>>>>,
}

impl Emulator {
    /// Load the firmware and bring up the machine. Any error here aborts
    /// startup; nothing is left half-built.
    pub fn from_args(cli: EmulatorArgs, capture_uart_output: bool) -> Result<Self, ConfigError> {
        let image = load_firmware(cli.firmware.as_deref(), cli.flash_size)?;

        let uart_output = if capture_uart_output {
            Some(Rc::new(RefCell::new(Vec::new())))
        } else {
            None
        };

        let stdin_uart = if cli.stdin_uart && std::io::stdin().is_terminal() {
            Some(Arc::new(Mutex::new(None)))
        } else {
            None
        };

        let soc = Rp2040Soc::realize(
            SocArgs {
                clock: Rc::new(SysClock::new()),
                sysclk_hz: cli.sysclk_frq,
                flash_size: cli.flash_size,
                uart0: UartArgs {
                    output: uart_output.clone(),
                    input: stdin_uart.clone(),
                },
                uart1: UartArgs::default(),
            },
            &image,
        )?;

        Ok(Self::new(soc, stdin_uart, uart_output))
    }

    pub fn new(
        soc: Rp2040Soc,
        stdin_uart: Option<Arc<Mutex<Option<u8>>>>,
        uart_output: Option<Rc<RefCell<Vec<u8>>>>,
    ) -> Self {
        // read from the console in a separate thread to prevent blocking
        if let Some(rx) = stdin_uart.clone() {
            std::thread::spawn(move || read_console(rx));
        }

        Self {
            soc,
            stdin_uart,
            uart_output,
        }
    }

    pub fn step(&mut self) -> StepAction {
        if !EMULATOR_RUNNING.load(Ordering::Relaxed) {
            return StepAction::Break;
        }
        self.soc.step()
    }

    pub fn warm_reset(&mut self) -> Result<BootVector, BusError> {
        if let Some(ref stdin_uart) = self.stdin_uart {
            if let Ok(mut rx) = stdin_uart.lock() {
                *rx = None;
            }
        }
        self.soc.warm_reset()
    }

    /// Bytes UART0 has transmitted, when output capture was requested.
    pub fn uart_output(&self) -> Option<Vec<u8>> {
        self.uart_output.as_ref().map(|o| o.borrow().clone())
    }
}

fn read_console(stdin_uart: Arc<Mutex<Option<u8>>>) {
    let mut buffer = vec![];
    while EMULATOR_RUNNING.load(Ordering::Relaxed) {
        if buffer.is_empty() {
            match crossterm::event::read() {
                Ok(Event::Key(KeyEvent {
                    code: KeyCode::Char(ch),
                    ..
                })) => {
                    buffer.extend_from_slice(ch.to_string().as_bytes());
                }
                Ok(Event::Key(KeyEvent {
                    code: KeyCode::Enter,
                    ..
                })) => {
                    buffer.push(b'\r');
                }
                Ok(Event::Key(KeyEvent {
                    code: KeyCode::Backspace,
                    ..
                })) => {
                    buffer.push(8);
                }
                Ok(_) => {}
                Err(e) => {
                    log::warn!("console input stopped: {e}");
                    return;
                }
            }
        } else {
            let Ok(mut rx) = stdin_uart.lock() else {
                return;
            };
            if rx.is_none() {
                *rx = Some(buffer.remove(0));
            }
        }
        std::thread::yield_now();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rp2040_bus::Bus;
    use rp2040_consts::{FLASH_ORG, SIO_ORG, UART0_ORG};
    use rp2040_cpu::{CoreState, InstructionEngine};
    use rp2040_types::AccessSize;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn firmware(bytes: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    fn args(firmware: Option<PathBuf>) -> EmulatorArgs {
        EmulatorArgs::parse_from(
            ["rp2040-emulator", "--no-stdin-uart"]
                .into_iter()
                .map(String::from)
                .chain(
                    firmware
                        .into_iter()
                        .flat_map(|p| ["--firmware".to_string(), p.display().to_string()]),
                ),
        )
    }

    /// Writes r0 to UART0 DR, then toggles GPIO 25 through SIO.
    struct BlinkEngine;

    impl InstructionEngine for BlinkEngine {
        fn step(&mut self, state: &mut CoreState, bus: &mut dyn Bus) -> StepAction {
            if bus.write(AccessSize::Word, UART0_ORG, state.regs[0]).is_err()
                || bus.write(AccessSize::Word, SIO_ORG + 0x24, 1 << 25).is_err()
                || bus.write(AccessSize::Word, SIO_ORG + 0x1c, 1 << 25).is_err()
            {
                return StepAction::Fatal;
            }
            state.regs[CoreState::PC] += 2;
            StepAction::Continue
        }
    }

    #[test]
    fn test_cli_defaults() {
        let cli = EmulatorArgs::parse_from(["rp2040-emulator"]);
        assert_eq!(cli.firmware, None);
        assert_eq!(cli.sysclk_frq, 133_000_000);
        assert_eq!(cli.flash_size, 16 * 1024 * 1024);
        assert!(cli.stdin_uart);
        assert_eq!(cli.log_level, LogLevel::Info);

        let cli = EmulatorArgs::parse_from([
            "rp2040-emulator",
            "--sysclk-frq",
            "0x7735940",
            "--flash-size",
            "0x200000",
            "--no-stdin-uart",
            "--log-level",
            "debug",
        ]);
        assert_eq!(cli.sysclk_frq, 125_000_000);
        assert_eq!(cli.flash_size, 0x20_0000);
        assert!(!cli.stdin_uart);
        assert_eq!(log::LevelFilter::from(cli.log_level), log::LevelFilter::Debug);
    }

    #[test]
    fn test_from_args_boots() {
        let file = firmware(&[0x00, 0x20, 0x04, 0x20, 0xf7, 0x00, 0x00, 0x10]);
        let emulator = Emulator::from_args(args(Some(file.path().to_path_buf())), true).unwrap();
        assert_eq!(emulator.soc.cpu().read_sp(), 0x2004_2000);
        assert_eq!(emulator.soc.cpu().read_pc(), 0x1000_00f7);
        assert_eq!(emulator.soc.clock().freq_hz(), Some(133_000_000));
        assert_eq!(emulator.uart_output(), Some(vec![]));
    }

    #[test]
    fn test_missing_firmware_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nonexistent.elf");
        assert!(matches!(
            Emulator::from_args(args(Some(path)), false),
            Err(ConfigError::Load(_))
        ));
        assert!(matches!(
            Emulator::from_args(args(None), false),
            Err(ConfigError::Load(_))
        ));
    }

    #[test]
    fn test_engine_drives_peripherals() {
        let file = firmware(&[0x00, 0x20, 0x04, 0x20, 0xf7, 0x00, 0x00, 0x10]);
        let mut emulator =
            Emulator::from_args(args(Some(file.path().to_path_buf())), true).unwrap();
        emulator.soc.attach_engine(Box::new(BlinkEngine));
        emulator
            .soc
            .cpu_mut()
            .write_reg(0, u32::from(b'*'))
            .unwrap();

        assert_eq!(emulator.step(), StepAction::Continue);
        assert_eq!(emulator.soc.output_level(25), Ok(Some(true)));
        assert_eq!(emulator.step(), StepAction::Continue);
        assert_eq!(emulator.soc.output_level(25), Ok(Some(false)));
        assert_eq!(emulator.uart_output(), Some(b"**".to_vec()));
        assert_eq!(emulator.soc.cpu().read_pc(), 0x1000_00fb);
        assert_eq!(emulator.soc.clock().now(), 2);
    }

    #[test]
    fn test_warm_reset() {
        let file = firmware(&[0x00, 0x20, 0x04, 0x20, 0xf7, 0x00, 0x00, 0x10]);
        let mut emulator =
            Emulator::from_args(args(Some(file.path().to_path_buf())), false).unwrap();
        emulator.soc.cpu_mut().write_pc(0);
        emulator
            .soc
            .cpu_mut()
            .bus
            .write(AccessSize::Word, SIO_ORG + 0x20, 1)
            .unwrap();
        let vector = emulator.warm_reset().unwrap();
        assert_eq!(vector.pc, 0x1000_00f7);
        assert_eq!(emulator.soc.cpu().read_pc(), 0x1000_00f7);
        assert_eq!(emulator.soc.sio().gpio_oe(), 0);
        assert_eq!(
            emulator
                .soc
                .cpu_mut()
                .bus
                .read(AccessSize::Word, FLASH_ORG)
                .unwrap(),
            0x2004_2000
        );
    }
}
