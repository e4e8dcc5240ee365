/*++

Licensed under the Apache-2.0 license.

File Name:

    main.rs

Abstract:

    File contains main entrypoint for the RP2040 Emulator.

--*/

use clap::Parser;
use rp2040_cpu::StepAction;
use rp2040_emulator::{Emulator, EmulatorArgs, EMULATOR_RUNNING};
use simple_logger::SimpleLogger;
use std::io;
use std::io::IsTerminal;
use std::process::exit;
use std::sync::atomic::Ordering;

// CPU Main Loop
fn free_run(mut emulator: Emulator) {
    while EMULATOR_RUNNING.load(Ordering::Relaxed) {
        match emulator.step() {
            StepAction::Break => break,
            StepAction::Fatal => break,
            _ => {}
        }
    }
}

fn main() {
    let cli = EmulatorArgs::parse();

    let _ = SimpleLogger::new()
        .with_level(cli.log_level.into())
        .init();

    // exit cleanly on Ctrl-C
    if io::stdout().is_terminal() {
        if let Err(e) = ctrlc::set_handler(move || {
            EMULATOR_RUNNING.store(false, Ordering::Relaxed);
        }) {
            log::warn!("failed to install Ctrl-C handler: {e}");
        }
    }

    let emulator = match Emulator::from_args(cli, false) {
        Ok(emulator) => emulator,
        Err(e) => {
            log::error!("{e}");
            exit(1);
        }
    };

    free_run(emulator);
}
