/*++

Licensed under the Apache-2.0 license.

File Name:

    clock.rs

Abstract:

    File contains the system clock shared by the core and the peripherals.

--*/

use caliptra_emu_bus::Clock;
use std::cell::Cell;
use std::rc::Rc;

/// System clock: the tick counter the core advances, plus its frequency
/// source. A clock may be fed by an external source (its frequency is known
/// before the SoC is realized) or left unsourced, in which case the SoC
/// drives it at its configured frequency.
pub struct SysClock {
    clock: Rc<Clock>,
    freq_hz: Cell<Option<u32>>,
}

impl Default for SysClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SysClock {
    /// Create an unsourced clock.
    pub fn new() -> Self {
        Self {
            clock: Rc::new(Clock::new()),
            freq_hz: Cell::new(None),
        }
    }

    /// Create a clock already driven by an external source.
    pub fn with_source(freq_hz: u32) -> Self {
        let clock = Self::new();
        clock.set_hz(freq_hz);
        clock
    }

    pub fn has_source(&self) -> bool {
        self.freq_hz.get().is_some()
    }

    pub fn set_hz(&self, freq_hz: u32) {
        self.freq_hz.set(Some(freq_hz));
    }

    pub fn freq_hz(&self) -> Option<u32> {
        self.freq_hz.get()
    }

    /// Tick counter handed to the core.
    pub fn clock(&self) -> Rc<Clock> {
        self.clock.clone()
    }

    /// Ticks elapsed since the clock was created.
    pub fn now(&self) -> u64 {
        self.clock.now()
    }
}
