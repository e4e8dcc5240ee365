/*++

Licensed under the Apache-2.0 license.

File Name:

    nvic.rs

Abstract:

    File contains the interrupt lines of the core's NVIC.

--*/

use crate::CpuError;
use std::cell::Cell;
use std::rc::Rc;

/// Interrupt input lines of the core. Only line levels are tracked; pending
/// and priority logic belongs to the instruction engine.
pub struct Nvic {
    lines: Rc<[Cell<bool>]>,
}

impl Nvic {
    pub fn new(num_irq: u32) -> Self {
        Self {
            lines: (0..num_irq).map(|_| Cell::new(false)).collect(),
        }
    }

    pub fn num_irq(&self) -> u32 {
        self.lines.len() as u32
    }

    /// Returns the input for interrupt `line`, to be handed to the device
    /// that drives it.
    pub fn register_irq(&self, line: u8) -> Result<Irq, CpuError> {
        if u32::from(line) >= self.num_irq() {
            return Err(CpuError::IrqOutOfRange {
                line,
                num_irq: self.num_irq(),
            });
        }
        Ok(Irq {
            line,
            lines: self.lines.clone(),
        })
    }

    pub fn is_asserted(&self, line: u8) -> bool {
        self.lines
            .get(usize::from(line))
            .map(Cell::get)
            .unwrap_or(false)
    }

    /// Lines currently held high, lowest first.
    pub fn asserted(&self) -> Vec<u8> {
        self.lines
            .iter()
            .enumerate()
            .filter(|(_, level)| level.get())
            .map(|(line, _)| line as u8)
            .collect()
    }
}

/// One NVIC input, owned by the device whose output it is connected to.
pub struct Irq {
    line: u8,
    lines: Rc<[Cell<bool>]>,
}

impl Irq {
    pub fn id(&self) -> u8 {
        self.line
    }

    pub fn set_level(&self, level: bool) {
        self.lines[usize::from(self.line)].set(level);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_register_irq() {
        let nvic = Nvic::new(32);
        let irq = nvic.register_irq(20).unwrap();
        assert_eq!(irq.id(), 20);
        assert!(!nvic.is_asserted(20));

        irq.set_level(true);
        assert!(nvic.is_asserted(20));
        assert_eq!(nvic.asserted(), vec![20]);

        irq.set_level(false);
        assert!(nvic.asserted().is_empty());
    }

    #[test]
    fn test_irq_out_of_range() {
        let nvic = Nvic::new(32);
        assert!(matches!(
            nvic.register_irq(32),
            Err(CpuError::IrqOutOfRange {
                line: 32,
                num_irq: 32
            })
        ));
        assert!(!nvic.is_asserted(40));
    }
}
