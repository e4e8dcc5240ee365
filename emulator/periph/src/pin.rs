// Licensed under the Apache-2.0 license

use rp2040_consts::NUM_GPIO;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PinError {
    #[error("GPIO {0} out of range (the bank has {pins} pins)", pins = NUM_GPIO)]
    OutOfRange(usize),
}

pub(crate) fn check_pin(pin: usize) -> Result<usize, PinError> {
    if pin < NUM_GPIO {
        Ok(pin)
    } else {
        Err(PinError::OutOfRange(pin))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_check_pin() {
        assert_eq!(check_pin(0), Ok(0));
        assert_eq!(check_pin(29), Ok(29));
        assert_eq!(check_pin(30), Err(PinError::OutOfRange(30)));
        assert_eq!(
            PinError::OutOfRange(30).to_string(),
            "GPIO 30 out of range (the bank has 30 pins)"
        );
    }
}
