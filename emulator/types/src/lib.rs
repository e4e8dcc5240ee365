/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains the primitive types of the RP2040 system bus.

--*/

/// Physical address on the system bus.
pub type BusAddr = u32;

/// Data carried by a single bus transaction.
pub type BusData = u32;

/// Width of a single bus transaction.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AccessSize {
    /// Byte
    Byte = 1,

    /// Half word (16 bits)
    HalfWord = 2,

    /// Word (32 bits)
    Word = 4,

    /// Invalid size
    Invalid = 0,
}

impl AccessSize {
    /// Number of bytes moved by an access of this size.
    pub fn bytes(self) -> usize {
        self as usize
    }

    /// Returns true if `addr` is naturally aligned for this access size.
    pub fn is_aligned(self, addr: BusAddr) -> bool {
        match self {
            AccessSize::Invalid => false,
            _ => addr % (self as u32) == 0,
        }
    }
}

impl From<usize> for AccessSize {
    fn from(size: usize) -> Self {
        match size {
            1 => AccessSize::Byte,
            2 => AccessSize::HalfWord,
            4 => AccessSize::Word,
            _ => AccessSize::Invalid,
        }
    }
}

impl From<AccessSize> for usize {
    fn from(size: AccessSize) -> Self {
        size as usize
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_access_size_from_usize() {
        assert_eq!(AccessSize::from(1), AccessSize::Byte);
        assert_eq!(AccessSize::from(2), AccessSize::HalfWord);
        assert_eq!(AccessSize::from(4), AccessSize::Word);
        assert_eq!(AccessSize::from(3), AccessSize::Invalid);
        assert_eq!(AccessSize::from(8), AccessSize::Invalid);
    }

    #[test]
    fn test_alignment() {
        assert!(AccessSize::Word.is_aligned(0xd000_0010));
        assert!(!AccessSize::Word.is_aligned(0xd000_0012));
        assert!(AccessSize::HalfWord.is_aligned(0x2000_0002));
        assert!(AccessSize::Byte.is_aligned(0x2000_0003));
        assert!(!AccessSize::Invalid.is_aligned(0));
    }
}
