// Licensed under the Apache-2.0 license

use crate::loader::Segment;
use elf::abi::{EM_ARM, PT_LOAD};
use elf::endian::AnyEndian;
use elf::file::Class;
use elf::ElfBytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ElfError {
    #[error("failed to parse ELF file: {0}")]
    Parse(String),
    #[error("ELF file is not 32-bit")]
    NotElf32,
    #[error("ELF machine {0} is not ARM")]
    NotArm(u16),
    #[error("ELF file has no LOAD segments")]
    NoLoadSegments,
}

/// ELF Executable
#[derive(Debug, Default)]
pub struct ElfExecutable {
    entry_point: u32,
    segments: Vec<Segment>,
}

impl ElfExecutable {
    /// Parse a 32-bit ARM executable and collect the file-backed contents of
    /// its `PT_LOAD` segments at their physical (load) addresses.
    pub fn new(elf_bytes: &[u8]) -> Result<Self, ElfError> {
        let elf_file = ElfBytes::<AnyEndian>::minimal_parse(elf_bytes)
            .map_err(|e| ElfError::Parse(e.to_string()))?;

        if elf_file.ehdr.class != Class::ELF32 {
            return Err(ElfError::NotElf32);
        }
        if elf_file.ehdr.e_machine != EM_ARM {
            return Err(ElfError::NotArm(elf_file.ehdr.e_machine));
        }

        let Some(phdrs) = elf_file.segments() else {
            return Err(ElfError::NoLoadSegments);
        };

        let mut segments = vec![];
        let mut saw_load = false;
        for phdr in phdrs.iter().filter(|p| p.p_type == PT_LOAD) {
            saw_load = true;
            let data = elf_file
                .segment_data(&phdr)
                .map_err(|e| ElfError::Parse(e.to_string()))?;
            // .bss and friends have no file contents; the memory is already zero.
            if data.is_empty() {
                continue;
            }
            segments.push(Segment {
                addr: phdr.p_paddr as u32,
                data: data.to_vec(),
            });
        }
        if !saw_load {
            return Err(ElfError::NoLoadSegments);
        }

        Ok(Self {
            entry_point: elf_file.ehdr.e_entry as u32,
            segments,
        })
    }

    /// Executable entry point
    pub fn entry_point(&self) -> u32 {
        self.entry_point
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn into_segments(self) -> Vec<Segment> {
        self.segments
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    const EHDR_SIZE: usize = 52;
    const PHDR_SIZE: usize = 32;

    /// Build a little-endian ELF32 executable with one `PT_LOAD` program
    /// header per `(paddr, data, memsz)` entry.
    pub(crate) fn build_elf32(
        machine: u16,
        entry: u32,
        segments: &[(u32, &[u8], u32)],
    ) -> Vec<u8> {
        let mut out = vec![0u8; EHDR_SIZE];
        out[..4].copy_from_slice(b"\x7fELF");
        out[4] = 1; // ELFCLASS32
        out[5] = 1; // ELFDATA2LSB
        out[6] = 1; // EV_CURRENT
        out[16..18].copy_from_slice(&2u16.to_le_bytes()); // ET_EXEC
        out[18..20].copy_from_slice(&machine.to_le_bytes());
        out[20..24].copy_from_slice(&1u32.to_le_bytes());
        out[24..28].copy_from_slice(&entry.to_le_bytes());
        out[28..32].copy_from_slice(&(EHDR_SIZE as u32).to_le_bytes()); // e_phoff
        out[40..42].copy_from_slice(&(EHDR_SIZE as u16).to_le_bytes());
        out[42..44].copy_from_slice(&(PHDR_SIZE as u16).to_le_bytes());
        out[44..46].copy_from_slice(&(segments.len() as u16).to_le_bytes());

        let mut offset = EHDR_SIZE + PHDR_SIZE * segments.len();
        for (paddr, data, memsz) in segments {
            let mut phdr = [0u8; PHDR_SIZE];
            phdr[0..4].copy_from_slice(&PT_LOAD.to_le_bytes());
            phdr[4..8].copy_from_slice(&(offset as u32).to_le_bytes());
            phdr[8..12].copy_from_slice(&paddr.to_le_bytes()); // p_vaddr
            phdr[12..16].copy_from_slice(&paddr.to_le_bytes()); // p_paddr
            phdr[16..20].copy_from_slice(&(data.len() as u32).to_le_bytes());
            phdr[20..24].copy_from_slice(&memsz.to_le_bytes());
            phdr[24..28].copy_from_slice(&5u32.to_le_bytes()); // R | X
            phdr[28..32].copy_from_slice(&4u32.to_le_bytes());
            out.extend_from_slice(&phdr);
            offset += data.len();
        }
        for (_, data, _) in segments {
            out.extend_from_slice(data);
        }
        out
    }

    #[test]
    fn test_load_segments() {
        let vectors: &[u8] = &[0x00, 0x20, 0x04, 0x20, 0xf7, 0x00, 0x00, 0x10];
        let bss: &[u8] = &[];
        let data: &[u8] = b"data";
        let bytes = build_elf32(
            EM_ARM,
            0x1000_00f7,
            &[
                (0x1000_0000, vectors, 8),
                (0x2000_0000, bss, 0x100),
                (0x1000_0100, data, 4),
            ],
        );
        let elf = ElfExecutable::new(&bytes).unwrap();
        assert_eq!(elf.entry_point(), 0x1000_00f7);
        assert_eq!(elf.segments().len(), 2);
        assert_eq!(elf.segments()[0].addr, 0x1000_0000);
        assert_eq!(elf.segments()[0].data.len(), 8);
        assert_eq!(elf.segments()[1].addr, 0x1000_0100);
        assert_eq!(elf.segments()[1].data, b"data");
    }

    #[test]
    fn test_rejects_other_machines() {
        // EM_RISCV
        let text: &[u8] = b"abcd";
        let bytes = build_elf32(243, 0, &[(0x1000_0000, text, 4)]);
        assert!(matches!(
            ElfExecutable::new(&bytes),
            Err(ElfError::NotArm(243))
        ));
    }

    #[test]
    fn test_rejects_non_elf() {
        assert!(matches!(
            ElfExecutable::new(b"\x00\x20\x04\x20\xf7\x00\x00\x10"),
            Err(ElfError::Parse(_))
        ));
    }

    #[test]
    fn test_no_load_segments() {
        let bytes = build_elf32(EM_ARM, 0, &[]);
        assert!(matches!(
            ElfExecutable::new(&bytes),
            Err(ElfError::NoLoadSegments)
        ));
    }
}
