/*++

Licensed under the Apache-2.0 license.

File Name:

    loader.rs

Abstract:

    File contains the firmware image loader: ELF executables, falling back
    to a raw binary placed at the flash base.

--*/

use crate::elf::ElfExecutable;
use rp2040_consts::FLASH_ORG;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Bytes to be placed at a physical address before the core starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub addr: u32,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Elf,
    Raw,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareImage {
    pub format: ImageFormat,
    /// ELF entry point. The core starts from the flash vector table either
    /// way; this is informational.
    pub entry: Option<u32>,
    pub segments: Vec<Segment>,
}

impl FirmwareImage {
    /// Raw binary to be placed at the start of flash.
    pub fn raw(data: Vec<u8>) -> Self {
        Self {
            format: ImageFormat::Raw,
            entry: None,
            segments: vec![Segment {
                addr: FLASH_ORG,
                data,
            }],
        }
    }

    /// Total number of bytes placed by the image.
    pub fn size(&self) -> usize {
        self.segments.iter().map(|s| s.data.len()).sum()
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no firmware image given (use --firmware)")]
    NoFirmware,
    #[error("could not load firmware {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("firmware {} is empty", .0.display())]
    Empty(PathBuf),
    #[error("raw image of {size} bytes does not fit in {flash_size} bytes of flash")]
    TooLarge { size: usize, flash_size: u32 },
}

/// Load the firmware at `path`. ELF files are split into their load
/// segments; anything that does not parse as an ARM ELF is treated as a raw
/// flash image.
pub fn load_firmware(path: Option<&Path>, flash_size: u32) -> Result<FirmwareImage, LoadError> {
    let path = path.ok_or(LoadError::NoFirmware)?;
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if bytes.is_empty() {
        return Err(LoadError::Empty(path.to_path_buf()));
    }

    let image = match ElfExecutable::new(&bytes) {
        Ok(elf) => FirmwareImage {
            format: ImageFormat::Elf,
            entry: Some(elf.entry_point()),
            segments: elf.into_segments(),
        },
        Err(e) => {
            log::info!("{}: {e}; loading as raw binary", path.display());
            if bytes.len() > flash_size as usize {
                return Err(LoadError::TooLarge {
                    size: bytes.len(),
                    flash_size,
                });
            }
            FirmwareImage::raw(bytes)
        }
    };

    log::info!(
        "Loaded {:?} firmware {} ({} bytes in {} segment(s))",
        image.format,
        path.display(),
        image.size(),
        image.segments.len()
    );
    Ok(image)
}
