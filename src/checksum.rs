//! CRC-32 checksums in the format used by the POD file list.
//!
//! The file list stores checksums as uppercase hex without zero padding, so
//! `0x0000ABCD` is written `ABCD`. Every comparison goes through these
//! helpers to keep both sides in the same format.

use std::io::Read;
use std::path::Path;

use crc32fast::Hasher;

use crate::error::{PatchError, Result};

const BUF_SIZE: usize = 64 * 1024;

/// Incremental checksum for data that arrives in chunks.
#[derive(Default)]
pub struct Crc32 {
    hasher: Hasher,
}

impl Crc32 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    #[must_use]
    pub fn finish(self) -> String {
        format!("{:X}", self.hasher.finalize())
    }
}

/// Checksum of an in-memory buffer.
#[cfg(test)]
#[must_use]
pub fn crc32_hex(bytes: &[u8]) -> String {
    let mut crc = Crc32::new();
    crc.update(bytes);
    crc.finish()
}

/// Checksum of a file on disk, read in fixed-size chunks.
pub fn crc32_file(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path).map_err(|e| PatchError::fs("open", path, e))?;
    let mut crc = Crc32::new();
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let read = file
            .read(&mut buf)
            .map_err(|e| PatchError::fs("read", path, e))?;
        if read == 0 {
            break;
        }
        crc.update(&buf[..read]);
    }
    Ok(crc.finish())
}
