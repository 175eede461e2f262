// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! FLIR `Upgrade.bin` container and flat firmware images.
//!
//! An upgrade file is a sequence of chunks: 2-byte little-endian
//! CRC16-XMODEM of the data, 2 zero bytes, then up to 1024 data bytes.

use anyhow::{bail, ensure, Result};
use crc::{Crc, CRC_16_XMODEM};

pub const CHUNK_DATA_SIZE: usize = 1024;
pub const CHUNK_HEADER_SIZE: usize = 4;
pub const CHUNK_SIZE: usize = CHUNK_HEADER_SIZE + CHUNK_DATA_SIZE;

const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

/// Raw image bytes and the flash address of byte 0.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FirmwareImage {
    bytes: Vec<u8>,
    load_address: u32,
}

impl FirmwareImage {
    pub fn new(bytes: Vec<u8>, load_address: u32) -> Self {
        Self {
            bytes,
            load_address,
        }
    }

    /// Decode an upgrade file, checking every chunk's padding and CRC.
    pub fn from_upgrade(data: &[u8], load_address: u32) -> Result<Self> {
        let mut bytes = Vec::with_capacity(data.len());

        for (index, chunk) in data.chunks(CHUNK_SIZE).enumerate() {
            ensure!(
                chunk.len() >= CHUNK_HEADER_SIZE,
                "chunk {index}: truncated header ({} bytes)",
                chunk.len()
            );
            let stored = u16::from_le_bytes([chunk[0], chunk[1]]);
            let padding = &chunk[2..4];
            let payload = &chunk[CHUNK_HEADER_SIZE..];

            if padding != [0, 0] {
                bail!("chunk {index}: expected zero padding, got {padding:02x?}");
            }
            let computed = CRC16.checksum(payload);
            if stored != computed {
                bail!("chunk {index}: CRC mismatch (stored 0x{stored:04x}, computed 0x{computed:04x})");
            }

            bytes.extend_from_slice(payload);
        }

        Ok(Self::new(bytes, load_address))
    }

    pub fn to_upgrade(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(chunk_count(self.bytes.len()) * CHUNK_SIZE);
        for data in self.bytes.chunks(CHUNK_DATA_SIZE) {
            out.extend_from_slice(&CRC16.checksum(data).to_le_bytes());
            out.extend_from_slice(&[0, 0]);
            out.extend_from_slice(data);
        }
        out
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn load_address(&self) -> u32 {
        self.load_address
    }

    /// Overlay `other` at its load address, zero-filling any gap.
    pub fn merge(&mut self, other: &FirmwareImage) -> Result<()> {
        let Some(offset) = other.load_address.checked_sub(self.load_address) else {
            bail!(
                "cannot merge image at 0x{:08x} below base 0x{:08x}",
                other.load_address,
                self.load_address
            );
        };
        let start = offset as usize;
        let end = start + other.bytes.len();

        if self.bytes.len() < end {
            self.bytes.resize(end, 0x00);
        }
        self.bytes[start..end].copy_from_slice(&other.bytes);
        Ok(())
    }

    /// Reset vector (vector table word 1), thumb bit cleared.
    pub fn entry_point(&self) -> Option<u32> {
        let word = self.bytes.get(4..8)?;
        Some(u32::from_le_bytes([word[0], word[1], word[2], word[3]]) & !1)
    }

    /// Point the reset vector at `addr` (thumb bit set).
    pub fn set_entry_point(&mut self, addr: u32) -> Result<()> {
        ensure!(
            self.bytes.len() >= 8,
            "image too short for a vector table ({} bytes)",
            self.bytes.len()
        );
        self.bytes[4..8].copy_from_slice(&(addr | 1).to_le_bytes());
        Ok(())
    }
}

pub fn chunk_count(data_len: usize) -> usize {
    data_len.div_ceil(CHUNK_DATA_SIZE)
}
