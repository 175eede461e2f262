// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Intel-HEX records: encoding for the flash dumper, parsing for the host.

use heapless::Vec;

use crate::console::{Console, ConsoleError, Pump};
use crate::hal::MemoryRead;

/// Payload bytes per emitted data record.
pub const RECORD_DATA_LEN: usize = 16;
/// `:` + 2 len + 4 addr + 2 type + 32 data + 2 checksum + CRLF.
pub const DATA_LINE_LEN: usize = 1 + 8 + RECORD_DATA_LEN * 2 + 2 + 2;
pub const EOF_LINE: &[u8] = b":00000001FF\r\n";
/// Flash is read in pages of this size, sixteen records each.
pub const DUMP_PAGE_SIZE: usize = 256;
/// Largest payload a single record can declare.
pub const MAX_RECORD_DATA: usize = 255;

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

pub fn hex_digit(nibble: u8) -> u8 {
    HEX_DIGITS[(nibble & 0x0F) as usize]
}

/// Upper-case hex of one byte.
pub fn hex_byte(b: u8) -> [u8; 2] {
    [hex_digit(b >> 4), hex_digit(b)]
}

pub fn hex_u16(v: u16) -> [u8; 4] {
    let [h, l] = v.to_be_bytes();
    let (h, l) = (hex_byte(h), hex_byte(l));
    [h[0], h[1], l[0], l[1]]
}

pub fn hex_u32(v: u32) -> [u8; 8] {
    let mut out = [0u8; 8];
    for (i, b) in v.to_be_bytes().into_iter().enumerate() {
        out[i * 2..i * 2 + 2].copy_from_slice(&hex_byte(b));
    }
    out
}

/// Two's complement of the byte sum.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes
        .iter()
        .fold(0u8, |acc, &b| acc.wrapping_add(b))
        .wrapping_neg()
}

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecordType {
    Data = 0x00,
    EndOfFile = 0x01,
}

impl RecordType {
    fn from_u8(v: u8) -> Option<Self> {
        match v {
            0x00 => Some(Self::Data),
            0x01 => Some(Self::EndOfFile),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HexError {
    MissingStartCode,
    InvalidDigit,
    /// Line length disagrees with the declared byte count.
    LengthMismatch,
    UnsupportedType(u8),
    /// Stored checksum, computed checksum.
    BadChecksum(u8, u8),
}

impl core::fmt::Display for HexError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::MissingStartCode => write!(f, "record does not start with ':'"),
            Self::InvalidDigit => write!(f, "invalid hex digit"),
            Self::LengthMismatch => write!(f, "record length does not match its byte count"),
            Self::UnsupportedType(t) => write!(f, "unsupported record type 0x{t:02X}"),
            Self::BadChecksum(stored, computed) => write!(
                f,
                "checksum mismatch (stored 0x{stored:02X}, computed 0x{computed:02X})"
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for HexError {}

/// One decoded record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HexRecord {
    pub address: u16,
    pub kind: RecordType,
    pub data: Vec<u8, MAX_RECORD_DATA>,
}

impl HexRecord {
    /// Encode a 16-byte data record as a CRLF-terminated line.
    pub fn encode_data(address: u16, data: &[u8; RECORD_DATA_LEN]) -> [u8; DATA_LINE_LEN] {
        let mut line = [0u8; DATA_LINE_LEN];
        let [ah, al] = address.to_be_bytes();

        let mut sum = [0u8; 4 + RECORD_DATA_LEN];
        sum[..4].copy_from_slice(&[RECORD_DATA_LEN as u8, ah, al, RecordType::Data as u8]);
        sum[4..].copy_from_slice(data);

        line[0] = b':';
        for (i, &b) in sum.iter().enumerate() {
            line[1 + i * 2..3 + i * 2].copy_from_slice(&hex_byte(b));
        }
        let tail = DATA_LINE_LEN - 4;
        line[tail..tail + 2].copy_from_slice(&hex_byte(checksum(&sum)));
        line[DATA_LINE_LEN - 2..].copy_from_slice(b"\r\n");
        line
    }

    /// Parse one record. Surrounding whitespace (the CRLF) is ignored.
    pub fn parse(line: &str) -> Result<Self, HexError> {
        let body = line
            .trim()
            .strip_prefix(':')
            .ok_or(HexError::MissingStartCode)?
            .as_bytes();

        if body.len() < 10 || body.len() % 2 != 0 {
            return Err(HexError::LengthMismatch);
        }

        let mut raw: Vec<u8, { MAX_RECORD_DATA + 5 }> = Vec::new();
        for pair in body.chunks(2) {
            let b = (decode_nibble(pair[0])? << 4) | decode_nibble(pair[1])?;
            raw.push(b).map_err(|_| HexError::LengthMismatch)?;
        }

        let count = raw[0] as usize;
        if raw.len() != count + 5 {
            return Err(HexError::LengthMismatch);
        }

        let (content, stored) = raw.split_at(raw.len() - 1);
        let computed = checksum(content);
        if stored[0] != computed {
            return Err(HexError::BadChecksum(stored[0], computed));
        }

        let kind = RecordType::from_u8(raw[3]).ok_or(HexError::UnsupportedType(raw[3]))?;
        let mut data = Vec::new();
        data.extend_from_slice(&raw[4..4 + count])
            .map_err(|_| HexError::LengthMismatch)?;

        Ok(Self {
            address: u16::from_be_bytes([raw[1], raw[2]]),
            kind,
            data,
        })
    }
}

fn decode_nibble(c: u8) -> Result<u8, HexError> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        _ => Err(HexError::InvalidDigit),
    }
}

/// Stream `[start, end)` to the console as data records addressed relative
/// to `start`, followed by the EOF record.
pub fn dump_flash<M, P, const N: usize>(
    mem: &M,
    console: &mut Console<P, N>,
    start: u32,
    end: u32,
) -> Result<(), ConsoleError>
where
    M: MemoryRead,
    P: Pump,
{
    let mut page = [0u8; DUMP_PAGE_SIZE];
    let mut addr = start;

    while addr < end {
        mem.read(addr, &mut page);
        for (i, chunk) in page.chunks_exact(RECORD_DATA_LEN).enumerate() {
            let offset = (addr - start) as usize + i * RECORD_DATA_LEN;
            let mut record = [0u8; RECORD_DATA_LEN];
            record.copy_from_slice(chunk);
            console.write(&HexRecord::encode_data(offset as u16, &record))?;
        }
        addr = addr.saturating_add(DUMP_PAGE_SIZE as u32);
    }

    console.write(EOF_LINE)
}
