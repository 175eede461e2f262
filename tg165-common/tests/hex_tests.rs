// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Tests for Intel-HEX encoding, parsing and the flash dumper.

mod support;

use support::{drain_all, FakeMemory, HostPump};
use tg165_common::console::{Console, WaitPolicy};
use tg165_common::hex::{
    checksum, dump_flash, hex_u32, HexError, HexRecord, RecordType, DATA_LINE_LEN, EOF_LINE,
};

fn record_sum(line: &str) -> u8 {
    let body = line.trim_end().trim_start_matches(':');
    (0..body.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&body[i..i + 2], 16).unwrap())
        .fold(0u8, |acc, b| acc.wrapping_add(b))
}

// =============================================================================
// Encoding
// =============================================================================

#[test]
fn test_checksum_twos_complement() {
    assert_eq!(checksum(&[0x00, 0x00, 0x00, 0x01]), 0xFF);
    assert_eq!(checksum(&[0x10, 0x01, 0x00, 0x00]), 0xEF);
    assert_eq!(checksum(&[]), 0x00);
}

#[test]
fn test_encode_erased_record() {
    let line = HexRecord::encode_data(0x0000, &[0xFF; 16]);
    assert_eq!(line.len(), DATA_LINE_LEN);
    assert_eq!(
        std::str::from_utf8(&line).unwrap(),
        ":10000000FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF00\r\n"
    );
}

#[test]
fn test_encode_known_record() {
    let data: [u8; 16] = core::array::from_fn(|i| i as u8);
    let line = HexRecord::encode_data(0x1230, &data);
    let text = std::str::from_utf8(&line).unwrap();
    assert_eq!(text, ":10123000000102030405060708090A0B0C0D0E0F36\r\n");
    assert_eq!(record_sum(text), 0);
}

#[test]
fn test_hex_u32_upper_case() {
    assert_eq!(&hex_u32(0x0a1b_2c3d), b"0A1B2C3D");
}

// =============================================================================
// Parsing
// =============================================================================

#[test]
fn test_parse_data_record() {
    let rec = HexRecord::parse(":0300300002337A1E\r\n").unwrap();
    assert_eq!(rec.address, 0x0030);
    assert_eq!(rec.kind, RecordType::Data);
    assert_eq!(&rec.data[..], &[0x02, 0x33, 0x7A]);
}

#[test]
fn test_parse_eof_record() {
    let rec = HexRecord::parse(":00000001FF").unwrap();
    assert_eq!(rec.kind, RecordType::EndOfFile);
    assert!(rec.data.is_empty());
}

#[test]
fn test_parse_accepts_lower_case() {
    let line = std::str::from_utf8(&HexRecord::encode_data(0xABC0, &[0xAB; 16]))
        .unwrap()
        .to_lowercase();
    let rec = HexRecord::parse(&line).unwrap();
    assert_eq!(rec.address, 0xABC0);
    assert_eq!(&rec.data[..], &[0xAB; 16]);
}

#[test]
fn test_parse_rejects_bad_checksum() {
    assert_eq!(
        HexRecord::parse(":0300300002337A1F"),
        Err(HexError::BadChecksum(0x1F, 0x1E))
    );
}

#[test]
fn test_parse_rejects_malformed_lines() {
    assert_eq!(HexRecord::parse("00000001FF"), Err(HexError::MissingStartCode));
    assert_eq!(HexRecord::parse(":0000001FF"), Err(HexError::LengthMismatch));
    assert_eq!(HexRecord::parse(":0400000001FF"), Err(HexError::LengthMismatch));
    assert_eq!(HexRecord::parse(":00000001FG"), Err(HexError::InvalidDigit));
}

#[test]
fn test_parse_rejects_unsupported_type() {
    // Extended linear address record.
    assert_eq!(
        HexRecord::parse(":020000040800F2"),
        Err(HexError::UnsupportedType(0x04))
    );
}

// =============================================================================
// Dumper
// =============================================================================

#[test]
fn test_dump_erased_region_pages_and_checksums() {
    let mem = FakeMemory::erased();
    let mut console = Console::<_, 4096>::new(HostPump::new(64), WaitPolicy::Bounded(10_000));
    dump_flash(&mem, &mut console, 0x0800_0000, 0x0800_1000).unwrap();
    let text = drain_all(&mut console);

    let lines: Vec<&str> = text.split_inclusive("\r\n").collect();
    assert_eq!(lines.len(), 4096 / 16 + 1);

    for (i, line) in lines[..256].iter().enumerate() {
        assert_eq!(line.len(), DATA_LINE_LEN);
        assert_eq!(record_sum(line), 0, "line {i} checksum");
        let rec = HexRecord::parse(line).unwrap();
        assert_eq!(rec.address as usize, i * 16);
        assert_eq!(&rec.data[..], &[0xFF; 16]);
    }

    assert_eq!(lines[256].as_bytes(), EOF_LINE);
    assert_eq!(text.matches(":00000001FF").count(), 1);
}

#[test]
fn test_dump_reproduces_memory_contents() {
    let bytes: Vec<u8> = (0..512).map(|i| (i * 7) as u8).collect();
    let mem = FakeMemory {
        base: 0x0800_0000,
        bytes: bytes.clone(),
    };
    // Small ring forces the dumper to wait on the host between records.
    let mut console = Console::<_, 128>::new(HostPump::new(64), WaitPolicy::Bounded(10_000));
    dump_flash(&mem, &mut console, 0x0800_0000, 0x0800_0200).unwrap();
    let text = drain_all(&mut console);

    let mut image = Vec::new();
    for line in text.lines() {
        let rec = HexRecord::parse(line).unwrap();
        if rec.kind == RecordType::EndOfFile {
            break;
        }
        assert_eq!(rec.address as usize, image.len());
        image.extend_from_slice(&rec.data);
    }
    assert_eq!(image, bytes);
}
