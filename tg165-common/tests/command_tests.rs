// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Tests for the extractor console commands.

mod support;

use support::{drain_all, FakeGpio, FakeMemory, HostPump};
use tg165_common::command::{execute, Command, CommandOutcome, HELP_TEXT};
use tg165_common::console::{Console, WaitPolicy};
use tg165_common::hex::EOF_LINE;

fn console() -> Console<HostPump, 4096> {
    Console::new(HostPump::new(64), WaitPolicy::Bounded(100_000))
}

fn run(bytes: &[u8], gpio: &FakeGpio) -> (String, Vec<CommandOutcome>) {
    let mut console = console();
    let mem = FakeMemory::erased();
    let outcomes = bytes
        .iter()
        .map(|&b| execute(b, &mut console, &mem, gpio).unwrap())
        .collect();
    (drain_all(&mut console), outcomes)
}

#[test]
fn test_command_decoding() {
    assert_eq!(Command::from_byte(b'd'), Command::Dump);
    assert_eq!(Command::from_byte(b'D'), Command::Dump);
    assert_eq!(Command::from_byte(b'r'), Command::Reset);
    assert_eq!(Command::from_byte(b'G'), Command::Gpio);
    assert_eq!(Command::from_byte(b'h'), Command::Help);
    assert_eq!(Command::from_byte(b'\r'), Command::Ignore);
    assert_eq!(Command::from_byte(b'\n'), Command::Unknown(b'\n'));
    assert_eq!(Command::from_byte(b'x'), Command::Unknown(b'x'));
}

#[test]
fn test_gpio_snapshot_format() {
    let gpio = FakeGpio([0x0000_1234, 0xDEAD_BEEF, 0, 0xFFFF_FFFF, 0x00A5_5A00]);
    let (text, outcomes) = run(b"g", &gpio);
    assert_eq!(
        text,
        "Port A: 00001234 B: DEADBEEF C: 00000000 D: FFFFFFFF E: 00A55A00 \r\n"
    );
    assert_eq!(outcomes, vec![CommandOutcome::Continue]);
}

#[test]
fn test_help_text() {
    let (text, _) = run(b"H", &FakeGpio([0; 5]));
    assert_eq!(text, HELP_TEXT.concat());
    assert!(text.starts_with("d: dump bootloader\r\n"));
    assert!(text.ends_with("h: this help message\r\n\r\n"));
}

#[test]
fn test_unknown_command_notice() {
    let (text, _) = run(b"x\n", &FakeGpio([0; 5]));
    assert_eq!(text, "Unknown command (0x78)!\r\nUnknown command (0x0A)!\r\n");
}

#[test]
fn test_carriage_return_silent() {
    let (text, outcomes) = run(b"\r\r", &FakeGpio([0; 5]));
    assert!(text.is_empty());
    assert_eq!(outcomes, vec![CommandOutcome::Continue; 2]);
}

#[test]
fn test_reset_requests_reset_without_output() {
    let (text, outcomes) = run(b"R", &FakeGpio([0; 5]));
    assert!(text.is_empty());
    assert_eq!(outcomes, vec![CommandOutcome::Reset]);
}

#[test]
fn test_dump_covers_bootloader_region() {
    let (text, _) = run(b"d", &FakeGpio([0; 5]));
    let lines: Vec<&str> = text.split_inclusive("\r\n").collect();

    // 64K in 16-byte records, then EOF.
    assert_eq!(lines.len(), 0x1_0000 / 16 + 1);
    assert!(lines[0].starts_with(":10000000"));
    assert!(lines[0x1_0000 / 16 - 1].starts_with(":10FFF000"));
    assert_eq!(lines.last().unwrap().as_bytes(), EOF_LINE);
}

#[test]
fn test_packet_bytes_dispatched_in_order() {
    let (text, outcomes) = run(b"gq\r", &FakeGpio([1, 2, 3, 4, 5]));
    assert_eq!(
        text,
        "Port A: 00000001 B: 00000002 C: 00000003 D: 00000004 E: 00000005 \r\n\
         Unknown command (0x71)!\r\n"
    );
    assert_eq!(outcomes.len(), 3);
}
