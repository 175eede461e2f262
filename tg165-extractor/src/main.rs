// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! TG165 extractor personality: CDC-ACM console for flash dumps and GPIO
//! inspection.

#![no_std]
#![no_main]

mod usb_console;

use defmt_rtt as _;
use panic_probe as _;

defmt::timestamp!("{=u64:us}", { 0 });

use cortex_m_rt::entry;
use tg165_common::board;
use tg165_common::command::{self, CommandOutcome};
use tg165_common::layout::{CONSOLE_BUFFER_SIZE, CONSOLE_PACKET_SIZE};
use tg165_common::{Console, LongPressMonitor, PressAction, WaitPolicy};

use usb_console::CdcPump;

#[entry]
fn main() -> ! {
    defmt::println!("Extractor init");

    let mut b = unsafe { board::init_board() };
    let usb_bus = board::store_usb_bus(b.usb);

    let mut console: Console<CdcPump, CONSOLE_BUFFER_SIZE> =
        Console::new(CdcPump::new(usb_bus), WaitPolicy::Forever);

    b.usb_pullup.connect();
    defmt::println!("USB console ready");

    let mut monitor = LongPressMonitor::new();
    let mut packet = [0u8; CONSOLE_PACKET_SIZE];

    loop {
        if monitor.poll(&mut b.button) == PressAction::Reset {
            defmt::println!("Long press, resetting");
            board::system_reset(0);
        }

        console.service();

        // Commands run outside the device poll, so their blocking writes may
        // pump it.
        let len = console.pump_mut().read(&mut packet);
        for &byte in &packet[..len] {
            match command::execute(byte, &mut console, &b.flash, &b.gpio) {
                Ok(CommandOutcome::Continue) => {}
                Ok(CommandOutcome::Reset) => {
                    defmt::println!("Reset requested from console");
                    board::system_reset(0);
                }
                Err(e) => defmt::warn!("console: command 0x{:02x} aborted: {}", byte, e),
            }
        }
    }
}
