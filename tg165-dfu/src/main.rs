// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! TG165 DFU personality: flashes images into the unprotected region.

#![no_std]
#![no_main]

mod usb_dfu;

use defmt_rtt as _;
use panic_probe as _;

defmt::timestamp!("{=u64:us}", { 0 });

use cortex_m_rt::entry;
use tg165_common::board::{self, SYSCLK_HZ};
use tg165_common::layout::*;
use tg165_common::{Completion, LongPressMonitor, PressAction};
use usb_device::prelude::*;

use usb_dfu::DfuClass;

/// Extra device polls after manifestation so the final status handshake
/// completes before reset.
const MANIFEST_DRAIN_POLLS: u32 = 10_000;

#[entry]
fn main() -> ! {
    defmt::println!("DFU init");

    let mut b = unsafe { board::init_board() };
    let usb_bus = board::store_usb_bus(b.usb);

    let mut dfu = DfuClass::new(usb_bus, b.flash);
    let mut usb_dev = UsbDeviceBuilder::new(usb_bus, UsbVidPid(USB_VID, USB_PID_DFU))
        .manufacturer(USB_MANUFACTURER_DFU)
        .product(USB_PRODUCT_DFU)
        .serial_number(USB_SERIAL)
        .device_release(USB_DEVICE_RELEASE)
        .max_packet_size_0(64)
        .build();

    b.usb_pullup.connect();
    defmt::println!("USB DFU ready, transfer size {}", usb_dfu::TRANSFER_SIZE);

    let mut monitor = LongPressMonitor::new();

    loop {
        if monitor.poll(&mut b.button) == PressAction::Reset {
            defmt::println!("Long press, resetting");
            board::system_reset(0);
        }

        usb_dev.poll(&mut [&mut dfu]);

        if dfu.service() == Completion::Reset {
            defmt::println!("Manifestation complete, resetting");
            for _ in 0..MANIFEST_DRAIN_POLLS {
                usb_dev.poll(&mut [&mut dfu]);
            }
            b.usb_pullup.disconnect();
            // ~10ms for the host to see the detach
            board::system_reset(SYSCLK_HZ / 100);
        }
    }
}
