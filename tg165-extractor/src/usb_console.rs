// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! CDC-ACM endpoint pair driving the console ring.

use stm32f1xx_hal::usb::UsbBusType;
use tg165_common::layout::*;
use tg165_common::{ConsoleRing, Pump};
use usb_device::class_prelude::UsbBusAllocator;
use usb_device::prelude::*;
use usbd_serial::{CdcAcmClass, USB_CLASS_CDC};

pub struct CdcPump {
    class: CdcAcmClass<'static, UsbBusType>,
    usb_dev: UsbDevice<'static, UsbBusType>,
}

impl CdcPump {
    pub fn new(usb_bus: &'static UsbBusAllocator<UsbBusType>) -> Self {
        let class = CdcAcmClass::new(usb_bus, CONSOLE_PACKET_SIZE as u16);
        let usb_dev = UsbDeviceBuilder::new(usb_bus, UsbVidPid(USB_VID, USB_PID_CDC))
            .manufacturer(USB_MANUFACTURER_CDC)
            .product(USB_PRODUCT_CDC)
            .serial_number(USB_SERIAL)
            .device_release(USB_DEVICE_RELEASE)
            .device_class(USB_CLASS_CDC)
            .max_packet_size_0(64)
            .build();

        Self { class, usb_dev }
    }

    /// Take one bulk OUT packet, if the host sent one. Returns its length.
    pub fn read(&mut self, packet: &mut [u8; CONSOLE_PACKET_SIZE]) -> usize {
        self.class.read_packet(packet).unwrap_or(0)
    }
}

impl Pump for CdcPump {
    fn pump<const N: usize>(&mut self, ring: &mut ConsoleRing<N>) {
        self.usb_dev.poll(&mut [&mut self.class]);

        if self.usb_dev.state() != UsbDeviceState::Configured || ring.is_empty() {
            return;
        }

        let mut packet = [0u8; CONSOLE_PACKET_SIZE];
        let len = ring.peek(&mut packet);
        match self.class.write_packet(&packet[..len]) {
            Ok(sent) => ring.discard(sent),
            Err(UsbError::WouldBlock) => {}
            Err(_) => defmt::warn!("console: IN write failed, retrying"),
        }
    }
}
