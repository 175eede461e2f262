// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! `usb-device` class bridging EP0 control transfers into the DFU engine.

use tg165_common::dfu::{
    Completion, DfuEngine, DfuError, SetupPacket, DFU_FUNCTIONAL_DESCRIPTOR_TYPE, GETSTATUS_LEN,
};
use tg165_common::flash::StmFlash;
use tg165_common::layout::DFUSE_MEMORY_LAYOUT;
use usb_device::class_prelude::*;
use usb_device::control::Request;

/// Largest block the EP0 buffer (`control-buffer-256`) can carry.
pub const TRANSFER_SIZE: usize = 256;

const USB_CLASS_APPLICATION_SPECIFIC: u8 = 0xFE;
const USB_SUBCLASS_DFU: u8 = 0x01;
const USB_PROTOCOL_DFU_MODE: u8 = 0x02;

pub struct DfuClass {
    iface: InterfaceNumber,
    layout_string: StringIndex,
    engine: DfuEngine<TRANSFER_SIZE>,
    flash: StmFlash,
    status_sent: bool,
}

impl DfuClass {
    pub fn new<B: UsbBus>(alloc: &UsbBusAllocator<B>, flash: StmFlash) -> Self {
        Self {
            iface: alloc.interface(),
            layout_string: alloc.string(),
            engine: DfuEngine::new(),
            flash,
            status_sent: false,
        }
    }

    /// Run the write or manifest deferred by the last GETSTATUS. Call after
    /// every device poll.
    pub fn service(&mut self) -> Completion {
        if !self.status_sent {
            return Completion::None;
        }
        self.status_sent = false;
        self.engine.status_read_complete(&mut self.flash)
    }

    /// Decode the request if it is addressed to this interface.
    fn setup_for_us(&self, req: &Request) -> Option<SetupPacket> {
        let setup = SetupPacket {
            request_type: req.direction as u8 | (req.request_type as u8) << 5 | req.recipient as u8,
            request: req.request,
            value: req.value,
            index: req.index,
            length: req.length,
        };
        (setup.is_dfu_class_request() && req.index == u8::from(self.iface) as u16).then_some(setup)
    }
}

fn log_rejection(e: DfuError) {
    defmt::warn!("DFU request rejected: {}", e);
}

impl<B: UsbBus> UsbClass<B> for DfuClass {
    fn get_configuration_descriptors(&self, writer: &mut DescriptorWriter) -> usb_device::Result<()> {
        writer.interface_alt(
            self.iface,
            0,
            USB_CLASS_APPLICATION_SPECIFIC,
            USB_SUBCLASS_DFU,
            USB_PROTOCOL_DFU_MODE,
            Some(self.layout_string),
        )?;
        writer.write(
            DFU_FUNCTIONAL_DESCRIPTOR_TYPE,
            &DfuEngine::<TRANSFER_SIZE>::functional_descriptor(),
        )
    }

    fn get_string(&self, index: StringIndex, _lang_id: u16) -> Option<&str> {
        (index == self.layout_string).then_some(DFUSE_MEMORY_LAYOUT)
    }

    fn reset(&mut self) {
        self.status_sent = false;
    }

    fn control_out(&mut self, xfer: ControlOut<B>) {
        let req = *xfer.request();
        let Some(setup) = self.setup_for_us(&req) else {
            return;
        };

        let mut resp = [0u8; GETSTATUS_LEN];
        match self.engine.control_request(&setup, xfer.data(), &mut resp) {
            Ok(_) => {
                xfer.accept().ok();
            }
            Err(e) => {
                log_rejection(e);
                xfer.reject().ok();
            }
        }
    }

    fn control_in(&mut self, xfer: ControlIn<B>) {
        let req = *xfer.request();
        let Some(setup) = self.setup_for_us(&req) else {
            return;
        };

        let mut resp = [0u8; GETSTATUS_LEN];
        match self.engine.control_request(&setup, &[], &mut resp) {
            Ok(reply) => {
                if xfer.accept_with(&resp[..reply.len]).is_ok() {
                    self.status_sent = reply.notify_complete;
                }
            }
            Err(e) => {
                log_rejection(e);
                xfer.reject().ok();
            }
        }
    }
}
