// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! USB DFU download engine with a deferred, boundary-gated flash writer.
//!
//! The engine is transport-agnostic: the USB class bridge hands it a decoded
//! [`SetupPacket`] plus the data stage, and calls
//! [`DfuEngine::status_read_complete`] once the GETSTATUS reply has been
//! queued. Flash is only touched from that completion, never from the
//! DNLOAD data phase.
//!
//! Command blocks follow the ST DfuSe convention: block 0 carries an opcode
//! and a little-endian address, data starts at block 2.

use heapless::Vec;

use crate::hal::{FlashOps, UnlockedFlash};
use crate::layout::{
    DFU_BUSY_POLL_TIMEOUT_MS, DFU_DETACH_TIMEOUT_MS, DFU_TRANSFER_SIZE, DFU_VERSION_BCD,
    PROTECTED_BOUNDARY,
};

// --- Class request codes (DFU 1.1, table 3.2) ---

pub const DFU_DETACH: u8 = 0x00;
pub const DFU_DNLOAD: u8 = 0x01;
pub const DFU_UPLOAD: u8 = 0x02;
pub const DFU_GETSTATUS: u8 = 0x03;
pub const DFU_CLRSTATUS: u8 = 0x04;
pub const DFU_GETSTATE: u8 = 0x05;
pub const DFU_ABORT: u8 = 0x06;

/// bmRequestType (direction bit masked) of a class request to an interface.
pub const DFU_REQUEST_TYPE: u8 = 0x21;

// --- DfuSe commands carried in block 0 ---

pub const CMD_SETADDR: u8 = 0x21;
pub const CMD_ERASE: u8 = 0x41;

/// First block number carrying image data.
pub const FIRST_DATA_BLOCK: u16 = 2;

pub const DFU_FUNCTIONAL_DESCRIPTOR_TYPE: u8 = 0x21;
pub const DFU_CAN_DNLOAD: u8 = 1 << 0;
pub const DFU_WILL_DETACH: u8 = 1 << 3;

pub const GETSTATUS_LEN: usize = 6;

/// DFU device states, encoded with their wire values.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DfuState {
    Idle = 2,
    DnloadSync = 3,
    DnBusy = 4,
    DnloadIdle = 5,
    ManifestSync = 6,
    Manifest = 7,
    Error = 10,
}

/// bStatus values reported by GETSTATUS.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DfuStatus {
    Ok = 0x00,
    ErrStalledPkt = 0x0F,
}

/// Reasons a control request is not accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DfuError {
    /// Not a class/interface request; someone else may handle it.
    NotClassRequest,
    /// Request code outside the DFU class set.
    UnknownRequest(u8),
    /// Valid DFU request this device does not implement (UPLOAD, DETACH).
    Unsupported(u8),
    /// DNLOAD payload larger than the pending block buffer.
    BlockTooLarge(usize),
    /// Response buffer cannot hold the reply.
    ResponseTooShort,
    /// Request sent with the wrong data-stage direction.
    WrongDirection(u8),
    /// DNLOAD while in ERROR; only CLRSTATUS or ABORT leave it.
    InErrorState,
}

/// The 8-byte SETUP stage of a control transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SetupPacket {
    pub request_type: u8,
    pub request: u8,
    pub value: u16,
    pub index: u16,
    pub length: u16,
}

impl SetupPacket {
    pub fn is_dfu_class_request(&self) -> bool {
        self.request_type & 0x7F == DFU_REQUEST_TYPE
    }

    /// Device-to-host data stage.
    pub fn is_in(&self) -> bool {
        self.request_type & 0x80 != 0
    }
}

/// A decoded DFU class request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DfuRequest<'a> {
    Detach,
    Dnload { block_num: u16, data: &'a [u8] },
    Upload,
    GetStatus,
    ClrStatus,
    GetState,
    Abort,
}

impl<'a> DfuRequest<'a> {
    pub fn parse(setup: &SetupPacket, data: &'a [u8]) -> Result<Self, DfuError> {
        if !setup.is_dfu_class_request() {
            return Err(DfuError::NotClassRequest);
        }

        let (request, device_to_host) = match setup.request {
            DFU_DETACH => (Self::Detach, false),
            DFU_DNLOAD => (
                Self::Dnload {
                    block_num: setup.value,
                    data,
                },
                false,
            ),
            DFU_UPLOAD => (Self::Upload, true),
            DFU_GETSTATUS => (Self::GetStatus, true),
            DFU_CLRSTATUS => (Self::ClrStatus, false),
            DFU_GETSTATE => (Self::GetState, true),
            DFU_ABORT => (Self::Abort, false),
            other => return Err(DfuError::UnknownRequest(other)),
        };

        if setup.is_in() != device_to_host {
            return Err(DfuError::WrongDirection(setup.request));
        }
        Ok(request)
    }
}

/// An accepted request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reply {
    /// Bytes of the response buffer to send in the data stage.
    pub len: usize,
    /// Call [`DfuEngine::status_read_complete`] once the data stage is done.
    pub notify_complete: bool,
}

impl Reply {
    const fn empty() -> Self {
        Self {
            len: 0,
            notify_complete: false,
        }
    }
}

/// What the caller must do after a status read completes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Completion {
    None,
    /// Manifestation reached: reset the system. Never returns on hardware.
    Reset,
}

/// Last accepted DNLOAD block, kept until the next status read.
#[derive(Debug)]
pub struct PendingBlock<const N: usize> {
    data: Vec<u8, N>,
    block_num: u16,
}

impl<const N: usize> PendingBlock<N> {
    pub const fn new() -> Self {
        Self {
            data: Vec::new(),
            block_num: 0,
        }
    }

    pub fn block_num(&self) -> u16 {
        self.block_num
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn store(&mut self, block_num: u16, data: &[u8]) -> Result<(), DfuError> {
        self.data.clear();
        self.data
            .extend_from_slice(data)
            .map_err(|_| DfuError::BlockTooLarge(data.len()))?;
        self.block_num = block_num;
        Ok(())
    }
}

impl<const N: usize> Default for PendingBlock<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// DFU download session. `N` is the transfer size: the pending buffer
/// capacity and the stride between data blocks.
#[derive(Debug)]
pub struct DfuEngine<const N: usize = DFU_TRANSFER_SIZE> {
    state: DfuState,
    status: DfuStatus,
    pending: PendingBlock<N>,
    target_address: u32,
}

impl<const N: usize> DfuEngine<N> {
    pub const fn new() -> Self {
        Self {
            state: DfuState::Idle,
            status: DfuStatus::Ok,
            pending: PendingBlock::new(),
            target_address: 0,
        }
    }

    pub fn state(&self) -> DfuState {
        self.state
    }

    pub fn status(&self) -> DfuStatus {
        self.status
    }

    pub fn target_address(&self) -> u32 {
        self.target_address
    }

    pub fn pending_block(&self) -> &PendingBlock<N> {
        &self.pending
    }

    /// DFU functional descriptor body (after bLength/bDescriptorType).
    pub fn functional_descriptor() -> [u8; 7] {
        let detach = DFU_DETACH_TIMEOUT_MS.to_le_bytes();
        let transfer = (N as u16).to_le_bytes();
        let version = DFU_VERSION_BCD.to_le_bytes();
        [
            DFU_CAN_DNLOAD | DFU_WILL_DETACH,
            detach[0],
            detach[1],
            transfer[0],
            transfer[1],
            version[0],
            version[1],
        ]
    }

    /// Handle one control request. `data` is the OUT data stage (empty for
    /// IN requests); the IN reply is written to the front of `response`.
    pub fn control_request(
        &mut self,
        setup: &SetupPacket,
        data: &[u8],
        response: &mut [u8],
    ) -> Result<Reply, DfuError> {
        match DfuRequest::parse(setup, data)? {
            DfuRequest::Dnload { block_num, data } => self.download(block_num, data),
            DfuRequest::ClrStatus => {
                if self.state == DfuState::Error {
                    self.state = DfuState::Idle;
                    self.status = DfuStatus::Ok;
                }
                Ok(Reply::empty())
            }
            DfuRequest::Abort => {
                self.state = DfuState::Idle;
                self.status = DfuStatus::Ok;
                Ok(Reply::empty())
            }
            DfuRequest::GetStatus => self.get_status(response),
            DfuRequest::GetState => {
                let slot = response.first_mut().ok_or(DfuError::ResponseTooShort)?;
                *slot = self.state as u8;
                Ok(Reply {
                    len: 1,
                    notify_complete: false,
                })
            }
            DfuRequest::Upload => Err(DfuError::Unsupported(DFU_UPLOAD)),
            DfuRequest::Detach => Err(DfuError::Unsupported(DFU_DETACH)),
        }
    }

    fn download(&mut self, block_num: u16, data: &[u8]) -> Result<Reply, DfuError> {
        if self.state == DfuState::Error {
            return Err(DfuError::InErrorState);
        }

        if data.is_empty() {
            self.state = DfuState::ManifestSync;
            return Ok(Reply::empty());
        }

        if let Err(e) = self.pending.store(block_num, data) {
            #[cfg(feature = "defmt")]
            defmt::warn!("DNLOAD: block {} of {} bytes rejected", block_num, data.len());
            self.state = DfuState::Error;
            self.status = DfuStatus::ErrStalledPkt;
            return Err(e);
        }

        self.state = DfuState::DnloadSync;
        Ok(Reply::empty())
    }

    fn get_status(&mut self, response: &mut [u8]) -> Result<Reply, DfuError> {
        if response.len() < GETSTATUS_LEN {
            return Err(DfuError::ResponseTooShort);
        }

        let poll_timeout = match self.state {
            DfuState::DnloadSync => {
                self.state = DfuState::DnBusy;
                DFU_BUSY_POLL_TIMEOUT_MS
            }
            DfuState::ManifestSync => {
                self.state = DfuState::Manifest;
                0
            }
            _ => 0,
        };

        let timeout = poll_timeout.to_le_bytes();
        response[..GETSTATUS_LEN].copy_from_slice(&[
            self.status as u8,
            timeout[0],
            timeout[1],
            timeout[2],
            self.state as u8,
            0, // iString
        ]);

        Ok(Reply {
            len: GETSTATUS_LEN,
            notify_complete: true,
        })
    }

    /// Finish a GETSTATUS exchange: run the deferred write or manifest.
    pub fn status_read_complete<F: FlashOps>(&mut self, flash: &mut F) -> Completion {
        match self.state {
            DfuState::DnBusy => {
                self.write_pending(flash);
                self.state = DfuState::DnloadIdle;
                Completion::None
            }
            DfuState::Manifest => Completion::Reset,
            _ => Completion::None,
        }
    }

    fn write_pending<F: FlashOps>(&mut self, flash: &mut F) {
        let mut flash = UnlockedFlash::new(flash);
        let block_num = self.pending.block_num;

        if block_num == 0 {
            self.run_command(&mut flash);
        } else if block_num >= FIRST_DATA_BLOCK {
            self.program_block(&mut flash, block_num);
        }
    }

    fn run_command<F: FlashOps>(&mut self, flash: &mut UnlockedFlash<'_, F>) {
        let block = self.pending.data();
        let (Some(&opcode), Some(arg)) = (block.first(), block.get(1..5)) else {
            return;
        };
        let addr = u32::from_le_bytes([arg[0], arg[1], arg[2], arg[3]]);

        match opcode {
            CMD_ERASE => {
                if addr >= PROTECTED_BOUNDARY {
                    flash.erase_page(addr);
                } else {
                    #[cfg(feature = "defmt")]
                    defmt::debug!("Erase of protected page 0x{:08x} dropped", addr);
                }
                // An erase also moves the address pointer.
                self.target_address = addr;
            }
            CMD_SETADDR => self.target_address = addr,
            _ => {}
        }
    }

    fn program_block<F: FlashOps>(&self, flash: &mut UnlockedFlash<'_, F>, block_num: u16) {
        let offset = u32::from(block_num - FIRST_DATA_BLOCK).checked_mul(N as u32);
        let Some(base) = offset.and_then(|o| self.target_address.checked_add(o)) else {
            return;
        };

        let data = self.pending.data();
        for i in (0..data.len()).step_by(2) {
            let Some(addr) = base.checked_add(i as u32) else {
                break;
            };
            if addr < PROTECTED_BOUNDARY {
                #[cfg(feature = "defmt")]
                defmt::debug!("Write to protected 0x{:08x} dropped", addr);
                continue;
            }
            let hi = data.get(i + 1).copied().unwrap_or(0xFF);
            flash.program_half_word(addr, u16::from_le_bytes([data[i], hi]));
        }
    }
}

impl<const N: usize> Default for DfuEngine<N> {
    fn default() -> Self {
        Self::new()
    }
}
