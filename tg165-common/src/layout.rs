// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Flash map, USB identities and sizing constants shared by both firmwares
//! and the host tool.

// --- Flash layout constants (STM32F103VE, 512KB) ---

pub const FLASH_BASE: u32 = 0x0800_0000;
pub const FLASH_SIZE: u32 = 512 * 1024;
pub const FLASH_PAGE_SIZE: u32 = 2048;

/// No erase or program may target an address below this boundary.
/// Must match the read-only part of [`DFUSE_MEMORY_LAYOUT`].
pub const PROTECTED_BOUNDARY: u32 = 0x0805_3000;

/// Flash window swept by the extractor's `d` command (the vendor bootloader).
pub const DUMP_START: u32 = 0x0800_0000;
pub const DUMP_END: u32 = 0x0801_0000;

/// Load address of the vendor application inside `Upgrade.bin` images.
pub const VENDOR_FW_ADDR: u32 = 0x0801_0000;
/// Boot selector slot; the DFU personality is linked here.
pub const SELECTOR_ADDR: u32 = 0x0805_0000;
/// Alternate firmware slot (inside the writable region).
pub const ALT_FW_ADDR: u32 = 0x0805_4000;

/// DfuSe memory descriptor: 166 read-only 2K pages, then 90 writable ones.
pub const DFUSE_MEMORY_LAYOUT: &str = "@Internal Flash   /0x08000000/166*002Ka,90*002Kg";

// --- DFU ---

/// Advertised wTransferSize and pending block capacity.
pub const DFU_TRANSFER_SIZE: usize = 1024;
/// Poll timeout reported while a deferred write is outstanding.
pub const DFU_BUSY_POLL_TIMEOUT_MS: u32 = 100;
pub const DFU_DETACH_TIMEOUT_MS: u16 = 255;
pub const DFU_VERSION_BCD: u16 = 0x011A;

// --- USB identities ---

pub const USB_VID: u16 = 0x0483;
pub const USB_PID_DFU: u16 = 0xDF11;
pub const USB_PID_CDC: u16 = 0x5740;
pub const USB_DEVICE_RELEASE: u16 = 0x0200;

pub const USB_MANUFACTURER_DFU: &str = "Not Exactly FLIR";
pub const USB_PRODUCT_DFU: &str = "DFU Bootloader";
pub const USB_MANUFACTURER_CDC: &str = "Not Exactly FLIR (TM)";
pub const USB_PRODUCT_CDC: &str = "Bootloader Extractor";
pub const USB_SERIAL: &str = "ABCD";

// --- Console ---

/// Bulk endpoint packet size for the CDC-ACM data interface.
pub const CONSOLE_PACKET_SIZE: usize = 64;
pub const CONSOLE_BUFFER_SIZE: usize = 4096;

// --- Power button ---

/// Consecutive pressed polls before a long press resets the device.
pub const LONG_PRESS_DURATION: u32 = 0x10000;
