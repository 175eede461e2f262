// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Shared logic for the TG165 alternate firmwares and host tool.
//!
//! This crate supports both `no_std` (embedded) and `std` (host) environments:
//! - Default: `no_std` mode for embedded targets
//! - `std` feature: host builds (tool, tests)
//! - `embedded` feature: STM32F103 board, flash and GPIO support
//! - `defmt` feature: `defmt::Format` derives and gate/overrun logging

#![cfg_attr(not(feature = "std"), no_std)]

pub mod command;
pub mod console;
pub mod dfu;
pub mod hal;
pub mod hex;
pub mod layout;
pub mod long_press;
pub mod ring;

#[cfg(feature = "embedded")]
pub mod board;
#[cfg(feature = "embedded")]
pub mod flash;

pub use command::{execute, Command, CommandOutcome};
pub use console::{Console, ConsoleError, Pump, WaitPolicy};
pub use dfu::{Completion, DfuEngine, DfuError, DfuState, DfuStatus, Reply, SetupPacket};
pub use hal::{FlashOps, GpioPorts, MemoryRead, Port, UnlockedFlash};
pub use hex::{HexError, HexRecord, RecordType};
pub use long_press::{LongPressMonitor, PressAction};
pub use ring::ConsoleRing;
