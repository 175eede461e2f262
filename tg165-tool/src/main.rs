// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Host tool for the FLIR TG165 alternate firmware.
//!
//! Usage:
//!   tg165-tool extract --port /dev/ttyACM0 bootloader.bin
//!   tg165-tool unpack Upgrade.bin vendor.bin
//!   tg165-tool stitch Upgrade.bin tg165-dfu.bin tg165-extractor.bin Upgrade-alt.bin

mod cli;
mod commands;
mod transport;
mod upgrade_file;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    cli::run(args)
}
