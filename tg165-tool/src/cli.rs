// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Command-line interface definitions.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::commands;
use crate::transport::{Transport, DEFAULT_TIMEOUT_MS};

/// Command-line arguments.
#[derive(Parser)]
#[command(name = "tg165-tool")]
#[command(about = "Bootloader extraction and Upgrade.bin tooling for the FLIR TG165")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Serial connection to the extractor console.
#[derive(Args)]
pub struct PortArgs {
    /// Serial port (e.g., /dev/ttyACM0)
    #[arg(short, long)]
    pub port: String,

    /// Read timeout in milliseconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,
}

impl PortArgs {
    fn open(&self) -> Result<Transport> {
        Transport::with_timeout(&self.port, self.timeout_ms)
    }
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Dump the vendor bootloader from a device running the extractor
    Extract {
        #[command(flatten)]
        port: PortArgs,

        /// Output file
        #[arg(value_name = "OUT")]
        out: PathBuf,

        /// Keep the Intel-HEX text instead of converting to binary
        #[arg(long)]
        hex: bool,
    },

    /// Print the GPIO port snapshot from the extractor
    Gpio {
        #[command(flatten)]
        port: PortArgs,
    },

    /// Pack a raw binary into an Upgrade.bin
    Pack {
        #[arg(value_name = "IN")]
        input: PathBuf,
        #[arg(value_name = "OUT")]
        output: PathBuf,
    },

    /// Unpack an Upgrade.bin into a raw binary
    Unpack {
        #[arg(value_name = "IN")]
        input: PathBuf,
        #[arg(value_name = "OUT")]
        output: PathBuf,
    },

    /// Merge the boot selector and an alternate firmware into a vendor Upgrade.bin
    Stitch {
        /// Vendor Upgrade.bin
        #[arg(value_name = "UPGRADE")]
        upgrade: PathBuf,

        /// Boot selector binary (linked at 0x08050000)
        #[arg(value_name = "SELECTOR")]
        selector: PathBuf,

        /// Alternate firmware binary (linked at 0x08054000)
        #[arg(value_name = "ALT")]
        alt: PathBuf,

        /// Output Upgrade.bin
        #[arg(value_name = "OUT")]
        output: PathBuf,
    },

    /// Show size, chunk count and entry point of an Upgrade.bin
    Info {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

/// Execute the parsed CLI command.
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Extract { port, out, hex } => commands::extract(&mut port.open()?, &out, hex),
        Commands::Gpio { port } => commands::gpio(&mut port.open()?),
        Commands::Pack { input, output } => commands::pack(&input, &output),
        Commands::Unpack { input, output } => commands::unpack(&input, &output),
        Commands::Stitch {
            upgrade,
            selector,
            alt,
            output,
        } => commands::stitch(&upgrade, &selector, &alt, &output),
        Commands::Info { file } => commands::info(&file),
    }
}
