// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Single-byte console commands of the extractor.

use crate::console::{Console, ConsoleError, Pump};
use crate::hal::{GpioPorts, MemoryRead, Port};
use crate::hex::{dump_flash, hex_byte};
use crate::layout::{DUMP_END, DUMP_START};

pub const HELP_TEXT: &[&str] = &[
    "d: dump bootloader\r\n",
    "r: reset device\r\n",
    "g: read all GPIO\r\n",
    "h: this help message\r\n",
    "\r\n",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    Dump,
    Reset,
    Gpio,
    Help,
    /// Line terminator, no output.
    Ignore,
    Unknown(u8),
}

impl Command {
    pub fn from_byte(b: u8) -> Self {
        match b {
            b'd' | b'D' => Self::Dump,
            b'r' | b'R' => Self::Reset,
            b'g' | b'G' => Self::Gpio,
            b'h' | b'H' => Self::Help,
            b'\r' => Self::Ignore,
            other => Self::Unknown(other),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandOutcome {
    Continue,
    /// Caller must reset the system.
    Reset,
}

/// Run the command for one received byte. Output is complete (queued in the
/// console) when this returns.
pub fn execute<P, M, G, const N: usize>(
    byte: u8,
    console: &mut Console<P, N>,
    mem: &M,
    gpio: &G,
) -> Result<CommandOutcome, ConsoleError>
where
    P: Pump,
    M: MemoryRead,
    G: GpioPorts,
{
    match Command::from_byte(byte) {
        Command::Dump => dump_flash(mem, console, DUMP_START, DUMP_END)?,
        Command::Reset => return Ok(CommandOutcome::Reset),
        Command::Gpio => print_gpio(console, gpio)?,
        Command::Help => {
            for line in HELP_TEXT {
                console.puts(line)?;
            }
        }
        Command::Ignore => {}
        Command::Unknown(b) => {
            console.puts("Unknown command (0x")?;
            console.write(&hex_byte(b))?;
            console.puts(")!\r\n")?;
        }
    }
    Ok(CommandOutcome::Continue)
}

/// `Port A: XXXXXXXX B: ... E: XXXXXXXX \r\n`
fn print_gpio<P: Pump, G: GpioPorts, const N: usize>(
    console: &mut Console<P, N>,
    gpio: &G,
) -> Result<(), ConsoleError> {
    console.puts("Port")?;
    for port in Port::ALL {
        console.write(&[b' ', port.letter(), b':', b' '])?;
        console.put_hex_u32(gpio.read_port(port))?;
    }
    console.puts(" \r\n")
}
