// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Serial link to the extractor console.

use anyhow::{bail, Context, Result};
use serialport::SerialPort;
use std::io::{Read, Write};
use std::time::Duration;

/// Default timeout for serial operations in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 2000;

/// Longest line the console emits (an Intel-HEX data record).
const MAX_LINE_LEN: usize = 128;

pub struct Transport {
    port: Box<dyn SerialPort>,
}

impl Transport {
    pub fn with_timeout(port_name: &str, timeout_ms: u64) -> Result<Self> {
        let port = serialport::new(port_name, 115200)
            .timeout(Duration::from_millis(timeout_ms))
            .open()
            .with_context(|| format!("Failed to open serial port {}", port_name))?;

        Ok(Self { port })
    }

    /// Discard anything the device sent before we asked.
    pub fn drain_rx(&mut self) {
        let mut buf = [0u8; 64];
        let old_timeout = self.port.timeout();
        let _ = self.port.set_timeout(Duration::from_millis(10));
        while self.port.read(&mut buf).unwrap_or(0) > 0 {}
        let _ = self.port.set_timeout(old_timeout);
    }

    /// Send a single-byte console command.
    pub fn send_command(&mut self, cmd: u8) -> Result<()> {
        self.port
            .write_all(&[cmd])
            .context("Failed to write to serial port")?;
        self.port.flush()?;
        Ok(())
    }

    /// Read one line, including its CRLF.
    pub fn read_line(&mut self) -> Result<String> {
        let mut line = Vec::with_capacity(MAX_LINE_LEN);
        let mut byte = [0u8; 1];

        loop {
            match self.port.read(&mut byte) {
                Ok(1) => {
                    line.push(byte[0]);
                    if byte[0] == b'\n' {
                        break;
                    }
                    if line.len() > MAX_LINE_LEN {
                        bail!("Line exceeds {} bytes", MAX_LINE_LEN);
                    }
                }
                Ok(_) => continue,
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
                    bail!("Timeout waiting for console output");
                }
                Err(e) => bail!("Serial read error: {}", e),
            }
        }

        String::from_utf8(line).context("Console sent non-ASCII data")
    }
}
