// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Console transport: a bounded ring drained by a USB pump.
//!
//! Producers never overwrite unread data. When the ring is short of room a
//! write services the USB stack through [`Pump`] until the host has taken
//! enough bytes, or until the [`WaitPolicy`] budget runs out.

use crate::hex::{hex_byte, hex_u16, hex_u32};
use crate::ring::ConsoleRing;

/// Replaces any single message that could never fit in the ring.
pub const OVERRUN_NOTICE: &[u8] = b"OVERRUN!\r\n";

/// Moves buffered bytes toward the host.
///
/// One call is one service pass: poll the device and hand the endpoint as
/// much of the ring as it accepts.
pub trait Pump {
    fn pump<const N: usize>(&mut self, ring: &mut ConsoleRing<N>);
}

/// How long a blocked write keeps pumping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WaitPolicy {
    Forever,
    /// Give up after this many pump passes.
    Bounded(u32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConsoleError {
    /// The host stopped draining within the wait budget.
    Stalled,
}

pub struct Console<P: Pump, const N: usize> {
    ring: ConsoleRing<N>,
    pump: P,
    policy: WaitPolicy,
}

impl<P: Pump, const N: usize> Console<P, N> {
    pub fn new(pump: P, policy: WaitPolicy) -> Self {
        Self {
            ring: ConsoleRing::new(),
            pump,
            policy,
        }
    }

    pub fn ring(&self) -> &ConsoleRing<N> {
        &self.ring
    }

    pub fn pump_mut(&mut self) -> &mut P {
        &mut self.pump
    }

    /// One service pass without waiting for anything.
    pub fn service(&mut self) {
        self.pump.pump(&mut self.ring);
    }

    /// Queue a whole message, pumping until it fits.
    pub fn write(&mut self, bytes: &[u8]) -> Result<(), ConsoleError> {
        let capacity = self.ring.capacity();
        let bytes = if bytes.len() > capacity {
            #[cfg(feature = "defmt")]
            defmt::warn!("console: {}-byte message overruns the ring", bytes.len());
            &OVERRUN_NOTICE[..OVERRUN_NOTICE.len().min(capacity)]
        } else {
            bytes
        };

        self.wait_until(|ring| ring.free() >= bytes.len())?;
        self.ring.write(bytes);
        Ok(())
    }

    pub fn puts(&mut self, s: &str) -> Result<(), ConsoleError> {
        self.write(s.as_bytes())
    }

    pub fn putc(&mut self, c: u8) -> Result<(), ConsoleError> {
        self.write(&[c])
    }

    pub fn put_hex_byte(&mut self, b: u8) -> Result<(), ConsoleError> {
        self.write(&hex_byte(b))
    }

    pub fn put_hex_u16(&mut self, v: u16) -> Result<(), ConsoleError> {
        self.write(&hex_u16(v))
    }

    pub fn put_hex_u32(&mut self, v: u32) -> Result<(), ConsoleError> {
        self.write(&hex_u32(v))
    }

    /// Pump until the host has taken everything queued.
    pub fn flush(&mut self) -> Result<(), ConsoleError> {
        self.wait_until(|ring| ring.is_empty())
    }

    fn wait_until(&mut self, ready: impl Fn(&ConsoleRing<N>) -> bool) -> Result<(), ConsoleError> {
        let mut passes = 0u32;
        while !ready(&self.ring) {
            if let WaitPolicy::Bounded(limit) = self.policy {
                if passes >= limit {
                    return Err(ConsoleError::Stalled);
                }
            }
            self.pump.pump(&mut self.ring);
            passes = passes.saturating_add(1);
        }
        Ok(())
    }
}
