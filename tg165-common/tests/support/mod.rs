// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Fake collaborators shared by the integration tests.

#![allow(dead_code)]

use tg165_common::console::Pump;
use tg165_common::hal::{FlashOps, GpioPorts, MemoryRead, Port};
use tg165_common::ring::ConsoleRing;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlashOp {
    Unlock,
    Lock,
    Erase(u32),
    Program(u32, u16),
}

/// Records every flash call in order.
#[derive(Default)]
pub struct RecordingFlash {
    pub ops: Vec<FlashOp>,
}

impl RecordingFlash {
    pub fn programs(&self) -> Vec<(u32, u16)> {
        self.ops
            .iter()
            .filter_map(|op| match *op {
                FlashOp::Program(a, v) => Some((a, v)),
                _ => None,
            })
            .collect()
    }

    pub fn erases(&self) -> Vec<u32> {
        self.ops
            .iter()
            .filter_map(|op| match *op {
                FlashOp::Erase(a) => Some(a),
                _ => None,
            })
            .collect()
    }

    /// Every address touched by an erase or program.
    pub fn touched(&self) -> Vec<u32> {
        self.ops
            .iter()
            .filter_map(|op| match *op {
                FlashOp::Erase(a) | FlashOp::Program(a, _) => Some(a),
                _ => None,
            })
            .collect()
    }
}

impl FlashOps for RecordingFlash {
    fn unlock(&mut self) {
        self.ops.push(FlashOp::Unlock);
    }

    fn lock(&mut self) {
        self.ops.push(FlashOp::Lock);
    }

    fn erase_page(&mut self, addr: u32) {
        self.ops.push(FlashOp::Erase(addr));
    }

    fn program_half_word(&mut self, addr: u32, value: u16) {
        self.ops.push(FlashOp::Program(addr, value));
    }
}

/// Flash image starting at `base`; reads outside it return 0xFF.
pub struct FakeMemory {
    pub base: u32,
    pub bytes: Vec<u8>,
}

impl FakeMemory {
    pub fn erased() -> Self {
        Self {
            base: 0,
            bytes: Vec::new(),
        }
    }
}

impl MemoryRead for FakeMemory {
    fn read(&self, addr: u32, buf: &mut [u8]) {
        for (i, b) in buf.iter_mut().enumerate() {
            let a = addr as u64 + i as u64;
            *b = a
                .checked_sub(self.base as u64)
                .and_then(|off| self.bytes.get(off as usize))
                .copied()
                .unwrap_or(0xFF);
        }
    }
}

pub struct FakeGpio(pub [u32; 5]);

impl GpioPorts for FakeGpio {
    fn read_port(&self, port: Port) -> u32 {
        self.0[port as usize]
    }
}

/// Simulated host: takes up to `per_pass` bytes per pump pass unless stalled.
pub struct HostPump {
    pub received: Vec<u8>,
    pub per_pass: usize,
    pub stalled: bool,
    pub passes: u32,
}

impl HostPump {
    pub fn new(per_pass: usize) -> Self {
        Self {
            received: Vec::new(),
            per_pass,
            stalled: false,
            passes: 0,
        }
    }

    pub fn stalled() -> Self {
        Self {
            stalled: true,
            ..Self::new(64)
        }
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.received).into_owned()
    }
}

impl Pump for HostPump {
    fn pump<const N: usize>(&mut self, ring: &mut ConsoleRing<N>) {
        self.passes += 1;
        if self.stalled {
            return;
        }
        let mut packet = vec![0u8; self.per_pass];
        let n = ring.drain(&mut packet);
        self.received.extend_from_slice(&packet[..n]);
    }
}

/// Drain whatever is still queued in the console ring into the host.
pub fn drain_all<const N: usize>(
    console: &mut tg165_common::console::Console<HostPump, N>,
) -> String {
    console.flush().expect("host drains");
    console.pump_mut().text()
}
