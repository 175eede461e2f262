// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Byte FIFO between console producers and the USB IN endpoint.

use heapless::Deque;

/// Fixed-capacity byte ring. Writers never block; a write that does not fit
/// is refused whole.
pub struct ConsoleRing<const N: usize> {
    buf: Deque<u8, N>,
}

impl<const N: usize> ConsoleRing<N> {
    pub const fn new() -> Self {
        Self { buf: Deque::new() }
    }

    pub fn capacity(&self) -> usize {
        N
    }

    pub fn used(&self) -> usize {
        self.buf.len()
    }

    pub fn free(&self) -> usize {
        N - self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Append all of `bytes`, or nothing. Returns whether it was written.
    pub fn write(&mut self, bytes: &[u8]) -> bool {
        if bytes.len() > self.free() {
            return false;
        }
        for &b in bytes {
            // Room was checked above.
            let _ = self.buf.push_back(b);
        }
        true
    }

    /// Move up to `out.len()` bytes out of the ring. Returns the count.
    pub fn drain(&mut self, out: &mut [u8]) -> usize {
        let n = self.peek(out);
        self.discard(n);
        n
    }

    /// Copy up to `out.len()` of the oldest bytes without consuming them.
    pub fn peek(&self, out: &mut [u8]) -> usize {
        let mut n = 0;
        for (slot, &b) in out.iter_mut().zip(self.buf.iter()) {
            *slot = b;
            n += 1;
        }
        n
    }

    /// Drop the `n` oldest bytes (fewer if the ring holds less).
    pub fn discard(&mut self, n: usize) {
        for _ in 0..n {
            if self.buf.pop_front().is_none() {
                break;
            }
        }
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

impl<const N: usize> Default for ConsoleRing<N> {
    fn default() -> Self {
        Self::new()
    }
}
