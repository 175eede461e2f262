// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Hardware collaborator traits.
//!
//! The protocol engines only talk to the chip through these traits. The
//! STM32F103 implementations live in [`crate::board`] and [`crate::flash`]
//! (`embedded` feature); tests substitute recording fakes.

/// Flash erase/program primitives.
pub trait FlashOps {
    fn unlock(&mut self);
    fn lock(&mut self);
    /// Erase the page containing `addr`.
    fn erase_page(&mut self, addr: u32);
    fn program_half_word(&mut self, addr: u32, value: u16);
}

/// Read access to memory-mapped flash.
pub trait MemoryRead {
    fn read(&self, addr: u32, buf: &mut [u8]);
}

/// GPIO ports visible to the console `g` command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Port {
    A,
    B,
    C,
    D,
    E,
}

impl Port {
    pub const ALL: [Port; 5] = [Port::A, Port::B, Port::C, Port::D, Port::E];

    pub fn letter(self) -> u8 {
        b'A' + self as u8
    }
}

/// Port-wide input register reads.
pub trait GpioPorts {
    fn read_port(&self, port: Port) -> u32;
}

/// Flash unlocked for the lifetime of the guard; relocked on drop.
pub struct UnlockedFlash<'a, F: FlashOps> {
    flash: &'a mut F,
}

impl<'a, F: FlashOps> UnlockedFlash<'a, F> {
    pub fn new(flash: &'a mut F) -> Self {
        flash.unlock();
        Self { flash }
    }

    pub fn erase_page(&mut self, addr: u32) {
        self.flash.erase_page(addr);
    }

    pub fn program_half_word(&mut self, addr: u32, value: u16) {
        self.flash.program_half_word(addr, value);
    }
}

impl<F: FlashOps> Drop for UnlockedFlash<'_, F> {
    fn drop(&mut self) {
        self.flash.lock();
    }
}
