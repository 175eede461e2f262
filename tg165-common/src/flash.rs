// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! STM32F1 flash controller access through its registers.
//!
//! The HAL's flash writer borrows the `Parts` that clock setup also needs, so
//! erase and program go straight to the FPEC. Sequence per RM0008 3.3.3:
//!   1. wait BSY clear
//!   2. set PER (or PG), write the address (or half-word)
//!   3. STRT for erase, wait BSY clear, clear EOP and the mode bit

use core::ptr::{read_volatile, write_volatile};

use crate::hal::{FlashOps, MemoryRead};

const FLASH_REGS: u32 = 0x4002_2000;
const FLASH_KEYR: *mut u32 = (FLASH_REGS + 0x04) as *mut u32;
const FLASH_SR: *mut u32 = (FLASH_REGS + 0x0C) as *mut u32;
const FLASH_CR: *mut u32 = (FLASH_REGS + 0x10) as *mut u32;
const FLASH_AR: *mut u32 = (FLASH_REGS + 0x14) as *mut u32;

const KEY1: u32 = 0x4567_0123;
const KEY2: u32 = 0xCDEF_89AB;

const SR_BSY: u32 = 1 << 0;
const SR_EOP: u32 = 1 << 5;
const CR_PG: u32 = 1 << 0;
const CR_PER: u32 = 1 << 1;
const CR_STRT: u32 = 1 << 6;
const CR_LOCK: u32 = 1 << 7;

/// Handle to the on-chip flash. Only one should exist.
pub struct StmFlash {
    _private: (),
}

impl StmFlash {
    /// # Safety
    /// Caller must ensure no other code drives the flash controller.
    pub unsafe fn new() -> Self {
        Self { _private: () }
    }

    fn wait_idle(&self) {
        while unsafe { read_volatile(FLASH_SR) } & SR_BSY != 0 {}
    }

    fn modify_cr(&mut self, set: u32, clear: u32) {
        unsafe {
            let cr = read_volatile(FLASH_CR);
            write_volatile(FLASH_CR, (cr & !clear) | set);
        }
    }

    fn finish(&mut self, mode: u32) {
        self.wait_idle();
        unsafe { write_volatile(FLASH_SR, SR_EOP) };
        self.modify_cr(0, mode);
    }
}

impl FlashOps for StmFlash {
    fn unlock(&mut self) {
        if unsafe { read_volatile(FLASH_CR) } & CR_LOCK != 0 {
            unsafe {
                write_volatile(FLASH_KEYR, KEY1);
                write_volatile(FLASH_KEYR, KEY2);
            }
        }
    }

    fn lock(&mut self) {
        self.wait_idle();
        self.modify_cr(CR_LOCK, 0);
    }

    fn erase_page(&mut self, addr: u32) {
        self.wait_idle();
        self.modify_cr(CR_PER, 0);
        unsafe { write_volatile(FLASH_AR, addr) };
        self.modify_cr(CR_STRT, 0);
        self.finish(CR_PER);
    }

    fn program_half_word(&mut self, addr: u32, value: u16) {
        self.wait_idle();
        self.modify_cr(CR_PG, 0);
        unsafe { write_volatile(addr as *mut u16, value) };
        self.finish(CR_PG);
    }
}

impl MemoryRead for StmFlash {
    fn read(&self, addr: u32, buf: &mut [u8]) {
        for (i, b) in buf.iter_mut().enumerate() {
            *b = unsafe { read_volatile((addr as usize + i) as *const u8) };
        }
    }
}
