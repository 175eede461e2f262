// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Power-button long-press detection, sampled once per main-loop pass.

use embedded_hal::digital::InputPin;

use crate::layout::LONG_PRESS_DURATION;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PressAction {
    None,
    Reset,
}

pub struct LongPressMonitor {
    count: u32,
    threshold: u32,
}

impl LongPressMonitor {
    pub const fn new() -> Self {
        Self::with_threshold(LONG_PRESS_DURATION)
    }

    pub const fn with_threshold(threshold: u32) -> Self {
        Self {
            count: 0,
            threshold,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Feed one sample. Reset is requested once the count exceeds the
    /// threshold; a release clears it.
    pub fn sample(&mut self, pressed: bool) -> PressAction {
        if !pressed {
            self.count = 0;
            return PressAction::None;
        }

        self.count = self.count.saturating_add(1);
        if self.count > self.threshold {
            PressAction::Reset
        } else {
            PressAction::None
        }
    }

    /// Sample an active-low button. A read error counts as released.
    pub fn poll<P: InputPin>(&mut self, button: &mut P) -> PressAction {
        let pressed = button.is_low().unwrap_or(false);
        self.sample(pressed)
    }
}

impl Default for LongPressMonitor {
    fn default() -> Self {
        Self::new()
    }
}
