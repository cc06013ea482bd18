//! Interrupt request and enable registers

use crate::peripherals::InterruptLines;

/// IF / IE register pair
#[derive(Debug, Clone, Copy, Default)]
pub struct InterruptController {
    raised: u8,
    enabled: u8,
}

impl InterruptController {
    /// Only the five request lines exist
    pub const LINES: u8 = 0b0001_1111;

    pub fn new() -> Self {
        Self::default()
    }

    /// Requests that are both raised and enabled
    pub fn pending(&self) -> u8 {
        self.raised & self.enabled & Self::LINES
    }

    /// Clear one request after the CPU has serviced it
    pub fn acknowledge(&mut self, mask: u8) {
        self.raised &= !mask;
    }
}

impl InterruptLines for InterruptController {
    fn raised_flags(&self) -> u8 {
        self.raised
    }

    fn raise_interrupt(&mut self, mask: u8) {
        self.raised |= mask & Self::LINES;
    }

    fn set_raised_flags(&mut self, value: u8) {
        self.raised = value & Self::LINES;
    }

    fn enabled_flags(&self) -> u8 {
        self.enabled
    }

    fn enable_interrupt(&mut self, mask: u8) {
        self.enabled |= mask;
    }

    fn set_enabled_flags(&mut self, value: u8) {
        self.enabled = value;
    }
}
