//! Timer (DIV, TIMA, TMA, TAC)
//!
//! DIV counts up at 16384 Hz and is cleared by any write. TIMA counts at the
//! rate selected in TAC and reloads from TMA when it overflows.

use crate::peripherals::TimerRegisters;

/// CPU clocks per DIV increment
const DIVIDER_PERIOD: u32 = 256;

/// Timer state
#[derive(Debug, Clone, Default)]
pub struct Timer {
    divider: u8,
    counter: u8,
    modulo: u8,
    control: u8,
    divider_clocks: u32,
    counter_clocks: u32,
}

impl Timer {
    /// Bits of TAC that exist in hardware
    pub const CONTROL_BITS: u8 = 0b0000_0111;
    const ENABLE: u8 = 0b0000_0100;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn enabled(&self) -> bool {
        self.control & Self::ENABLE != 0
    }

    /// CPU clocks per TIMA increment for the selected rate
    pub fn counter_period(&self) -> u32 {
        match self.control & 0x03 {
            1 => 16,
            2 => 64,
            3 => 256,
            _ => 1024,
        }
    }

    /// Advance by `clocks` CPU clocks. Returns `true` if TIMA overflowed.
    pub fn tick(&mut self, clocks: u32) -> bool {
        let total = self.divider_clocks as u64 + clocks as u64;
        let period = DIVIDER_PERIOD as u64;
        // DIV wraps, so only the increment count mod 256 matters
        self.divider = self.divider.wrapping_add((total / period) as u8);
        self.divider_clocks = (total % period) as u32;

        if !self.enabled() {
            return false;
        }

        let total = self.counter_clocks as u64 + clocks as u64;
        let period = self.counter_period() as u64;
        self.counter_clocks = (total % period) as u32;
        self.advance_counter(total / period)
    }

    /// Step TIMA `steps` times, reloading from TMA on each overflow
    fn advance_counter(&mut self, steps: u64) -> bool {
        let until_overflow = 0x100 - self.counter as u64;
        if steps < until_overflow {
            self.counter += steps as u8;
            return false;
        }
        let span = 0x100 - self.modulo as u64;
        self.counter = self.modulo + ((steps - until_overflow) % span) as u8;
        true
    }
}

impl TimerRegisters for Timer {
    fn divider(&self) -> u8 {
        self.divider
    }

    fn clear_divider(&mut self) {
        self.divider = 0;
        self.divider_clocks = 0;
    }

    fn counter(&self) -> u8 {
        self.counter
    }

    fn set_counter(&mut self, value: u8) {
        self.counter = value;
    }

    fn modulo(&self) -> u8 {
        self.modulo
    }

    fn set_modulo(&mut self, value: u8) {
        self.modulo = value;
    }

    fn control(&self) -> u8 {
        self.control
    }

    fn set_control(&mut self, value: u8) {
        self.control = value & Self::CONTROL_BITS;
    }
}
