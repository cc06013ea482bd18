//! Joypad matrix (P1/JOYP)
//!
//! Eight buttons in two rows of four. Software selects a row with bits 4-5
//! (active low) and reads the row back in bits 0-3, where 0 means pressed.

use crate::peripherals::JoypadPort;

/// Joypad buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Right,
    Left,
    Up,
    Down,
    A,
    B,
    Select,
    Start,
}

impl Button {
    /// (selects the action row, bit within the row)
    fn position(self) -> (bool, u8) {
        match self {
            Button::Right => (false, 0x01),
            Button::Left => (false, 0x02),
            Button::Up => (false, 0x04),
            Button::Down => (false, 0x08),
            Button::A => (true, 0x01),
            Button::B => (true, 0x02),
            Button::Select => (true, 0x04),
            Button::Start => (true, 0x08),
        }
    }
}

const SELECT_DIRECTIONS: u8 = 0x10;
const SELECT_ACTIONS: u8 = 0x20;

/// Joypad state
#[derive(Debug, Clone, Copy)]
pub struct Joypad {
    /// Pressed direction buttons, 1 = pressed
    directions: u8,
    /// Pressed action buttons, 1 = pressed
    actions: u8,
    /// Row select bits as last written
    select: u8,
}

impl Joypad {
    pub fn new() -> Self {
        Self {
            directions: 0,
            actions: 0,
            select: SELECT_DIRECTIONS | SELECT_ACTIONS,
        }
    }

    /// Press a button. Returns `true` if the press is visible in the
    /// currently selected row (the joypad interrupt condition).
    pub fn press(&mut self, button: Button) -> bool {
        let (action, bit) = button.position();
        let before = self.keys_pressed() & 0x0F;
        if action {
            self.actions |= bit;
        } else {
            self.directions |= bit;
        }
        (self.keys_pressed() & 0x0F) != before
    }

    pub fn release(&mut self, button: Button) {
        let (action, bit) = button.position();
        if action {
            self.actions &= !bit;
        } else {
            self.directions &= !bit;
        }
    }
}

impl Default for Joypad {
    fn default() -> Self {
        Self::new()
    }
}

impl JoypadPort for Joypad {
    fn keys_pressed(&self) -> u8 {
        let mut pressed = 0;
        if self.select & SELECT_DIRECTIONS == 0 {
            pressed |= self.directions;
        }
        if self.select & SELECT_ACTIONS == 0 {
            pressed |= self.actions;
        }
        0xC0 | self.select | (!pressed & 0x0F)
    }

    fn set_mode(&mut self, value: u8) {
        self.select = value & (SELECT_DIRECTIONS | SELECT_ACTIONS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_selected_reads_released() {
        let mut pad = Joypad::new();
        pad.press(Button::A);
        assert_eq!(pad.keys_pressed(), 0xFF);
    }

    #[test]
    fn test_row_selection() {
        let mut pad = Joypad::new();
        pad.press(Button::Start);
        pad.press(Button::Left);

        pad.set_mode(0x10); // actions row
        assert_eq!(pad.keys_pressed(), 0xD0 | 0x07);

        pad.set_mode(0x20); // directions row
        assert_eq!(pad.keys_pressed(), 0xE0 | 0x0D);

        pad.release(Button::Left);
        assert_eq!(pad.keys_pressed(), 0xEF);
    }

    #[test]
    fn test_press_reports_visible_edge() {
        let mut pad = Joypad::new();
        pad.set_mode(0x20);
        assert!(!pad.press(Button::A));
        assert!(pad.press(Button::Down));
    }
}
