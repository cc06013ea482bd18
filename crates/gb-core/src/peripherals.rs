//! Register-level interfaces of the peripherals behind the address space
//!
//! The address space owns one implementation of each trait and only ever
//! talks to it through these methods; it never reaches into a peripheral's
//! storage.

/// One of the four DMG grey levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shade {
    #[default]
    White = 0,
    LightGray = 1,
    DarkGray = 2,
    Black = 3,
}

impl Shade {
    /// Shade for a 2-bit colour number
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Shade::White,
            1 => Shade::LightGray,
            2 => Shade::DarkGray,
            _ => Shade::Black,
        }
    }
}

/// Colour number -> shade lookup
pub type Palette = [Shade; 4];

/// Decode a palette register: bits 2i+1..2i hold the shade of colour i
pub fn decode_palette(value: u8) -> Palette {
    [0u8, 1, 2, 3].map(|i| Shade::from_bits(value >> (i * 2)))
}

/// Which palette register was written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteId {
    Background,
    Object0,
    Object1,
}

/// Pixel pipeline registers and video memory
pub trait PixelPipeline {
    /// Read VRAM at `offset` from $8000
    fn read_vram(&self, offset: u16) -> u8;
    /// Write VRAM at `offset` from $8000
    fn write_vram(&mut self, offset: u16, value: u8);
    /// Tile data at `address` ($8000-$97FF) changed
    fn notify_tile_write(&mut self, address: u16);
    /// OAM byte at `offset` changed
    fn notify_sprite_write(&mut self, offset: u8, value: u8);

    fn control(&self) -> u8;
    fn set_control(&mut self, value: u8);
    fn status(&self) -> u8;
    fn set_status(&mut self, value: u8);
    fn scroll_y(&self) -> u8;
    fn set_scroll_y(&mut self, value: u8);
    fn scroll_x(&self) -> u8;
    fn set_scroll_x(&mut self, value: u8);
    /// Line currently being drawn; not writable from the bus
    fn current_line(&self) -> u8;
    fn line_compare(&self) -> u8;
    fn set_line_compare(&mut self, value: u8);

    /// Install a decoded palette
    fn set_palette(&mut self, id: PaletteId, palette: Palette);
}

/// Timer registers
pub trait TimerRegisters {
    fn divider(&self) -> u8;
    /// Any write to DIV lands here; the value written is irrelevant
    fn clear_divider(&mut self);
    fn counter(&self) -> u8;
    fn set_counter(&mut self, value: u8);
    fn modulo(&self) -> u8;
    fn set_modulo(&mut self, value: u8);
    fn control(&self) -> u8;
    fn set_control(&mut self, value: u8);
}

/// Interrupt request (IF) and enable (IE) registers
pub trait InterruptLines {
    fn raised_flags(&self) -> u8;
    /// OR `mask` into the raised flags
    fn raise_interrupt(&mut self, mask: u8);
    /// Replace the raised flags (bus write to IF)
    fn set_raised_flags(&mut self, value: u8);
    fn enabled_flags(&self) -> u8;
    /// OR `mask` into the enabled flags
    fn enable_interrupt(&mut self, mask: u8);
    /// Replace the enabled flags (bus write to IE)
    fn set_enabled_flags(&mut self, value: u8);
}

/// Joypad matrix register
pub trait JoypadPort {
    fn keys_pressed(&self) -> u8;
    fn set_mode(&mut self, value: u8);
}

/// Receiver for bytes written to the serial data register.
///
/// Test ROMs print their results through SB; this is a debugging channel,
/// not an emulated link cable.
pub trait SerialSink {
    fn on_serial_byte(&mut self, byte: u8);
}
