//! Pixel pipeline register file
//!
//! Holds video memory, the LCD registers and the decoded caches the renderer
//! works from: tile pixel data rebuilt on every tile write, and sprite
//! attributes rebuilt on every OAM write. Drawing itself lives elsewhere.
//!
//! Key specs:
//! - 8KB VRAM at $8000-$9FFF, tile data at $8000-$97FF (384 tiles)
//! - 40 sprites of 4 bytes each in OAM
//! - 154 lines per frame, 144 visible

use crate::peripherals::{Palette, PaletteId, PixelPipeline, Shade};

/// Video RAM size
pub const VRAM_SIZE: usize = 0x2000;
/// Number of tiles addressable in tile data
pub const TILE_COUNT: usize = 384;
/// Number of sprites in OAM
pub const SPRITE_COUNT: usize = 40;
/// Lines per frame including vertical blank
pub const LINES_PER_FRAME: u8 = 154;

/// LCD control flags (LCDC)
#[derive(Debug, Clone, Copy, Default)]
pub struct LcdControl(u8);

impl LcdControl {
    pub const DISPLAY_ENABLE: u8 = 0b10000000;
    pub const WINDOW_TILE_MAP: u8 = 0b01000000;
    pub const WINDOW_ENABLE: u8 = 0b00100000;
    pub const TILE_DATA: u8 = 0b00010000;
    pub const BG_TILE_MAP: u8 = 0b00001000;
    pub const SPRITE_SIZE: u8 = 0b00000100;
    pub const SPRITE_ENABLE: u8 = 0b00000010;
    pub const BG_ENABLE: u8 = 0b00000001;

    pub fn new(val: u8) -> Self {
        Self(val)
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn display_enabled(&self) -> bool {
        (self.0 & Self::DISPLAY_ENABLE) != 0
    }

    pub fn tall_sprites(&self) -> bool {
        (self.0 & Self::SPRITE_SIZE) != 0
    }

    pub fn background_enabled(&self) -> bool {
        (self.0 & Self::BG_ENABLE) != 0
    }
}

/// LCD status (STAT)
///
/// Bits 0-2 are driven by the hardware; software only writes bits 3-6.
#[derive(Debug, Clone, Copy, Default)]
pub struct LcdStatus(u8);

impl LcdStatus {
    pub const LYC_INTERRUPT: u8 = 0b01000000;
    pub const MODE2_INTERRUPT: u8 = 0b00100000;
    pub const MODE1_INTERRUPT: u8 = 0b00010000;
    pub const MODE0_INTERRUPT: u8 = 0b00001000;
    pub const COINCIDENCE: u8 = 0b00000100;
    pub const MODE: u8 = 0b00000011;

    const WRITABLE: u8 = 0b01111000;

    pub fn new(val: u8) -> Self {
        Self(val)
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn mode(&self) -> u8 {
        self.0 & Self::MODE
    }

    pub fn coincidence(&self) -> bool {
        (self.0 & Self::COINCIDENCE) != 0
    }
}

/// Decoded OAM entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sprite {
    /// Screen Y + 16
    pub y: u8,
    /// Screen X + 8
    pub x: u8,
    pub tile: u8,
    pub behind_background: bool,
    pub flip_y: bool,
    pub flip_x: bool,
    /// Uses OBP1 instead of OBP0
    pub high_palette: bool,
}

/// 8x8 tile of 2-bit colour numbers, `[row][column]`
pub type Tile = [[u8; 8]; 8];

/// Pixel pipeline state
#[derive(Debug, Clone)]
pub struct Ppu {
    vram: Box<[u8; VRAM_SIZE]>,
    tiles: Box<[Tile; TILE_COUNT]>,
    sprites: [Sprite; SPRITE_COUNT],
    control: LcdControl,
    status: LcdStatus,
    scroll_x: u8,
    scroll_y: u8,
    line: u8,
    line_compare: u8,
    background_palette: Palette,
    object_palettes: [Palette; 2],
}

impl Ppu {
    pub fn new() -> Self {
        Self {
            vram: Box::new([0; VRAM_SIZE]),
            tiles: Box::new([[[0; 8]; 8]; TILE_COUNT]),
            sprites: [Sprite::default(); SPRITE_COUNT],
            control: LcdControl::default(),
            status: LcdStatus::default(),
            scroll_x: 0,
            scroll_y: 0,
            line: 0,
            line_compare: 0,
            background_palette: [Shade::White; 4],
            object_palettes: [[Shade::White; 4]; 2],
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Move the beam to `line` (driven by the stepping loop)
    pub fn set_current_line(&mut self, line: u8) {
        self.line = line % LINES_PER_FRAME;
        self.update_coincidence();
    }

    pub fn lcd_control(&self) -> LcdControl {
        self.control
    }

    pub fn lcd_status(&self) -> LcdStatus {
        self.status
    }

    pub fn tile(&self, index: usize) -> &Tile {
        &self.tiles[index]
    }

    pub fn sprite(&self, index: usize) -> &Sprite {
        &self.sprites[index]
    }

    pub fn palette(&self, id: PaletteId) -> &Palette {
        match id {
            PaletteId::Background => &self.background_palette,
            PaletteId::Object0 => &self.object_palettes[0],
            PaletteId::Object1 => &self.object_palettes[1],
        }
    }

    fn update_coincidence(&mut self) {
        let bits = if self.line == self.line_compare {
            self.status.0 | LcdStatus::COINCIDENCE
        } else {
            self.status.0 & !LcdStatus::COINCIDENCE
        };
        self.status = LcdStatus(bits);
    }
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}

impl PixelPipeline for Ppu {
    fn read_vram(&self, offset: u16) -> u8 {
        self.vram[offset as usize & (VRAM_SIZE - 1)]
    }

    fn write_vram(&mut self, offset: u16, value: u8) {
        self.vram[offset as usize & (VRAM_SIZE - 1)] = value;
    }

    fn notify_tile_write(&mut self, address: u16) {
        // Each tile row is two bytes: low bit plane, then high bit plane
        let base = (address as usize & 0x1FFE) & (VRAM_SIZE - 1);
        let tile = base / 16;
        if tile >= TILE_COUNT {
            return;
        }
        let row = (base % 16) / 2;
        let low = self.vram[base];
        let high = self.vram[base + 1];
        for x in 0..8 {
            let bit = 7 - x;
            self.tiles[tile][row][x] = ((low >> bit) & 1) | (((high >> bit) & 1) << 1);
        }
    }

    fn notify_sprite_write(&mut self, offset: u8, value: u8) {
        let index = offset as usize / 4;
        if index >= SPRITE_COUNT {
            return;
        }
        let sprite = &mut self.sprites[index];
        match offset % 4 {
            0 => sprite.y = value,
            1 => sprite.x = value,
            2 => sprite.tile = value,
            _ => {
                sprite.behind_background = value & 0x80 != 0;
                sprite.flip_y = value & 0x40 != 0;
                sprite.flip_x = value & 0x20 != 0;
                sprite.high_palette = value & 0x10 != 0;
            }
        }
    }

    fn control(&self) -> u8 {
        self.control.0
    }

    fn set_control(&mut self, value: u8) {
        self.control = LcdControl(value);
    }

    fn status(&self) -> u8 {
        self.status.0
    }

    fn set_status(&mut self, value: u8) {
        let kept = self.status.0 & !LcdStatus::WRITABLE;
        self.status = LcdStatus(kept | (value & LcdStatus::WRITABLE));
    }

    fn scroll_y(&self) -> u8 {
        self.scroll_y
    }

    fn set_scroll_y(&mut self, value: u8) {
        self.scroll_y = value;
    }

    fn scroll_x(&self) -> u8 {
        self.scroll_x
    }

    fn set_scroll_x(&mut self, value: u8) {
        self.scroll_x = value;
    }

    fn current_line(&self) -> u8 {
        self.line
    }

    fn line_compare(&self) -> u8 {
        self.line_compare
    }

    fn set_line_compare(&mut self, value: u8) {
        self.line_compare = value;
        self.update_coincidence();
    }

    fn set_palette(&mut self, id: PaletteId, palette: Palette) {
        match id {
            PaletteId::Background => self.background_palette = palette,
            PaletteId::Object0 => self.object_palettes[0] = palette,
            PaletteId::Object1 => self.object_palettes[1] = palette,
        }
    }
}
