//! I/O register addresses and their unused-bit masks
//!
//! Registers with fewer than eight implemented bits read back the
//! unimplemented positions as 1. The mask is looked up by exact address;
//! neighbouring registers of the same block can differ.

/// Joypad select / matrix (P1)
pub const JOYP: u16 = 0xFF00;
/// Serial transfer data (SB)
pub const SB: u16 = 0xFF01;
/// Serial control (SC)
pub const SC: u16 = 0xFF02;
/// Divider (DIV)
pub const DIV: u16 = 0xFF04;
/// Timer counter (TIMA)
pub const TIMA: u16 = 0xFF05;
/// Timer modulo (TMA)
pub const TMA: u16 = 0xFF06;
/// Timer control (TAC)
pub const TAC: u16 = 0xFF07;
/// Interrupt flags (IF)
pub const IF: u16 = 0xFF0F;
/// LCD control (LCDC)
pub const LCDC: u16 = 0xFF40;
/// LCD status (STAT)
pub const STAT: u16 = 0xFF41;
/// Background scroll Y (SCY)
pub const SCY: u16 = 0xFF42;
/// Background scroll X (SCX)
pub const SCX: u16 = 0xFF43;
/// Current scanline (LY), read-only
pub const LY: u16 = 0xFF44;
/// Scanline compare (LYC)
pub const LYC: u16 = 0xFF45;
/// OAM DMA source page
pub const DMA: u16 = 0xFF46;
/// Background palette (BGP)
pub const BGP: u16 = 0xFF47;
/// Object palette 0 (OBP0)
pub const OBP0: u16 = 0xFF48;
/// Object palette 1 (OBP1)
pub const OBP1: u16 = 0xFF49;
/// Interrupt enable (IE)
pub const IE: u16 = 0xFFFF;

/// Interrupt request bits shared by IF and IE
pub mod interrupt {
    pub const VBLANK: u8 = 0x01;
    pub const LCD_STAT: u8 = 0x02;
    pub const TIMER: u8 = 0x04;
    pub const SERIAL: u8 = 0x08;
    pub const JOYPAD: u8 = 0x10;
}

const fn build_masks() -> [u8; 0x100] {
    let mut masks = [0u8; 0x100];

    masks[0x02] = 0b0111_1110;
    masks[0x07] = 0b1111_1000;
    masks[0x0F] = 0b1110_0000;
    masks[0x10] = 0b1000_0000;
    masks[0x1A] = 0b0111_1111;
    masks[0x1C] = 0b1001_1111;
    masks[0x20] = 0b1100_0000;
    masks[0x23] = 0b0011_1111;
    masks[0x26] = 0b0111_0000;
    masks[0x41] = 0b1000_0000;

    // Unmapped holes read as all ones
    masks[0x03] = 0xFF;
    let mut i = 0x08;
    while i <= 0x0E {
        masks[i] = 0xFF;
        i += 1;
    }
    masks[0x15] = 0xFF;
    masks[0x1F] = 0xFF;
    masks[0x27] = 0xFF;
    masks[0x28] = 0xFF;
    masks[0x29] = 0xFF;
    let mut i = 0x4C;
    while i <= 0x7F {
        masks[i] = 0xFF;
        i += 1;
    }

    masks
}

/// Unused-bit masks for $FF00-$FFFF, indexed by the low address byte
static UNUSED_BITS: [u8; 0x100] = build_masks();

/// Unused-bit mask for `address`; zero outside the I/O page
#[inline]
pub fn unused_bits(address: u16) -> u8 {
    if address >= 0xFF00 {
        UNUSED_BITS[(address & 0x00FF) as usize]
    } else {
        0
    }
}

/// Register values left behind by the boot program, in write order
pub const POST_BOOT_REGISTERS: [(u16, u8); 30] = [
    (TIMA, 0x00),
    (TMA, 0x00),
    (TAC, 0x00),
    (0xFF10, 0x80),
    (0xFF11, 0xBF),
    (0xFF12, 0xF3),
    (0xFF14, 0xBF),
    (0xFF16, 0x3F),
    (0xFF17, 0x00),
    (0xFF19, 0xBF),
    (0xFF1A, 0x7F),
    (0xFF1B, 0xFF),
    (0xFF1C, 0x9F),
    (0xFF1E, 0xFF),
    (0xFF20, 0xFF),
    (0xFF21, 0x00),
    (0xFF22, 0x00),
    (0xFF23, 0xBF),
    (0xFF24, 0x77),
    (0xFF25, 0xF3),
    (0xFF26, 0xF1),
    (LCDC, 0x91),
    (SCY, 0x00),
    (SCX, 0x00),
    (LYC, 0x00),
    (BGP, 0xFC),
    (OBP0, 0xFF),
    (OBP1, 0xFF),
    (0xFF4A, 0x00),
    (0xFF4B, 0x00),
];
