//! Cartridge loading and header lookup
//!
//! The header at $0100-$014F describes the cartridge: title, the controller
//! type byte, and ROM/RAM size codes. The type byte selects a
//! [`CartridgeDescriptor`] from a static table; ids missing from the table are
//! rejected here, at load time, instead of at first access.

use bitflags::bitflags;
use log::{info, warn};
use thiserror::Error;

use crate::boot::boot_logo;

/// Smallest image that still contains a complete header
pub const HEADER_END: usize = 0x150;

/// Size of one switchable ROM bank
pub const ROM_BANK_SIZE: usize = 0x4000;

/// Size of one external RAM bank
pub const RAM_BANK_SIZE: usize = 0x2000;

const LOGO_START: usize = 0x104;
const TITLE_START: usize = 0x134;
const CGB_FLAG: usize = 0x143;
const CARTRIDGE_TYPE: usize = 0x147;
const ROM_SIZE: usize = 0x148;
const RAM_SIZE: usize = 0x149;
const HEADER_CHECKSUM: usize = 0x14D;

/// Cartridge error types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CartridgeError {
    #[error("rom image too small: {0} bytes, header needs 336")]
    RomTooSmall(usize),
    #[error("unsupported cartridge type {0:#04x}")]
    UnsupportedCartridge(u8),
    #[error("save ram size mismatch: expected {expected} bytes, got {actual}")]
    RamSizeMismatch { expected: usize, actual: usize },
}

/// Bank controller hardware fitted to the cartridge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerKind {
    /// No controller, 32KB ROM mapped flat
    RomOnly,
    /// MBC1
    Mbc1,
    /// MBC2
    Mbc2,
    /// MBC3
    Mbc3,
}

bitflags! {
    /// Extra hardware on the cartridge board
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Capabilities: u8 {
        const RAM = 0b0000_0001;
        const BATTERY = 0b0000_0010;
        const TIMER = 0b0000_0100;
        const RUMBLE = 0b0000_1000;
        const ACCELEROMETER = 0b0001_0000;
    }
}

/// Static description of one cartridge type id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartridgeDescriptor {
    pub id: u8,
    pub name: &'static str,
    pub kind: ControllerKind,
    pub capabilities: Capabilities,
}

impl CartridgeDescriptor {
    const fn new(id: u8, name: &'static str, kind: ControllerKind, capabilities: Capabilities) -> Self {
        Self {
            id,
            name,
            kind,
            capabilities,
        }
    }

    pub fn has_ram(&self) -> bool {
        self.capabilities.contains(Capabilities::RAM)
    }

    pub fn has_battery(&self) -> bool {
        self.capabilities.contains(Capabilities::BATTERY)
    }

    pub fn has_timer(&self) -> bool {
        self.capabilities.contains(Capabilities::TIMER)
    }

    pub fn has_rumble(&self) -> bool {
        self.capabilities.contains(Capabilities::RUMBLE)
    }

    pub fn has_accelerometer(&self) -> bool {
        self.capabilities.contains(Capabilities::ACCELEROMETER)
    }

    /// Look up the descriptor for a header type byte
    pub fn lookup(id: u8) -> Result<&'static CartridgeDescriptor, CartridgeError> {
        CARTRIDGE_TYPES
            .iter()
            .find(|d| d.id == id)
            .ok_or(CartridgeError::UnsupportedCartridge(id))
    }
}

const NONE: Capabilities = Capabilities::empty();
const RAM: Capabilities = Capabilities::RAM;
const RAM_BATTERY: Capabilities = Capabilities::RAM.union(Capabilities::BATTERY);
const TIMER_BATTERY: Capabilities = Capabilities::TIMER.union(Capabilities::BATTERY);
const RAM_TIMER_BATTERY: Capabilities = RAM_BATTERY.union(Capabilities::TIMER);

/// Known cartridge types
pub static CARTRIDGE_TYPES: [CartridgeDescriptor; 13] = [
    CartridgeDescriptor::new(0x00, "ROM Only", ControllerKind::RomOnly, NONE),
    CartridgeDescriptor::new(0x01, "MBC1", ControllerKind::Mbc1, NONE),
    CartridgeDescriptor::new(0x02, "MBC1 + RAM", ControllerKind::Mbc1, RAM),
    CartridgeDescriptor::new(0x03, "MBC1 + RAM + Battery", ControllerKind::Mbc1, RAM_BATTERY),
    CartridgeDescriptor::new(0x05, "MBC2", ControllerKind::Mbc2, NONE),
    CartridgeDescriptor::new(0x06, "MBC2 + RAM + Battery", ControllerKind::Mbc2, RAM_BATTERY),
    CartridgeDescriptor::new(0x08, "ROM + RAM", ControllerKind::RomOnly, RAM),
    CartridgeDescriptor::new(0x09, "ROM + RAM + Battery", ControllerKind::RomOnly, RAM_BATTERY),
    CartridgeDescriptor::new(0x0F, "MBC3 + Timer + Battery", ControllerKind::Mbc3, TIMER_BATTERY),
    CartridgeDescriptor::new(0x10, "MBC3 + RAM + Timer + Battery", ControllerKind::Mbc3, RAM_TIMER_BATTERY),
    CartridgeDescriptor::new(0x11, "MBC3", ControllerKind::Mbc3, NONE),
    CartridgeDescriptor::new(0x12, "MBC3 + RAM", ControllerKind::Mbc3, RAM),
    CartridgeDescriptor::new(0x13, "MBC3 + RAM + Battery", ControllerKind::Mbc3, RAM_BATTERY),
];

/// Parsed cartridge header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartridgeHeader {
    /// Internal title
    pub title: String,
    /// Cartridge type byte ($0147)
    pub cartridge_type: u8,
    /// ROM size code ($0148)
    pub rom_size_code: u8,
    /// RAM size code ($0149)
    pub ram_size_code: u8,
    /// Stored header checksum ($014D)
    pub header_checksum: u8,
    /// Checksum computed over $0134-$014C
    pub computed_checksum: u8,
    /// Whether the logo matches the one in the boot image
    pub logo_matches: bool,
}

impl CartridgeHeader {
    /// Parse the header out of a full ROM image
    pub fn parse(rom: &[u8]) -> Result<Self, CartridgeError> {
        if rom.len() < HEADER_END {
            return Err(CartridgeError::RomTooSmall(rom.len()));
        }

        Ok(Self {
            title: parse_title(rom),
            cartridge_type: rom[CARTRIDGE_TYPE],
            rom_size_code: rom[ROM_SIZE],
            ram_size_code: rom[RAM_SIZE],
            header_checksum: rom[HEADER_CHECKSUM],
            computed_checksum: header_checksum(rom),
            logo_matches: &rom[LOGO_START..LOGO_START + boot_logo().len()] == boot_logo(),
        })
    }

    pub fn checksum_valid(&self) -> bool {
        self.header_checksum == self.computed_checksum
    }

    /// ROM bank count declared by the header, if the size code is known
    pub fn declared_rom_banks(&self) -> Option<usize> {
        rom_banks(self.rom_size_code)
    }

    /// External RAM bank count declared by the header
    pub fn declared_ram_banks(&self) -> usize {
        ram_banks(self.ram_size_code)
    }
}

/// Header checksum over $0134-$014C
pub fn header_checksum(rom: &[u8]) -> u8 {
    rom[TITLE_START..HEADER_CHECKSUM]
        .iter()
        .fold(0u8, |acc, &b| acc.wrapping_sub(b).wrapping_sub(1))
}

fn parse_title(rom: &[u8]) -> String {
    let len = if rom[CGB_FLAG] & 0x80 == 0x80 { 11 } else { 16 };
    rom[TITLE_START..TITLE_START + len]
        .iter()
        .take_while(|&&b| b != 0 && b.is_ascii())
        .map(|&b| b as char)
        .collect()
}

/// ROM banks for a size code ($0148)
pub fn rom_banks(code: u8) -> Option<usize> {
    (code <= 8).then(|| 2usize << code)
}

/// 8KB RAM banks for a size code ($0149)
pub fn ram_banks(code: u8) -> usize {
    match code {
        1 | 2 => 1,
        3 => 4,
        4 => 16,
        5 => 8,
        _ => 0,
    }
}

/// A loaded cartridge: header, descriptor and backing storage
#[derive(Debug, Clone)]
pub struct Cartridge {
    header: CartridgeHeader,
    descriptor: &'static CartridgeDescriptor,
    rom: Vec<u8>,
    ram: Vec<u8>,
}

impl Cartridge {
    /// Load a cartridge from a raw ROM image
    pub fn from_rom(rom_data: &[u8]) -> Result<Self, CartridgeError> {
        let header = CartridgeHeader::parse(rom_data)?;
        let descriptor = CartridgeDescriptor::lookup(header.cartridge_type)?;

        if !header.checksum_valid() {
            warn!(
                "header checksum mismatch: stored {:#04x}, computed {:#04x}",
                header.header_checksum, header.computed_checksum
            );
        }
        if !header.logo_matches {
            warn!("cartridge logo does not match the boot image");
        }

        let ram_size = if descriptor.has_ram() {
            header.declared_ram_banks().max(1) * RAM_BANK_SIZE
        } else {
            0
        };

        info!(
            "loaded \"{}\": {} ({} bytes rom, {} bytes ram)",
            header.title,
            descriptor.name,
            rom_data.len(),
            ram_size
        );

        Ok(Self {
            header,
            descriptor,
            rom: rom_data.to_vec(),
            ram: vec![0; ram_size],
        })
    }

    pub fn header(&self) -> &CartridgeHeader {
        &self.header
    }

    pub fn descriptor(&self) -> &'static CartridgeDescriptor {
        self.descriptor
    }

    pub fn title(&self) -> &str {
        &self.header.title
    }

    pub fn rom(&self) -> &[u8] {
        &self.rom
    }

    pub fn ram(&self) -> &[u8] {
        &self.ram
    }

    /// ROM bank count: the header's declaration, or the image size when the
    /// size code is unknown
    pub fn rom_bank_count(&self) -> usize {
        self.header
            .declared_rom_banks()
            .unwrap_or_else(|| self.rom.len().div_ceil(ROM_BANK_SIZE))
            .max(1)
    }

    /// Split into header, descriptor, ROM image and RAM image
    pub fn into_parts(self) -> (CartridgeHeader, &'static CartridgeDescriptor, Vec<u8>, Vec<u8>) {
        (self.header, self.descriptor, self.rom, self.ram)
    }
}
