//! Bank controllers
//!
//! Cartridges larger than the 32KB ROM window (or carrying external RAM)
//! use a controller chip that remaps banks into $0000-$7FFF and $A000-$BFFF.
//! Writes to the ROM window never touch ROM; they drive the controller's
//! banking registers.
//!
//! Only the flat mapping and MBC1 are modelled. Other recognised controllers
//! fall back to the flat mapping so their titles still get a best-effort boot.

use log::{debug, warn};

use crate::cartridge::{
    Cartridge, CartridgeDescriptor, CartridgeError, ControllerKind, RAM_BANK_SIZE, ROM_BANK_SIZE,
};

/// Value seen on the data bus when nothing drives it
pub const OPEN_BUS: u8 = 0xFF;

/// Interface every cartridge controller provides to the address space
pub trait BankController {
    /// Read from the ROM window ($0000-$7FFF)
    fn read_rom(&self, address: u16) -> u8;

    /// Read from the external RAM window ($A000-$BFFF)
    fn read_ram(&self, address: u16) -> u8;

    /// Handle a write to the ROM window (banking registers)
    fn write_rom(&mut self, address: u16, value: u8);

    /// Write to the external RAM window
    fn write_ram(&mut self, address: u16, value: u8);

    /// Restore power-on banking state; RAM contents are kept
    fn reset(&mut self);

    /// Descriptor of the cartridge behind this controller
    fn descriptor(&self) -> &'static CartridgeDescriptor;

    /// Whether external RAM survives power-off
    fn has_battery(&self) -> bool {
        self.descriptor().has_battery()
    }

    /// Copy of the external RAM for save files
    fn export_ram(&self) -> Vec<u8>;

    /// Replace external RAM from a save file
    fn import_ram(&mut self, data: &[u8]) -> Result<(), CartridgeError>;

    /// Returns `true` once after external RAM has been written
    fn take_ram_dirty(&mut self) -> bool;
}

/// Build the controller for a loaded cartridge
pub fn create_controller(cartridge: Cartridge) -> Box<dyn BankController> {
    let descriptor = cartridge.descriptor();
    match descriptor.kind {
        ControllerKind::RomOnly => Box::new(RomOnly::new(cartridge)),
        ControllerKind::Mbc1 => Box::new(Mbc1::new(cartridge)),
        ControllerKind::Mbc2 | ControllerKind::Mbc3 => {
            warn!(
                "{} ({:#04x}) is not implemented, mapping rom and ram flat",
                descriptor.name, descriptor.id
            );
            Box::new(RomOnly::new(cartridge))
        }
    }
}

fn import_into(ram: &mut [u8], data: &[u8]) -> Result<(), CartridgeError> {
    if data.len() != ram.len() {
        return Err(CartridgeError::RamSizeMismatch {
            expected: ram.len(),
            actual: data.len(),
        });
    }
    ram.copy_from_slice(data);
    Ok(())
}

/// Flat mapping: ROM at its own address, RAM (if any) at $A000
#[derive(Debug, Clone)]
pub struct RomOnly {
    descriptor: &'static CartridgeDescriptor,
    rom: Vec<u8>,
    ram: Vec<u8>,
    ram_dirty: bool,
}

impl RomOnly {
    pub fn new(cartridge: Cartridge) -> Self {
        let (_, descriptor, rom, ram) = cartridge.into_parts();
        Self {
            descriptor,
            rom,
            ram,
            ram_dirty: false,
        }
    }
}

impl BankController for RomOnly {
    fn read_rom(&self, address: u16) -> u8 {
        self.rom.get(address as usize).copied().unwrap_or(OPEN_BUS)
    }

    fn read_ram(&self, address: u16) -> u8 {
        let offset = address.wrapping_sub(0xA000) as usize;
        self.ram.get(offset).copied().unwrap_or(OPEN_BUS)
    }

    fn write_rom(&mut self, _address: u16, _value: u8) {}

    fn write_ram(&mut self, address: u16, value: u8) {
        let offset = address.wrapping_sub(0xA000) as usize;
        if let Some(byte) = self.ram.get_mut(offset) {
            *byte = value;
            self.ram_dirty = true;
        }
    }

    fn reset(&mut self) {}

    fn descriptor(&self) -> &'static CartridgeDescriptor {
        self.descriptor
    }

    fn export_ram(&self) -> Vec<u8> {
        self.ram.clone()
    }

    fn import_ram(&mut self, data: &[u8]) -> Result<(), CartridgeError> {
        import_into(&mut self.ram, data)
    }

    fn take_ram_dirty(&mut self) -> bool {
        std::mem::take(&mut self.ram_dirty)
    }
}

/// Banking mode selected through $6000-$7FFF
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankingMode {
    /// $4000-$5FFF feeds bits 5-6 of the ROM bank
    Rom,
    /// $4000-$5FFF selects the RAM bank
    Ram,
}

/// MBC1: up to 2MB ROM and 32KB RAM
#[derive(Debug, Clone)]
pub struct Mbc1 {
    descriptor: &'static CartridgeDescriptor,
    rom: Vec<u8>,
    ram: Vec<u8>,
    rom_banks: usize,
    ram_banks: usize,
    rom_bank: usize,
    ram_bank: usize,
    ram_enabled: bool,
    mode: BankingMode,
    ram_dirty: bool,
}

impl Mbc1 {
    pub fn new(cartridge: Cartridge) -> Self {
        let rom_banks = cartridge.rom_bank_count();
        let (_, descriptor, rom, ram) = cartridge.into_parts();
        let ram_banks = ram.len() / RAM_BANK_SIZE;
        Self {
            descriptor,
            rom,
            ram,
            rom_banks,
            ram_banks,
            rom_bank: 1,
            ram_bank: 0,
            ram_enabled: false,
            mode: BankingMode::Rom,
            ram_dirty: false,
        }
    }

    /// Raw 7-bit bank selector as written by software
    pub fn selected_rom_bank(&self) -> usize {
        self.rom_bank
    }

    pub fn selected_ram_bank(&self) -> usize {
        self.ram_bank
    }

    pub fn ram_enabled(&self) -> bool {
        self.ram_enabled
    }

    pub fn banking_mode(&self) -> BankingMode {
        self.mode
    }

    /// Bank mapped at $4000-$7FFF after reduction; bank 0 cannot be mapped there
    pub fn effective_rom_bank(&self) -> usize {
        match self.rom_bank % self.rom_banks {
            0 if self.rom_banks > 1 => 1,
            bank => bank,
        }
    }

    fn ram_offset(&self, address: u16) -> Option<usize> {
        if !self.ram_enabled || self.ram_banks == 0 {
            return None;
        }
        let bank = self.ram_bank % self.ram_banks;
        Some(bank * RAM_BANK_SIZE + (address as usize & (RAM_BANK_SIZE - 1)))
    }
}

impl BankController for Mbc1 {
    fn read_rom(&self, address: u16) -> u8 {
        let offset = if address < 0x4000 {
            address as usize
        } else {
            self.effective_rom_bank() * ROM_BANK_SIZE + (address as usize - 0x4000)
        };
        self.rom.get(offset).copied().unwrap_or(OPEN_BUS)
    }

    fn read_ram(&self, address: u16) -> u8 {
        self.ram_offset(address)
            .and_then(|offset| self.ram.get(offset).copied())
            .unwrap_or(OPEN_BUS)
    }

    fn write_rom(&mut self, address: u16, value: u8) {
        match address {
            0x0000..=0x1FFF => {
                self.ram_enabled = value & 0x0F == 0x0A;
                debug!("mbc1: ram enabled = {}", self.ram_enabled);
            }
            0x2000..=0x3FFF => {
                self.rom_bank = (self.rom_bank & 0x60) | (value as usize & 0x1F);
                debug!("mbc1: rom bank low bits -> bank {:#04x}", self.rom_bank);
            }
            0x4000..=0x5FFF => match self.mode {
                BankingMode::Rom => {
                    self.rom_bank = (self.rom_bank & 0x1F) | ((value as usize & 0x03) << 5);
                    debug!("mbc1: rom bank high bits -> bank {:#04x}", self.rom_bank);
                }
                BankingMode::Ram => {
                    self.ram_bank = value as usize & 0x03;
                    debug!("mbc1: ram bank {}", self.ram_bank);
                }
            },
            0x6000..=0x7FFF => {
                self.mode = if value == 0 {
                    BankingMode::Rom
                } else {
                    BankingMode::Ram
                };
                debug!("mbc1: banking mode {:?}", self.mode);
            }
            _ => {}
        }
    }

    fn write_ram(&mut self, address: u16, value: u8) {
        if let Some(offset) = self.ram_offset(address) {
            if let Some(byte) = self.ram.get_mut(offset) {
                *byte = value;
                self.ram_dirty = true;
            }
        }
    }

    fn reset(&mut self) {
        self.rom_bank = 1;
        self.ram_bank = 0;
        self.ram_enabled = false;
        self.mode = BankingMode::Rom;
    }

    fn descriptor(&self) -> &'static CartridgeDescriptor {
        self.descriptor
    }

    fn export_ram(&self) -> Vec<u8> {
        self.ram.clone()
    }

    fn import_ram(&mut self, data: &[u8]) -> Result<(), CartridgeError> {
        import_into(&mut self.ram, data)
    }

    fn take_ram_dirty(&mut self) -> bool {
        std::mem::take(&mut self.ram_dirty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::header_checksum;

    /// ROM where every byte of bank N holds N
    fn banked_rom(cartridge_type: u8, rom_code: u8, ram_code: u8) -> Cartridge {
        let banks = 2usize << rom_code;
        let mut rom = Vec::with_capacity(banks * ROM_BANK_SIZE);
        for bank in 0..banks {
            rom.extend(std::iter::repeat(bank as u8).take(ROM_BANK_SIZE));
        }
        rom[0x147] = cartridge_type;
        rom[0x148] = rom_code;
        rom[0x149] = ram_code;
        rom[0x14D] = header_checksum(&rom);
        Cartridge::from_rom(&rom).unwrap()
    }

    #[test]
    fn test_rom_only_reads_flat() {
        let mbc = RomOnly::new(banked_rom(0x00, 0, 0));
        assert_eq!(mbc.read_rom(0x0000), 0);
        assert_eq!(mbc.read_rom(0x4000), 1);
        assert_eq!(mbc.read_ram(0xA000), OPEN_BUS);
    }

    #[test]
    fn test_rom_only_ignores_control_writes() {
        let mut mbc = RomOnly::new(banked_rom(0x00, 0, 0));
        mbc.write_rom(0x2000, 0x01);
        mbc.write_rom(0x0000, 0xFF);
        assert_eq!(mbc.read_rom(0x0000), 0);
        assert_eq!(mbc.read_rom(0x7FFF), 1);
    }

    #[test]
    fn test_rom_with_ram() {
        let mut mbc = RomOnly::new(banked_rom(0x09, 0, 2));
        mbc.write_ram(0xA123, 0x5A);
        assert_eq!(mbc.read_ram(0xA123), 0x5A);
        assert!(mbc.take_ram_dirty());
        assert!(!mbc.take_ram_dirty());
        assert!(mbc.has_battery());
    }

    #[test]
    fn test_mbc1_power_on_state() {
        let mbc = Mbc1::new(banked_rom(0x01, 2, 0));
        assert_eq!(mbc.selected_rom_bank(), 1);
        assert_eq!(mbc.selected_ram_bank(), 0);
        assert!(!mbc.ram_enabled());
        assert_eq!(mbc.banking_mode(), BankingMode::Rom);
        assert_eq!(mbc.read_rom(0x4000), 1);
    }

    #[test]
    fn test_mbc1_low_bits_keep_high_bits() {
        let mut mbc = Mbc1::new(banked_rom(0x01, 6, 0)); // 128 banks
        mbc.write_rom(0x4000, 0x02);
        mbc.write_rom(0x2000, 0x05);
        assert_eq!(mbc.selected_rom_bank(), 0x45);
        assert_eq!(mbc.read_rom(0x4000), 0x45);

        mbc.write_rom(0x2000, 0xE3);
        assert_eq!(mbc.selected_rom_bank(), 0x43);
    }

    #[test]
    fn test_mbc1_bank_zero_promoted() {
        let mut mbc = Mbc1::new(banked_rom(0x01, 2, 0));
        mbc.write_rom(0x2000, 0x00);
        assert_eq!(mbc.effective_rom_bank(), 1);
        assert_eq!(mbc.read_rom(0x5000), 1);
    }

    #[test]
    fn test_mbc1_bank_reduced_modulo_count() {
        let mut mbc = Mbc1::new(banked_rom(0x01, 1, 0)); // 4 banks
        mbc.write_rom(0x2000, 0x06);
        assert_eq!(mbc.effective_rom_bank(), 2);
        assert_eq!(mbc.read_rom(0x4000), 2);
    }

    #[test]
    fn test_mbc1_fixed_window_ignores_bank() {
        let mut mbc = Mbc1::new(banked_rom(0x01, 2, 0));
        mbc.write_rom(0x2000, 0x03);
        assert_eq!(mbc.read_rom(0x0000), 0);
        assert_eq!(mbc.read_rom(0x3FFF), 0);
    }

    #[test]
    fn test_mbc1_ram_mode_selects_ram_bank() {
        let mut mbc = Mbc1::new(banked_rom(0x03, 1, 3));
        mbc.write_rom(0x0000, 0x0A);
        mbc.write_rom(0x6000, 0x01);
        mbc.write_rom(0x4000, 0x02);
        assert_eq!(mbc.banking_mode(), BankingMode::Ram);
        assert_eq!(mbc.selected_ram_bank(), 2);
        assert_eq!(mbc.selected_rom_bank(), 1);

        mbc.write_ram(0xA000, 0x77);
        assert_eq!(mbc.export_ram()[2 * RAM_BANK_SIZE], 0x77);

        mbc.write_rom(0x4000, 0x00);
        assert_eq!(mbc.read_ram(0xA000), 0x00);
        mbc.write_rom(0x4000, 0x02);
        assert_eq!(mbc.read_ram(0xA000), 0x77);
    }

    #[test]
    fn test_mbc1_ram_gate() {
        let mut mbc = Mbc1::new(banked_rom(0x02, 0, 2));
        mbc.write_ram(0xA010, 0x11);
        assert_eq!(mbc.read_ram(0xA010), OPEN_BUS);
        assert!(!mbc.take_ram_dirty());

        mbc.write_rom(0x1000, 0x1A);
        mbc.write_ram(0xA010, 0x11);
        assert_eq!(mbc.read_ram(0xA010), 0x11);

        mbc.write_rom(0x0000, 0x0B);
        assert_eq!(mbc.read_ram(0xA010), OPEN_BUS);
    }

    #[test]
    fn test_mbc1_reset_keeps_ram() {
        let mut mbc = Mbc1::new(banked_rom(0x03, 2, 2));
        mbc.write_rom(0x0000, 0x0A);
        mbc.write_ram(0xA000, 0x42);
        mbc.write_rom(0x2000, 0x05);
        mbc.reset();
        assert_eq!(mbc.selected_rom_bank(), 1);
        assert!(!mbc.ram_enabled());
        assert_eq!(mbc.export_ram()[0], 0x42);
    }

    #[test]
    fn test_import_ram_size_checked() {
        let mut mbc = Mbc1::new(banked_rom(0x03, 0, 2));
        assert_eq!(
            mbc.import_ram(&[0u8; 16]),
            Err(CartridgeError::RamSizeMismatch {
                expected: RAM_BANK_SIZE,
                actual: 16
            })
        );
        assert!(mbc.import_ram(&vec![0xAB; RAM_BANK_SIZE]).is_ok());
        mbc.write_rom(0x0000, 0x0A);
        assert_eq!(mbc.read_ram(0xBFFF), 0xAB);
    }

    #[test]
    fn test_unimplemented_kinds_fall_back_to_flat() {
        let mbc = create_controller(banked_rom(0x13, 2, 3));
        assert_eq!(mbc.descriptor().kind, ControllerKind::Mbc3);
        // No banking: $4000 reads image offset $4000
        assert_eq!(mbc.read_rom(0x4000), 1);
        assert_eq!(mbc.read_rom(0x7FFF), 1);
    }
}
