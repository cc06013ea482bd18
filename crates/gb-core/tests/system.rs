//! Integration tests for the assembled system

use std::cell::RefCell;
use std::rc::Rc;

use gb_core::cartridge::{header_checksum, RAM_BANK_SIZE};
use gb_core::registers::{self, interrupt};
use gb_core::{BootOverlayState, Button, CartridgeError, GameBoy, SerialSink, SystemConfig, BOOT_ROM};

fn rom(cartridge_type: u8, ram_code: u8) -> Vec<u8> {
    let mut rom = vec![0u8; 0x10000];
    rom[0x0000] = 0xC3;
    rom[0x0100] = 0x00;
    rom[0x134..0x13F].copy_from_slice(b"SYSTEM TEST");
    rom[0x147] = cartridge_type;
    rom[0x148] = 0x01;
    rom[0x149] = ram_code;
    rom[0x14D] = header_checksum(&rom);
    rom
}

#[test]
fn test_load_and_header() {
    let gb = GameBoy::from_rom(&rom(0x03, 0x02), SystemConfig::default()).unwrap();
    assert_eq!(gb.title(), "SYSTEM TEST");
    assert_eq!(gb.descriptor().name, "MBC1 + RAM + Battery");
    assert!(gb.has_battery());
    assert!(gb.header().checksum_valid());
    assert_eq!(gb.header().declared_rom_banks(), Some(4));
}

#[test]
fn test_load_errors() {
    assert!(matches!(
        GameBoy::from_rom(&[0u8; 0x100], SystemConfig::default()),
        Err(CartridgeError::RomTooSmall(0x100))
    ));
    assert!(matches!(
        GameBoy::from_rom(&rom(0x20, 0x00), SystemConfig::default()),
        Err(CartridgeError::UnsupportedCartridge(0x20))
    ));
}

#[test]
fn test_boot_sequence() {
    let mut gb = GameBoy::from_rom(&rom(0x01, 0x00), SystemConfig::default()).unwrap();
    assert_eq!(gb.read(0x0000), BOOT_ROM[0]);
    gb.left_boot_region();
    assert_eq!(gb.boot_state(), BootOverlayState::Retired);
    assert_eq!(gb.read(0x0000), 0xC3);
}

#[test]
fn test_skip_boot_config() {
    let gb = GameBoy::from_rom(&rom(0x01, 0x00), SystemConfig { skip_boot_rom: true }).unwrap();
    assert!(gb.config().skip_boot_rom);
    assert_eq!(gb.boot_state(), BootOverlayState::Retired);
    assert_eq!(gb.read(0x0000), 0xC3);
    assert_eq!(gb.read(0xFF24), 0x77);
    assert_eq!(gb.read(registers::OBP0), 0xFF);
}

#[test]
fn test_timer_interrupt() {
    let mut gb = GameBoy::from_rom(&rom(0x00, 0x00), SystemConfig::default()).unwrap();
    gb.write(registers::TMA, 0xF0);
    gb.write(registers::TIMA, 0xFE);
    gb.write(registers::TAC, 0x04); // 1024 clocks per tick

    gb.tick(1024);
    assert_eq!(gb.read(registers::IF) & interrupt::TIMER, 0);
    assert_eq!(gb.read(registers::TIMA), 0xFF);

    gb.tick(1024);
    assert_eq!(gb.read(registers::IF) & interrupt::TIMER, interrupt::TIMER);
    assert_eq!(gb.read(registers::TIMA), 0xF0);
    assert_eq!(gb.read(registers::DIV), 8);

    gb.write(registers::IF, 0x00);
    assert_eq!(gb.read(registers::IF), 0xE0);
}

#[test]
fn test_tick_accepts_any_clock_count() {
    let mut gb = GameBoy::from_rom(&rom(0x00, 0x00), SystemConfig::default()).unwrap();
    gb.write(registers::TAC, 0x05);
    gb.tick(255);
    gb.tick(u32::MAX);
    assert_eq!(gb.read(registers::DIV), 0);
    assert_eq!(gb.read(registers::IF) & interrupt::TIMER, interrupt::TIMER);
}

#[test]
fn test_joypad_interrupt() {
    let mut gb = GameBoy::from_rom(&rom(0x00, 0x00), SystemConfig::default()).unwrap();
    gb.write(registers::JOYP, 0x20);

    gb.press(Button::A);
    assert_eq!(gb.read(registers::IF) & interrupt::JOYPAD, 0);

    gb.press(Button::Up);
    assert_eq!(gb.read(registers::IF) & interrupt::JOYPAD, interrupt::JOYPAD);
    assert_eq!(gb.read(registers::JOYP), 0xEB);

    gb.release(Button::Up);
    assert_eq!(gb.read(registers::JOYP), 0xEF);
}

#[test]
fn test_save_round_trip() {
    let image = rom(0x03, 0x02);
    let mut gb = GameBoy::from_rom(&image, SystemConfig { skip_boot_rom: true }).unwrap();
    gb.write(0x0000, 0x0A);
    gb.write(0xA000, 0xDE);
    gb.write(0xBFFF, 0xAD);
    assert!(gb.take_ram_dirty());
    assert!(!gb.take_ram_dirty());

    let save = gb.export_ram();
    assert_eq!(save.len(), RAM_BANK_SIZE);

    let mut fresh = GameBoy::from_rom(&image, SystemConfig { skip_boot_rom: true }).unwrap();
    fresh.import_ram(&save).unwrap();
    fresh.write(0x0000, 0x0A);
    assert_eq!(fresh.read(0xA000), 0xDE);
    assert_eq!(fresh.read(0xBFFF), 0xAD);
}

#[test]
fn test_ram_kept_across_reset() {
    let mut gb = GameBoy::from_rom(&rom(0x03, 0x02), SystemConfig::default()).unwrap();
    gb.write(0x0000, 0x0A);
    gb.write(0xA100, 0x77);
    gb.reset();
    assert_eq!(gb.read(0xA100), 0xFF);
    gb.write(0x0000, 0x0A);
    assert_eq!(gb.read(0xA100), 0x77);
}

struct Collect(Rc<RefCell<String>>);

impl SerialSink for Collect {
    fn on_serial_byte(&mut self, byte: u8) {
        self.0.borrow_mut().push(byte as char);
    }
}

#[test]
fn test_serial_output() {
    let mut gb = GameBoy::from_rom(&rom(0x00, 0x00), SystemConfig::default()).unwrap();
    let out = Rc::new(RefCell::new(String::new()));
    gb.attach_serial(Box::new(Collect(out.clone())));

    for byte in "ok\n".bytes() {
        gb.write(registers::SB, byte);
    }
    assert_eq!(out.borrow().as_str(), "ok\n");
}

#[test]
fn test_word_helpers() {
    let mut gb = GameBoy::from_rom(&rom(0x00, 0x00), SystemConfig::default()).unwrap();
    gb.write_word(0xC000, 0xCAFE).unwrap();
    assert_eq!(gb.read(0xC000), 0xFE);
    assert_eq!(gb.read_word(0xC000), Ok(0xCAFE));
    assert!(gb.read_word(0xFFFF).is_err());
    assert_eq!(gb.bus().read_byte_checked(0xC001), Ok(0xCA));
}
