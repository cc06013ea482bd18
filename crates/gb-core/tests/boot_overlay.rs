//! Integration tests for the boot image overlay

use gb_core::boot::{boot_logo, BOOT_LOGO_LEN, BOOT_ROM_SIZE};
use gb_core::cartridge::header_checksum;
use gb_core::{create_controller, AddressSpace, BootOverlayState, Cartridge, BOOT_ROM};

fn cartridge_rom() -> Vec<u8> {
    let mut rom: Vec<u8> = (0..0x8000usize).map(|i| (i as u8) ^ 0x5A).collect();
    rom[0x147] = 0x00;
    rom[0x148] = 0x00;
    rom[0x149] = 0x00;
    rom[0x14D] = header_checksum(&rom);
    rom
}

fn space(rom: &[u8]) -> AddressSpace {
    let cartridge = Cartridge::from_rom(rom).unwrap();
    AddressSpace::with_default_peripherals(create_controller(cartridge))
}

#[test]
fn test_overlay_shadows_low_window() {
    let rom = cartridge_rom();
    let bus = space(&rom);
    assert_eq!(bus.boot_state(), BootOverlayState::Active);

    for address in 0x0000..0x0100u16 {
        assert_eq!(bus.read_byte(address), BOOT_ROM[address as usize]);
    }
}

#[test]
fn test_cartridge_visible_above_overlay() {
    let rom = cartridge_rom();
    let bus = space(&rom);
    for address in 0x0100..0x0200u16 {
        assert_eq!(bus.read_byte(address), rom[address as usize]);
    }
}

#[test]
fn test_notification_retires_overlay() {
    let rom = cartridge_rom();
    let mut bus = space(&rom);
    bus.notify_left_boot_region();
    assert_eq!(bus.boot_state(), BootOverlayState::Retired);

    for address in 0x0000..0x0100u16 {
        assert_eq!(bus.read_byte(address), rom[address as usize]);
    }

    bus.notify_left_boot_region();
    assert_eq!(bus.boot_state(), BootOverlayState::Retired);
    assert_eq!(bus.read_byte(0x0000), rom[0]);
}

#[test]
fn test_writes_do_not_retire_overlay() {
    let rom = cartridge_rom();
    let mut bus = space(&rom);
    bus.write_byte(0x0000, 0x00);
    bus.write_byte(0x00FF, 0x01);
    bus.write_byte(0xFF50, 0x01);
    assert_eq!(bus.boot_state(), BootOverlayState::Active);
    assert_eq!(bus.read_byte(0x0000), BOOT_ROM[0]);
}

#[test]
fn test_reset_rearms_overlay() {
    let rom = cartridge_rom();
    let mut bus = space(&rom);
    bus.notify_left_boot_region();
    bus.reset();
    assert_eq!(bus.boot_state(), BootOverlayState::Active);
    assert_eq!(bus.read_byte(0x0042), BOOT_ROM[0x42]);
}

#[test]
fn test_boot_image() {
    assert_eq!(BOOT_ROM.len(), BOOT_ROM_SIZE);
    assert_eq!(&BOOT_ROM[..3], &[0x31, 0xFE, 0xFF]);
    assert_eq!(&BOOT_ROM[0xFC..], &[0x3E, 0x01, 0xE0, 0x50]);

    let logo = boot_logo();
    assert_eq!(logo.len(), BOOT_LOGO_LEN);
    assert_eq!(&logo[..4], &[0xCE, 0xED, 0x66, 0x66]);
    assert_eq!(&logo[logo.len() - 8..], &[0x3C, 0x42, 0xB9, 0xA5, 0xB9, 0xA5, 0x42, 0x3C]);
}

#[test]
fn test_logo_check() {
    let mut rom = cartridge_rom();
    assert!(!Cartridge::from_rom(&rom).unwrap().header().logo_matches);

    rom[0x104..0x134].copy_from_slice(boot_logo());
    rom[0x14D] = header_checksum(&rom);
    let cartridge = Cartridge::from_rom(&rom).unwrap();
    assert!(cartridge.header().logo_matches);
    assert!(cartridge.header().checksum_valid());
}
