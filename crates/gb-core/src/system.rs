//! Game Boy system integration
//!
//! Assembles a cartridge, its bank controller and the reference peripherals
//! into one address space. The instruction core drives it from outside:
//! memory access goes through [`GameBoy::read`] / [`GameBoy::write`], and the
//! core reports reaching $0100 with [`GameBoy::left_boot_region`].

use log::debug;

use crate::boot::BootOverlayState;
use crate::bus::{AddressSpace, BusError};
use crate::cartridge::{Cartridge, CartridgeDescriptor, CartridgeError, CartridgeHeader};
use crate::interrupt::InterruptController;
use crate::joypad::{Button, Joypad};
use crate::mbc::create_controller;
use crate::peripherals::{InterruptLines, SerialSink};
use crate::ppu::Ppu;
use crate::registers::interrupt;
use crate::timer::Timer;

/// Power-on configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemConfig {
    /// Start with the boot image unmapped and the registers it would have
    /// set already in place
    pub skip_boot_rom: bool,
}

/// A DMG with a cartridge inserted
pub struct GameBoy {
    bus: AddressSpace<Ppu, Timer, InterruptController, Joypad>,
    header: CartridgeHeader,
    config: SystemConfig,
}

impl GameBoy {
    /// Load a raw ROM image and power on
    pub fn from_rom(rom_data: &[u8], config: SystemConfig) -> Result<Self, CartridgeError> {
        let cartridge = Cartridge::from_rom(rom_data)?;
        let header = cartridge.header().clone();
        let bus = AddressSpace::with_default_peripherals(create_controller(cartridge));

        let mut system = Self { bus, header, config };
        system.power_on();
        Ok(system)
    }

    /// Power cycle, keeping the cartridge and its RAM
    pub fn reset(&mut self) {
        self.bus.reset();
        *self.bus.ppu_mut() = Ppu::new();
        *self.bus.timer_mut() = Timer::new();
        *self.bus.interrupts_mut() = InterruptController::new();
        *self.bus.joypad_mut() = Joypad::new();
        self.power_on();
    }

    fn power_on(&mut self) {
        if self.config.skip_boot_rom {
            debug!("skipping boot program");
            self.bus.apply_post_boot_state();
        }
    }

    pub fn config(&self) -> SystemConfig {
        self.config
    }

    pub fn read(&self, address: u16) -> u8 {
        self.bus.read_byte(address)
    }

    pub fn write(&mut self, address: u16, value: u8) {
        self.bus.write_byte(address, value);
    }

    pub fn read_word(&self, address: u16) -> Result<u16, BusError> {
        self.bus.read_word(address)
    }

    pub fn write_word(&mut self, address: u16, value: u16) -> Result<(), BusError> {
        self.bus.write_word(address, value)
    }

    /// The instruction core has fetched from $0100
    pub fn left_boot_region(&mut self) {
        self.bus.notify_left_boot_region();
    }

    pub fn boot_state(&self) -> BootOverlayState {
        self.bus.boot_state()
    }

    /// Advance the timer by `clocks` CPU clocks, raising the timer interrupt
    /// when TIMA overflows
    pub fn tick(&mut self, clocks: u32) {
        if self.bus.timer_mut().tick(clocks) {
            self.bus.interrupts_mut().raise_interrupt(interrupt::TIMER);
        }
    }

    /// Press a button, raising the joypad interrupt if the selected row
    /// changes
    pub fn press(&mut self, button: Button) {
        if self.bus.joypad_mut().press(button) {
            self.bus.interrupts_mut().raise_interrupt(interrupt::JOYPAD);
        }
    }

    pub fn release(&mut self, button: Button) {
        self.bus.joypad_mut().release(button);
    }

    pub fn attach_serial(&mut self, sink: Box<dyn SerialSink>) {
        self.bus.attach_serial(sink);
    }

    pub fn header(&self) -> &CartridgeHeader {
        &self.header
    }

    pub fn title(&self) -> &str {
        &self.header.title
    }

    pub fn descriptor(&self) -> &'static CartridgeDescriptor {
        self.bus.cartridge().descriptor()
    }

    pub fn has_battery(&self) -> bool {
        self.bus.cartridge().has_battery()
    }

    /// Cartridge RAM contents for persisting a save
    pub fn export_ram(&self) -> Vec<u8> {
        self.bus.cartridge().export_ram()
    }

    /// Restore cartridge RAM from a save
    pub fn import_ram(&mut self, data: &[u8]) -> Result<(), CartridgeError> {
        self.bus.cartridge_mut().import_ram(data)
    }

    /// `true` once after cartridge RAM has been written
    pub fn take_ram_dirty(&mut self) -> bool {
        self.bus.cartridge_mut().take_ram_dirty()
    }

    pub fn bus(&self) -> &AddressSpace<Ppu, Timer, InterruptController, Joypad> {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut AddressSpace<Ppu, Timer, InterruptController, Joypad> {
        &mut self.bus
    }
}
