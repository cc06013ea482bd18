//! GB Core - DMG memory management unit
//!
//! The CPU-visible address space of a DMG Game Boy: cartridge bank
//! controllers, the boot image overlay, work/high RAM, OAM DMA and dispatch
//! of the I/O registers to the pixel pipeline, timer, interrupt controller
//! and joypad. The instruction core and renderer live outside this crate.

#![forbid(unsafe_code)]

/// Boot program image and overlay
pub mod boot;
/// Address space dispatch
pub mod bus;
/// Cartridge header and type table
pub mod cartridge;
/// Interrupt request/enable registers
pub mod interrupt;
/// Joypad matrix
pub mod joypad;
/// Memory bank controllers
pub mod mbc;
/// Peripheral register interfaces
pub mod peripherals;
/// Pixel pipeline register file
pub mod ppu;
/// I/O register addresses and unused-bit masks
pub mod registers;
/// Complete system wiring
pub mod system;
/// Divider and counter timer
pub mod timer;

pub use boot::{BootOverlay, BootOverlayState, BOOT_ROM};
pub use bus::{AddressSpace, BusError};
pub use cartridge::{Capabilities, Cartridge, CartridgeDescriptor, CartridgeError, CartridgeHeader, ControllerKind};
pub use interrupt::InterruptController;
pub use joypad::{Button, Joypad};
pub use mbc::{create_controller, BankController, BankingMode, Mbc1, RomOnly, OPEN_BUS};
pub use peripherals::{
    decode_palette, InterruptLines, JoypadPort, Palette, PaletteId, PixelPipeline, SerialSink, Shade,
    TimerRegisters,
};
pub use ppu::Ppu;
pub use system::{GameBoy, SystemConfig};
pub use timer::Timer;
