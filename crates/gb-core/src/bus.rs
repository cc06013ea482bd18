//! Address space dispatch
//!
//! The DMG memory map:
//! $0000-$00FF - Boot image while the overlay is active, else cartridge ROM
//! $0000-$3FFF - Cartridge ROM bank 0
//! $4000-$7FFF - Cartridge ROM, switchable bank
//! $8000-$9FFF - Video RAM (pixel pipeline)
//! $A000-$BFFF - Cartridge RAM (if present and enabled)
//! $C000-$DFFF - 8KB work RAM
//! $E000-$FDFF - Work RAM mirror
//! $FE00-$FE9F - Object attribute memory
//! $FEA0-$FEFF - Unusable, reads 0
//! $FF00-$FF7F - I/O registers
//! $FF80-$FFFE - High RAM
//! $FFFF       - Interrupt enable

use log::{debug, info, trace};
use thiserror::Error;

use crate::boot::{BootOverlay, BootOverlayState};
use crate::interrupt::InterruptController;
use crate::joypad::Joypad;
use crate::mbc::BankController;
use crate::peripherals::{
    decode_palette, InterruptLines, JoypadPort, PaletteId, PixelPipeline, SerialSink,
    TimerRegisters,
};
use crate::ppu::Ppu;
use crate::registers::{self, unused_bits, POST_BOOT_REGISTERS};
use crate::timer::Timer;

/// Work RAM size
pub const WRAM_SIZE: usize = 0x2000;
/// Object attribute memory size
pub const OAM_SIZE: usize = 0x100;
/// Bytes of OAM the hardware uses (40 sprites x 4)
pub const OAM_USED: usize = 0xA0;
/// High RAM size
pub const HRAM_SIZE: usize = 0x80;
/// Raw I/O register store size
pub const IO_SIZE: usize = 0x100;
/// Bytes copied by one OAM DMA
pub const DMA_LENGTH: u16 = 0xA0;

/// Errors raised at the checked boundary of the address space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BusError {
    #[error("address {0:#x} is outside the 16-bit bus")]
    InvalidAddress(u32),
    #[error("value {0:#x} does not fit in a byte")]
    InvalidValue(u32),
}

/// The CPU's view of memory
///
/// Owns work RAM, OAM, high RAM and the raw I/O store; the cartridge
/// controller and the four peripherals are injected at construction and
/// only reached through their traits.
pub struct AddressSpace<P = Ppu, T = Timer, I = InterruptController, J = Joypad> {
    wram: Box<[u8; WRAM_SIZE]>,
    oam: [u8; OAM_SIZE],
    hram: [u8; HRAM_SIZE],
    io: [u8; IO_SIZE],
    overlay: BootOverlay,
    cartridge: Box<dyn BankController>,
    ppu: P,
    timer: T,
    interrupts: I,
    joypad: J,
    serial: Option<Box<dyn SerialSink>>,
}

impl AddressSpace {
    /// Address space wired to the built-in peripheral models
    pub fn with_default_peripherals(cartridge: Box<dyn BankController>) -> Self {
        Self::new(
            cartridge,
            Ppu::new(),
            Timer::new(),
            InterruptController::new(),
            Joypad::new(),
        )
    }
}

impl<P, T, I, J> AddressSpace<P, T, I, J>
where
    P: PixelPipeline,
    T: TimerRegisters,
    I: InterruptLines,
    J: JoypadPort,
{
    pub fn new(cartridge: Box<dyn BankController>, ppu: P, timer: T, interrupts: I, joypad: J) -> Self {
        Self {
            wram: Box::new([0; WRAM_SIZE]),
            oam: [0; OAM_SIZE],
            hram: [0; HRAM_SIZE],
            io: [0; IO_SIZE],
            overlay: BootOverlay::new(),
            cartridge,
            ppu,
            timer,
            interrupts,
            joypad,
            serial: None,
        }
    }

    /// Attach a receiver for bytes written to SB ($FF01)
    pub fn attach_serial(&mut self, sink: Box<dyn SerialSink>) {
        self.serial = Some(sink);
    }

    /// Detach the serial receiver, handing it back
    pub fn detach_serial(&mut self) -> Option<Box<dyn SerialSink>> {
        self.serial.take()
    }

    /// Power cycle: clear owned memory, re-arm the boot overlay and reset
    /// the cartridge's banking registers
    pub fn reset(&mut self) {
        self.wram.fill(0);
        self.oam.fill(0);
        self.hram.fill(0);
        self.io.fill(0);
        self.overlay.reset();
        self.cartridge.reset();
    }

    /// Execution has reached $0100: unmap the boot image for good
    pub fn notify_left_boot_region(&mut self) {
        if self.overlay.retire() {
            info!("boot program finished, cartridge mapped at $0000");
        }
    }

    pub fn boot_state(&self) -> BootOverlayState {
        self.overlay.state()
    }

    /// Skip the boot program: retire the overlay and load the register
    /// values it would have left behind
    pub fn apply_post_boot_state(&mut self) {
        self.notify_left_boot_region();
        for &(address, value) in POST_BOOT_REGISTERS.iter() {
            self.write_byte(address, value);
        }
    }

    /// Read a byte
    pub fn read_byte(&self, address: u16) -> u8 {
        let value = match address {
            0x0000..=0x00FF => match self.overlay.shadowed(address) {
                Some(byte) => byte,
                None => self.cartridge.read_rom(address),
            },
            0x0100..=0x7FFF => self.cartridge.read_rom(address),
            0x8000..=0x9FFF => self.ppu.read_vram(address - 0x8000),
            0xA000..=0xBFFF => self.cartridge.read_ram(address),
            0xC000..=0xDFFF => self.wram[(address - 0xC000) as usize],
            0xE000..=0xFDFF => self.wram[(address - 0xE000) as usize],
            0xFE00..=0xFE9F => self.oam[(address - 0xFE00) as usize],
            0xFEA0..=0xFEFF => 0x00,
            registers::JOYP => self.joypad.keys_pressed(),
            registers::DIV => self.timer.divider(),
            registers::TIMA => self.timer.counter(),
            registers::TMA => self.timer.modulo(),
            registers::TAC => self.timer.control(),
            registers::IF => self.interrupts.raised_flags(),
            registers::LCDC => self.ppu.control(),
            registers::STAT => self.ppu.status(),
            registers::SCY => self.ppu.scroll_y(),
            registers::SCX => self.ppu.scroll_x(),
            registers::LY => self.ppu.current_line(),
            registers::LYC => self.ppu.line_compare(),
            0xFF80..=0xFFFE => self.hram[(address - 0xFF80) as usize],
            registers::IE => self.interrupts.enabled_flags(),
            0xFF01..=0xFF7F => self.io[(address & 0x00FF) as usize],
        };
        value | unused_bits(address)
    }

    /// Write a byte
    pub fn write_byte(&mut self, address: u16, value: u8) {
        match address {
            0x0000..=0x7FFF => self.cartridge.write_rom(address, value),
            0x8000..=0x9FFF => {
                self.ppu.write_vram(address - 0x8000, value);
                if address <= 0x97FF {
                    self.ppu.notify_tile_write(address);
                }
            }
            0xA000..=0xBFFF => self.cartridge.write_ram(address, value),
            0xC000..=0xDFFF => self.wram[(address - 0xC000) as usize] = value,
            0xE000..=0xFDFF => self.wram[(address - 0xE000) as usize] = value,
            0xFE00..=0xFE9F => {
                let offset = (address - 0xFE00) as u8;
                self.oam[offset as usize] = value;
                self.ppu.notify_sprite_write(offset, value);
            }
            0xFEA0..=0xFEFF => {}
            registers::JOYP => self.joypad.set_mode(value),
            registers::DIV => self.timer.clear_divider(),
            registers::TIMA => self.timer.set_counter(value),
            registers::TMA => self.timer.set_modulo(value),
            registers::TAC => self.timer.set_control(value),
            registers::IF => self.interrupts.set_raised_flags(value),
            registers::LCDC => self.ppu.set_control(value),
            registers::STAT => self.ppu.set_status(value),
            registers::SCY => self.ppu.set_scroll_y(value),
            registers::SCX => self.ppu.set_scroll_x(value),
            registers::LY => {}
            registers::LYC => self.ppu.set_line_compare(value),
            registers::DMA => {
                self.io[(address & 0x00FF) as usize] = value;
                self.oam_dma(value);
            }
            registers::BGP => self.write_palette(address, PaletteId::Background, value),
            registers::OBP0 => self.write_palette(address, PaletteId::Object0, value),
            registers::OBP1 => self.write_palette(address, PaletteId::Object1, value),
            0xFF80..=0xFFFE => self.hram[(address - 0xFF80) as usize] = value,
            registers::IE => self.interrupts.set_enabled_flags(value),
            0xFF01..=0xFF7F => {
                self.io[(address & 0x00FF) as usize] = value;
                if address == registers::SB {
                    self.serial_out(value);
                }
            }
        }
    }

    /// Read a little-endian word: low byte at `address`, high at `address + 1`
    pub fn read_word(&self, address: u16) -> Result<u16, BusError> {
        let high_address = next_address(address)?;
        let low = self.read_byte(address) as u16;
        let high = self.read_byte(high_address) as u16;
        Ok((high << 8) | low)
    }

    /// Write a little-endian word: low byte first
    pub fn write_word(&mut self, address: u16, value: u16) -> Result<(), BusError> {
        let high_address = next_address(address)?;
        self.write_byte(address, (value & 0xFF) as u8);
        self.write_byte(high_address, (value >> 8) as u8);
        Ok(())
    }

    /// Read through a wide address, rejecting anything off the 16-bit bus
    pub fn read_byte_checked(&self, address: u32) -> Result<u8, BusError> {
        Ok(self.read_byte(bus_address(address)?))
    }

    /// Write through wide operands, rejecting addresses off the bus and
    /// values wider than a byte
    pub fn write_byte_checked(&mut self, address: u32, value: u32) -> Result<(), BusError> {
        let address = bus_address(address)?;
        let value = u8::try_from(value).map_err(|_| BusError::InvalidValue(value))?;
        self.write_byte(address, value);
        Ok(())
    }

    /// Copy 160 bytes from `page << 8` into OAM.
    ///
    /// Runs to completion inside the triggering write; the source is read
    /// through the normal dispatch, so it sees banking and the overlay.
    fn oam_dma(&mut self, page: u8) {
        let source = (page as u16) << 8;
        debug!("oam dma from {:#06x}", source);
        for i in 0..DMA_LENGTH {
            let byte = self.read_byte(source.wrapping_add(i));
            self.write_byte(0xFE00 + i, byte);
        }
    }

    fn write_palette(&mut self, address: u16, id: PaletteId, value: u8) {
        self.io[(address & 0x00FF) as usize] = value;
        self.ppu.set_palette(id, decode_palette(value));
    }

    fn serial_out(&mut self, byte: u8) {
        trace!("serial: {:#04x} {:?}", byte, byte as char);
        if let Some(sink) = self.serial.as_mut() {
            sink.on_serial_byte(byte);
        }
    }

    pub fn cartridge(&self) -> &dyn BankController {
        self.cartridge.as_ref()
    }

    pub fn cartridge_mut(&mut self) -> &mut dyn BankController {
        self.cartridge.as_mut()
    }

    pub fn ppu(&self) -> &P {
        &self.ppu
    }

    pub fn ppu_mut(&mut self) -> &mut P {
        &mut self.ppu
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    pub fn interrupts(&self) -> &I {
        &self.interrupts
    }

    pub fn interrupts_mut(&mut self) -> &mut I {
        &mut self.interrupts
    }

    pub fn joypad(&self) -> &J {
        &self.joypad
    }

    pub fn joypad_mut(&mut self) -> &mut J {
        &mut self.joypad
    }
}

fn bus_address(address: u32) -> Result<u16, BusError> {
    u16::try_from(address).map_err(|_| BusError::InvalidAddress(address))
}

fn next_address(address: u16) -> Result<u16, BusError> {
    address
        .checked_add(1)
        .ok_or(BusError::InvalidAddress(address as u32 + 1))
}
