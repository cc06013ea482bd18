//! Power-on boot overlay
//!
//! While the boot program runs, the first 256 bytes of the address space are
//! served from an internal image instead of the cartridge. The instruction
//! core tells the memory unit when execution first reaches $0100; from then
//! on the overlay is gone until the next reset.

/// Size of the boot image in bytes
pub const BOOT_ROM_SIZE: usize = 0x100;

/// First address that is never shadowed by the overlay
pub const BOOT_REGION_END: u16 = 0x0100;

/// The DMG boot program.
pub const BOOT_ROM: [u8; BOOT_ROM_SIZE] = [
    0x31, 0xFE, 0xFF, 0xAF, 0x21, 0xFF, 0x9F, 0x32, 0xCB, 0x7C, 0x20, 0xFB, 0x21, 0x26, 0xFF, 0x0E,
    0x11, 0x3E, 0x80, 0x32, 0xE2, 0x0C, 0x3E, 0xF3, 0xE2, 0x32, 0x3E, 0x77, 0x77, 0x3E, 0xFC, 0xE0,
    0x47, 0x11, 0x04, 0x01, 0x21, 0x10, 0x80, 0x1A, 0xCD, 0x95, 0x00, 0xCD, 0x96, 0x00, 0x13, 0x7B,
    0xFE, 0x34, 0x20, 0xF3, 0x11, 0xD8, 0x00, 0x06, 0x08, 0x1A, 0x13, 0x22, 0x23, 0x05, 0x20, 0xF9,
    0x3E, 0x19, 0xEA, 0x10, 0x99, 0x21, 0x2F, 0x99, 0x0E, 0x0C, 0x3D, 0x28, 0x08, 0x32, 0x0D, 0x20,
    0xF9, 0x2E, 0x0F, 0x18, 0xF3, 0x67, 0x3E, 0x64, 0x57, 0xE0, 0x42, 0x3E, 0x91, 0xE0, 0x40, 0x04,
    0x1E, 0x02, 0x0E, 0x0C, 0xF0, 0x44, 0xFE, 0x90, 0x20, 0xFA, 0x0D, 0x20, 0xF7, 0x1D, 0x20, 0xF2,
    0x0E, 0x13, 0x24, 0x7C, 0x1E, 0x83, 0xFE, 0x62, 0x28, 0x06, 0x1E, 0xC1, 0xFE, 0x64, 0x20, 0x06,
    0x7B, 0xE2, 0x0C, 0x3E, 0x87, 0xF2, 0xF0, 0x42, 0x90, 0xE0, 0x42, 0x15, 0x20, 0xD2, 0x05, 0x20,
    0x4F, 0x16, 0x20, 0x18, 0xCB, 0x4F, 0x06, 0x04, 0xC5, 0xCB, 0x11, 0x17, 0xC1, 0xCB, 0x11, 0x17,
    0x05, 0x20, 0xF5, 0x22, 0x23, 0x22, 0x23, 0xC9, 0xCE, 0xED, 0x66, 0x66, 0xCC, 0x0D, 0x00, 0x0B,
    0x03, 0x73, 0x00, 0x83, 0x00, 0x0C, 0x00, 0x0D, 0x00, 0x08, 0x11, 0x1F, 0x88, 0x89, 0x00, 0x0E,
    0xDC, 0xCC, 0x6E, 0xE6, 0xDD, 0xDD, 0xD9, 0x99, 0xBB, 0xBB, 0x67, 0x63, 0x6E, 0x0E, 0xEC, 0xCC,
    0xDD, 0xDC, 0x99, 0x9F, 0xBB, 0xB9, 0x33, 0x3E, 0x3C, 0x42, 0xB9, 0xA5, 0xB9, 0xA5, 0x42, 0x3C,
    0x21, 0x04, 0x01, 0x11, 0xA8, 0x00, 0x1A, 0x13, 0xBE, 0x20, 0xFE, 0x23, 0x7D, 0xFE, 0x34, 0x20,
    0xF5, 0x06, 0x19, 0x78, 0x86, 0x23, 0x05, 0x20, 0xFB, 0x86, 0x20, 0xFE, 0x3E, 0x01, 0xE0, 0x50,
];

/// Offset of the logo the boot program compares against the cartridge header
pub const BOOT_LOGO_OFFSET: usize = 0xA8;

/// Length of the logo bitmap
pub const BOOT_LOGO_LEN: usize = 0x30;

/// The logo bitmap embedded in the boot image
pub fn boot_logo() -> &'static [u8] {
    &BOOT_ROM[BOOT_LOGO_OFFSET..BOOT_LOGO_OFFSET + BOOT_LOGO_LEN]
}

/// Overlay state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BootOverlayState {
    /// Boot image is mapped over $0000-$00FF
    #[default]
    Active,
    /// Cartridge is visible everywhere; terminal until reset
    Retired,
}

/// Boot overlay guarding the low address window
#[derive(Debug, Clone, Default)]
pub struct BootOverlay {
    state: BootOverlayState,
}

impl BootOverlay {
    /// Create an overlay in the `Active` state
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    pub fn state(&self) -> BootOverlayState {
        self.state
    }

    /// Whether the boot image is still mapped
    pub fn is_active(&self) -> bool {
        self.state == BootOverlayState::Active
    }

    /// Boot image byte for `address` if the overlay currently shadows it.
    ///
    /// Only $0000-$00FF is shadowed. $0100 and above always read through to
    /// the cartridge, even before the overlay is retired.
    #[inline]
    pub fn shadowed(&self, address: u16) -> Option<u8> {
        match self.state {
            BootOverlayState::Active if address < BOOT_REGION_END => {
                Some(BOOT_ROM[address as usize])
            }
            _ => None,
        }
    }

    /// Retire the overlay. Returns `true` only for the call that performed
    /// the transition.
    pub fn retire(&mut self) -> bool {
        match self.state {
            BootOverlayState::Active => {
                self.state = BootOverlayState::Retired;
                true
            }
            BootOverlayState::Retired => false,
        }
    }

    /// Re-arm the overlay (power cycle)
    pub fn reset(&mut self) {
        self.state = BootOverlayState::Active;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boot_rom_endpoints() {
        assert_eq!(BOOT_ROM[0x00], 0x31);
        assert_eq!(BOOT_ROM[0xFC], 0x3E);
        assert_eq!(BOOT_ROM[0xFD], 0x01);
        assert_eq!(BOOT_ROM[0xFE], 0xE0);
        assert_eq!(BOOT_ROM[0xFF], 0x50);
    }

    #[test]
    fn test_boot_logo() {
        let logo = boot_logo();
        assert_eq!(logo.len(), 48);
        assert_eq!(&logo[..4], &[0xCE, 0xED, 0x66, 0x66]);
        assert_eq!(&logo[44..], &[0xBB, 0xB9, 0x33, 0x3E]);
    }

    #[test]
    fn test_overlay_shadows_low_window_only() {
        let overlay = BootOverlay::new();
        assert!(overlay.is_active());
        assert_eq!(overlay.shadowed(0x0000), Some(0x31));
        assert_eq!(overlay.shadowed(0x00FF), Some(0x50));
        assert_eq!(overlay.shadowed(0x0100), None);
        assert_eq!(overlay.shadowed(0x01FF), None);
    }

    #[test]
    fn test_retire_is_one_shot() {
        let mut overlay = BootOverlay::new();
        assert!(overlay.retire());
        assert!(!overlay.retire());
        assert_eq!(overlay.state(), BootOverlayState::Retired);
        assert_eq!(overlay.shadowed(0x0000), None);

        overlay.reset();
        assert_eq!(overlay.state(), BootOverlayState::Active);
    }
}
