//! Register block access: the seam between the device and the bus.

#![allow(unsafe_code)]

use log::warn;

use crate::tgu::layout::{BLOCK_SIZE, LAR, REG_STRIDE, UNLOCK_KEY};

/// Access to the unit's memory-mapped register block.
///
/// Offsets are byte offsets from the unit's base address. Implementations
/// must perform exactly one 32-bit access per call.
pub trait RegisterBlock {
    fn read_reg(&self, offset: u32) -> u32;

    fn write_reg(&mut self, offset: u32, value: u32);

    /// Opens the CoreSight software lock so register writes take effect.
    fn unlock(&mut self) {
        self.write_reg(LAR, UNLOCK_KEY);
    }

    /// Closes the CoreSight software lock.
    fn lock(&mut self) {
        self.write_reg(LAR, 0);
    }
}

/// Volatile access to a mapped TGU register block.
///
/// Offsets outside the [`BLOCK_SIZE`] block or not word aligned are never
/// dereferenced: reads return 0 and writes are dropped.
#[derive(Debug)]
pub struct Mmio {
    base: *mut u8,
}

impl Mmio {
    /// # Safety
    /// `base` must be word aligned and point to the start of a mapped TGU
    /// register block of [`BLOCK_SIZE`] bytes that stays mapped for the lifetime of the returned value, and nothing
    /// else may access that block while it is owned by a [`Mmio`].
    pub const unsafe fn new(base: *mut u8) -> Self {
        Self { base }
    }

    pub fn base(&self) -> *mut u8 {
        self.base
    }

    fn word(&self, offset: u32) -> Option<*mut u32> {
        if offset >= BLOCK_SIZE || offset % REG_STRIDE != 0 {
            warn!("tgu: register offset {offset:#x} outside the block");
            return None;
        }
        Some(self.base.wrapping_add(offset as usize).cast::<u32>())
    }
}

// SAFETY: `Mmio` has exclusive ownership of its register block, so moving
// it to another context cannot introduce shared access.
unsafe impl Send for Mmio {}

impl RegisterBlock for Mmio {
    fn read_reg(&self, offset: u32) -> u32 {
        match self.word(offset) {
            // SAFETY: `word` only yields aligned words inside the block that
            // `new` was given.
            Some(ptr) => unsafe { core::ptr::read_volatile(ptr) },
            None => 0,
        }
    }

    fn write_reg(&mut self, offset: u32, value: u32) {
        if let Some(ptr) = self.word(offset) {
            // SAFETY: as for `read_reg`.
            unsafe { core::ptr::write_volatile(ptr, value) }
        }
    }
}
