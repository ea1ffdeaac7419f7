//! Register map and the translation between slots, shadow indices and
//! hardware offsets.
//!
//! Hardware lays out one contiguous region per step, with every bank at a
//! fixed sub-offset inside it:
//!
//! ```text
//!  offsets relative to n * 0x1D8 for step n
//!  ┌──────────────────────┐ +0x218 (next step's timers)
//!  │ priority[3]          │ +0x194
//!  │ priority[2]          │ +0x134
//!  │ priority[1]          │ +0x0D4
//!  │ priority[0]          │ +0x074
//!  │ condition select     │ +0x060
//!  │ condition decode     │ +0x050
//!  │ counters             │ +0x048
//!  │ timers               │ +0x040
//!  └──────────────────────┘
//! ```
//!
//! The shadow store instead groups values by kind. [`flat_index`] and
//! [`hw_offset`] are the only places that translate between the two layouts,
//! and both reject slots that fail [`is_valid`] before computing anything.

use crate::tgu::{
    caps::Capabilities,
    error::TguError,
    types::{OperationKind, Slot},
};

/// Master control register; bit 0 arms trigger evaluation.
pub const CONTROL: u32 = 0x000;
/// CoreSight lock access register.
pub const LAR: u32 = 0xFB0;
/// Key written to [`LAR`] to allow register writes.
pub const UNLOCK_KEY: u32 = 0xC5AC_CE55;
/// Second device configuration register.
pub const DEVID2: u32 = 0xFC0;
/// Device configuration register.
pub const DEVID: u32 = 0xFC8;
/// Size of the unit's register block in bytes.
pub const BLOCK_SIZE: u32 = 0x1000;

/// Size of one step region.
pub const STEP_STRIDE: u32 = 0x1D8;
/// Distance between consecutive priority banks.
pub const PRIORITY_STRIDE: u32 = 0x60;
/// Distance between consecutive registers of a bank.
pub const REG_STRIDE: u32 = 0x4;

pub const TIMER_BASE: u32 = 0x040;
pub const COUNTER_BASE: u32 = 0x048;
pub const CONDITION_DECODE_BASE: u32 = 0x050;
pub const CONDITION_SELECT_BASE: u32 = 0x060;
pub const PRIORITY_BASE: u32 = 0x074;

/// Largest counts the step register map can address without overlap.
pub const MAX_STEPS: usize = 8;
pub const MAX_REGISTERS: usize = 18;
pub const MAX_CONDITION_DECODE: usize = 4;
pub const MAX_CONDITION_SELECT: usize = 5;
pub const MAX_TIMERS: usize = 2;
pub const MAX_COUNTERS: usize = 2;

/// Returns true if `slot` exists on a unit with capabilities `caps`.
///
/// # Example
/// ```
/// use coresight_tgu::tgu::{Capabilities, OperationKind, Slot, layout::is_valid};
///
/// let caps = Capabilities::priority_only(2, 3);
/// assert!(is_valid(&caps, Slot::new(1, OperationKind::Priority3, 2)));
/// assert!(!is_valid(&caps, Slot::new(2, OperationKind::Priority0, 0)));
/// assert!(!is_valid(&caps, Slot::new(0, OperationKind::ConditionDecode, 0)));
/// ```
#[inline]
pub fn is_valid(caps: &Capabilities, slot: Slot) -> bool {
    slot.step < caps.max_steps && slot.reg < caps.width(slot.kind)
}

/// Index of `slot` inside the shadow array that backs its kind.
///
/// Priority banks share one array partitioned by priority level; every
/// other kind has its own `[step][reg]` array.
///
/// # Errors
/// * [`TguError::Unsupported`] - if the slot fails [`is_valid`], or the
///   index does not fit a `usize` for unclamped `caps`
pub fn flat_index(caps: &Capabilities, slot: Slot) -> Result<usize, TguError> {
    if !is_valid(caps, slot) {
        return Err(TguError::Unsupported);
    }
    checked_index(caps, slot).ok_or(TguError::Unsupported)
}

fn checked_index(caps: &Capabilities, slot: Slot) -> Option<usize> {
    // priority width is max_registers, so rows line up across all kinds
    let row = slot
        .step
        .checked_mul(caps.width(slot.kind))?
        .checked_add(slot.reg)?;
    match slot.kind.priority_level() {
        Some(level) => level
            .checked_mul(caps.max_steps)?
            .checked_mul(caps.max_registers)?
            .checked_add(row),
        None => Some(row),
    }
}

/// Hardware byte offset of `slot` from the unit's base address.
///
/// # Errors
/// * [`TguError::Unsupported`] - if the slot fails [`is_valid`], or the
///   offset does not fit a `u32` for unclamped `caps`
///
/// # Example
/// ```
/// use coresight_tgu::tgu::{Capabilities, OperationKind, Slot, layout::hw_offset};
///
/// let caps = Capabilities::priority_only(8, 18);
/// assert_eq!(hw_offset(&caps, Slot::new(0, OperationKind::Priority0, 0)), Ok(0x74));
/// assert_eq!(hw_offset(&caps, Slot::new(1, OperationKind::Priority1, 2)), Ok(0x74 + 0x60 + 0x8 + 0x1D8));
/// ```
pub fn hw_offset(caps: &Capabilities, slot: Slot) -> Result<u32, TguError> {
    if !is_valid(caps, slot) {
        return Err(TguError::Unsupported);
    }
    checked_offset(slot).ok_or(TguError::Unsupported)
}

fn checked_offset(slot: Slot) -> Option<u32> {
    let reg = u32::try_from(slot.reg).ok()?.checked_mul(REG_STRIDE)?;
    let step = u32::try_from(slot.step).ok()?.checked_mul(STEP_STRIDE)?;
    kind_base(slot.kind).checked_add(reg)?.checked_add(step)
}

/// Offset of register 0 of `kind` inside step 0.
pub const fn kind_base(kind: OperationKind) -> u32 {
    match kind {
        OperationKind::Priority0 => PRIORITY_BASE,
        OperationKind::Priority1 => PRIORITY_BASE + PRIORITY_STRIDE,
        OperationKind::Priority2 => PRIORITY_BASE + 2 * PRIORITY_STRIDE,
        OperationKind::Priority3 => PRIORITY_BASE + 3 * PRIORITY_STRIDE,
        OperationKind::ConditionDecode => CONDITION_DECODE_BASE,
        OperationKind::ConditionSelect => CONDITION_SELECT_BASE,
        OperationKind::Timer => TIMER_BASE,
        OperationKind::Counter => COUNTER_BASE,
    }
}
