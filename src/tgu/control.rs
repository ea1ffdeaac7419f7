//! Text control surface: one named get/set pair per existing slot, plus the
//! `enable_tgu` and `reset_tgu` controls.
//!
//! Controls are generated from the discovered [`Capabilities`], so slots
//! beyond the unit's capacity never appear. Values are shown as hexadecimal
//! and parsed with C-style base detection (`0x` hex, leading `0` octal,
//! decimal otherwise), optionally followed by one newline.

use core::fmt::Write;

use heapless::{String, Vec};

use crate::tgu::{
    caps::Capabilities,
    device::TguDevice,
    error::TguError,
    regs::RegisterBlock,
    types::{OperationKind, Slot},
};

/// Capacity of a control name; the longest is `step7_condition_select/reg17`.
pub const NAME_CAPACITY: usize = 40;
/// Capacity of a shown value; the longest is `0xffffffff\n`.
pub const TEXT_CAPACITY: usize = 16;

pub const ENABLE_CONTROL: &str = "enable_tgu";
pub const RESET_CONTROL: &str = "reset_tgu";

pub type ControlName = String<NAME_CAPACITY>;
pub type ControlText = String<TEXT_CAPACITY>;

/// A single register control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Control {
    pub slot: Slot,
}

impl Control {
    /// Group the control belongs to, e.g. `step0_priority1`.
    pub fn group(&self) -> ControlName {
        let mut name = ControlName::new();
        // capacity covers every group name
        let _ = write!(name, "step{}_{}", self.slot.step, self.slot.kind.name());
        name
    }

    /// Full control name, e.g. `step0_priority1/reg3`.
    pub fn name(&self) -> ControlName {
        let mut name = self.group();
        let _ = write!(name, "/reg{}", self.slot.reg);
        name
    }

    /// Formats the staged value as `0x<hex>\n`.
    pub fn show<R, const PC: usize, const CC: usize>(
        &self,
        tgu: &TguDevice<R, PC, CC>,
    ) -> Result<ControlText, TguError>
    where
        R: RegisterBlock,
    {
        let value = tgu.read(self.slot)?;
        let mut text = ControlText::new();
        let _ = writeln!(text, "{value:#x}");
        Ok(text)
    }

    /// Parses `input` and stages it. Malformed input never reaches the shadow image.
    pub fn store<R, const PC: usize, const CC: usize>(
        &self,
        tgu: &TguDevice<R, PC, CC>,
        input: &str,
    ) -> Result<(), TguError>
    where
        R: RegisterBlock,
    {
        let value = parse_u32(input)?;
        tgu.write(self.slot, value)
    }
}

/// Every control a unit exposes, derived once from its capabilities.
#[derive(Debug, Clone)]
pub struct ControlTable {
    steps: usize,
    banks: Vec<(OperationKind, usize), 8>,
}

impl ControlTable {
    pub fn new(caps: &Capabilities) -> Self {
        let mut banks = Vec::new();
        for kind in OperationKind::ALL {
            let width = caps.width(kind);
            if caps.max_steps > 0 && width > 0 {
                // at most one entry per kind
                let _ = banks.push((kind, width));
            }
        }

        Self {
            steps: caps.max_steps,
            banks,
        }
    }

    /// `(kind, registers per step)` for every bank with at least one slot.
    pub fn banks(&self) -> &[(OperationKind, usize)] {
        &self.banks
    }

    /// Controls grouped by step, then bank, then register.
    pub fn iter(&self) -> impl Iterator<Item = Control> + '_ {
        (0..self.steps).flat_map(move |step| {
            self.banks.iter().flat_map(move |&(kind, width)| {
                (0..width).map(move |reg| Control {
                    slot: Slot::new(step, kind, reg),
                })
            })
        })
    }

    pub fn len(&self) -> usize {
        self.steps * self.banks.iter().map(|&(_, width)| width).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if `slot` is exposed.
    pub fn contains(&self, slot: Slot) -> bool {
        slot.step < self.steps
            && self
                .banks
                .iter()
                .any(|&(kind, width)| kind == slot.kind && slot.reg < width)
    }

    /// Looks a control up by its full name.
    pub fn find(&self, name: &str) -> Option<Control> {
        self.iter().find(|control| control.name() == name)
    }
}

/// Shows the armed state as `0\n` or `1\n`.
pub fn show_enable<R, const PC: usize, const CC: usize>(tgu: &TguDevice<R, PC, CC>) -> ControlText
where
    R: RegisterBlock,
{
    let mut text = ControlText::new();
    let _ = writeln!(text, "{}", u8::from(tgu.is_enabled()));
    text
}

/// Arms the unit for a non-zero value, disarms it for zero.
pub fn store_enable<R, const PC: usize, const CC: usize>(
    tgu: &TguDevice<R, PC, CC>,
    input: &str,
) -> Result<(), TguError>
where
    R: RegisterBlock,
{
    if parse_u32(input)? != 0 {
        tgu.enable()
    } else {
        tgu.disable();
        Ok(())
    }
}

/// Resets the unit for a non-zero value; zero is accepted and ignored.
pub fn store_reset<R, const PC: usize, const CC: usize>(
    tgu: &TguDevice<R, PC, CC>,
    input: &str,
) -> Result<(), TguError>
where
    R: RegisterBlock,
{
    if parse_u32(input)? != 0 {
        tgu.reset();
    }
    Ok(())
}

/// Parses an unsigned 32-bit value with C-style base detection.
///
/// # Example
/// ```
/// use coresight_tgu::tgu::control::parse_u32;
///
/// assert_eq!(parse_u32("0x1f\n"), Ok(0x1f));
/// assert_eq!(parse_u32("017"), Ok(0o17));
/// assert_eq!(parse_u32("42"), Ok(42));
/// assert!(parse_u32("0x").is_err());
/// ```
pub fn parse_u32(input: &str) -> Result<u32, TguError> {
    let text = input.strip_suffix('\n').unwrap_or(input);
    let text = text.strip_prefix('+').unwrap_or(text);

    let (digits, radix) = if let Some(hex) = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
    {
        (hex, 16)
    } else if text.len() > 1 && text.starts_with('0') {
        (&text[1..], 8)
    } else {
        (text, 10)
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(TguError::Parse);
    }
    u32::from_str_radix(digits, radix).map_err(|_| TguError::Parse)
}
