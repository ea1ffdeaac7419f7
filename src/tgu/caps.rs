//! Capability discovery from the CoreSight identification registers.

use bitfield::bitfield;
use log::{debug, warn};

use crate::tgu::{
    layout::{
        DEVID, DEVID2, MAX_CONDITION_DECODE, MAX_CONDITION_SELECT, MAX_COUNTERS, MAX_REGISTERS,
        MAX_STEPS, MAX_TIMERS,
    },
    regs::RegisterBlock,
    types::{MAX_PRIORITY, OperationKind},
};

/// Bits of sense-input state per signal.
pub const BITS_PER_SIGNAL: usize = 4;
/// Width of one priority register in bits.
pub const REGISTER_BITS: usize = 32;

bitfield! {
    /// Device configuration register (`DEVID`, offset `0xFC8`).
    #[derive(Clone, Copy, Default, PartialEq, Eq)]
    pub struct DevId(u32);
    impl Debug;

    /// Number of sense inputs monitored by each priority row.
    pub u8, sense_inputs, set_sense_inputs: 17, 10;
    /// Number of programmable steps.
    pub u8, steps, set_steps: 6, 3;
    /// Number of condition-decode registers per step.
    pub u8, conditions, set_conditions: 2, 0;
}

bitfield! {
    /// Second device configuration register (`DEVID2`, offset `0xFC0`).
    ///
    /// Each non-zero field reports the width of one implemented timer or counter.
    #[derive(Clone, Copy, Default, PartialEq, Eq)]
    pub struct DevId2(u32);
    impl Debug;

    pub u8, timer0, set_timer0: 23, 18;
    pub u8, timer1, set_timer1: 17, 13;
    pub u8, counter0, set_counter0: 11, 6;
    pub u8, counter1, set_counter1: 5, 0;
}

/// Slot counts discovered from the hardware, fixed for the device lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Sense-input registers per priority row.
    pub max_registers: usize,
    pub max_steps: usize,
    pub max_condition_decode: usize,
    pub max_condition_select: usize,
    pub max_timers: usize,
    pub max_counters: usize,
}

impl Capabilities {
    /// Capabilities of a unit that only implements the priority banks.
    pub const fn priority_only(max_steps: usize, max_registers: usize) -> Self {
        Self {
            max_registers,
            max_steps,
            max_condition_decode: 0,
            max_condition_select: 0,
            max_timers: 0,
            max_counters: 0,
        }
    }

    /// Decodes raw identification register values.
    ///
    /// The result is not clamped to the register map; see
    /// [`clamp_to_register_map`](Self::clamp_to_register_map).
    pub fn from_ids(devid: DevId, devid2: DevId2) -> Self {
        let sense_bits = devid.sense_inputs() as usize * BITS_PER_SIGNAL;
        let conditions = devid.conditions() as usize;

        Self {
            max_registers: sense_bits.div_ceil(REGISTER_BITS),
            max_steps: devid.steps() as usize,
            max_condition_decode: conditions,
            // select bank carries one extra default register
            max_condition_select: conditions + 1,
            max_timers: implemented(devid2.timer0()) + implemented(devid2.timer1()),
            max_counters: implemented(devid2.counter0()) + implemented(devid2.counter1()),
        }
    }

    /// Number of registers per step for `kind`.
    pub fn width(&self, kind: OperationKind) -> usize {
        match kind {
            OperationKind::Priority0
            | OperationKind::Priority1
            | OperationKind::Priority2
            | OperationKind::Priority3 => self.max_registers,
            OperationKind::ConditionDecode => self.max_condition_decode,
            OperationKind::ConditionSelect => self.max_condition_select,
            OperationKind::Timer => self.max_timers,
            OperationKind::Counter => self.max_counters,
        }
    }

    /// Length of the shadow array backing `kind`.
    ///
    /// All four priority banks share one array, so every priority kind
    /// reports the size of the whole shared array.
    pub fn words(&self, kind: OperationKind) -> usize {
        if kind.is_priority() {
            MAX_PRIORITY * self.max_steps * self.max_registers
        } else {
            self.max_steps * self.width(kind)
        }
    }

    /// Returns true if no slot of any kind is usable.
    pub fn is_empty(&self) -> bool {
        self.max_steps == 0
            || OperationKind::ALL
                .iter()
                .all(|&kind| self.width(kind) == 0)
    }

    /// Limits every count to what the step register map can address.
    ///
    /// Larger values would make a step's registers alias the next step region.
    pub fn clamp_to_register_map(self) -> Self {
        let clamped = Self {
            max_registers: self.max_registers.min(MAX_REGISTERS),
            max_steps: self.max_steps.min(MAX_STEPS),
            max_condition_decode: self.max_condition_decode.min(MAX_CONDITION_DECODE),
            max_condition_select: self.max_condition_select.min(MAX_CONDITION_SELECT),
            max_timers: self.max_timers.min(MAX_TIMERS),
            max_counters: self.max_counters.min(MAX_COUNTERS),
        };
        if clamped != self {
            warn!("tgu: capabilities {self:?} exceed the register map, clamped to {clamped:?}");
        }
        clamped
    }
}

#[inline]
fn implemented(width: u8) -> usize {
    usize::from(width != 0)
}

/// Reads `DEVID`/`DEVID2` and derives the unit's capabilities.
///
/// Never fails: a unit reporting no steps or no sense inputs yields
/// [`Capabilities::default`], which leaves every slot of every kind hidden.
pub fn discover<R: RegisterBlock + ?Sized>(regs: &R) -> Capabilities {
    let devid = DevId(regs.read_reg(DEVID));
    let devid2 = DevId2(regs.read_reg(DEVID2));
    let caps = Capabilities::from_ids(devid, devid2).clamp_to_register_map();

    debug!("tgu: {devid:?} {devid2:?} -> {caps:?}");
    if caps.max_steps == 0 || caps.max_registers == 0 {
        warn!("tgu: identification reports no usable steps or sense inputs ({devid:?})");
        return Capabilities::default();
    }
    caps
}
