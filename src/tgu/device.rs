//! The device handle: shadow image, armed state and register block under
//! one lock.

use core::cell::RefCell;

use bitmaps::Bitmap;
use critical_section::Mutex;
use log::{info, warn};

use crate::tgu::{
    caps::{Capabilities, discover},
    commit,
    error::TguError,
    layout::{self, MAX_CONDITION_SELECT, MAX_REGISTERS, MAX_STEPS},
    regs::RegisterBlock,
    table::ShadowTable,
    types::{MAX_PRIORITY, Slot},
    view::ConfigView,
};

/// Priority-array capacity that covers the full register map.
pub const DEFAULT_PRIORITY_WORDS: usize = MAX_PRIORITY * MAX_STEPS * MAX_REGISTERS;
/// Per-bank capacity that covers the widest single-row bank.
pub const DEFAULT_BANK_WORDS: usize = MAX_STEPS * MAX_CONDITION_SELECT;

/// Device sized for any unit the register map can describe.
pub type DefaultTgu<R> = TguDevice<R, DEFAULT_PRIORITY_WORDS, DEFAULT_BANK_WORDS>;

struct Inner<R, const PC: usize, const CC: usize> {
    regs: R,
    table: ShadowTable<PC, CC>,
    armed: bool,
}

/// One Trigger Generation Unit: its capabilities, shadow image and armed state.
///
/// All state lives behind a single critical-section lock. Every method
/// holds it for a bounded number of register accesses and never re-enters
/// it. Calling back into the device from inside a
/// [`with_config`](Self::with_config) closure makes the fallible methods
/// return [`TguError::Busy`]; see that method for the rest.
///
/// # Const Generics
/// - `PC`: capacity of the shared priority array in words
/// - `CC`: capacity of each condition/timer/counter array in words
pub struct TguDevice<R, const PC: usize, const CC: usize>
where
    R: RegisterBlock,
{
    caps: Capabilities,
    inner: Mutex<RefCell<Inner<R, PC, CC>>>,
}

impl<R, const PC: usize, const CC: usize> core::fmt::Debug for TguDevice<R, PC, CC>
where
    R: RegisterBlock,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TguDevice")
            .field("caps", &self.caps)
            .finish_non_exhaustive()
    }
}

impl<R, const PC: usize, const CC: usize> TguDevice<R, PC, CC>
where
    R: RegisterBlock,
{
    /// Discovers the unit's capabilities and allocates its shadow image.
    ///
    /// # Errors
    /// * [`TguError::StoreFull`] - if the discovered capacities exceed `PC`/`CC`
    pub fn attach(regs: R) -> Result<Self, TguError> {
        let caps = discover(&regs);
        Self::with_capabilities(regs, caps)
    }

    /// Builds a device from already known capabilities.
    ///
    /// # Errors
    /// * [`TguError::StoreFull`] - if `caps` exceed `PC`/`CC`
    pub fn with_capabilities(regs: R, caps: Capabilities) -> Result<Self, TguError> {
        let table = ShadowTable::new(caps)?;
        let caps = *table.caps();

        Ok(Self {
            caps,
            inner: Mutex::new(RefCell::new(Inner {
                regs,
                table,
                armed: false,
            })),
        })
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    /// Returns true if `slot` exists on this unit and should be exposed.
    pub fn is_visible(&self, slot: Slot) -> bool {
        layout::is_valid(&self.caps, slot)
    }

    /// Reads the staged value of `slot`.
    ///
    /// # Errors
    /// * [`TguError::Unsupported`] - if the slot fails the capability gate
    /// * [`TguError::Busy`] - if called from inside [`with_config`](Self::with_config)
    pub fn read(&self, slot: Slot) -> Result<u32, TguError> {
        self.try_with_inner(|inner| inner.table.read(slot))
    }

    /// Stages `value` for `slot`. Hardware is only updated by [`enable`](Self::enable).
    ///
    /// # Errors
    /// * [`TguError::Unsupported`] - if the slot fails the capability gate
    /// * [`TguError::Busy`] - if called from inside [`with_config`](Self::with_config)
    pub fn write(&self, slot: Slot, value: u32) -> Result<(), TguError> {
        self.try_with_inner(|inner| inner.table.write(slot, value))
    }

    /// Runs `f` with the shadow image under one lock acquisition.
    ///
    /// Use the [`ConfigView`] passed to `f` rather than the device itself:
    /// nested [`read`](Self::read), [`write`](Self::write) and
    /// [`enable`](Self::enable) calls fail with [`TguError::Busy`].
    ///
    /// # Panics
    /// Panics if `f` calls [`disable`](Self::disable), [`reset`](Self::reset),
    /// [`is_enabled`](Self::is_enabled), the pending queries or another
    /// `with_config` on the same device, or if it is itself called from
    /// inside such a closure.
    pub fn with_config<T>(&self, f: impl FnOnce(&mut ConfigView<'_, PC, CC>) -> T) -> T {
        self.with_inner(|inner| {
            let mut view = ConfigView::new(&mut inner.table);
            f(&mut view)
        })
    }

    /// Commits the shadow image and arms the unit.
    ///
    /// # Errors
    /// * [`TguError::Busy`] - if the unit is already armed, or if called from
    ///   inside [`with_config`](Self::with_config); nothing is written
    /// * [`TguError::Unsupported`] - if the replay hit an invalid slot; the
    ///   unit stays disarmed
    pub fn enable(&self) -> Result<(), TguError> {
        let count = self.try_with_inner(|inner| {
            if inner.armed {
                return Err(TguError::Busy);
            }
            let count = commit::replay(&mut inner.regs, &inner.table)?;
            inner.table.clear_pending();
            inner.armed = true;
            Ok(count)
        })?;

        info!("tgu: enabled, {count} registers committed");
        Ok(())
    }

    /// Disarms the unit. Does nothing if it is not armed.
    ///
    /// The shadow image is kept, so a later [`enable`](Self::enable)
    /// restores the same configuration.
    pub fn disable(&self) {
        let disarmed = self.with_inner(|inner| {
            if !inner.armed {
                return false;
            }
            commit::disarm(&mut inner.regs);
            inner.armed = false;
            true
        });

        if disarmed {
            info!("tgu: disabled");
        }
    }

    /// Returns true while hardware holds a committed image and is armed.
    pub fn is_enabled(&self) -> bool {
        self.with_inner(|inner| inner.armed)
    }

    /// Disarms the unit if needed and zeroes the whole shadow image.
    pub fn reset(&self) {
        let disarmed = self.with_inner(|inner| {
            let was_armed = inner.armed;
            if was_armed {
                commit::disarm(&mut inner.regs);
                inner.armed = false;
            }
            inner.table.clear();
            was_armed
        });

        info!("tgu: reset{}", if disarmed { ", disabled" } else { "" });
    }

    /// Steps whose staged values have not been committed yet.
    pub fn pending_steps(&self) -> Bitmap<MAX_STEPS> {
        self.with_inner(|inner| inner.table.pending_steps())
    }

    /// Returns true if any staged value differs from the last commit.
    pub fn has_pending(&self) -> bool {
        self.with_inner(|inner| inner.table.any_pending())
    }

    /// Tears the device down and hands back its register block.
    ///
    /// Callers disable the unit first; an armed unit is left armed.
    pub fn into_registers(self) -> R {
        let inner = self.inner.into_inner().into_inner();
        if inner.armed {
            warn!("tgu: released while enabled");
        }
        inner.regs
    }

    #[cfg(test)]
    pub(crate) fn with_registers<T>(&self, f: impl FnOnce(&mut R) -> T) -> T {
        self.with_inner(|inner| f(&mut inner.regs))
    }

    fn with_inner<T>(&self, f: impl FnOnce(&mut Inner<R, PC, CC>) -> T) -> T {
        critical_section::with(|cs| f(&mut *self.inner.borrow_ref_mut(cs)))
    }

    fn try_with_inner<T>(
        &self,
        f: impl FnOnce(&mut Inner<R, PC, CC>) -> Result<T, TguError>,
    ) -> Result<T, TguError> {
        critical_section::with(|cs| {
            let mut inner = self
                .inner
                .borrow(cs)
                .try_borrow_mut()
                .map_err(|_| TguError::Busy)?;
            f(&mut *inner)
        })
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::tgu::{
        caps::DevId2,
        layout::{CONTROL, hw_offset},
        test_support::{
            Access, RecordingRegisters, TestDevice, devid, devid2, full_caps, test_device,
        },
        types::OperationKind,
    };

    const P0: OperationKind = OperationKind::Priority0;

    #[test]
    fn attach_discovers_and_starts_disabled() {
        let regs = RecordingRegisters::new(devid(144, 8, 4), devid2(8, 8, 8, 8));
        let tgu = TestDevice::attach(regs).unwrap();

        assert_eq!(*tgu.capabilities(), full_caps());
        assert!(!tgu.is_enabled());
        assert!(!tgu.has_pending());
        assert!(tgu.with_registers(|regs| regs.log().is_empty()));
    }

    #[test]
    fn attach_fails_when_store_is_too_small() {
        type Small = TguDevice<RecordingRegisters, 16, 4>;
        let regs = RecordingRegisters::new(devid(144, 8, 4), DevId2(0));
        assert_eq!(Small::attach(regs).err(), Some(TguError::StoreFull));
    }

    #[test]
    fn write_read_round_trip_without_arming() {
        let tgu = test_device(full_caps());
        for kind in OperationKind::ALL {
            for value in [0, 1, 0x8000_0000, u32::MAX] {
                let slot = Slot::new(7, kind, 1);
                tgu.write(slot, value).unwrap();
                assert_eq!(tgu.read(slot), Ok(value));
            }
        }
        assert!(!tgu.is_enabled());
        assert!(tgu.with_registers(|regs| regs.log().is_empty()));
    }

    #[test]
    fn invalid_slots_are_unsupported() {
        let tgu = test_device(Capabilities::priority_only(2, 2));
        let slot = Slot::new(0, OperationKind::Timer, 0);
        assert!(!tgu.is_visible(slot));
        assert_eq!(tgu.read(slot), Err(TguError::Unsupported));
        assert_eq!(tgu.write(slot, 1), Err(TguError::Unsupported));
        assert_eq!(tgu.write(Slot::new(0, P0, 2), 1), Err(TguError::Unsupported));
    }

    #[test]
    fn enable_commits_in_order_then_arms() {
        let caps = Capabilities::priority_only(2, 2);
        let tgu = test_device(caps);
        tgu.write(Slot::new(0, P0, 0), 0xAA).unwrap();
        tgu.write(Slot::new(0, P0, 1), 0xBB).unwrap();
        tgu.write(Slot::new(1, P0, 0), 0xCC).unwrap();
        tgu.write(Slot::new(1, P0, 1), 0xDD).unwrap();

        tgu.enable().unwrap();
        assert!(tgu.is_enabled());

        let off = |step, reg| hw_offset(&caps, Slot::new(step, P0, reg)).unwrap();
        tgu.with_registers(|regs| {
            let p0_writes: std::vec::Vec<(u32, u32)> = regs
                .slot_writes()
                .iter()
                .copied()
                .filter(|&(_, value)| value != 0)
                .collect();
            assert_eq!(regs.slot_writes().len(), 16);
            assert_eq!(
                p0_writes,
                [
                    (off(0, 0), 0xAA),
                    (off(0, 1), 0xBB),
                    (off(1, 0), 0xCC),
                    (off(1, 1), 0xDD),
                ]
            );
            assert_eq!(regs.control_writes().as_slice(), &[1]);
            assert_eq!(regs.log().first(), Some(&Access::Unlock));
            assert_eq!(regs.log().last(), Some(&Access::Lock));
            regs.clear_log();
        });

        tgu.disable();
        assert!(!tgu.is_enabled());
        tgu.with_registers(|regs| {
            assert_eq!(
                regs.log(),
                &[
                    Access::Unlock,
                    Access::Write { offset: CONTROL, value: 0 },
                    Access::Lock
                ]
            );
        });
    }

    #[test]
    fn priority_only_unit_commits_exactly_its_slots() {
        let tgu = test_device(Capabilities::priority_only(2, 2));
        tgu.write(Slot::new(0, P0, 0), 0xAA).unwrap();
        tgu.enable().unwrap();

        tgu.with_registers(|regs| {
            // 2 steps * 4 priorities * 2 registers
            assert_eq!(regs.slot_writes().len(), 16);
            assert_eq!(regs.slot_writes()[0], (0x74, 0xAA));
        });
    }

    #[test]
    fn double_enable_is_busy_and_changes_nothing() {
        let tgu = test_device(Capabilities::priority_only(1, 1));
        tgu.write(Slot::new(0, P0, 0), 7).unwrap();
        tgu.enable().unwrap();
        tgu.with_registers(|regs| regs.clear_log());

        assert_eq!(tgu.enable(), Err(TguError::Busy));
        assert!(tgu.is_enabled());
        assert_eq!(tgu.read(Slot::new(0, P0, 0)), Ok(7));
        assert!(tgu.with_registers(|regs| regs.log().is_empty()));
    }

    #[test]
    fn disable_when_disabled_is_a_no_op() {
        let tgu = test_device(full_caps());
        tgu.disable();
        tgu.disable();
        assert!(!tgu.is_enabled());
        assert!(tgu.with_registers(|regs| regs.log().is_empty()));
    }

    #[test]
    fn re_enable_replays_the_kept_image() {
        let tgu = test_device(Capabilities::priority_only(1, 1));
        tgu.write(Slot::new(0, P0, 0), 0x5A).unwrap();
        tgu.enable().unwrap();
        tgu.disable();
        tgu.with_registers(|regs| regs.clear_log());

        tgu.enable().unwrap();
        tgu.with_registers(|regs| {
            assert_eq!(regs.slot_writes()[0], (0x74, 0x5A));
            assert_eq!(regs.control_writes().as_slice(), &[1]);
        });
    }

    #[test]
    fn empty_unit_still_arms() {
        let tgu = TestDevice::attach(RecordingRegisters::empty()).unwrap();
        for kind in OperationKind::ALL {
            assert!(!tgu.is_visible(Slot::new(0, kind, 0)));
        }

        tgu.enable().unwrap();
        assert!(tgu.is_enabled());
        tgu.with_registers(|regs| {
            assert!(regs.slot_writes().is_empty());
            assert_eq!(regs.control_writes().as_slice(), &[1]);
        });
    }

    #[test]
    fn discovered_steps_without_sense_inputs_commit_nothing() {
        let regs = RecordingRegisters::new(devid(0, 4, 0), devid2(8, 0, 8, 0));
        let tgu = TestDevice::attach(regs).unwrap();

        for step in 0..4 {
            for kind in OperationKind::ALL {
                assert!(!tgu.is_visible(Slot::new(step, kind, 0)));
            }
        }
        assert_eq!(
            tgu.write(Slot::new(0, OperationKind::ConditionSelect, 0), 1),
            Err(TguError::Unsupported)
        );

        tgu.enable().unwrap();
        tgu.with_registers(|regs| {
            assert!(regs.slot_writes().is_empty());
            assert_eq!(regs.control_writes().as_slice(), &[1]);
        });
    }

    #[test]
    fn nested_calls_inside_with_config_are_busy() {
        let tgu = test_device(Capabilities::priority_only(1, 1));
        let slot = Slot::new(0, P0, 0);

        let nested = tgu.with_config(|cfg| {
            cfg.write(slot, 3).unwrap();
            (tgu.read(slot), tgu.write(slot, 9), tgu.enable())
        });
        assert_eq!(
            nested,
            (Err(TguError::Busy), Err(TguError::Busy), Err(TguError::Busy))
        );

        assert!(!tgu.is_enabled());
        assert_eq!(tgu.read(slot), Ok(3));
        assert!(tgu.with_registers(|regs| regs.log().is_empty()));
    }

    #[test]
    fn zero_registers_hides_priority_slots() {
        let tgu = test_device(Capabilities::priority_only(4, 0));
        assert_eq!(tgu.write(Slot::new(0, P0, 0), 1), Err(TguError::Unsupported));
        tgu.enable().unwrap();
        tgu.with_registers(|regs| assert!(regs.slot_writes().is_empty()));
    }

    #[test]
    fn pending_tracks_uncommitted_steps() {
        let tgu = test_device(full_caps());
        tgu.write(Slot::new(3, OperationKind::Counter, 1), 9).unwrap();
        assert!(tgu.has_pending());
        assert!(tgu.pending_steps().get(3));

        tgu.enable().unwrap();
        assert!(!tgu.has_pending());

        // staging while armed is allowed and waits for the next commit
        tgu.write(Slot::new(4, OperationKind::Timer, 0), 1).unwrap();
        assert!(tgu.pending_steps().get(4));
    }

    #[test]
    fn reset_disarms_and_zeroes() {
        let tgu = test_device(full_caps());
        tgu.write(Slot::new(1, OperationKind::ConditionSelect, 4), 3).unwrap();
        tgu.enable().unwrap();
        tgu.with_registers(|regs| regs.clear_log());

        tgu.reset();
        assert!(!tgu.is_enabled());
        assert_eq!(tgu.read(Slot::new(1, OperationKind::ConditionSelect, 4)), Ok(0));
        tgu.with_registers(|regs| {
            assert_eq!(regs.control_writes().as_slice(), &[0]);
        });

        // reset of a disarmed unit touches no registers
        tgu.with_registers(|regs| regs.clear_log());
        tgu.reset();
        assert!(tgu.with_registers(|regs| regs.log().is_empty()));
    }

    #[test]
    fn concurrent_writers_are_serialized() {
        let tgu = test_device(full_caps());
        std::thread::scope(|s| {
            for step in 0..MAX_STEPS {
                let tgu = &tgu;
                s.spawn(move || {
                    for reg in 0..MAX_REGISTERS {
                        for kind in OperationKind::PRIORITIES {
                            let value = (step * 100 + reg) as u32;
                            tgu.write(Slot::new(step, kind, reg), value).unwrap();
                        }
                    }
                });
            }
        });

        for step in 0..MAX_STEPS {
            for reg in 0..MAX_REGISTERS {
                assert_eq!(
                    tgu.read(Slot::new(step, OperationKind::Priority3, reg)),
                    Ok((step * 100 + reg) as u32)
                );
            }
        }
    }

    #[test]
    fn into_registers_returns_the_block() {
        let tgu = test_device(Capabilities::priority_only(1, 1));
        tgu.enable().unwrap();
        tgu.disable();
        let regs = tgu.into_registers();
        assert_eq!(regs.control_writes().as_slice(), &[1, 0]);
    }
}
