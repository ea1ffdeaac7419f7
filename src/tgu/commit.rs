//! Pushing the shadow image to hardware.
//!
//! Both sequences run with the device lock held and bracket all of their
//! register writes in a single unlock/lock pair.

use crate::tgu::{
    error::TguError,
    layout::{CONTROL, hw_offset},
    regs::RegisterBlock,
    table::ShadowTable,
    types::{OperationKind, Slot},
};

/// Replay passes in the order they reach hardware.
///
/// Each pass walks steps outermost, then its kinds, then registers, so the
/// offsets written within a pass strictly increase.
const PASSES: [&[OperationKind]; 5] = [
    &OperationKind::PRIORITIES,
    &[OperationKind::ConditionDecode],
    &[OperationKind::ConditionSelect],
    &[OperationKind::Timer],
    &[OperationKind::Counter],
];

/// Writes every slot of `table` to `regs`, then arms the unit.
///
/// On error the control register is left untouched, so hardware is never
/// armed with a partial image. Returns the number of slots written.
pub(crate) fn replay<R, const PC: usize, const CC: usize>(
    regs: &mut R,
    table: &ShadowTable<PC, CC>,
) -> Result<usize, TguError>
where
    R: RegisterBlock + ?Sized,
{
    regs.unlock();
    let result = write_slots(regs, table);
    if result.is_ok() {
        regs.write_reg(CONTROL, 1);
    }
    regs.lock();
    result
}

/// Clears the control register.
pub(crate) fn disarm<R: RegisterBlock + ?Sized>(regs: &mut R) {
    regs.unlock();
    regs.write_reg(CONTROL, 0);
    regs.lock();
}

fn write_slots<R, const PC: usize, const CC: usize>(
    regs: &mut R,
    table: &ShadowTable<PC, CC>,
) -> Result<usize, TguError>
where
    R: RegisterBlock + ?Sized,
{
    let caps = *table.caps();
    let mut count = 0;

    for kinds in PASSES {
        for step in 0..caps.max_steps {
            for &kind in kinds {
                for reg in 0..caps.width(kind) {
                    let slot = Slot::new(step, kind, reg);
                    let value = table.read(slot)?;
                    regs.write_reg(hw_offset(&caps, slot)?, value);
                    count += 1;
                }
            }
        }
    }

    Ok(count)
}
