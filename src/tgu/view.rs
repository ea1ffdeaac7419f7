//! Batched access to the shadow image under one lock.

use crate::tgu::{
    caps::Capabilities,
    error::TguError,
    table::ShadowTable,
    types::{OperationKind, Slot},
};

/// Generates a getter and a `set_` method for a single-row bank.
macro_rules! impl_bank_accessors {
    ($($name:ident => $kind:expr),* $(,)?) => {
        paste::paste! {
            $(
                #[doc = "Reads the staged `" $name "` register `reg` of `step`."]
                #[inline]
                pub fn $name(&self, step: usize, reg: usize) -> Result<u32, TguError> {
                    self.read(Slot::new(step, $kind, reg))
                }

                #[doc = "Stages `value` for `" $name "` register `reg` of `step`."]
                #[inline]
                pub fn [<set_ $name>](
                    &mut self,
                    step: usize,
                    reg: usize,
                    value: u32,
                ) -> Result<(), TguError> {
                    self.write(Slot::new(step, $kind, reg), value)
                }
            )*
        }
    };
}

/// Batched access to the shadow image under one lock acquisition.
///
/// Obtained from [`TguDevice::with_config`](crate::tgu::TguDevice::with_config).
/// Writes are staged only; hardware sees them on the next enable.
pub struct ConfigView<'a, const PC: usize, const CC: usize> {
    table: &'a mut ShadowTable<PC, CC>,
}

impl<'a, const PC: usize, const CC: usize> core::fmt::Debug for ConfigView<'a, PC, CC> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ConfigView").finish_non_exhaustive()
    }
}

impl<'a, const PC: usize, const CC: usize> ConfigView<'a, PC, CC> {
    pub(crate) fn new(table: &'a mut ShadowTable<PC, CC>) -> Self {
        Self { table }
    }

    pub fn capabilities(&self) -> &Capabilities {
        self.table.caps()
    }

    pub fn read(&self, slot: Slot) -> Result<u32, TguError> {
        self.table.read(slot)
    }

    pub fn write(&mut self, slot: Slot, value: u32) -> Result<(), TguError> {
        self.table.write(slot, value)
    }

    /// Reads priority bank `level` (0..=3), register `reg` of `step`.
    pub fn priority(&self, step: usize, level: usize, reg: usize) -> Result<u32, TguError> {
        let kind = OperationKind::priority(level).ok_or(TguError::Unsupported)?;
        self.read(Slot::new(step, kind, reg))
    }

    /// Stages `value` for priority bank `level` (0..=3), register `reg` of `step`.
    pub fn set_priority(
        &mut self,
        step: usize,
        level: usize,
        reg: usize,
        value: u32,
    ) -> Result<(), TguError> {
        let kind = OperationKind::priority(level).ok_or(TguError::Unsupported)?;
        self.write(Slot::new(step, kind, reg), value)
    }

    impl_bank_accessors! {
        condition_decode => OperationKind::ConditionDecode,
        condition_select => OperationKind::ConditionSelect,
        timer => OperationKind::Timer,
        counter => OperationKind::Counter,
    }
}
