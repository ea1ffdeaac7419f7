//! Shadow value store: the host-side image committed on enable.

use bitmaps::Bitmap;
use heapless::Vec;

use crate::tgu::{
    caps::Capabilities,
    error::TguError,
    layout::{MAX_STEPS, flat_index},
    types::{OperationKind, Slot},
};

/// Host-side image of every configurable register.
///
/// `PC` bounds the shared priority array, `CC` bounds each single-row bank.
pub(crate) struct ShadowTable<const PC: usize, const CC: usize> {
    caps: Capabilities,
    priority: Vec<u32, PC>,
    condition_decode: Vec<u32, CC>,
    condition_select: Vec<u32, CC>,
    timer: Vec<u32, CC>,
    counter: Vec<u32, CC>,
    pending: Bitmap<MAX_STEPS>,
}

impl<const PC: usize, const CC: usize> ShadowTable<PC, CC> {
    /// Sizes every bank from `caps` and zero-fills it.
    pub(crate) fn new(caps: Capabilities) -> Result<Self, TguError> {
        let caps = caps.clamp_to_register_map();
        let mut table = Self {
            caps,
            priority: Vec::new(),
            condition_decode: Vec::new(),
            condition_select: Vec::new(),
            timer: Vec::new(),
            counter: Vec::new(),
            pending: Bitmap::new(),
        };

        table
            .priority
            .resize(caps.words(OperationKind::Priority0), 0)
            .map_err(|_| TguError::StoreFull)?;
        for kind in [
            OperationKind::ConditionDecode,
            OperationKind::ConditionSelect,
            OperationKind::Timer,
            OperationKind::Counter,
        ] {
            let words = caps.words(kind);
            table
                .single_row_mut(kind)
                .resize(words, 0)
                .map_err(|_| TguError::StoreFull)?;
        }

        Ok(table)
    }

    #[inline]
    pub(crate) fn caps(&self) -> &Capabilities {
        &self.caps
    }

    pub(crate) fn read(&self, slot: Slot) -> Result<u32, TguError> {
        let idx = flat_index(&self.caps, slot)?;
        Ok(self.bank(slot.kind)[idx])
    }

    pub(crate) fn write(&mut self, slot: Slot, value: u32) -> Result<(), TguError> {
        let idx = flat_index(&self.caps, slot)?;
        self.bank_mut(slot.kind)[idx] = value;
        self.pending.set(slot.step, true);
        Ok(())
    }

    /// Zeroes every slot. The image now differs from any armed copy.
    pub(crate) fn clear(&mut self) {
        self.priority.iter_mut().for_each(|v| *v = 0);
        self.condition_decode.iter_mut().for_each(|v| *v = 0);
        self.condition_select.iter_mut().for_each(|v| *v = 0);
        self.timer.iter_mut().for_each(|v| *v = 0);
        self.counter.iter_mut().for_each(|v| *v = 0);
        for step in 0..self.caps.max_steps {
            self.pending.set(step, true);
        }
    }

    pub(crate) fn pending_steps(&self) -> Bitmap<MAX_STEPS> {
        self.pending
    }

    pub(crate) fn any_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub(crate) fn clear_pending(&mut self) {
        self.pending = Bitmap::new();
    }

    fn bank(&self, kind: OperationKind) -> &[u32] {
        match kind {
            OperationKind::Priority0
            | OperationKind::Priority1
            | OperationKind::Priority2
            | OperationKind::Priority3 => self.priority.as_slice(),
            OperationKind::ConditionDecode => self.condition_decode.as_slice(),
            OperationKind::ConditionSelect => self.condition_select.as_slice(),
            OperationKind::Timer => self.timer.as_slice(),
            OperationKind::Counter => self.counter.as_slice(),
        }
    }

    fn bank_mut(&mut self, kind: OperationKind) -> &mut [u32] {
        match kind {
            OperationKind::Priority0
            | OperationKind::Priority1
            | OperationKind::Priority2
            | OperationKind::Priority3 => self.priority.as_mut_slice(),
            _ => self.single_row_mut(kind).as_mut_slice(),
        }
    }

    fn single_row_mut(&mut self, kind: OperationKind) -> &mut Vec<u32, CC> {
        match kind {
            OperationKind::ConditionSelect => &mut self.condition_select,
            OperationKind::Timer => &mut self.timer,
            OperationKind::Counter => &mut self.counter,
            _ => &mut self.condition_decode,
        }
    }
}
