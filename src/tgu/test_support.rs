//! Test support utilities - only compiled in test builds.

use heapless::Vec;

use crate::tgu::{
    caps::{Capabilities, DevId, DevId2},
    device::TguDevice,
    layout::{
        CONTROL, DEVID, DEVID2, MAX_CONDITION_DECODE, MAX_CONDITION_SELECT, MAX_COUNTERS,
        MAX_REGISTERS, MAX_STEPS, MAX_TIMERS,
    },
    regs::RegisterBlock,
    table::ShadowTable,
    types::MAX_PRIORITY,
};

pub const TEST_PC: usize = MAX_PRIORITY * MAX_STEPS * MAX_REGISTERS;
pub const TEST_CC: usize = MAX_STEPS * MAX_CONDITION_SELECT;

/// Standard test configuration: sized for the full register map.
pub type TestTable = ShadowTable<TEST_PC, TEST_CC>;
pub type TestDevice = TguDevice<RecordingRegisters, TEST_PC, TEST_CC>;

/// Enough room for a full replay plus a few enable/disable cycles.
const LOG_CAPACITY: usize = 2048;

/// One register access observed by [`RecordingRegisters`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Unlock,
    Lock,
    Write { offset: u32, value: u32 },
}

/// Register block that answers identification reads and records every write.
pub struct RecordingRegisters {
    devid: DevId,
    devid2: DevId2,
    log: Vec<Access, LOG_CAPACITY>,
}

impl RecordingRegisters {
    pub fn new(devid: DevId, devid2: DevId2) -> Self {
        Self {
            devid,
            devid2,
            log: Vec::new(),
        }
    }

    /// Block whose identification reports no capabilities.
    pub fn empty() -> Self {
        Self::new(DevId(0), DevId2(0))
    }

    pub fn log(&self) -> &[Access] {
        &self.log
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    /// `(offset, value)` of every write except the control register.
    pub fn slot_writes(&self) -> Vec<(u32, u32), LOG_CAPACITY> {
        self.log
            .iter()
            .filter_map(|access| match *access {
                Access::Write { offset, value } if offset != CONTROL => Some((offset, value)),
                _ => None,
            })
            .collect()
    }

    /// Values written to the control register, in order.
    pub fn control_writes(&self) -> Vec<u32, LOG_CAPACITY> {
        self.log
            .iter()
            .filter_map(|access| match *access {
                Access::Write { offset, value } if offset == CONTROL => Some(value),
                _ => None,
            })
            .collect()
    }

    fn record(&mut self, access: Access) {
        self.log.push(access).expect("register log full");
    }
}

impl RegisterBlock for RecordingRegisters {
    fn read_reg(&self, offset: u32) -> u32 {
        match offset {
            DEVID => self.devid.0,
            DEVID2 => self.devid2.0,
            _ => 0,
        }
    }

    fn write_reg(&mut self, offset: u32, value: u32) {
        self.record(Access::Write { offset, value });
    }

    fn unlock(&mut self) {
        self.record(Access::Unlock);
    }

    fn lock(&mut self) {
        self.record(Access::Lock);
    }
}

/// Builds a `DEVID` value.
pub fn devid(sense_inputs: u8, steps: u8, conditions: u8) -> DevId {
    let mut id = DevId(0);
    id.set_sense_inputs(sense_inputs);
    id.set_steps(steps);
    id.set_conditions(conditions);
    id
}

/// Builds a `DEVID2` value from timer/counter widths.
pub fn devid2(timer0: u8, timer1: u8, counter0: u8, counter1: u8) -> DevId2 {
    let mut id = DevId2(0);
    id.set_timer0(timer0);
    id.set_timer1(timer1);
    id.set_counter0(counter0);
    id.set_counter1(counter1);
    id
}

/// Every bank at its register-map maximum.
pub fn full_caps() -> Capabilities {
    Capabilities {
        max_registers: MAX_REGISTERS,
        max_steps: MAX_STEPS,
        max_condition_decode: MAX_CONDITION_DECODE,
        max_condition_select: MAX_CONDITION_SELECT,
        max_timers: MAX_TIMERS,
        max_counters: MAX_COUNTERS,
    }
}

/// Device with the given capabilities over an empty recording block.
pub fn test_device(caps: Capabilities) -> TestDevice {
    TguDevice::with_capabilities(RecordingRegisters::empty(), caps).unwrap()
}
