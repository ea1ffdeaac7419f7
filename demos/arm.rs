//! Arm example: discover a simulated TGU, stage a trigger, commit it.
//!
//! This example demonstrates:
//! - Capability discovery from identification registers
//! - Staging values through the text control surface and `with_config`
//! - The register traffic produced by enable and disable

use coresight_tgu::prelude::*;
use coresight_tgu::tgu::{
    DevId,
    control::{self, ENABLE_CONTROL},
    layout::{CONTROL, DEVID, LAR},
};

/// Register block backed by an array that prints every write.
struct SimulatedTgu {
    words: [u32; 0x1000 / 4],
}

impl SimulatedTgu {
    fn new(devid: DevId) -> Self {
        let mut words = [0; 0x1000 / 4];
        words[DEVID as usize / 4] = devid.0;
        Self { words }
    }
}

impl RegisterBlock for SimulatedTgu {
    fn read_reg(&self, offset: u32) -> u32 {
        self.words[offset as usize / 4]
    }

    fn write_reg(&mut self, offset: u32, value: u32) {
        let what = match offset {
            CONTROL => "CONTROL",
            LAR => "LAR",
            _ => "",
        };
        println!("    [{offset:#05x}] <- {value:#010x} {what}");
        self.words[offset as usize / 4] = value;
    }
}

fn main() {
    println!("=== TGU Arm Example ===\n");

    // 8 sense inputs, 2 steps, 1 condition
    let mut devid = DevId(0);
    devid.set_sense_inputs(8);
    devid.set_steps(2);
    devid.set_conditions(1);

    let tgu: DefaultTgu<SimulatedTgu> = TguDevice::attach(SimulatedTgu::new(devid)).unwrap();
    println!("Discovered: {:?}\n", tgu.capabilities());

    let table = ControlTable::new(tgu.capabilities());
    println!("Controls ({}):", table.len());
    for control in table.iter() {
        println!("  {}", control.name());
    }

    // Stage through the text surface...
    table
        .find("step0_priority0/reg0")
        .unwrap()
        .store(&tgu, "0x11\n")
        .unwrap();

    // ...and in one batch.
    tgu.with_config(|cfg| {
        cfg.set_condition_decode(0, 0, 0x0100_0000)?;
        cfg.set_condition_select(0, 0, 0x1)?;
        cfg.set_condition_select(1, 1, 0x2)
    })
    .unwrap();
    println!("\nPending steps: {:?}", tgu.pending_steps());

    println!("\n{ENABLE_CONTROL} <- 1");
    control::store_enable(&tgu, "1\n").unwrap();
    print!("{ENABLE_CONTROL} = {}", control::show_enable(&tgu));

    // A second enable is refused.
    println!("{ENABLE_CONTROL} <- 1: {:?}", control::store_enable(&tgu, "1"));

    println!("\n{ENABLE_CONTROL} <- 0");
    control::store_enable(&tgu, "0\n").unwrap();
    print!("{ENABLE_CONTROL} = {}", control::show_enable(&tgu));

    let regs = tgu.into_registers();
    println!("\nCONTROL after teardown: {}", regs.read_reg(CONTROL));
}
