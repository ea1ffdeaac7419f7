//! A `no_std`, no-alloc configuration engine for CoreSight Trigger Generation Units (TGU).
//!
//! A TGU watches sense-input signals and evaluates, per programmable *step*,
//! priority/condition/timer/counter logic that gates or triggers trace capture.
//! This crate keeps a host-side shadow image of every configurable register and
//! commits the whole image to hardware in one locked sequence when the unit is armed.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐         ┌──────────────────────────┐
//! │   Controls       │         │   Hardware               │
//! │                  │         │                          │
//! │  write()         │ staged  │                          │
//! │  with_config()   │────────▶│  enable(): unlock,       │
//! │  (shadow only)   │         │  replay every slot,      │
//! │                  │         │  CONTROL = 1, lock       │
//! │  read()          │         │                          │
//! │  (shadow only)   │         │  disable(): unlock,      │
//! │                  │         │  CONTROL = 0, lock       │
//! └──────────────────┘         └──────────────────────────┘
//! ```
//!
//! - **Discovery** decodes `DEVID`/`DEVID2` once at attach into [`Capabilities`](tgu::Capabilities)
//! - **Writes** only ever touch the shadow image, never hardware
//! - **Enable** replays the full image in increasing address order, then arms
//! - **Disable** clears the control register and leaves the shadow intact
//!
//! # Example
//!
//! ```rust,no_run
//! use coresight_tgu::prelude::*;
//!
//! # fn run(regs: Mmio) -> Result<(), TguError> {
//! let tgu: DefaultTgu<Mmio> = TguDevice::attach(regs)?;
//!
//! tgu.with_config(|cfg| {
//!     cfg.set_priority(0, 0, 0, 0x0000_0011)?;
//!     cfg.set_condition_decode(0, 0, 0x1)?;
//!     cfg.set_condition_select(0, 0, 0x3)
//! })?;
//!
//! tgu.enable()?;
//! // ... capture ...
//! tgu.disable();
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![no_std]

pub mod tgu;

pub mod prelude {
    pub use crate::tgu::prelude::*;
}
