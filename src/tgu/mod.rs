//! Trigger Generation Unit configuration: discovery, shadow image and commit.

pub mod caps;
pub mod commit;
pub mod control;
pub mod device;
pub mod error;
pub mod layout;
pub mod regs;
pub(crate) mod table;
pub mod types;
pub mod view;

#[cfg(test)]
mod test_support;

pub use caps::{Capabilities, DevId, DevId2};
pub use control::{Control, ControlTable};
pub use device::{DefaultTgu, TguDevice};
pub use error::TguError;
pub use regs::{Mmio, RegisterBlock};
pub use types::{OperationKind, Slot};
pub use view::ConfigView;

pub mod prelude {
    pub use super::{
        Capabilities, ConfigView, Control, ControlTable, DefaultTgu, Mmio, OperationKind,
        RegisterBlock, Slot, TguDevice, TguError,
    };
}
