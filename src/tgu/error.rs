//! Error type shared by every TGU operation.

/// Errors that can occur during TGU configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TguError {
    /// Step, kind or register index is beyond the discovered capacity.
    Unsupported,
    /// The unit is already armed, or its state is held by a
    /// [`with_config`](crate::tgu::TguDevice::with_config) closure.
    Busy,
    /// Discovered capacities do not fit the shadow store.
    StoreFull,
    /// Textual control input could not be parsed.
    Parse,
}

impl core::fmt::Display for TguError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TguError::Unsupported => write!(f, "operation not supported by this unit"),
            TguError::Busy => write!(f, "trigger unit is busy"),
            TguError::StoreFull => write!(f, "shadow store capacity exceeded"),
            TguError::Parse => write!(f, "malformed control value"),
        }
    }
}
