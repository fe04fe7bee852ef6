//! CPU capabilities and the kernel dispatch table built from them.

pub mod caps;
pub mod dispatch;

pub use caps::Caps;
pub use dispatch::{CipherGroupFn, Dispatch, LaneWidth, MacGroupFn};

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformError {
    /// A fixed lane width was requested that the CPU cannot run natively.
    MissingCapability(LaneWidth),
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformError::MissingCapability(width) => {
                write!(f, "CPU lacks the features for {} lanes", width.lanes())
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PlatformError {}
