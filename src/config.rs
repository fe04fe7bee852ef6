//! Engine configuration.
//!
//! Defines the settings a host application chooses when it builds a
//! [`JobManager`](crate::mgr::JobManager).

use crate::platform::{Caps, Dispatch, LaneWidth, PlatformError};

/// Main configuration structure for the job engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Lanes per kernel invocation.
    /// If None, uses the widest width the CPU supports.
    pub lane_width: Option<LaneWidth>,

    /// Refuse a fixed `lane_width` the CPU cannot run natively instead of
    /// running the portable kernel at that width.
    pub require_native_width: bool,

    /// Whether `submit` checks lengths and directions. When false it behaves
    /// like `submit_no_validate`.
    pub validate_params: bool,

    /// Whether `submit` hands back a completed job straight away. When false,
    /// completions are collected via `get_completed` or `flush`.
    pub report_eagerly: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lane_width: None,
            require_native_width: true,
            validate_params: true,
            report_eagerly: true,
        }
    }
}

impl EngineConfig {
    /// Builds the dispatch table this configuration asks for.
    pub fn dispatch(&self) -> Result<Dispatch, PlatformError> {
        match self.lane_width {
            None => Ok(Dispatch::detect()),
            Some(width) if self.require_native_width => Dispatch::new(width, Caps::detect()),
            Some(width) => Ok(Dispatch::portable(width)),
        }
    }
}
