//! Immutable lane-width / kernel table.
//!
//! A [`Dispatch`] is built once, up front, and handed to whoever runs
//! kernels. Capability problems surface here and never in the middle of a
//! job.

use core::fmt;

use crate::kernel::{
    eea3_group_dyn, eia3_group_dyn, CipherLane, GroupStats, KernelError, MacLane,
};

use super::{Caps, PlatformError};

/// Runs one EEA3 group; the slice length must equal the lane width.
pub type CipherGroupFn = fn(&mut [Option<CipherLane<'_>>]) -> Result<GroupStats, KernelError>;
/// Runs one EIA3 group; the slice length must equal the lane width.
pub type MacGroupFn = fn(&mut [Option<MacLane<'_>>]) -> Result<GroupStats, KernelError>;

/// Widest group any kernel runs.
pub const MAX_LANES: usize = 16;

/// Buffers per kernel invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LaneWidth {
    X4,
    X8,
    X16,
}

impl LaneWidth {
    /// Widest first.
    pub const ALL: [LaneWidth; 3] = [LaneWidth::X16, LaneWidth::X8, LaneWidth::X4];

    #[inline]
    #[must_use]
    pub const fn lanes(self) -> usize {
        match self {
            LaneWidth::X4 => 4,
            LaneWidth::X8 => 8,
            LaneWidth::X16 => 16,
        }
    }

    /// Features a CPU needs to hold this many 32-bit lanes in one register.
    #[inline]
    #[must_use]
    pub const fn required_caps(self) -> Caps {
        match self {
            LaneWidth::X4 => Caps::NONE,
            LaneWidth::X8 => Caps::AVX2,
            LaneWidth::X16 => Caps::AVX512F,
        }
    }

    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            LaneWidth::X4 => "zuc-x4",
            LaneWidth::X8 => "zuc-x8",
            LaneWidth::X16 => "zuc-x16",
        }
    }
}

/// The kernels for one lane width.
#[derive(Clone, Copy)]
pub struct Dispatch {
    width: LaneWidth,
    eea3_group: CipherGroupFn,
    eia3_group: MacGroupFn,
}

impl Dispatch {
    /// Widest width the running CPU supports.
    pub fn detect() -> Self {
        let caps = Caps::detect();
        let width = LaneWidth::ALL
            .into_iter()
            .find(|w| caps.has(w.required_caps()))
            .unwrap_or(LaneWidth::X4);
        Self::portable(width)
    }

    /// `width`, provided `caps` can run it.
    pub fn new(width: LaneWidth, caps: Caps) -> Result<Self, PlatformError> {
        if !caps.has(width.required_caps()) {
            return Err(PlatformError::MissingCapability(width));
        }
        Ok(Self::portable(width))
    }

    /// `width` without a capability check. The kernels are plain Rust, so
    /// any width runs anywhere; wider than the hardware is just slower.
    pub fn portable(width: LaneWidth) -> Self {
        match width {
            LaneWidth::X4 => Self {
                width,
                eea3_group: eea3_group_dyn::<4>,
                eia3_group: eia3_group_dyn::<4>,
            },
            LaneWidth::X8 => Self {
                width,
                eea3_group: eea3_group_dyn::<8>,
                eia3_group: eia3_group_dyn::<8>,
            },
            LaneWidth::X16 => Self {
                width,
                eea3_group: eea3_group_dyn::<16>,
                eia3_group: eia3_group_dyn::<16>,
            },
        }
    }

    #[inline]
    pub fn width(&self) -> LaneWidth {
        self.width
    }

    #[inline]
    pub fn lanes(&self) -> usize {
        self.width.lanes()
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.width.as_str()
    }

    /// Runs one EEA3 group of exactly [`lanes`](Self::lanes) slots.
    pub fn eea3_group(&self, lanes: &mut [Option<CipherLane<'_>>]) -> Result<GroupStats, KernelError> {
        (self.eea3_group)(lanes)
    }

    /// Runs one EIA3 group of exactly [`lanes`](Self::lanes) slots.
    pub fn eia3_group(&self, lanes: &mut [Option<MacLane<'_>>]) -> Result<GroupStats, KernelError> {
        (self.eia3_group)(lanes)
    }

    /// Encrypts or decrypts any number of buffers: full groups through the
    /// batch kernel, the remainder one at a time.
    pub fn eea3_n_buffer(&self, lanes: &mut [CipherLane<'_>]) -> Result<(), KernelError> {
        let width = self.lanes();
        let mut groups = lanes.chunks_exact_mut(width);
        for group in &mut groups {
            let mut views: [Option<CipherLane<'_>>; MAX_LANES] = Default::default();
            for (view, lane) in views.iter_mut().zip(group.iter_mut()) {
                *view = Some(lane.reborrow());
            }
            self.eea3_group(&mut views[..width])?;
        }
        for lane in groups.into_remainder() {
            lane.run_single();
        }
        Ok(())
    }

    /// Computes tags for any number of buffers: full groups through the batch
    /// kernel, the remainder one at a time.
    pub fn eia3_n_buffer(&self, lanes: &mut [MacLane<'_>]) -> Result<(), KernelError> {
        let width = self.lanes();
        let mut groups = lanes.chunks_exact_mut(width);
        for group in &mut groups {
            let mut views: [Option<MacLane<'_>>; MAX_LANES] = Default::default();
            for (view, lane) in views.iter_mut().zip(group.iter_mut()) {
                *view = Some(lane.reborrow());
            }
            self.eia3_group(&mut views[..width])?;
        }
        for lane in groups.into_remainder() {
            lane.run_single();
        }
        Ok(())
    }
}

impl fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatch")
            .field("width", &self.width)
            .field("name", &self.name())
            .finish()
    }
}
