//! Lane-parallel ZUC kernels and the single-lane tail processors.
//!
//! A group run takes up to `N` lanes (absent lanes are `None`), advances all
//! of them in lockstep for the common length (the shortest present length,
//! rounded down to the native block) and then hands each lane that still has
//! data to the scalar tail processor, starting from the lane state extracted
//! out of the batch.
//!
//! # Limits
//! | Algorithm | Unit | Range | Native block |
//! |-----------|------|-------|--------------|
//! | 128-EEA3 | bytes | 1 ..= 8188 | 64 bytes |
//! | 128-EIA3 | bits | 1 ..= 65504 | 512 bits |

use core::fmt;

use crate::core::zuc::ZucError;

pub mod eea3;
pub mod eia3;

#[cfg(test)]
mod proptests;
#[cfg(test)]
pub(crate) mod reference;

pub use eea3::{
    eea3_1_buffer, eea3_4_buffer, eea3_group, eea3_group_dyn, eea3_multi_iv, eea3_tail, CipherLane,
};
pub use eia3::{
    eia3_1_buffer, eia3_4_buffer, eia3_group, eia3_group_dyn, eia3_multi_iv, eia3_tail,
    MacBatchState, MacLane, MacLaneState,
};

/// Longest 128-EEA3 message, in bytes.
pub const EEA3_MAX_BYTES: usize = 8188;
/// Longest 128-EIA3 message, in bits.
pub const EIA3_MAX_BITS: usize = 65504;
/// 128-EIA3 tag length in bytes.
pub const TAG_LEN: usize = 4;

/// Errors raised by the kernels and their lane views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelError {
    /// A group function was handed a slice of the wrong width.
    LaneCountMismatch { expected: usize, got: usize },
    /// Message longer than the algorithm allows.
    LengthOutOfRange { len: usize, max: usize },
    /// Empty message.
    ZeroLength,
    /// Output or input buffer shorter than the message.
    BufferTooSmall { needed: usize, got: usize },
    /// Lane state access failed.
    Zuc(ZucError),
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::LaneCountMismatch { expected, got } => {
                write!(f, "Expected {} lanes, got {}", expected, got)
            }
            KernelError::LengthOutOfRange { len, max } => {
                write!(f, "Length {} exceeds maximum {}", len, max)
            }
            KernelError::ZeroLength => write!(f, "Zero-length message"),
            KernelError::BufferTooSmall { needed, got } => {
                write!(f, "Buffer too small: need {} bytes, got {}", needed, got)
            }
            KernelError::Zuc(e) => write!(f, "ZUC state error: {}", e),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for KernelError {}

impl From<ZucError> for KernelError {
    fn from(e: ZucError) -> Self {
        KernelError::Zuc(e)
    }
}

/// What a group run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupStats {
    /// Lanes that carried a buffer.
    pub active: usize,
    /// Bytes (EEA3) or bits (EIA3) every active lane advanced in lockstep.
    pub common: usize,
    /// Lanes finished by the scalar tail processor.
    pub extracted: usize,
}

/// Shortest length, rounded down to `block`; 0 when there is no length.
pub(crate) fn common_length<I: Iterator<Item = usize>>(lengths: I, block: usize) -> usize {
    lengths.min().map_or(0, |shortest| shortest / block * block)
}

/// Shared length check: `1 ..= max`.
pub(crate) fn check_length(len: usize, max: usize) -> Result<(), KernelError> {
    if len == 0 {
        return Err(KernelError::ZeroLength);
    }
    if len > max {
        return Err(KernelError::LengthOutOfRange { len, max });
    }
    Ok(())
}
