//! Out-of-order multi-buffer job manager.
//!
//! Jobs are parked in per-algorithm lane groups sized to the dispatch lane
//! width. A group runs through the batch kernel as soon as every lane holds
//! an in-flight job, or when the caller flushes it. Completed jobs come back in
//! whatever order their groups finished, not in submission order.
//!
//! # Ownership
//! A submitted [`Job`] moves into the manager and is moved back out once it
//! is completed, so the caller cannot touch its buffers while it is in flight.
//! A rejected job is handed back inside [`Rejected`].

use core::fmt;

use crate::kernel::KernelError;
use crate::platform::PlatformError;

pub mod burst;
pub mod job;
mod lanes;
pub mod manager;

pub use burst::BurstOutcome;
pub use job::{Algorithm, Direction, Job, JobStatus};
pub use manager::{JobManager, MgrStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MgrError {
    /// Every lane of the algorithm's group is occupied or holds an
    /// uncollected completion.
    NoFreeLane(Algorithm),
    ZeroLength,
    LengthOutOfRange { len: usize, max: usize },
    BufferTooSmall { needed: usize, got: usize },
    DirectionMismatch { algorithm: Algorithm, direction: Direction },
    Kernel(KernelError),
    Platform(PlatformError),
}

impl fmt::Display for MgrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MgrError::NoFreeLane(alg) => write!(f, "No free lane for {:?}", alg),
            MgrError::ZeroLength => write!(f, "Zero-length job"),
            MgrError::LengthOutOfRange { len, max } => {
                write!(f, "Job length {} exceeds maximum {}", len, max)
            }
            MgrError::BufferTooSmall { needed, got } => {
                write!(f, "Job buffer too small: need {} bytes, got {}", needed, got)
            }
            MgrError::DirectionMismatch {
                algorithm,
                direction,
            } => write!(f, "{:?} cannot run in direction {:?}", algorithm, direction),
            MgrError::Kernel(e) => write!(f, "Kernel error: {}", e),
            MgrError::Platform(e) => write!(f, "Platform error: {}", e),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for MgrError {}

impl From<KernelError> for MgrError {
    fn from(e: KernelError) -> Self {
        MgrError::Kernel(e)
    }
}

impl From<PlatformError> for MgrError {
    fn from(e: PlatformError) -> Self {
        MgrError::Platform(e)
    }
}

/// A job the manager refused, handed back with the reason.
#[derive(Debug)]
pub struct Rejected {
    pub error: MgrError,
    pub job: Job,
}

impl Rejected {
    pub fn into_job(self) -> Job {
        self.job
    }
}

impl fmt::Display for Rejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Job {} rejected: {}", self.job.user_data(), self.error)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Rejected {}
