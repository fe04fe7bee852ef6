#![cfg_attr(not(feature = "std"), no_std)]
//! Multi-buffer ZUC job engine.
//!
//! `mbcrypt` runs 128-EEA3 (confidentiality) and 128-EIA3 (integrity) over
//! many independent buffers at once. The ZUC state of 4, 8 or 16 lanes is
//! clocked in lockstep; lanes are loaded and unloaded through an
//! out-of-order [`JobManager`].
//!
//! ```
//! use mbcrypt::{Direction, EngineConfig, Job, JobManager};
//!
//! let mut mgr = JobManager::new(EngineConfig::default()).unwrap();
//! let job = Job::eea3(Direction::Encrypt, [0x17; 16], [0x42; 16], vec![0u8; 100]);
//! // Nothing completes until the group fills or is flushed.
//! assert!(mgr.submit(job).unwrap().is_none());
//! let done = mgr.flush_burst(mbcrypt::Algorithm::ZucEea3);
//! assert_eq!(done.len(), 1);
//! assert!(done[0].is_completed());
//! ```

extern crate alloc;

pub mod config;
pub mod core;
pub mod kernel;
pub mod mgr;
pub mod platform;

pub use crate::config::EngineConfig;
pub use crate::core::zuc::{eea3_iv, eia3_iv, ZucError, IV_LEN, KEY_LEN};
pub use crate::kernel::{
    eea3_1_buffer, eea3_4_buffer, eea3_multi_iv, eia3_1_buffer, eia3_4_buffer, eia3_multi_iv,
    CipherLane, GroupStats, KernelError, MacLane, TAG_LEN,
};
pub use crate::mgr::{
    Algorithm, BurstOutcome, Direction, Job, JobManager, JobStatus, MgrError, MgrStats, Rejected,
};
pub use crate::platform::{Caps, Dispatch, LaneWidth, PlatformError};
