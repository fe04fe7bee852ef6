use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use zeroize::Zeroizing;

use crate::core::zuc::{IV_LEN, KEY_LEN};
use crate::kernel::{CipherLane, KernelError, MacLane, EEA3_MAX_BYTES, EIA3_MAX_BITS, TAG_LEN};

use super::MgrError;

/// Operations the manager can schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Algorithm {
    /// 128-EEA3; lengths in bytes.
    ZucEea3,
    /// 128-EIA3; lengths in bits.
    ZucEia3,
}

impl Algorithm {
    pub const ALL: [Algorithm; 2] = [Algorithm::ZucEea3, Algorithm::ZucEia3];

    #[inline]
    pub(crate) const fn index(self) -> usize {
        match self {
            Algorithm::ZucEea3 => 0,
            Algorithm::ZucEia3 => 1,
        }
    }

    /// Longest accepted message, in the algorithm's length unit.
    pub const fn max_len(self) -> usize {
        match self {
            Algorithm::ZucEea3 => EEA3_MAX_BYTES,
            Algorithm::ZucEia3 => EIA3_MAX_BITS,
        }
    }

    pub const fn accepts(self, direction: Direction) -> bool {
        matches!(
            (self, direction),
            (Algorithm::ZucEea3, Direction::Encrypt)
                | (Algorithm::ZucEea3, Direction::Decrypt)
                | (Algorithm::ZucEia3, Direction::Mac)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    Encrypt,
    Decrypt,
    Mac,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    /// Built, not yet accepted.
    Created,
    /// Sitting in a lane.
    InFlight,
    /// Output fully written.
    Completed,
    /// The kernel reported an internal error; the output is not valid.
    Failed(KernelError),
}

/// One cipher or MAC request.
///
/// The manager takes ownership on submission and gives the job back once it
/// has reached a terminal status.
pub struct Job {
    algorithm: Algorithm,
    direction: Direction,
    key: Zeroizing<[u8; KEY_LEN]>,
    iv: [u8; IV_LEN],
    src: Vec<u8>,
    dst: Vec<u8>,
    len: usize,
    tag: [u8; TAG_LEN],
    user_data: u64,
    status: JobStatus,
}

impl Job {
    /// A job with explicit algorithm, direction and length. `len` is in
    /// bytes for EEA3 and bits for EIA3; nothing is checked here, and the
    /// EEA3 output buffer never grows past `src`, so a `len` beyond the input
    /// is caught at submission.
    pub fn new(
        algorithm: Algorithm,
        direction: Direction,
        key: [u8; KEY_LEN],
        iv: [u8; IV_LEN],
        src: Vec<u8>,
        len: usize,
    ) -> Self {
        let dst = match algorithm {
            Algorithm::ZucEea3 => vec![0u8; len.min(src.len())],
            Algorithm::ZucEia3 => Vec::new(),
        };
        Self {
            algorithm,
            direction,
            key: Zeroizing::new(key),
            iv,
            src,
            dst,
            len,
            tag: [0u8; TAG_LEN],
            user_data: 0,
            status: JobStatus::Created,
        }
    }

    /// Encrypts or decrypts all of `src`.
    pub fn eea3(direction: Direction, key: [u8; KEY_LEN], iv: [u8; IV_LEN], src: Vec<u8>) -> Self {
        let len = src.len();
        Self::new(Algorithm::ZucEea3, direction, key, iv, src, len)
    }

    /// Computes the tag over the first `bits` bits of `msg`.
    pub fn eia3(key: [u8; KEY_LEN], iv: [u8; IV_LEN], msg: Vec<u8>, bits: usize) -> Self {
        Self::new(Algorithm::ZucEia3, Direction::Mac, key, iv, msg, bits)
    }

    /// Attaches an opaque caller value, returned untouched.
    pub fn with_user_data(mut self, user_data: u64) -> Self {
        self.user_data = user_data;
        self
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn iv(&self) -> &[u8; IV_LEN] {
        &self.iv
    }

    /// Message length in bytes (EEA3) or bits (EIA3).
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn user_data(&self) -> u64 {
        self.user_data
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn is_completed(&self) -> bool {
        self.status == JobStatus::Completed
    }

    pub fn input(&self) -> &[u8] {
        &self.src
    }

    /// Ciphertext or plaintext for EEA3; the tag bytes for EIA3.
    pub fn output(&self) -> &[u8] {
        match self.algorithm {
            Algorithm::ZucEea3 => &self.dst,
            Algorithm::ZucEia3 => &self.tag,
        }
    }

    pub fn into_output(self) -> Vec<u8> {
        match self.algorithm {
            Algorithm::ZucEea3 => self.dst,
            Algorithm::ZucEia3 => self.tag.to_vec(),
        }
    }

    /// The EIA3 tag, once completed.
    pub fn tag(&self) -> Option<[u8; TAG_LEN]> {
        match (self.algorithm, self.status) {
            (Algorithm::ZucEia3, JobStatus::Completed) => Some(self.tag),
            _ => None,
        }
    }

    pub(crate) fn set_status(&mut self, status: JobStatus) {
        self.status = status;
    }

    /// Direction and length limits.
    pub(crate) fn validate(&self) -> Result<(), MgrError> {
        if !self.algorithm.accepts(self.direction) {
            return Err(MgrError::DirectionMismatch {
                algorithm: self.algorithm,
                direction: self.direction,
            });
        }
        if self.len == 0 {
            return Err(MgrError::ZeroLength);
        }
        let max = self.algorithm.max_len();
        if self.len > max {
            return Err(MgrError::LengthOutOfRange { len: self.len, max });
        }
        Ok(())
    }

    /// Buffers large enough for `len`. Checked even when validation is off.
    pub(crate) fn check_buffers(&self) -> Result<(), MgrError> {
        let needed = match self.algorithm {
            Algorithm::ZucEea3 => self.len,
            Algorithm::ZucEia3 => self.len.div_ceil(8),
        };
        let got = match self.algorithm {
            Algorithm::ZucEea3 => self.src.len().min(self.dst.len()),
            Algorithm::ZucEia3 => self.src.len(),
        };
        if got < needed {
            return Err(MgrError::BufferTooSmall { needed, got });
        }
        Ok(())
    }

    pub(crate) fn cipher_lane(&mut self) -> Result<CipherLane<'_>, KernelError> {
        let got = self.src.len();
        let src = self.src.get(..self.len).ok_or(KernelError::BufferTooSmall {
            needed: self.len,
            got,
        })?;
        CipherLane::unvalidated(&self.key, &self.iv, src, &mut self.dst)
    }

    pub(crate) fn mac_lane(&mut self) -> Result<MacLane<'_>, KernelError> {
        MacLane::unvalidated(&self.key, &self.iv, &self.src, self.len, &mut self.tag)
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("algorithm", &self.algorithm)
            .field("direction", &self.direction)
            .field("key", &"<redacted>")
            .field("iv", &hex::encode(self.iv))
            .field("len", &self.len)
            .field("user_data", &self.user_data)
            .field("status", &self.status)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_rules() {
        assert!(Algorithm::ZucEea3.accepts(Direction::Encrypt));
        assert!(Algorithm::ZucEea3.accepts(Direction::Decrypt));
        assert!(!Algorithm::ZucEea3.accepts(Direction::Mac));
        assert!(Algorithm::ZucEia3.accepts(Direction::Mac));
        assert!(!Algorithm::ZucEia3.accepts(Direction::Encrypt));
    }

    #[test]
    fn test_validate() {
        let ok = Job::eea3(Direction::Encrypt, [0; 16], [0; 16], vec![1; 10]);
        assert!(ok.validate().is_ok());
        assert_eq!(
            Job::eea3(Direction::Encrypt, [0; 16], [0; 16], Vec::new()).validate(),
            Err(MgrError::ZeroLength)
        );
        assert_eq!(
            Job::eia3([0; 16], [0; 16], vec![0; 9000], 70_000).validate(),
            Err(MgrError::LengthOutOfRange { len: 70_000, max: EIA3_MAX_BITS })
        );
        assert_eq!(
            Job::eea3(Direction::Mac, [0; 16], [0; 16], vec![1]).validate(),
            Err(MgrError::DirectionMismatch {
                algorithm: Algorithm::ZucEea3,
                direction: Direction::Mac
            })
        );
    }

    #[test]
    fn test_check_buffers() {
        let short = Job::eia3([0; 16], [0; 16], vec![0; 2], 17);
        assert_eq!(
            short.check_buffers(),
            Err(MgrError::BufferTooSmall { needed: 3, got: 2 })
        );
        let padded = Job::new(Algorithm::ZucEea3, Direction::Encrypt, [0; 16], [0; 16], vec![0; 4], 8);
        assert_eq!(
            padded.check_buffers(),
            Err(MgrError::BufferTooSmall { needed: 8, got: 4 })
        );
    }

    #[test]
    fn test_huge_length_is_rejected_not_allocated() {
        let job = Job::new(Algorithm::ZucEea3, Direction::Encrypt, [0; 16], [0; 16], vec![1; 16], usize::MAX);
        assert_eq!(job.output().len(), 16);
        assert_eq!(
            job.validate(),
            Err(MgrError::LengthOutOfRange { len: usize::MAX, max: EEA3_MAX_BYTES })
        );
        assert_eq!(
            job.check_buffers(),
            Err(MgrError::BufferTooSmall { needed: usize::MAX, got: 16 })
        );
    }

    #[test]
    fn test_debug_redacts_key() {
        let job = Job::eea3(Direction::Encrypt, [0xAB; 16], [0x01; 16], vec![0; 4]).with_user_data(7);
        let shown = format!("{:?}", job);
        assert!(shown.contains("<redacted>"));
        assert!(!shown.to_lowercase().contains("abab"));
        assert!(shown.contains("user_data: 7"));
    }

    #[test]
    fn test_tag_only_when_completed() {
        let mut job = Job::eia3([0; 16], [0; 16], vec![0; 4], 1);
        assert_eq!(job.tag(), None);
        job.set_status(JobStatus::Completed);
        assert_eq!(job.tag(), Some([0; 4]));
    }
}
