//! 128-EEA3 confidentiality: ZUC keystream XORed over the message.

use core::fmt;

use crate::core::scrub::Sensitive;
use crate::core::xor::xor_words;
use crate::core::zuc::{BatchState, LaneState, BLOCK_BYTES, BLOCK_WORDS, IV_LEN, KEY_LEN};

use super::{check_length, common_length, GroupStats, KernelError, EEA3_MAX_BYTES};

/// One buffer's view for an EEA3 run. `dst` is trimmed to `src.len()`.
pub struct CipherLane<'a> {
    key: &'a [u8; KEY_LEN],
    iv: &'a [u8; IV_LEN],
    src: &'a [u8],
    dst: &'a mut [u8],
}

impl<'a> CipherLane<'a> {
    /// Checks the message length (1 ..= 8188 bytes) and the output size.
    pub fn new(
        key: &'a [u8; KEY_LEN],
        iv: &'a [u8; IV_LEN],
        src: &'a [u8],
        dst: &'a mut [u8],
    ) -> Result<Self, KernelError> {
        check_length(src.len(), EEA3_MAX_BYTES)?;
        Self::unvalidated(key, iv, src, dst)
    }

    /// Skips the length limits; the output size is still checked.
    pub fn unvalidated(
        key: &'a [u8; KEY_LEN],
        iv: &'a [u8; IV_LEN],
        src: &'a [u8],
        dst: &'a mut [u8],
    ) -> Result<Self, KernelError> {
        if dst.len() < src.len() {
            return Err(KernelError::BufferTooSmall {
                needed: src.len(),
                got: dst.len(),
            });
        }
        let dst = &mut dst[..src.len()];
        Ok(Self { key, iv, src, dst })
    }

    /// Message length in bytes.
    pub fn len(&self) -> usize {
        self.src.len()
    }

    pub fn is_empty(&self) -> bool {
        self.src.is_empty()
    }

    /// A shorter-lived view of the same buffers.
    pub fn reborrow(&mut self) -> CipherLane<'_> {
        CipherLane {
            key: self.key,
            iv: self.iv,
            src: self.src,
            dst: &mut *self.dst,
        }
    }

    /// Runs this lane alone from a freshly initialised state.
    pub(crate) fn run_single(&mut self) {
        let mut state = LaneState::new(self.key, self.iv);
        eea3_tail(&mut state, self.src, self.dst);
    }
}

impl fmt::Debug for CipherLane<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherLane")
            .field("iv", &hex::encode(self.iv))
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

/// Runs up to `N` lanes through one lockstep batch.
///
/// Lanes longer than the common length are extracted and finished by
/// [`eea3_tail`]; lanes of exactly the common length need no tail work.
pub fn eea3_group<const N: usize>(
    lanes: &mut [Option<CipherLane<'_>>; N],
) -> Result<GroupStats, KernelError> {
    let active = lanes.iter().flatten().count();
    if active == 0 {
        return Ok(GroupStats::default());
    }
    let common = common_length(lanes.iter().flatten().map(CipherLane::len), BLOCK_BYTES);

    let mut batch = BatchState::<N>::new(core::array::from_fn(|i| {
        lanes[i].as_ref().map(|lane| (lane.key, lane.iv))
    }));
    let mut ks = Sensitive::new([[0u32; BLOCK_WORDS]; N]);
    let mut offset = 0;
    while offset < common {
        batch.keystream_block(&mut ks);
        let end = offset + BLOCK_BYTES;
        for (slot, words) in lanes.iter_mut().zip(ks.iter()) {
            if let Some(lane) = slot {
                xor_words(&lane.src[offset..end], words, &mut lane.dst[offset..end]);
            }
        }
        offset = end;
    }

    let mut extracted = 0;
    for (i, slot) in lanes.iter_mut().enumerate() {
        let Some(lane) = slot else { continue };
        if lane.len() > common {
            log::trace!("eea3: lane {} extracted with {} bytes left", i, lane.len() - common);
            let mut state = batch.extract(i)?;
            eea3_tail(&mut state, &lane.src[common..], &mut lane.dst[common..]);
            extracted += 1;
        }
    }

    Ok(GroupStats {
        active,
        common,
        extracted,
    })
}

/// [`eea3_group`] over a slice that must hold exactly `N` lanes.
pub fn eea3_group_dyn<const N: usize>(
    lanes: &mut [Option<CipherLane<'_>>],
) -> Result<GroupStats, KernelError> {
    let got = lanes.len();
    let lanes: &mut [Option<CipherLane<'_>>; N] = lanes
        .try_into()
        .map_err(|_| KernelError::LaneCountMismatch { expected: N, got })?;
    eea3_group(lanes)
}

/// Finishes one lane from `state`: whole 64-byte blocks first, then
/// `ceil(rem / 4)` keystream words for the final partial block.
///
/// Requires `dst.len() == src.len()`.
pub fn eea3_tail(state: &mut LaneState, src: &[u8], dst: &mut [u8]) {
    let mut ks = Sensitive::new([0u32; BLOCK_WORDS]);
    let mut src_blocks = src.chunks_exact(BLOCK_BYTES);
    let mut dst_blocks = dst.chunks_exact_mut(BLOCK_BYTES);
    for (s, d) in (&mut src_blocks).zip(&mut dst_blocks) {
        state.keystream_block(&mut ks);
        xor_words(s, &ks[..], d);
    }

    let s = src_blocks.remainder();
    let d = dst_blocks.into_remainder();
    if s.is_empty() {
        return;
    }
    let words = s.len().div_ceil(4);
    state.fill_words(&mut ks[..words]);

    let mut scratch = Sensitive::new([0u8; BLOCK_BYTES]);
    let mut out = Sensitive::new([0u8; BLOCK_BYTES]);
    scratch[..s.len()].copy_from_slice(s);
    xor_words(&scratch[..words * 4], &ks[..words], &mut out[..words * 4]);
    d.copy_from_slice(&out[..s.len()]);
}

/// Encrypts or decrypts one buffer.
pub fn eea3_1_buffer(
    key: &[u8; KEY_LEN],
    iv: &[u8; IV_LEN],
    src: &[u8],
    dst: &mut [u8],
) -> Result<(), KernelError> {
    CipherLane::new(key, iv, src, dst)?.run_single();
    Ok(())
}

/// Encrypts or decrypts four independent buffers in one 4-lane batch.
///
/// All four are validated before any output is written.
pub fn eea3_4_buffer(
    keys: [&[u8; KEY_LEN]; 4],
    ivs: [&[u8; IV_LEN]; 4],
    srcs: [&[u8]; 4],
    dsts: [&mut [u8]; 4],
) -> Result<(), KernelError> {
    eea3_buffers(keys, ivs, srcs, dsts)
}

/// `M` buffers under one key, each with its own IV, in one `M`-lane batch.
///
/// Covers the 2, 3 and 4 buffer multi-IV forms. Validation happens before
/// any output is written.
pub fn eea3_multi_iv<const M: usize>(
    key: &[u8; KEY_LEN],
    ivs: [&[u8; IV_LEN]; M],
    srcs: [&[u8]; M],
    dsts: [&mut [u8]; M],
) -> Result<(), KernelError> {
    eea3_buffers([key; M], ivs, srcs, dsts)
}

fn eea3_buffers<const M: usize>(
    keys: [&[u8; KEY_LEN]; M],
    ivs: [&[u8; IV_LEN]; M],
    srcs: [&[u8]; M],
    dsts: [&mut [u8]; M],
) -> Result<(), KernelError> {
    let mut lanes: [Option<CipherLane<'_>>; M] = core::array::from_fn(|_| None);
    for (i, dst) in dsts.into_iter().enumerate() {
        lanes[i] = Some(CipherLane::new(keys[i], ivs[i], srcs[i], dst)?);
    }
    eea3_group(&mut lanes)?;
    Ok(())
}
