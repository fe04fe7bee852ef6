//! 128-EIA3 integrity: a 32-bit universal-hash tag over a bit string.
//!
//! For message bit `i` set, the tag accumulator absorbs the keystream word
//! starting at keystream bit `i`. Processing one 512-bit block therefore needs
//! the 16-word keystream window covering the block plus the first word of the
//! next window; both are part of the per-lane state so a lane can leave the
//! batch between blocks.

use core::fmt;

use zeroize::Zeroize;

use crate::core::scrub::Sensitive;
use crate::core::zuc::{
    BatchState, LaneState, ZucError, BLOCK_BITS, BLOCK_BYTES, BLOCK_WORDS, IV_LEN, KEY_LEN,
};

use super::{check_length, common_length, GroupStats, KernelError, EIA3_MAX_BITS, TAG_LEN};

/// One buffer's view for an EIA3 run.
pub struct MacLane<'a> {
    key: &'a [u8; KEY_LEN],
    iv: &'a [u8; IV_LEN],
    msg: &'a [u8],
    bits: usize,
    tag: &'a mut [u8; TAG_LEN],
}

impl<'a> MacLane<'a> {
    /// Checks the bit length (1 ..= 65504) and that `msg` holds that many bits.
    pub fn new(
        key: &'a [u8; KEY_LEN],
        iv: &'a [u8; IV_LEN],
        msg: &'a [u8],
        bits: usize,
        tag: &'a mut [u8; TAG_LEN],
    ) -> Result<Self, KernelError> {
        check_length(bits, EIA3_MAX_BITS)?;
        Self::unvalidated(key, iv, msg, bits, tag)
    }

    /// Skips the length limits; the message size is still checked.
    pub fn unvalidated(
        key: &'a [u8; KEY_LEN],
        iv: &'a [u8; IV_LEN],
        msg: &'a [u8],
        bits: usize,
        tag: &'a mut [u8; TAG_LEN],
    ) -> Result<Self, KernelError> {
        let needed = bits.div_ceil(8);
        if msg.len() < needed {
            return Err(KernelError::BufferTooSmall {
                needed,
                got: msg.len(),
            });
        }
        Ok(Self {
            key,
            iv,
            msg,
            bits,
            tag,
        })
    }

    /// Message length in bits.
    pub fn bits(&self) -> usize {
        self.bits
    }

    /// A shorter-lived view of the same buffers.
    pub fn reborrow(&mut self) -> MacLane<'_> {
        MacLane {
            key: self.key,
            iv: self.iv,
            msg: self.msg,
            bits: self.bits,
            tag: &mut *self.tag,
        }
    }

    /// Runs this lane alone from a freshly initialised state.
    pub(crate) fn run_single(&mut self) {
        let state = MacLaneState::new(LaneState::new(self.key, self.iv));
        *self.tag = eia3_tail(state, self.msg, self.bits);
    }
}

impl fmt::Debug for MacLane<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MacLane")
            .field("iv", &hex::encode(self.iv))
            .field("bits", &self.bits)
            .finish_non_exhaustive()
    }
}

/// XOR of the keystream words selected by the set bits of `m`.
///
/// `hi` is the keystream word aligned with the first bit of `m`, `lo` the
/// one after it. Branch-free in the message bits.
#[inline(always)]
fn fold_word(m: u32, hi: u32, lo: u32) -> u32 {
    let ks = (u64::from(hi) << 32) | u64::from(lo);
    let mut t = 0u32;
    for k in 0..32 {
        let mask = 0u32.wrapping_sub((m >> (31 - k)) & 1);
        t ^= ((ks >> (32 - k)) as u32) & mask;
    }
    t
}

/// Folds one 512-bit block given its keystream window and the next word.
#[inline(always)]
fn mac_round(window: &[u32; BLOCK_WORDS], next: u32, block: &[u8]) -> u32 {
    let mut t = 0u32;
    let mut m = [0u8; 4];
    for w in 0..BLOCK_WORDS {
        m.copy_from_slice(&block[w * 4..w * 4 + 4]);
        let lo = if w + 1 < BLOCK_WORDS { window[w + 1] } else { next };
        t ^= fold_word(u32::from_be_bytes(m), window[w], lo);
    }
    t
}

/// The 32-bit keystream word starting at bit `i` of `ks`.
#[inline(always)]
fn word_at(ks: &[u32], i: usize) -> u32 {
    let (j, k) = (i / 32, i % 32);
    let pair = (u64::from(ks[j]) << 32) | u64::from(ks[j + 1]);
    (pair >> (32 - k)) as u32
}

/// Scalar EIA3 state: ZUC state, the current keystream window and the tag
/// accumulator.
#[derive(Clone, PartialEq, Eq, Zeroize)]
pub struct MacLaneState {
    zuc: LaneState,
    window: [u32; BLOCK_WORDS],
    acc: u32,
}

impl MacLaneState {
    /// Starts a MAC from an initialised generator.
    pub fn new(mut zuc: LaneState) -> Self {
        let mut window = [0u32; BLOCK_WORDS];
        zuc.keystream_block(&mut window);
        Self { zuc, window, acc: 0 }
    }

    /// Absorbs one full 512-bit block (64 bytes).
    pub fn absorb_block(&mut self, block: &[u8]) {
        let mut next = Sensitive::new([0u32; BLOCK_WORDS]);
        self.zuc.keystream_block(&mut next);
        self.acc ^= mac_round(&self.window, next[0], block);
        self.window = *next;
    }

    /// Folds the last `bits < 512` message bits from `tail` and returns the tag.
    pub fn finalize(mut self, tail: &[u8], bits: usize) -> [u8; TAG_LEN] {
        let mut ks = Sensitive::new([0u32; BLOCK_WORDS + 2]);
        ks[..BLOCK_WORDS].copy_from_slice(&self.window);
        self.zuc.fill_words(&mut ks[BLOCK_WORDS..]);

        let bytes = bits.div_ceil(8);
        let mut block = Sensitive::new([0u8; BLOCK_BYTES]);
        block[..bytes].copy_from_slice(&tail[..bytes]);
        if bits % 8 != 0 {
            block[bytes - 1] &= 0xFFu8 << (8 - bits % 8);
        }

        let words = bits.div_ceil(32);
        let mut t = self.acc;
        let mut m = [0u8; 4];
        for w in 0..words {
            m.copy_from_slice(&block[w * 4..w * 4 + 4]);
            t ^= fold_word(u32::from_be_bytes(m), ks[w], ks[w + 1]);
        }
        t ^= word_at(&ks[..], bits);
        t ^= ks[words + 1];
        t.to_be_bytes()
    }
}

impl fmt::Debug for MacLaneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MacLaneState").finish_non_exhaustive()
    }
}

impl Drop for MacLaneState {
    fn drop(&mut self) {
        #[cfg(feature = "safe-data")]
        crate::core::scrub::burn(self);
    }
}

/// `N` EIA3 lanes in lockstep: the batch generator plus per-lane windows
/// and accumulators.
pub struct MacBatchState<const N: usize> {
    zuc: BatchState<N>,
    window: [[u32; BLOCK_WORDS]; N],
    acc: [u32; N],
}

impl<const N: usize> MacBatchState<N> {
    pub fn new(inputs: [Option<(&[u8; KEY_LEN], &[u8; IV_LEN])>; N]) -> Self {
        let mut zuc = BatchState::new(inputs);
        let mut window = [[0u32; BLOCK_WORDS]; N];
        zuc.keystream_block(&mut window);
        Self {
            zuc,
            window,
            acc: [0u32; N],
        }
    }

    /// Absorbs one 512-bit block for each lane given one. Every lane's
    /// keystream advances regardless.
    pub fn absorb_blocks(&mut self, blocks: &[Option<&[u8]>; N]) {
        let mut next = Sensitive::new([[0u32; BLOCK_WORDS]; N]);
        self.zuc.keystream_block(&mut next);
        for (l, block) in blocks.iter().enumerate() {
            if let Some(block) = block {
                self.acc[l] ^= mac_round(&self.window[l], next[l][0], block);
            }
        }
        self.window = *next;
    }

    pub fn extract(&self, lane: usize) -> Result<MacLaneState, ZucError> {
        Ok(MacLaneState {
            zuc: self.zuc.extract(lane)?,
            window: self.window[lane],
            acc: self.acc[lane],
        })
    }

    pub fn inject(&mut self, lane: usize, state: &MacLaneState) -> Result<(), ZucError> {
        self.zuc.inject(lane, &state.zuc)?;
        self.window[lane] = state.window;
        self.acc[lane] = state.acc;
        Ok(())
    }
}

impl<const N: usize> Drop for MacBatchState<N> {
    fn drop(&mut self) {
        #[cfg(feature = "safe-data")]
        {
            crate::core::scrub::burn(&mut self.window);
            crate::core::scrub::burn(&mut self.acc);
        }
    }
}

impl<const N: usize> fmt::Debug for MacBatchState<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MacBatchState").field("width", &N).finish_non_exhaustive()
    }
}

/// Runs up to `N` lanes through one lockstep batch and writes every tag.
///
/// Whole blocks up to the common length are absorbed in lockstep; each lane
/// is then extracted to absorb its remaining blocks and finalize alone.
pub fn eia3_group<const N: usize>(
    lanes: &mut [Option<MacLane<'_>>; N],
) -> Result<GroupStats, KernelError> {
    let active = lanes.iter().flatten().count();
    if active == 0 {
        return Ok(GroupStats::default());
    }
    let common = common_length(lanes.iter().flatten().map(MacLane::bits), BLOCK_BITS);

    let mut batch = MacBatchState::<N>::new(core::array::from_fn(|i| {
        lanes[i].as_ref().map(|lane| (lane.key, lane.iv))
    }));
    for b in 0..common / BLOCK_BITS {
        let at = b * BLOCK_BYTES;
        let blocks: [Option<&[u8]>; N] = core::array::from_fn(|i| {
            lanes[i].as_ref().map(|lane| &lane.msg[at..at + BLOCK_BYTES])
        });
        batch.absorb_blocks(&blocks);
    }

    let mut extracted = 0;
    for (i, slot) in lanes.iter_mut().enumerate() {
        let Some(lane) = slot else { continue };
        if lane.bits > common {
            log::trace!("eia3: lane {} extracted with {} bits left", i, lane.bits - common);
            extracted += 1;
        }
        let state = batch.extract(i)?;
        *lane.tag = eia3_tail(state, &lane.msg[common / 8..], lane.bits - common);
    }

    Ok(GroupStats {
        active,
        common,
        extracted,
    })
}

/// [`eia3_group`] over a slice that must hold exactly `N` lanes.
pub fn eia3_group_dyn<const N: usize>(
    lanes: &mut [Option<MacLane<'_>>],
) -> Result<GroupStats, KernelError> {
    let got = lanes.len();
    let lanes: &mut [Option<MacLane<'_>>; N] = lanes
        .try_into()
        .map_err(|_| KernelError::LaneCountMismatch { expected: N, got })?;
    eia3_group(lanes)
}

/// Finishes one lane: absorbs the remaining whole blocks of `msg`, then the
/// final `bits % 512` bits, and returns the big-endian tag.
///
/// Requires `msg.len() >= ceil(bits / 8)`.
pub fn eia3_tail(mut state: MacLaneState, msg: &[u8], bits: usize) -> [u8; TAG_LEN] {
    let full = bits / BLOCK_BITS;
    for block in msg.chunks_exact(BLOCK_BYTES).take(full) {
        state.absorb_block(block);
    }
    state.finalize(&msg[full * BLOCK_BYTES..], bits % BLOCK_BITS)
}

/// Computes the tag over the first `bits` bits of `msg`.
pub fn eia3_1_buffer(
    key: &[u8; KEY_LEN],
    iv: &[u8; IV_LEN],
    msg: &[u8],
    bits: usize,
) -> Result<[u8; TAG_LEN], KernelError> {
    let mut tag = [0u8; TAG_LEN];
    MacLane::new(key, iv, msg, bits, &mut tag)?.run_single();
    Ok(tag)
}

/// Tags four independent messages in one 4-lane batch.
///
/// All four are validated before any tag is computed.
pub fn eia3_4_buffer(
    keys: [&[u8; KEY_LEN]; 4],
    ivs: [&[u8; IV_LEN]; 4],
    msgs: [&[u8]; 4],
    bits: [usize; 4],
) -> Result<[[u8; TAG_LEN]; 4], KernelError> {
    eia3_buffers(keys, ivs, msgs, bits)
}

/// `M` messages under one key, each with its own IV, in one `M`-lane batch.
pub fn eia3_multi_iv<const M: usize>(
    key: &[u8; KEY_LEN],
    ivs: [&[u8; IV_LEN]; M],
    msgs: [&[u8]; M],
    bits: [usize; M],
) -> Result<[[u8; TAG_LEN]; M], KernelError> {
    eia3_buffers([key; M], ivs, msgs, bits)
}

fn eia3_buffers<const M: usize>(
    keys: [&[u8; KEY_LEN]; M],
    ivs: [&[u8; IV_LEN]; M],
    msgs: [&[u8]; M],
    bits: [usize; M],
) -> Result<[[u8; TAG_LEN]; M], KernelError> {
    let mut tags = [[0u8; TAG_LEN]; M];
    let mut lanes: [Option<MacLane<'_>>; M] = core::array::from_fn(|_| None);
    for (i, tag) in tags.iter_mut().enumerate() {
        lanes[i] = Some(MacLane::new(keys[i], ivs[i], msgs[i], bits[i], tag)?);
    }
    eia3_group(&mut lanes)?;
    drop(lanes);
    Ok(tags)
}
