use core::fmt;

use zeroize::Zeroize;

use super::{
    add31, feedback, load_lfsr, non_zero, nonlinear, reorganize, BLOCK_WORDS, INIT_ROUNDS, IV_LEN,
    KEY_LEN,
};

/// Scalar ZUC state: everything needed to resume generation at the next
/// 32-bit keystream word.
#[derive(Clone, PartialEq, Eq, Zeroize)]
pub struct LaneState {
    pub(crate) lfsr: [u32; 16],
    pub(crate) r1: u32,
    pub(crate) r2: u32,
}

impl LaneState {
    /// Loads key and IV and runs the full initialisation, so that the next
    /// call to [`next_word`](Self::next_word) yields keystream word `z_0`.
    pub fn new(key: &[u8; KEY_LEN], iv: &[u8; IV_LEN]) -> Self {
        let mut state = Self {
            lfsr: [0u32; 16],
            r1: 0,
            r2: 0,
        };
        load_lfsr(key, iv, &mut state.lfsr);
        for _ in 0..INIT_ROUNDS {
            let w = state.round();
            state.clock(w >> 1);
        }
        // First working-mode clocking; its output is discarded.
        state.round();
        state.clock(0);
        state
    }

    /// Runs F on the current state, updating R1/R2, and returns `W`.
    #[inline(always)]
    fn round(&mut self) -> u32 {
        let [x0, x1, x2, _] = self.reorganized();
        let (w, r1, r2) = nonlinear(x0, x1, x2, self.r1, self.r2);
        self.r1 = r1;
        self.r2 = r2;
        w
    }

    #[inline(always)]
    fn reorganized(&self) -> [u32; 4] {
        let s = &self.lfsr;
        reorganize(s[15], s[14], s[11], s[9], s[7], s[5], s[2], s[0])
    }

    /// Clocks the LFSR. `u` is the initialisation-mode input, 0 in working mode.
    #[inline(always)]
    fn clock(&mut self, u: u32) {
        let s = &self.lfsr;
        let v = non_zero(add31(feedback(s[0], s[4], s[10], s[13], s[15]), u));
        self.lfsr.copy_within(1..16, 0);
        self.lfsr[15] = v;
    }

    /// Produces the next keystream word.
    #[inline]
    pub fn next_word(&mut self) -> u32 {
        let x3 = self.reorganized()[3];
        let z = self.round() ^ x3;
        self.clock(0);
        z
    }

    /// Fills `out` with consecutive keystream words.
    pub fn fill_words(&mut self, out: &mut [u32]) {
        for word in out.iter_mut() {
            *word = self.next_word();
        }
    }

    /// Produces one native 64-byte keystream block.
    #[inline]
    pub fn keystream_block(&mut self, out: &mut [u32; BLOCK_WORDS]) {
        self.fill_words(out);
    }
}

impl fmt::Debug for LaneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LaneState").finish_non_exhaustive()
    }
}

impl Drop for LaneState {
    fn drop(&mut self) {
        #[cfg(feature = "safe-data")]
        crate::core::scrub::burn(self);
    }
}
