use core::fmt;

use zeroize::Zeroize;

use crate::core::scrub::Sensitive;

use super::{
    add31, feedback, load_lfsr, non_zero, nonlinear, reorganize, LaneState, ZucError,
    BLOCK_WORDS, INIT_ROUNDS, IV_LEN, KEY_LEN,
};

/// `N` ZUC generators laid out as struct-of-arrays and clocked in lockstep.
///
/// Register `r` of lane `l` lives at `lfsr[r][l]`. Every step below is a loop
/// over the `N` lanes of one register, which is the shape the 4/8/16-lane
/// SIMD kernels operate on.
///
/// Lanes given no key/IV are initialised from an all-zero key and IV and
/// simply produce keystream nobody reads.
pub struct BatchState<const N: usize> {
    lfsr: [[u32; N]; 16],
    r1: [u32; N],
    r2: [u32; N],
}

impl<const N: usize> BatchState<N> {
    /// Number of lanes.
    pub const WIDTH: usize = N;

    /// Loads and initialises every lane.
    pub fn new(inputs: [Option<(&[u8; KEY_LEN], &[u8; IV_LEN])>; N]) -> Self {
        let zero = [0u8; 16];
        let mut cells = Sensitive::new([0u32; 16]);
        let mut state = Self {
            lfsr: [[0u32; N]; 16],
            r1: [0u32; N],
            r2: [0u32; N],
        };
        for (lane, input) in inputs.iter().enumerate() {
            let (key, iv) = match input {
                Some((key, iv)) => (*key, *iv),
                None => (&zero, &zero),
            };
            load_lfsr(key, iv, &mut cells);
            for (reg, cell) in cells.iter().enumerate() {
                state.lfsr[reg][lane] = *cell;
            }
        }

        for _ in 0..INIT_ROUNDS {
            let mut w = state.round();
            for word in w.iter_mut() {
                *word >>= 1;
            }
            state.clock(&w);
        }
        state.round();
        state.clock(&[0u32; N]);
        state
    }

    fn reorganized(&self) -> [[u32; N]; 4] {
        let s = &self.lfsr;
        let mut x = [[0u32; N]; 4];
        for l in 0..N {
            let v = reorganize(
                s[15][l], s[14][l], s[11][l], s[9][l], s[7][l], s[5][l], s[2][l], s[0][l],
            );
            x[0][l] = v[0];
            x[1][l] = v[1];
            x[2][l] = v[2];
            x[3][l] = v[3];
        }
        x
    }

    /// F on every lane; returns `W` and the X3 word per lane.
    fn round_with_x3(&mut self) -> ([u32; N], [u32; N]) {
        let x = self.reorganized();
        let mut w = [0u32; N];
        for l in 0..N {
            let (wl, r1, r2) = nonlinear(x[0][l], x[1][l], x[2][l], self.r1[l], self.r2[l]);
            w[l] = wl;
            self.r1[l] = r1;
            self.r2[l] = r2;
        }
        (w, x[3])
    }

    fn round(&mut self) -> [u32; N] {
        self.round_with_x3().0
    }

    fn clock(&mut self, u: &[u32; N]) {
        let mut v = [0u32; N];
        {
            let s = &self.lfsr;
            for l in 0..N {
                v[l] = non_zero(add31(
                    feedback(s[0][l], s[4][l], s[10][l], s[13][l], s[15][l]),
                    u[l],
                ));
            }
        }
        self.lfsr.copy_within(1..16, 0);
        self.lfsr[15] = v;
    }

    /// One keystream word for every lane.
    pub fn next_words(&mut self) -> [u32; N] {
        let (mut z, x3) = self.round_with_x3();
        for l in 0..N {
            z[l] ^= x3[l];
        }
        self.clock(&[0u32; N]);
        z
    }

    /// One 64-byte keystream block per lane, written lane-major.
    pub fn keystream_block(&mut self, out: &mut [[u32; BLOCK_WORDS]; N]) {
        for j in 0..BLOCK_WORDS {
            let z = self.next_words();
            for l in 0..N {
                out[l][j] = z[l];
            }
        }
    }

    /// Copies lane `lane` out as a standalone scalar state.
    pub fn extract(&self, lane: usize) -> Result<LaneState, ZucError> {
        self.check(lane)?;
        let mut lfsr = [0u32; 16];
        for (reg, cell) in lfsr.iter_mut().enumerate() {
            *cell = self.lfsr[reg][lane];
        }
        Ok(LaneState {
            lfsr,
            r1: self.r1[lane],
            r2: self.r2[lane],
        })
    }

    /// Overwrites lane `lane` with a scalar state.
    pub fn inject(&mut self, lane: usize, state: &LaneState) -> Result<(), ZucError> {
        self.check(lane)?;
        for (reg, cell) in state.lfsr.iter().enumerate() {
            self.lfsr[reg][lane] = *cell;
        }
        self.r1[lane] = state.r1;
        self.r2[lane] = state.r2;
        Ok(())
    }

    fn check(&self, lane: usize) -> Result<(), ZucError> {
        if lane >= N {
            return Err(ZucError::LaneOutOfRange { lane, width: N });
        }
        Ok(())
    }
}

impl<const N: usize> Zeroize for BatchState<N> {
    fn zeroize(&mut self) {
        self.lfsr.zeroize();
        self.r1.zeroize();
        self.r2.zeroize();
    }
}

impl<const N: usize> Drop for BatchState<N> {
    fn drop(&mut self) {
        #[cfg(feature = "safe-data")]
        crate::core::scrub::burn(self);
    }
}

impl<const N: usize> fmt::Debug for BatchState<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchState").field("width", &N).finish_non_exhaustive()
    }
}
