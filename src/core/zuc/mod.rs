//! ZUC-128 keystream generator.
//!
//! The generator is provided in two shapes that must stay bit-for-bit
//! interchangeable:
//! - [`LaneState`]: one scalar generator, able to resume at any 32-bit word.
//! - [`BatchState`]: `N` generators stored as struct-of-arrays and clocked in
//!   lockstep, so that every per-lane operation is a loop over `N` adjacent
//!   words that the compiler can vectorize.
//!
//! `BatchState::extract` / `BatchState::inject` move one lane between the
//! two shapes.
//!
//! # Reference
//! ETSI/SAGE, "Specification of the 3GPP Confidentiality and Integrity
//! Algorithms 128-EEA3 & 128-EIA3, Document 2: ZUC Specification".

use core::fmt;

mod batch;
mod lane;
mod tables;

pub use batch::BatchState;
pub use lane::LaneState;

use tables::{EK_D, S0, S1};

/// Key length in bytes.
pub const KEY_LEN: usize = 16;
/// IV length in bytes.
pub const IV_LEN: usize = 16;
/// Words produced per keystream block.
pub const BLOCK_WORDS: usize = 16;
/// Bytes per keystream block; the native block of every ZUC kernel.
pub const BLOCK_BYTES: usize = BLOCK_WORDS * 4;
/// Bits per keystream block.
pub const BLOCK_BITS: usize = BLOCK_BYTES * 8;

/// Number of initialisation-mode clockings before the first output word.
const INIT_ROUNDS: usize = 32;
const MASK31: u32 = 0x7FFF_FFFF;

/// Errors raised by the ZUC state types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZucError {
    /// A lane index at or beyond the batch width.
    LaneOutOfRange { lane: usize, width: usize },
}

impl fmt::Display for ZucError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZucError::LaneOutOfRange { lane, width } => {
                write!(f, "Lane {} out of range for a {}-lane batch", lane, width)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ZucError {}

/// Builds the 16-byte 128-EEA3 IV from the 3GPP confidentiality inputs.
///
/// `bearer` is 5 bits and `direction` 1 bit; higher bits are ignored.
pub fn eea3_iv(count: u32, bearer: u8, direction: u8) -> [u8; IV_LEN] {
    let mut iv = [0u8; IV_LEN];
    iv[..4].copy_from_slice(&count.to_be_bytes());
    iv[4] = ((bearer & 0x1F) << 3) | ((direction & 0x01) << 2);
    let (head, tail) = iv.split_at_mut(8);
    tail.copy_from_slice(head);
    iv
}

/// Builds the 16-byte 128-EIA3 IV from the 3GPP integrity inputs.
///
/// Unlike EEA3 the direction bit is folded into bytes 8 and 14.
pub fn eia3_iv(count: u32, bearer: u8, direction: u8) -> [u8; IV_LEN] {
    let mut iv = [0u8; IV_LEN];
    iv[..4].copy_from_slice(&count.to_be_bytes());
    iv[4] = (bearer & 0x1F) << 3;
    let (head, tail) = iv.split_at_mut(8);
    tail.copy_from_slice(head);
    iv[8] ^= (direction & 0x01) << 7;
    iv[14] ^= (direction & 0x01) << 7;
    iv
}

/// Loads key and IV into the 16 31-bit LFSR cells: `s_i = k_i || d_i || iv_i`.
///
/// Writes in place so no key-derived copy is left behind.
#[inline(always)]
fn load_lfsr(key: &[u8; KEY_LEN], iv: &[u8; IV_LEN], cells: &mut [u32; 16]) {
    for (i, cell) in cells.iter_mut().enumerate() {
        *cell = (u32::from(key[i]) << 23) | (EK_D[i] << 8) | u32::from(iv[i]);
    }
}

/// Addition modulo 2^31 - 1.
#[inline(always)]
fn add31(a: u32, b: u32) -> u32 {
    let c = a.wrapping_add(b);
    (c & MASK31).wrapping_add(c >> 31)
}

/// Multiplication by 2^k modulo 2^31 - 1 (a 31-bit rotation).
#[inline(always)]
fn rot31(a: u32, k: u32) -> u32 {
    ((a << k) | (a >> (31 - k))) & MASK31
}

/// The LFSR feedback polynomial, without the initialisation-mode input.
#[inline(always)]
fn feedback(s0: u32, s4: u32, s10: u32, s13: u32, s15: u32) -> u32 {
    let mut f = s0;
    f = add31(f, rot31(s0, 8));
    f = add31(f, rot31(s4, 20));
    f = add31(f, rot31(s10, 21));
    f = add31(f, rot31(s13, 17));
    add31(f, rot31(s15, 15))
}

/// The all-zero cell is forbidden; it is replaced by 2^31 - 1.
#[inline(always)]
fn non_zero(v: u32) -> u32 {
    let zero = u32::from(v == 0);
    v | (zero.wrapping_neg() & MASK31)
}

#[inline(always)]
fn l1(x: u32) -> u32 {
    x ^ x.rotate_left(2) ^ x.rotate_left(10) ^ x.rotate_left(18) ^ x.rotate_left(24)
}

#[inline(always)]
fn l2(x: u32) -> u32 {
    x ^ x.rotate_left(8) ^ x.rotate_left(14) ^ x.rotate_left(22) ^ x.rotate_left(30)
}

#[inline(always)]
fn sbox(x: u32) -> u32 {
    let [b0, b1, b2, b3] = x.to_be_bytes();
    u32::from_be_bytes([
        S0[usize::from(b0)],
        S1[usize::from(b1)],
        S0[usize::from(b2)],
        S1[usize::from(b3)],
    ])
}

/// Bit reorganisation: returns `[X0, X1, X2, X3]`.
#[inline(always)]
fn reorganize(s15: u32, s14: u32, s11: u32, s9: u32, s7: u32, s5: u32, s2: u32, s0: u32) -> [u32; 4] {
    [
        ((s15 & 0x7FFF_8000) << 1) | (s14 & 0xFFFF),
        ((s11 & 0xFFFF) << 16) | (s9 >> 15),
        ((s7 & 0xFFFF) << 16) | (s5 >> 15),
        ((s2 & 0xFFFF) << 16) | (s0 >> 15),
    ]
}

/// Nonlinear function F. Returns `(W, R1', R2')`.
#[inline(always)]
fn nonlinear(x0: u32, x1: u32, x2: u32, r1: u32, r2: u32) -> (u32, u32, u32) {
    let w = (x0 ^ r1).wrapping_add(r2);
    let w1 = r1.wrapping_add(x1);
    let w2 = r2 ^ x2;
    let u = l1((w1 << 16) | (w2 >> 16));
    let v = l2((w2 << 16) | (w1 >> 16));
    (w, sbox(u), sbox(v))
}
