//! Bit-at-a-time EEA3/EIA3 straight from the algorithm definitions. Slow;
//! only used as a test oracle for the blocked kernels.

use crate::core::zuc::LaneState;

fn keystream(key: &[u8; 16], iv: &[u8; 16], words: usize) -> Vec<u32> {
    let mut state = LaneState::new(key, iv);
    (0..words).map(|_| state.next_word()).collect()
}

fn bit(z: &[u32], i: usize) -> u32 {
    (z[i / 32] >> (31 - i % 32)) & 1
}

pub(crate) fn eea3(key: &[u8; 16], iv: &[u8; 16], src: &[u8]) -> Vec<u8> {
    let z = keystream(key, iv, src.len().div_ceil(4));
    let mut out = src.to_vec();
    for i in 0..src.len() * 8 {
        let byte = &mut out[i / 8];
        *byte ^= (bit(&z, i) as u8) << (7 - i % 8);
    }
    out
}

pub(crate) fn eia3(key: &[u8; 16], iv: &[u8; 16], msg: &[u8], bits: usize) -> [u8; 4] {
    let l = bits.div_ceil(32) + 2;
    let z = keystream(key, iv, l);
    let word = |i: usize| (0..32).fold(0u32, |acc, j| (acc << 1) | bit(&z, i + j));

    let mut t = 0u32;
    for i in 0..bits {
        if (msg[i / 8] >> (7 - i % 8)) & 1 == 1 {
            t ^= word(i);
        }
    }
    t ^= word(bits);
    t ^= z[l - 1];
    t.to_be_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_eia3_set1() {
        assert_eq!(eia3(&[0u8; 16], &[0u8; 16], &[0u8; 4], 1), [0xC8, 0xA9, 0x59, 0x5E]);
    }
}
