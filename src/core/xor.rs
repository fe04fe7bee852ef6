#![forbid(unsafe_code)]
// Keystream XOR.
// - ZUC keystream is a sequence of 32-bit words serialised big-endian.
// - Whole words are combined 4 bytes at a time; a trailing partial word uses only its leading bytes.
// - Length checks are enforced at callers.

/// XORs `input` with the big-endian serialisation of `keystream`, writing into `out`.
/// Requires: `out.len() == input.len()` and `4 * keystream.len() >= input.len()`.
#[inline(always)]
pub fn xor_words(input: &[u8], keystream: &[u32], out: &mut [u8]) {
    let full = input.len() / 4;
    let mut a = [0u8; 4];
    for (i, word) in keystream.iter().take(full).enumerate() {
        let at = i * 4;
        a.copy_from_slice(&input[at..at + 4]);
        let x = u32::from_be_bytes(a) ^ *word;
        out[at..at + 4].copy_from_slice(&x.to_be_bytes());
    }

    let rest = input.len() - full * 4;
    if rest > 0 {
        let ks = keystream[full].to_be_bytes();
        let at = full * 4;
        for j in 0..rest {
            out[at + j] = input[at + j] ^ ks[j];
        }
    }
}

/// Serialises `words` big-endian into the front of `out`.
/// Requires: `out.len() >= 4 * words.len()`.
#[inline]
pub fn words_to_be_bytes(words: &[u32], out: &mut [u8]) {
    for (chunk, word) in out.chunks_exact_mut(4).zip(words) {
        chunk.copy_from_slice(&word.to_be_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xor_roundtrip() {
        let data = (0..100).map(|i| i as u8).collect::<Vec<u8>>();
        let key = (0..25).map(|i| (i as u32).wrapping_mul(0x9E37_79B9)).collect::<Vec<u32>>();
        let mut out = vec![0u8; 100];
        xor_words(&data, &key, &mut out);
        let mut back = vec![0u8; 100];
        xor_words(&out, &key, &mut back);
        assert_eq!(back, data);
    }

    #[test]
    fn test_xor_is_big_endian() {
        let mut out = [0u8; 6];
        xor_words(&[0u8; 6], &[0x0102_0304, 0x0506_0708], &mut out);
        assert_eq!(out, [1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_words_to_be_bytes() {
        let mut out = [0u8; 8];
        words_to_be_bytes(&[0xC8A9_595E, 0x0000_00FF], &mut out);
        assert_eq!(hex::encode(out), "c8a9595e000000ff");
    }
}
