use proptest::prelude::*;

use super::reference;
use super::*;
use crate::core::zuc::{BatchState, LaneState, BLOCK_WORDS};

fn key_iv() -> impl Strategy<Value = ([u8; 16], [u8; 16])> {
    (any::<[u8; 16]>(), any::<[u8; 16]>())
}

fn batch_matches_scalar<const N: usize>(
    inputs: &[([u8; 16], [u8; 16])],
    present: &[bool],
    blocks: usize,
) -> Result<(), TestCaseError> {
    let mut batch = BatchState::<N>::new(core::array::from_fn(|l| {
        present[l].then(|| (&inputs[l].0, &inputs[l].1))
    }));
    let mut out = [[0u32; BLOCK_WORDS]; N];
    for _ in 0..blocks {
        batch.keystream_block(&mut out);
    }
    for l in (0..N).filter(|&l| present[l]) {
        let mut scalar = LaneState::new(&inputs[l].0, &inputs[l].1);
        let mut expected = [0u32; BLOCK_WORDS];
        for _ in 0..blocks {
            scalar.keystream_block(&mut expected);
        }
        prop_assert_eq!(out[l], expected);
        prop_assert_eq!(batch.extract(l).unwrap(), scalar);
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn batch_x4_matches_scalar(
        inputs in proptest::collection::vec(key_iv(), 4),
        present in proptest::collection::vec(any::<bool>(), 4),
        blocks in 1usize..4
    ) {
        batch_matches_scalar::<4>(&inputs, &present, blocks)?;
    }

    #[test]
    fn batch_x8_matches_scalar(
        inputs in proptest::collection::vec(key_iv(), 8),
        present in proptest::collection::vec(any::<bool>(), 8),
        blocks in 1usize..3
    ) {
        batch_matches_scalar::<8>(&inputs, &present, blocks)?;
    }

    #[test]
    fn batch_x16_matches_scalar(
        inputs in proptest::collection::vec(key_iv(), 16),
        present in proptest::collection::vec(any::<bool>(), 16),
        blocks in 1usize..3
    ) {
        batch_matches_scalar::<16>(&inputs, &present, blocks)?;
    }

    #[test]
    fn eea3_group_matches_reference(
        (key, iv) in key_iv(),
        lens in proptest::collection::vec(proptest::option::of(1usize..=400), 8)
    ) {
        let srcs: Vec<Vec<u8>> = lens
            .iter()
            .map(|len| (0..len.unwrap_or(0)).map(|i| (i * 31 + 7) as u8).collect())
            .collect();
        let mut dsts: Vec<Vec<u8>> = srcs.iter().map(|s| vec![0u8; s.len()]).collect();

        let mut it = dsts.iter_mut();
        let mut lanes: [Option<CipherLane<'_>>; 8] = core::array::from_fn(|i| {
            let dst = it.next().unwrap();
            lens[i].map(|_| CipherLane::new(&key, &iv, &srcs[i], dst).unwrap())
        });
        let stats = eea3_group(&mut lanes).unwrap();
        drop(lanes);

        prop_assert_eq!(stats.active, lens.iter().flatten().count());
        prop_assert_eq!(stats.common % 64, 0);
        for i in (0..8).filter(|&i| lens[i].is_some()) {
            prop_assert_eq!(&dsts[i], &reference::eea3(&key, &iv, &srcs[i]));
        }
    }

    #[test]
    fn eia3_group_matches_reference(
        (key, iv) in key_iv(),
        bits in proptest::collection::vec(1usize..=1600, 4),
        msg in proptest::collection::vec(any::<u8>(), 200)
    ) {
        let mut tags = [[0u8; TAG_LEN]; 4];
        let mut it = tags.iter_mut();
        let mut lanes: [Option<MacLane<'_>>; 4] = core::array::from_fn(|i| {
            let tag = it.next().unwrap();
            Some(MacLane::new(&key, &iv, &msg, bits[i], tag).unwrap())
        });
        eia3_group(&mut lanes).unwrap();
        drop(lanes);

        for i in 0..4 {
            prop_assert_eq!(tags[i], reference::eia3(&key, &iv, &msg, bits[i]));
        }
    }
}
