//! Property-based tests for the NF4 sentinel encoding
//!
//! Field lanes hold values up to 65536 while data words carry 16 bits per
//! lane; pack/unpack move between the two with a flag per 65536 lane.

use nttec::{Field, Nf4};
use proptest::prelude::*;

const SENTINEL: u32 = 65536;

fn data_word(lanes: &[u16; 4]) -> u128 {
    lanes
        .iter()
        .enumerate()
        .fold(0u128, |acc, (i, &v)| acc | ((v as u128) << (16 * i)))
}

proptest! {
    /// Property: pack puts the sentinel in flagged lanes and the data elsewhere,
    /// and unpack returns the flag with flagged lanes cleared
    #[test]
    fn prop_pack_then_unpack(
        lanes in any::<[u16; 4]>(),
        flag in 0u32..16,
    ) {
        let nf4 = Nf4::<u128>::new(4).unwrap();
        let raw = data_word(&lanes);
        let packed = nf4.pack(raw, flag);
        prop_assert!(nf4.check(packed));

        let mut cleared = lanes;
        for i in 0..4u32 {
            let expected = if flag >> i & 1 == 1 {
                cleared[i as usize] = 0;
                SENTINEL
            } else {
                lanes[i as usize] as u32
            };
            prop_assert_eq!(nf4.get(packed, i), expected);
        }

        let unpacked = nf4.unpack(packed);
        prop_assert_eq!(unpacked.flag, flag);
        prop_assert_eq!(unpacked.values, data_word(&cleared));
    }

    /// Property: every field element survives unpack followed by pack
    #[test]
    fn prop_unpack_then_pack_restores_element(
        values in prop::collection::vec(prop_oneof![Just(SENTINEL), 0u32..SENTINEL], 4),
        n_lanes in 1u32..=4,
    ) {
        let nf4 = Nf4::<u128>::new(n_lanes).unwrap();
        let element = nf4.from_lanes(&values);
        let unpacked = nf4.unpack(element);
        prop_assert!(unpacked.flag < 1 << n_lanes);
        prop_assert_eq!(nf4.pack(unpacked.values, unpacked.flag), element);
    }
}
