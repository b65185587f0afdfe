// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;

fn tiers() -> RepeatTiers {
    RepeatTiers::new(vec![
        RepeatTier {
            threshold: 6.0,
            offsets: vec![60, 600, 3600],
        },
        RepeatTier {
            threshold: 0.0,
            offsets: vec![300],
        },
        RepeatTier {
            threshold: 4.5,
            offsets: vec![120, 1200],
        },
    ])
}

#[yare::parameterized(
    below_all     = { 0.0, None },
    small         = { 3.0, Some(&[300][..]) },
    at_threshold  = { 4.5, Some(&[300][..]) },   // strictly-below rule
    mid           = { 5.0, Some(&[120, 1200][..]) },
    large         = { 7.2, Some(&[60, 600, 3600][..]) },
)]
fn tier_selection(mag: f64, expected: Option<&[i64]>) {
    assert_eq!(tiers().offsets_for(mag), expected);
}

#[test]
fn compute_prunes_past_entries() {
    let origin = 10_000;
    // mag 5.0 → offsets [120, 1200]; now is past the first entry
    let out = tiers().compute(origin, 5.0, origin + 500).unwrap();
    assert_eq!(out, vec![origin + 1200]);
}

#[test]
fn compute_all_past_is_none() {
    let origin = 10_000;
    assert_eq!(tiers().compute(origin, 5.0, origin + 2_000), None);
}

#[test]
fn compute_without_matching_tier_is_none() {
    let empty = RepeatTiers::default();
    assert_eq!(empty.compute(10_000, 9.0, 0), None);
}

proptest! {
    // Schedule invariant: computed repeat lists are strictly ascending and
    // strictly in the future.
    #[test]
    fn computed_schedules_are_ascending_and_future(
        origin in 0i64..2_000_000_000,
        mag in 0.0f64..10.0,
        lead in 0i64..10_000,
    ) {
        let now = origin + lead;
        if let Some(times) = tiers().compute(origin, mag, now) {
            prop_assert!(!times.is_empty());
            prop_assert!(times.iter().all(|t| *t > now));
            prop_assert!(times.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
