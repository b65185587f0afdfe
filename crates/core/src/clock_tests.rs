// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fake_clock_advances() {
    let clock = FakeClock::at(1_000);
    assert_eq!(clock.now(), 1_000);

    clock.advance(30);
    assert_eq!(clock.now(), 1_030);

    clock.set(2_000);
    assert_eq!(clock.now(), 2_000);
}

#[test]
fn fake_clock_clones_share_time() {
    let clock = FakeClock::at(500);
    let observer = clock.clone();

    clock.advance(10);
    assert_eq!(observer.now(), 510);
}

#[test]
fn system_clock_is_past_2023() {
    // Sanity check against an obviously-wrong epoch source.
    assert!(SystemClock.now() > 1_672_531_200);
}
