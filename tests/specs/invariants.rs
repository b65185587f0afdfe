//! Randomized invariants over arbitrary trigger interleavings.
//!
//! Single-flight: a second child is never launched for an id whose child
//! is still live. Schedule sanity: stored repeat lists stay strictly
//! ascending, and entries are in the future at the moment they are added.

use std::collections::HashMap;

use proptest::prelude::*;
use shq_core::{EventRecord, FakeClock};
use shq_engine::test_support::{origin_record, test_engine};
use shq_storage::EventHandler;
use tempfile::tempdir;

/// 2024-01-01T00:00:00Z
const ORIGIN: i64 = 1_704_067_200;
const ORIGIN_STR: &str = "2024-01-01T00:00:00Z";

const IDS: [&str; 3] = ["ev0", "ev1", "ev2"];

#[derive(Debug, Clone)]
enum Op {
    /// Origin trigger for `IDS[idx]` with the given magnitude.
    Origin { idx: usize, mag: f64 },
    /// A site-defined trigger for `IDS[idx]`.
    Other { idx: usize },
    /// Cancel for `IDS[idx]`.
    Cancel { idx: usize },
    /// Repeat scan tick.
    Tick,
    /// The child for `IDS[idx]` exits and is reaped.
    Finish { idx: usize },
    /// Clock advance in seconds.
    Advance { secs: i64 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..IDS.len(), prop_oneof![Just(2.0), Just(5.5), Just(6.5)])
            .prop_map(|(idx, mag)| Op::Origin { idx, mag }),
        (0..IDS.len()).prop_map(|idx| Op::Other { idx }),
        (0..IDS.len()).prop_map(|idx| Op::Cancel { idx }),
        Just(Op::Tick),
        (0..IDS.len()).prop_map(|idx| Op::Finish { idx }),
        (1i64..2_000).prop_map(|secs| Op::Advance { secs }),
    ]
}

/// Snapshot of every stored schedule, for diffing new entries.
fn schedules(handler: &impl EventHandler) -> HashMap<String, Vec<i64>> {
    handler
        .get_repeats()
        .into_iter()
        .map(|(id, _, repeats)| (id.to_string(), repeats))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn single_flight_and_schedule_sanity(
        ops in proptest::collection::vec(op_strategy(), 1..50)
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let dir = tempdir().unwrap();
            let clock = FakeClock::at(ORIGIN + 10);
            let mut engine = test_engine(dir.path(), clock.clone());

            // Model: which ids we believe have a live child.
            let mut live: HashMap<String, bool> = HashMap::new();
            let mut seen_spawns = 0usize;

            for op in ops {
                let before = schedules(&engine.handler);

                match op {
                    Op::Origin { idx, mag } => {
                        engine
                            .process_origin(origin_record(IDS[idx], ORIGIN_STR, mag), "origin")
                            .await
                            .unwrap();
                    }
                    Op::Other { idx } => {
                        engine
                            .process_other(EventRecord::bare(IDS[idx]), "Data association")
                            .unwrap();
                    }
                    Op::Cancel { idx } => {
                        engine.process_cancel(EventRecord::bare(IDS[idx])).unwrap();
                    }
                    Op::Tick => engine.scan_repeats().unwrap(),
                    Op::Finish { idx } => {
                        engine.spawner.finish(IDS[idx]);
                        live.insert(IDS[idx].to_string(), false);
                    }
                    Op::Advance { secs } => clock.advance(secs),
                }

                let now = shq_core::Clock::now(&clock);

                // Single-flight: every new spawn targets an id that was not
                // live, and marks it live.
                for (id, _action) in &engine.spawner.spawned[seen_spawns..] {
                    let was_live = live.get(id.as_str()).copied().unwrap_or(false);
                    prop_assert!(!was_live, "double dispatch for {id}");
                    live.insert(id.clone(), true);
                }
                seen_spawns = engine.spawner.spawned.len();

                // Schedules stay strictly ascending, and entries added by
                // this operation are in the future.
                let after = schedules(&engine.handler);
                for (id, repeats) in &after {
                    prop_assert!(
                        repeats.windows(2).all(|w| w[0] < w[1]),
                        "schedule for {id} not ascending: {repeats:?}"
                    );
                    let old = before.get(id).cloned().unwrap_or_default();
                    for entry in repeats {
                        if !old.contains(entry) {
                            prop_assert!(
                                *entry > now,
                                "new schedule entry {entry} for {id} is not in the future (now {now})"
                            );
                        }
                    }
                }
            }
            Ok(())
        })?;
    }
}
