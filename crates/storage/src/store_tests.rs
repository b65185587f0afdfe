// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use shq_core::FakeClock;
use tempfile::tempdir;

const ORIGIN: i64 = 1_704_067_200; // 2024-01-01T00:00:00Z

fn event(id: &str, time: &str) -> EventRecord {
    let mut rec = EventRecord::bare(id);
    rec.time = Some(time.to_string());
    rec.mag = Some(5.0);
    rec.lon = Some(-120.0);
    rec.lat = Some(36.0);
    rec
}

fn store_at(dir: &Path, now: i64) -> FileStore<FakeClock> {
    FileStore::open_with(
        dir.join("events.json"),
        AssocParams::default(),
        FakeClock::at(now),
    )
    .unwrap()
}

#[test]
fn insert_get_delete_round_trip() {
    let dir = tempdir().unwrap();
    let mut store = store_at(dir.path(), ORIGIN);

    let rec = event("e1", "2024-01-01T00:00:00Z");
    store.insert_event(&rec, false).unwrap();
    assert_eq!(store.get_event(&EventId::new("e1")).unwrap(), rec);

    store.delete_event(&EventId::new("e1")).unwrap();
    assert!(store.get_event(&EventId::new("e1")).is_none());
}

#[test]
fn duplicate_insert_without_update_is_error() {
    let dir = tempdir().unwrap();
    let mut store = store_at(dir.path(), ORIGIN);

    let rec = event("e1", "2024-01-01T00:00:00Z");
    store.insert_event(&rec, false).unwrap();
    assert!(matches!(
        store.insert_event(&rec, false),
        Err(StorageError::DuplicateEvent(_))
    ));
    store.insert_event(&rec, true).unwrap();
}

#[test]
fn delete_unknown_is_error() {
    let dir = tempdir().unwrap();
    let mut store = store_at(dir.path(), ORIGIN);
    assert!(matches!(
        store.delete_event(&EventId::new("nope")),
        Err(StorageError::UnknownEvent(_))
    ));
}

#[test]
fn state_survives_reopen() {
    let dir = tempdir().unwrap();
    {
        let mut store = store_at(dir.path(), ORIGIN);
        let mut rec = event("e1", "2024-01-01T00:00:00Z");
        rec.repeats = Some(vec![ORIGIN + 600]);
        store.insert_event(&rec, false).unwrap();
    }
    let store = store_at(dir.path(), ORIGIN);
    assert_eq!(store.event_count(), 1);
    let rec = store.get_event(&EventId::new("e1")).unwrap();
    assert_eq!(rec.repeats.as_deref().unwrap(), &[ORIGIN + 600]);
}

#[test]
fn corrupt_file_is_moved_aside() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("events.json");
    std::fs::write(&path, b"{ not json").unwrap();

    let store = FileStore::open(&path).unwrap();
    assert_eq!(store.event_count(), 0);
    assert!(dir.path().join("events.bak").exists());
}

#[test]
fn get_repeats_skips_empty_and_unparseable() {
    let dir = tempdir().unwrap();
    let mut store = store_at(dir.path(), ORIGIN);

    let mut due = event("due", "2024-01-01T00:00:00Z");
    due.repeats = Some(vec![ORIGIN + 60]);
    store.insert_event(&due, false).unwrap();

    let no_schedule = event("quiet", "2024-01-01T00:00:00Z");
    store.insert_event(&no_schedule, false).unwrap();

    let mut bad_time = event("bad", "garbage");
    bad_time.repeats = Some(vec![ORIGIN + 60]);
    store.insert_event(&bad_time, false).unwrap();

    let repeats = store.get_repeats();
    assert_eq!(repeats.len(), 1);
    assert_eq!(repeats[0].0, "due");
    assert_eq!(repeats[0].1, ORIGIN);
    assert_eq!(repeats[0].2, vec![ORIGIN + 60]);
}

#[test]
fn associates_amps_within_window() {
    let dir = tempdir().unwrap();
    let mut store = store_at(dir.path(), ORIGIN);
    store
        .insert_event(&event("e1", "2024-01-01T00:00:00Z"), false)
        .unwrap();

    // Inside both windows
    store
        .insert_amp(Amplitude {
            station: "CI.PAS".to_string(),
            time: ORIGIN + 30,
            lon: -120.1,
            lat: 36.1,
        })
        .unwrap();
    // Too far away
    store
        .insert_amp(Amplitude {
            station: "US.FAR".to_string(),
            time: ORIGIN + 30,
            lon: -100.0,
            lat: 40.0,
        })
        .unwrap();
    // Too late
    store
        .insert_amp(Amplitude {
            station: "CI.LATE".to_string(),
            time: ORIGIN + 10_000,
            lon: -120.0,
            lat: 36.0,
        })
        .unwrap();

    let touched = store.associate_all().unwrap();
    assert_eq!(touched, vec![EventId::new("e1")]);
    assert_eq!(store.associated_amps(&EventId::new("e1")).len(), 1);
    assert_eq!(store.amp_count(), 2, "non-matching amps remain queued");

    // Second pass finds nothing new
    assert!(store.associate_all().unwrap().is_empty());
}

#[test]
fn touched_ids_are_deduplicated() {
    let dir = tempdir().unwrap();
    let mut store = store_at(dir.path(), ORIGIN);
    store
        .insert_event(&event("e1", "2024-01-01T00:00:00Z"), false)
        .unwrap();
    for station in ["CI.A", "CI.B"] {
        store
            .insert_amp(Amplitude {
                station: station.to_string(),
                time: ORIGIN + 10,
                lon: -120.0,
                lat: 36.0,
            })
            .unwrap();
    }
    assert_eq!(store.associate_all().unwrap().len(), 1);
    assert_eq!(store.associated_amps(&EventId::new("e1")).len(), 2);
}

#[test]
fn clean_amps_by_age() {
    let dir = tempdir().unwrap();
    let now = ORIGIN + 30 * 86_400;
    let mut store = store_at(dir.path(), now);

    store
        .insert_amp(Amplitude {
            station: "OLD".to_string(),
            time: now - 20 * 86_400,
            lon: 0.0,
            lat: 0.0,
        })
        .unwrap();
    store
        .insert_amp(Amplitude {
            station: "NEW".to_string(),
            time: now,
            lon: 0.0,
            lat: 0.0,
        })
        .unwrap();

    assert_eq!(store.clean_amps(10).unwrap(), 1);
    assert_eq!(store.amp_count(), 1);
    // Second pass removes nothing further.
    assert_eq!(store.clean_amps(10).unwrap(), 0);
}

#[test]
fn clean_events_by_origin_age() {
    let dir = tempdir().unwrap();
    let now = ORIGIN + 400 * 86_400;
    let mut store = store_at(dir.path(), now);

    store
        .insert_event(&event("old", "2024-01-01T00:00:00Z"), false)
        .unwrap();
    let recent_time = "2025-01-01T00:00:00Z";
    store.insert_event(&event("new", recent_time), false).unwrap();

    let removed = store.clean_events(365).unwrap();
    assert_eq!(removed, 1);
    assert!(store.get_event(&EventId::new("old")).is_none());
    assert!(store.get_event(&EventId::new("new")).is_some());
}
