//! The concrete end-to-end scenarios: fresh dispatch, filter drops, rapid
//! retrigger, scheduled repeats, alias absorption, and cancellation.

use shq_core::{EventId, FakeClock};
use shq_engine::test_support::{origin_record, test_engine, FakeSpawner};
use shq_engine::Engine;
use shq_storage::{EventHandler, FileStore};
use tempfile::tempdir;

/// 2024-01-01T00:00:00Z
const ORIGIN: i64 = 1_704_067_200;
const ORIGIN_STR: &str = "2024-01-01T00:00:00Z";

type SpecEngine = Engine<FileStore<FakeClock>, FakeSpawner, FakeClock>;

fn stored(engine: &SpecEngine, id: &str) -> shq_core::EventRecord {
    engine
        .handler
        .get_event(&EventId::new(id))
        .unwrap_or_else(|| panic!("event {id} not stored"))
}

/// Scenario 1: a fresh origin above all thresholds dispatches immediately,
/// computes its repeat schedule, and writes the descriptor.
#[tokio::test]
async fn fresh_origin_dispatch() {
    let dir = tempdir().unwrap();
    let now = ORIGIN + 10;
    let mut engine = test_engine(dir.path(), FakeClock::at(now));

    engine
        .process_origin(origin_record("e1", ORIGIN_STR, 6.0), "origin")
        .await
        .unwrap();

    assert_eq!(engine.spawner.actions_for("e1"), vec!["origin"]);
    assert_eq!(engine.spawner.live_count(), 1);

    let rec = stored(&engine, "e1");
    assert_eq!(rec.lastrun, Some(now));
    assert_eq!(rec.repeats.as_deref().unwrap(), &[ORIGIN + 60, ORIGIN + 600]);
    assert!(dir.path().join("data/e1/current/event.xml").exists());
}

/// Scenario 2: an origin below `minmag` leaves no trace.
#[tokio::test]
async fn too_small_magnitude() {
    let dir = tempdir().unwrap();
    let mut engine = test_engine(dir.path(), FakeClock::at(ORIGIN + 10));

    engine
        .process_origin(origin_record("e1", ORIGIN_STR, 2.0), "origin")
        .await
        .unwrap();

    assert!(engine.handler.get_event(&EventId::new("e1")).is_none());
    assert_eq!(engine.spawner.live_count(), 0);
    assert!(!dir.path().join("data/e1").exists());
}

/// Scenario 3: a retrigger 30 seconds after a dispatch is absorbed by the
/// hysteresis window.
#[tokio::test]
async fn rapid_retrigger() {
    let dir = tempdir().unwrap();
    let now = ORIGIN + 10;
    let clock = FakeClock::at(now);
    let mut engine = test_engine(dir.path(), clock.clone());

    engine
        .process_origin(origin_record("e1", ORIGIN_STR, 6.0), "origin")
        .await
        .unwrap();
    engine.spawner.finish("e1");

    clock.advance(30);
    engine
        .process_origin(origin_record("e1", ORIGIN_STR, 6.0), "origin")
        .await
        .unwrap();

    assert_eq!(engine.spawner.actions_for("e1"), vec!["origin"], "no second child");
    let rec = stored(&engine, "e1");
    assert!(rec.repeats.as_deref().unwrap()[0] <= now + 330);
    assert_eq!(rec.lastrun, Some(now), "lastrun unchanged");
}

/// Scenario 4: once the head of the schedule passes, a tick dispatches a
/// `Scheduled repeat` child, pops the head, and updates `lastrun`.
#[tokio::test]
async fn scheduled_repeat() {
    let dir = tempdir().unwrap();
    let clock = FakeClock::at(ORIGIN + 10);
    let mut engine = test_engine(dir.path(), clock.clone());

    engine
        .process_origin(origin_record("e1", ORIGIN_STR, 6.0), "origin")
        .await
        .unwrap();
    engine.spawner.finish("e1");

    clock.set(ORIGIN + 61);
    engine.scan_repeats().unwrap();

    assert_eq!(
        engine.spawner.actions_for("e1"),
        vec!["origin", "Scheduled repeat"]
    );
    let rec = stored(&engine, "e1");
    assert_eq!(rec.repeats.as_deref().unwrap(), &[ORIGIN + 600]);
    assert_eq!(rec.lastrun, Some(ORIGIN + 61));
}

/// Scenario 5: an origin whose alias already exists absorbs it: the alias
/// child is terminated, its row deleted, its data directory renamed, and
/// the new event dispatched past the filters.
#[tokio::test]
async fn alias_rename() {
    let dir = tempdir().unwrap();
    let mut engine = test_engine(dir.path(), FakeClock::at(ORIGIN + 10));

    engine
        .handler
        .insert_event(&origin_record("eOLD", ORIGIN_STR, 5.5), false)
        .unwrap();
    engine.spawner.set_live("eOLD");
    std::fs::create_dir_all(dir.path().join("data/eOLD/current")).unwrap();
    std::fs::write(dir.path().join("data/eOLD/current/event.xml"), b"<old/>").unwrap();

    let mut rec = origin_record("eNEW", ORIGIN_STR, 1.0); // below minmag
    rec.alt_eventids = Some("eOLD".to_string());
    engine.process_origin(rec, "origin").await.unwrap();

    assert_eq!(engine.spawner.killed, vec!["eOLD"]);
    assert!(engine.handler.get_event(&EventId::new("eOLD")).is_none());
    assert!(engine.handler.get_event(&EventId::new("eNEW")).is_some());
    assert!(!dir.path().join("data/eOLD").exists());
    assert!(dir.path().join("data/eNEW").exists());
    assert_eq!(
        engine.spawner.actions_for("eNEW"),
        vec!["origin"],
        "filters bypassed for the absorbing event"
    );
}

/// Scenario 6: cancelling an unknown event is a logged no-op; cancelling
/// via a known alias dispatches a cancel child for the known id.
#[tokio::test]
async fn cancel_unknown_and_alias() {
    let dir = tempdir().unwrap();
    let mut engine = test_engine(dir.path(), FakeClock::at(ORIGIN + 10));

    engine
        .process_cancel(shq_core::EventRecord::bare("unknown"))
        .unwrap();
    assert_eq!(engine.spawner.live_count(), 0);

    engine
        .handler
        .insert_event(&origin_record("known", ORIGIN_STR, 6.0), false)
        .unwrap();
    let mut rec = shq_core::EventRecord::bare("unknown");
    rec.alt_eventids = Some("known".to_string());
    engine.process_cancel(rec).unwrap();

    assert_eq!(engine.spawner.actions_for("known"), vec!["cancel"]);
}
