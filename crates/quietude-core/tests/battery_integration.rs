//! Integration tests for the social energy engine.

use chrono::{DateTime, TimeDelta, Utc};
use quietude_core::{
    Activity, ActivityKind, BatteryDb, Config, EnergyEngine, EngineEvent, SleepQuality,
};

fn engine() -> EnergyEngine {
    EnergyEngine::with_store(BatteryDb::open_memory().unwrap(), Config::default()).unwrap()
}

fn at(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .unwrap()
        .with_timezone(&Utc)
}

#[test]
fn two_due_events_deplete_once_with_one_plural_notification() {
    // Scenario: level 40, two due unconsumed events costing 10 and 15.
    let mut engine = engine();
    engine.set_level(40).unwrap();
    let now = Utc::now();
    engine
        .schedule_event("Team dinner", now - TimeDelta::hours(1), 10)
        .unwrap();
    engine
        .schedule_event("Phone call", now - TimeDelta::minutes(30), 15)
        .unwrap();
    let rx = engine.subscribe();

    let summary = engine.tick(now).unwrap().expect("tick consumed events");

    assert_eq!(summary.total_cost, 25);
    assert_eq!(summary.change.applied.value(), 15);
    assert_eq!(engine.level().value(), 15);
    assert!(engine.events().unwrap().iter().all(|e| e.consumed));

    let notifications: Vec<EngineEvent> = rx.try_iter().collect();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].summary(), "Energy depleted for 2 events");
}

#[test]
fn reconciler_is_idempotent_over_consumed_events() {
    let mut engine = engine();
    let now = Utc::now();
    engine
        .schedule_event("Brunch", now - TimeDelta::hours(2), 10)
        .unwrap();

    assert!(engine.tick(now).unwrap().is_some());
    let level_after = engine.level();
    let history_after = engine.history(None).unwrap().len();

    // Re-running over a log where everything due is already consumed
    // produces no level change and no history entry.
    assert!(engine.tick(now).unwrap().is_none());
    assert!(engine.tick(now + TimeDelta::minutes(1)).unwrap().is_none());
    assert_eq!(engine.level(), level_after);
    assert_eq!(engine.history(None).unwrap().len(), history_after);
}

#[test]
fn single_event_gets_singular_notification() {
    let mut engine = engine();
    let now = Utc::now();
    engine
        .schedule_event("Book club", now - TimeDelta::minutes(5), 20)
        .unwrap();
    let rx = engine.subscribe();

    engine.tick(now).unwrap().expect("tick consumed the event");

    let notifications: Vec<EngineEvent> = rx.try_iter().collect();
    assert_eq!(notifications.len(), 1);
    assert_eq!(
        notifications[0].summary(),
        "Energy depleted for event: Book club"
    );
}

#[test]
fn good_sleep_at_ninety_clamps_to_full() {
    // Scenario: level 90, good sleep (+50) clamps at 100.
    let mut engine = engine();
    engine.set_level(90).unwrap();

    let record = engine.record_sleep_quality(SleepQuality::Good).unwrap();

    assert_eq!(record.applied_delta, 50);
    assert_eq!(engine.level().value(), 100);

    let sleep_log = engine.sleep_log().unwrap();
    assert_eq!(sleep_log.len(), 1);

    // Forced history entry even though the visible change was 10.
    let history = engine.history(None).unwrap();
    assert_eq!(history.last().unwrap().level.value(), 100);
}

#[test]
fn overnight_recharge_applies_once_and_advances_checkpoint() {
    // Scenario: level 70, event-free night, checkpoint at yesterday.
    let now = at("2026-08-07T09:00:00+00:00");
    let db = BatteryDb::open_memory().unwrap();
    db.advance_checkpoint(now.date_naive() - TimeDelta::days(1))
        .unwrap();
    let mut engine = EnergyEngine::with_store(db, Config::default()).unwrap();

    let outcome = engine.on_resume(now).unwrap().expect("first run today");

    assert!(!outcome.blocked);
    assert_eq!(outcome.change.unwrap().applied.value(), 100);
    assert_eq!(engine.level().value(), 100);
    assert_eq!(engine.last_recharge_date(), Some(now.date_naive()));
}

#[test]
fn repeated_launches_evaluate_overnight_recharge_once() {
    let now = at("2026-08-07T07:30:00+00:00");
    let mut engine = engine();
    engine.set_level(20).unwrap();

    let first = engine.on_resume(now).unwrap();
    assert!(first.is_some());
    let level_after_first = engine.level();

    for minutes in [5, 90, 600] {
        let later = now + TimeDelta::minutes(minutes);
        assert!(engine.on_resume(later).unwrap().is_none());
    }

    assert_eq!(engine.level(), level_after_first);
    assert_eq!(engine.last_recharge_date(), Some(now.date_naive()));
}

#[test]
fn late_night_event_blocks_recharge_but_checkpoint_advances() {
    let now = at("2026-08-07T08:00:00+00:00");
    let mut engine = engine();
    engine.set_level(30).unwrap();

    // 23:00 yesterday, inside [22:00 yesterday, 06:00 today).
    engine
        .schedule_event("Late concert", at("2026-08-06T23:00:00+00:00"), 1)
        .unwrap();

    let outcome = engine.on_resume(now).unwrap().expect("first run today");

    assert!(outcome.blocked);
    assert!(outcome.change.is_none());
    assert_eq!(engine.level().value(), 30);
    assert_eq!(engine.last_recharge_date(), Some(now.date_naive()));

    // Same day again: no re-evaluation, still no recharge.
    assert!(engine
        .on_resume(now + TimeDelta::hours(2))
        .unwrap()
        .is_none());
    assert_eq!(engine.level().value(), 30);
}

#[test]
fn early_morning_event_also_blocks_recharge() {
    let now = at("2026-08-07T09:00:00+00:00");
    let mut engine = engine();
    engine.set_level(30).unwrap();
    engine
        .schedule_event("Red-eye flight", at("2026-08-07T05:30:00+00:00"), 5)
        .unwrap();

    let outcome = engine.on_resume(now).unwrap().unwrap();
    assert!(outcome.blocked);
    assert_eq!(engine.level().value(), 30);
}

#[test]
fn six_am_event_does_not_block_recharge() {
    let now = at("2026-08-07T09:00:00+00:00");
    let mut engine = engine();
    engine.set_level(30).unwrap();
    // Window end is exclusive.
    engine
        .schedule_event("Morning swim", at("2026-08-07T06:00:00+00:00"), 5)
        .unwrap();

    let outcome = engine.on_resume(now).unwrap().unwrap();
    assert!(!outcome.blocked);
    assert_eq!(engine.level().value(), 80);
}

#[test]
fn history_timestamps_strictly_increase() {
    let mut engine = engine();

    engine.set_level(40).unwrap();
    engine.record_sleep_quality(SleepQuality::Bad).unwrap();
    engine
        .log_activity(Activity::new("Walk", ActivityKind::Recharge, 10, 30))
        .unwrap();
    engine
        .log_activity(Activity::new("Call", ActivityKind::Depletion, 3, 15))
        .unwrap();

    let history = engine.history(None).unwrap();
    assert!(history.len() >= 4);
    for pair in history.windows(2) {
        assert!(pair[1].recorded_at > pair[0].recorded_at);
    }
}

#[test]
fn significant_drift_always_lands_in_history() {
    let mut engine = engine();
    engine.set_level(40).unwrap(); // 70 -> 40, recorded
    engine.set_level(44).unwrap(); // 4 below the last entry, dropped
    engine.set_level(50).unwrap(); // 10 above the last entry, recorded

    let history = engine.history(None).unwrap();
    let levels: Vec<u8> = history.iter().map(|e| e.level.value()).collect();
    assert!(levels.contains(&40));
    assert!(!levels.contains(&44));
    assert!(levels.contains(&50));
}

#[test]
fn past_timestamped_event_depletes_on_next_tick() {
    let mut engine = engine();
    let now = Utc::now();

    // Created already-due; nothing happens until a tick runs.
    engine
        .schedule_event("Missed meeting", now - TimeDelta::hours(3), 10)
        .unwrap();
    assert_eq!(engine.level().value(), 70);

    let summary = engine.tick(now).unwrap().unwrap();
    assert_eq!(summary.total_cost, 10);
    assert_eq!(engine.level().value(), 60);
}

#[test]
fn future_events_are_left_alone() {
    let mut engine = engine();
    let now = Utc::now();
    engine
        .schedule_event("Next week", now + TimeDelta::days(7), 40)
        .unwrap();

    assert!(engine.tick(now).unwrap().is_none());
    assert_eq!(engine.level().value(), 70);
    assert!(!engine.events().unwrap()[0].consumed);
    assert_eq!(engine.next_due(), Some(now + TimeDelta::days(7)));
}

mod level_bounds {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// For all sequences of applies, 0 <= level <= 100 after every
        /// operation.
        #[test]
        fn any_sequence_of_applies_stays_in_bounds(
            ops in prop::collection::vec((any::<bool>(), 1u8..=100), 0..40)
        ) {
            let mut engine = engine();
            for (recharge, magnitude) in ops {
                let kind = if recharge {
                    ActivityKind::Recharge
                } else {
                    ActivityKind::Depletion
                };
                let applied = engine
                    .log_activity(Activity::new("Fuzzed", kind, magnitude, 10))
                    .unwrap();
                prop_assert!(applied.change.applied.value() <= 100);
                prop_assert!(engine.level().value() <= 100);
            }
        }
    }
}
