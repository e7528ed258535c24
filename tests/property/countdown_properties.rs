// Property-based tests for countdown selection, persistence and scheduling
#[path = "../fixtures/mod.rs"]
mod fixtures;

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use event_countdown::models::event::Event;
use event_countdown::models::offset::NotificationOffset;
use event_countdown::services::countdown::{decode_events, encode_events, next_event};
use event_countdown::services::notification::{InMemoryAlertCenter, NotificationScheduler};
use fixtures::dates;
use proptest::prelude::*;

/// Seconds around the fixture "now", roughly +/- 30 days
fn offset_from_now() -> impl Strategy<Value = i64> {
    -30 * 86_400i64..30 * 86_400i64
}

fn arb_offsets() -> impl Strategy<Value = Vec<NotificationOffset>> {
    prop::collection::vec(
        prop_oneof![
            Just(0u64),
            Just(1_800u64),
            Just(3_600u64),
            Just(86_400u64),
            Just(259_200u64),
            0u64..10_000_000u64,
        ],
        0..8,
    )
    .prop_map(|seconds| seconds.into_iter().map(NotificationOffset::from_seconds).collect())
}

fn arb_event() -> impl Strategy<Value = Event> {
    ("[A-Za-z ]{1,20}", offset_from_now(), 0u32..1_000_000_000u32, arb_offsets()).prop_map(
        |(title, secs, nanos, offsets)| {
            let date = dates::now() + Duration::seconds(secs) + Duration::nanoseconds(i64::from(nanos));
            Event::with_offsets(title, date, offsets)
        },
    )
}

fn at(secs: i64) -> DateTime<Utc> {
    dates::now() + Duration::seconds(secs)
}

proptest! {
    /// Property: once an event is past it stays past
    #[test]
    fn prop_is_past_is_monotonic(event in arb_event(), a in offset_from_now(), b in offset_from_now()) {
        let (earlier, later) = if a <= b { (at(a), at(b)) } else { (at(b), at(a)) };
        if event.is_past(earlier) {
            prop_assert!(event.is_past(later));
        }
        prop_assert_eq!(event.is_past(earlier), event.date < earlier);
    }

    /// Property: the selected event is upcoming and no upcoming event is sooner
    #[test]
    fn prop_next_event_is_minimal(events in prop::collection::vec(arb_event(), 0..12)) {
        let now = dates::now();
        match next_event(&events, now) {
            Some(chosen) => {
                prop_assert!(!chosen.is_past(now));
                for event in events.iter().filter(|e| !e.is_past(now)) {
                    prop_assert!(chosen.date <= event.date);
                }
            }
            None => prop_assert!(events.iter().all(|e| e.is_past(now))),
        }
    }

    /// Property: persisted events decode to exactly what was written
    #[test]
    fn prop_codec_round_trip(events in prop::collection::vec(arb_event(), 0..8)) {
        let bytes = encode_events(&events).unwrap();
        prop_assert_eq!(decode_events(&bytes).unwrap(), events);
    }

    /// Property: after two reschedules only the second offset set remains,
    /// and nothing is ever scheduled at or before now
    #[test]
    fn prop_reschedule_keeps_only_latest_offsets(
        event in arb_event(),
        first in arb_offsets(),
        second in arb_offsets(),
    ) {
        let now = dates::now();
        let center = InMemoryAlertCenter::authorized();
        let scheduler = NotificationScheduler::new(Arc::new(center.clone()));

        let mut edited = event.clone();
        edited.notification_offsets = first;
        edited.normalize_offsets();
        scheduler.reschedule(&edited, now);

        edited.notification_offsets = second;
        edited.normalize_offsets();
        scheduler.reschedule(&edited, now);

        let mut expected: Vec<NotificationOffset> = edited
            .notification_offsets
            .iter()
            .copied()
            .filter(|offset| edited.reminder_time(*offset).is_some_and(|t| t > now))
            .collect();
        expected.sort();

        let scheduled: Vec<NotificationOffset> = center.keys().iter().map(|k| k.offset).collect();
        prop_assert_eq!(scheduled, expected);
        prop_assert!(center.alerts().iter().all(|alert| alert.fire_at > now));
    }

    /// Property: rescheduling the same event twice is idempotent
    #[test]
    fn prop_reschedule_is_idempotent(event in arb_event()) {
        let now = dates::now();
        let center = InMemoryAlertCenter::authorized();
        let scheduler = NotificationScheduler::new(Arc::new(center.clone()));

        scheduler.reschedule(&event, now);
        let once = center.alerts();
        scheduler.reschedule(&event, now);
        prop_assert_eq!(center.alerts(), once);
    }
}
