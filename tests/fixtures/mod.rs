// Test fixtures - reusable test data
// Provides consistent dates, events and wiring across all test files

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use event_countdown::models::event::Event;
use event_countdown::services::countdown::EventStore;
use event_countdown::services::notification::{
    AuthorizationStatus, InMemoryAlertCenter, NotificationScheduler,
};
use event_countdown::services::storage::BlobStore;
use event_countdown::utils::clock::FixedClock;

pub const KEY: &str = "savedEvents";

/// Sample dates for testing
pub mod dates {
    use super::*;

    /// Jan 7, 2025 at noon UTC, the "current time" for most tests
    pub fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 7, 12, 0, 0).unwrap()
    }

    /// Feb 29, 2024 (leap year)
    pub fn leap_day_2024() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap()
    }
}

/// Sample events for testing
pub mod events {
    use super::*;

    /// "Launch" two days out with the default offsets
    pub fn launch() -> Event {
        Event::new("Launch", dates::now() + Duration::days(2))
    }

    pub fn birthday() -> Event {
        Event::new("Birthday", dates::now() + Duration::days(10))
    }

    pub fn already_happened() -> Event {
        Event::new("Already happened", dates::now() - Duration::hours(2))
    }
}

/// A store wired to an in-memory alert center and a fixed clock.
pub struct TestApp {
    pub store: EventStore,
    pub center: InMemoryAlertCenter,
    pub clock: FixedClock,
}

pub fn app_with(storage: Box<dyn BlobStore>, status: AuthorizationStatus) -> TestApp {
    let center = InMemoryAlertCenter::new(status);
    let clock = FixedClock::new(dates::now());
    let scheduler = Arc::new(NotificationScheduler::new(Arc::new(center.clone())));
    let store = EventStore::open(storage, KEY, scheduler, Arc::new(clock.clone()));
    TestApp {
        store,
        center,
        clock,
    }
}

pub fn authorized_app(storage: Box<dyn BlobStore>) -> TestApp {
    app_with(storage, AuthorizationStatus::Authorized)
}
