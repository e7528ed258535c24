// Widget module
// Read-only countdown feed for a home-screen style widget. It runs outside
// the app process, never writes, and shares only the persisted blob with the
// event store.

use chrono::{DateTime, Duration, Utc};

use crate::models::event::Event;
use crate::models::settings::{AppConfig, WidgetConfig};
use crate::services::countdown::{load_events, next_event};
use crate::services::storage::BlobStore;

pub const PLACEHOLDER_TITLE: &str = "Next Event";
pub const EMPTY_TITLE: &str = "No Events";

/// One rendered state of the widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountdownEntry {
    /// When this entry becomes current
    pub date: DateTime<Utc>,
    pub title: String,
    pub event_date: DateTime<Utc>,
    /// Time left until `event_date` as of `date`
    pub hours: u64,
    pub minutes: u64,
}

impl CountdownEntry {
    fn for_event(event: &Event, at: DateTime<Utc>) -> Self {
        let remaining = event.time_remaining(at);
        Self {
            date: at,
            title: event.title.clone(),
            event_date: event.date,
            hours: remaining.hours,
            minutes: remaining.minutes,
        }
    }

    fn stand_in(title: &str, now: DateTime<Utc>) -> Self {
        Self::for_event(&Event::new(title, now + Duration::hours(1)), now)
    }
}

/// When the host should ask for a new timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadPolicy {
    /// After the last entry has been shown
    AtEnd,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    pub entries: Vec<CountdownEntry>,
    pub policy: ReloadPolicy,
}

pub struct WidgetProvider {
    storage: Box<dyn BlobStore>,
    storage_key: String,
    settings: WidgetConfig,
}

impl WidgetProvider {
    pub fn new(storage: Box<dyn BlobStore>, config: &AppConfig) -> Self {
        Self {
            storage,
            storage_key: config.storage.key.clone(),
            settings: config.widget.clone(),
        }
    }

    /// Loads through the same path as the event store, so both pick the same
    /// next event from the same blob.
    pub fn next_event(&self, now: DateTime<Utc>) -> Option<Event> {
        let events = load_events(self.storage.as_ref(), &self.storage_key);
        next_event(&events, now).cloned()
    }

    /// Shown before any data is available.
    pub fn placeholder(&self, now: DateTime<Utc>) -> CountdownEntry {
        CountdownEntry::stand_in(PLACEHOLDER_TITLE, now)
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> CountdownEntry {
        match self.next_event(now) {
            Some(event) => CountdownEntry::for_event(&event, now),
            None => CountdownEntry::stand_in(EMPTY_TITLE, now),
        }
    }

    /// One entry per step from `now` until the next event starts, capped at
    /// the configured entry count. An event starting exactly at `now` still
    /// gets a single entry.
    pub fn timeline(&self, now: DateTime<Utc>) -> Timeline {
        let Some(event) = self.next_event(now) else {
            return Timeline {
                entries: vec![CountdownEntry::stand_in(EMPTY_TITLE, now)],
                policy: ReloadPolicy::AtEnd,
            };
        };

        let step = Duration::minutes(i64::from(self.settings.timeline_step_minutes.max(1)));
        let limit = self.settings.timeline_max_entries.max(1);

        let mut entries = Vec::new();
        let mut at = now;
        while at < event.date && entries.len() < limit {
            entries.push(CountdownEntry::for_event(&event, at));
            at += step;
        }
        if entries.is_empty() {
            entries.push(CountdownEntry::for_event(&event, now));
        }

        log::debug!(
            "Widget timeline for '{}': {} entries",
            event.title,
            entries.len()
        );

        Timeline {
            entries,
            policy: ReloadPolicy::AtEnd,
        }
    }
}
