// Event module
// Countdown event model with derived time-remaining helpers

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::offset::{dedup_offsets, default_offsets, NotificationOffset};

/// Stable identity of a countdown event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    /// Generate a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

impl FromStr for EventId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Whole hours and leftover minutes until an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeRemaining {
    pub hours: u64,
    pub minutes: u64,
}

impl fmt::Display for TimeRemaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}h {}m", self.hours, self.minutes)
    }
}

/// A named countdown target with the reminders that lead up to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub date: DateTime<Utc>,
    pub notification_offsets: Vec<NotificationOffset>,
}

impl Event {
    /// Create an event with a fresh id and the default reminder offsets.
    ///
    /// # Examples
    /// ```
    /// use event_countdown::models::event::Event;
    /// use chrono::{Duration, Utc};
    ///
    /// let event = Event::new("Launch", Utc::now() + Duration::days(2));
    /// assert_eq!(event.notification_offsets.len(), 7);
    /// ```
    pub fn new(title: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self::with_offsets(title, date, default_offsets())
    }

    /// Create an event with a fresh id and caller-chosen offsets.
    /// Duplicate offsets are dropped.
    pub fn with_offsets(
        title: impl Into<String>,
        date: DateTime<Utc>,
        offsets: Vec<NotificationOffset>,
    ) -> Self {
        let mut event = Self {
            id: EventId::new(),
            title: title.into(),
            date,
            notification_offsets: offsets,
        };
        event.normalize_offsets();
        event
    }

    /// Replace the generated id, e.g. when rebuilding an edited record.
    pub fn with_id(mut self, id: EventId) -> Self {
        self.id = id;
        self
    }

    /// Blank titles are rejected by the editing surfaces; the model itself
    /// stores whatever text it is given.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Event title cannot be empty".to_string());
        }
        Ok(())
    }

    /// Drop duplicate offsets, keeping the first occurrence of each.
    pub fn normalize_offsets(&mut self) {
        dedup_offsets(&mut self.notification_offsets);
    }

    /// True once `now` has moved beyond the event date.
    pub fn is_past(&self, now: DateTime<Utc>) -> bool {
        self.date < now
    }

    /// Hours and minutes left until the event, clamped to zero once past.
    pub fn time_remaining(&self, now: DateTime<Utc>) -> TimeRemaining {
        let gap = self.date.signed_duration_since(now);
        if gap <= chrono::Duration::zero() {
            return TimeRemaining::default();
        }
        TimeRemaining {
            hours: gap.num_hours().unsigned_abs(),
            minutes: (gap.num_minutes() % 60).unsigned_abs(),
        }
    }

    /// Absolute instant a reminder with `offset` fires, or `None` when it
    /// falls outside the representable range.
    pub fn reminder_time(&self, offset: NotificationOffset) -> Option<DateTime<Utc>> {
        offset
            .as_duration()
            .and_then(|d| self.date.checked_sub_signed(d))
    }
}
