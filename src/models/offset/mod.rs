// Offset module
// Standard reminder offsets, their labels, and the custom-offset fallback

mod selection;

pub use selection::{OffsetError, OffsetSelection};

use std::fmt;

use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::date::{format_short_date_time, humanize_seconds};

/// Whole seconds before an event's date at which a reminder fires.
///
/// Serialized as a bare number so persisted offsets keep their exact value,
/// whether or not they belong to the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationOffset(u64);

impl NotificationOffset {
    pub const AT_EVENT_TIME: Self = Self(0);
    pub const THIRTY_MINUTES: Self = Self(30 * 60);
    pub const ONE_HOUR: Self = Self(3600);
    pub const TWELVE_HOURS: Self = Self(12 * 3600);
    pub const ONE_DAY: Self = Self(24 * 3600);
    pub const TWO_DAYS: Self = Self(48 * 3600);
    pub const THREE_DAYS: Self = Self(72 * 3600);

    pub const fn from_seconds(seconds: u64) -> Self {
        Self(seconds)
    }

    /// Convert a chrono duration, truncating to whole seconds.
    /// Negative durations are not offsets and yield `None`.
    pub fn from_duration(duration: Duration) -> Option<Self> {
        u64::try_from(duration.num_seconds()).ok().map(Self)
    }

    pub const fn seconds(self) -> u64 {
        self.0
    }

    /// The offset as a chrono duration, or `None` when it exceeds chrono's range.
    pub fn as_duration(self) -> Option<Duration> {
        i64::try_from(self.0).ok().and_then(Duration::try_seconds)
    }

    pub fn is_at_event_time(self) -> bool {
        self.0 == 0
    }

    /// Whether the offset is one of the catalog entries.
    pub fn is_standard(self) -> bool {
        catalog_label(self).is_some()
    }

    /// Canonical catalog label, or "Custom offset" for anything else.
    pub fn description(self) -> String {
        catalog_label(self).unwrap_or("Custom offset").to_string()
    }

    /// Label shown next to a specific event: the catalog label when there is
    /// one, otherwise the absolute reminder time in the host's local zone.
    pub fn label_for(self, event_date: DateTime<Utc>) -> String {
        self.label_for_in(event_date.with_timezone(&Local))
    }

    /// Same as [`label_for`](Self::label_for) but formatted in the zone of
    /// `event_date`.
    pub fn label_for_in<Tz>(self, event_date: DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        if let Some(label) = catalog_label(self) {
            return label.to_string();
        }
        match self
            .as_duration()
            .and_then(|offset| event_date.clone().checked_sub_signed(offset))
        {
            Some(reminder) => format_short_date_time(&reminder),
            None => self.description(),
        }
    }

    /// Humanized span used in alert bodies ("3 days", "1 hour 15 minutes").
    pub fn phrase(self) -> String {
        humanize_seconds(self.0)
    }
}

impl fmt::Display for NotificationOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

/// Ordered catalog of standard offsets, longest first.
pub const CATALOG: [(NotificationOffset, &str); 7] = [
    (NotificationOffset::THREE_DAYS, "72 hours before"),
    (NotificationOffset::TWO_DAYS, "48 hours before"),
    (NotificationOffset::ONE_DAY, "24 hours before"),
    (NotificationOffset::TWELVE_HOURS, "12 hours before"),
    (NotificationOffset::ONE_HOUR, "1 hour before"),
    (NotificationOffset::THIRTY_MINUTES, "30 minutes before"),
    (NotificationOffset::AT_EVENT_TIME, "At event time"),
];

fn catalog_label(offset: NotificationOffset) -> Option<&'static str> {
    CATALOG
        .iter()
        .find(|(known, _)| *known == offset)
        .map(|(_, label)| *label)
}

/// Every selectable catalog offset, in display order.
pub fn all_options() -> Vec<NotificationOffset> {
    CATALOG.iter().map(|(offset, _)| *offset).collect()
}

/// Offsets applied to new events when the caller does not pick any.
pub fn default_offsets() -> Vec<NotificationOffset> {
    all_options()
}

/// Remove duplicate offsets, keeping the first occurrence of each value.
pub fn dedup_offsets(offsets: &mut Vec<NotificationOffset>) {
    let mut seen = std::collections::HashSet::with_capacity(offsets.len());
    offsets.retain(|offset| seen.insert(*offset));
}
