use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use super::{all_options, dedup_offsets, default_offsets, NotificationOffset};

/// Reasons a custom reminder time cannot become an offset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OffsetError {
    #[error("Notification time must be before the event starts")]
    NotBeforeEvent,
    #[error("Notification time must be in the future")]
    NotInFuture,
}

/// Offsets currently selected for an event being created or edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetSelection {
    offsets: Vec<NotificationOffset>,
}

impl Default for OffsetSelection {
    fn default() -> Self {
        Self::new(default_offsets())
    }
}

impl OffsetSelection {
    pub fn new(mut offsets: Vec<NotificationOffset>) -> Self {
        dedup_offsets(&mut offsets);
        Self { offsets }
    }

    pub fn offsets(&self) -> &[NotificationOffset] {
        &self.offsets
    }

    pub fn into_offsets(self) -> Vec<NotificationOffset> {
        self.offsets
    }

    pub fn contains(&self, offset: NotificationOffset) -> bool {
        self.offsets.contains(&offset)
    }

    /// Flip a standard offset. Custom values are left untouched; they are
    /// added through [`add_custom`](Self::add_custom) and dropped with
    /// [`remove`](Self::remove).
    pub fn toggle(&mut self, offset: NotificationOffset) {
        if !offset.is_standard() {
            return;
        }
        if let Some(index) = self.offsets.iter().position(|o| *o == offset) {
            self.offsets.remove(index);
        } else {
            self.offsets.push(offset);
        }
    }

    /// Turn an absolute reminder time into an offset and select it.
    ///
    /// The reminder must land strictly before one second ahead of the event
    /// and strictly after `now`.
    pub fn add_custom(
        &mut self,
        event_date: DateTime<Utc>,
        reminder_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<NotificationOffset, OffsetError> {
        if reminder_at >= event_date - Duration::seconds(1) {
            return Err(OffsetError::NotBeforeEvent);
        }
        if reminder_at <= now {
            return Err(OffsetError::NotInFuture);
        }

        let offset = NotificationOffset::from_duration(event_date - reminder_at)
            .ok_or(OffsetError::NotBeforeEvent)?;
        if !self.contains(offset) {
            self.offsets.push(offset);
        }
        Ok(offset)
    }

    pub fn remove(&mut self, offset: NotificationOffset) {
        self.offsets.retain(|o| *o != offset);
    }

    /// Options to show for an event: catalog offsets whose reminder is still
    /// ahead of `now`, plus every selected custom offset, longest first.
    pub fn available(&self, event_date: DateTime<Utc>, now: DateTime<Utc>) -> Vec<NotificationOffset> {
        let mut options: Vec<NotificationOffset> = all_options()
            .into_iter()
            .filter(|offset| {
                offset
                    .as_duration()
                    .and_then(|d| event_date.checked_sub_signed(d))
                    .is_some_and(|reminder| reminder > now)
            })
            .chain(self.offsets.iter().copied().filter(|o| !o.is_standard()))
            .collect();
        options.sort_by(|a, b| b.cmp(a));
        options
    }

    /// Initial value for the custom time picker: an hour before the event
    /// when that is still ahead, otherwise one second from now, and never
    /// later than one second before the event.
    pub fn default_custom_time(event_date: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
        let hour_before = event_date - Duration::hours(1);
        let initial = if hour_before > now {
            hour_before
        } else {
            now + Duration::seconds(1)
        };
        initial.min(event_date - Duration::seconds(1))
    }
}
