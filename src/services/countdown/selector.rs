use chrono::{DateTime, Utc};

use crate::models::event::Event;

/// The upcoming event with the earliest date. Equal dates resolve by id so
/// every caller sees the same answer.
pub fn next_event<'a, I>(events: I, now: DateTime<Utc>) -> Option<&'a Event>
where
    I: IntoIterator<Item = &'a Event>,
{
    events
        .into_iter()
        .filter(|event| !event.is_past(now))
        .min_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)))
}
