use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::codec::{encode_events, load_events};
use super::selector;
use crate::models::event::{Event, EventId};
use crate::services::notification::NotificationScheduler;
use crate::services::storage::BlobStore;
use crate::utils::clock::Clock;

/// Mutation broadcast to subscribers after it has been persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreChange {
    Added(EventId),
    Updated(EventId),
    Removed(EventId),
    Reloaded,
}

/// What [`EventStore::refresh`] changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefreshReport {
    pub rescheduled: usize,
    pub removed: usize,
    pub orphans_cancelled: usize,
}

impl RefreshReport {
    pub fn has_changes(&self) -> bool {
        self.rescheduled + self.removed + self.orphans_cancelled > 0
    }
}

/// Handle returned by [`EventStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub type ChangeListener = Box<dyn Fn(&StoreChange) + Send + Sync>;

/// Owns the working set of countdown events while the app is running.
///
/// Every mutation is persisted before it returns and then handed to the
/// notification scheduler. Persist and reschedule are not one transaction: a
/// crash between them leaves alerts stale until the event is touched again.
pub struct EventStore {
    events: Vec<Event>,
    /// Past records found at load time; written back untouched.
    archived: Vec<Event>,
    storage: Box<dyn BlobStore>,
    storage_key: String,
    scheduler: Arc<NotificationScheduler>,
    clock: Arc<dyn Clock>,
    listeners: Vec<(SubscriptionId, ChangeListener)>,
    next_subscription: u64,
}

impl EventStore {
    /// Build a store over `storage` and seed it from the blob under
    /// `storage_key`.
    pub fn open(
        storage: Box<dyn BlobStore>,
        storage_key: impl Into<String>,
        scheduler: Arc<NotificationScheduler>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut store = Self {
            events: Vec::new(),
            archived: Vec::new(),
            storage,
            storage_key: storage_key.into(),
            scheduler,
            clock,
            listeners: Vec::new(),
            next_subscription: 1,
        };
        let (active, archived) = store.load();
        store.events = active;
        store.archived = archived;
        store
    }

    /// Read the persisted blob and split it into upcoming and past events.
    pub fn load(&self) -> (Vec<Event>, Vec<Event>) {
        let now = self.clock.now();
        let (archived, active): (Vec<Event>, Vec<Event>) =
            load_events(self.storage.as_ref(), &self.storage_key)
                .into_iter()
                .partition(|event| event.is_past(now));

        log::info!(
            "Loaded {} upcoming event(s), {} past",
            active.len(),
            archived.len()
        );
        (active, archived)
    }

    /// Re-read the blob, replacing the working set.
    pub fn reload(&mut self) {
        let (active, archived) = self.load();
        self.events = active;
        self.archived = archived;
        self.notify(StoreChange::Reloaded);
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Working set in insertion order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Working set sorted by date, ties by id.
    pub fn list_events(&self) -> Vec<Event> {
        let mut events = self.events.clone();
        events.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        events
    }

    pub fn get(&self, id: EventId) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Soonest event that has not started yet.
    pub fn next_event(&self) -> Option<&Event> {
        selector::next_event(&self.events, self.clock.now())
    }

    /// Insert a new event. An event whose id is already present replaces the
    /// existing record instead of adding a second one.
    pub fn add(&mut self, mut event: Event) {
        event.normalize_offsets();
        let id = event.id;
        self.archived.retain(|past| past.id != id);

        if let Some(existing) = self.events.iter_mut().find(|e| e.id == id) {
            log::warn!("Event {} already exists; replacing it", id);
            *existing = event.clone();
        } else {
            self.events.push(event.clone());
        }

        self.persist();
        self.scheduler.reschedule(&event, self.clock.now());
        self.notify(StoreChange::Added(id));
    }

    /// Replace the record with the same id. Returns `false`, and changes
    /// nothing, when the id is unknown.
    pub fn update(&mut self, mut event: Event) -> bool {
        let Some(existing) = self.events.iter_mut().find(|e| e.id == event.id) else {
            log::debug!("Ignoring update for unknown event {}", event.id);
            return false;
        };

        event.normalize_offsets();
        *existing = event.clone();
        self.archived.retain(|past| past.id != event.id);

        self.persist();
        self.scheduler.reschedule(&event, self.clock.now());
        self.notify(StoreChange::Updated(event.id));
        true
    }

    /// Delete by id and cancel its reminders. Returns `false`, and changes
    /// nothing, when the id is unknown.
    pub fn remove(&mut self, id: EventId) -> bool {
        let Some(index) = self.events.iter().position(|e| e.id == id) else {
            log::debug!("Ignoring removal of unknown event {}", id);
            return false;
        };

        let removed = self.events.remove(index);
        self.persist();
        self.scheduler.cancel_all(&removed);
        self.notify(StoreChange::Removed(id));
        true
    }

    /// Ask for notification permission if it was never requested.
    pub async fn request_authorization(&self) -> bool {
        self.scheduler.request_authorization().await
    }

    /// Register reminders for every event in the working set, e.g. after a
    /// process start where previously registered alerts did not survive.
    pub fn reschedule_all(&self) {
        let now = self.clock.now();
        for event in &self.events {
            self.scheduler.reschedule(event, now);
        }
    }

    /// Pick up changes another process wrote to the blob and bring the
    /// registered reminders in line: removed events lose their alerts, new
    /// and edited ones are rescheduled, unchanged ones are left alone.
    pub fn refresh(&mut self) -> RefreshReport {
        let previous = std::mem::take(&mut self.events);
        let (active, archived) = self.load();
        self.events = active;
        self.archived = archived;

        let now = self.clock.now();
        let mut report = RefreshReport::default();

        for old in &previous {
            if self.get(old.id).is_none() {
                self.scheduler.cancel_all(old);
                report.removed += 1;
            }
        }
        for event in &self.events {
            if previous.iter().any(|old| old == event) {
                continue;
            }
            self.scheduler.reschedule(event, now);
            report.rescheduled += 1;
        }

        let live: HashSet<EventId> = self.events.iter().map(|e| e.id).collect();
        report.orphans_cancelled = self.scheduler.cancel_orphans(&live);

        if report.has_changes() {
            log::info!(
                "Refreshed events: {} rescheduled, {} removed, {} orphaned alert(s) cancelled",
                report.rescheduled,
                report.removed,
                report.orphans_cancelled
            );
            self.notify(StoreChange::Reloaded);
        }
        report
    }

    pub fn scheduler(&self) -> &Arc<NotificationScheduler> {
        &self.scheduler
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: Fn(&StoreChange) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns whether the subscription existed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    /// Write past records plus the working set. Failures are logged and the
    /// in-memory state is kept.
    fn persist(&mut self) {
        let records: Vec<Event> = self
            .archived
            .iter()
            .chain(self.events.iter())
            .cloned()
            .collect();

        let bytes = match encode_events(&records) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::error!("Failed to encode events: {}", e);
                return;
            }
        };

        if let Err(e) = self.storage.write_blob(&self.storage_key, &bytes) {
            log::error!("Failed to persist events: {:#}", e);
        }
    }

    fn notify(&self, change: StoreChange) {
        for (_, listener) in &self.listeners {
            listener(&change);
        }
    }
}
