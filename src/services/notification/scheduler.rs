use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::{AlertCenter, AlertKey, AlertRequest, AuthorizationStatus};
use crate::models::event::{Event, EventId};
use crate::models::offset::{all_options, NotificationOffset};

/// Alerts to register for one event, plus the offsets that were dropped
/// because their reminder time had already passed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchedulePlan {
    pub alerts: Vec<AlertRequest>,
    pub skipped: Vec<NotificationOffset>,
}

/// What a reschedule did. This is not a delivery confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// Permission is missing, nothing was touched
    NotAuthorized,
    Completed {
        scheduled: usize,
        skipped: usize,
        failed: usize,
    },
}

/// Keeps the alerts registered for each event in line with its offsets.
pub struct NotificationScheduler {
    center: Arc<dyn AlertCenter>,
    /// Every offset registered per event since the last full cancel.
    issued: Mutex<HashMap<EventId, BTreeSet<NotificationOffset>>>,
}

impl NotificationScheduler {
    pub fn new(center: Arc<dyn AlertCenter>) -> Self {
        Self {
            center,
            issued: Mutex::new(HashMap::new()),
        }
    }

    pub fn center(&self) -> &Arc<dyn AlertCenter> {
        &self.center
    }

    pub fn is_authorized(&self) -> bool {
        self.center.authorization_status().permits_scheduling()
    }

    /// Resolve permission, prompting only when the user was never asked.
    pub async fn request_authorization(&self) -> bool {
        match self.center.authorization_status() {
            AuthorizationStatus::NotDetermined => match self.center.request_authorization().await {
                Ok(granted) => {
                    log::info!("Notification permission granted: {}", granted);
                    granted
                }
                Err(e) => {
                    log::warn!("Failed to request notification permission: {}", e);
                    false
                }
            },
            AuthorizationStatus::Denied => false,
            _ => true,
        }
    }

    /// Compute the alerts `event` should have at `now`.
    pub fn plan(event: &Event, now: DateTime<Utc>) -> SchedulePlan {
        let mut plan = SchedulePlan::default();
        for &offset in &event.notification_offsets {
            match event.reminder_time(offset) {
                Some(fire_at) if fire_at > now => plan.alerts.push(AlertRequest {
                    key: AlertKey::new(event.id, offset),
                    fire_at,
                    title: event.title.clone(),
                    body: alert_body(&event.title, offset),
                }),
                _ => plan.skipped.push(offset),
            }
        }
        plan
    }

    /// Every key that may have been used for `event`: the whole catalog, its
    /// current offsets, anything this scheduler registered for it, and any
    /// pending key the alert center still reports for it.
    pub fn cancellation_keys(&self, event: &Event) -> Vec<AlertKey> {
        let mut offsets: BTreeSet<NotificationOffset> = all_options().into_iter().collect();
        offsets.extend(event.notification_offsets.iter().copied());
        if let Some(issued) = self.lock_issued().get(&event.id) {
            offsets.extend(issued.iter().copied());
        }
        offsets.extend(
            self.center
                .pending_keys()
                .into_iter()
                .filter(|key| key.event_id == event.id)
                .map(|key| key.offset),
        );

        offsets
            .into_iter()
            .map(|offset| AlertKey::new(event.id, offset))
            .collect()
    }

    /// Replace whatever alerts `event` had with the ones its current offsets
    /// call for. Silently does nothing without permission.
    pub fn reschedule(&self, event: &Event, now: DateTime<Utc>) -> ScheduleOutcome {
        if !self.is_authorized() {
            log::debug!("Skipping reminders for {}: not authorized", event.id);
            return ScheduleOutcome::NotAuthorized;
        }

        self.cancel_all(event);

        let plan = Self::plan(event, now);
        for offset in &plan.skipped {
            log::debug!(
                "Skipping {} reminder for {}: reminder time has passed",
                offset.description(),
                event.id
            );
        }

        let mut registered = BTreeSet::new();
        let mut failed = 0;
        for request in plan.alerts {
            let key = request.key;
            match self.center.register_alert(request) {
                Ok(()) => {
                    registered.insert(key.offset);
                }
                Err(e) => {
                    failed += 1;
                    log::warn!("Failed to schedule reminder {}: {}", key, e);
                }
            }
        }

        let scheduled = registered.len();
        if !registered.is_empty() {
            self.lock_issued().insert(event.id, registered);
        }

        log::info!(
            "Scheduled {} reminder(s) for '{}' ({} skipped, {} failed)",
            scheduled,
            event.title,
            plan.skipped.len(),
            failed
        );

        ScheduleOutcome::Completed {
            scheduled,
            skipped: plan.skipped.len(),
            failed,
        }
    }

    /// Cancel every alert that could belong to `event`. Safe to call when
    /// nothing is scheduled.
    pub fn cancel_all(&self, event: &Event) {
        let keys = self.cancellation_keys(event);
        self.center.cancel_alerts(&keys);
        self.lock_issued().remove(&event.id);
    }

    /// Cancel alerts belonging to events outside `live`, e.g. events another
    /// process deleted. Covers the center's pending keys and this scheduler's
    /// own ledger. Returns how many keys were cancelled.
    pub fn cancel_orphans(&self, live: &HashSet<EventId>) -> usize {
        let mut keys: BTreeSet<AlertKey> = self
            .center
            .pending_keys()
            .into_iter()
            .filter(|key| !live.contains(&key.event_id))
            .collect();

        {
            let mut issued = self.lock_issued();
            issued.retain(|id, offsets| {
                if live.contains(id) {
                    return true;
                }
                keys.extend(offsets.iter().map(|offset| AlertKey::new(*id, *offset)));
                false
            });
        }

        if keys.is_empty() {
            return 0;
        }

        let keys: Vec<AlertKey> = keys.into_iter().collect();
        self.center.cancel_alerts(&keys);
        log::info!("Cancelled {} reminder(s) for deleted events", keys.len());
        keys.len()
    }

    fn lock_issued(&self) -> MutexGuard<'_, HashMap<EventId, BTreeSet<NotificationOffset>>> {
        self.issued.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn alert_body(title: &str, offset: NotificationOffset) -> String {
    if offset.is_at_event_time() {
        format!("{} is starting now", title)
    } else {
        format!("{} until {}", offset.phrase(), title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::notification::InMemoryAlertCenter;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 7, 12, 0, 0).unwrap()
    }

    fn scheduler_with(center: &InMemoryAlertCenter) -> NotificationScheduler {
        NotificationScheduler::new(Arc::new(center.clone()))
    }

    fn offsets_of(center: &InMemoryAlertCenter) -> Vec<NotificationOffset> {
        center.keys().into_iter().map(|k| k.offset).collect()
    }

    #[test]
    fn test_plan_skips_reminders_at_or_before_now() {
        let event = Event::new("Launch", now() + Duration::days(2));
        let plan = NotificationScheduler::plan(&event, now());

        let planned: Vec<_> = plan.alerts.iter().map(|a| a.key.offset).collect();
        assert_eq!(
            planned,
            vec![
                NotificationOffset::ONE_DAY,
                NotificationOffset::TWELVE_HOURS,
                NotificationOffset::ONE_HOUR,
                NotificationOffset::THIRTY_MINUTES,
                NotificationOffset::AT_EVENT_TIME,
            ]
        );
        assert_eq!(
            plan.skipped,
            vec![NotificationOffset::THREE_DAYS, NotificationOffset::TWO_DAYS]
        );
    }

    #[test]
    fn test_plan_fire_times_and_bodies() {
        let event = Event::with_offsets(
            "Launch",
            now() + Duration::days(5),
            vec![
                NotificationOffset::THREE_DAYS,
                NotificationOffset::ONE_HOUR,
                NotificationOffset::from_seconds(4500),
                NotificationOffset::AT_EVENT_TIME,
            ],
        );
        let plan = NotificationScheduler::plan(&event, now());

        assert_eq!(plan.alerts[0].fire_at, now() + Duration::days(2));
        assert_eq!(plan.alerts[0].body, "3 days until Launch");
        assert_eq!(plan.alerts[1].body, "1 hour until Launch");
        assert_eq!(plan.alerts[2].body, "1 hour 15 minutes until Launch");
        assert_eq!(plan.alerts[3].body, "Launch is starting now");
        assert_eq!(plan.alerts[3].fire_at, event.date);
        assert!(plan.alerts.iter().all(|a| a.title == "Launch"));
    }

    #[test]
    fn test_plan_for_past_event_is_empty() {
        let event = Event::new("Gone", now() - Duration::minutes(1));
        let plan = NotificationScheduler::plan(&event, now());
        assert!(plan.alerts.is_empty());
        assert_eq!(plan.skipped.len(), 7);
    }

    #[test]
    fn test_reschedule_without_permission_is_noop() {
        let center = InMemoryAlertCenter::new(AuthorizationStatus::Denied);
        let scheduler = scheduler_with(&center);
        let event = Event::new("Launch", now() + Duration::days(2));

        assert_eq!(scheduler.reschedule(&event, now()), ScheduleOutcome::NotAuthorized);
        assert!(center.is_empty());
    }

    #[test]
    fn test_reschedule_replaces_previous_offsets() {
        let center = InMemoryAlertCenter::authorized();
        let scheduler = scheduler_with(&center);
        let mut event = Event::with_offsets(
            "Launch",
            now() + Duration::days(2),
            vec![NotificationOffset::ONE_DAY, NotificationOffset::from_seconds(900)],
        );
        scheduler.reschedule(&event, now());
        assert_eq!(center.len(), 2);

        event.notification_offsets = vec![NotificationOffset::ONE_HOUR];
        let outcome = scheduler.reschedule(&event, now());

        assert_eq!(
            outcome,
            ScheduleOutcome::Completed { scheduled: 1, skipped: 0, failed: 0 }
        );
        assert_eq!(offsets_of(&center), vec![NotificationOffset::ONE_HOUR]);
    }

    #[test]
    fn test_reschedule_twice_does_not_duplicate() {
        let center = InMemoryAlertCenter::authorized();
        let scheduler = scheduler_with(&center);
        let event = Event::new("Launch", now() + Duration::days(4));

        scheduler.reschedule(&event, now());
        scheduler.reschedule(&event, now());
        assert_eq!(center.len(), 7);
    }

    #[test]
    fn test_custom_offset_cancelled_by_fresh_scheduler() {
        // A custom alert left over from an earlier process is still found
        // through the center's pending keys.
        let center = InMemoryAlertCenter::authorized();
        let mut event = Event::with_offsets(
            "Launch",
            now() + Duration::days(1),
            vec![NotificationOffset::from_seconds(777)],
        );
        scheduler_with(&center).reschedule(&event, now());
        assert_eq!(center.len(), 1);

        event.notification_offsets = vec![NotificationOffset::AT_EVENT_TIME];
        scheduler_with(&center).reschedule(&event, now());
        assert_eq!(offsets_of(&center), vec![NotificationOffset::AT_EVENT_TIME]);
    }

    #[test]
    fn test_cancellation_keys_cover_catalog_current_and_issued() {
        let center = InMemoryAlertCenter::authorized();
        let scheduler = scheduler_with(&center);
        let mut event = Event::with_offsets(
            "Launch",
            now() + Duration::days(1),
            vec![NotificationOffset::from_seconds(321)],
        );
        scheduler.reschedule(&event, now());
        event.notification_offsets = vec![NotificationOffset::from_seconds(654)];

        let offsets: Vec<_> = scheduler
            .cancellation_keys(&event)
            .into_iter()
            .map(|k| k.offset)
            .collect();
        for expected in all_options() {
            assert!(offsets.contains(&expected));
        }
        assert!(offsets.contains(&NotificationOffset::from_seconds(321)));
        assert!(offsets.contains(&NotificationOffset::from_seconds(654)));
    }

    #[test]
    fn test_failed_registration_does_not_block_others() {
        let center = InMemoryAlertCenter::authorized();
        let scheduler = scheduler_with(&center);
        let event = Event::with_offsets(
            "Launch",
            now() + Duration::days(1),
            vec![
                NotificationOffset::TWELVE_HOURS,
                NotificationOffset::ONE_HOUR,
                NotificationOffset::AT_EVENT_TIME,
            ],
        );
        center.reject(AlertKey::new(event.id, NotificationOffset::ONE_HOUR));

        let outcome = scheduler.reschedule(&event, now());
        assert_eq!(
            outcome,
            ScheduleOutcome::Completed { scheduled: 2, skipped: 0, failed: 1 }
        );
        assert_eq!(
            offsets_of(&center),
            vec![NotificationOffset::AT_EVENT_TIME, NotificationOffset::TWELVE_HOURS]
        );
    }

    #[test]
    fn test_cancel_all_removes_only_that_event() {
        let center = InMemoryAlertCenter::authorized();
        let scheduler = scheduler_with(&center);
        let keep = Event::new("Keep", now() + Duration::days(4));
        let gone = Event::new("Gone", now() + Duration::days(4));
        scheduler.reschedule(&keep, now());
        scheduler.reschedule(&gone, now());

        scheduler.cancel_all(&gone);
        assert_eq!(center.len(), 7);
        assert!(center.keys().iter().all(|k| k.event_id == keep.id));

        // Nothing left to cancel: still fine
        scheduler.cancel_all(&gone);
        assert_eq!(center.len(), 7);
    }

    #[tokio::test]
    async fn test_request_authorization_prompts_once() {
        let center = InMemoryAlertCenter::new(AuthorizationStatus::NotDetermined);
        center.grant_on_request(true);
        let scheduler = scheduler_with(&center);

        assert!(!scheduler.is_authorized());
        assert!(scheduler.request_authorization().await);
        assert!(scheduler.is_authorized());
    }

    #[tokio::test]
    async fn test_request_authorization_respects_denial() {
        let center = InMemoryAlertCenter::new(AuthorizationStatus::Denied);
        center.grant_on_request(true);
        let scheduler = scheduler_with(&center);

        assert!(!scheduler.request_authorization().await);
        assert_eq!(center.authorization_status(), AuthorizationStatus::Denied);
    }

    #[test]
    fn test_cancel_orphans_drops_alerts_of_unknown_events() {
        let center = InMemoryAlertCenter::authorized();
        let scheduler = scheduler_with(&center);
        let kept = Event::new("Kept", now() + Duration::days(4));
        let deleted = Event::new("Deleted", now() + Duration::days(4));
        scheduler.reschedule(&kept, now());
        scheduler.reschedule(&deleted, now());

        let live: HashSet<EventId> = [kept.id].into_iter().collect();
        assert_eq!(scheduler.cancel_orphans(&live), 7);
        assert!(center.keys().iter().all(|key| key.event_id == kept.id));
        assert_eq!(center.len(), 7);

        // Nothing left to cancel the second time round
        assert_eq!(scheduler.cancel_orphans(&live), 0);
    }
}
