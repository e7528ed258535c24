// Notification module
// Reminder alerts keyed by (event id, offset). The scheduler turns offsets
// into absolute alerts and hands them to the platform alert center.

mod desktop;
mod memory;
mod scheduler;

pub use desktop::{DesktopAlertCenter, NotificationUrgency};
pub use memory::InMemoryAlertCenter;
pub use scheduler::{NotificationScheduler, ScheduleOutcome, SchedulePlan};

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::event::EventId;
use crate::models::offset::NotificationOffset;

/// Permission state reported by the alert subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthorizationStatus {
    /// The user has not been asked yet
    #[default]
    NotDetermined,
    Denied,
    Authorized,
    /// Quiet delivery granted without an explicit prompt
    Provisional,
    /// Temporary grant for a limited session
    Ephemeral,
}

impl AuthorizationStatus {
    pub fn permits_scheduling(self) -> bool {
        matches!(
            self,
            AuthorizationStatus::Authorized
                | AuthorizationStatus::Provisional
                | AuthorizationStatus::Ephemeral
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlertKeyError {
    #[error("alert key '{0}' is missing the offset suffix")]
    MissingOffset(String),
    #[error("alert key '{0}' has an invalid event id")]
    InvalidEventId(String),
    #[error("alert key '{0}' has an invalid offset")]
    InvalidOffset(String),
}

/// Identifier of one scheduled alert. Renders as `<event uuid>-<seconds>s`
/// and parses back from that form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AlertKey {
    pub event_id: EventId,
    pub offset: NotificationOffset,
}

impl AlertKey {
    pub fn new(event_id: EventId, offset: NotificationOffset) -> Self {
        Self { event_id, offset }
    }
}

impl fmt::Display for AlertKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}s", self.event_id, self.offset.seconds())
    }
}

impl FromStr for AlertKey {
    type Err = AlertKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // The uuid itself contains hyphens, so split on the last one.
        let (id, seconds) = s
            .rsplit_once('-')
            .ok_or_else(|| AlertKeyError::MissingOffset(s.to_string()))?;
        let seconds = seconds
            .strip_suffix('s')
            .ok_or_else(|| AlertKeyError::MissingOffset(s.to_string()))?;

        let event_id = id
            .parse::<EventId>()
            .map_err(|_| AlertKeyError::InvalidEventId(s.to_string()))?;
        let seconds = seconds
            .parse::<u64>()
            .map_err(|_| AlertKeyError::InvalidOffset(s.to_string()))?;

        Ok(Self::new(event_id, NotificationOffset::from_seconds(seconds)))
    }
}

/// Everything an alert center needs to fire one reminder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertRequest {
    pub key: AlertKey,
    pub fire_at: DateTime<Utc>,
    pub title: String,
    pub body: String,
}

/// Platform alert subsystem.
///
/// Registration and cancellation must return without waiting for delivery;
/// whether an alert exists is only ever observed as a side effect.
#[async_trait]
pub trait AlertCenter: Send + Sync {
    fn authorization_status(&self) -> AuthorizationStatus;

    /// Ask the user for permission. Resolves to whether alerts may be shown.
    async fn request_authorization(&self) -> Result<bool>;

    /// Register an alert, replacing any existing alert with the same key.
    fn register_alert(&self, request: AlertRequest) -> Result<()>;

    /// Cancel the given keys. Unknown keys are ignored.
    fn cancel_alerts(&self, keys: &[AlertKey]);

    /// Keys still waiting to fire, for centers that can enumerate them.
    fn pending_keys(&self) -> Vec<AlertKey> {
        Vec::new()
    }
}
