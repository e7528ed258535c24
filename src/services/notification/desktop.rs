use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use notify_rust::{Notification, Timeout};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use super::{AlertCenter, AlertKey, AlertRequest, AuthorizationStatus};

/// Notification urgency level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationUrgency {
    Normal,
    Critical,
}

impl NotificationUrgency {
    fn timeout(self) -> Timeout {
        match self {
            NotificationUrgency::Normal => Timeout::Milliseconds(5000),
            NotificationUrgency::Critical => Timeout::Milliseconds(10000),
        }
    }
}

/// Fires reminders as desktop notifications.
///
/// Each alert is a tokio task sleeping until its fire time; cancelling an
/// alert aborts the task. Alerts live only as long as the process.
pub struct DesktopAlertCenter {
    runtime: Handle,
    enabled: bool,
    tasks: Arc<Mutex<HashMap<AlertKey, JoinHandle<()>>>>,
}

impl DesktopAlertCenter {
    pub fn new(runtime: Handle, enabled: bool) -> Self {
        Self {
            runtime,
            enabled,
            tasks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Check if notifications are enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<AlertKey, JoinHandle<()>>> {
        self.tasks.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn show(title: &str, body: &str, urgency: NotificationUrgency) -> Result<()> {
        Notification::new()
            .summary(title)
            .body(body)
            .timeout(urgency.timeout())
            .show()
            .map_err(|e| anyhow::anyhow!("Failed to show notification: {}", e))?;
        Ok(())
    }
}

#[async_trait]
impl AlertCenter for DesktopAlertCenter {
    fn authorization_status(&self) -> AuthorizationStatus {
        if self.enabled {
            AuthorizationStatus::Authorized
        } else {
            AuthorizationStatus::Denied
        }
    }

    async fn request_authorization(&self) -> Result<bool> {
        Ok(self.enabled)
    }

    fn register_alert(&self, request: AlertRequest) -> Result<()> {
        if !self.enabled {
            bail!("desktop notifications are disabled");
        }

        let delay = (request.fire_at - Utc::now())
            .to_std()
            .unwrap_or_default();
        let urgency = if request.key.offset.is_at_event_time() {
            NotificationUrgency::Critical
        } else {
            NotificationUrgency::Normal
        };
        let key = request.key;

        let handle = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let AlertRequest { title, body, .. } = request;
            let shown =
                tokio::task::spawn_blocking(move || Self::show(&title, &body, urgency)).await;
            match shown {
                Ok(Ok(())) => log::info!("Showed reminder {}", key),
                Ok(Err(e)) => log::warn!("Failed to show reminder {}: {}", key, e),
                Err(e) => log::warn!("Reminder task {} did not finish: {}", key, e),
            }
        });

        if let Some(previous) = self.lock().insert(key, handle) {
            previous.abort();
        }
        Ok(())
    }

    fn cancel_alerts(&self, keys: &[AlertKey]) {
        let mut tasks = self.lock();
        for key in keys {
            if let Some(handle) = tasks.remove(key) {
                handle.abort();
            }
        }
    }

    fn pending_keys(&self) -> Vec<AlertKey> {
        let mut tasks = self.lock();
        tasks.retain(|_, handle| !handle.is_finished());
        tasks.keys().copied().collect()
    }
}

impl Drop for DesktopAlertCenter {
    fn drop(&mut self) {
        for (_, handle) in self.lock().drain() {
            handle.abort();
        }
    }
}
