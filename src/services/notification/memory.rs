use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{bail, Result};
use async_trait::async_trait;

use super::{AlertCenter, AlertKey, AlertRequest, AuthorizationStatus};

#[derive(Debug, Default)]
struct Inner {
    status: AuthorizationStatus,
    grant_on_request: bool,
    alerts: BTreeMap<AlertKey, AlertRequest>,
    rejected: HashSet<AlertKey>,
    registrations: usize,
}

/// Alert center that only records what it was asked to do.
///
/// Useful headless and as a test double: clones share state, so the caller
/// keeps a handle to inspect what the scheduler registered.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAlertCenter {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryAlertCenter {
    pub fn new(status: AuthorizationStatus) -> Self {
        let center = Self::default();
        center.lock().status = status;
        center
    }

    /// A center that already holds permission.
    pub fn authorized() -> Self {
        Self::new(AuthorizationStatus::Authorized)
    }

    pub fn set_status(&self, status: AuthorizationStatus) {
        self.lock().status = status;
    }

    /// Answer to give when asked for permission while not determined.
    pub fn grant_on_request(&self, grant: bool) {
        self.lock().grant_on_request = grant;
    }

    /// Make registration of `key` fail.
    pub fn reject(&self, key: AlertKey) {
        self.lock().rejected.insert(key);
    }

    /// Registered alerts ordered by key.
    pub fn alerts(&self) -> Vec<AlertRequest> {
        self.lock().alerts.values().cloned().collect()
    }

    pub fn keys(&self) -> Vec<AlertKey> {
        self.lock().alerts.keys().copied().collect()
    }

    pub fn get(&self, key: &AlertKey) -> Option<AlertRequest> {
        self.lock().alerts.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().alerts.is_empty()
    }

    /// Number of successful registrations over the center's lifetime.
    pub fn registrations(&self) -> usize {
        self.lock().registrations
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl AlertCenter for InMemoryAlertCenter {
    fn authorization_status(&self) -> AuthorizationStatus {
        self.lock().status
    }

    async fn request_authorization(&self) -> Result<bool> {
        let mut inner = self.lock();
        if inner.status == AuthorizationStatus::NotDetermined {
            inner.status = if inner.grant_on_request {
                AuthorizationStatus::Authorized
            } else {
                AuthorizationStatus::Denied
            };
        }
        Ok(inner.status.permits_scheduling())
    }

    fn register_alert(&self, request: AlertRequest) -> Result<()> {
        let mut inner = self.lock();
        if inner.rejected.contains(&request.key) {
            bail!("alert {} was rejected", request.key);
        }
        inner.alerts.insert(request.key, request);
        inner.registrations += 1;
        Ok(())
    }

    fn cancel_alerts(&self, keys: &[AlertKey]) {
        let mut inner = self.lock();
        for key in keys {
            inner.alerts.remove(key);
        }
    }

    fn pending_keys(&self) -> Vec<AlertKey> {
        self.keys()
    }
}
