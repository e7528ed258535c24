use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;

use super::BlobStore;

/// Process-local blob store. Clones share the same map, which lets tests
/// hand one handle to the event store and another to a widget reader.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    blobs: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a blob directly, bypassing any encoding.
    pub fn insert(&self, key: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.lock().insert(key.into(), bytes.into());
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.lock().get(key).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.blobs.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl BlobStore for MemoryBlobStore {
    fn read_blob(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.get(key))
    }

    fn write_blob(&mut self, key: &str, bytes: &[u8]) -> Result<()> {
        self.lock().insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}
