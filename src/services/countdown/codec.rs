use std::collections::HashSet;

use thiserror::Error;

use crate::models::event::Event;
use crate::services::storage::BlobStore;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to encode events: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to decode events: {0}")]
    Decode(#[source] serde_json::Error),
}

pub fn encode_events(events: &[Event]) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(events).map_err(CodecError::Encode)
}

/// Decoding is all-or-nothing: one malformed record fails the whole blob.
/// A repeated id keeps its first record only.
pub fn decode_events(bytes: &[u8]) -> Result<Vec<Event>, CodecError> {
    let decoded: Vec<Event> = serde_json::from_slice(bytes).map_err(CodecError::Decode)?;

    let mut seen = HashSet::with_capacity(decoded.len());
    let mut events = Vec::with_capacity(decoded.len());
    for mut event in decoded {
        if !seen.insert(event.id) {
            log::warn!("Dropping duplicate record for event {}", event.id);
            continue;
        }
        event.normalize_offsets();
        events.push(event);
    }
    Ok(events)
}

/// Every record stored under `key`, past ones included. A missing blob, a
/// failed read and an undecodable blob all yield an empty list.
///
/// The event store and the widget both load through here so they always
/// agree on what was persisted.
pub fn load_events(storage: &dyn BlobStore, key: &str) -> Vec<Event> {
    let bytes = match storage.read_blob(key) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => {
            log::info!("No saved events under '{}'", key);
            return Vec::new();
        }
        Err(e) => {
            log::warn!("Failed to read saved events: {:#}", e);
            return Vec::new();
        }
    };

    match decode_events(&bytes) {
        Ok(events) => events,
        Err(e) => {
            log::warn!("Discarding saved events: {}", e);
            Vec::new()
        }
    }
}
