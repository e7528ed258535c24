// Countdown module
// Persisted event encoding, next-event selection and the event store

mod codec;
mod selector;
mod store;

pub use codec::{decode_events, encode_events, load_events, CodecError};
pub use selector::next_event;
pub use store::{ChangeListener, EventStore, RefreshReport, StoreChange, SubscriptionId};
