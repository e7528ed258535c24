// Storage module
// Key/value blob persistence. Callers only read or write whole blobs under a
// single key.

mod file;
mod memory;
mod sqlite;

pub use file::FileBlobStore;
pub use memory::MemoryBlobStore;
pub use sqlite::SqliteBlobStore;

use std::path::Path;

use anyhow::Result;

use crate::models::settings::StorageBackend;

/// Get/set access to opaque byte blobs. No transactions.
#[cfg_attr(test, mockall::automock)]
pub trait BlobStore: Send {
    /// Bytes stored under `key`, or `None` when nothing was ever written.
    fn read_blob(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Replace whatever is stored under `key`.
    fn write_blob(&mut self, key: &str, bytes: &[u8]) -> Result<()>;
}

/// Open the configured backend inside `data_dir` for reading and writing.
pub fn open_store(backend: StorageBackend, data_dir: &Path) -> Result<Box<dyn BlobStore>> {
    Ok(match backend {
        StorageBackend::Sqlite => Box::new(SqliteBlobStore::open(&data_dir.join("countdown.db"))?),
        StorageBackend::File => Box::new(FileBlobStore::new(data_dir)),
    })
}

/// Open the configured backend for a reader that must never write, such as
/// the widget process.
pub fn open_store_read_only(backend: StorageBackend, data_dir: &Path) -> Result<Box<dyn BlobStore>> {
    Ok(match backend {
        StorageBackend::Sqlite => Box::new(SqliteBlobStore::open_read_only(
            &data_dir.join("countdown.db"),
        )?),
        StorageBackend::File => Box::new(FileBlobStore::read_only(data_dir)),
    })
}
