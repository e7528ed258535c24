use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use super::BlobStore;

/// Stores each key as `<key>.json` inside a directory.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: PathBuf,
    read_only: bool,
}

impl FileBlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            read_only: false,
        }
    }

    /// A handle that refuses writes.
    pub fn read_only(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            read_only: true,
        }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl BlobStore for FileBlobStore {
    fn read_blob(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        let data = fs::read(&path)
            .with_context(|| format!("failed to read blob from {}", path.display()))?;
        Ok(Some(data))
    }

    fn write_blob(&mut self, key: &str, bytes: &[u8]) -> Result<()> {
        if self.read_only {
            bail!("blob store at {} is read-only", self.dir.display());
        }

        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create dir {}", self.dir.display()))?;

        // Write beside the target and rename so a concurrent reader never
        // sees a half-written file.
        let path = self.path_for(key);
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, bytes)
            .with_context(|| format!("failed to write blob to {}", staging.display()))?;
        fs::rename(&staging, &path)
            .with_context(|| format!("failed to move blob into {}", path.display()))?;
        Ok(())
    }
}
