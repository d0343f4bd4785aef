//! A single JSON document on disk.

use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use log::warn;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::{Result, StorageError};

/// Typed JSON file with whole-document reads and writes.
///
/// Saves go to a sibling temp file that is then renamed over the target, so
/// readers see either the old document or the new one.
#[derive(Debug)]
pub struct JsonDocument<T> {
    path: PathBuf,
    lock: Mutex<()>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonDocument<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>> {
        self.lock
            .lock()
            .map_err(|_| StorageError::LockPoisoned(self.path.clone()))
    }

    /// Read the document. A missing or empty file is the default value.
    pub fn load(&self) -> Result<T> {
        let _guard = self.guard()?;
        self.load_locked()
    }

    /// Like [`load`](Self::load), but a corrupt document is logged and
    /// treated as empty.
    pub fn load_or_default(&self) -> T {
        match self.load() {
            Ok(value) => value,
            Err(e) => {
                warn!("Ignoring unreadable {}: {}", self.path.display(), e);
                T::default()
            }
        }
    }

    pub fn save(&self, value: &T) -> Result<()> {
        let _guard = self.guard()?;
        self.persist_locked(value)
    }

    /// Save the value `build` returns, calling it under the document lock.
    ///
    /// Concurrent callers that read shared state in `build` write in the
    /// order they read, so the last document on disk is the newest state.
    pub fn save_with<F>(&self, build: F) -> Result<()>
    where
        F: FnOnce() -> T,
    {
        let _guard = self.guard()?;
        self.persist_locked(&build())
    }

    /// Hold the document lock, stalling every load and save until dropped.
    #[cfg(test)]
    pub(crate) fn hold_lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn load_locked(&self) -> Result<T> {
        if !self.path.exists() {
            return Ok(T::default());
        }

        let raw = fs::read(&self.path)?;
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(T::default());
        }

        Ok(serde_json::from_slice(&raw)?)
    }

    fn persist_locked(&self, value: &T) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(value)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
