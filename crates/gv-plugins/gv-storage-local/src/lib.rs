//! # gv-storage-local
//! gitview/crates/gv-plugins/gv-storage-local/src/lib.rs
//! Client-local implementations of `LocalStorage`.
//! `FileStorage` keeps a JSON object on disk; `MemoryStorage` never persists.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use dashmap::DashMap;
use gv_core::traits::LocalStorage;
use tokio::fs;
use tokio::sync::Mutex;

/// Process-lifetime storage, used by tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryStorage {
    entries: DashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LocalStorage for MemoryStorage {
    async fn get_item(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn set_item(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Key/value entries persisted as one JSON object file.
pub struct FileStorage {
    /// Target file (e.g., "./data/gitview-local.json")
    path: PathBuf,
    entries: DashMap<String, String>,
    /// Serializes whole-file rewrites
    write_lock: Mutex<()>,
}

impl FileStorage {
    /// Loads existing entries from `path`; a missing file starts empty.
    pub async fn open(path: PathBuf) -> anyhow::Result<Self> {
        let entries = DashMap::new();
        match fs::read(&path).await {
            Ok(raw) => {
                let stored: BTreeMap<String, String> = serde_json::from_slice(&raw)?;
                for (k, v) in stored {
                    entries.insert(k, v);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no local state yet");
            }
            Err(e) => return Err(e.into()),
        }

        Ok(Self {
            path,
            entries,
            write_lock: Mutex::new(()),
        })
    }

    /// Writes the current entries plus `key = value` to a sibling temp
    /// file, then renames over the target.
    async fn flush_with(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut snapshot: BTreeMap<String, String> = self
            .entries
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        snapshot.insert(key.to_string(), value.to_string());
        let data = serde_json::to_vec_pretty(&snapshot)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, &data).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl LocalStorage for FileStorage {
    async fn get_item(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    /// The in-memory entry only changes once the file write has landed.
    async fn set_item(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let _guard = self.write_lock.lock().await;
        if let Err(e) = self.flush_with(key, value).await {
            tracing::error!(path = %self.path.display(), key, error = %e, "failed to persist local state");
            return Err(e);
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
