#[cfg(test)]
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
#[cfg(test)]
use std::sync::Mutex;

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;

/// Key-value byte storage. `put_object` fully overwrites whatever the key held.
#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn get_object(&self, key: &str) -> anyhow::Result<Option<Bytes>>;
    async fn put_object(&self, key: &str, body: Bytes) -> anyhow::Result<()>;
}

/// One file per key under a root directory.
#[derive(Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> anyhow::Result<PathBuf> {
        anyhow::ensure!(
            !key.is_empty() && !key.contains(['/', '\\']) && !key.starts_with('.'),
            "invalid storage key {:?}",
            key
        );
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl StorageClient for FileStorage {
    async fn get_object(&self, key: &str) -> anyhow::Result<Option<Bytes>> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(body) => Ok(Some(Bytes::from(body))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("read {}", path.display())),
        }
    }

    async fn put_object(&self, key: &str, body: Bytes) -> anyhow::Result<()> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("create data dir {}", self.root.display()))?;
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }
}

/// In-process storage, used by the fake application state and tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<String, Bytes>>,
}

#[cfg(test)]
impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
#[async_trait]
impl StorageClient for MemoryStorage {
    async fn get_object(&self, key: &str) -> anyhow::Result<Option<Bytes>> {
        let objects = self
            .objects
            .lock()
            .map_err(|_| anyhow::anyhow!("memory storage poisoned"))?;
        Ok(objects.get(key).cloned())
    }

    async fn put_object(&self, key: &str, body: Bytes) -> anyhow::Result<()> {
        let mut objects = self
            .objects
            .lock()
            .map_err(|_| anyhow::anyhow!("memory storage poisoned"))?;
        objects.insert(key.to_string(), body);
        Ok(())
    }
}
