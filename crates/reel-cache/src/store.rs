//! On-disk cache store with per-key single-flight.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::key::make_key;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors from cache lookup or persistence.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Producer returned a missing file: {0}")]
    MissingProducerFile(PathBuf),

    #[error("Producer failed: {0}")]
    Producer(#[source] anyhow::Error),
}

/// Content-addressed cache rooted at one directory.
///
/// JSON payloads live at `<key>.json`, binary blobs at `<key>`. A
/// process-local mutex per key guarantees at most one producer runs for a
/// given key at a time; the loser of the race observes the winner's entry
/// as a hit.
#[derive(Clone)]
pub struct Cache {
    dir: PathBuf,
    locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl Cache {
    /// Open (creating if needed) a cache at `dir`.
    pub fn new(dir: impl AsRef<Path>) -> CacheResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            locks: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Cache directory root.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Look up a JSON entry; on miss, run `producer` once and persist its
    /// result before returning it.
    pub async fn get_or_compute_json<T, F, Fut>(
        &self,
        key_parts: &[&str],
        producer: F,
    ) -> CacheResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let key = make_key(key_parts);
        let path = self.dir.join(format!("{}.json", key));

        let lock = self.lock_for(&key).await;
        let _guard = lock.lock().await;

        if path.exists() {
            debug!("cache hit {} (json)", key);
            let bytes = tokio::fs::read(&path).await?;
            return Ok(serde_json::from_slice(&bytes)?);
        }

        info!("cache miss {} (json)", key);
        let value = producer().await.map_err(CacheError::Producer)?;
        let bytes = serde_json::to_vec_pretty(&value)?;
        tokio::fs::write(&path, bytes).await?;
        Ok(value)
    }

    /// Look up a binary entry; on miss, run `producer` once (it returns a
    /// file path), copy that file into the cache, and return the blob path.
    pub async fn get_or_compute_binary<F, Fut>(
        &self,
        key_parts: &[&str],
        producer: F,
    ) -> CacheResult<PathBuf>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<PathBuf>>,
    {
        let key = make_key(key_parts);
        let path = self.dir.join(&key);

        let lock = self.lock_for(&key).await;
        let _guard = lock.lock().await;

        if path.exists() {
            debug!("cache hit {} (binary) -> {}", key, path.display());
            return Ok(path);
        }

        info!("cache miss {} (binary)", key);
        let produced = producer().await.map_err(CacheError::Producer)?;
        if !produced.exists() {
            return Err(CacheError::MissingProducerFile(produced));
        }
        tokio::fs::copy(&produced, &path).await?;
        Ok(path)
    }

    // The lock map grows with the number of distinct keys and is never
    // pruned. Bounded by the scene count of a run; a long-lived process
    // sharing one Cache would need eviction here.
    async fn lock_for(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
