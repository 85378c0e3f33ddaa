//! Content store trait and the in-memory BLAKE3 backend.

use crate::errors::{ContentError, Result};
use async_trait::async_trait;
use fileguard_types::Fingerprint;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Content-addressed blob store.
///
/// Storing identical bytes must yield the same fingerprint; differing bytes
/// must yield a different one.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Store `bytes` and return their fingerprint.
    async fn store(&self, bytes: &[u8]) -> Result<Fingerprint>;

    /// Retrieve previously stored bytes.
    async fn fetch(&self, fingerprint: &Fingerprint) -> Result<Vec<u8>>;

    /// Read a file from disk and store its contents.
    async fn store_file(&self, path: &Path) -> Result<Fingerprint> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ContentError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        debug!("storing {} ({} bytes)", path.display(), bytes.len());
        self.store(&bytes).await
    }
}

/// In-memory store keyed by base58 BLAKE3 digests.
#[derive(Clone, Default)]
pub struct MemoryContentStore {
    blobs: Arc<RwLock<HashMap<Fingerprint, Vec<u8>>>>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fingerprint `bytes` without storing them.
    pub fn fingerprint_of(bytes: &[u8]) -> Fingerprint {
        Fingerprint::from_digest(blake3::hash(bytes).as_bytes())
    }

    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn store(&self, bytes: &[u8]) -> Result<Fingerprint> {
        let fingerprint = Self::fingerprint_of(bytes);
        self.blobs
            .write()
            .entry(fingerprint.clone())
            .or_insert_with(|| bytes.to_vec());
        Ok(fingerprint)
    }

    async fn fetch(&self, fingerprint: &Fingerprint) -> Result<Vec<u8>> {
        self.blobs
            .read()
            .get(fingerprint)
            .cloned()
            .ok_or_else(|| ContentError::NotFound(fingerprint.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_store_is_deterministic() {
        let store = MemoryContentStore::new();
        let a = store.store(b"hello world").await.unwrap();
        let b = store.store(b"hello world").await.unwrap();
        let c = store.store(b"hello world!").await.unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_roundtrip() {
        let store = MemoryContentStore::new();
        let fp = store.store(b"payload").await.unwrap();
        assert_eq!(store.fetch(&fp).await.unwrap(), b"payload");
    }

    #[tokio::test]
    async fn test_fetch_missing() {
        let store = MemoryContentStore::new();
        let fp = MemoryContentStore::fingerprint_of(b"never stored");
        let err = store.fetch(&fp).await.unwrap_err();
        assert!(matches!(err, ContentError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_store_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("upload.txt");
        std::fs::write(&path, b"file body").unwrap();

        let store = MemoryContentStore::new();
        let fp = store.store_file(&path).await.unwrap();
        assert_eq!(fp, MemoryContentStore::fingerprint_of(b"file body"));
    }

    #[tokio::test]
    async fn test_store_missing_file() {
        let dir = TempDir::new().unwrap();
        let store = MemoryContentStore::new();
        let err = store
            .store_file(&dir.path().join("absent.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::Io { .. }));
    }
}
