//! Tamper detection by fingerprint comparison.

use crate::errors::IntegrityError;
use crate::store::ContentStore;
use fileguard_types::Fingerprint;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Compares freshly computed fingerprints against a known original.
///
/// Holds no state besides the store handle; every check costs one
/// fingerprinting round-trip per candidate.
#[derive(Clone)]
pub struct IntegrityVerifier {
    store: Arc<dyn ContentStore>,
}

impl IntegrityVerifier {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    pub async fn fingerprint(&self, bytes: &[u8]) -> Result<Fingerprint, IntegrityError> {
        self.store
            .store(bytes)
            .await
            .map_err(IntegrityError::IntegrityCheckFailed)
    }

    /// `true` when `candidate` does not hash to `original`.
    pub async fn detect_tampering(
        &self,
        original: &Fingerprint,
        candidate: &[u8],
    ) -> Result<bool, IntegrityError> {
        let actual = self.fingerprint(candidate).await?;
        Ok(self.report(original, &actual))
    }

    /// Read and store the file at `path`.
    pub async fn fingerprint_file(&self, path: &Path) -> Result<Fingerprint, IntegrityError> {
        self.store
            .store_file(path)
            .await
            .map_err(IntegrityError::IntegrityCheckFailed)
    }

    /// File-based variant of [`IntegrityVerifier::detect_tampering`].
    pub async fn detect_tampering_file(
        &self,
        original: &Fingerprint,
        candidate: &Path,
    ) -> Result<bool, IntegrityError> {
        let actual = self.fingerprint_file(candidate).await?;
        Ok(self.report(original, &actual))
    }

    /// Fingerprint both inputs and report whether they differ.
    pub async fn compare(&self, a: &[u8], b: &[u8]) -> Result<bool, IntegrityError> {
        let fa = self.fingerprint(a).await?;
        let fb = self.fingerprint(b).await?;
        Ok(fa != fb)
    }

    fn report(&self, original: &Fingerprint, actual: &Fingerprint) -> bool {
        let tampered = actual != original;
        if tampered {
            warn!(%original, %actual, "tampering detected: fingerprints do not match");
        } else {
            info!(%original, "no tampering detected");
        }
        tampered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ContentError, Result};
    use crate::store::MemoryContentStore;
    use async_trait::async_trait;

    struct UnreachableStore;

    #[async_trait]
    impl ContentStore for UnreachableStore {
        async fn store(&self, _bytes: &[u8]) -> Result<Fingerprint> {
            Err(ContentError::Transport("connection refused".into()))
        }

        async fn fetch(&self, fingerprint: &Fingerprint) -> Result<Vec<u8>> {
            Err(ContentError::NotFound(fingerprint.to_string()))
        }
    }

    fn verifier() -> IntegrityVerifier {
        IntegrityVerifier::new(Arc::new(MemoryContentStore::new()))
    }

    #[tokio::test]
    async fn test_identical_copy_is_not_tampered() {
        let verifier = verifier();
        let original = verifier.fingerprint(b"original data").await.unwrap();
        assert!(!verifier
            .detect_tampering(&original, b"original data")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_modified_copy_is_tampered() {
        let verifier = verifier();
        let original = verifier.fingerprint(b"original data").await.unwrap();
        assert!(verifier
            .detect_tampering(&original, b"original data.")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_compare_is_order_independent() {
        let verifier = verifier();
        assert_eq!(
            verifier.compare(b"a", b"b").await.unwrap(),
            verifier.compare(b"b", b"a").await.unwrap()
        );
        assert!(!verifier.compare(b"same", b"same").await.unwrap());
    }

    #[tokio::test]
    async fn test_store_failure_is_not_a_clean_result() {
        let verifier = IntegrityVerifier::new(Arc::new(UnreachableStore));
        let original = Fingerprint::new("Qm123").unwrap();
        let err = verifier
            .detect_tampering(&original, b"anything")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            IntegrityError::IntegrityCheckFailed(ContentError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_candidate_file() {
        let verifier = verifier();
        let original = Fingerprint::new("Qm123").unwrap();
        let err = verifier
            .detect_tampering_file(&original, Path::new("/nonexistent/candidate.txt"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            IntegrityError::IntegrityCheckFailed(ContentError::Io { .. })
        ));
    }
}
