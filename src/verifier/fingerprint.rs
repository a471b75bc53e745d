//! Order-independent digest of a result's key set
//!
//! Keys are sorted, then fed to SHA-256 with a length prefix on `id2`, so
//! two results fingerprint equal exactly when they hold the same keys.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::dataset::CompositeKey;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultFingerprint {
    pub count: usize,
    /// Lowercase hex SHA-256
    pub digest: String,
}

impl ResultFingerprint {
    pub fn of<'a>(keys: impl IntoIterator<Item = &'a CompositeKey>) -> Self {
        let mut keys: Vec<&CompositeKey> = keys.into_iter().collect();
        keys.sort();

        let mut hasher = Sha256::new();
        for key in &keys {
            hasher.update(key.id.to_be_bytes());
            hasher.update((key.id2.len() as u64).to_be_bytes());
            hasher.update(key.id2.as_bytes());
        }
        Self {
            count: keys.len(),
            digest: format!("{:x}", hasher.finalize()),
        }
    }
}
