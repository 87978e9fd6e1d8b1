//! Ledger Storage
//!
//! TigerStyle: One obfuscated file per identity, tolerant loads.
//!
//! Loading never fails the caller: a missing file, an unreadable file or a
//! corrupt document all read as "no saved ledger" and are logged. Saves
//! report errors so the writer can log them, but nothing retries.

use crate::codec::{self, BankData, CodecError};
use crate::ledger::{Ledger, LedgerSnapshot};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

// =============================================================================
// TigerStyle Constants
// =============================================================================

/// Ledger file name prefix
pub const FILE_PREFIX: &str = "bankdata-";

/// Ledger file extension
pub const FILE_SUFFIX: &str = ".dat";

/// Identity used when the player name is not available
pub const IDENTITY_FALLBACK: &str = "unknown";

// =============================================================================
// Store Trait
// =============================================================================

/// Where ledgers are persisted.
#[async_trait]
pub trait BalanceStore: Send + Sync {
    /// Saved ledger for `identity`, or `None` if there is nothing usable.
    fn load(&self, identity: &str) -> Option<Ledger>;

    /// Persist `snapshot` for `identity`.
    async fn save(&self, snapshot: &LedgerSnapshot, identity: &str) -> Result<(), StoreError>;
}

/// Lowercased identity with everything outside `[A-Za-z0-9_-]` replaced.
pub fn sanitize_identity(identity: &str) -> String {
    if identity.trim().is_empty() {
        return IDENTITY_FALLBACK.to_string();
    }

    identity
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

// =============================================================================
// File Store
// =============================================================================

/// Ledger files under a data directory.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    base_dir: PathBuf,
}

impl LedgerStore {
    /// Use `data_dir`, creating it if needed. Failure to create is logged;
    /// saves will then fail and be logged too.
    pub fn new(data_dir: &Path) -> Self {
        match std::fs::create_dir_all(data_dir) {
            Ok(()) => tracing::info!(path = %data_dir.display(), "Ledger data directory"),
            Err(e) => tracing::warn!(
                path = %data_dir.display(),
                error = %e,
                "Could not create ledger data directory"
            ),
        }

        Self {
            base_dir: data_dir.to_path_buf(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// `<data-dir>/bankdata-<sanitized>.dat`
    pub fn path_for(&self, identity: &str) -> PathBuf {
        self.base_dir.join(format!(
            "{}{}{}",
            FILE_PREFIX,
            sanitize_identity(identity),
            FILE_SUFFIX
        ))
    }
}

#[async_trait]
impl BalanceStore for LedgerStore {
    fn load(&self, identity: &str) -> Option<Ledger> {
        let path = self.path_for(identity);
        if !path.exists() {
            tracing::info!(path = %path.display(), "No saved ledger");
            return None;
        }

        let raw = match std::fs::read(&path) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read ledger file");
                return None;
            }
        };

        let data = match codec::decode(&raw) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to decode ledger file");
                return None;
            }
        };

        match data.into_ledger() {
            Some(ledger) => {
                tracing::info!(items = ledger.len(), path = %path.display(), "Loaded ledger");
                Some(ledger)
            }
            None => {
                tracing::warn!(path = %path.display(), "Ledger file has no balances");
                None
            }
        }
    }

    async fn save(&self, snapshot: &LedgerSnapshot, identity: &str) -> Result<(), StoreError> {
        let path = self.path_for(identity);
        let encoded = codec::encode(&BankData::from_snapshot(snapshot))?;

        // Write a sibling then rename so a crash never leaves a torn file
        let tmp = path.with_extension("dat.tmp");
        tokio::fs::write(&tmp, encoded.as_bytes()).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        tracing::info!(
            items = snapshot.len(),
            bytes = encoded.len(),
            path = %path.display(),
            "Saved ledger"
        );
        Ok(())
    }
}

// =============================================================================
// Memory Store
// =============================================================================

/// Encoded ledgers kept in memory, keyed by sanitized identity.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw encoded blob for `identity`
    pub fn blob(&self, identity: &str) -> Option<String> {
        match self.blobs.lock() {
            Ok(blobs) => blobs.get(&sanitize_identity(identity)).cloned(),
            Err(_) => {
                tracing::warn!(identity, error = %StoreError::Poisoned, "Failed to read stored ledger");
                None
            }
        }
    }

    /// Plant a raw blob, e.g. a corrupt one
    pub fn insert_blob(&self, identity: &str, blob: String) {
        match self.blobs.lock() {
            Ok(mut blobs) => {
                blobs.insert(sanitize_identity(identity), blob);
            }
            Err(_) => {
                tracing::warn!(identity, error = %StoreError::Poisoned, "Failed to store ledger blob");
            }
        }
    }
}

#[async_trait]
impl BalanceStore for MemoryStore {
    fn load(&self, identity: &str) -> Option<Ledger> {
        let blob = self.blob(identity)?;
        match codec::decode(blob.as_bytes()) {
            Ok(data) => data.into_ledger(),
            Err(e) => {
                tracing::warn!(identity, error = %e, "Failed to decode stored ledger");
                None
            }
        }
    }

    async fn save(&self, snapshot: &LedgerSnapshot, identity: &str) -> Result<(), StoreError> {
        let encoded = codec::encode(&BankData::from_snapshot(snapshot))?;
        self.blobs
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .insert(sanitize_identity(identity), encoded);
        Ok(())
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("store lock poisoned")]
    Poisoned,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::{reconcile, ObservedTotals};
    use crate::site::Site;
    use tempfile::tempdir;

    fn sample_ledger() -> Ledger {
        let mut ledger = Ledger::new();
        let first: ObservedTotals = [(7, 10), (1511, 250)].into_iter().collect();
        let second: ObservedTotals = [(7, 15), (1511, 250), (42, 1)].into_iter().collect();
        reconcile(&mut ledger, Some(Site::Lumbridge), &first);
        reconcile(&mut ledger, Some(Site::SeersVillage), &second);
        ledger
    }

    #[test]
    fn test_sanitize_identity() {
        assert_eq!(sanitize_identity("Zezima"), "zezima");
        assert_eq!(sanitize_identity("Iron Man 99"), "iron_man_99");
        assert_eq!(sanitize_identity("a-b_c.d"), "a-b_c_d");
        assert_eq!(sanitize_identity("  "), IDENTITY_FALLBACK);
    }

    #[test]
    fn test_path_for_identity() {
        let dir = tempdir().unwrap();
        let store = LedgerStore::new(dir.path());
        assert_eq!(
            store.path_for("Iron Man"),
            dir.path().join("bankdata-iron_man.dat")
        );
    }

    #[tokio::test]
    async fn test_file_round_trip() {
        let dir = tempdir().unwrap();
        let store = LedgerStore::new(dir.path());
        let ledger = sample_ledger();

        store.save(&ledger.snapshot(), "Zezima").await.unwrap();
        assert!(store.path_for("zezima").exists());
        assert!(!store.path_for("zezima").with_extension("dat.tmp").exists());

        let loaded = store.load("ZEZIMA").unwrap();
        assert_eq!(loaded, ledger);
        assert_eq!(loaded.local_quantity(7, Some(Site::SeersVillage)), 5);
    }

    #[test]
    fn test_missing_file_is_absent() {
        let dir = tempdir().unwrap();
        let store = LedgerStore::new(dir.path());
        assert!(store.load("nobody").is_none());
    }

    #[test]
    fn test_corrupt_file_is_absent() {
        let dir = tempdir().unwrap();
        let store = LedgerStore::new(dir.path());
        std::fs::write(store.path_for("zezima"), b"%%% definitely not a ledger").unwrap();
        assert!(store.load("zezima").is_none());
    }

    #[test]
    fn test_save_into_missing_dir_errors() {
        let dir = tempdir().unwrap();
        let store = LedgerStore {
            base_dir: dir.path().join("missing"),
        };
        let result = tokio_test::block_on(store.save(&Ledger::new().snapshot(), "zezima"));
        assert!(matches!(result, Err(StoreError::Io(_))));
    }

    #[tokio::test]
    async fn test_empty_ledger_round_trips() {
        let store = MemoryStore::new();
        store.save(&Ledger::new().snapshot(), "zezima").await.unwrap();
        let loaded = store.load("zezima").unwrap();
        assert!(loaded.is_empty());
    }

    #[tokio::test]
    async fn test_memory_store_round_trip_and_corruption() {
        let store = MemoryStore::new();
        let ledger = sample_ledger();
        store.save(&ledger.snapshot(), "Zezima").await.unwrap();
        assert_eq!(store.load("zezima"), Some(ledger));

        store.insert_blob("zezima", "garbage".to_string());
        assert!(store.load("zezima").is_none());
    }

    #[tokio::test]
    async fn test_poisoned_memory_store() {
        let store = std::sync::Arc::new(MemoryStore::new());
        store.save(&sample_ledger().snapshot(), "zezima").await.unwrap();

        let poisoner = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.blobs.lock().unwrap();
            panic!("poison the lock");
        })
        .join();

        assert!(store.blob("zezima").is_none());
        assert!(store.load("zezima").is_none());
        store.insert_blob("zezima", "garbage".to_string());
        let result = store.save(&Ledger::new().snapshot(), "zezima").await;
        assert!(matches!(result, Err(StoreError::Poisoned)));
    }
}
