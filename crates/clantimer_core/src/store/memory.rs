//! In-process snapshot store.
//!
//! Keeps the serialized blob in memory so every round-trip goes through the
//! same JSON codec as the SQLite store. Failures can be switched on to
//! exercise error paths in hosts.

use crate::model::snapshot::Snapshot;
use crate::store::{decode_blob, encode_blob, SnapshotStore, StoreError, StoreResult};
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    blob: Mutex<Option<String>>,
    fail_loads: AtomicBool,
    fail_saves: AtomicBool,
    saves: AtomicUsize,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with a raw blob, as if written by an earlier version.
    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: Mutex::new(Some(blob.into())),
            ..Self::default()
        }
    }

    /// Current raw blob; `Ok(None)` when nothing was saved yet.
    pub fn blob(&self) -> StoreResult<Option<String>> {
        let blob = self.blob.lock().map_err(|_| unavailable("read"))?;
        Ok(blob.clone())
    }

    pub fn set_fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

fn unavailable(operation: &str) -> StoreError {
    StoreError::Unavailable(Box::new(io::Error::other(format!(
        "memory store {operation} disabled"
    ))))
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> StoreResult<Snapshot> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(unavailable("load"));
        }
        let blob = self.blob.lock().map_err(|_| unavailable("load"))?;
        match blob.as_deref() {
            Some(blob) => decode_blob(blob),
            None => Ok(Snapshot::default()),
        }
    }

    fn save(&self, snapshot: &Snapshot) -> StoreResult<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(unavailable("save"));
        }
        let encoded = encode_blob(snapshot)?;
        let mut blob = self.blob.lock().map_err(|_| unavailable("save"))?;
        *blob = Some(encoded);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::MemorySnapshotStore;
    use crate::model::account::{Account, Timer};
    use crate::model::snapshot::Snapshot;
    use crate::store::{SnapshotStore, StoreError};
    use std::panic::{self, AssertUnwindSafe};

    #[test]
    fn empty_store_loads_empty_snapshot() {
        let store = MemorySnapshotStore::new();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn save_then_load_keeps_shape() {
        let store = MemorySnapshotStore::new();
        let snapshot = Snapshot::new(vec![Account::with_timers(
            "Main",
            vec![Timer::running("Laboratory", 99), Timer::new("Pet House")],
        )]);
        store.save(&snapshot).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.to_json().unwrap(), snapshot.to_json().unwrap());
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.blob().unwrap(), Some(snapshot.to_json().unwrap()));
    }

    #[test]
    fn poisoned_lock_is_not_read_as_empty() {
        let store = MemorySnapshotStore::new();
        assert_eq!(store.blob().unwrap(), None);

        let _ = panic::catch_unwind(AssertUnwindSafe(|| {
            let _guard = store.blob.lock().unwrap();
            panic!("poison the blob lock");
        }));

        assert!(matches!(store.blob(), Err(StoreError::Unavailable(_))));
        assert!(matches!(store.load(), Err(StoreError::Unavailable(_))));
    }

    #[test]
    fn failure_switches_surface_unavailable() {
        let store = MemorySnapshotStore::new();
        store.set_fail_saves(true);
        let err = store.save(&Snapshot::default()).unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert_eq!(store.save_count(), 0);

        store.set_fail_loads(true);
        assert!(matches!(store.load(), Err(StoreError::Unavailable(_))));
    }

    #[test]
    fn corrupt_blob_is_invalid_data() {
        let store = MemorySnapshotStore::with_blob("{not json");
        assert!(matches!(store.load(), Err(StoreError::InvalidData(_))));
    }
}
