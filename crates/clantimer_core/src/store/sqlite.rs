//! SQLite-backed snapshot store.
//!
//! # Responsibility
//! - Persist the snapshot as one JSON blob in the `kv_store` table.
//!
//! # Invariants
//! - Only the `accounts` key is read or written.
//! - Writes replace the blob atomically (single `INSERT ... ON CONFLICT`).

use crate::db::{open_db, open_db_in_memory};
use crate::model::snapshot::Snapshot;
use crate::store::{decode_blob, encode_blob, SnapshotStore, StoreResult, SNAPSHOT_KEY};
use log::{debug, error};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// Snapshot store over an owned SQLite connection.
pub struct SqliteSnapshotStore {
    conn: Connection,
}

impl SqliteSnapshotStore {
    /// Wraps a connection that already went through `db::open_db*`.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Opens (or creates) a store file, applying migrations.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn read_blob(&self) -> StoreResult<Option<String>> {
        let blob = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1;",
                [SNAPSHOT_KEY],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(blob)
    }
}

impl SnapshotStore for SqliteSnapshotStore {
    fn load(&self) -> StoreResult<Snapshot> {
        let result = self.read_blob().and_then(|blob| match blob {
            Some(blob) => decode_blob(&blob),
            None => Ok(Snapshot::default()),
        });

        match &result {
            Ok(snapshot) => debug!(
                "event=snapshot_load module=store status=ok backend=sqlite accounts={}",
                snapshot.accounts.len()
            ),
            Err(err) => error!(
                "event=snapshot_load module=store status=error backend=sqlite error={err}"
            ),
        }
        result
    }

    fn save(&self, snapshot: &Snapshot) -> StoreResult<()> {
        let result = encode_blob(snapshot).and_then(|blob| {
            self.conn.execute(
                "INSERT INTO kv_store (key, value, updated_at)
                 VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
                 ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at;",
                params![SNAPSHOT_KEY, blob],
            )?;
            Ok(())
        });

        match &result {
            Ok(()) => debug!(
                "event=snapshot_save module=store status=ok backend=sqlite accounts={}",
                snapshot.accounts.len()
            ),
            Err(err) => error!(
                "event=snapshot_save module=store status=error backend=sqlite error={err}"
            ),
        }
        result
    }
}
