//! Snapshot persistence contracts and implementations.
//!
//! # Responsibility
//! - Define the `load`/`save` contract the host uses to persist snapshots.
//! - Keep the single-blob key-value layout inside the storage boundary.
//!
//! # Invariants
//! - `save` followed by `load` reproduces the same persisted shape,
//!   including absence vs presence of `endTimestamp`.
//! - A missing blob loads as an empty snapshot; backend failures are errors.

use crate::db::DbError;
use crate::model::snapshot::Snapshot;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub mod memory;
pub mod sqlite;

/// Key under which the serialized account list is stored.
pub const SNAPSHOT_KEY: &str = "accounts";

pub type StoreResult<T> = Result<T, StoreError>;

/// Snapshot store failure.
#[derive(Debug)]
pub enum StoreError {
    /// Backend could not be read or written.
    Unavailable(Box<dyn Error + Send + Sync>),
    /// Stored blob is not a valid snapshot.
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(err) => write!(f, "snapshot store unavailable: {err}"),
            Self::InvalidData(message) => write!(f, "invalid stored snapshot: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unavailable(err) => Some(err.as_ref()),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Unavailable(Box::new(value))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Unavailable(Box::new(value))
    }
}

/// Single-writer persistence for the full snapshot.
pub trait SnapshotStore {
    fn load(&self) -> StoreResult<Snapshot>;
    fn save(&self, snapshot: &Snapshot) -> StoreResult<()>;
}

impl<S: SnapshotStore + ?Sized> SnapshotStore for Box<S> {
    fn load(&self) -> StoreResult<Snapshot> {
        (**self).load()
    }

    fn save(&self, snapshot: &Snapshot) -> StoreResult<()> {
        (**self).save(snapshot)
    }
}

impl<S: SnapshotStore + ?Sized> SnapshotStore for Arc<S> {
    fn load(&self) -> StoreResult<Snapshot> {
        (**self).load()
    }

    fn save(&self, snapshot: &Snapshot) -> StoreResult<()> {
        (**self).save(snapshot)
    }
}

pub(crate) fn decode_blob(blob: &str) -> StoreResult<Snapshot> {
    Snapshot::from_json(blob).map_err(|err| StoreError::InvalidData(err.to_string()))
}

pub(crate) fn encode_blob(snapshot: &Snapshot) -> StoreResult<String> {
    snapshot
        .to_json()
        .map_err(|err| StoreError::InvalidData(err.to_string()))
}
