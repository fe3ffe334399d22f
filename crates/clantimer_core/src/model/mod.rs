//! Timer tracker domain model.
//!
//! # Responsibility
//! - Define accounts, timers and the snapshot that holds them.
//! - Own the legacy JSON wire shape used by stores and import/export.
//!
//! # Invariants
//! - Every account and timer carries a stable opaque id; names are display
//!   attributes only.
//! - Ids are never persisted; the wire shape stays name-based.

pub mod account;
pub mod duration;
pub mod snapshot;
