//! Snapshot aggregate and its legacy JSON wire shape.
//!
//! # Responsibility
//! - Hold the full ordered account list owned by the host.
//! - Convert between in-memory records (with ids) and the persisted,
//!   name-based shape.
//!
//! # Invariants
//! - Wire shape is `[{"name", "timers": [{"name", "endTimestamp"?}]}]`.
//! - Absent `endTimestamp` stays absent on write; it is never emitted as null.
//! - Decoding assigns fresh ids; ids never reach the wire.

use crate::model::account::{name_key, Account, AccountId, Timer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Full tracker state: ordered list of accounts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<AccountRecord>", into = "Vec<AccountRecord>")]
pub struct Snapshot {
    pub accounts: Vec<Account>,
}

/// Persisted account shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub name: String,
    #[serde(default)]
    pub timers: Vec<TimerRecord>,
}

/// Persisted timer shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerRecord {
    pub name: String,
    #[serde(
        rename = "endTimestamp",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub end_timestamp: Option<i64>,
}

impl From<Vec<AccountRecord>> for Snapshot {
    fn from(records: Vec<AccountRecord>) -> Self {
        let accounts = records
            .into_iter()
            .map(|record| {
                let timers = record
                    .timers
                    .into_iter()
                    .map(|timer| Timer {
                        end_timestamp: timer.end_timestamp,
                        ..Timer::new(timer.name)
                    })
                    .collect();
                Account::with_timers(record.name, timers)
            })
            .collect();
        Self { accounts }
    }
}

impl From<Snapshot> for Vec<AccountRecord> {
    fn from(snapshot: Snapshot) -> Self {
        snapshot
            .accounts
            .into_iter()
            .map(|account| AccountRecord {
                name: account.name,
                timers: account
                    .timers
                    .into_iter()
                    .map(|timer| TimerRecord {
                        name: timer.name,
                        end_timestamp: timer.end_timestamp,
                    })
                    .collect(),
            })
            .collect()
    }
}

impl Snapshot {
    pub fn new(accounts: Vec<Account>) -> Self {
        Self { accounts }
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn account(&self, id: AccountId) -> Option<&Account> {
        self.accounts.iter().find(|account| account.id == id)
    }

    pub fn account_mut(&mut self, id: AccountId) -> Option<&mut Account> {
        self.accounts.iter_mut().find(|account| account.id == id)
    }

    /// Finds an account by name, ignoring case and surrounding whitespace.
    pub fn find_account(&self, name: &str) -> Option<&Account> {
        let key = name_key(name);
        self.accounts
            .iter()
            .find(|account| name_key(&account.name) == key)
    }

    /// Compact JSON in the persisted shape.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Pretty-printed JSON in the persisted shape, used for export.
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Returns names that collide with an earlier account or timer name.
    ///
    /// Entries are `account` for account collisions and `account/timer` for
    /// timer collisions within one account. Legacy data may contain these.
    pub fn duplicate_names(&self) -> Vec<String> {
        let mut duplicates = Vec::new();
        let mut seen_accounts = HashSet::new();
        for account in &self.accounts {
            if !seen_accounts.insert(name_key(&account.name)) {
                duplicates.push(account.name.clone());
            }
            let mut seen_timers = HashSet::new();
            for timer in &account.timers {
                if !seen_timers.insert(name_key(&timer.name)) {
                    duplicates.push(format!("{}/{}", account.name, timer.name));
                }
            }
        }
        duplicates
    }
}

#[cfg(test)]
mod tests {
    use super::Snapshot;
    use crate::model::account::{Account, Timer};

    #[test]
    fn absent_end_timestamp_is_not_written() {
        let snapshot = Snapshot::new(vec![Account::with_timers(
            "Main",
            vec![Timer::new("Builder 1"), Timer::running("Laboratory", 42)],
        )]);

        let json = snapshot.to_json().unwrap();
        assert_eq!(
            json,
            r#"[{"name":"Main","timers":[{"name":"Builder 1"},{"name":"Laboratory","endTimestamp":42}]}]"#
        );
    }

    #[test]
    fn decoding_legacy_blob_assigns_ids_and_keeps_order() {
        let snapshot = Snapshot::from_json(
            r#"[{"name":"B","timers":[{"name":"x","endTimestamp":7},{"name":"y"}]},{"name":"A","timers":[]}]"#,
        )
        .unwrap();

        assert_eq!(snapshot.accounts.len(), 2);
        assert_eq!(snapshot.accounts[0].name, "B");
        assert_eq!(snapshot.accounts[1].name, "A");
        assert_eq!(snapshot.accounts[0].timers[0].end_timestamp, Some(7));
        assert_eq!(snapshot.accounts[0].timers[1].end_timestamp, None);
        assert!(!snapshot.accounts[0].id.is_nil());
        assert_ne!(
            snapshot.accounts[0].timers[0].id,
            snapshot.accounts[0].timers[1].id
        );
    }

    #[test]
    fn null_end_timestamp_and_missing_timers_decode_as_absent() {
        let snapshot =
            Snapshot::from_json(r#"[{"name":"A","timers":[{"name":"x","endTimestamp":null}]},{"name":"B"}]"#)
                .unwrap();
        assert_eq!(snapshot.accounts[0].timers[0].end_timestamp, None);
        assert!(snapshot.accounts[1].timers.is_empty());
    }

    #[test]
    fn duplicate_names_reports_accounts_and_timers() {
        let snapshot = Snapshot::new(vec![
            Account::with_timers("Main", vec![Timer::new("Lab"), Timer::new("lab")]),
            Account::with_timers("main ", vec![]),
        ]);
        assert_eq!(snapshot.duplicate_names(), vec!["Main/lab", "main "]);
    }

    #[test]
    fn find_account_is_case_insensitive() {
        let snapshot = Snapshot::new(vec![Account::new("Main"), Account::new("Alt")]);
        assert_eq!(snapshot.find_account("ALT").unwrap().name, "Alt");
        assert!(snapshot.find_account("Other").is_none());
    }
}
