//! Display projections over a snapshot.
//!
//! Rows are returned in engine display order so hosts render them as-is.

use crate::engine::{self, Availability, ClosestPending};
use crate::model::account::{AccountId, TimerId};
use crate::model::snapshot::Snapshot;

/// One row of the account list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSummary {
    pub id: AccountId,
    pub name: String,
    pub availability: Availability,
    pub closest: Option<ClosestPending>,
}

/// One row of an account's timer list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerView {
    pub id: TimerId,
    pub name: String,
    pub end_timestamp: Option<i64>,
    pub remaining_ms: i64,
    pub available: bool,
}

impl TimerView {
    /// `Available` or the formatted remaining time.
    pub fn status_label(&self) -> String {
        if self.available {
            "Available".to_string()
        } else {
            engine::format_remaining(self.remaining_ms)
        }
    }
}

pub fn account_summaries(snapshot: &Snapshot, now: i64) -> Vec<AccountSummary> {
    engine::order_accounts(&snapshot.accounts, now)
        .into_iter()
        .map(|account| AccountSummary {
            id: account.id,
            name: account.name.clone(),
            availability: engine::account_availability(account, now),
            closest: engine::closest_pending_timer(account, now),
        })
        .collect()
}

pub fn timer_views(snapshot: &Snapshot, account_id: AccountId, now: i64) -> Option<Vec<TimerView>> {
    let account = snapshot.account(account_id)?;
    Some(
        engine::order_timers(account, now)
            .into_iter()
            .map(|timer| TimerView {
                id: timer.id,
                name: timer.name.clone(),
                end_timestamp: timer.end_timestamp,
                remaining_ms: engine::remaining(timer, now),
                available: engine::is_available(timer, now),
            })
            .collect(),
    )
}
