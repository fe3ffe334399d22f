//! Timer availability engine.
//!
//! Pure functions over a snapshot and an explicit `now` (Unix epoch
//! milliseconds). Nothing here reads the system clock, touches storage, or
//! mutates its input; the caller supplies the anchor and owns the result.
//!
//! # Functions
//!
//! - [`remaining`] / [`is_available`]: per-timer state.
//! - [`account_availability`]: `available/total` badge counts.
//! - [`closest_pending_timer`]: label of the soonest running timer.
//! - [`min_remaining_across_timers`]: account sort key.
//! - [`order_accounts`] / [`order_timers`]: display order.
//! - [`reconcile_completions`] / [`reconcile_with_report`]: clear elapsed timers.

use crate::model::account::{Account, AccountId, Timer, TimerId};
use crate::model::snapshot::Snapshot;
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

const MINUTE_MS: i64 = 60_000;
const HOUR_MS: i64 = 60 * MINUTE_MS;

/// Available/total timer counts for one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Availability {
    pub available: usize,
    pub total: usize,
}

impl Display for Availability {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.available, self.total)
    }
}

/// Soonest-to-complete running timer of an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosestPending {
    pub timer_id: TimerId,
    pub name: String,
    pub remaining_ms: i64,
}

impl ClosestPending {
    /// Display label, e.g. `Builder 2: 1h 30m`.
    pub fn label(&self) -> String {
        format!("{}: {}", self.name, format_remaining(self.remaining_ms))
    }
}

/// Minimum remaining time across an account's running timers.
///
/// Variant order gives the sort order: any pending value sorts before
/// `Infinite`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MinRemaining {
    Pending(i64),
    Infinite,
}

/// A timer cleared by reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedTimer {
    pub account_id: AccountId,
    pub account_name: String,
    pub timer_id: TimerId,
    pub timer_name: String,
    /// The completion instant that elapsed.
    pub completed_at: i64,
}

/// Reconciled snapshot plus the timers it cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub snapshot: Snapshot,
    pub completed: Vec<CompletedTimer>,
}

impl Reconciliation {
    pub fn changed(&self) -> bool {
        !self.completed.is_empty()
    }
}

/// Remaining countdown in milliseconds, never negative.
pub fn remaining(timer: &Timer, now: i64) -> i64 {
    timer
        .end_timestamp
        .map_or(0, |end| end.saturating_sub(now).max(0))
}

/// Whether the timer can be used now.
///
/// Elapsed timers count as available before reconciliation clears them.
pub fn is_available(timer: &Timer, now: i64) -> bool {
    match timer.end_timestamp {
        None => true,
        Some(end) => end <= now,
    }
}

pub fn account_availability(account: &Account, now: i64) -> Availability {
    Availability {
        available: account
            .timers
            .iter()
            .filter(|timer| is_available(timer, now))
            .count(),
        total: account.timers.len(),
    }
}

/// Returns the running timer with the least remaining time.
///
/// Ties are broken by case-insensitive name, then exact name, then storage
/// order.
pub fn closest_pending_timer(account: &Account, now: i64) -> Option<ClosestPending> {
    account
        .timers
        .iter()
        .map(|timer| (timer, remaining(timer, now)))
        .filter(|(_, left)| *left > 0)
        .min_by(|(a, left_a), (b, left_b)| {
            left_a
                .cmp(left_b)
                .then_with(|| compare_names(&a.name, &b.name))
        })
        .map(|(timer, left)| ClosestPending {
            timer_id: timer.id,
            name: timer.name.clone(),
            remaining_ms: left,
        })
}

pub fn min_remaining_across_timers(account: &Account, now: i64) -> MinRemaining {
    account
        .timers
        .iter()
        .map(|timer| remaining(timer, now))
        .filter(|left| *left > 0)
        .min()
        .map_or(MinRemaining::Infinite, MinRemaining::Pending)
}

/// Orders accounts for display.
///
/// Key: most available timers first, then soonest pending completion
/// (accounts with nothing pending last), then name. The sort is stable, so
/// accounts with identical names keep storage order.
pub fn order_accounts(accounts: &[Account], now: i64) -> Vec<&Account> {
    let mut keyed: Vec<(&Account, usize, MinRemaining)> = accounts
        .iter()
        .map(|account| {
            (
                account,
                account_availability(account, now).available,
                min_remaining_across_timers(account, now),
            )
        })
        .collect();

    keyed.sort_by(|(a, avail_a, min_a), (b, avail_b, min_b)| {
        avail_b
            .cmp(avail_a)
            .then_with(|| min_a.cmp(min_b))
            .then_with(|| compare_names(&a.name, &b.name))
    });

    keyed.into_iter().map(|(account, _, _)| account).collect()
}

/// Orders timers for display: least remaining first, then name.
pub fn order_timers(account: &Account, now: i64) -> Vec<&Timer> {
    let mut timers: Vec<&Timer> = account.timers.iter().collect();
    timers.sort_by(|a, b| {
        remaining(a, now)
            .cmp(&remaining(b, now))
            .then_with(|| compare_names(&a.name, &b.name))
    });
    timers
}

/// Returns a copy of `snapshot` with every elapsed timer cleared.
pub fn reconcile_completions(snapshot: &Snapshot, now: i64) -> Snapshot {
    reconcile_with_report(snapshot, now).snapshot
}

/// Like [`reconcile_completions`], also listing the timers that were cleared.
pub fn reconcile_with_report(snapshot: &Snapshot, now: i64) -> Reconciliation {
    let mut completed = Vec::new();
    let accounts = snapshot
        .accounts
        .iter()
        .map(|account| {
            let timers = account
                .timers
                .iter()
                .map(|timer| match timer.end_timestamp {
                    Some(end) if end <= now => {
                        completed.push(CompletedTimer {
                            account_id: account.id,
                            account_name: account.name.clone(),
                            timer_id: timer.id,
                            timer_name: timer.name.clone(),
                            completed_at: end,
                        });
                        timer.reset()
                    }
                    _ => timer.clone(),
                })
                .collect();
            Account {
                id: account.id,
                name: account.name.clone(),
                timers,
            }
        })
        .collect();

    Reconciliation {
        snapshot: Snapshot::new(accounts),
        completed,
    }
}

/// Formats a duration as `{H}h {M}m`, truncating seconds.
pub fn format_remaining(remaining_ms: i64) -> String {
    let remaining_ms = remaining_ms.max(0);
    let hours = remaining_ms / HOUR_MS;
    let minutes = (remaining_ms % HOUR_MS) / MINUTE_MS;
    format!("{hours}h {minutes}m")
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}
