//! Timer tracker use-case service.
//!
//! # Responsibility
//! - Own the store and the single current snapshot for one host.
//! - Validate edits, persist them, and run periodic reconciliation.
//!
//! # Invariants
//! - Every edit is applied to a copy and saved before it becomes current; a
//!   failed save leaves the in-memory snapshot unchanged.
//! - Edits addressing a missing id are no-ops reported as `NotFound`.
//! - Completions are reported only once the reconciled snapshot is saved.

use crate::engine::{self, CompletedTimer};
use crate::model::account::{
    name_key, normalize_name, Account, AccountId, Timer, TimerId, ValidationError,
};
use crate::model::duration::TimerDuration;
use crate::model::snapshot::Snapshot;
use crate::service::views::{self, AccountSummary, TimerView};
use crate::store::{SnapshotStore, StoreError};
use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for timer use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Edit input was rejected.
    Validation(ValidationError),
    /// Snapshot could not be loaded or saved.
    Store(StoreError),
    /// Import/export JSON could not be encoded or decoded.
    Codec(serde_json::Error),
    /// A thread panicked while holding the shared service lock.
    LockPoisoned,
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Codec(err) => write!(f, "invalid snapshot json: {err}"),
            Self::LockPoisoned => write!(f, "timer service lock poisoned"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Codec(err) => Some(err),
            Self::LockPoisoned => None,
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Result of an edit addressed by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Applied,
    /// Target no longer exists; nothing changed.
    NotFound,
}

/// Result of one reconciliation tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Timers cleared and persisted by this tick.
    pub completed: Vec<CompletedTimer>,
    /// Whether a save was performed.
    pub persisted: bool,
}

/// Timer service facade over a snapshot store.
pub struct TimerService<S: SnapshotStore> {
    store: S,
    snapshot: Snapshot,
}

impl<S: SnapshotStore> TimerService<S> {
    /// Loads the current snapshot from `store`.
    ///
    /// # Errors
    /// - `ServiceError::Store` when the store cannot be read. A missing blob
    ///   is not an error and yields an empty snapshot.
    pub fn open(store: S) -> Result<Self, ServiceError> {
        let snapshot = store.load()?;
        report_duplicates(&snapshot);
        info!(
            "event=service_open module=service status=ok accounts={}",
            snapshot.accounts.len()
        );
        Ok(Self { store, snapshot })
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Replaces the in-memory snapshot with the stored one.
    pub fn reload(&mut self) -> Result<(), ServiceError> {
        let snapshot = self.store.load()?;
        report_duplicates(&snapshot);
        self.snapshot = snapshot;
        Ok(())
    }

    pub fn find_account(&self, name: &str) -> Option<&Account> {
        self.snapshot.find_account(name)
    }

    pub fn find_timer(&self, account_id: AccountId, name: &str) -> Option<&Timer> {
        self.snapshot.account(account_id)?.find_timer(name)
    }

    /// Creates an account with the preset timer set.
    pub fn create_account(&mut self, name: &str) -> Result<AccountId, ServiceError> {
        let name = normalize_name(name, ValidationError::BlankAccountName)?;
        ensure_account_name_free(&self.snapshot, &name, None)?;

        let account = Account::new(name);
        let id = account.id;
        let mut next = self.snapshot.clone();
        next.accounts.push(account);
        self.commit(next, "account_create")?;
        Ok(id)
    }

    pub fn rename_account(
        &mut self,
        account_id: AccountId,
        name: &str,
    ) -> Result<EditOutcome, ServiceError> {
        let name = normalize_name(name, ValidationError::BlankAccountName)?;
        ensure_account_name_free(&self.snapshot, &name, Some(account_id))?;
        self.edit("account_rename", |next| {
            let Some(account) = next.account_mut(account_id) else {
                return Ok(EditOutcome::NotFound);
            };
            account.name = name;
            Ok(EditOutcome::Applied)
        })
    }

    pub fn delete_account(&mut self, account_id: AccountId) -> Result<EditOutcome, ServiceError> {
        self.edit("account_delete", |next| {
            let before = next.accounts.len();
            next.accounts.retain(|account| account.id != account_id);
            if next.accounts.len() == before {
                return Ok(EditOutcome::NotFound);
            }
            Ok(EditOutcome::Applied)
        })
    }

    /// Appends an available timer; `None` when the account is gone.
    pub fn add_timer(
        &mut self,
        account_id: AccountId,
        name: &str,
    ) -> Result<Option<TimerId>, ServiceError> {
        let name = normalize_name(name, ValidationError::BlankTimerName)?;
        let timer = Timer::new(name);
        let timer_id = timer.id;

        let outcome = self.edit("timer_add", |next| {
            let Some(account) = next.account_mut(account_id) else {
                return Ok(EditOutcome::NotFound);
            };
            ensure_timer_name_free(account, &timer.name, None)?;
            account.timers.push(timer);
            Ok(EditOutcome::Applied)
        })?;

        Ok((outcome == EditOutcome::Applied).then_some(timer_id))
    }

    pub fn rename_timer(
        &mut self,
        account_id: AccountId,
        timer_id: TimerId,
        name: &str,
    ) -> Result<EditOutcome, ServiceError> {
        let name = normalize_name(name, ValidationError::BlankTimerName)?;
        self.edit("timer_rename", |next| {
            let Some(account) = next.account_mut(account_id) else {
                return Ok(EditOutcome::NotFound);
            };
            if account.timer(timer_id).is_none() {
                return Ok(EditOutcome::NotFound);
            }
            ensure_timer_name_free(account, &name, Some(timer_id))?;
            if let Some(timer) = account.timer_mut(timer_id) {
                timer.name = name;
            }
            Ok(EditOutcome::Applied)
        })
    }

    pub fn remove_timer(
        &mut self,
        account_id: AccountId,
        timer_id: TimerId,
    ) -> Result<EditOutcome, ServiceError> {
        self.edit("timer_remove", |next| {
            let Some(account) = next.account_mut(account_id) else {
                return Ok(EditOutcome::NotFound);
            };
            let before = account.timers.len();
            account.timers.retain(|timer| timer.id != timer_id);
            if account.timers.len() == before {
                return Ok(EditOutcome::NotFound);
            }
            Ok(EditOutcome::Applied)
        })
    }

    /// Starts a countdown of `duration` from `now`; a zero duration clears.
    pub fn set_timer(
        &mut self,
        account_id: AccountId,
        timer_id: TimerId,
        duration: TimerDuration,
        now: i64,
    ) -> Result<EditOutcome, ServiceError> {
        let end_timestamp = (!duration.is_zero()).then(|| now + duration.as_millis());
        self.write_end_timestamp(account_id, timer_id, end_timestamp)
    }

    pub fn clear_timer(
        &mut self,
        account_id: AccountId,
        timer_id: TimerId,
    ) -> Result<EditOutcome, ServiceError> {
        self.write_end_timestamp(account_id, timer_id, None)
    }

    /// Clears elapsed timers and persists the result when anything changed.
    ///
    /// # Errors
    /// - `ServiceError::Store` when the save fails. The in-memory snapshot is
    ///   left untouched so the next tick retries and reports the same
    ///   completions.
    pub fn tick(&mut self, now: i64) -> Result<TickReport, ServiceError> {
        let reconciliation = engine::reconcile_with_report(&self.snapshot, now);
        if !reconciliation.changed() {
            return Ok(TickReport::default());
        }

        self.commit(reconciliation.snapshot, "timer_tick")?;
        for completed in &reconciliation.completed {
            info!(
                "event=timer_complete module=service status=ok account_id={} timer_id={} completed_at={}",
                completed.account_id, completed.timer_id, completed.completed_at
            );
        }
        Ok(TickReport {
            completed: reconciliation.completed,
            persisted: true,
        })
    }

    /// Pretty-printed JSON of the full snapshot in the persisted shape.
    pub fn export_json(&self) -> Result<String, ServiceError> {
        self.snapshot.to_pretty_json().map_err(ServiceError::Codec)
    }

    /// Appends accounts from exported JSON; returns how many were added.
    ///
    /// # Errors
    /// - `ServiceError::Codec` when the text is not the persisted shape.
    /// - `ServiceError::Validation` when any imported name is blank or
    ///   collides; nothing is imported in that case.
    pub fn import_json(&mut self, text: &str) -> Result<usize, ServiceError> {
        let imported = Snapshot::from_json(text).map_err(ServiceError::Codec)?;
        let mut taken: HashSet<String> = self
            .snapshot
            .accounts
            .iter()
            .map(|account| name_key(&account.name))
            .collect();

        let mut next = self.snapshot.clone();
        for mut account in imported.accounts {
            account.name = normalize_name(&account.name, ValidationError::BlankAccountName)?;
            if !taken.insert(name_key(&account.name)) {
                return Err(ValidationError::DuplicateAccountName(account.name).into());
            }
            let mut timer_names = HashSet::new();
            for timer in &mut account.timers {
                timer.name = normalize_name(&timer.name, ValidationError::BlankTimerName)?;
                if !timer_names.insert(name_key(&timer.name)) {
                    return Err(ValidationError::DuplicateTimerName {
                        account: account.name.clone(),
                        timer: timer.name.clone(),
                    }
                    .into());
                }
            }
            next.accounts.push(account);
        }

        let added = next.accounts.len() - self.snapshot.accounts.len();
        self.commit(next, "snapshot_import")?;
        Ok(added)
    }

    /// Accounts in display order with badge and closest pending timer.
    pub fn account_summaries(&self, now: i64) -> Vec<AccountSummary> {
        views::account_summaries(&self.snapshot, now)
    }

    /// Timers of one account in display order; `None` when it is gone.
    pub fn timer_views(&self, account_id: AccountId, now: i64) -> Option<Vec<TimerView>> {
        views::timer_views(&self.snapshot, account_id, now)
    }

    fn write_end_timestamp(
        &mut self,
        account_id: AccountId,
        timer_id: TimerId,
        end_timestamp: Option<i64>,
    ) -> Result<EditOutcome, ServiceError> {
        self.edit("timer_set", |next| {
            let Some(timer) = next
                .account_mut(account_id)
                .and_then(|account| account.timer_mut(timer_id))
            else {
                return Ok(EditOutcome::NotFound);
            };
            timer.end_timestamp = end_timestamp;
            Ok(EditOutcome::Applied)
        })
    }

    fn edit(
        &mut self,
        event: &str,
        apply: impl FnOnce(&mut Snapshot) -> Result<EditOutcome, ValidationError>,
    ) -> Result<EditOutcome, ServiceError> {
        let mut next = self.snapshot.clone();
        match apply(&mut next)? {
            EditOutcome::Applied => {
                self.commit(next, event)?;
                Ok(EditOutcome::Applied)
            }
            EditOutcome::NotFound => {
                warn!("event={event} module=service status=skipped reason=not_found");
                Ok(EditOutcome::NotFound)
            }
        }
    }

    fn commit(&mut self, next: Snapshot, event: &str) -> Result<(), ServiceError> {
        if let Err(err) = self.store.save(&next) {
            error!("event={event} module=service status=error error_code=save_failed error={err}");
            return Err(err.into());
        }
        debug!(
            "event={event} module=service status=ok accounts={}",
            next.accounts.len()
        );
        self.snapshot = next;
        Ok(())
    }
}

fn ensure_account_name_free(
    snapshot: &Snapshot,
    name: &str,
    except: Option<AccountId>,
) -> Result<(), ValidationError> {
    let key = name_key(name);
    let taken = snapshot
        .accounts
        .iter()
        .any(|account| Some(account.id) != except && name_key(&account.name) == key);
    if taken {
        return Err(ValidationError::DuplicateAccountName(name.to_string()));
    }
    Ok(())
}

fn ensure_timer_name_free(
    account: &Account,
    name: &str,
    except: Option<TimerId>,
) -> Result<(), ValidationError> {
    let key = name_key(name);
    let taken = account
        .timers
        .iter()
        .any(|timer| Some(timer.id) != except && name_key(&timer.name) == key);
    if taken {
        return Err(ValidationError::DuplicateTimerName {
            account: account.name.clone(),
            timer: name.to_string(),
        });
    }
    Ok(())
}

fn report_duplicates(snapshot: &Snapshot) {
    let duplicates = snapshot.duplicate_names();
    if !duplicates.is_empty() {
        warn!(
            "event=snapshot_duplicates module=service status=warn count={}",
            duplicates.len()
        );
    }
}
