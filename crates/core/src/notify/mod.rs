//! Change notifications.
//!
//! After a mutation commits, every row it touched is announced once, carrying
//! the full committed row rather than a diff. Transport is somebody else's
//! problem; [`BroadcastNotifier`] just fans changes out in-process.

use serde::Serialize;
use tally_shared::types::{TransactionId, UserId};
use tokio::sync::broadcast;
use tracing::debug;

use crate::ledger::{
    AccountBalance, CreateEntryInput, CreateTransferInput, EntryPatch, LedgerEngine, LedgerError,
    LedgerOutcome, LedgerStore, LegitimacyGuard, Transaction, TransferOutcome,
};

/// What happened to a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    /// Row inserted.
    Created,
    /// Row modified.
    Updated,
    /// Row soft-deleted.
    Deleted,
    /// Row restored.
    Undeleted,
    /// Account balance moved.
    BalanceChanged,
}

/// The committed row a change refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "entity", content = "row", rename_all = "snake_case")]
pub enum ChangedRow {
    /// A ledger entry.
    Transaction(Transaction),
    /// An account with its new balance.
    Account(AccountBalance),
}

/// One notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
    /// What happened.
    pub action: ChangeAction,
    /// The row it happened to.
    pub row: ChangedRow,
}

impl Change {
    /// Changes for a single-entry outcome: the entry, its partner, then balances.
    #[must_use]
    pub fn from_outcome(action: ChangeAction, outcome: &LedgerOutcome) -> Vec<Self> {
        let mut changes = vec![Self::transaction(action, &outcome.entry)];
        if let Some(partner) = &outcome.partner {
            changes.push(Self::transaction(action, partner));
        }
        changes.extend(outcome.balances.iter().map(Self::balance));
        changes
    }

    /// Changes for a new transfer pair.
    #[must_use]
    pub fn from_transfer(outcome: &TransferOutcome) -> Vec<Self> {
        let mut changes = vec![
            Self::transaction(ChangeAction::Created, &outcome.source),
            Self::transaction(ChangeAction::Created, &outcome.destination),
        ];
        changes.extend(outcome.balances.iter().map(Self::balance));
        changes
    }

    fn transaction(action: ChangeAction, entry: &Transaction) -> Self {
        Self {
            action,
            row: ChangedRow::Transaction(entry.clone()),
        }
    }

    fn balance(balance: &AccountBalance) -> Self {
        Self {
            action: ChangeAction::BalanceChanged,
            row: ChangedRow::Account(balance.clone()),
        }
    }
}

/// Receives changes after commit.
pub trait ChangeNotifier: Send + Sync {
    /// Announces one change. Must not fail the already-committed mutation.
    fn notify(&self, change: Change);
}

/// Fans changes out to every current subscriber.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<Change>,
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(256)
    }
}

impl BroadcastNotifier {
    /// Creates a notifier whose subscribers buffer up to `capacity` changes.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribes to changes published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Change> {
        self.sender.subscribe()
    }
}

impl ChangeNotifier for BroadcastNotifier {
    fn notify(&self, change: Change) {
        if self.sender.send(change).is_err() {
            debug!("No subscribers for ledger change");
        }
    }
}

/// A [`LedgerEngine`] that publishes every committed outcome.
#[derive(Debug, Clone)]
pub struct NotifyingLedger<S, G, N> {
    engine: LedgerEngine<S, G>,
    notifier: N,
}

impl<S, G, N> NotifyingLedger<S, G, N>
where
    S: LedgerStore,
    G: LegitimacyGuard<S::Unit>,
    N: ChangeNotifier,
{
    /// Wraps `engine`.
    pub fn new(engine: LedgerEngine<S, G>, notifier: N) -> Self {
        Self { engine, notifier }
    }

    /// Returns the wrapped engine.
    pub fn engine(&self) -> &LedgerEngine<S, G> {
        &self.engine
    }

    /// See [`LedgerEngine::create_entry`].
    pub async fn create_entry(
        &self,
        input: CreateEntryInput,
        actor: UserId,
    ) -> Result<LedgerOutcome, LedgerError> {
        let outcome = self.engine.create_entry(input, actor).await?;
        self.publish(Change::from_outcome(ChangeAction::Created, &outcome));
        Ok(outcome)
    }

    /// See [`LedgerEngine::create_transfer`].
    pub async fn create_transfer(
        &self,
        input: CreateTransferInput,
        actor: UserId,
    ) -> Result<TransferOutcome, LedgerError> {
        let outcome = self.engine.create_transfer(input, actor).await?;
        self.publish(Change::from_transfer(&outcome));
        Ok(outcome)
    }

    /// See [`LedgerEngine::update_entry`].
    pub async fn update_entry(
        &self,
        id: TransactionId,
        patch: EntryPatch,
        actor: UserId,
    ) -> Result<LedgerOutcome, LedgerError> {
        let outcome = self.engine.update_entry(id, patch, actor).await?;
        self.publish(Change::from_outcome(ChangeAction::Updated, &outcome));
        Ok(outcome)
    }

    /// See [`LedgerEngine::delete_entry`].
    pub async fn delete_entry(
        &self,
        id: TransactionId,
        actor: UserId,
    ) -> Result<LedgerOutcome, LedgerError> {
        let outcome = self.engine.delete_entry(id, actor).await?;
        self.publish(Change::from_outcome(ChangeAction::Deleted, &outcome));
        Ok(outcome)
    }

    /// See [`LedgerEngine::undelete_entry`].
    pub async fn undelete_entry(
        &self,
        id: TransactionId,
        actor: UserId,
    ) -> Result<LedgerOutcome, LedgerError> {
        let outcome = self.engine.undelete_entry(id, actor).await?;
        self.publish(Change::from_outcome(ChangeAction::Undeleted, &outcome));
        Ok(outcome)
    }

    fn publish(&self, changes: Vec<Change>) {
        for change in changes {
            self.notifier.notify(change);
        }
    }
}
