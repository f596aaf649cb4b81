//! Legitimacy checks run before every mutation.
//!
//! The guard runs inside the caller's unit of work so that what it checks and
//! what the engine writes come from the same snapshot.

use async_trait::async_trait;
use tally_shared::types::{AccountId, TransactionId, UserId};
use tracing::debug;

use super::error::StoreError;
use super::store::UnitOfWork;
use super::types::{Account, Transaction};

/// A would-be row the actor wants to write.
#[derive(Debug, Clone, Copy)]
pub enum Candidate<'a> {
    /// An account used as a transfer endpoint.
    Account(&'a Account),
    /// An entry about to be inserted or overwritten.
    Transaction(&'a Transaction),
}

/// A stored row the actor wants to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    /// An account by ID.
    Account(AccountId),
    /// An entry by ID.
    Transaction(TransactionId),
}

/// Authorization and ownership check.
#[async_trait]
pub trait LegitimacyGuard<U: UnitOfWork>: Send + Sync {
    /// Returns true if `actor` may write `candidate`.
    async fn verify(
        &self,
        uow: &mut U,
        candidate: Candidate<'_>,
        actor: UserId,
    ) -> Result<bool, StoreError>;

    /// Returns true if `actor` may act on the stored entity.
    ///
    /// A missing entity passes so the engine can report it as not found.
    async fn verify_by_id(
        &self,
        uow: &mut U,
        entity: EntityRef,
        actor: UserId,
    ) -> Result<bool, StoreError>;
}

/// Default guard: group membership plus same-group references.
///
/// An entry passes when the actor belongs to its group, its account exists,
/// is live and belongs to that group, and its category (if any) belongs to
/// that group too.
#[derive(Debug, Clone, Copy, Default)]
pub struct MembershipGuard;

#[async_trait]
impl<U: UnitOfWork> LegitimacyGuard<U> for MembershipGuard {
    async fn verify(
        &self,
        uow: &mut U,
        candidate: Candidate<'_>,
        actor: UserId,
    ) -> Result<bool, StoreError> {
        match candidate {
            Candidate::Account(account) => uow.is_group_member(account.group_id, actor).await,
            Candidate::Transaction(entry) => {
                if !uow.is_group_member(entry.group_id, actor).await? {
                    debug!(entry_id = %entry.id, user_id = %actor, "Actor is not a group member");
                    return Ok(false);
                }

                let account_ok = uow
                    .find_account(entry.account_id)
                    .await?
                    .is_some_and(|a| !a.is_deleted() && a.group_id == entry.group_id);
                if !account_ok {
                    debug!(entry_id = %entry.id, account_id = %entry.account_id, "Entry account rejected");
                    return Ok(false);
                }

                if let Some(category_id) = entry.category_id {
                    let category_ok = uow
                        .find_category(category_id)
                        .await?
                        .is_some_and(|c| c.group_id == entry.group_id);
                    if !category_ok {
                        debug!(entry_id = %entry.id, category_id = %category_id, "Entry category rejected");
                        return Ok(false);
                    }
                }

                Ok(true)
            }
        }
    }

    async fn verify_by_id(
        &self,
        uow: &mut U,
        entity: EntityRef,
        actor: UserId,
    ) -> Result<bool, StoreError> {
        let group_id = match entity {
            EntityRef::Account(id) => uow.find_account(id).await?.map(|a| a.group_id),
            EntityRef::Transaction(id) => uow.find_entry(id).await?.map(|e| e.group_id),
        };
        match group_id {
            Some(group_id) => uow.is_group_member(group_id, actor).await,
            None => Ok(true),
        }
    }
}
