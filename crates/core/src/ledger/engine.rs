//! Ledger mutation engine.
//!
//! Every operation runs inside one unit of work: guard checks, reads and
//! writes all go through it, and any error rolls the whole thing back. Signs
//! are always re-derived from the direction before a row is written.

use chrono::Utc;
use rust_decimal::Decimal;
use tally_shared::types::{AccountId, CategoryId, TransactionId, UserId};
use tracing::{debug, error, info, warn};

use super::audit::check_link;
use super::error::LedgerError;
use super::guard::{Candidate, EntityRef, LegitimacyGuard};
use super::store::{LedgerStore, UnitOfWork, project_balance};
use super::types::{
    Account, AccountBalance, CreateEntryInput, CreateTransferInput, EntryPatch, LedgerOutcome,
    LinkCode, Transaction, TransferOutcome,
};
use super::validation::{validate_positive_amount, validate_transfer_rules};
use crate::currency::{RateResolver, convert_minor_units};
use crate::money::{Direction, TransactionType, correct_sign, direction_for_type};

/// Applies ledger mutations against a [`LedgerStore`].
///
/// Holds no ledger state of its own, so one engine can serve any number of
/// concurrent callers.
#[derive(Debug, Clone)]
pub struct LedgerEngine<S, G> {
    store: S,
    guard: G,
    resolver: RateResolver,
}

impl<S, G> LedgerEngine<S, G>
where
    S: LedgerStore,
    G: LegitimacyGuard<S::Unit>,
{
    /// Creates an engine with the default hub currencies.
    pub fn new(store: S, guard: G) -> Self {
        Self {
            store,
            guard,
            resolver: RateResolver::default(),
        }
    }

    /// Replaces the rate resolver.
    #[must_use]
    pub fn with_resolver(mut self, resolver: RateResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates a single EXPENSE or INCOME entry.
    ///
    /// # Errors
    ///
    /// `InvalidOperation` for transfers, non-positive amounts or a deleted
    /// account; `NotFound` for a missing account or category;
    /// `AccessDenied` when the guard rejects the entry.
    pub async fn create_entry(
        &self,
        input: CreateEntryInput,
        actor: UserId,
    ) -> Result<LedgerOutcome, LedgerError> {
        if input.transaction_type == TransactionType::Transfer {
            return Err(LedgerError::invalid(
                "transfers must be created as a linked pair",
            ));
        }
        validate_positive_amount(input.amount)?;

        let mut uow = self.store.begin().await?;
        let result = self.create_entry_in(&mut uow, input, actor).await;
        finish(uow, "create_entry", result).await
    }

    /// Creates a linked transfer pair between two accounts.
    ///
    /// # Errors
    ///
    /// `InvalidOperation` for same-account, cross-group or non-positive
    /// requests; `NotFound` for a missing account; `AccessDenied` when the
    /// guard rejects either account; `RateNotFound` when the currencies
    /// differ and no rate can be resolved.
    pub async fn create_transfer(
        &self,
        input: CreateTransferInput,
        actor: UserId,
    ) -> Result<TransferOutcome, LedgerError> {
        if input.from_account_id == input.to_account_id {
            return Err(LedgerError::invalid(
                "source and destination accounts must differ",
            ));
        }
        validate_positive_amount(input.amount)?;
        if input.exchange_rate.is_some_and(|rate| rate <= Decimal::ZERO) {
            return Err(LedgerError::invalid("exchange rate must be positive"));
        }

        let mut uow = self.store.begin().await?;
        let result = self.create_transfer_in(&mut uow, input, actor).await;
        finish(uow, "create_transfer", result).await
    }

    /// Applies a partial update to an entry and mirrors it onto its partner.
    ///
    /// # Errors
    ///
    /// `AccessDenied`, `NotFound`, `InvalidOperation` for broken transfer
    /// rules or a deleted entry; `Internal` if a linked entry has no partner.
    pub async fn update_entry(
        &self,
        id: TransactionId,
        patch: EntryPatch,
        actor: UserId,
    ) -> Result<LedgerOutcome, LedgerError> {
        let mut uow = self.store.begin().await?;
        let result = self.update_entry_in(&mut uow, id, patch, actor).await;
        finish(uow, "update_entry", result).await
    }

    /// Soft-deletes an entry and its transfer partner.
    ///
    /// # Errors
    ///
    /// `AccessDenied`, `NotFound`, `InvalidOperation` if already deleted.
    pub async fn delete_entry(
        &self,
        id: TransactionId,
        actor: UserId,
    ) -> Result<LedgerOutcome, LedgerError> {
        let mut uow = self.store.begin().await?;
        let result = self.delete_entry_in(&mut uow, id, actor).await;
        finish(uow, "delete_entry", result).await
    }

    /// Restores a soft-deleted entry and its transfer partner.
    ///
    /// # Errors
    ///
    /// `AccessDenied`, `NotFound`, `InvalidOperation` if the entry is not
    /// deleted or its account has since been deleted.
    pub async fn undelete_entry(
        &self,
        id: TransactionId,
        actor: UserId,
    ) -> Result<LedgerOutcome, LedgerError> {
        let mut uow = self.store.begin().await?;
        let result = self.undelete_entry_in(&mut uow, id, actor).await;
        finish(uow, "undelete_entry", result).await
    }

    async fn create_entry_in(
        &self,
        uow: &mut S::Unit,
        input: CreateEntryInput,
        actor: UserId,
    ) -> Result<LedgerOutcome, LedgerError> {
        let account = load_account(uow, input.account_id).await?;
        if account.is_deleted() {
            return Err(LedgerError::invalid("cannot book against a deleted account"));
        }
        if let Some(category_id) = input.category_id {
            ensure_live_category(uow, category_id).await?;
        }

        let direction = direction_for_type(input.transaction_type);
        let now = Utc::now();
        let entry = Transaction {
            id: TransactionId::new(),
            group_id: account.group_id,
            account_id: account.id,
            category_id: input.category_id,
            transaction_type: input.transaction_type,
            direction,
            amount: correct_sign(input.amount, direction),
            link_code: None,
            original_currency: None,
            original_amount: None,
            memo: input.memo,
            timestamp: input.timestamp,
            created_by: actor,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        self.ensure(uow, Candidate::Transaction(&entry), actor).await?;
        uow.insert_entry(&entry).await?;
        let balance = project_balance(uow, account).await?;

        info!(
            transaction_id = %entry.id,
            account_id = %entry.account_id,
            amount = entry.amount,
            "Transaction created"
        );

        Ok(LedgerOutcome {
            entry,
            partner: None,
            balances: vec![balance],
        })
    }

    async fn create_transfer_in(
        &self,
        uow: &mut S::Unit,
        input: CreateTransferInput,
        actor: UserId,
    ) -> Result<TransferOutcome, LedgerError> {
        let source = load_account(uow, input.from_account_id).await?;
        let destination = load_account(uow, input.to_account_id).await?;
        self.ensure(uow, Candidate::Account(&source), actor).await?;
        self.ensure(uow, Candidate::Account(&destination), actor).await?;

        if source.group_id != destination.group_id {
            return Err(LedgerError::invalid("cross-group transfers not permitted"));
        }
        if source.is_deleted() || destination.is_deleted() {
            return Err(LedgerError::invalid("cannot transfer with a deleted account"));
        }

        let cross_currency = source.currency != destination.currency;
        let converted = if cross_currency {
            let rate = match input.exchange_rate {
                Some(rate) => rate,
                None => {
                    let rates = uow.list_exchange_rates().await?;
                    self.resolver
                        .resolve(&source.currency, &destination.currency, &rates)?
                        .rate
                }
            };
            convert_minor_units(input.amount, rate).ok_or_else(|| {
                LedgerError::invalid(format!(
                    "converting {} {} at rate {rate} overflows",
                    input.amount, source.currency
                ))
            })?
        } else {
            input.amount
        };
        if converted == 0 {
            return Err(LedgerError::invalid("converted amount rounds to zero"));
        }

        let code = LinkCode::generate();
        let now = Utc::now();
        let outgoing = Transaction {
            id: TransactionId::new(),
            group_id: source.group_id,
            account_id: source.id,
            category_id: None,
            transaction_type: TransactionType::Transfer,
            direction: Direction::MoneyOut,
            amount: correct_sign(input.amount, Direction::MoneyOut),
            link_code: Some(code.clone()),
            original_currency: None,
            original_amount: None,
            memo: input.memo.clone(),
            timestamp: input.timestamp,
            created_by: actor,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let incoming = Transaction {
            id: TransactionId::new(),
            account_id: destination.id,
            direction: Direction::MoneyIn,
            amount: correct_sign(converted, Direction::MoneyIn),
            original_currency: cross_currency.then(|| source.currency.clone()),
            original_amount: cross_currency.then_some(input.amount),
            memo: input.memo,
            ..outgoing.clone()
        };

        uow.insert_entry(&outgoing).await?;
        uow.insert_entry(&incoming).await?;

        let balances = vec![
            project_balance(uow, source).await?,
            project_balance(uow, destination).await?,
        ];

        info!(
            link_code = %code,
            from_account_id = %outgoing.account_id,
            to_account_id = %incoming.account_id,
            amount = input.amount,
            converted,
            "Transfer created"
        );

        Ok(TransferOutcome {
            source: outgoing,
            destination: incoming,
            balances,
        })
    }

    async fn update_entry_in(
        &self,
        uow: &mut S::Unit,
        id: TransactionId,
        patch: EntryPatch,
        actor: UserId,
    ) -> Result<LedgerOutcome, LedgerError> {
        self.ensure_by_id(uow, EntityRef::Transaction(id), actor).await?;
        let existing = load_entry_for_update(uow, id).await?;
        if existing.is_deleted() {
            return Err(LedgerError::invalid("cannot update a deleted transaction"));
        }
        if patch.amount == Some(0) {
            return Err(LedgerError::invalid("amount must not be zero"));
        }

        let mut merged = existing.clone();
        if let Some(account_id) = patch.account_id {
            merged.account_id = account_id;
        }
        if let Some(category_id) = patch.category_id {
            merged.category_id = category_id;
        }
        if let Some(transaction_type) = patch.transaction_type {
            merged.transaction_type = transaction_type;
        }
        if let Some(memo) = patch.memo {
            merged.memo = memo;
        }
        if let Some(timestamp) = patch.timestamp {
            merged.timestamp = timestamp;
        }
        validate_transfer_rules(&existing, &merged)?;

        merged.direction = if merged.transaction_type == existing.transaction_type {
            patch.direction.unwrap_or(existing.direction)
        } else {
            direction_for_type(merged.transaction_type)
        };
        merged.amount = correct_sign(patch.amount.unwrap_or(existing.amount), merged.direction);
        merged.original_amount = existing
            .original_amount
            .map(|original| correct_sign(original, merged.direction));

        if merged.account_id != existing.account_id {
            let account = load_account(uow, merged.account_id).await?;
            if account.is_deleted() {
                return Err(LedgerError::invalid("cannot move to a deleted account"));
            }
            if account.group_id != existing.group_id {
                return Err(LedgerError::invalid("cross-group moves not permitted"));
            }
            if existing.is_linked() {
                let current = load_account(uow, existing.account_id).await?;
                if current.currency != account.currency {
                    return Err(LedgerError::invalid("transfer legs cannot change currency"));
                }
            }
        }
        if let Some(category_id) = merged.category_id.filter(|c| Some(*c) != existing.category_id) {
            ensure_live_category(uow, category_id).await?;
        }

        self.ensure(uow, Candidate::Transaction(&merged), actor).await?;

        let partner = match &existing.link_code {
            Some(code) => Some(load_partner(uow, &existing, code).await?),
            None => None,
        };
        if partner.as_ref().is_some_and(|p| p.account_id == merged.account_id) {
            return Err(LedgerError::invalid(
                "transfer legs must use different accounts",
            ));
        }

        // Mirroring copies the magnitude, so a recorded source-side amount
        // follows the source leg.
        let mirrors = partner.is_some()
            && (merged.amount != existing.amount || merged.direction != existing.direction);
        if mirrors {
            merged.original_amount = merged.original_amount.map(|_| merged.amount);
        }

        let now = Utc::now();
        merged.updated_at = now;
        uow.update_entry(&merged).await?;

        let mut touched = vec![existing.account_id, merged.account_id];
        let partner = match partner {
            Some(mut partner) => {
                let mut changed = false;
                if mirrors {
                    partner.direction = merged.direction.opposite();
                    partner.amount = correct_sign(merged.amount, partner.direction);
                    partner.original_amount = partner.original_amount.map(|_| partner.amount);
                    changed = true;
                }
                if merged.timestamp != existing.timestamp {
                    partner.timestamp = merged.timestamp;
                    changed = true;
                }
                if changed {
                    partner.updated_at = now;
                    uow.update_entry(&partner).await?;
                    touched.push(partner.account_id);
                    Some(partner)
                } else {
                    None
                }
            }
            None => None,
        };

        let balances = balances_for(uow, &touched).await?;

        info!(
            transaction_id = %merged.id,
            amount = merged.amount,
            partner_id = ?partner.as_ref().map(|p| p.id),
            "Transaction updated"
        );

        Ok(LedgerOutcome {
            entry: merged,
            partner,
            balances,
        })
    }

    async fn delete_entry_in(
        &self,
        uow: &mut S::Unit,
        id: TransactionId,
        actor: UserId,
    ) -> Result<LedgerOutcome, LedgerError> {
        self.ensure_by_id(uow, EntityRef::Transaction(id), actor).await?;
        let mut entry = load_entry_for_update(uow, id).await?;
        if entry.is_deleted() {
            return Err(LedgerError::invalid("transaction is already deleted"));
        }

        let now = Utc::now();
        entry.deleted_at = Some(now);
        entry.updated_at = now;
        uow.update_entry(&entry).await?;

        let mut touched = vec![entry.account_id];
        let partner = match entry.link_code.clone() {
            Some(code) => {
                let mut partner = load_partner(uow, &entry, &code).await?;
                if partner.is_deleted() {
                    warn!(transaction_id = %entry.id, partner_id = %partner.id, "Partner was already deleted");
                    None
                } else {
                    partner.deleted_at = Some(now);
                    partner.updated_at = now;
                    uow.update_entry(&partner).await?;
                    touched.push(partner.account_id);
                    Some(partner)
                }
            }
            None => None,
        };

        let balances = balances_for(uow, &touched).await?;

        info!(
            transaction_id = %entry.id,
            partner_id = ?partner.as_ref().map(|p| p.id),
            "Transaction deleted"
        );

        Ok(LedgerOutcome {
            entry,
            partner,
            balances,
        })
    }

    async fn undelete_entry_in(
        &self,
        uow: &mut S::Unit,
        id: TransactionId,
        actor: UserId,
    ) -> Result<LedgerOutcome, LedgerError> {
        self.ensure_by_id(uow, EntityRef::Transaction(id), actor).await?;
        let mut entry = load_entry_for_update(uow, id).await?;
        if !entry.is_deleted() {
            return Err(LedgerError::invalid("transaction is not deleted"));
        }
        ensure_restorable(uow, &entry).await?;

        let now = Utc::now();
        entry.deleted_at = None;
        entry.updated_at = now;
        self.ensure(uow, Candidate::Transaction(&entry), actor).await?;
        uow.update_entry(&entry).await?;

        let mut touched = vec![entry.account_id];
        let partner = match entry.link_code.clone() {
            Some(code) => {
                let mut partner = load_partner(uow, &entry, &code).await?;
                if partner.is_deleted() {
                    ensure_restorable(uow, &partner).await?;
                    partner.deleted_at = None;
                    partner.updated_at = now;
                    uow.update_entry(&partner).await?;
                    touched.push(partner.account_id);
                    Some(partner)
                } else {
                    None
                }
            }
            None => None,
        };

        let balances = balances_for(uow, &touched).await?;

        info!(
            transaction_id = %entry.id,
            partner_id = ?partner.as_ref().map(|p| p.id),
            "Transaction restored"
        );

        Ok(LedgerOutcome {
            entry,
            partner,
            balances,
        })
    }

    async fn ensure(
        &self,
        uow: &mut S::Unit,
        candidate: Candidate<'_>,
        actor: UserId,
    ) -> Result<(), LedgerError> {
        if self.guard.verify(uow, candidate, actor).await? {
            return Ok(());
        }
        let reason = match candidate {
            Candidate::Account(account) => format!("user {actor} may not use account {}", account.id),
            Candidate::Transaction(entry) => {
                format!("user {actor} may not write transaction {}", entry.id)
            }
        };
        Err(LedgerError::AccessDenied(reason))
    }

    async fn ensure_by_id(
        &self,
        uow: &mut S::Unit,
        entity: EntityRef,
        actor: UserId,
    ) -> Result<(), LedgerError> {
        if self.guard.verify_by_id(uow, entity, actor).await? {
            return Ok(());
        }
        let reason = match entity {
            EntityRef::Account(id) => format!("user {actor} may not access account {id}"),
            EntityRef::Transaction(id) => format!("user {actor} may not access transaction {id}"),
        };
        Err(LedgerError::AccessDenied(reason))
    }
}

/// Commits on success, rolls back on failure, and logs what went wrong.
async fn finish<U: UnitOfWork, T>(
    uow: U,
    operation: &'static str,
    result: Result<T, LedgerError>,
) -> Result<T, LedgerError> {
    match result {
        Ok(value) => match uow.commit().await {
            Ok(()) => Ok(value),
            Err(err) => Err(report(operation, err.into())),
        },
        Err(err) => {
            if let Err(rollback_err) = uow.rollback().await {
                warn!(operation, error = %rollback_err, "Rollback failed");
            }
            Err(report(operation, err))
        }
    }
}

fn report(operation: &'static str, err: LedgerError) -> LedgerError {
    if err.is_recoverable() {
        debug!(operation, error = %err, "Ledger operation rejected");
    } else {
        error!(operation, error = %err, code = err.error_code(), "Ledger operation failed");
    }
    err
}

async fn load_account<U: UnitOfWork>(uow: &mut U, id: AccountId) -> Result<Account, LedgerError> {
    uow.find_account(id)
        .await?
        .ok_or_else(|| LedgerError::not_found("account", id))
}

async fn load_entry_for_update<U: UnitOfWork>(
    uow: &mut U,
    id: TransactionId,
) -> Result<Transaction, LedgerError> {
    uow.find_entry_for_update(id)
        .await?
        .ok_or_else(|| LedgerError::not_found("transaction", id))
}

async fn ensure_live_category<U: UnitOfWork>(
    uow: &mut U,
    id: CategoryId,
) -> Result<(), LedgerError> {
    let category = uow
        .find_category(id)
        .await?
        .ok_or_else(|| LedgerError::not_found("category", id))?;
    if category.deleted_at.is_some() {
        return Err(LedgerError::invalid("category is deleted"));
    }
    Ok(())
}

/// An entry can only be restored onto a live account.
async fn ensure_restorable<U: UnitOfWork>(
    uow: &mut U,
    entry: &Transaction,
) -> Result<(), LedgerError> {
    let account = uow.find_account(entry.account_id).await?.ok_or_else(|| {
        LedgerError::Internal(format!(
            "transaction {} references missing account {}",
            entry.id, entry.account_id
        ))
    })?;
    if account.is_deleted() {
        return Err(LedgerError::invalid(format!(
            "account {} is deleted; restore it first",
            account.id
        )));
    }
    Ok(())
}

/// Loads the other leg of `entry`'s pair, locked for update.
async fn load_partner<U: UnitOfWork>(
    uow: &mut U,
    entry: &Transaction,
    code: &LinkCode,
) -> Result<Transaction, LedgerError> {
    let legs = uow.find_entries_by_link(code).await?;
    if legs.len() != 2 {
        let refs: Vec<&Transaction> = legs.iter().collect();
        let detail = check_link(code, &refs)
            .first()
            .map_or_else(|| "no legs found".to_string(), ToString::to_string);
        return Err(LedgerError::Internal(format!(
            "transaction {} has a broken transfer pair: {detail}",
            entry.id
        )));
    }
    legs.into_iter().find(|leg| leg.id != entry.id).ok_or_else(|| {
        LedgerError::Internal(format!(
            "transaction {} shares link {code} only with itself",
            entry.id
        ))
    })
}

/// Projects balances for each distinct account in `ids`, keeping order.
async fn balances_for<U: UnitOfWork>(
    uow: &mut U,
    ids: &[AccountId],
) -> Result<Vec<AccountBalance>, LedgerError> {
    let mut seen = Vec::with_capacity(ids.len());
    let mut balances = Vec::with_capacity(ids.len());
    for &id in ids {
        if seen.contains(&id) {
            continue;
        }
        seen.push(id);
        let account = uow.find_account(id).await?.ok_or_else(|| {
            LedgerError::Internal(format!("account {id} vanished inside the unit of work"))
        })?;
        balances.push(project_balance(uow, account).await?);
    }
    Ok(balances)
}
