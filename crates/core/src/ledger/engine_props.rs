//! Property-based tests for the ledger engine.
//!
//! Random operation sequences run against the in-memory store; after every
//! step the committed ledger must audit clean and every reported balance
//! must equal a fresh projection.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use tally_shared::types::{AccountId, CurrencyCode, GroupId, TransactionId, UserId};

use super::*;
use crate::money::TransactionType;

#[derive(Debug, Clone)]
enum Op {
    Entry {
        account: usize,
        income: bool,
        amount: i64,
    },
    Transfer {
        from: usize,
        to: usize,
        amount: i64,
    },
    Update {
        target: usize,
        amount: i64,
    },
    Retype {
        target: usize,
    },
    Delete {
        target: usize,
    },
    Undelete {
        target: usize,
    },
}

const ACCOUNTS: usize = 3;

fn amount() -> impl Strategy<Value = i64> {
    1i64..1_000_000i64
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..ACCOUNTS, any::<bool>(), amount())
            .prop_map(|(account, income, amount)| Op::Entry { account, income, amount }),
        (0..ACCOUNTS, 0..ACCOUNTS, amount())
            .prop_map(|(from, to, amount)| Op::Transfer { from, to, amount }),
        (any::<usize>(), amount()).prop_map(|(target, amount)| Op::Update { target, amount }),
        any::<usize>().prop_map(|target| Op::Retype { target }),
        any::<usize>().prop_map(|target| Op::Delete { target }),
        any::<usize>().prop_map(|target| Op::Undelete { target }),
    ]
}

struct World {
    engine: LedgerEngine<InMemoryLedgerStore, MembershipGuard>,
    store: InMemoryLedgerStore,
    user: UserId,
    accounts: Vec<Account>,
    created: Vec<TransactionId>,
}

async fn world() -> World {
    let store = InMemoryLedgerStore::new();
    let user = UserId::new();
    let group = GroupId::new();
    store.add_member(group, user).await;

    let mut accounts = Vec::new();
    for i in 0..ACCOUNTS {
        let account = Account {
            id: AccountId::new(),
            group_id: group,
            currency: CurrencyCode::new("USD").unwrap(),
            name: format!("account {i}"),
            starting_balance: i64::try_from(i).unwrap() * 1_000,
            deleted_at: None,
        };
        store.put_account(account.clone()).await;
        accounts.push(account);
    }

    World {
        engine: LedgerEngine::new(store.clone(), MembershipGuard),
        store,
        user,
        accounts,
        created: Vec::new(),
    }
}

impl World {
    fn pick(&self, target: usize) -> Option<TransactionId> {
        if self.created.is_empty() {
            None
        } else {
            Some(self.created[target % self.created.len()])
        }
    }

    /// Applies `op`; returns the balances the engine reported, if any.
    async fn apply(&mut self, op: &Op) -> Option<Vec<AccountBalance>> {
        let when = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();
        match *op {
            Op::Entry { account, income, amount } => {
                let input = CreateEntryInput {
                    account_id: self.accounts[account].id,
                    category_id: None,
                    transaction_type: if income {
                        TransactionType::Income
                    } else {
                        TransactionType::Expense
                    },
                    amount,
                    memo: None,
                    timestamp: when,
                };
                let outcome = self.engine.create_entry(input, self.user).await.ok()?;
                self.created.push(outcome.entry.id);
                Some(outcome.balances)
            }
            Op::Transfer { from, to, amount } => {
                let input = CreateTransferInput {
                    from_account_id: self.accounts[from].id,
                    to_account_id: self.accounts[to].id,
                    amount,
                    exchange_rate: None,
                    memo: None,
                    timestamp: when,
                };
                let outcome = self.engine.create_transfer(input, self.user).await.ok()?;
                self.created.push(outcome.source.id);
                self.created.push(outcome.destination.id);
                Some(outcome.balances)
            }
            Op::Update { target, amount } => {
                let id = self.pick(target)?;
                let patch = EntryPatch {
                    amount: Some(amount),
                    ..EntryPatch::default()
                };
                self.engine.update_entry(id, patch, self.user).await.ok().map(|o| o.balances)
            }
            Op::Retype { target } => {
                let id = self.pick(target)?;
                let patch = EntryPatch {
                    transaction_type: Some(TransactionType::Income),
                    ..EntryPatch::default()
                };
                self.engine.update_entry(id, patch, self.user).await.ok().map(|o| o.balances)
            }
            Op::Delete { target } => {
                let id = self.pick(target)?;
                self.engine.delete_entry(id, self.user).await.ok().map(|o| o.balances)
            }
            Op::Undelete { target } => {
                let id = self.pick(target)?;
                self.engine.undelete_entry(id, self.user).await.ok().map(|o| o.balances)
            }
        }
    }
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(future)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Every committed state audits clean and reported balances are projections.
    #[test]
    fn prop_invariants_hold_after_every_step(ops in prop::collection::vec(op_strategy(), 1..40)) {
        block_on(async {
            let mut world = world().await;
            for op in &ops {
                let reported = world.apply(op).await;
                let entries = world.store.entries().await;

                let report = audit_ledger(&world.accounts, &entries);
                prop_assert!(report.is_clean(), "after {:?}: {:?}", op, report.findings);

                for balance in reported.unwrap_or_default() {
                    prop_assert_eq!(balance.balance, balance_of(&balance.account, &entries));
                }

                // Same-currency pairs always carry equal magnitudes.
                for entry in entries.iter().filter(|e| e.is_linked()) {
                    let partner = entries
                        .iter()
                        .find(|p| p.id != entry.id && p.link_code == entry.link_code)
                        .unwrap();
                    prop_assert_eq!(entry.amount, -partner.amount);
                }
            }
            Ok(())
        })?;
    }

    /// Deleting then restoring an entry restores its row and every balance.
    #[test]
    fn prop_delete_undelete_round_trip(
        ops in prop::collection::vec(op_strategy(), 1..20),
        target in any::<usize>(),
    ) {
        block_on(async {
            let mut world = world().await;
            for op in &ops {
                world.apply(op).await;
            }
            let Some(id) = world.pick(target) else {
                return Ok(());
            };
            let before = world.store.entry(id).await.unwrap();
            if before.is_deleted() {
                return Ok(());
            }
            let entries_before = world.store.entries().await;
            let balances_before: Vec<i128> = world
                .accounts
                .iter()
                .map(|a| balance_of(a, &entries_before))
                .collect();

            world.engine.delete_entry(id, world.user).await.unwrap();
            world.engine.undelete_entry(id, world.user).await.unwrap();

            let after = world.store.entry(id).await.unwrap();
            prop_assert_eq!(after.amount, before.amount);
            prop_assert_eq!(after.direction, before.direction);
            prop_assert_eq!(after.account_id, before.account_id);
            prop_assert!(!after.is_deleted());

            let entries_after = world.store.entries().await;
            let balances_after: Vec<i128> = world
                .accounts
                .iter()
                .map(|a| balance_of(a, &entries_after))
                .collect();
            prop_assert_eq!(balances_after, balances_before);
            Ok(())
        })?;
    }
}
