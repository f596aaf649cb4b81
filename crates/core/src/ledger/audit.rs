//! Offline ledger audit.
//!
//! Scans accounts and entries for rows the engine would never produce. A
//! clean report means every entry agrees with its direction and every
//! transfer is a well-formed pair.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tally_shared::types::{AccountId, TransactionId};

use super::balance::balances_by_account;
use super::types::{Account, LinkCode, Transaction};
use crate::money::TransactionType;

/// One violated invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditFinding {
    /// Amount sign disagrees with the direction.
    SignMismatch {
        /// Offending entry.
        entry_id: TransactionId,
    },
    /// Amount is zero.
    ZeroAmount {
        /// Offending entry.
        entry_id: TransactionId,
    },
    /// A transfer leg carries a category.
    CategorisedTransfer {
        /// Offending entry.
        entry_id: TransactionId,
    },
    /// Entry points at an account that is not in the audited set.
    UnknownAccount {
        /// Offending entry.
        entry_id: TransactionId,
        /// Missing account.
        account_id: AccountId,
    },
    /// A link code is held by a single entry.
    OrphanLeg {
        /// Shared code.
        link_code: LinkCode,
        /// The lone entry.
        entry_id: TransactionId,
    },
    /// A link code is held by more than two entries.
    OverpopulatedLink {
        /// Shared code.
        link_code: LinkCode,
        /// Every entry holding it.
        entry_ids: Vec<TransactionId>,
    },
    /// Both legs of a pair move money the same way.
    SameDirectionPair {
        /// Shared code.
        link_code: LinkCode,
    },
    /// One leg of a pair is deleted and the other is not.
    DeleteStateMismatch {
        /// Shared code.
        link_code: LinkCode,
    },
}

impl std::fmt::Display for AuditFinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SignMismatch { entry_id } => write!(f, "entry {entry_id}: amount sign disagrees with direction"),
            Self::ZeroAmount { entry_id } => write!(f, "entry {entry_id}: zero amount"),
            Self::CategorisedTransfer { entry_id } => write!(f, "entry {entry_id}: transfer leg has a category"),
            Self::UnknownAccount { entry_id, account_id } => {
                write!(f, "entry {entry_id}: unknown account {account_id}")
            }
            Self::OrphanLeg { link_code, entry_id } => {
                write!(f, "link {link_code}: entry {entry_id} has no partner")
            }
            Self::OverpopulatedLink { link_code, entry_ids } => {
                write!(f, "link {link_code}: shared by {} entries", entry_ids.len())
            }
            Self::SameDirectionPair { link_code } => write!(f, "link {link_code}: legs share a direction"),
            Self::DeleteStateMismatch { link_code } => write!(f, "link {link_code}: legs differ in delete state"),
        }
    }
}

/// Result of [`audit_ledger`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditReport {
    /// Number of entries scanned.
    pub entries_checked: usize,
    /// Number of transfer pairs scanned.
    pub links_checked: usize,
    /// Projected balance per audited account.
    pub balances: HashMap<AccountId, i128>,
    /// Every violation found, in a stable order.
    pub findings: Vec<AuditFinding>,
}

impl AuditReport {
    /// Returns true if no invariant is violated.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Audits a set of accounts and the entries booked against them.
#[must_use]
pub fn audit_ledger(accounts: &[Account], entries: &[Transaction]) -> AuditReport {
    let mut findings = Vec::new();
    let known: HashMap<AccountId, &Account> = accounts.iter().map(|a| (a.id, a)).collect();
    let mut links: BTreeMap<&LinkCode, Vec<&Transaction>> = BTreeMap::new();

    for entry in entries {
        findings.extend(check_entry(entry));
        if !known.contains_key(&entry.account_id) {
            findings.push(AuditFinding::UnknownAccount {
                entry_id: entry.id,
                account_id: entry.account_id,
            });
        }
        if let Some(code) = &entry.link_code {
            links.entry(code).or_default().push(entry);
        }
    }

    for (code, legs) in &links {
        findings.extend(check_link(code, legs));
    }

    AuditReport {
        entries_checked: entries.len(),
        links_checked: links.len(),
        balances: balances_by_account(accounts, entries),
        findings,
    }
}

/// Row-level checks on a single entry.
#[must_use]
pub fn check_entry(entry: &Transaction) -> Vec<AuditFinding> {
    let mut findings = Vec::new();
    if entry.amount == 0 {
        findings.push(AuditFinding::ZeroAmount { entry_id: entry.id });
    } else if !entry.direction.agrees_with(entry.amount) {
        findings.push(AuditFinding::SignMismatch { entry_id: entry.id });
    }
    if entry.transaction_type == TransactionType::Transfer && entry.category_id.is_some() {
        findings.push(AuditFinding::CategorisedTransfer { entry_id: entry.id });
    }
    findings
}

/// Pair-level checks on every entry sharing `code`.
#[must_use]
pub fn check_link(code: &LinkCode, legs: &[&Transaction]) -> Vec<AuditFinding> {
    match legs {
        [] => Vec::new(),
        [only] => vec![AuditFinding::OrphanLeg {
            link_code: code.clone(),
            entry_id: only.id,
        }],
        [a, b] => {
            let mut findings = Vec::new();
            if a.direction == b.direction {
                findings.push(AuditFinding::SameDirectionPair {
                    link_code: code.clone(),
                });
            }
            if a.is_deleted() != b.is_deleted() {
                findings.push(AuditFinding::DeleteStateMismatch {
                    link_code: code.clone(),
                });
            }
            findings
        }
        _ => vec![AuditFinding::OverpopulatedLink {
            link_code: code.clone(),
            entry_ids: legs.iter().map(|e| e.id).collect(),
        }],
    }
}
