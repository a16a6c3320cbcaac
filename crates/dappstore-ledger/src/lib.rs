//! DappStore Ledger - Payout balance book for marketplace revenue
//!
//! The balance book is:
//! - Account-keyed by Principal
//! - Append-only (entries are never rewritten)
//! - Purchase-linked (every sale credit references its purchase id)
//! - Settled in all-or-nothing batches
//!
//! # Invariants
//!
//! 1. No negative balances
//! 2. Every entry has a reason
//! 3. A settlement either applies every leg or none of them
//!
//! The book holds no lock of its own. The marketplace keeps it inside the
//! same guarded state as listings and ownership so a purchase commits as a
//! single transition.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use dappstore_types::{Amount, Principal, StoreError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Errors that can occur in balance book operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Insufficient balance: have {available}, need {required}")]
    InsufficientBalance { available: u64, required: u64 },

    #[error("Invalid amount: {message}")]
    InvalidAmount { message: String },

    #[error("Balance overflow for account {account}")]
    BalanceOverflow { account: String },
}

pub type Result<T> = std::result::Result<T, LedgerError>;

impl From<LedgerError> for StoreError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InsufficientBalance { available, required } => {
                StoreError::InsufficientBalance { available, required }
            }
            LedgerError::InvalidAmount { message } => StoreError::InvalidAmount { message },
            LedgerError::BalanceOverflow { .. } => StoreError::AmountOverflow,
        }
    }
}

/// Unique identifier for a ledger entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(pub String);

impl EntryId {
    pub fn new() -> Self {
        Self(format!("entry_{}", Uuid::new_v4()))
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

/// Type of ledger entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryType {
    /// Credit (increase) to an account
    Credit,
    /// Debit (decrease) from an account
    Debit,
}

/// Reason for a ledger entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryReason {
    /// Developer's share of a sale
    DeveloperCut { listing_id: u64 },
    /// Platform treasury's share of a sale
    PlatformFee { listing_id: u64 },
    /// Payee withdrawal from its payout balance
    Withdrawal,
}

/// A single ledger entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub entry_id: EntryId,
    pub account: Principal,
    pub entry_type: EntryType,
    pub amount: Amount,
    pub balance_after: Amount,
    pub reason: EntryReason,
    pub correlation_id: String,
    pub created_at: DateTime<Utc>,
}

/// One credit of a settlement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayoutLeg {
    pub account: Principal,
    pub amount: Amount,
    pub reason: EntryReason,
}

impl PayoutLeg {
    pub fn new(account: Principal, amount: Amount, reason: EntryReason) -> Self {
        Self { account, amount, reason }
    }
}

/// Payout balances for developers and the platform treasury
#[derive(Debug, Clone, Default)]
pub struct BalanceBook {
    balances: HashMap<Principal, Amount>,
    /// All entries (append-only)
    entries: Vec<LedgerEntry>,
    /// correlation_id -> entry indices
    correlation_refs: HashMap<String, Vec<usize>>,
}

impl BalanceBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&self, account: &Principal) -> Amount {
        self.balances.get(account).copied().unwrap_or_default()
    }

    /// Credit an account (increase balance)
    ///
    /// Returns the new balance and the entry ID.
    pub fn credit(
        &mut self,
        account: &Principal,
        amount: Amount,
        reason: EntryReason,
        correlation_id: &str,
    ) -> Result<(Amount, EntryId)> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount {
                message: "Amount must be greater than zero".to_string(),
            });
        }

        let new_balance = self
            .balance(account)
            .checked_add(amount)
            .ok_or_else(|| LedgerError::BalanceOverflow {
                account: account.to_string(),
            })?;

        let entry_id = self.append(account, EntryType::Credit, amount, new_balance, reason, correlation_id);
        Ok((new_balance, entry_id))
    }

    /// Debit an account (decrease balance)
    ///
    /// Fails if the balance would go negative.
    pub fn debit(
        &mut self,
        account: &Principal,
        amount: Amount,
        reason: EntryReason,
        correlation_id: &str,
    ) -> Result<(Amount, EntryId)> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount {
                message: "Amount must be greater than zero".to_string(),
            });
        }

        let current = self.balance(account);
        let new_balance = current
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance {
                available: current.value(),
                required: amount.value(),
            })?;

        let entry_id = self.append(account, EntryType::Debit, amount, new_balance, reason, correlation_id);
        Ok((new_balance, entry_id))
    }

    /// Check that every non-zero leg can be credited without overflow
    ///
    /// Legs crediting the same account are accumulated, so a developer who is
    /// also the treasury is checked against the combined amount.
    pub fn check_settlement(&self, legs: &[PayoutLeg]) -> Result<()> {
        let mut projected: HashMap<&Principal, Amount> = HashMap::new();
        for leg in legs.iter().filter(|l| !l.amount.is_zero()) {
            let current = projected
                .get(&leg.account)
                .copied()
                .unwrap_or_else(|| self.balance(&leg.account));
            let next = current
                .checked_add(leg.amount)
                .ok_or_else(|| LedgerError::BalanceOverflow {
                    account: leg.account.to_string(),
                })?;
            projected.insert(&leg.account, next);
        }
        Ok(())
    }

    /// Apply every leg of a settlement or none of them
    ///
    /// Zero-value legs are skipped. Returns the IDs of the entries written.
    pub fn settle(&mut self, legs: &[PayoutLeg], correlation_id: &str) -> Result<Vec<EntryId>> {
        self.check_settlement(legs)?;

        let mut written = Vec::with_capacity(legs.len());
        for leg in legs.iter().filter(|l| !l.amount.is_zero()) {
            let (_, entry_id) = self.credit(&leg.account, leg.amount, leg.reason.clone(), correlation_id)?;
            written.push(entry_id);
        }

        debug!(correlation_id, legs = written.len(), "Settlement applied");
        Ok(written)
    }

    fn append(
        &mut self,
        account: &Principal,
        entry_type: EntryType,
        amount: Amount,
        balance_after: Amount,
        reason: EntryReason,
        correlation_id: &str,
    ) -> EntryId {
        let entry = LedgerEntry {
            entry_id: EntryId::new(),
            account: account.clone(),
            entry_type,
            amount,
            balance_after,
            reason,
            correlation_id: correlation_id.to_string(),
            created_at: Utc::now(),
        };
        let entry_id = entry.entry_id.clone();

        self.balances.insert(account.clone(), balance_after);
        self.correlation_refs
            .entry(correlation_id.to_string())
            .or_default()
            .push(self.entries.len());
        self.entries.push(entry);

        entry_id
    }

    /// Get all entries for an account
    pub fn account_entries(&self, account: &Principal) -> Vec<LedgerEntry> {
        self.entries
            .iter()
            .filter(|e| &e.account == account)
            .cloned()
            .collect()
    }

    /// Get entries written under a correlation id (e.g. a purchase)
    pub fn correlated_entries(&self, correlation_id: &str) -> Vec<LedgerEntry> {
        match self.correlation_refs.get(correlation_id) {
            Some(indices) => indices.iter().map(|&i| self.entries[i].clone()).collect(),
            None => vec![],
        }
    }

    /// Sum of all credits ever written
    pub fn total_credited(&self) -> Amount {
        Amount::new(
            self.entries
                .iter()
                .filter(|e| e.entry_type == EntryType::Credit)
                .map(|e| e.amount.value())
                .sum(),
        )
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Drop all balances and entries
    pub fn clear(&mut self) {
        self.balances.clear();
        self.entries.clear();
        self.correlation_refs.clear();
    }
}
