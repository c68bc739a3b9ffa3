//! Cash account - the money side of the ledger

use serde::{Deserialize, Serialize};

use crate::error::{PapertradeError, Result};
use crate::finance::Transaction;
use crate::types::{Cash, Timestamp};

/// An append-only cash ledger.
///
/// Records deposits, withdrawals, and cash dividends, including the cash
/// legs of share trades. Balances are recomputed from the record on every
/// query; nothing is cached and recorded entries never change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashAccount {
    transactions: Vec<Transaction>,
}

impl CashAccount {
    /// Create a new, empty cash account
    pub fn new() -> Self {
        Self {
            transactions: Vec::new(),
        }
    }

    /// Cash balance at a date: everything settled on or before it
    pub fn balance(&self, date: Timestamp) -> Cash {
        self.transactions
            .iter()
            .filter(|t| t.date() <= date)
            .map(signed_amount)
            .sum()
    }

    /// Lowest running balance reachable at or after `from`.
    ///
    /// A withdrawal backdated before already-recorded activity must not
    /// drive the balance negative at any later date, so sufficiency is
    /// checked against this low-water mark rather than the balance at the
    /// withdrawal date alone.
    fn min_balance_from(&self, from: Timestamp) -> Cash {
        let mut dates: Vec<Timestamp> = self
            .transactions
            .iter()
            .map(|t| t.date())
            .filter(|d| *d > from)
            .collect();
        dates.sort_unstable();
        dates.dedup();

        let mut low = self.balance(from);
        for date in dates {
            low = low.min(self.balance(date));
        }
        low
    }

    /// Validate a cash transaction without recording it, reporting why it
    /// would be rejected.
    pub(crate) fn check(&self, transaction: &Transaction) -> Result<()> {
        if !transaction.is_well_formed() {
            return Err(PapertradeError::InvalidTransaction(format!(
                "malformed transaction {transaction}"
            )));
        }
        match transaction {
            Transaction::Deposit { .. } | Transaction::DividendReceipt { .. } => Ok(()),
            Transaction::Withdrawal { date, amount } => {
                let available = self.min_balance_from(*date);
                if *amount <= available {
                    Ok(())
                } else {
                    Err(PapertradeError::InsufficientFunds {
                        required: *amount,
                        available,
                    })
                }
            }
            // share variants belong to a Position, not here
            other => Err(PapertradeError::InvalidTransaction(format!(
                "cannot record {other} in a cash account"
            ))),
        }
    }

    /// Check whether a cash transaction could be recorded without breaking
    /// the running-balance invariant. Read-only; never errors.
    pub fn transaction_is_valid(&self, transaction: &Transaction) -> bool {
        self.check(transaction).is_ok()
    }

    /// Record a cash transaction.
    ///
    /// An invalid transaction is rejected in full, leaving the record
    /// untouched.
    pub fn add_transaction(&mut self, transaction: Transaction) -> Result<()> {
        self.check(&transaction)?;
        self.transactions.push(transaction);
        Ok(())
    }

    /// Record a deposit
    pub fn deposit(&mut self, date: Timestamp, amount: Cash) -> Result<()> {
        self.add_transaction(Transaction::Deposit { date, amount })
    }

    /// Record a withdrawal
    pub fn withdraw(&mut self, date: Timestamp, amount: Cash) -> Result<()> {
        self.add_transaction(Transaction::Withdrawal { date, amount })
    }

    /// All recorded cash transactions, in recorded order
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }
}

impl Default for CashAccount {
    fn default() -> Self {
        Self::new()
    }
}

fn signed_amount(transaction: &Transaction) -> Cash {
    match transaction {
        Transaction::Deposit { amount, .. } | Transaction::DividendReceipt { amount, .. } => {
            *amount
        }
        Transaction::Withdrawal { amount, .. } => -amount,
        // only cash variants are ever recorded
        _ => 0.0,
    }
}
