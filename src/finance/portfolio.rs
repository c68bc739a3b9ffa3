//! Portfolio - the ledger of record for one trading account
//!
//! A portfolio owns a cash account and one position per traded ticker. Every
//! recorded transaction is routed to the sub-ledgers it affects: share trades
//! settle into a position and move their cash leg through the cash account,
//! cash entries go to the cash account alone. Validation runs against the
//! whole route before anything is written, so a rejected transaction leaves
//! no trace.

use std::sync::Arc;

use hashbrown::hash_map::Entry;
use hashbrown::HashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{PapertradeError, Result};
use crate::finance::{calculate_holdings, CashAccount, Holding, Position, Transaction};
use crate::types::{Cash, Ticker, Timestamp};

/// A portfolio behind a lock, shared across concurrent fill tasks
pub type SharedPortfolio = Arc<Mutex<Portfolio>>;

/// Cash account plus per-ticker positions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portfolio {
    cash: CashAccount,
    positions: HashMap<Ticker, Position>,
}

impl Portfolio {
    /// Create an empty portfolio with no cash and no positions
    pub fn new() -> Self {
        Self {
            cash: CashAccount::new(),
            positions: HashMap::new(),
        }
    }

    /// Wrap this portfolio for shared use by a trading account
    pub fn into_shared(self) -> SharedPortfolio {
        Arc::new(Mutex::new(self))
    }

    /// Cash balance as of a date
    pub fn available_cash(&self, date: Timestamp) -> Cash {
        self.cash.balance(date)
    }

    /// Look up the position for a ticker. Never creates one.
    pub fn position(&self, ticker: &str) -> Option<&Position> {
        self.positions.get(ticker)
    }

    /// Tickers with a recorded position, sorted
    pub fn tickers(&self) -> Vec<&str> {
        let mut tickers: Vec<&str> = self.positions.keys().map(String::as_str).collect();
        tickers.sort_unstable();
        tickers
    }

    /// Record a cash deposit
    pub fn deposit(&mut self, date: Timestamp, amount: Cash) -> Result<()> {
        self.add_transaction(Transaction::Deposit { date, amount })
    }

    /// Record a cash withdrawal
    pub fn withdraw(&mut self, date: Timestamp, amount: Cash) -> Result<()> {
        self.add_transaction(Transaction::Withdrawal { date, amount })
    }

    /// Validate a transaction against every ledger its route touches,
    /// reporting why it would be rejected. Nothing is written.
    pub(crate) fn check(&self, transaction: &Transaction) -> Result<()> {
        if !transaction.is_well_formed() {
            return Err(PapertradeError::InvalidTransaction(format!(
                "malformed transaction {transaction}"
            )));
        }
        match transaction {
            Transaction::Deposit { .. }
            | Transaction::Withdrawal { .. }
            | Transaction::DividendReceipt { .. } => self.cash.check(transaction),
            Transaction::DividendReinvestment { .. } => self.check_position_leg(transaction),
            Transaction::Buy { date, .. } | Transaction::SellShort { date, .. } => {
                self.cash.check(&Transaction::Withdrawal {
                    date: *date,
                    amount: transaction.total_cost(),
                })?;
                self.check_position_leg(transaction)
            }
            Transaction::Sell { date, .. } | Transaction::BuyToCover { date, .. } => {
                self.check_position_leg(transaction)?;
                let net = transaction.net_proceeds();
                if net < 0.0 {
                    // commission exceeds proceeds, so the cash leg is a debit
                    self.cash.check(&Transaction::Withdrawal {
                        date: *date,
                        amount: -net,
                    })?;
                }
                Ok(())
            }
        }
    }

    /// Whether a transaction would be accepted. Never writes.
    pub fn transaction_is_valid(&self, transaction: &Transaction) -> bool {
        self.check(transaction).is_ok()
    }

    /// Record a transaction, routing it to the cash account and positions.
    ///
    /// Either every leg is recorded or none is: validation covers the whole
    /// route before the first write.
    pub fn add_transaction(&mut self, transaction: Transaction) -> Result<()> {
        self.check(&transaction)?;

        let date = transaction.date();
        match transaction {
            t @ (Transaction::Deposit { .. }
            | Transaction::Withdrawal { .. }
            | Transaction::DividendReceipt { .. }) => self.cash.add_transaction(t),
            t @ Transaction::DividendReinvestment { .. } => self.append_to_position(t),
            t @ (Transaction::Buy { .. } | Transaction::SellShort { .. }) => {
                let cost = t.total_cost();
                self.cash.withdraw(date, cost)?;
                self.append_to_position(t)
            }
            t @ (Transaction::Sell { .. } | Transaction::BuyToCover { .. }) => {
                let net = t.net_proceeds();
                self.append_to_position(t)?;
                if net >= 0.0 {
                    self.cash.deposit(date, net)
                } else {
                    self.cash.withdraw(date, -net)
                }
            }
        }
    }

    /// Every recorded transaction, cash legs included, ordered by settlement
    /// date. Rebuilt on each call; repeated reads of an unchanged portfolio
    /// return identical histories.
    pub fn transactions(&self) -> Vec<Transaction> {
        let mut merged: Vec<Transaction> = self.cash.transactions().to_vec();
        let mut tickers: Vec<&Ticker> = self.positions.keys().collect();
        tickers.sort_unstable();
        for ticker in tickers {
            if let Some(position) = self.positions.get(ticker) {
                merged.extend_from_slice(position.transactions());
            }
        }
        // stable by date, so same-date entries keep their ledger order
        merged.sort_by_key(Transaction::date);
        merged
    }

    /// Match this portfolio's history into holdings as of `cutoff`
    pub fn holdings(&self, cutoff: Timestamp) -> Vec<Holding> {
        calculate_holdings(&self.transactions(), cutoff)
    }

    fn check_position_leg(&self, transaction: &Transaction) -> Result<()> {
        let ticker = match transaction.ticker() {
            Some(ticker) => ticker,
            None => {
                return Err(PapertradeError::InvalidTransaction(format!(
                    "{transaction} does not trade shares"
                )))
            }
        };
        match self.positions.get(ticker) {
            Some(position) => position.check(transaction),
            // probe against the empty position this transaction would create
            None => Position::new(ticker)?.check(transaction),
        }
    }

    fn append_to_position(&mut self, transaction: Transaction) -> Result<()> {
        let ticker = match transaction.ticker() {
            Some(ticker) => ticker.to_string(),
            None => {
                return Err(PapertradeError::InvalidTransaction(format!(
                    "{transaction} does not trade shares"
                )))
            }
        };
        let position = match self.positions.entry(ticker) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let position = Position::new(entry.key().clone())?;
                entry.insert(position)
            }
        };
        position.add_transaction(transaction)
    }
}

impl Default for Portfolio {
    fn default() -> Self {
        Self::new()
    }
}
