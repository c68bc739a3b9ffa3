//! Position - per-ticker share ledger

use serde::{Deserialize, Serialize};

use crate::error::{PapertradeError, Result};
use crate::finance::Transaction;
use crate::types::{Shares, Ticker, Timestamp};

/// The share ledger for a single ticker.
///
/// Owns every share transaction recorded against its ticker, in recorded
/// order. Holdings are recomputed from the record on every query. The
/// standing invariant: at any settlement date, cumulative closing shares
/// (date on-or-before) never exceed cumulative opening shares (date strictly
/// before).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    ticker: Ticker,
    transactions: Vec<Transaction>,
}

impl Position {
    /// Create a new, empty position for a ticker
    pub fn new(ticker: impl Into<Ticker>) -> Result<Self> {
        let ticker = ticker.into();
        if ticker.is_empty() {
            return Err(PapertradeError::InvalidTransaction(
                "position ticker must not be empty".to_string(),
            ));
        }
        Ok(Self {
            ticker,
            transactions: Vec::new(),
        })
    }

    /// Ticker this position tracks
    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    /// All recorded share transactions, in recorded order
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Shares held at a date: openings strictly before it minus closings
    /// on-or-before it.
    pub fn open_shares(&self, at: Timestamp) -> Shares {
        let opened: Shares = self
            .transactions
            .iter()
            .filter(|t| t.is_opening() && t.date() < at)
            .filter_map(|t| t.shares())
            .sum();
        let closed: Shares = self
            .transactions
            .iter()
            .filter(|t| t.is_closing() && t.date() <= at)
            .filter_map(|t| t.shares())
            .sum();
        opened - closed
    }

    /// Fewest shares held at any date at or after `from`.
    ///
    /// A closing transaction backdated before already-recorded activity must
    /// not oversell any later date, so sufficiency is checked against this
    /// low-water mark rather than the holding at its own date alone.
    fn min_open_shares_from(&self, from: Timestamp) -> Shares {
        let mut dates: Vec<Timestamp> = self
            .transactions
            .iter()
            .map(|t| t.date())
            .filter(|d| *d > from)
            .collect();
        dates.sort_unstable();
        dates.dedup();

        let mut low = self.open_shares(from);
        for date in dates {
            low = low.min(self.open_shares(date));
        }
        low
    }

    /// Validate a share transaction without recording it, reporting why it
    /// would be rejected.
    pub(crate) fn check(&self, transaction: &Transaction) -> Result<()> {
        if !transaction.is_well_formed() {
            return Err(PapertradeError::InvalidTransaction(format!(
                "malformed transaction {transaction}"
            )));
        }
        match transaction.ticker() {
            Some(ticker) if ticker == self.ticker => {}
            _ => {
                return Err(PapertradeError::InvalidTransaction(format!(
                    "cannot record {transaction} against position {}",
                    self.ticker
                )))
            }
        }
        if transaction.is_opening() {
            return Ok(());
        }
        // closing share variants always carry a share count
        let requested = transaction.shares().unwrap_or(0.0);
        let held = self.min_open_shares_from(transaction.date());
        if requested <= held {
            Ok(())
        } else {
            Err(PapertradeError::InsufficientShares {
                ticker: self.ticker.clone(),
                requested,
                held,
            })
        }
    }

    /// Check whether a share transaction could be recorded here without
    /// overselling. Read-only; never errors.
    pub fn transaction_is_valid(&self, transaction: &Transaction) -> bool {
        self.check(transaction).is_ok()
    }

    /// Record a share transaction.
    ///
    /// An invalid transaction is rejected in full, leaving the record
    /// untouched.
    pub fn add_transaction(&mut self, transaction: Transaction) -> Result<()> {
        self.check(&transaction)?;
        self.transactions.push(transaction);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn day(d: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    fn buy(d: u32, shares: Shares) -> Transaction {
        Transaction::Buy {
            date: day(d),
            ticker: "AAPL".into(),
            shares,
            price: 100.0,
            commission: 0.0,
        }
    }

    fn sell(d: u32, shares: Shares) -> Transaction {
        Transaction::Sell {
            date: day(d),
            ticker: "AAPL".into(),
            shares,
            price: 110.0,
            commission: 0.0,
        }
    }

    #[test]
    fn test_open_shares_boundaries() {
        let mut position = Position::new("AAPL").unwrap();
        position.add_transaction(buy(1, 10.0)).unwrap();

        // openings count strictly before the query date
        assert_eq!(position.open_shares(day(1)), 0.0);
        assert_eq!(position.open_shares(day(2)), 10.0);

        position.add_transaction(sell(3, 4.0)).unwrap();

        // closings count on-or-before the query date
        assert_eq!(position.open_shares(day(3)), 6.0);
        assert_eq!(position.open_shares(day(4)), 6.0);
    }

    #[test]
    fn test_cannot_close_more_than_held() {
        let mut position = Position::new("AAPL").unwrap();
        position.add_transaction(buy(1, 10.0)).unwrap();

        let result = position.add_transaction(sell(2, 11.0));
        assert!(matches!(
            result,
            Err(PapertradeError::InsufficientShares { .. })
        ));
        assert_eq!(position.transactions().len(), 1);
    }

    #[test]
    fn test_same_instant_close_does_not_see_open() {
        let mut position = Position::new("AAPL").unwrap();
        position.add_transaction(buy(1, 10.0)).unwrap();

        // opened at day 1 is not held until after day 1
        assert!(!position.transaction_is_valid(&sell(1, 1.0)));
        assert!(position.transaction_is_valid(&sell(2, 10.0)));
    }

    #[test]
    fn test_backdated_close_cannot_oversell_later_date() {
        let mut position = Position::new("AAPL").unwrap();
        position.add_transaction(buy(1, 10.0)).unwrap();
        position.add_transaction(sell(5, 8.0)).unwrap();

        // 5 shares fit on day 3 but would leave day 5 short by 3
        assert!(!position.transaction_is_valid(&sell(3, 5.0)));
        // 2 shares keep every later date covered
        position.add_transaction(sell(3, 2.0)).unwrap();
        assert_eq!(position.open_shares(day(6)), 0.0);
    }

    #[test]
    fn test_short_open_then_cover() {
        let mut position = Position::new("AAPL").unwrap();
        position
            .add_transaction(Transaction::SellShort {
                date: day(1),
                ticker: "AAPL".into(),
                shares: 5.0,
                price: 50.0,
                commission: 0.0,
            })
            .unwrap();

        // a short opens exposure like a buy does
        assert_eq!(position.open_shares(day(2)), 5.0);

        position
            .add_transaction(Transaction::BuyToCover {
                date: day(2),
                ticker: "AAPL".into(),
                shares: 5.0,
                price: 45.0,
                commission: 0.0,
            })
            .unwrap();
        assert_eq!(position.open_shares(day(3)), 0.0);
    }

    #[test]
    fn test_wrong_ticker_rejected() {
        let mut position = Position::new("AAPL").unwrap();
        let other = Transaction::Buy {
            date: day(1),
            ticker: "MSFT".into(),
            shares: 1.0,
            price: 1.0,
            commission: 0.0,
        };

        assert!(!position.transaction_is_valid(&other));
        assert!(matches!(
            position.add_transaction(other),
            Err(PapertradeError::InvalidTransaction(_))
        ));
    }

    #[test]
    fn test_cash_transaction_rejected() {
        let position = Position::new("AAPL").unwrap();
        let deposit = Transaction::Deposit {
            date: day(1),
            amount: 100.0,
        };
        assert!(!position.transaction_is_valid(&deposit));
    }

    #[test]
    fn test_dividend_reinvestment_opens_shares() {
        let mut position = Position::new("AAPL").unwrap();
        position
            .add_transaction(Transaction::DividendReinvestment {
                date: day(1),
                ticker: "AAPL".into(),
                shares: 2.5,
                price: 40.0,
                commission: 0.0,
            })
            .unwrap();

        assert_eq!(position.open_shares(day(2)), 2.5);
    }
}
