//! Transaction - settled entries recorded by the ledger
//!
//! A Transaction is created when an order fills or when cash moves in or out
//! of the account. It records the actual settlement date, price, quantity,
//! and costs. Prices and amounts are always stored positive: the direction of
//! an entry is fixed by its variant tag, and every consumer matches on the
//! tag rather than on the sign of a field.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{Cash, Price, Shares, Ticker, Timestamp};

/// A settled ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Transaction {
    /// Cash paid into the account
    Deposit { date: Timestamp, amount: Cash },
    /// Cash taken out of the account
    Withdrawal { date: Timestamp, amount: Cash },
    /// Dividend paid out as cash
    DividendReceipt { date: Timestamp, amount: Cash },
    /// Dividend paid out as shares
    DividendReinvestment {
        date: Timestamp,
        ticker: Ticker,
        shares: Shares,
        price: Price,
        commission: Cash,
    },
    /// Open a long position
    Buy {
        date: Timestamp,
        ticker: Ticker,
        shares: Shares,
        price: Price,
        commission: Cash,
    },
    /// Close a long position
    Sell {
        date: Timestamp,
        ticker: Ticker,
        shares: Shares,
        price: Price,
        commission: Cash,
    },
    /// Open a short position
    SellShort {
        date: Timestamp,
        ticker: Ticker,
        shares: Shares,
        price: Price,
        commission: Cash,
    },
    /// Close a short position
    BuyToCover {
        date: Timestamp,
        ticker: Ticker,
        shares: Shares,
        price: Price,
        commission: Cash,
    },
}

impl Transaction {
    /// Settlement date of this entry
    pub fn date(&self) -> Timestamp {
        match self {
            Transaction::Deposit { date, .. }
            | Transaction::Withdrawal { date, .. }
            | Transaction::DividendReceipt { date, .. }
            | Transaction::DividendReinvestment { date, .. }
            | Transaction::Buy { date, .. }
            | Transaction::Sell { date, .. }
            | Transaction::SellShort { date, .. }
            | Transaction::BuyToCover { date, .. } => *date,
        }
    }

    /// Ticker symbol, for share variants
    pub fn ticker(&self) -> Option<&str> {
        match self {
            Transaction::DividendReinvestment { ticker, .. }
            | Transaction::Buy { ticker, .. }
            | Transaction::Sell { ticker, .. }
            | Transaction::SellShort { ticker, .. }
            | Transaction::BuyToCover { ticker, .. } => Some(ticker),
            Transaction::Deposit { .. }
            | Transaction::Withdrawal { .. }
            | Transaction::DividendReceipt { .. } => None,
        }
    }

    /// Number of shares traded, for share variants
    pub fn shares(&self) -> Option<Shares> {
        match self {
            Transaction::DividendReinvestment { shares, .. }
            | Transaction::Buy { shares, .. }
            | Transaction::Sell { shares, .. }
            | Transaction::SellShort { shares, .. }
            | Transaction::BuyToCover { shares, .. } => Some(*shares),
            Transaction::Deposit { .. }
            | Transaction::Withdrawal { .. }
            | Transaction::DividendReceipt { .. } => None,
        }
    }

    /// Price per share, for share variants
    pub fn price(&self) -> Option<Price> {
        match self {
            Transaction::DividendReinvestment { price, .. }
            | Transaction::Buy { price, .. }
            | Transaction::Sell { price, .. }
            | Transaction::SellShort { price, .. }
            | Transaction::BuyToCover { price, .. } => Some(*price),
            Transaction::Deposit { .. }
            | Transaction::Withdrawal { .. }
            | Transaction::DividendReceipt { .. } => None,
        }
    }

    /// Commission paid, for share variants
    pub fn commission(&self) -> Option<Cash> {
        match self {
            Transaction::DividendReinvestment { commission, .. }
            | Transaction::Buy { commission, .. }
            | Transaction::Sell { commission, .. }
            | Transaction::SellShort { commission, .. }
            | Transaction::BuyToCover { commission, .. } => Some(*commission),
            Transaction::Deposit { .. }
            | Transaction::Withdrawal { .. }
            | Transaction::DividendReceipt { .. } => None,
        }
    }

    /// Get gross transaction value (price * shares, or the cash amount)
    pub fn gross_value(&self) -> Cash {
        match self {
            Transaction::Deposit { amount, .. }
            | Transaction::Withdrawal { amount, .. }
            | Transaction::DividendReceipt { amount, .. } => *amount,
            Transaction::DividendReinvestment { shares, price, .. }
            | Transaction::Buy { shares, price, .. }
            | Transaction::Sell { shares, price, .. }
            | Transaction::SellShort { shares, price, .. }
            | Transaction::BuyToCover { shares, price, .. } => shares * price,
        }
    }

    /// Get total cost including commission
    pub fn total_cost(&self) -> Cash {
        self.gross_value() + self.commission().unwrap_or(0.0)
    }

    /// Get value net of commission
    pub fn net_proceeds(&self) -> Cash {
        self.gross_value() - self.commission().unwrap_or(0.0)
    }

    /// Check if this variant increases exposure (adds cash or opens shares)
    pub fn is_opening(&self) -> bool {
        matches!(
            self,
            Transaction::Deposit { .. }
                | Transaction::DividendReceipt { .. }
                | Transaction::DividendReinvestment { .. }
                | Transaction::Buy { .. }
                | Transaction::SellShort { .. }
        )
    }

    /// Check if this variant decreases exposure (removes cash or closes shares)
    pub fn is_closing(&self) -> bool {
        matches!(
            self,
            Transaction::Withdrawal { .. }
                | Transaction::Sell { .. }
                | Transaction::BuyToCover { .. }
        )
    }

    /// Check if this variant trades shares of a ticker
    pub fn is_share_transaction(&self) -> bool {
        self.ticker().is_some()
    }

    /// Structural sanity: non-negative quantities and a non-empty ticker
    /// where one is required. Sufficiency against a ledger is the ledger's
    /// job, not this method's.
    pub fn is_well_formed(&self) -> bool {
        match self {
            Transaction::Deposit { amount, .. }
            | Transaction::Withdrawal { amount, .. }
            | Transaction::DividendReceipt { amount, .. } => *amount >= 0.0,
            Transaction::DividendReinvestment {
                ticker,
                shares,
                price,
                commission,
                ..
            }
            | Transaction::Buy {
                ticker,
                shares,
                price,
                commission,
                ..
            }
            | Transaction::Sell {
                ticker,
                shares,
                price,
                commission,
                ..
            }
            | Transaction::SellShort {
                ticker,
                shares,
                price,
                commission,
                ..
            }
            | Transaction::BuyToCover {
                ticker,
                shares,
                price,
                commission,
                ..
            } => !ticker.is_empty() && *shares >= 0.0 && *price >= 0.0 && *commission >= 0.0,
        }
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transaction::Deposit { amount, .. } => write!(f, "DEPOSIT {:.2}", amount),
            Transaction::Withdrawal { amount, .. } => write!(f, "WITHDRAW {:.2}", amount),
            Transaction::DividendReceipt { amount, .. } => write!(f, "DIVIDEND {:.2}", amount),
            Transaction::DividendReinvestment {
                ticker,
                shares,
                price,
                ..
            } => write!(f, "REINVEST {} {} @ {:.2}", shares, ticker, price),
            Transaction::Buy {
                ticker,
                shares,
                price,
                ..
            } => write!(f, "BUY {} {} @ {:.2}", shares, ticker, price),
            Transaction::Sell {
                ticker,
                shares,
                price,
                ..
            } => write!(f, "SELL {} {} @ {:.2}", shares, ticker, price),
            Transaction::SellShort {
                ticker,
                shares,
                price,
                ..
            } => write!(f, "SHORT {} {} @ {:.2}", shares, ticker, price),
            Transaction::BuyToCover {
                ticker,
                shares,
                price,
                ..
            } => write!(f, "COVER {} {} @ {:.2}", shares, ticker, price),
        }
    }
}
