//! Order types and validation

use crate::error::{PapertradeError, Result};
use crate::finance::Transaction;
use crate::types::{Cash, OrderId, Price, Shares, Ticker, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What an order does when it fills
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderKind {
    /// Open a long position
    Buy,
    /// Close a long position
    Sell,
    /// Open a short position
    SellShort,
    /// Close a short position
    BuyToCover,
    /// Cash movement; not orderable, rejected at construction
    Deposit,
    /// Cash movement; not orderable, rejected at construction
    Withdrawal,
}

/// Pricing type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PricingType {
    /// Market order - execute at the prevailing price
    Market,
    /// Limit order - execute at the requested price or better
    Limit,
}

/// An immutable trading order.
///
/// Orders are validated at construction and never change afterwards; all
/// execution state (queued, filled, cancelled) lives in the trading account,
/// not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    ticker: Ticker,
    kind: OrderKind,
    shares: Shares,
    price: Price,
    pricing: PricingType,
    issued_at: Timestamp,
    expires_at: Timestamp,
}

impl Order {
    /// Create a new validated order.
    ///
    /// Rejects cash kinds (deposits and withdrawals move money through the
    /// portfolio directly), negative quantities, an empty ticker, and an
    /// expiration that is not strictly after the issue time.
    pub fn new(
        ticker: impl Into<Ticker>,
        kind: OrderKind,
        shares: Shares,
        price: Price,
        pricing: PricingType,
        issued_at: Timestamp,
        expires_at: Timestamp,
    ) -> Result<Self> {
        let ticker = ticker.into();
        if ticker.is_empty() {
            return Err(PapertradeError::InvalidOrder(
                "ticker must not be empty".to_string(),
            ));
        }
        if matches!(kind, OrderKind::Deposit | OrderKind::Withdrawal) {
            return Err(PapertradeError::InvalidOrder(format!(
                "{kind:?} is a cash movement, not an order"
            )));
        }
        if !(shares >= 0.0) {
            return Err(PapertradeError::InvalidOrder(format!(
                "share count must be non-negative, got {shares}"
            )));
        }
        if !(price >= 0.0) {
            return Err(PapertradeError::InvalidOrder(format!(
                "price must be non-negative, got {price}"
            )));
        }
        if expires_at <= issued_at {
            return Err(PapertradeError::InvalidOrder(format!(
                "expiration {expires_at} must be after issue {issued_at}"
            )));
        }

        Ok(Self {
            id: OrderId::new_v4(),
            ticker,
            kind,
            shares,
            price,
            pricing,
            issued_at,
            expires_at,
        })
    }

    /// Create a new market order
    pub fn market(
        ticker: impl Into<Ticker>,
        kind: OrderKind,
        shares: Shares,
        price: Price,
        issued_at: Timestamp,
        expires_at: Timestamp,
    ) -> Result<Self> {
        Self::new(
            ticker,
            kind,
            shares,
            price,
            PricingType::Market,
            issued_at,
            expires_at,
        )
    }

    /// Create a new limit order
    pub fn limit(
        ticker: impl Into<Ticker>,
        kind: OrderKind,
        shares: Shares,
        price: Price,
        issued_at: Timestamp,
        expires_at: Timestamp,
    ) -> Result<Self> {
        Self::new(
            ticker,
            kind,
            shares,
            price,
            PricingType::Limit,
            issued_at,
            expires_at,
        )
    }

    /// Unique order identifier
    pub fn id(&self) -> OrderId {
        self.id
    }

    /// Ticker symbol to trade
    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    /// Order kind
    pub fn kind(&self) -> OrderKind {
        self.kind
    }

    /// Requested share quantity
    pub fn shares(&self) -> Shares {
        self.shares
    }

    /// Requested price per share
    pub fn price(&self) -> Price {
        self.price
    }

    /// Pricing type
    pub fn pricing(&self) -> PricingType {
        self.pricing
    }

    /// When the order was issued
    pub fn issued_at(&self) -> Timestamp {
        self.issued_at
    }

    /// When the order stops being fillable
    pub fn expires_at(&self) -> Timestamp {
        self.expires_at
    }

    /// Gross value at the requested price
    pub fn gross_value(&self) -> Cash {
        self.shares * self.price
    }

    /// Build the transaction this order settles into at the given date,
    /// fill price, and commission.
    pub(crate) fn to_transaction(
        &self,
        date: Timestamp,
        fill_price: Price,
        commission: Cash,
    ) -> Transaction {
        let ticker = self.ticker.clone();
        let shares = self.shares;
        match self.kind {
            OrderKind::Buy => Transaction::Buy {
                date,
                ticker,
                shares,
                price: fill_price,
                commission,
            },
            OrderKind::Sell => Transaction::Sell {
                date,
                ticker,
                shares,
                price: fill_price,
                commission,
            },
            OrderKind::SellShort => Transaction::SellShort {
                date,
                ticker,
                shares,
                price: fill_price,
                commission,
            },
            OrderKind::BuyToCover => Transaction::BuyToCover {
                date,
                ticker,
                shares,
                price: fill_price,
                commission,
            },
            // Order::new rejects cash kinds
            OrderKind::Deposit | OrderKind::Withdrawal => {
                unreachable!("cash kinds cannot be constructed as orders")
            }
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Order({:?}, {} {} @ {:.2}, {:?})",
            self.kind, self.shares, self.ticker, self.price, self.pricing
        )
    }
}
