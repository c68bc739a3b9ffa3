//! # Papertrade
//!
//! A simulated order-execution engine over a cash-and-shares ledger.
//!
//! Orders submitted to a [`engine::TradingAccount`] are queued, filled
//! asynchronously with configurable delay and slippage, and settled into a
//! [`finance::Portfolio`]: a cash account plus one position per ticker, with
//! every write validated so balances and share counts never go negative.
//! Finished histories can be matched into round-trip
//! [`finance::Holding`]s for profit reporting.
//!
//! ## Example
//!
//! ```rust,no_run
//! use chrono::{Duration, Utc};
//! use papertrade::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let mut portfolio = Portfolio::new();
//!     portfolio.deposit(Utc::now(), 10_000.0)?;
//!
//!     let account = TradingAccount::default_account(portfolio.into_shared());
//!
//!     let issued = Utc::now();
//!     let order = Order::market(
//!         "AAPL",
//!         OrderKind::Buy,
//!         10.0,
//!         150.0,
//!         issued,
//!         issued + Duration::hours(1),
//!     )?;
//!     let ticket = account.submit(order).await?;
//!     match ticket.outcome().await? {
//!         OrderOutcome::Filled(transaction) => println!("filled: {transaction}"),
//!         other => println!("did not fill: {other:?}"),
//!     }
//!
//!     account.shutdown().await
//! }
//! ```

pub mod engine;
pub mod error;
pub mod execution;
pub mod finance;
pub mod order;
pub mod types;

pub mod prelude {
    //! Commonly used types and traits
    pub use crate::engine::{OrderOutcome, OrderTicket, TradingAccount, TradingConfig};
    pub use crate::error::{PapertradeError, Result};
    pub use crate::execution::{ExecutionResult, SimulatedBroker};
    pub use crate::finance::{
        calculate_holdings, BoundedRandomSlippage, CashAccount, CommissionSchedule,
        FlatCommission, Holding, NoCommission, NoSlippage, PerShareCommission, Portfolio,
        Position, SharedPortfolio, SlippageModel, Transaction,
    };
    pub use crate::order::{Order, OrderKind, PricingType};
    pub use crate::types::*;
}
