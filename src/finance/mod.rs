//! Finance module - ledgers, pricing strategies, and holdings

pub mod cash;
pub mod commission;
pub mod holdings;
pub mod portfolio;
pub mod position;
pub mod slippage;
pub mod transaction;

pub use cash::CashAccount;
pub use commission::{CommissionSchedule, FlatCommission, NoCommission, PerShareCommission};
pub use holdings::{calculate_holdings, Holding};
pub use portfolio::{Portfolio, SharedPortfolio};
pub use position::Position;
pub use slippage::{BoundedRandomSlippage, NoSlippage, SlippageModel};
pub use transaction::Transaction;
