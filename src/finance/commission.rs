//! Commission schedules for pricing order costs

use crate::order::Order;
use crate::types::Cash;

/// Commission schedule trait.
///
/// Schedules are pure pricing strategies: given an order they quote the
/// commission that a fill of it would be charged. They never fail for a
/// well-formed order.
pub trait CommissionSchedule: Send + Sync {
    /// Quote the commission charged for filling an order
    fn price_check(&self, order: &Order) -> Cash;

    /// Get schedule name
    fn name(&self) -> &str;
}

/// Flat fee per trade, regardless of size
#[derive(Debug, Clone)]
pub struct FlatCommission {
    /// Cost per trade
    pub cost: Cash,
}

impl FlatCommission {
    /// Create a new flat commission schedule
    pub fn new(cost: Cash) -> Self {
        Self { cost }
    }
}

impl CommissionSchedule for FlatCommission {
    fn price_check(&self, _order: &Order) -> Cash {
        self.cost
    }

    fn name(&self) -> &str {
        "FlatCommission"
    }
}

/// Per-share commission with an optional minimum
#[derive(Debug, Clone)]
pub struct PerShareCommission {
    /// Cost per share
    pub cost_per_share: Cash,
    /// Minimum commission
    pub min_commission: Cash,
}

impl PerShareCommission {
    /// Create a new per-share commission schedule
    pub fn new(cost_per_share: Cash) -> Self {
        Self {
            cost_per_share,
            min_commission: 0.0,
        }
    }

    /// Create with minimum commission
    pub fn with_min(cost_per_share: Cash, min_commission: Cash) -> Self {
        Self {
            cost_per_share,
            min_commission,
        }
    }
}

impl CommissionSchedule for PerShareCommission {
    fn price_check(&self, order: &Order) -> Cash {
        let commission = self.cost_per_share * order.shares();
        commission.max(self.min_commission)
    }

    fn name(&self) -> &str {
        "PerShareCommission"
    }
}

/// Zero commission (for testing or commission-free accounts)
#[derive(Debug, Clone, Default)]
pub struct NoCommission;

impl CommissionSchedule for NoCommission {
    fn price_check(&self, _order: &Order) -> Cash {
        0.0
    }

    fn name(&self) -> &str {
        "NoCommission"
    }
}
