//! Order resolution against pricing strategies
//!
//! The simulated broker turns an order into the transaction it settles into:
//! fill price comes from the slippage model, cost from the commission
//! schedule. An order whose settlement lands after its expiration resolves to
//! nothing at all.

use rand::RngCore;

use crate::finance::{CommissionSchedule, NoCommission, NoSlippage, SlippageModel, Transaction};
use crate::order::Order;
use crate::types::{Cash, Timestamp};

/// What an order resolved into at settlement time
#[derive(Debug, Clone)]
pub enum ExecutionResult {
    /// The order filled and settled into this transaction
    Filled(Transaction),
    /// Settlement landed after the order's expiration
    Expired,
}

/// Prices fills for a trading account
pub struct SimulatedBroker {
    slippage: Box<dyn SlippageModel>,
    commission: Box<dyn CommissionSchedule>,
}

impl SimulatedBroker {
    /// Create a broker from a slippage model and a commission schedule
    pub fn new(slippage: Box<dyn SlippageModel>, commission: Box<dyn CommissionSchedule>) -> Self {
        Self {
            slippage,
            commission,
        }
    }

    /// Create a broker with no slippage or commission
    pub fn default_broker() -> Self {
        Self::new(Box::new(NoSlippage), Box::new(NoCommission))
    }

    /// Commission this broker would charge for an order
    pub fn commission(&self, order: &Order) -> Cash {
        self.commission.price_check(order)
    }

    /// Resolve an order at its settlement date.
    ///
    /// `rng` drives the slippage draw; callers that need reproducible fills
    /// pass a seeded generator.
    pub fn resolve(
        &self,
        order: &Order,
        settles_at: Timestamp,
        rng: &mut dyn RngCore,
    ) -> ExecutionResult {
        if settles_at > order.expires_at() {
            return ExecutionResult::Expired;
        }

        let fill_price = self.slippage.fill_price(order, rng);
        let commission = self.commission.price_check(order);
        ExecutionResult::Filled(order.to_transaction(settles_at, fill_price, commission))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finance::{BoundedRandomSlippage, FlatCommission};
    use crate::order::OrderKind;
    use chrono::{Duration, Utc};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn order() -> Order {
        let issued = Utc::now();
        Order::market(
            "AAPL",
            OrderKind::Buy,
            10.0,
            100.0,
            issued,
            issued + Duration::hours(1),
        )
        .unwrap()
    }

    #[test]
    fn test_frictionless_fill() {
        let broker = SimulatedBroker::default_broker();
        let order = order();
        let mut rng = StdRng::seed_from_u64(1);

        let settles_at = order.issued_at() + Duration::minutes(1);
        match broker.resolve(&order, settles_at, &mut rng) {
            ExecutionResult::Filled(transaction) => {
                assert_eq!(transaction.price(), Some(100.0));
                assert_eq!(transaction.commission(), Some(0.0));
                assert_eq!(transaction.date(), settles_at);
            }
            ExecutionResult::Expired => panic!("order should fill inside its window"),
        }
    }

    #[test]
    fn test_late_settlement_expires() {
        let broker = SimulatedBroker::default_broker();
        let order = order();
        let mut rng = StdRng::seed_from_u64(1);

        let settles_at = order.expires_at() + Duration::seconds(1);
        assert!(matches!(
            broker.resolve(&order, settles_at, &mut rng),
            ExecutionResult::Expired
        ));
    }

    #[test]
    fn test_settlement_on_expiry_still_fills() {
        let broker = SimulatedBroker::default_broker();
        let order = order();
        let mut rng = StdRng::seed_from_u64(1);

        assert!(matches!(
            broker.resolve(&order, order.expires_at(), &mut rng),
            ExecutionResult::Filled(_)
        ));
    }

    #[test]
    fn test_commission_schedule_applies() {
        let broker = SimulatedBroker::new(Box::new(NoSlippage), Box::new(FlatCommission::new(7.5)));
        let order = order();
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(broker.commission(&order), 7.5);
        match broker.resolve(&order, order.issued_at(), &mut rng) {
            ExecutionResult::Filled(transaction) => {
                assert_eq!(transaction.commission(), Some(7.5));
            }
            ExecutionResult::Expired => panic!("order should fill"),
        }
    }

    #[test]
    fn test_slippage_stays_in_band() {
        let broker = SimulatedBroker::new(
            Box::new(BoundedRandomSlippage::new(0.01)),
            Box::new(NoCommission),
        );
        let order = order();
        let mut rng = StdRng::seed_from_u64(99);

        for _ in 0..50 {
            match broker.resolve(&order, order.issued_at(), &mut rng) {
                ExecutionResult::Filled(transaction) => {
                    let price = transaction.price().unwrap();
                    assert!((99.0..=101.0).contains(&price), "price {price} out of band");
                }
                ExecutionResult::Expired => panic!("order should fill"),
            }
        }
    }
}
