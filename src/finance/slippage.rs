//! Slippage models for realistic fill simulation

use rand::{Rng, RngCore};

use crate::order::Order;
use crate::types::{round_cents, Percentage, Price};

/// Slippage model trait.
///
/// Given an order and a random source, produce the price it actually fills
/// at. Models draw from the caller's RNG so fills stay reproducible under a
/// fixed seed.
pub trait SlippageModel: Send + Sync {
    /// Calculate the execution price for an order
    fn fill_price(&self, order: &Order, rng: &mut dyn RngCore) -> Price;

    /// Get model name
    fn name(&self) -> &str;
}

/// Random slippage bounded by a maximum ratio.
///
/// The fill price is the requested price scaled by `1 + s` where `s` is
/// drawn uniformly from `[-max_ratio, +max_ratio]`, then rounded to whole
/// cents. The result never goes below zero.
#[derive(Debug, Clone)]
pub struct BoundedRandomSlippage {
    /// Largest price deviation, as a fraction of the requested price
    max_ratio: Percentage,
}

impl BoundedRandomSlippage {
    /// Create a new bounded random slippage model
    pub fn new(max_ratio: Percentage) -> Self {
        Self {
            max_ratio: max_ratio.abs(),
        }
    }

    /// Largest configured deviation ratio
    pub fn max_ratio(&self) -> Percentage {
        self.max_ratio
    }
}

impl SlippageModel for BoundedRandomSlippage {
    fn fill_price(&self, order: &Order, rng: &mut dyn RngCore) -> Price {
        let ratio = if self.max_ratio > 0.0 {
            rng.gen_range(-self.max_ratio..=self.max_ratio)
        } else {
            0.0
        };
        round_cents(order.price() * (1.0 + ratio)).max(0.0)
    }

    fn name(&self) -> &str {
        "BoundedRandomSlippage"
    }
}

/// Zero slippage model (for testing or perfect execution scenarios)
#[derive(Debug, Clone)]
pub struct NoSlippage;

impl SlippageModel for NoSlippage {
    fn fill_price(&self, order: &Order, _rng: &mut dyn RngCore) -> Price {
        order.price()
    }

    fn name(&self) -> &str {
        "NoSlippage"
    }
}
