//! Core types and constants

use chrono::{DateTime, Utc};

/// Timestamp type used throughout the library
pub type Timestamp = DateTime<Utc>;

/// Ticker symbol for traded instruments
pub type Ticker = String;

/// Price type (using f64 for precision)
pub type Price = f64;

/// Share quantity type
pub type Shares = f64;

/// Money/cash type
pub type Cash = f64;

/// Percentage type (0.0 to 1.0)
pub type Percentage = f64;

/// Unique identifier for orders
pub type OrderId = uuid::Uuid;

/// Round a price to whole cents
pub fn round_cents(value: Price) -> Price {
    (value * 100.0).round() / 100.0
}
