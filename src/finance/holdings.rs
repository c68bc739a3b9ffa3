//! Holdings - matched round trips derived from a transaction history
//!
//! A holding pairs a fragment of an opening lot with the closing trade that
//! consumed it. Matching is first-in-first-out per ticker: the earliest open
//! lot is drawn down first, and one closing trade may span several lots just
//! as one lot may be split across several closings.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::finance::Transaction;
use crate::types::{Cash, Price, Shares, Ticker, Timestamp};

/// One matched open/close pair of shares.
///
/// Prices are per share and always positive. Each fragment carries the full
/// commission of the trades it came from, so commissions are over-counted
/// when a trade is split across fragments; callers that aggregate costs
/// should de-duplicate by trade date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub ticker: Ticker,
    pub opened_at: Timestamp,
    pub closed_at: Timestamp,
    pub shares: Shares,
    pub open_price: Price,
    pub open_commission: Cash,
    pub close_price: Price,
    pub close_commission: Cash,
}

impl Holding {
    /// Value of the shares at the opening price
    pub fn open_value(&self) -> Cash {
        self.shares * self.open_price
    }

    /// Value of the shares at the closing price
    pub fn close_value(&self) -> Cash {
        self.shares * self.close_price
    }

    /// Profit before commissions (close value minus open value)
    pub fn gross_profit(&self) -> Cash {
        self.close_value() - self.open_value()
    }

    /// Profit after both commissions
    pub fn net_profit(&self) -> Cash {
        self.gross_profit() - self.open_commission - self.close_commission
    }
}

/// An opening lot with shares not yet consumed by a closing trade
struct OpenLot<'a> {
    transaction: &'a Transaction,
    remaining: Shares,
}

/// Match share transactions into holdings as of `cutoff`.
///
/// Openings settled strictly before the cutoff form the lot queue; closings
/// settled on or before the cutoff consume it oldest-first. Cash entries and
/// still-open lot remainders produce no holdings. The result is sorted by
/// close date.
pub fn calculate_holdings(transactions: &[Transaction], cutoff: Timestamp) -> Vec<Holding> {
    let mut tickers: Vec<&str> = transactions
        .iter()
        .filter_map(Transaction::ticker)
        .collect();
    tickers.sort_unstable();
    tickers.dedup();

    let mut holdings = Vec::new();
    for ticker in tickers {
        match_ticker(transactions, ticker, cutoff, &mut holdings);
    }
    holdings.sort_by_key(|holding| holding.closed_at);
    holdings
}

fn match_ticker(
    transactions: &[Transaction],
    ticker: &str,
    cutoff: Timestamp,
    out: &mut Vec<Holding>,
) {
    let mut lots: VecDeque<OpenLot> = transactions
        .iter()
        .filter(|t| {
            t.ticker() == Some(ticker)
                && t.is_opening()
                && t.date() < cutoff
                && t.shares().unwrap_or(0.0) > f64::EPSILON
        })
        .map(|t| OpenLot {
            transaction: t,
            remaining: t.shares().unwrap_or(0.0),
        })
        .collect();
    lots.make_contiguous()
        .sort_by_key(|lot| lot.transaction.date());

    let mut closings: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| t.ticker() == Some(ticker) && t.is_closing() && t.date() <= cutoff)
        .collect();
    closings.sort_by_key(|t| t.date());

    for closing in closings {
        let mut unmatched = closing.shares().unwrap_or(0.0);
        while unmatched > f64::EPSILON {
            let Some(lot) = lots.front_mut() else {
                // a validated history always has enough open shares
                debug_assert!(
                    false,
                    "closing {closing} exceeds open lots for {ticker}"
                );
                break;
            };
            let matched = unmatched.min(lot.remaining);
            let holding = Holding {
                ticker: ticker.to_string(),
                opened_at: lot.transaction.date(),
                closed_at: closing.date(),
                shares: matched,
                open_price: lot.transaction.price().unwrap_or(0.0),
                open_commission: lot.transaction.commission().unwrap_or(0.0),
                close_price: closing.price().unwrap_or(0.0),
                close_commission: closing.commission().unwrap_or(0.0),
            };
            lot.remaining -= matched;
            let exhausted = lot.remaining <= f64::EPSILON;
            if exhausted {
                lots.pop_front();
            }
            out.push(holding);
            unmatched -= matched;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn day(d: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 3, d, 0, 0, 0).unwrap()
    }

    fn buy(d: u32, ticker: &str, shares: Shares, price: Price) -> Transaction {
        Transaction::Buy {
            date: day(d),
            ticker: ticker.to_string(),
            shares,
            price,
            commission: 1.0,
        }
    }

    fn sell(d: u32, ticker: &str, shares: Shares, price: Price) -> Transaction {
        Transaction::Sell {
            date: day(d),
            ticker: ticker.to_string(),
            shares,
            price,
            commission: 2.0,
        }
    }

    #[test]
    fn test_close_spans_two_lots() {
        let history = vec![
            buy(1, "ABC", 10.0, 100.0),
            buy(2, "ABC", 5.0, 110.0),
            sell(3, "ABC", 12.0, 120.0),
        ];

        let holdings = calculate_holdings(&history, day(3));

        assert_eq!(holdings.len(), 2);
        assert_eq!(holdings[0].shares, 10.0);
        assert_eq!(holdings[0].open_price, 100.0);
        assert_eq!(holdings[0].close_price, 120.0);
        assert_eq!(holdings[0].opened_at, day(1));
        assert_eq!(holdings[1].shares, 2.0);
        assert_eq!(holdings[1].open_price, 110.0);
        assert_eq!(holdings[1].opened_at, day(2));
        for holding in &holdings {
            assert_eq!(holding.closed_at, day(3));
        }
    }

    #[test]
    fn test_lot_remainder_carries_to_later_closes() {
        let history = vec![
            buy(1, "ABC", 10.0, 100.0),
            sell(2, "ABC", 4.0, 105.0),
            sell(3, "ABC", 6.0, 115.0),
        ];

        let holdings = calculate_holdings(&history, day(10));

        assert_eq!(holdings.len(), 2);
        assert_eq!(holdings[0].shares, 4.0);
        assert_eq!(holdings[0].closed_at, day(2));
        assert_eq!(holdings[1].shares, 6.0);
        assert_eq!(holdings[1].closed_at, day(3));
        // both fragments came from the same lot
        assert_eq!(holdings[0].opened_at, day(1));
        assert_eq!(holdings[1].opened_at, day(1));
    }

    #[test]
    fn test_cutoff_boundaries() {
        // an opening on the cutoff date is not yet an open lot, but a
        // closing on the cutoff date is included
        let history = vec![
            buy(1, "ABC", 5.0, 100.0),
            buy(3, "ABC", 5.0, 101.0),
            sell(3, "ABC", 5.0, 110.0),
        ];

        let holdings = calculate_holdings(&history, day(3));

        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].opened_at, day(1));
        assert_eq!(holdings[0].open_price, 100.0);
    }

    #[test]
    fn test_open_shares_produce_no_holdings() {
        let history = vec![buy(1, "ABC", 10.0, 100.0)];
        assert!(calculate_holdings(&history, day(5)).is_empty());
    }

    #[test]
    fn test_tickers_are_isolated() {
        let history = vec![
            buy(1, "ABC", 10.0, 10.0),
            buy(1, "XYZ", 3.0, 50.0),
            sell(2, "XYZ", 3.0, 55.0),
            sell(3, "ABC", 10.0, 12.0),
        ];

        let holdings = calculate_holdings(&history, day(5));

        assert_eq!(holdings.len(), 2);
        // sorted by close date
        assert_eq!(holdings[0].ticker, "XYZ");
        assert_eq!(holdings[1].ticker, "ABC");
    }

    #[test]
    fn test_cash_entries_are_ignored() {
        let history = vec![
            Transaction::Deposit {
                date: day(1),
                amount: 1_000.0,
            },
            buy(2, "ABC", 5.0, 10.0),
            sell(3, "ABC", 5.0, 12.0),
            Transaction::Withdrawal {
                date: day(4),
                amount: 50.0,
            },
        ];

        let holdings = calculate_holdings(&history, day(5));
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].shares, 5.0);
    }

    #[test]
    fn test_short_and_cover_pair_like_lots() {
        let history = vec![
            Transaction::SellShort {
                date: day(1),
                ticker: "ABC".into(),
                shares: 10.0,
                price: 50.0,
                commission: 1.0,
            },
            Transaction::BuyToCover {
                date: day(2),
                ticker: "ABC".into(),
                shares: 10.0,
                price: 45.0,
                commission: 1.0,
            },
        ];

        let holdings = calculate_holdings(&history, day(3));

        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].open_price, 50.0);
        assert_eq!(holdings[0].close_price, 45.0);
    }

    #[test]
    fn test_profit_helpers() {
        let holding = Holding {
            ticker: "ABC".into(),
            opened_at: day(1),
            closed_at: day(2),
            shares: 10.0,
            open_price: 100.0,
            open_commission: 1.0,
            close_price: 120.0,
            close_commission: 2.0,
        };

        assert_eq!(holding.open_value(), 1_000.0);
        assert_eq!(holding.close_value(), 1_200.0);
        assert_eq!(holding.gross_profit(), 200.0);
        assert_eq!(holding.net_profit(), 197.0);
    }

    #[test]
    fn test_result_sorted_by_close_date() {
        let history = vec![
            buy(1, "ABC", 10.0, 10.0),
            sell(5, "ABC", 2.0, 11.0),
            sell(2, "ABC", 2.0, 11.0),
            sell(4, "ABC", 2.0, 11.0),
        ];

        let holdings = calculate_holdings(&history, day(10));

        let dates: Vec<Timestamp> = holdings.iter().map(|h| h.closed_at).collect();
        assert_eq!(dates, vec![day(2), day(4), day(5)]);
    }
}
