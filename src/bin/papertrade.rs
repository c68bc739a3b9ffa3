//! papertrade demo - drive a trading account end to end
//!
//! Funds a portfolio, runs a handful of orders through the fill pipeline
//! (including one cancellation and one expiry), then prints the final ledger
//! and its matched holdings. Set RUST_LOG=debug to watch the pipeline work.

use std::time::Duration;

use anyhow::Result;
use chrono::{Duration as Window, Utc};

use papertrade::prelude::*;

fn hour_order(ticker: &str, kind: OrderKind, shares: Shares, price: Price) -> Result<Order> {
    let issued = Utc::now();
    Ok(Order::market(
        ticker,
        kind,
        shares,
        price,
        issued,
        issued + Window::hours(1),
    )?)
}

async fn run_to_outcome(account: &TradingAccount, order: Order) -> Result<OrderOutcome> {
    let label = order.to_string();
    let ticket = account.submit(order).await?;
    let outcome = ticket.outcome().await?;
    match &outcome {
        OrderOutcome::Filled(transaction) => println!("  {label} -> filled as {transaction}"),
        OrderOutcome::Expired { at } => println!("  {label} -> expired at {at}"),
        OrderOutcome::Cancelled { at } => println!("  {label} -> cancelled at {at}"),
        OrderOutcome::Rejected { reason, .. } => println!("  {label} -> rejected: {reason}"),
    }
    Ok(outcome)
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let funded_at = Utc::now() - Window::days(30);
    let mut portfolio = Portfolio::new();
    portfolio.deposit(funded_at, 25_000.0)?;
    portfolio.add_transaction(Transaction::DividendReceipt {
        date: funded_at + Window::days(1),
        amount: 120.0,
    })?;
    let portfolio = portfolio.into_shared();

    let broker = SimulatedBroker::new(
        Box::new(BoundedRandomSlippage::new(0.005)),
        Box::new(FlatCommission::new(1.0)),
    );
    let config = TradingConfig {
        fill_delay: Duration::from_millis(20),
        max_fill_jitter: Duration::from_millis(30),
        seed: 7,
        ..TradingConfig::default()
    };
    let account = TradingAccount::new(config, broker, portfolio.clone());

    println!("opening positions:");
    run_to_outcome(&account, hour_order("AAPL", OrderKind::Buy, 20.0, 150.0)?).await?;
    run_to_outcome(&account, hour_order("MSFT", OrderKind::Buy, 10.0, 300.0)?).await?;

    println!("taking profits:");
    run_to_outcome(&account, hour_order("AAPL", OrderKind::Sell, 8.0, 155.0)?).await?;

    println!("short round trip:");
    run_to_outcome(&account, hour_order("TSLA", OrderKind::SellShort, 5.0, 200.0)?).await?;
    run_to_outcome(&account, hour_order("TSLA", OrderKind::BuyToCover, 5.0, 195.0)?).await?;

    println!("a change of heart:");
    let doomed = hour_order("MSFT", OrderKind::Buy, 5.0, 310.0)?;
    let ticket = account.submit(doomed).await?;
    account.try_cancel(ticket.order_id());
    match ticket.outcome().await? {
        OrderOutcome::Cancelled { at } => println!("  cancelled at {at}"),
        other => println!("  cancel lost the race: {other:?}"),
    }

    println!("an order that waits too long:");
    let issued = Utc::now();
    let stale = Order::market(
        "AAPL",
        OrderKind::Buy,
        1.0,
        150.0,
        issued,
        // expires before the account's minimum settlement delay
        issued + Window::milliseconds(5),
    )?;
    run_to_outcome(&account, stale).await?;

    account.shutdown().await?;

    let now = Utc::now();
    let snapshot = portfolio.lock();
    println!();
    println!("cash: {:.2}", snapshot.available_cash(now));
    for ticker in snapshot.tickers() {
        if let Some(position) = snapshot.position(ticker) {
            println!("{ticker}: {} shares", position.open_shares(now));
        }
    }

    println!();
    println!("matched holdings:");
    let holdings = snapshot.holdings(now);
    for holding in &holdings {
        println!(
            "  {} {} @ {:.2} -> {:.2}, net {:+.2}",
            holding.shares,
            holding.ticker,
            holding.open_price,
            holding.close_price,
            holding.net_profit()
        );
    }

    println!();
    println!("ledger:");
    println!("{}", serde_json::to_string_pretty(&snapshot.transactions())?);

    Ok(())
}
