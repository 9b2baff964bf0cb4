//! Seed-and-match smoke scenario.
//!
//! Clears the store, seeds one crossable buy/sell pair, runs a single
//! matching pass and prints the result. Not a production interface.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

use matchbook::{
    Exchange, MatchingPolicy, Order, PricePriority, Side, SqliteStore, Store, TimePriority,
};

#[derive(Parser)]
#[command(name = "smoke", about = "Seed two crossable orders and run one matching pass")]
struct Args {
    /// Path to the store database
    #[arg(long, default_value = "matchbook.db")]
    db: PathBuf,

    /// Matching policy
    #[arg(long, value_enum, default_value_t = Policy::Price)]
    policy: Policy,

    /// Symbol to seed
    #[arg(long, default_value = "AAPL")]
    symbol: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum Policy {
    /// Best price first
    Price,
    /// Oldest order first
    Time,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let store = SqliteStore::open(&args.db)?;

    match args.policy {
        Policy::Price => run(store, PricePriority, &args.symbol),
        Policy::Time => run(store, TimePriority, &args.symbol),
    }
}

fn run<P: MatchingPolicy>(store: SqliteStore, policy: P, symbol: &str) -> Result<()> {
    let exchange = Exchange::new(store, policy);
    exchange.store().clear()?;

    exchange.submit(Order::new(1, symbol, Side::Buy, Decimal::from(150), 10))?;
    exchange.submit(Order::new(2, symbol, Side::Sell, Decimal::from(145), 5))?;

    match exchange.attempt_match(symbol)? {
        Some(trade) => println!("{trade}"),
        None => println!("no crossable pair"),
    }
    println!("{:?}", exchange.book(symbol)?);

    Ok(())
}
