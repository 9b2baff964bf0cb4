//! Read-only dump of open orders and trade history.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use matchbook::{SortDir, SortKey, SqliteStore, Store};

#[derive(Parser)]
#[command(name = "inspect", about = "Print open orders and trade history")]
struct Args {
    /// Path to the store database
    #[arg(long, default_value = "matchbook.db")]
    db: PathBuf,

    /// Only show orders for this symbol
    #[arg(long)]
    symbol: Option<String>,

    /// Column to sort by
    #[arg(long, value_enum, default_value_t = Sort::Id)]
    sort: Sort,

    /// Sort descending instead of ascending
    #[arg(long)]
    desc: bool,

    /// Show at most this many trades
    #[arg(long)]
    limit: Option<usize>,

    /// Export the trade history to a CSV file
    #[arg(long)]
    csv: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Sort {
    Price,
    Id,
    Time,
}

impl From<Sort> for SortKey {
    fn from(sort: Sort) -> Self {
        match sort {
            Sort::Price => SortKey::Price,
            Sort::Id => SortKey::OrderId,
            Sort::Time => SortKey::Timestamp,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let store = SqliteStore::open(&args.db)
        .with_context(|| format!("failed to open store at {}", args.db.display()))?;

    let sort = SortKey::from(args.sort);
    let dir = if args.desc { SortDir::Desc } else { SortDir::Asc };

    let orders = store.find_orders(args.symbol.as_deref(), None, sort, dir)?;
    println!("open orders ({}):", orders.len());
    for order in &orders {
        println!("  {order}");
    }

    let trades = store.find_trades(sort, dir, args.limit)?;
    println!("trade history ({}):", trades.len());
    for trade in &trades {
        println!("  {} {}", trade.timestamp.to_rfc3339(), trade);
    }

    if let Some(path) = &args.csv {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        for trade in &trades {
            writer.serialize(trade)?;
        }
        writer.flush()?;
        println!("wrote {} trades to {}", trades.len(), path.display());
    }

    Ok(())
}
