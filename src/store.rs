//! Persistent order/trade store.
//!
//! The narrow interface the engine consumes: order insert, quantity
//! decrement, delete-by-id, filtered-and-sorted retrieval, and an
//! append-only trade log. [`SqliteStore`] is the durable implementation;
//! the engine stays generic so tests can substitute their own.

use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection};
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::StoreError;
use crate::order::{Order, Side, Trade};

/// Column a retrieval is ordered by
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortKey {
    /// Limit price (orders) or execution price (trades)
    Price,
    /// Submission ID (orders) or store-assigned ID (trades)
    OrderId,
    /// Execution time; orders carry no timestamp, so this falls back to
    /// submission ID, which is their time axis
    Timestamp,
}

/// Sort direction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    const fn as_sql(self) -> &'static str {
        match self {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        }
    }
}

/// Effect a fill has on one side's resting order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FillEffect {
    /// Partial fill: the order stays resident with a smaller quantity
    Decrement { order_id: u64, amount: u32 },
    /// Full fill: the order leaves the book
    Remove { order_id: u64 },
}

/// Narrow persistence interface consumed by intake, the book view and the
/// matching engine.
pub trait Store {
    /// Insert a new resting order. Fails with
    /// [`StoreError::DuplicateOrder`] if the ID is already resident.
    fn insert_order(&self, order: &Order) -> Result<(), StoreError>;

    /// Remove an order from the book entirely.
    fn delete_order(&self, order_id: u64) -> Result<(), StoreError>;

    /// Reduce an order's remaining quantity by `amount`.
    fn decrement_order_qty(&self, order_id: u64, amount: u32) -> Result<(), StoreError>;

    /// Fetch resident orders, optionally filtered, in the requested order.
    fn find_orders(
        &self,
        symbol: Option<&str>,
        side: Option<Side>,
        sort: SortKey,
        dir: SortDir,
    ) -> Result<Vec<Order>, StoreError>;

    /// Append a trade to the log and return its store-assigned ID.
    fn insert_trade(&self, trade: &Trade) -> Result<i64, StoreError>;

    /// Fetch executed trades in the requested order.
    fn find_trades(
        &self,
        sort: SortKey,
        dir: SortDir,
        limit: Option<usize>,
    ) -> Result<Vec<Trade>, StoreError>;

    /// Persist a trade and both order mutations as one atomic unit: either
    /// all three land or none do.
    fn apply_fill(
        &self,
        trade: &Trade,
        buy: FillEffect,
        sell: FillEffect,
    ) -> Result<i64, StoreError>;

    /// Wipe both collections.
    fn clear(&self) -> Result<(), StoreError>;
}

/// SQLite-backed store.
///
/// Orders live in a table keyed by `order_id`; trades in an append-only
/// table with an autoincrement ID. Prices are stored as exact decimal
/// strings and timestamps as RFC 3339 text.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) a file-backed store.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::init(conn)
    }

    /// Open a private in-memory store; used by tests and benchmarks.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS orders (
                order_id INTEGER PRIMARY KEY,
                symbol   TEXT NOT NULL,
                side     TEXT NOT NULL,
                price    TEXT NOT NULL,
                quantity INTEGER NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS trades (
                trade_id      INTEGER PRIMARY KEY AUTOINCREMENT,
                buy_order_id  INTEGER NOT NULL,
                sell_order_id INTEGER NOT NULL,
                symbol        TEXT NOT NULL,
                price         TEXT NOT NULL,
                quantity      INTEGER NOT NULL,
                timestamp     TEXT NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_orders_symbol ON orders(symbol)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_trades_symbol ON trades(symbol)",
            [],
        )?;
        debug!("store schema ready");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// ORDER BY clause for the orders table. Price sorts tie-break on
    /// submission ID so equal-priced orders keep arrival order.
    fn orders_order_by(sort: SortKey, dir: SortDir) -> String {
        let dir = dir.as_sql();
        match sort {
            SortKey::Price => format!("CAST(price AS REAL) {dir}, order_id ASC"),
            SortKey::OrderId | SortKey::Timestamp => format!("order_id {dir}"),
        }
    }

    /// ORDER BY clause for the trades table.
    fn trades_order_by(sort: SortKey, dir: SortDir) -> String {
        let dir = dir.as_sql();
        match sort {
            SortKey::Price => format!("CAST(price AS REAL) {dir}, trade_id ASC"),
            SortKey::OrderId => format!("trade_id {dir}"),
            SortKey::Timestamp => format!("timestamp {dir}, trade_id {dir}"),
        }
    }
}

impl Store for SqliteStore {
    fn insert_order(&self, order: &Order) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        let result = conn.execute(
            "INSERT INTO orders (order_id, symbol, side, price, quantity)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                order.order_id as i64,
                order.symbol,
                order.side.as_str(),
                order.price.to_string(),
                order.quantity,
            ],
        );
        match result {
            Ok(_) => {
                debug!(order_id = order.order_id, "order inserted");
                Ok(())
            }
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::DuplicateOrder(order.order_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn delete_order(&self, order_id: u64) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        delete_order_inner(&conn, order_id)
    }

    fn decrement_order_qty(&self, order_id: u64, amount: u32) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        decrement_order_inner(&conn, order_id, amount)
    }

    fn find_orders(
        &self,
        symbol: Option<&str>,
        side: Option<Side>,
        sort: SortKey,
        dir: SortDir,
    ) -> Result<Vec<Order>, StoreError> {
        let conn = self.conn.lock().unwrap();

        let mut sql =
            String::from("SELECT order_id, symbol, side, price, quantity FROM orders");
        let mut clauses: Vec<&str> = Vec::new();
        let mut args: Vec<String> = Vec::new();
        if let Some(symbol) = symbol {
            clauses.push("symbol = ?");
            args.push(symbol.to_string());
        }
        if let Some(side) = side {
            clauses.push("side = ?");
            args.push(side.as_str().to_string());
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY ");
        sql.push_str(&Self::orders_order_by(sort, dir));

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(args.iter()), |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, u32>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(order_id, symbol, side, price, quantity)| {
                Ok(Order {
                    order_id: order_id as u64,
                    symbol,
                    side: parse_side(&side)?,
                    price: parse_price(&price)?,
                    quantity,
                })
            })
            .collect()
    }

    fn insert_trade(&self, trade: &Trade) -> Result<i64, StoreError> {
        let conn = self.conn.lock().unwrap();
        insert_trade_inner(&conn, trade)
    }

    fn find_trades(
        &self,
        sort: SortKey,
        dir: SortDir,
        limit: Option<usize>,
    ) -> Result<Vec<Trade>, StoreError> {
        let conn = self.conn.lock().unwrap();

        let mut sql = String::from(
            "SELECT trade_id, buy_order_id, sell_order_id, symbol, price, quantity, timestamp
             FROM trades ORDER BY ",
        );
        sql.push_str(&Self::trades_order_by(sort, dir));
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, u32>(5)?,
                    row.get::<_, String>(6)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(
                |(trade_id, buy_order_id, sell_order_id, symbol, price, quantity, ts)| {
                    Ok(Trade {
                        trade_id: Some(trade_id),
                        buy_order_id: buy_order_id as u64,
                        sell_order_id: sell_order_id as u64,
                        symbol,
                        price: parse_price(&price)?,
                        quantity,
                        timestamp: parse_timestamp(&ts)?,
                    })
                },
            )
            .collect()
    }

    fn apply_fill(
        &self,
        trade: &Trade,
        buy: FillEffect,
        sell: FillEffect,
    ) -> Result<i64, StoreError> {
        let mut conn = self.conn.lock().unwrap();
        // A failure at any step drops the transaction and rolls back; the
        // book must never hold a half-applied fill.
        let tx = conn.transaction()?;
        let trade_id = insert_trade_inner(&tx, trade)?;
        apply_effect(&tx, buy)?;
        apply_effect(&tx, sell)?;
        tx.commit()?;
        debug!(trade_id, "fill applied");
        Ok(trade_id)
    }

    fn clear(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM orders", [])?;
        conn.execute("DELETE FROM trades", [])?;
        Ok(())
    }
}

fn insert_trade_inner(conn: &Connection, trade: &Trade) -> Result<i64, StoreError> {
    conn.execute(
        "INSERT INTO trades (buy_order_id, sell_order_id, symbol, price, quantity, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            trade.buy_order_id as i64,
            trade.sell_order_id as i64,
            trade.symbol,
            trade.price.to_string(),
            trade.quantity,
            trade.timestamp.to_rfc3339(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn delete_order_inner(conn: &Connection, order_id: u64) -> Result<(), StoreError> {
    let affected = conn.execute(
        "DELETE FROM orders WHERE order_id = ?1",
        params![order_id as i64],
    )?;
    if affected == 0 {
        return Err(StoreError::OrderNotFound(order_id));
    }
    Ok(())
}

fn decrement_order_inner(conn: &Connection, order_id: u64, amount: u32) -> Result<(), StoreError> {
    let affected = conn.execute(
        "UPDATE orders SET quantity = quantity - ?1 WHERE order_id = ?2",
        params![amount, order_id as i64],
    )?;
    if affected == 0 {
        return Err(StoreError::OrderNotFound(order_id));
    }
    Ok(())
}

fn apply_effect(conn: &Connection, effect: FillEffect) -> Result<(), StoreError> {
    match effect {
        FillEffect::Decrement { order_id, amount } => decrement_order_inner(conn, order_id, amount),
        FillEffect::Remove { order_id } => delete_order_inner(conn, order_id),
    }
}

fn parse_side(raw: &str) -> Result<Side, StoreError> {
    Side::from_str(raw).ok_or_else(|| StoreError::CorruptRecord {
        field: "side",
        value: raw.to_string(),
    })
}

fn parse_price(raw: &str) -> Result<Decimal, StoreError> {
    raw.parse::<Decimal>()
        .map_err(|_| StoreError::CorruptRecord {
            field: "price",
            value: raw.to_string(),
        })
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| StoreError::CorruptRecord {
            field: "timestamp",
            value: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn order(order_id: u64, side: Side, price: Decimal, quantity: u32) -> Order {
        Order::new(order_id, "AAPL", side, price, quantity)
    }

    fn trade(buy: u64, sell: u64, price: Decimal, quantity: u32) -> Trade {
        Trade {
            trade_id: None,
            buy_order_id: buy,
            sell_order_id: sell,
            symbol: "AAPL".to_string(),
            price,
            quantity,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_order_roundtrip() {
        let store = SqliteStore::open_in_memory().unwrap();
        let original = order(1, Side::Buy, dec!(150.25), 10);
        store.insert_order(&original).unwrap();

        let found = store
            .find_orders(Some("AAPL"), None, SortKey::OrderId, SortDir::Asc)
            .unwrap();
        assert_eq!(found, vec![original]);
    }

    #[test]
    fn test_duplicate_order_id() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_order(&order(1, Side::Buy, dec!(150), 10)).unwrap();

        let err = store
            .insert_order(&order(1, Side::Sell, dec!(160), 5))
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateOrder(1)));
    }

    #[test]
    fn test_find_orders_filters() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_order(&order(1, Side::Buy, dec!(150), 10)).unwrap();
        store.insert_order(&order(2, Side::Sell, dec!(151), 5)).unwrap();
        store
            .insert_order(&Order::new(3, "MSFT", Side::Buy, dec!(300), 7))
            .unwrap();

        let aapl_buys = store
            .find_orders(Some("AAPL"), Some(Side::Buy), SortKey::OrderId, SortDir::Asc)
            .unwrap();
        assert_eq!(aapl_buys.len(), 1);
        assert_eq!(aapl_buys[0].order_id, 1);

        let everything = store
            .find_orders(None, None, SortKey::OrderId, SortDir::Asc)
            .unwrap();
        assert_eq!(everything.len(), 3);
    }

    #[test]
    fn test_price_sort_with_id_tiebreak() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_order(&order(1, Side::Buy, dec!(150), 10)).unwrap();
        store.insert_order(&order(2, Side::Buy, dec!(155), 10)).unwrap();
        store.insert_order(&order(3, Side::Buy, dec!(155), 10)).unwrap();

        let buys = store
            .find_orders(Some("AAPL"), Some(Side::Buy), SortKey::Price, SortDir::Desc)
            .unwrap();
        let ids: Vec<u64> = buys.iter().map(|o| o.order_id).collect();
        // Highest price first; equal prices keep submission order
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn test_decrement_and_delete() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_order(&order(1, Side::Buy, dec!(150), 10)).unwrap();

        store.decrement_order_qty(1, 4).unwrap();
        let found = store
            .find_orders(None, None, SortKey::OrderId, SortDir::Asc)
            .unwrap();
        assert_eq!(found[0].quantity, 6);

        store.delete_order(1).unwrap();
        assert!(store
            .find_orders(None, None, SortKey::OrderId, SortDir::Asc)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_mutations_on_missing_order() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(matches!(
            store.delete_order(99).unwrap_err(),
            StoreError::OrderNotFound(99)
        ));
        assert!(matches!(
            store.decrement_order_qty(99, 1).unwrap_err(),
            StoreError::OrderNotFound(99)
        ));
    }

    #[test]
    fn test_apply_fill_atomic() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_order(&order(1, Side::Buy, dec!(150), 10)).unwrap();
        store.insert_order(&order(2, Side::Sell, dec!(145), 5)).unwrap();

        let trade_id = store
            .apply_fill(
                &trade(1, 2, dec!(145), 5),
                FillEffect::Decrement { order_id: 1, amount: 5 },
                FillEffect::Remove { order_id: 2 },
            )
            .unwrap();
        assert!(trade_id > 0);

        let orders = store
            .find_orders(None, None, SortKey::OrderId, SortDir::Asc)
            .unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].order_id, 1);
        assert_eq!(orders[0].quantity, 5);

        let trades = store
            .find_trades(SortKey::Timestamp, SortDir::Asc, None)
            .unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].trade_id, Some(trade_id));
    }

    #[test]
    fn test_apply_fill_rolls_back_on_failure() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_order(&order(1, Side::Buy, dec!(150), 10)).unwrap();

        // The sell side is missing, so the whole fill must roll back:
        // no trade appended, buy order untouched.
        let err = store
            .apply_fill(
                &trade(1, 2, dec!(145), 5),
                FillEffect::Decrement { order_id: 1, amount: 5 },
                FillEffect::Remove { order_id: 2 },
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::OrderNotFound(2)));

        let orders = store
            .find_orders(None, None, SortKey::OrderId, SortDir::Asc)
            .unwrap();
        assert_eq!(orders[0].quantity, 10);
        assert!(store
            .find_trades(SortKey::Timestamp, SortDir::Asc, None)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_find_trades_limit() {
        let store = SqliteStore::open_in_memory().unwrap();
        for i in 0..5 {
            store.insert_trade(&trade(i, i + 10, dec!(100), 1)).unwrap();
        }

        let latest = store
            .find_trades(SortKey::OrderId, SortDir::Desc, Some(2))
            .unwrap();
        assert_eq!(latest.len(), 2);
        assert!(latest[0].trade_id > latest[1].trade_id);
    }

    #[test]
    fn test_clear() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_order(&order(1, Side::Buy, dec!(150), 10)).unwrap();
        store.insert_trade(&trade(1, 2, dec!(145), 5)).unwrap();

        store.clear().unwrap();
        assert!(store
            .find_orders(None, None, SortKey::OrderId, SortDir::Asc)
            .unwrap()
            .is_empty());
        assert!(store
            .find_trades(SortKey::Timestamp, SortDir::Asc, None)
            .unwrap()
            .is_empty());
    }
}
