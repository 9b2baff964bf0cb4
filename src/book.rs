//! Order book as a pure projection over the store.
//!
//! The view is recomputed from the store at the start of every matching
//! pass; there is no resident cache that can diverge from persisted state.

use rust_decimal::Decimal;

use crate::error::StoreError;
use crate::order::{Order, Side};
use crate::policy::MatchingPolicy;
use crate::store::Store;

/// One symbol's live orders, each side in the active policy's priority
/// order. Loading has no side effects.
pub struct BookView {
    symbol: String,
    buys: Vec<Order>,
    sells: Vec<Order>,
}

impl BookView {
    /// Project the current book for `symbol` out of the store, ordering
    /// each side the way `policy` wants to scan it.
    pub fn load<S: Store, P: MatchingPolicy>(
        store: &S,
        symbol: &str,
        policy: &P,
    ) -> Result<Self, StoreError> {
        let (buy_key, buy_dir) = policy.buy_sort();
        let (sell_key, sell_dir) = policy.sell_sort();
        let buys = store.find_orders(Some(symbol), Some(Side::Buy), buy_key, buy_dir)?;
        let sells = store.find_orders(Some(symbol), Some(Side::Sell), sell_key, sell_dir)?;
        Ok(Self {
            symbol: symbol.to_string(),
            buys,
            sells,
        })
    }

    /// The symbol this view was projected for
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Live buy orders in policy priority order
    pub fn buys(&self) -> &[Order] {
        &self.buys
    }

    /// Live sell orders in policy priority order
    pub fn sells(&self) -> &[Order] {
        &self.sells
    }

    /// Highest resident buy price
    pub fn best_buy(&self) -> Option<Decimal> {
        self.buys.iter().map(|o| o.price).max()
    }

    /// Lowest resident sell price
    pub fn best_sell(&self) -> Option<Decimal> {
        self.sells.iter().map(|o| o.price).min()
    }

    /// Best sell minus best buy; `None` while either side is empty or the
    /// book is crossed
    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_buy(), self.best_sell()) {
            (Some(buy), Some(sell)) if sell > buy => Some(sell - buy),
            _ => None,
        }
    }

    /// Total number of resident orders on both sides
    pub fn order_count(&self) -> usize {
        self.buys.len() + self.sells.len()
    }

    /// Check if the book holds no orders for this symbol
    pub fn is_empty(&self) -> bool {
        self.buys.is_empty() && self.sells.is_empty()
    }
}

impl std::fmt::Debug for BookView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookView")
            .field("symbol", &self.symbol)
            .field("best_buy", &self.best_buy())
            .field("best_sell", &self.best_sell())
            .field("buys", &self.buys.len())
            .field("sells", &self.sells.len())
            .finish()
    }
}
