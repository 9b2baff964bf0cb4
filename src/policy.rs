//! Matching policies: the scan order of each book side and the selection
//! of the first crossable pair.
//!
//! The two policies are deliberately kept as separate implementations.
//! They disagree on real books (a high late bid beats a low early one
//! under price priority and loses under time priority), so merging them
//! would change reference behavior.

use crate::order::Order;
use crate::store::{SortDir, SortKey};

/// A buy and a sell cross when they share a symbol and the buy's limit
/// meets or exceeds the sell's.
#[inline]
pub fn crosses(buy: &Order, sell: &Order) -> bool {
    buy.symbol == sell.symbol && buy.price >= sell.price
}

/// Decides the priority ordering of each side of the book and selects the
/// first crossable pair under that ordering.
pub trait MatchingPolicy {
    /// Policy name for logs and diagnostics
    fn name(&self) -> &'static str;

    /// Sort specification for the buy side of the book view
    fn buy_sort(&self) -> (SortKey, SortDir);

    /// Sort specification for the sell side of the book view
    fn sell_sort(&self) -> (SortKey, SortDir);

    /// First (buy, sell) pair whose prices cross, scanning buys in
    /// priority order and sells in priority order within each buy.
    /// Inputs arrive already ordered per `buy_sort`/`sell_sort`.
    ///
    /// Symbol equality is enforced here for every policy, even though the
    /// book view is already per-symbol; a cross-symbol match must be
    /// impossible no matter how the inputs were produced.
    fn select_pair<'a>(
        &self,
        buys: &'a [Order],
        sells: &'a [Order],
    ) -> Option<(&'a Order, &'a Order)> {
        for buy in buys {
            for sell in sells {
                if crosses(buy, sell) {
                    return Some((buy, sell));
                }
            }
        }
        None
    }
}

/// Best-price-first matching: highest buy against lowest sell.
///
/// The default policy.
#[derive(Clone, Copy, Debug, Default)]
pub struct PricePriority;

impl MatchingPolicy for PricePriority {
    fn name(&self) -> &'static str {
        "price-priority"
    }

    fn buy_sort(&self) -> (SortKey, SortDir) {
        (SortKey::Price, SortDir::Desc)
    }

    fn sell_sort(&self) -> (SortKey, SortDir) {
        (SortKey::Price, SortDir::Asc)
    }
}

/// Submission-order (FIFO) matching: oldest order first on both sides.
#[derive(Clone, Copy, Debug, Default)]
pub struct TimePriority;

impl MatchingPolicy for TimePriority {
    fn name(&self) -> &'static str {
        "time-priority"
    }

    fn buy_sort(&self) -> (SortKey, SortDir) {
        (SortKey::OrderId, SortDir::Asc)
    }

    fn sell_sort(&self) -> (SortKey, SortDir) {
        (SortKey::OrderId, SortDir::Asc)
    }
}
