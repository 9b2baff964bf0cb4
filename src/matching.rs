//! Matching engine: at most one match per pass.
//!
//! A pass projects the book out of the store, asks the policy for the
//! first crossable pair, and applies the fill. It never loops internally;
//! callers drive draining and may interleave their own fairness or
//! backpressure between passes.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::book::BookView;
use crate::error::MatchError;
use crate::order::{Order, Trade};
use crate::policy::MatchingPolicy;
use crate::store::{FillEffect, Store};

/// The matching engine core. Holds an injected store handle and the
/// active policy; all book state lives in the store.
pub struct MatchingEngine<S, P> {
    store: Arc<S>,
    policy: P,
}

impl<S: Store, P: MatchingPolicy> MatchingEngine<S, P> {
    /// Create an engine over an injected store handle.
    pub fn new(store: Arc<S>, policy: P) -> Self {
        Self { store, policy }
    }

    /// The active matching policy
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Run one matching pass for `symbol`.
    ///
    /// # Algorithm
    /// 1. Project the current book from the store
    /// 2. Select the first crossable (buy, sell) pair under the policy
    /// 3. Resolve quantity (`min` of both sides) and price (the sell's)
    /// 4. Persist the trade and both order mutations atomically
    ///
    /// # Returns
    /// The executed trade, or `Ok(None)` when the book is quiescent for
    /// this symbol. A no-op pass mutates nothing.
    pub fn attempt_match(&self, symbol: &str) -> Result<Option<Trade>, MatchError> {
        let book = BookView::load(self.store.as_ref(), symbol, &self.policy)?;

        let (buy, sell) = match self.policy.select_pair(book.buys(), book.sells()) {
            Some(pair) => pair,
            None => {
                debug!(symbol, policy = self.policy.name(), "no crossable pair");
                return Ok(None);
            }
        };

        let quantity = buy.quantity.min(sell.quantity);
        let mut trade = Trade {
            trade_id: None,
            buy_order_id: buy.order_id,
            sell_order_id: sell.order_id,
            symbol: buy.symbol.clone(),
            // The resting quote is the execution price; the crossing side
            // never improves on it
            price: sell.price,
            quantity,
            timestamp: Utc::now(),
        };

        let buy_effect = fill_effect(buy, quantity);
        let sell_effect = fill_effect(sell, quantity);
        let trade_id = self.store.apply_fill(&trade, buy_effect, sell_effect)?;
        trade.trade_id = Some(trade_id);

        info!(
            trade_id,
            symbol = %trade.symbol,
            price = %trade.price,
            quantity = trade.quantity,
            buy_order_id = trade.buy_order_id,
            sell_order_id = trade.sell_order_id,
            "trade executed"
        );
        Ok(Some(trade))
    }

    /// Re-invoke [`attempt_match`](Self::attempt_match) until a pass is a
    /// no-op, returning the trades in execution order.
    pub fn drain(&self, symbol: &str) -> Result<Vec<Trade>, MatchError> {
        let mut trades = Vec::new();
        while let Some(trade) = self.attempt_match(symbol)? {
            trades.push(trade);
        }
        Ok(trades)
    }
}

/// An order filled for its whole remaining quantity leaves the book;
/// otherwise it stays with the remainder.
fn fill_effect(order: &Order, traded: u32) -> FillEffect {
    if order.quantity > traded {
        FillEffect::Decrement {
            order_id: order.order_id,
            amount: traded,
        }
    } else {
        FillEffect::Remove {
            order_id: order.order_id,
        }
    }
}
