//! Order and Trade data model.
//!
//! Orders are the mutable residents of the book: their remaining quantity
//! shrinks on partial fills and the row disappears on a full fill.
//! Trades are the immutable, append-only record of executions.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order side (buy = bid, sell = ask)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Buy side (bids)
    Buy,
    /// Sell side (asks)
    Sell,
}

impl Side {
    /// Returns the opposite side
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// Stable lowercase name, also the stored column value
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }

    /// Parse a stored column value back into a side
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "buy" => Some(Side::Buy),
            "sell" => Some(Side::Sell),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resting limit order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Submitter-assigned ID, unique and never reused
    pub order_id: u64,
    /// Instrument identifier; orders only match within one symbol
    pub symbol: String,
    /// Order side (buy/sell)
    pub side: Side,
    /// Limit price, must be positive
    pub price: Decimal,
    /// Remaining unfilled quantity, always positive while resident
    pub quantity: u32,
}

impl Order {
    /// Construct an order without validating it; validation happens at intake.
    pub fn new(
        order_id: u64,
        symbol: impl Into<String>,
        side: Side,
        price: Decimal,
        quantity: u32,
    ) -> Self {
        Self {
            order_id,
            symbol: symbol.into(),
            side,
            price,
            quantity,
        }
    }

    /// Check the fields an order must satisfy before it may enter the book.
    pub fn validate(&self) -> Result<(), RejectReason> {
        if self.symbol.is_empty() {
            return Err(RejectReason::EmptySymbol);
        }
        if self.price <= Decimal::ZERO {
            return Err(RejectReason::NonPositivePrice);
        }
        if self.quantity == 0 {
            return Err(RejectReason::NonPositiveQuantity);
        }
        Ok(())
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} {} {} @ {}",
            self.order_id, self.side, self.symbol, self.quantity, self.price
        )
    }
}

/// Reasons intake refuses an order before it reaches the store
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    /// Price is zero or negative
    NonPositivePrice,
    /// Quantity is zero
    NonPositiveQuantity,
    /// Symbol is missing
    EmptySymbol,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            RejectReason::NonPositivePrice => "non-positive price",
            RejectReason::NonPositiveQuantity => "non-positive quantity",
            RejectReason::EmptySymbol => "empty symbol",
        };
        f.write_str(msg)
    }
}

/// An executed match between one buy and one sell order.
///
/// References the matched orders by ID only; either order may already be
/// gone from the book by the time the trade is inspected.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Store-assigned ID, `None` until the trade is persisted
    pub trade_id: Option<i64>,
    pub buy_order_id: u64,
    pub sell_order_id: u64,
    pub symbol: String,
    /// Execution price (always the sell side's limit)
    pub price: Decimal,
    /// Executed quantity
    pub quantity: u32,
    /// Match creation time
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for Trade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "trade {} {} @ {} (buy #{} / sell #{})",
            self.symbol, self.quantity, self.price, self.buy_order_id, self.sell_order_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
    }

    #[test]
    fn test_side_roundtrip() {
        assert_eq!(Side::from_str(Side::Buy.as_str()), Some(Side::Buy));
        assert_eq!(Side::from_str(Side::Sell.as_str()), Some(Side::Sell));
        assert_eq!(Side::from_str("hold"), None);
    }

    #[test]
    fn test_validate_accepts_well_formed() {
        let order = Order::new(1, "AAPL", Side::Buy, dec!(150), 10);
        assert_eq!(order.validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_bad_fields() {
        let zero_price = Order::new(1, "AAPL", Side::Buy, Decimal::ZERO, 10);
        assert_eq!(zero_price.validate(), Err(RejectReason::NonPositivePrice));

        let negative_price = Order::new(1, "AAPL", Side::Sell, dec!(-1), 10);
        assert_eq!(
            negative_price.validate(),
            Err(RejectReason::NonPositivePrice)
        );

        let zero_qty = Order::new(1, "AAPL", Side::Buy, dec!(150), 0);
        assert_eq!(zero_qty.validate(), Err(RejectReason::NonPositiveQuantity));

        let no_symbol = Order::new(1, "", Side::Buy, dec!(150), 10);
        assert_eq!(no_symbol.validate(), Err(RejectReason::EmptySymbol));
    }

    #[test]
    fn test_order_display() {
        let order = Order::new(4, "AAPL", Side::Buy, dec!(150), 10);
        assert_eq!(order.to_string(), "#4 buy AAPL 10 @ 150");
    }
}
