//! Order intake: validate, persist, nothing else.
//!
//! Intake never triggers matching; a submitted order simply becomes
//! visible to the next book projection. Callers decide when to run a
//! matching pass.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::IntakeError;
use crate::order::Order;
use crate::store::Store;

/// Thin entry point accepting new orders into the store.
pub struct OrderIntake<S> {
    store: Arc<S>,
}

impl<S: Store> OrderIntake<S> {
    /// Create an intake over an injected store handle.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Accept a well-formed order into the store.
    ///
    /// Malformed orders (non-positive price or quantity, missing symbol)
    /// are rejected before persistence and never reach the matching
    /// engine. A duplicate `order_id` surfaces as the store's constraint
    /// failure.
    pub fn submit(&self, order: Order) -> Result<(), IntakeError> {
        if let Err(reason) = order.validate() {
            warn!(order_id = order.order_id, %reason, "order rejected");
            return Err(IntakeError::Rejected(reason));
        }

        self.store.insert_order(&order)?;
        info!(%order, "order placed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::order::{RejectReason, Side};
    use crate::store::{SortDir, SortKey, SqliteStore};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn intake() -> OrderIntake<SqliteStore> {
        OrderIntake::new(Arc::new(SqliteStore::open_in_memory().unwrap()))
    }

    #[test]
    fn test_submit_persists() {
        let intake = intake();
        let order = Order::new(1, "AAPL", Side::Buy, dec!(150), 10);
        intake.submit(order.clone()).unwrap();

        let found = intake
            .store
            .find_orders(Some("AAPL"), None, SortKey::OrderId, SortDir::Asc)
            .unwrap();
        assert_eq!(found, vec![order]);
    }

    #[test]
    fn test_malformed_orders_never_reach_the_store() {
        let intake = intake();

        let err = intake
            .submit(Order::new(1, "AAPL", Side::Buy, Decimal::ZERO, 10))
            .unwrap_err();
        assert!(matches!(
            err,
            IntakeError::Rejected(RejectReason::NonPositivePrice)
        ));

        let err = intake
            .submit(Order::new(2, "AAPL", Side::Sell, dec!(150), 0))
            .unwrap_err();
        assert!(matches!(
            err,
            IntakeError::Rejected(RejectReason::NonPositiveQuantity)
        ));

        let err = intake
            .submit(Order::new(3, "", Side::Sell, dec!(150), 1))
            .unwrap_err();
        assert!(matches!(
            err,
            IntakeError::Rejected(RejectReason::EmptySymbol)
        ));

        assert!(intake
            .store
            .find_orders(None, None, SortKey::OrderId, SortDir::Asc)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_duplicate_id_surfaces_store_error() {
        let intake = intake();
        intake
            .submit(Order::new(1, "AAPL", Side::Buy, dec!(150), 10))
            .unwrap();

        let err = intake
            .submit(Order::new(1, "AAPL", Side::Sell, dec!(160), 5))
            .unwrap_err();
        assert!(matches!(
            err,
            IntakeError::Store(StoreError::DuplicateOrder(1))
        ));
    }
}
