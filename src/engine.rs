//! Exchange façade: one store handle, one policy, serialized passes per
//! symbol.
//!
//! A matching pass is a read-scan-mutate sequence that is not atomic
//! against concurrent writers, so passes on one symbol are mutually
//! exclusive. Distinct symbols never share orders and run in parallel.
//! Intake may run concurrently with matching; the store's own write
//! isolation keeps half-written orders out of a scan.

use std::sync::{Arc, Mutex};

use rustc_hash::FxHashMap;

use crate::book::BookView;
use crate::error::{IntakeError, MatchError, StoreError};
use crate::intake::OrderIntake;
use crate::matching::MatchingEngine;
use crate::order::{Order, Trade};
use crate::policy::MatchingPolicy;
use crate::store::Store;

/// Process-level entry point wiring intake and the matching engine to a
/// shared store handle.
pub struct Exchange<S, P> {
    store: Arc<S>,
    intake: OrderIntake<S>,
    matcher: MatchingEngine<S, P>,
    /// One lock per symbol; a pass holds it across its read-scan-mutate
    symbol_locks: Mutex<FxHashMap<String, Arc<Mutex<()>>>>,
}

impl<S: Store, P: MatchingPolicy> Exchange<S, P> {
    /// Take ownership of a store and wire up intake and matching.
    pub fn new(store: S, policy: P) -> Self {
        let store = Arc::new(store);
        Self {
            intake: OrderIntake::new(Arc::clone(&store)),
            matcher: MatchingEngine::new(Arc::clone(&store), policy),
            store,
            symbol_locks: Mutex::new(FxHashMap::default()),
        }
    }

    /// Direct access to the underlying store, for inspection surfaces.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Submit a new order; no matching side effects.
    pub fn submit(&self, order: Order) -> Result<(), IntakeError> {
        self.intake.submit(order)
    }

    /// Run one matching pass for `symbol`, serialized against other
    /// passes on the same symbol.
    pub fn attempt_match(&self, symbol: &str) -> Result<Option<Trade>, MatchError> {
        let lock = self.symbol_lock(symbol);
        let _guard = lock.lock().unwrap();
        self.matcher.attempt_match(symbol)
    }

    /// Drain `symbol` to quiescence, holding its lock for the whole run.
    pub fn drain(&self, symbol: &str) -> Result<Vec<Trade>, MatchError> {
        let lock = self.symbol_lock(symbol);
        let _guard = lock.lock().unwrap();
        self.matcher.drain(symbol)
    }

    /// Project the current book for `symbol` under the active policy.
    pub fn book(&self, symbol: &str) -> Result<BookView, StoreError> {
        BookView::load(self.store.as_ref(), symbol, self.matcher.policy())
    }

    fn symbol_lock(&self, symbol: &str) -> Arc<Mutex<()>> {
        let mut locks = self.symbol_locks.lock().unwrap();
        locks
            .entry(symbol.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
