//! # Matchbook
//!
//! A persistent order-matching engine over a durable order/trade store.
//!
//! ## Design Principles
//!
//! - **Store-backed**: the book is a projection of the store, recomputed
//!   at the start of every pass; no cache can diverge from durable state
//! - **One match per pass**: a pass executes at most one trade and
//!   returns; callers drive draining and may interleave fairness or
//!   backpressure between passes
//! - **Atomic fills**: a trade and its two order mutations commit as one
//!   transaction or not at all
//! - **Serialized per symbol**: passes on one symbol are mutually
//!   exclusive; distinct symbols run in parallel
//!
//! ## Architecture
//!
//! ```text
//! [Intake] --insert--> [Store (SQLite)] --project--> [BookView]
//!                            ^                           |
//!                            +--apply fill--[MatchingEngine]
//! ```

pub mod book;
pub mod engine;
pub mod error;
pub mod intake;
pub mod matching;
pub mod order;
pub mod policy;
pub mod store;

// Re-exports for convenience
pub use book::BookView;
pub use engine::Exchange;
pub use error::{IntakeError, MatchError, StoreError};
pub use intake::OrderIntake;
pub use matching::MatchingEngine;
pub use order::{Order, RejectReason, Side, Trade};
pub use policy::{MatchingPolicy, PricePriority, TimePriority};
pub use store::{FillEffect, SortDir, SortKey, SqliteStore, Store};
