// Allow our euro.cents digit grouping convention (e.g., 100_00 = €100.00)
#![allow(clippy::inconsistent_digit_grouping)]

//! certbook-desk: trading desk orchestration for carbon-certificate markets.
//!
//! Keeps a local view of order-book depth, balances, and reference
//! prices consistent with the backend without blocking, and executes
//! gated market orders. Three moving parts per desk lifetime:
//!
//! - [`market_sync::MarketDataSync`] polls the book, trade tape, open
//!   orders, and balances on a fixed cadence into a [`store::MarketStore`];
//! - [`feed::PriceFeedSync`] keeps reference prices fresh over a polling
//!   loop plus at most one WebSocket attempt;
//! - [`execute::ExecutionCoordinator`] submits market orders single-flight,
//!   gated by [`preview::PreviewReconciler`].
//!
//! Teardown is deterministic: every task runs under a [`scope::Scope`]
//! and drops late results once the scope is cancelled.

pub mod config;
pub mod desk;
pub mod error;
pub mod execute;
pub mod feed;
pub mod market_sync;
pub mod preview;
pub mod scope;
pub mod store;
