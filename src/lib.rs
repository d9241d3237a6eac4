// Allow our euro.cents digit grouping convention (e.g., 100_00 = €100.00)
#![allow(clippy::inconsistent_digit_grouping)]

//! # certbook
//!
//! Market-data model and market-order execution estimator for
//! carbon-certificate trading interfaces.
//!
//! The crate is the pure, synchronous core of a trading front end: it
//! models order-book snapshots, annotates depth, and re-derives the
//! economics of a market buy from raw ask depth so the interface can show
//! filled quantity, cost, and average price before any backend round
//! trip. Synchronization and execution live in the companion
//! `certbook-gateway` and `certbook-desk` crates.
//!
//! ## Price Representation
//!
//! Monetary values are stored as [`i64`] euro cents:
//!
//! ```
//! use certbook::Price;
//!
//! let price = Price(100_50); // €100.50
//! assert_eq!(format!("{}", price), "€100.50");
//! ```
//!
//! ## Fill Estimation
//!
//! A market buy walks ask depth best price first, consuming whole levels
//! while the budget covers them and whole units at the first partial
//! level:
//!
//! ```
//! use certbook::{estimate_market_buy, Price, PriceLevel};
//!
//! let asks = vec![
//!     PriceLevel::new(Price(100_00), 10, 1),
//!     PriceLevel::new(Price(101_00), 5, 2),
//! ];
//!
//! let estimate = estimate_market_buy(&asks, Price(1515_00)).unwrap();
//! assert_eq!(estimate.filled_quantity, 15);
//! assert_eq!(estimate.total_cost, Price(1505_00));
//! assert_eq!(estimate.levels_touched, 2);
//!
//! // A budget below one unit at the best price buys nothing.
//! assert!(estimate_market_buy(&asks, Price(50_00)).is_none());
//! ```
//!
//! ## Depth Annotation
//!
//! ```
//! use certbook::{depth, Price, PriceLevel};
//!
//! let bids = vec![
//!     PriceLevel::new(Price(100_00), 10, 1),
//!     PriceLevel::new(Price(99_00), 20, 3),
//! ];
//!
//! let annotated = depth::aggregate(&bids);
//! assert_eq!(annotated[1].cumulative_quantity, 30);
//! assert_eq!(depth::total_depth(&annotated), 30);
//! ```

mod balance;
pub mod depth;
mod error;
mod estimate;
mod execution;
mod level;
mod order;
mod preview;
mod prices;
mod side;
mod snapshot;
mod trade;
mod types;

// Re-export public API
pub use balance::Balances;
pub use depth::DepthLevel;
pub use error::ValidationError;
pub use estimate::{FillEstimate, estimate_market_buy};
pub use execution::{ExecutionResult, MarketOrderRequest};
pub use level::PriceLevel;
pub use order::{OpenOrder, OrderKind, OrderStatus};
pub use preview::{OrderPreview, PreviewRequest};
pub use prices::ReferencePrices;
pub use side::Side;
pub use snapshot::OrderBookSnapshot;
pub use trade::MarketTrade;
pub use types::{CertificateType, OrderId, Price, Quantity, TimestampMs, UnknownCertificate};
