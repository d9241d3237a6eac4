//! Gateway trait and implementations for certbook.
//!
//! Provides a generic `Gateway` trait that abstracts over the trading
//! backend. Implementations:
//!
//! - **REST** ([`RestGateway`]): the production HTTP client
//! - **Mock** ([`mock::MockGateway`]): configurable in-memory fake for tests
//!
//! The price feed has its own seam, [`PriceFeedSocket`], because its
//! lifecycle (one socket attempt per view, polling as fallback) is
//! managed by the synchronizer rather than per request.
//!
//! All wire shapes are normalized in [`wire`] before they reach the
//! `certbook` data model; the rest of the stack never sees raw backend
//! payloads.

pub mod error;
pub mod feed;
pub mod mock;
pub mod rest;
pub mod wire;

pub use error::GatewayError;
pub use feed::{FeedEvent, PriceFeedSocket, WsPriceFeed};
pub use rest::RestGateway;

use async_trait::async_trait;

use certbook::{
    Balances, CertificateType, ExecutionResult, MarketOrderRequest, MarketTrade, OpenOrder,
    OrderBookSnapshot, OrderPreview, PreviewRequest, ReferencePrices,
};

/// A backend connection that can fetch market data, preview orders, and
/// execute market orders.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Get the order book for a certificate class.
    async fn order_book(
        &self,
        certificate: CertificateType,
    ) -> Result<OrderBookSnapshot, GatewayError>;

    /// Get the most recent public trades, newest first.
    async fn recent_trades(
        &self,
        certificate: CertificateType,
        limit: usize,
    ) -> Result<Vec<MarketTrade>, GatewayError>;

    /// Get the user's open orders.
    async fn open_orders(&self) -> Result<Vec<OpenOrder>, GatewayError>;

    /// Get current account balances.
    async fn balances(&self) -> Result<Balances, GatewayError>;

    /// Ask the backend to compute execution economics for an order.
    async fn preview_order(&self, request: &PreviewRequest) -> Result<OrderPreview, GatewayError>;

    /// Execute a market order. A rejection is reported as
    /// [`GatewayError::Rejected`].
    async fn execute_market_order(
        &self,
        request: &MarketOrderRequest,
    ) -> Result<ExecutionResult, GatewayError>;

    /// Get current reference prices (polling equivalent of the feed).
    async fn current_prices(&self) -> Result<ReferencePrices, GatewayError>;
}
