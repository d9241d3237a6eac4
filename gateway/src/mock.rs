//! Mock gateway for testing — implements the `Gateway` trait with
//! configurable behavior.
//!
//! Use this in integration tests to simulate backend responses without
//! network calls.
//!
//! ```ignore
//! use certbook_gateway::mock::MockGateway;
//! use certbook::{Balances, Price};
//!
//! let gateway = MockGateway::builder()
//!     .with_balances(Balances { eur: Price(5_000_00), eua: 10, cer: 0 })
//!     .build();
//! ```

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::mpsc;

use certbook::{
    Balances, CertificateType, ExecutionResult, MarketOrderRequest, MarketTrade, OpenOrder,
    OrderBookSnapshot, OrderId, OrderPreview, PreviewRequest, Price, ReferencePrices,
};

use crate::error::GatewayError;
use crate::feed::{FeedEvent, PriceFeedSocket};
use crate::Gateway;

type Response<T> = Result<T, String>;

fn respond<T: Clone>(response: &Response<T>) -> Result<T, GatewayError> {
    response
        .clone()
        .map_err(GatewayError::Connection)
}

/// Per-endpoint canned responses. Each endpoint either returns its
/// configured value or fails with a connection error.
struct MockState {
    order_book: Response<OrderBookSnapshot>,
    trades: Response<Vec<MarketTrade>>,
    orders: Response<Vec<OpenOrder>>,
    balances: Response<Balances>,
    preview: Response<OrderPreview>,
    execution: Response<ExecutionResult>,
    prices: Response<ReferencePrices>,
}

/// Builder for `MockGateway`.
pub struct MockGatewayBuilder {
    state: MockState,
}

impl MockGatewayBuilder {
    pub fn with_order_book(mut self, snapshot: OrderBookSnapshot) -> Self {
        self.state.order_book = Ok(snapshot);
        self
    }

    pub fn with_trades(mut self, trades: Vec<MarketTrade>) -> Self {
        self.state.trades = Ok(trades);
        self
    }

    pub fn with_open_orders(mut self, orders: Vec<OpenOrder>) -> Self {
        self.state.orders = Ok(orders);
        self
    }

    pub fn with_balances(mut self, balances: Balances) -> Self {
        self.state.balances = Ok(balances);
        self
    }

    pub fn with_preview(mut self, preview: OrderPreview) -> Self {
        self.state.preview = Ok(preview);
        self
    }

    pub fn with_execution(mut self, result: ExecutionResult) -> Self {
        self.state.execution = Ok(result);
        self
    }

    pub fn with_prices(mut self, prices: ReferencePrices) -> Self {
        self.state.prices = Ok(prices);
        self
    }

    /// All executions fail with a rejection carrying this message.
    pub fn reject_executions(mut self, message: &str) -> Self {
        self.state.execution = Err(message.to_string());
        self
    }

    pub fn build(self) -> MockGateway {
        MockGateway {
            state: Mutex::new(self.state),
            calls: Mutex::new(Vec::new()),
            previews: Mutex::new(Vec::new()),
            executions: Mutex::new(Vec::new()),
        }
    }
}

/// A mock gateway that records calls and returns configurable responses.
///
/// Responses can be swapped between calls with the `set_*` / `fail_*`
/// methods, so a test can make one poll tick fail and the next succeed.
pub struct MockGateway {
    state: Mutex<MockState>,
    calls: Mutex<Vec<&'static str>>,
    previews: Mutex<Vec<PreviewRequest>>,
    executions: Mutex<Vec<MarketOrderRequest>>,
}

impl MockGateway {
    pub fn builder() -> MockGatewayBuilder {
        MockGatewayBuilder {
            state: MockState {
                order_book: Ok(OrderBookSnapshot::default()),
                trades: Ok(Vec::new()),
                orders: Ok(Vec::new()),
                balances: Ok(Balances::default()),
                preview: Ok(OrderPreview {
                    can_execute: true,
                    execution_message: None,
                    platform_fee_rate: 0.0,
                    platform_fee: Price::ZERO,
                    total_cost_net: Price::ZERO,
                    remaining_balance: Price::ZERO,
                    best_price: None,
                    worst_price: None,
                }),
                execution: Ok(ExecutionResult {
                    order_id: OrderId(1),
                    filled_quantity: 0,
                    weighted_avg_price: 0.0,
                    total_cost_gross: Price::ZERO,
                    total_cost_net: Price::ZERO,
                    platform_fee: Price::ZERO,
                    updated_balances: None,
                }),
                prices: Ok(ReferencePrices::default()),
            },
        }
    }

    /// Endpoint names in call order (for assertion in tests).
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls made to one endpoint.
    pub fn call_count(&self, endpoint: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|&&name| name == endpoint)
            .count()
    }

    /// Preview requests received, in order.
    pub fn preview_requests(&self) -> Vec<PreviewRequest> {
        self.previews.lock().unwrap().clone()
    }

    /// Execution requests received, in order.
    pub fn execution_requests(&self) -> Vec<MarketOrderRequest> {
        self.executions.lock().unwrap().clone()
    }

    pub fn set_order_book(&self, snapshot: OrderBookSnapshot) {
        self.state.lock().unwrap().order_book = Ok(snapshot);
    }

    pub fn fail_order_book(&self, message: &str) {
        self.state.lock().unwrap().order_book = Err(message.to_string());
    }

    pub fn set_balances(&self, balances: Balances) {
        self.state.lock().unwrap().balances = Ok(balances);
    }

    pub fn fail_balances(&self, message: &str) {
        self.state.lock().unwrap().balances = Err(message.to_string());
    }

    pub fn set_preview(&self, preview: OrderPreview) {
        self.state.lock().unwrap().preview = Ok(preview);
    }

    pub fn fail_preview(&self, message: &str) {
        self.state.lock().unwrap().preview = Err(message.to_string());
    }

    pub fn set_prices(&self, prices: ReferencePrices) {
        self.state.lock().unwrap().prices = Ok(prices);
    }

    pub fn fail_prices(&self, message: &str) {
        self.state.lock().unwrap().prices = Err(message.to_string());
    }

    fn record(&self, endpoint: &'static str) {
        self.calls.lock().unwrap().push(endpoint);
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn order_book(
        &self,
        _certificate: CertificateType,
    ) -> Result<OrderBookSnapshot, GatewayError> {
        self.record("order_book");
        respond(&self.state.lock().unwrap().order_book)
    }

    async fn recent_trades(
        &self,
        _certificate: CertificateType,
        _limit: usize,
    ) -> Result<Vec<MarketTrade>, GatewayError> {
        self.record("recent_trades");
        respond(&self.state.lock().unwrap().trades)
    }

    async fn open_orders(&self) -> Result<Vec<OpenOrder>, GatewayError> {
        self.record("open_orders");
        respond(&self.state.lock().unwrap().orders)
    }

    async fn balances(&self) -> Result<Balances, GatewayError> {
        self.record("balances");
        respond(&self.state.lock().unwrap().balances)
    }

    async fn preview_order(&self, request: &PreviewRequest) -> Result<OrderPreview, GatewayError> {
        self.record("preview_order");
        self.previews.lock().unwrap().push(request.clone());
        respond(&self.state.lock().unwrap().preview)
    }

    async fn execute_market_order(
        &self,
        request: &MarketOrderRequest,
    ) -> Result<ExecutionResult, GatewayError> {
        self.record("execute_market_order");
        self.executions.lock().unwrap().push(request.clone());
        self.state
            .lock()
            .unwrap()
            .execution
            .clone()
            .map_err(GatewayError::Rejected)
    }

    async fn current_prices(&self) -> Result<ReferencePrices, GatewayError> {
        self.record("current_prices");
        respond(&self.state.lock().unwrap().prices)
    }
}

/// A price feed that replays a scripted event sequence per connection.
///
/// Counts connection attempts so tests can assert the at-most-one-attempt
/// rule.
pub struct ScriptedPriceFeed {
    script: Mutex<Vec<FeedEvent>>,
    connect_error: Option<String>,
    connects: AtomicUsize,
}

impl ScriptedPriceFeed {
    /// Every connection replays `events` and then ends.
    pub fn new(events: Vec<FeedEvent>) -> Self {
        Self {
            script: Mutex::new(events),
            connect_error: None,
            connects: AtomicUsize::new(0),
        }
    }

    /// Every connection attempt fails outright.
    pub fn failing(message: &str) -> Self {
        Self {
            script: Mutex::new(Vec::new()),
            connect_error: Some(message.to_string()),
            connects: AtomicUsize::new(0),
        }
    }

    /// Number of connection attempts made so far.
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceFeedSocket for ScriptedPriceFeed {
    async fn connect(&self) -> Result<mpsc::Receiver<FeedEvent>, GatewayError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.connect_error {
            return Err(GatewayError::Feed(message.clone()));
        }

        let events = self.script.lock().unwrap().clone();
        let (tx, rx) = mpsc::channel(events.len().max(1));
        for event in events {
            // Capacity matches the script, so this cannot fail.
            let _ = tx.try_send(event);
        }
        Ok(rx)
    }
}
