//! Wire-shape normalization.
//!
//! The backend serializes fields as either snake_case or camelCase
//! depending on the service that produced them, and sends monetary
//! values as decimal major-unit euros. Everything is normalized here —
//! the rest of the stack only ever sees the `certbook` data model with
//! integer-cent prices and whole-unit quantities.
//!
//! Derived fields the backend includes (best bid/ask, spread) are
//! ignored; they are recomputed locally from the levels.

use serde::{Deserialize, Serialize};

use certbook::{
    Balances, CertificateType, ExecutionResult, MarketOrderRequest, MarketTrade, OpenOrder,
    OrderBookSnapshot, OrderId, OrderKind, OrderPreview, OrderStatus, PreviewRequest, Price,
    PriceLevel, Quantity, ReferencePrices, Side,
};

use crate::error::GatewayError;

/// Convert decimal major-unit euros to integer cents.
#[inline]
pub fn eur_to_cents(value: f64) -> Price {
    Price((value * 100.0).round() as i64)
}

/// Convert integer cents to decimal major-unit euros.
#[inline]
pub fn cents_to_eur(price: Price) -> f64 {
    price.0 as f64 / 100.0
}

#[inline]
fn units(value: f64) -> Quantity {
    value.round().max(0.0) as Quantity
}

fn side_to_wire(side: Side) -> &'static str {
    match side {
        Side::Buy => "buy",
        Side::Sell => "sell",
    }
}

fn side_from_wire(raw: &str) -> Result<Side, GatewayError> {
    match raw.to_ascii_lowercase().as_str() {
        "buy" => Ok(Side::Buy),
        "sell" => Ok(Side::Sell),
        other => Err(GatewayError::Malformed(format!("unknown side: {other}"))),
    }
}

fn status_from_wire(raw: &str) -> Result<OrderStatus, GatewayError> {
    match raw.to_ascii_lowercase().as_str() {
        "open" | "new" => Ok(OrderStatus::Open),
        "partially_filled" | "partiallyfilled" | "partial" => Ok(OrderStatus::PartiallyFilled),
        "filled" => Ok(OrderStatus::Filled),
        "cancelled" | "canceled" => Ok(OrderStatus::Cancelled),
        other => Err(GatewayError::Malformed(format!(
            "unknown order status: {other}"
        ))),
    }
}

fn certificate_from_wire(raw: &str) -> Result<CertificateType, GatewayError> {
    raw.parse()
        .map_err(|e: certbook::UnknownCertificate| GatewayError::Malformed(e.to_string()))
}

// === Responses ===

/// One order-book level as sent by the backend.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireLevel {
    pub price: f64,
    pub quantity: f64,
    #[serde(alias = "order_count", default)]
    pub order_count: usize,
}

impl WireLevel {
    /// Normalize into the data model; levels violating the
    /// `price > 0` / `quantity > 0` invariants are dropped.
    pub fn normalize(self) -> Option<PriceLevel> {
        let price = eur_to_cents(self.price);
        let quantity = units(self.quantity);
        if price.0 <= 0 || quantity == 0 {
            return None;
        }
        Some(PriceLevel::new(price, quantity, self.order_count))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireOrderBook {
    #[serde(default)]
    pub bids: Vec<WireLevel>,
    #[serde(default)]
    pub asks: Vec<WireLevel>,
    #[serde(alias = "last_price", default)]
    pub last_price: Option<f64>,
    #[serde(alias = "captured_at", default)]
    pub captured_at: Option<i64>,
}

impl WireOrderBook {
    pub fn normalize(self) -> OrderBookSnapshot {
        OrderBookSnapshot {
            bids: self.bids.into_iter().filter_map(WireLevel::normalize).collect(),
            asks: self.asks.into_iter().filter_map(WireLevel::normalize).collect(),
            last_price: self.last_price.map(eur_to_cents),
            captured_at: self.captured_at.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTrade {
    pub price: f64,
    pub quantity: f64,
    #[serde(alias = "executed_at", default)]
    pub executed_at: Option<i64>,
}

impl WireTrade {
    pub fn normalize(self) -> MarketTrade {
        MarketTrade {
            price: eur_to_cents(self.price),
            quantity: units(self.quantity),
            executed_at: self.executed_at.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireOrder {
    pub id: u64,
    #[serde(alias = "certificate_type")]
    pub certificate_type: String,
    pub side: String,
    pub price: f64,
    pub quantity: f64,
    #[serde(alias = "remaining_quantity")]
    pub remaining_quantity: f64,
    pub status: String,
    #[serde(alias = "created_at", default)]
    pub created_at: Option<i64>,
}

impl WireOrder {
    pub fn normalize(self) -> Result<OpenOrder, GatewayError> {
        Ok(OpenOrder {
            id: OrderId(self.id),
            certificate: certificate_from_wire(&self.certificate_type)?,
            side: side_from_wire(&self.side)?,
            price: eur_to_cents(self.price),
            quantity: units(self.quantity),
            remaining: units(self.remaining_quantity),
            status: status_from_wire(&self.status)?,
            created_at: self.created_at.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct WireBalances {
    pub eur: f64,
    #[serde(default)]
    pub eua: f64,
    #[serde(default)]
    pub cer: f64,
}

impl WireBalances {
    pub fn normalize(self) -> Balances {
        Balances {
            eur: eur_to_cents(self.eur),
            eua: units(self.eua),
            cer: units(self.cer),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WirePreview {
    #[serde(alias = "can_execute")]
    pub can_execute: bool,
    #[serde(alias = "execution_message", default)]
    pub execution_message: Option<String>,
    #[serde(alias = "platform_fee_rate", default)]
    pub platform_fee_rate: f64,
    #[serde(alias = "platform_fee_amount", default)]
    pub platform_fee_amount: f64,
    #[serde(alias = "total_cost_net", default)]
    pub total_cost_net: f64,
    #[serde(alias = "remaining_balance", default)]
    pub remaining_balance: f64,
    #[serde(alias = "best_price", default)]
    pub best_price: Option<f64>,
    #[serde(alias = "worst_price", default)]
    pub worst_price: Option<f64>,
}

impl WirePreview {
    pub fn normalize(self) -> OrderPreview {
        OrderPreview {
            can_execute: self.can_execute,
            execution_message: self.execution_message,
            platform_fee_rate: self.platform_fee_rate,
            platform_fee: eur_to_cents(self.platform_fee_amount),
            total_cost_net: eur_to_cents(self.total_cost_net),
            remaining_balance: eur_to_cents(self.remaining_balance),
            best_price: self.best_price.map(eur_to_cents),
            worst_price: self.worst_price.map(eur_to_cents),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireExecution {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(alias = "order_id", default)]
    pub order_id: u64,
    #[serde(alias = "filled_quantity", default)]
    pub filled_quantity: f64,
    #[serde(alias = "weighted_avg_price", default)]
    pub weighted_avg_price: f64,
    #[serde(alias = "total_cost_gross", default)]
    pub total_cost_gross: f64,
    #[serde(alias = "total_cost_net", default)]
    pub total_cost_net: f64,
    #[serde(alias = "platform_fee", default)]
    pub platform_fee: f64,
    #[serde(alias = "updated_balances", default)]
    pub updated_balances: Option<WireBalances>,
    #[serde(alias = "error_message", default)]
    pub error_message: Option<String>,
}

fn default_success() -> bool {
    true
}

impl WireExecution {
    /// A backend report with `success: false` is an error, not a result;
    /// a value of [`ExecutionResult`] always describes a fill.
    pub fn normalize(self) -> Result<ExecutionResult, GatewayError> {
        if !self.success {
            return Err(GatewayError::Rejected(
                self.error_message
                    .unwrap_or_else(|| "execution failed".into()),
            ));
        }
        Ok(ExecutionResult {
            order_id: OrderId(self.order_id),
            filled_quantity: units(self.filled_quantity),
            weighted_avg_price: self.weighted_avg_price * 100.0,
            total_cost_gross: eur_to_cents(self.total_cost_gross),
            total_cost_net: eur_to_cents(self.total_cost_net),
            platform_fee: eur_to_cents(self.platform_fee),
            updated_balances: self.updated_balances.map(WireBalances::normalize),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WirePrices {
    pub eua: f64,
    pub cer: f64,
    #[serde(alias = "updated_at", default)]
    pub updated_at: Option<i64>,
}

impl WirePrices {
    pub fn normalize(self) -> ReferencePrices {
        ReferencePrices {
            eua: eur_to_cents(self.eua),
            cer: eur_to_cents(self.cer),
            updated_at: self.updated_at.unwrap_or_default(),
        }
    }
}

// === Requests ===

/// Body of a preview request, in the backend's camelCase shape.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewBody {
    pub certificate_type: &'static str,
    pub side: &'static str,
    pub amount_eur: f64,
    pub order_type: &'static str,
}

impl PreviewBody {
    pub fn from_request(request: &PreviewRequest) -> Self {
        Self {
            certificate_type: request.certificate.as_str(),
            side: side_to_wire(request.side),
            amount_eur: cents_to_eur(request.amount_eur),
            order_type: match request.kind {
                OrderKind::Market => "market",
                OrderKind::Limit => "limit",
            },
        }
    }
}

/// Body of a market-order execution request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketOrderBody {
    pub certificate_type: &'static str,
    pub side: &'static str,
    pub amount_eur: f64,
}

impl MarketOrderBody {
    pub fn from_request(request: &MarketOrderRequest) -> Self {
        Self {
            certificate_type: request.certificate.as_str(),
            side: side_to_wire(request.side),
            amount_eur: cents_to_eur(request.amount_eur),
        }
    }
}
