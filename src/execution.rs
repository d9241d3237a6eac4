//! Market-order requests and execution reports.

use crate::{Balances, CertificateType, OrderId, Price, Quantity, Side, ValidationError};

/// A validated request to execute a market order for an EUR budget.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MarketOrderRequest {
    /// Certificate class to trade
    pub certificate: CertificateType,
    /// Buy or sell
    pub side: Side,
    /// EUR budget in cents
    pub amount_eur: Price,
}

impl MarketOrderRequest {
    /// Create a request, rejecting non-positive budgets before any
    /// network round trip.
    pub fn new(
        certificate: CertificateType,
        side: Side,
        amount_eur: Price,
    ) -> Result<Self, ValidationError> {
        if amount_eur.0 <= 0 {
            return Err(ValidationError::NonPositiveAmount);
        }
        Ok(Self {
            certificate,
            side,
            amount_eur,
        })
    }
}

/// The backend's report of a completed market order.
///
/// A rejected or failed submission is reported as an error by the
/// gateway, so a value of this type always describes a fill.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExecutionResult {
    /// Backend-assigned order id
    pub order_id: OrderId,
    /// Units filled
    pub filled_quantity: Quantity,
    /// Volume-weighted average fill price in cents per unit
    pub weighted_avg_price: f64,
    /// Cost of the fills before fees, in cents
    pub total_cost_gross: Price,
    /// Cost including platform fee, in cents
    pub total_cost_net: Price,
    /// Platform fee charged, in cents
    pub platform_fee: Price,
    /// Balances after settlement, when the backend includes them
    pub updated_balances: Option<Balances>,
}
