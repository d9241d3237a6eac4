//! Backend-authoritative order previews.

use crate::{CertificateType, OrderKind, Price, Side};

/// Parameters for a preview request.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PreviewRequest {
    /// Certificate class to trade
    pub certificate: CertificateType,
    /// Buy or sell
    pub side: Side,
    /// EUR budget in cents
    pub amount_eur: Price,
    /// Market or limit
    pub kind: OrderKind,
}

/// The backend's non-binding computation of execution economics.
///
/// This is the sole gate for enabling submission: the local
/// [`FillEstimate`](crate::FillEstimate) renders immediately, but an
/// order may only be submitted once a preview with `can_execute` has
/// resolved.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OrderPreview {
    /// Whether the backend will accept the order as specified
    pub can_execute: bool,
    /// Human-readable reason when `can_execute` is false
    pub execution_message: Option<String>,
    /// Platform fee rate, e.g. 0.005 for 0.5%
    pub platform_fee_rate: f64,
    /// Platform fee amount in cents
    pub platform_fee: Price,
    /// Total cost including fees, in cents
    pub total_cost_net: Price,
    /// EUR balance remaining after execution, in cents
    pub remaining_balance: Price,
    /// Best price the order would fill at
    pub best_price: Option<Price>,
    /// Worst price the order would fill at
    pub worst_price: Option<Price>,
}
