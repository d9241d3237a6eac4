//! The user's own orders as reported by the backend.

use crate::{CertificateType, OrderId, Price, Quantity, Side, TimestampMs};

/// Status of an order in its lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum OrderStatus {
    /// Accepted, resting on the book (no fills yet)
    #[default]
    Open,
    /// Some quantity filled, remainder still on the book
    PartiallyFilled,
    /// Fully executed, no longer on the book
    Filled,
    /// Removed by user request, no longer on the book
    Cancelled,
}

impl OrderStatus {
    /// Returns true if the order is still working on the book.
    #[inline]
    pub fn is_active(self) -> bool {
        matches!(self, OrderStatus::Open | OrderStatus::PartiallyFilled)
    }
}

/// Order execution style.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum OrderKind {
    /// Consumes opposite-side liquidity immediately
    Market,
    /// Rests at a limit price
    Limit,
}

/// One of the user's orders as reported by the backend.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OpenOrder {
    /// Backend-assigned identifier
    pub id: OrderId,
    /// Certificate class the order trades
    pub certificate: CertificateType,
    /// Buy or sell
    pub side: Side,
    /// Limit price
    pub price: Price,
    /// Original quantity
    pub quantity: Quantity,
    /// Quantity still unfilled
    pub remaining: Quantity,
    /// Lifecycle status
    pub status: OrderStatus,
    /// When the backend accepted the order
    pub created_at: TimestampMs,
}

impl OpenOrder {
    /// Quantity filled so far.
    #[inline]
    pub fn filled(&self) -> Quantity {
        self.quantity.saturating_sub(self.remaining)
    }
}
