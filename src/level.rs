//! A single price level of the backend order book.
//!
//! Levels arrive fully aggregated from the backend: one entry per price,
//! with the total resting quantity and the number of resting orders.
//! The gateway boundary guarantees `quantity > 0` and `price > 0` before
//! a level enters the data model.

use crate::{Price, Quantity};

/// One aggregated price level as reported by the backend.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PriceLevel {
    /// Price of the level
    pub price: Price,
    /// Total quantity resting at this price
    pub quantity: Quantity,
    /// Number of orders resting at this price
    pub order_count: usize,
}

impl PriceLevel {
    /// Create a new level.
    pub fn new(price: Price, quantity: Quantity, order_count: usize) -> Self {
        Self {
            price,
            quantity,
            order_count,
        }
    }

    /// Notional value of the level (price × quantity) in cents.
    #[inline]
    pub fn notional(&self) -> i64 {
        self.price.0 * self.quantity as i64
    }
}
