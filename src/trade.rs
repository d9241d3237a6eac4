//! Public trade tape entries.

use std::fmt;

use crate::{OrderBookSnapshot, Price, Quantity, Side, TimestampMs};

/// A trade reported on the public tape.
///
/// The backend reports trades without an aggressor side; see
/// [`MarketTrade::infer_aggressor_side`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MarketTrade {
    /// Execution price
    pub price: Price,
    /// Quantity executed
    pub quantity: Quantity,
    /// When the trade occurred
    pub executed_at: TimestampMs,
}

impl MarketTrade {
    /// Returns the notional value (price × quantity) in cents.
    #[inline]
    pub fn notional(&self) -> i64 {
        self.price.0 * self.quantity as i64
    }

    /// Infer the aggressor side from the price relative to the midpoint.
    ///
    /// The backend reports trades one-sided, so the tape classifies a
    /// trade as a buy when its price is at or above the current bid/ask
    /// midpoint and a sell below it. This is a known approximation kept
    /// for backend compatibility; it misclassifies trades when the book
    /// has moved since execution. Returns `None` without a two-sided book.
    pub fn infer_aggressor_side(&self, book: &OrderBookSnapshot) -> Option<Side> {
        let mid = book.mid_price()?;
        if self.price.0 as f64 >= mid {
            Some(Side::Buy)
        } else {
            Some(Side::Sell)
        }
    }
}

impl fmt::Display for MarketTrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.quantity, self.price)
    }
}
