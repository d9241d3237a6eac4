//! Cumulative depth annotation.
//!
//! Annotates raw price levels with running cumulative quantity and value,
//! best price first. Consumers use the final cumulative quantity as the
//! 100% reference when rendering depth bars.

use crate::{Price, PriceLevel, Quantity};

/// A price level annotated with cumulative depth at or better than it.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DepthLevel {
    /// Price of the level
    pub price: Price,
    /// Quantity resting at this price
    pub quantity: Quantity,
    /// Number of orders resting at this price
    pub order_count: usize,
    /// Total quantity at this price or better
    pub cumulative_quantity: Quantity,
    /// Total notional (cents) at this price or better
    pub cumulative_value: i64,
}

/// Annotate levels with running cumulative quantity and value.
///
/// Input must already be ordered best price first (bids descending, asks
/// ascending); the annotation is a single forward pass and preserves order.
/// Empty input yields an empty vec.
pub fn aggregate(levels: &[PriceLevel]) -> Vec<DepthLevel> {
    let mut cumulative_quantity: Quantity = 0;
    let mut cumulative_value: i64 = 0;

    levels
        .iter()
        .map(|level| {
            cumulative_quantity += level.quantity;
            cumulative_value += level.notional();
            DepthLevel {
                price: level.price,
                quantity: level.quantity,
                order_count: level.order_count,
                cumulative_quantity,
                cumulative_value,
            }
        })
        .collect()
}

/// Total depth of an annotated side: the last cumulative quantity.
///
/// Returns 0 for an empty side.
#[inline]
pub fn total_depth(annotated: &[DepthLevel]) -> Quantity {
    annotated.last().map_or(0, |l| l.cumulative_quantity)
}
