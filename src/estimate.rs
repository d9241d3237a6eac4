//! Market-buy fill estimation against ask depth.
//!
//! A greedy simulation of a market buy for a fixed EUR budget: walk the
//! asks best price first, consume whole levels while the budget covers
//! them, then take whole units at the first partial level and stop. The
//! result is what the interface shows before any round trip to the
//! backend; the backend preview remains authoritative for fees and
//! eligibility.

use crate::{Price, PriceLevel, Quantity};

/// Outcome of simulating a market buy against ask depth.
///
/// Ephemeral: recomputed whenever the budget or the book changes, never
/// stored.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FillEstimate {
    /// Whole units the budget buys
    pub filled_quantity: Quantity,
    /// Total cost of those units in cents
    pub total_cost: Price,
    /// Number of levels contributing at least one unit
    pub levels_touched: usize,
}

impl FillEstimate {
    /// Volume-weighted average price in cents per unit.
    #[inline]
    pub fn average_price(&self) -> f64 {
        self.total_cost.0 as f64 / self.filled_quantity as f64
    }
}

/// Estimate how far `budget` reaches into `asks`.
///
/// `asks` must be ordered ascending by price with each level satisfying
/// the `quantity > 0` / `price > 0` boundary invariants. For each level:
/// if the remaining budget covers the whole level, consume it; otherwise
/// take `floor(remaining / price)` whole units and stop — levels past the
/// first partial fill are never visited.
///
/// Returns `None` when the budget is non-positive, the ask side is empty,
/// or the budget does not cover one unit at the best price.
///
/// Pure and O(levels); safe to call on every input change.
pub fn estimate_market_buy(asks: &[PriceLevel], budget: Price) -> Option<FillEstimate> {
    if budget.0 <= 0 || asks.is_empty() {
        return None;
    }

    let mut remaining = budget.0;
    let mut filled_quantity: Quantity = 0;
    let mut total_cost: i64 = 0;
    let mut levels_touched = 0;

    for level in asks {
        let level_cost = level.notional();
        if remaining >= level_cost {
            filled_quantity += level.quantity;
            total_cost += level_cost;
            remaining -= level_cost;
            levels_touched += 1;
            if remaining == 0 {
                break;
            }
        } else {
            let units = (remaining / level.price.0) as Quantity;
            if units > 0 {
                let cost = level.price.0 * units as i64;
                filled_quantity += units;
                total_cost += cost;
                levels_touched += 1;
            }
            break;
        }
    }

    if filled_quantity == 0 {
        return None;
    }

    Some(FillEstimate {
        filled_quantity,
        total_cost: Price(total_cost),
        levels_touched,
    })
}
