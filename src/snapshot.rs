//! Order book snapshots for market data.

use crate::depth::{self, DepthLevel};
use crate::{Price, PriceLevel, Quantity, TimestampMs};

/// A snapshot of the order book at a point in time.
///
/// Snapshots are replaced wholesale on every sync tick; there is no
/// incremental patching. Structural equality is used by the synchronizer
/// to suppress redundant replacements.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OrderBookSnapshot {
    /// Bid levels (highest price first)
    pub bids: Vec<PriceLevel>,
    /// Ask levels (lowest price first)
    pub asks: Vec<PriceLevel>,
    /// Price of the most recent trade, if any
    pub last_price: Option<Price>,
    /// When the backend captured the snapshot
    pub captured_at: TimestampMs,
}

impl OrderBookSnapshot {
    /// Returns the best bid price, if any.
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.first().map(|l| l.price)
    }

    /// Returns the best ask price, if any.
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.first().map(|l| l.price)
    }

    /// Returns the spread (best ask − best bid) in cents, if both exist.
    pub fn spread(&self) -> Option<i64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask.0 - bid.0),
            _ => None,
        }
    }

    /// Returns the mid price ((best bid + best ask) / 2), if both exist.
    pub fn mid_price(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid.0 + ask.0) as f64 / 2.0),
            _ => None,
        }
    }

    /// Returns total bid quantity across all levels.
    pub fn total_bid_quantity(&self) -> Quantity {
        self.bids.iter().map(|l| l.quantity).sum()
    }

    /// Returns total ask quantity across all levels.
    pub fn total_ask_quantity(&self) -> Quantity {
        self.asks.iter().map(|l| l.quantity).sum()
    }

    /// Bid levels annotated with cumulative depth.
    pub fn cumulative_bids(&self) -> Vec<DepthLevel> {
        depth::aggregate(&self.bids)
    }

    /// Ask levels annotated with cumulative depth.
    pub fn cumulative_asks(&self) -> Vec<DepthLevel> {
        depth::aggregate(&self.asks)
    }

    /// Returns true if neither side has any levels.
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> OrderBookSnapshot {
        OrderBookSnapshot {
            bids: vec![
                PriceLevel::new(Price(100_00), 150, 2),
                PriceLevel::new(Price(99_00), 200, 1),
            ],
            asks: vec![
                PriceLevel::new(Price(101_00), 75, 1),
                PriceLevel::new(Price(102_00), 150, 3),
            ],
            last_price: Some(Price(100_50)),
            captured_at: 1_700_000_000_000,
        }
    }

    #[test]
    fn empty_snapshot() {
        let snap = OrderBookSnapshot::default();

        assert!(snap.is_empty());
        assert_eq!(snap.best_bid(), None);
        assert_eq!(snap.best_ask(), None);
        assert_eq!(snap.spread(), None);
        assert_eq!(snap.mid_price(), None);
        assert_eq!(snap.total_bid_quantity(), 0);
    }

    #[test]
    fn derived_values() {
        let snap = snapshot();

        assert_eq!(snap.best_bid(), Some(Price(100_00)));
        assert_eq!(snap.best_ask(), Some(Price(101_00)));
        assert_eq!(snap.spread(), Some(100)); // €1.00
        assert_eq!(snap.mid_price(), Some(100_50.0));
        assert_eq!(snap.total_bid_quantity(), 350);
        assert_eq!(snap.total_ask_quantity(), 225);
    }

    #[test]
    fn one_sided_book_has_no_spread() {
        let mut snap = snapshot();
        snap.asks.clear();

        assert_eq!(snap.best_bid(), Some(Price(100_00)));
        assert_eq!(snap.best_ask(), None);
        assert_eq!(snap.spread(), None);
        assert_eq!(snap.mid_price(), None);
        assert!(!snap.is_empty());
    }

    #[test]
    fn cumulative_sides() {
        let snap = snapshot();
        let asks = snap.cumulative_asks();

        assert_eq!(asks[0].cumulative_quantity, 75);
        assert_eq!(asks[1].cumulative_quantity, 225);

        let bids = snap.cumulative_bids();
        assert_eq!(bids[1].cumulative_quantity, 350);
    }

    #[test]
    fn structural_equality_for_dedup() {
        assert_eq!(snapshot(), snapshot());

        let mut changed = snapshot();
        changed.asks[0].quantity -= 1;
        assert_ne!(snapshot(), changed);
    }
}
