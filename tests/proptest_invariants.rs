// Allow our euro.cents digit grouping convention (e.g., 100_00 = €100.00)
#![allow(clippy::inconsistent_digit_grouping)]

//! Property-based tests for depth and estimation invariants.

use certbook::{Price, PriceLevel, depth, estimate_market_buy};
use proptest::prelude::*;

/// Generate an ascending ask side with positive prices and quantities.
fn asks_strategy() -> impl Strategy<Value = Vec<PriceLevel>> {
    prop::collection::vec((1i64..=500_00, 1u64..=1_000, 1usize..=20), 1..40).prop_map(|raw| {
        let mut price = 0i64;
        raw.into_iter()
            .map(|(step, qty, orders)| {
                // Strictly ascending prices
                price += step;
                PriceLevel::new(Price(price), qty, orders)
            })
            .collect()
    })
}

fn budget_strategy() -> impl Strategy<Value = Price> {
    (1i64..=100_000_00).prop_map(Price)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    // ========================================================================
    // DEPTH AGGREGATION
    // ========================================================================

    /// Cumulative quantity never decreases along the side.
    #[test]
    fn cumulative_quantity_monotone(levels in asks_strategy()) {
        let annotated = depth::aggregate(&levels);

        for pair in annotated.windows(2) {
            prop_assert!(pair[0].cumulative_quantity <= pair[1].cumulative_quantity);
            prop_assert!(pair[0].cumulative_value <= pair[1].cumulative_value);
        }
    }

    /// The final cumulative quantity equals the sum of level quantities.
    #[test]
    fn total_depth_is_sum_of_quantities(levels in asks_strategy()) {
        let annotated = depth::aggregate(&levels);
        let expected: u64 = levels.iter().map(|l| l.quantity).sum();

        prop_assert_eq!(depth::total_depth(&annotated), expected);
        prop_assert_eq!(annotated.len(), levels.len());
    }

    // ========================================================================
    // FILL ESTIMATION
    // ========================================================================

    /// The estimate never spends more than the budget.
    #[test]
    fn estimate_within_budget(levels in asks_strategy(), budget in budget_strategy()) {
        if let Some(estimate) = estimate_market_buy(&levels, budget) {
            prop_assert!(estimate.total_cost.0 <= budget.0);
            prop_assert!(estimate.filled_quantity > 0);
        }
    }

    /// No additional whole unit is affordable at the next consumable price.
    #[test]
    fn remainder_cannot_afford_next_unit(levels in asks_strategy(), budget in budget_strategy()) {
        if let Some(estimate) = estimate_market_buy(&levels, budget) {
            let total_depth: u64 = levels.iter().map(|l| l.quantity).sum();
            if estimate.filled_quantity < total_depth {
                // Find the first level with unconsumed quantity: the walk
                // stops there, so one more unit at its price must not fit.
                let mut consumed = estimate.filled_quantity;
                let next_price = levels
                    .iter()
                    .find(|l| {
                        if consumed >= l.quantity {
                            consumed -= l.quantity;
                            false
                        } else {
                            true
                        }
                    })
                    .map(|l| l.price.0)
                    .unwrap();
                let remainder = budget.0 - estimate.total_cost.0;
                prop_assert!(
                    remainder < next_price,
                    "remainder {} affords another unit at {}",
                    remainder,
                    next_price
                );
            }
        }
    }

    /// Filled quantity never exceeds the side's total depth.
    #[test]
    fn estimate_bounded_by_depth(levels in asks_strategy(), budget in budget_strategy()) {
        if let Some(estimate) = estimate_market_buy(&levels, budget) {
            let total_depth: u64 = levels.iter().map(|l| l.quantity).sum();
            prop_assert!(estimate.filled_quantity <= total_depth);
            prop_assert!(estimate.levels_touched <= levels.len());
        }
    }

    /// Estimation is a pure function of (asks, budget).
    #[test]
    fn estimate_is_idempotent(levels in asks_strategy(), budget in budget_strategy()) {
        let first = estimate_market_buy(&levels, budget);
        let second = estimate_market_buy(&levels, budget);
        prop_assert_eq!(first, second);
    }

    /// A larger budget never buys fewer units.
    #[test]
    fn estimate_monotone_in_budget(levels in asks_strategy(), budget in budget_strategy()) {
        let smaller = estimate_market_buy(&levels, budget)
            .map_or(0, |e| e.filled_quantity);
        let larger = estimate_market_buy(&levels, Price(budget.0 + 100_00))
            .map_or(0, |e| e.filled_quantity);
        prop_assert!(larger >= smaller);
    }
}
