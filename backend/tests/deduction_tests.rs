//! FIFO deduction engine tests
//!
//! Tests for the batch deduction core including:
//! - FIFO ordering and tie-break determinism
//! - Conservation of allocated quantity
//! - Shortage report completeness
//! - Sufficiency-check idempotence

use chrono::{Days, NaiveDate};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

use shared::{
    available_quantity, check_sufficiency, deduct, order_fifo, BatchSnapshot, DeductionError,
    StockLine, StockRequirement,
};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn batch(number: &str, remaining: &str, received: (i32, u32, u32)) -> BatchSnapshot {
    BatchSnapshot {
        id: Uuid::new_v4(),
        batch_number: number.to_string(),
        remaining_quantity: dec(remaining),
        received_date: NaiveDate::from_ymd_opt(received.0, received.1, received.2).unwrap(),
    }
}

fn requirement(name: &str, needed: &str) -> StockRequirement {
    StockRequirement {
        ingredient_id: Uuid::new_v4(),
        name: name.to_string(),
        unit: "kg".to_string(),
        needed: dec(needed),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Oldest batch drains first, remainder comes from the next one
    #[test]
    fn test_fifo_takes_oldest_first() {
        let mut batches = vec![
            batch("BAT-2024-00001", "5", (2024, 1, 1)),
            batch("BAT-2024-00002", "10", (2024, 1, 2)),
        ];
        order_fifo(&mut batches);

        let allocations = deduct(&mut batches, dec("7")).unwrap();

        assert_eq!(allocations.len(), 2);
        assert_eq!(allocations[0].batch_id, batches[0].id);
        assert_eq!(allocations[0].quantity_taken, dec("5"));
        assert_eq!(allocations[1].batch_id, batches[1].id);
        assert_eq!(allocations[1].quantity_taken, dec("2"));
        assert_eq!(batches[0].remaining_quantity, Decimal::ZERO);
        assert_eq!(batches[1].remaining_quantity, dec("8"));
    }

    /// A deduction can span more than two batches
    #[test]
    fn test_fifo_spans_many_batches() {
        let mut batches = vec![
            batch("BAT-2024-00001", "2", (2024, 1, 1)),
            batch("BAT-2024-00002", "2", (2024, 1, 2)),
            batch("BAT-2024-00003", "2", (2024, 1, 3)),
            batch("BAT-2024-00004", "10", (2024, 1, 4)),
        ];
        order_fifo(&mut batches);

        let allocations = deduct(&mut batches, dec("7")).unwrap();

        let taken: Vec<Decimal> = allocations.iter().map(|a| a.quantity_taken).collect();
        assert_eq!(taken, vec![dec("2"), dec("2"), dec("2"), dec("1")]);
        assert_eq!(batches[3].remaining_quantity, dec("9"));
    }

    /// Same received date falls back to batch number
    #[test]
    fn test_tie_break_is_batch_number() {
        let mut batches = vec![
            batch("BAT-2024-00031", "4", (2024, 2, 1)),
            batch("BAT-2024-00007", "4", (2024, 2, 1)),
        ];
        order_fifo(&mut batches);

        let allocations = deduct(&mut batches, dec("4")).unwrap();

        assert_eq!(allocations.len(), 1);
        assert_eq!(batches[0].batch_number, "BAT-2024-00007");
        assert_eq!(batches[0].remaining_quantity, Decimal::ZERO);
        assert_eq!(batches[1].remaining_quantity, dec("4"));
    }

    /// Exactly draining the stock is not a shortfall
    #[test]
    fn test_exact_exhaustion_succeeds() {
        let mut batches = vec![
            batch("BAT-2024-00001", "3", (2024, 1, 1)),
            batch("BAT-2024-00002", "4", (2024, 1, 2)),
        ];
        order_fifo(&mut batches);

        let allocations = deduct(&mut batches, dec("7")).unwrap();

        let total: Decimal = allocations.iter().map(|a| a.quantity_taken).sum();
        assert_eq!(total, dec("7"));
        assert!(batches.iter().all(|b| b.remaining_quantity == Decimal::ZERO));
    }

    /// Shortfall carries the undeducted remainder
    #[test]
    fn test_shortfall_remainder() {
        let mut batches = vec![batch("BAT-2024-00001", "4", (2024, 1, 1))];
        order_fifo(&mut batches);

        let err = deduct(&mut batches, dec("9")).unwrap_err();
        let DeductionError::Shortfall {
            requested,
            remaining,
        } = err;
        assert_eq!(requested, dec("9"));
        assert_eq!(remaining, dec("5"));
    }

    /// Every short ingredient appears in the report, sufficient ones do not
    #[test]
    fn test_shortage_report_is_complete() {
        let lines = vec![
            StockLine {
                requirement: requirement("Flour", "100"),
                batches: vec![batch("BAT-2024-00001", "10", (2024, 1, 1))],
            },
            StockLine {
                requirement: requirement("Butter", "50"),
                batches: vec![batch("BAT-2024-00002", "60", (2024, 1, 1))],
            },
            StockLine {
                requirement: requirement("Vanilla", "2"),
                batches: vec![],
            },
        ];

        let shortages = check_sufficiency(&lines).unwrap_err();

        assert_eq!(shortages.len(), 2);
        assert_eq!(shortages[0].name, "Flour");
        assert_eq!(shortages[0].needed, dec("100"));
        assert_eq!(shortages[0].available, dec("10"));
        assert_eq!(shortages[1].name, "Vanilla");
        assert_eq!(shortages[1].available, Decimal::ZERO);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for generating batch sets with unique batch numbers
    fn batches_strategy(max: usize) -> impl Strategy<Value = Vec<BatchSnapshot>> {
        prop::collection::vec((0i64..=5000i64, 0u64..30), 1..max).prop_map(|entries| {
            entries
                .into_iter()
                .enumerate()
                .map(|(i, (tenths, day_offset))| BatchSnapshot {
                    id: Uuid::new_v4(),
                    batch_number: format!("BAT-2024-{:05}", i + 1),
                    remaining_quantity: Decimal::new(tenths, 1),
                    received_date: NaiveDate::from_ymd_opt(2024, 1, 1)
                        .unwrap()
                        .checked_add_days(Days::new(day_offset))
                        .unwrap(),
                })
                .collect()
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Allocations sum to the requested amount exactly, and every batch
        /// decrement is accounted for by exactly one allocation
        #[test]
        fn prop_allocations_conserve_quantity(
            mut batches in batches_strategy(8),
            numerator in 1i64..=10000i64,
        ) {
            order_fifo(&mut batches);
            let available = available_quantity(&batches);
            let amount = (available * Decimal::new(numerator, 4)).round_dp(3);
            prop_assume!(amount > Decimal::ZERO);

            let before = batches.clone();
            let allocations = deduct(&mut batches, amount).unwrap();

            let total: Decimal = allocations.iter().map(|a| a.quantity_taken).sum();
            prop_assert_eq!(total, amount);

            let taken_by_batch: HashMap<Uuid, Decimal> = allocations
                .iter()
                .map(|a| (a.batch_id, a.quantity_taken))
                .collect();
            // one allocation per batch at most
            prop_assert_eq!(taken_by_batch.len(), allocations.len());

            for (orig, after) in before.iter().zip(batches.iter()) {
                let taken = taken_by_batch
                    .get(&orig.id)
                    .copied()
                    .unwrap_or(Decimal::ZERO);
                prop_assert_eq!(orig.remaining_quantity - after.remaining_quantity, taken);
                prop_assert!(after.remaining_quantity >= Decimal::ZERO);
            }
        }

        /// A newer batch is only touched once every older batch is empty
        #[test]
        fn prop_fifo_order_is_respected(
            mut batches in batches_strategy(8),
            numerator in 1i64..=10000i64,
        ) {
            order_fifo(&mut batches);
            let available = available_quantity(&batches);
            let amount = (available * Decimal::new(numerator, 4)).round_dp(3);
            prop_assume!(amount > Decimal::ZERO);

            let allocations = deduct(&mut batches, amount).unwrap();

            let position: HashMap<Uuid, usize> = batches
                .iter()
                .enumerate()
                .map(|(i, b)| (b.id, i))
                .collect();
            let drawn: Vec<usize> = allocations.iter().map(|a| position[&a.batch_id]).collect();

            // allocations come out in walk order
            prop_assert!(drawn.windows(2).all(|w| w[0] < w[1]));

            // everything older than the newest batch drawn from is exhausted
            if let Some(&last) = drawn.last() {
                for older in &batches[..last] {
                    prop_assert_eq!(older.remaining_quantity, Decimal::ZERO);
                }
            }
        }

        /// The same batch set allocates identically regardless of the order
        /// the rows arrived in
        #[test]
        fn prop_allocation_is_deterministic(
            batches in batches_strategy(8),
            numerator in 1i64..=10000i64,
        ) {
            let mut forward = batches.clone();
            let mut reversed = batches;
            reversed.reverse();

            order_fifo(&mut forward);
            order_fifo(&mut reversed);
            prop_assert_eq!(&forward, &reversed);

            let available = available_quantity(&forward);
            let amount = (available * Decimal::new(numerator, 4)).round_dp(3);
            prop_assume!(amount > Decimal::ZERO);

            let first = deduct(&mut forward, amount).unwrap();
            let second = deduct(&mut reversed, amount).unwrap();
            prop_assert_eq!(first, second);
        }

        /// Requesting more than is available fails with the exact remainder
        /// (and never silently under-deducts)
        #[test]
        fn prop_overdraw_reports_exact_shortfall(
            mut batches in batches_strategy(8),
            extra_tenths in 1i64..=5000i64,
        ) {
            order_fifo(&mut batches);
            let available = available_quantity(&batches);
            let extra = Decimal::new(extra_tenths, 1);
            let amount = available + extra;

            let err = deduct(&mut batches, amount).unwrap_err();
            let DeductionError::Shortfall { requested, remaining } = err;
            prop_assert_eq!(requested, amount);
            prop_assert_eq!(remaining, extra);
        }

        /// Checking sufficiency is a pure read: two calls over the same
        /// lines agree
        #[test]
        fn prop_sufficiency_check_is_idempotent(
            batches in batches_strategy(8),
            needed_tenths in 0i64..=50000i64,
        ) {
            let lines = vec![StockLine {
                requirement: StockRequirement {
                    ingredient_id: Uuid::new_v4(),
                    name: "Flour".to_string(),
                    unit: "kg".to_string(),
                    needed: Decimal::new(needed_tenths, 1),
                },
                batches,
            }];

            let first = check_sufficiency(&lines);
            let second = check_sufficiency(&lines);
            prop_assert_eq!(first, second);
        }

        /// Available stock shrinks by exactly the deducted amount
        #[test]
        fn prop_available_decreases_by_amount(
            mut batches in batches_strategy(8),
            numerator in 1i64..=10000i64,
        ) {
            order_fifo(&mut batches);
            let available = available_quantity(&batches);
            let amount = (available * Decimal::new(numerator, 4)).round_dp(3);
            prop_assume!(amount > Decimal::ZERO);

            deduct(&mut batches, amount).unwrap();
            prop_assert_eq!(available_quantity(&batches), available - amount);
        }
    }
}
