//! FIFO batch deduction and stock-sufficiency checking
//!
//! Pure functions over in-memory batch snapshots. The backend loads locked
//! batch rows into [`BatchSnapshot`]s, validates sufficiency, then walks the
//! snapshots oldest-first; nothing here performs I/O.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Working copy of a batch row during one production event
///
/// `remaining_quantity` is decremented in place as deductions are applied,
/// so a later pass for the same ingredient (wastage after usage) sees the
/// updated remainders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSnapshot {
    pub id: Uuid,
    pub batch_number: String,
    pub remaining_quantity: Decimal,
    pub received_date: NaiveDate,
}

/// How much of a deduction a single batch satisfied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchAllocation {
    pub batch_id: Uuid,
    pub quantity_taken: Decimal,
}

/// One ingredient's total draw for a production event (usage + wastage)
#[derive(Debug, Clone)]
pub struct StockRequirement {
    pub ingredient_id: Uuid,
    pub name: String,
    pub unit: String,
    pub needed: Decimal,
}

/// A requirement paired with the batch snapshots that must cover it
#[derive(Debug, Clone)]
pub struct StockLine {
    pub requirement: StockRequirement,
    pub batches: Vec<BatchSnapshot>,
}

/// A single insufficient-stock entry in a shortage report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortage {
    pub ingredient_id: Uuid,
    pub name: String,
    pub needed: Decimal,
    pub available: Decimal,
    pub unit: String,
}

/// Errors from the deduction walk
#[derive(Debug, Error)]
pub enum DeductionError {
    /// The batches ran dry with part of the amount still undeducted.
    /// Sufficiency is checked before any deduction, so hitting this means
    /// the check and the walk saw different data.
    #[error("batches exhausted with {remaining} of {requested} still undeducted")]
    Shortfall {
        requested: Decimal,
        remaining: Decimal,
    },
}

/// Order batches oldest-received first
///
/// Ties on `received_date` fall back to `batch_number`, which is unique, so
/// the order is total and repeat runs over the same data allocate
/// identically.
pub fn order_fifo(batches: &mut [BatchSnapshot]) {
    batches.sort_by(|a, b| {
        a.received_date
            .cmp(&b.received_date)
            .then_with(|| a.batch_number.cmp(&b.batch_number))
    });
}

/// Total quantity still available across a set of batches
pub fn available_quantity(batches: &[BatchSnapshot]) -> Decimal {
    batches
        .iter()
        .filter(|b| b.remaining_quantity > Decimal::ZERO)
        .map(|b| b.remaining_quantity)
        .sum()
}

/// Check every stock line, collecting every shortage
///
/// Scans all lines before failing and reports every shortage, not just the
/// first. An ingredient with no batches has `available = 0`. Pure read;
/// calling it twice over the same lines returns the same result.
pub fn check_sufficiency(lines: &[StockLine]) -> Result<(), Vec<Shortage>> {
    let shortages: Vec<Shortage> = lines
        .iter()
        .filter_map(|line| {
            let available = available_quantity(&line.batches);
            if line.requirement.needed > available {
                Some(Shortage {
                    ingredient_id: line.requirement.ingredient_id,
                    name: line.requirement.name.clone(),
                    needed: line.requirement.needed,
                    available,
                    unit: line.requirement.unit.clone(),
                })
            } else {
                None
            }
        })
        .collect();

    if shortages.is_empty() {
        Ok(())
    } else {
        Err(shortages)
    }
}

/// Deduct `amount` from batches in FIFO order
///
/// The slice must already be ordered via [`order_fifo`]. Exhausted batches
/// are skipped; each remaining batch gives up `min(remaining, still_needed)`
/// until the amount is covered. Snapshots are decremented in place. Returns
/// one allocation per batch drawn from; their quantities sum to `amount`
/// exactly, or the walk fails with [`DeductionError::Shortfall`] and the
/// caller must abort the surrounding transaction.
pub fn deduct(
    batches: &mut [BatchSnapshot],
    amount: Decimal,
) -> Result<Vec<BatchAllocation>, DeductionError> {
    let mut still_needed = amount;
    let mut allocations = Vec::new();

    for batch in batches.iter_mut() {
        if still_needed <= Decimal::ZERO {
            break;
        }
        if batch.remaining_quantity <= Decimal::ZERO {
            continue;
        }

        let take = batch.remaining_quantity.min(still_needed);
        batch.remaining_quantity -= take;
        still_needed -= take;
        allocations.push(BatchAllocation {
            batch_id: batch.id,
            quantity_taken: take,
        });
    }

    if still_needed > Decimal::ZERO {
        return Err(DeductionError::Shortfall {
            requested: amount,
            remaining: still_needed,
        });
    }

    Ok(allocations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

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

    #[test]
    fn test_order_fifo_by_received_date() {
        let mut batches = vec![
            batch("BAT-2024-00002", "10", (2024, 1, 5)),
            batch("BAT-2024-00001", "5", (2024, 1, 1)),
        ];
        order_fifo(&mut batches);
        assert_eq!(batches[0].batch_number, "BAT-2024-00001");
        assert_eq!(batches[1].batch_number, "BAT-2024-00002");
    }

    #[test]
    fn test_order_fifo_tie_break_on_batch_number() {
        let mut batches = vec![
            batch("BAT-2024-00020", "10", (2024, 1, 1)),
            batch("BAT-2024-00003", "5", (2024, 1, 1)),
        ];
        order_fifo(&mut batches);
        assert_eq!(batches[0].batch_number, "BAT-2024-00003");
    }

    #[test]
    fn test_deduct_spans_batches_oldest_first() {
        let mut batches = vec![
            batch("B1", "5", (2024, 1, 1)),
            batch("B2", "10", (2024, 1, 2)),
        ];
        let allocations = deduct(&mut batches, dec("7")).unwrap();

        assert_eq!(allocations.len(), 2);
        assert_eq!(allocations[0].quantity_taken, dec("5"));
        assert_eq!(allocations[1].quantity_taken, dec("2"));
        assert_eq!(batches[0].remaining_quantity, Decimal::ZERO);
        assert_eq!(batches[1].remaining_quantity, dec("8"));
    }

    #[test]
    fn test_deduct_skips_exhausted_batches() {
        let mut batches = vec![
            batch("B1", "0", (2024, 1, 1)),
            batch("B2", "10", (2024, 1, 2)),
        ];
        let allocations = deduct(&mut batches, dec("4")).unwrap();

        assert_eq!(allocations.len(), 1);
        assert_eq!(allocations[0].batch_id, batches[1].id);
        assert_eq!(batches[1].remaining_quantity, dec("6"));
    }

    #[test]
    fn test_deduct_shortfall_reports_remainder() {
        let mut batches = vec![batch("B1", "3", (2024, 1, 1))];
        let err = deduct(&mut batches, dec("10")).unwrap_err();

        match err {
            DeductionError::Shortfall {
                requested,
                remaining,
            } => {
                assert_eq!(requested, dec("10"));
                assert_eq!(remaining, dec("7"));
            }
        }
    }

    #[test]
    fn test_deduct_zero_amount_touches_nothing() {
        let mut batches = vec![batch("B1", "5", (2024, 1, 1))];
        let allocations = deduct(&mut batches, Decimal::ZERO).unwrap();

        assert!(allocations.is_empty());
        assert_eq!(batches[0].remaining_quantity, dec("5"));
    }

    #[test]
    fn test_second_pass_sees_updated_remainders() {
        // Usage then wastage over the same snapshots: one FIFO timeline.
        let mut batches = vec![
            batch("B1", "4", (2024, 1, 1)),
            batch("B2", "10", (2024, 1, 2)),
        ];
        let usage = deduct(&mut batches, dec("3")).unwrap();
        let wastage = deduct(&mut batches, dec("2")).unwrap();

        assert_eq!(usage, vec![BatchAllocation {
            batch_id: batches[0].id,
            quantity_taken: dec("3"),
        }]);
        // Wastage drains B1's last unit before touching B2
        assert_eq!(wastage[0].batch_id, batches[0].id);
        assert_eq!(wastage[0].quantity_taken, dec("1"));
        assert_eq!(wastage[1].batch_id, batches[1].id);
        assert_eq!(wastage[1].quantity_taken, dec("1"));
    }

    #[test]
    fn test_check_sufficiency_collects_every_shortage() {
        let flour = StockLine {
            requirement: StockRequirement {
                ingredient_id: Uuid::new_v4(),
                name: "Flour".to_string(),
                unit: "kg".to_string(),
                needed: dec("100"),
            },
            batches: vec![batch("B1", "10", (2024, 1, 1))],
        };
        let butter = StockLine {
            requirement: StockRequirement {
                ingredient_id: Uuid::new_v4(),
                name: "Butter".to_string(),
                unit: "kg".to_string(),
                needed: dec("50"),
            },
            batches: vec![batch("B2", "60", (2024, 1, 1))],
        };
        let yeast = StockLine {
            requirement: StockRequirement {
                ingredient_id: Uuid::new_v4(),
                name: "Yeast".to_string(),
                unit: "g".to_string(),
                needed: dec("5"),
            },
            batches: vec![],
        };

        let shortages = check_sufficiency(&[flour, butter, yeast]).unwrap_err();

        assert_eq!(shortages.len(), 2);
        assert_eq!(shortages[0].name, "Flour");
        assert_eq!(shortages[0].needed, dec("100"));
        assert_eq!(shortages[0].available, dec("10"));
        // No batches at all reads as zero available
        assert_eq!(shortages[1].name, "Yeast");
        assert_eq!(shortages[1].available, Decimal::ZERO);
    }

    #[test]
    fn test_check_sufficiency_exact_cover_passes() {
        let line = StockLine {
            requirement: StockRequirement {
                ingredient_id: Uuid::new_v4(),
                name: "Sugar".to_string(),
                unit: "kg".to_string(),
                needed: dec("15"),
            },
            batches: vec![
                batch("B1", "5", (2024, 1, 1)),
                batch("B2", "10", (2024, 1, 2)),
            ],
        };
        assert!(check_sufficiency(&[line]).is_ok());
    }

    #[test]
    fn test_available_quantity_ignores_negative_remainders() {
        let batches = vec![
            batch("B1", "5", (2024, 1, 1)),
            batch("B2", "0", (2024, 1, 2)),
        ];
        assert_eq!(available_quantity(&batches), dec("5"));
    }
}
