//! Batch models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A received lot of an ingredient
///
/// Batches are the unit the FIFO deduction walks over. An exhausted batch
/// (`remaining_quantity == 0`) stays on record; it is never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub id: Uuid,
    pub ingredient_id: Uuid,
    pub batch_number: String,
    /// Quantity originally received
    pub quantity: Decimal,
    /// Quantity still available; non-increasing, never negative
    pub remaining_quantity: Decimal,
    /// FIFO ordering key
    pub received_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub cost: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

impl Batch {
    pub fn is_exhausted(&self) -> bool {
        self.remaining_quantity <= Decimal::ZERO
    }

    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry_date.is_some_and(|d| d < today)
    }
}
