//! Ingredient models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stocked ingredient
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: Uuid,
    pub name: String,
    /// Unit of measure (e.g. "kg", "L", "pcs")
    pub unit: String,
    /// Reorder threshold
    pub minimum_stock: Decimal,
    /// Target level a restock should bring the ingredient back to
    pub ideal_stock: Decimal,
    /// Cached aggregate; the authoritative value is the sum of the
    /// ingredient's batch remainders
    pub current_stock: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ingredient {
    /// Whether the cached stock level is at or below the reorder threshold
    pub fn is_below_minimum(&self) -> bool {
        self.current_stock <= self.minimum_stock
    }

    /// Quantity needed to bring stock back up to the ideal level
    pub fn restock_gap(&self) -> Decimal {
        if self.current_stock >= self.ideal_stock {
            Decimal::ZERO
        } else {
            self.ideal_stock - self.current_stock
        }
    }
}
