//! Production and usage-ledger models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One production event
///
/// Immutable once created; the usage ledger hangs off it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionRecord {
    pub id: Uuid,
    /// Opaque reference to the recipe being produced
    pub recipe_id: Uuid,
    /// Quantity of the recipe produced
    pub quantity: Decimal,
    /// Production run identifier, e.g. "PRD-2025-08-06-1A2B3C"
    pub batch_number: String,
    pub notes: Option<String>,
    pub recorded_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Why an ingredient was drawn from stock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageReason {
    Production,
    ProductionWastage,
}

impl UsageReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            UsageReason::Production => "Production",
            UsageReason::ProductionWastage => "Production wastage",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Production" => Some(UsageReason::Production),
            "Production wastage" => Some(UsageReason::ProductionWastage),
            _ => None,
        }
    }
}

/// One ingredient draw for one production event
///
/// Productive use and wastage of the same ingredient produce separate
/// records; the sum of the record's batch usages equals `quantity` exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    pub id: Uuid,
    pub ingredient_id: Uuid,
    pub production_id: Uuid,
    pub quantity: Decimal,
    pub reason: UsageReason,
    pub created_at: DateTime<Utc>,
}

/// How much of a usage record was satisfied by a given batch
///
/// The audit trail that proves the FIFO order was followed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchUsage {
    pub id: Uuid,
    pub usage_id: Uuid,
    pub batch_id: Uuid,
    pub quantity_used: Decimal,
}
