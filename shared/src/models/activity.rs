//! Audit log models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What an activity entry describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    IngredientCreated,
    IngredientRestocked,
    IngredientUsed,
    IngredientWasted,
    ProductionCompleted,
}

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::IngredientCreated => "ingredient_created",
            ActivityAction::IngredientRestocked => "ingredient_restocked",
            ActivityAction::IngredientUsed => "ingredient_used",
            ActivityAction::IngredientWasted => "ingredient_wasted",
            ActivityAction::ProductionCompleted => "production_completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ingredient_created" => Some(ActivityAction::IngredientCreated),
            "ingredient_restocked" => Some(ActivityAction::IngredientRestocked),
            "ingredient_used" => Some(ActivityAction::IngredientUsed),
            "ingredient_wasted" => Some(ActivityAction::IngredientWasted),
            "production_completed" => Some(ActivityAction::ProductionCompleted),
            _ => None,
        }
    }
}

/// Append-only audit log entry; never mutated or deleted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: Uuid,
    pub action: String,
    pub details: String,
    pub recorded_by: Option<String>,
    pub created_at: DateTime<Utc>,
}
