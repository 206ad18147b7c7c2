//! Ingredient and batch stock management service

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::{
    validate_batch_number, validate_quantity, validate_stock_thresholds, validate_unit,
    ActivityAction, Batch, Ingredient,
};

/// Ingredient service for stock levels, batches, and restocks
#[derive(Clone)]
pub struct IngredientService {
    db: PgPool,
}

/// Input for creating an ingredient
#[derive(Debug, Deserialize)]
pub struct CreateIngredientInput {
    pub name: String,
    pub unit: String,
    pub minimum_stock: Decimal,
    pub ideal_stock: Decimal,
}

/// Input for recording a restock delivery
#[derive(Debug, Deserialize)]
pub struct RestockInput {
    pub batch_number: String,
    pub quantity: Decimal,
    pub received_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub cost: Option<Decimal>,
    pub recorded_by: Option<String>,
}

/// Database row for an ingredient
#[derive(Debug, sqlx::FromRow)]
struct IngredientRow {
    id: Uuid,
    name: String,
    unit: String,
    minimum_stock: Decimal,
    ideal_stock: Decimal,
    current_stock: Decimal,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<IngredientRow> for Ingredient {
    fn from(row: IngredientRow) -> Self {
        Ingredient {
            id: row.id,
            name: row.name,
            unit: row.unit,
            minimum_stock: row.minimum_stock,
            ideal_stock: row.ideal_stock,
            current_stock: row.current_stock,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Database row for a batch
#[derive(Debug, sqlx::FromRow)]
struct BatchRow {
    id: Uuid,
    ingredient_id: Uuid,
    batch_number: String,
    quantity: Decimal,
    remaining_quantity: Decimal,
    received_date: NaiveDate,
    expiry_date: Option<NaiveDate>,
    cost: Option<Decimal>,
    created_at: DateTime<Utc>,
}

impl From<BatchRow> for Batch {
    fn from(row: BatchRow) -> Self {
        Batch {
            id: row.id,
            ingredient_id: row.ingredient_id,
            batch_number: row.batch_number,
            quantity: row.quantity,
            remaining_quantity: row.remaining_quantity,
            received_date: row.received_date,
            expiry_date: row.expiry_date,
            cost: row.cost,
            created_at: row.created_at,
        }
    }
}

const INGREDIENT_COLUMNS: &str = "id, name, unit, minimum_stock, ideal_stock, current_stock, is_active, created_at, updated_at";

impl IngredientService {
    /// Create a new IngredientService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create an ingredient
    pub async fn create_ingredient(&self, input: CreateIngredientInput) -> AppResult<Ingredient> {
        if input.name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Name is required".to_string(),
            });
        }
        validate_unit(&input.unit).map_err(|msg| AppError::Validation {
            field: "unit".to_string(),
            message: msg.to_string(),
        })?;
        validate_stock_thresholds(input.minimum_stock, input.ideal_stock).map_err(|msg| {
            AppError::Validation {
                field: "minimum_stock/ideal_stock".to_string(),
                message: msg.to_string(),
            }
        })?;

        let name_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM ingredients WHERE LOWER(name) = LOWER($1))",
        )
        .bind(input.name.trim())
        .fetch_one(&self.db)
        .await?;

        if name_exists {
            return Err(AppError::DuplicateEntry("name".to_string()));
        }

        let row = sqlx::query_as::<_, IngredientRow>(&format!(
            r#"
            INSERT INTO ingredients (name, unit, minimum_stock, ideal_stock)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            INGREDIENT_COLUMNS
        ))
        .bind(input.name.trim())
        .bind(&input.unit)
        .bind(input.minimum_stock)
        .bind(input.ideal_stock)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// List active ingredients
    pub async fn list_ingredients(&self) -> AppResult<Vec<Ingredient>> {
        let rows = sqlx::query_as::<_, IngredientRow>(&format!(
            "SELECT {} FROM ingredients WHERE is_active = TRUE ORDER BY name ASC",
            INGREDIENT_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get an ingredient by ID
    pub async fn get_ingredient(&self, ingredient_id: Uuid) -> AppResult<Ingredient> {
        let row = sqlx::query_as::<_, IngredientRow>(&format!(
            "SELECT {} FROM ingredients WHERE id = $1",
            INGREDIENT_COLUMNS
        ))
        .bind(ingredient_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Ingredient".to_string()))?;

        Ok(row.into())
    }

    /// List an ingredient's batches, oldest received first
    pub async fn list_batches(&self, ingredient_id: Uuid) -> AppResult<Vec<Batch>> {
        let ingredient_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM ingredients WHERE id = $1)")
                .bind(ingredient_id)
                .fetch_one(&self.db)
                .await?;

        if !ingredient_exists {
            return Err(AppError::NotFound("Ingredient".to_string()));
        }

        let rows = sqlx::query_as::<_, BatchRow>(
            r#"
            SELECT id, ingredient_id, batch_number, quantity, remaining_quantity,
                   received_date, expiry_date, cost, created_at
            FROM batches
            WHERE ingredient_id = $1
            ORDER BY received_date ASC, batch_number ASC
            "#,
        )
        .bind(ingredient_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// List active ingredients at or below their minimum stock level
    pub async fn list_low_stock(&self) -> AppResult<Vec<Ingredient>> {
        let rows = sqlx::query_as::<_, IngredientRow>(&format!(
            r#"
            SELECT {}
            FROM ingredients
            WHERE is_active = TRUE AND current_stock <= minimum_stock
            ORDER BY name ASC
            "#,
            INGREDIENT_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Record a restock delivery: a new batch plus the stock-cache bump,
    /// committed together
    pub async fn restock(&self, ingredient_id: Uuid, input: RestockInput) -> AppResult<Batch> {
        validate_quantity(input.quantity).map_err(|msg| AppError::Validation {
            field: "quantity".to_string(),
            message: msg.to_string(),
        })?;
        validate_batch_number(&input.batch_number).map_err(|msg| AppError::Validation {
            field: "batch_number".to_string(),
            message: msg.to_string(),
        })?;

        let ingredient = sqlx::query_as::<_, (Uuid, String, String)>(
            "SELECT id, name, unit FROM ingredients WHERE id = $1",
        )
        .bind(ingredient_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Ingredient".to_string()))?;

        let batch_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM batches WHERE batch_number = $1)",
        )
        .bind(&input.batch_number)
        .fetch_one(&self.db)
        .await?;

        if batch_exists {
            return Err(AppError::DuplicateEntry("batch_number".to_string()));
        }

        let received_date = input
            .received_date
            .unwrap_or_else(|| Utc::now().date_naive());

        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, BatchRow>(
            r#"
            INSERT INTO batches (ingredient_id, batch_number, quantity, remaining_quantity,
                                 received_date, expiry_date, cost)
            VALUES ($1, $2, $3, $3, $4, $5, $6)
            RETURNING id, ingredient_id, batch_number, quantity, remaining_quantity,
                      received_date, expiry_date, cost, created_at
            "#,
        )
        .bind(ingredient_id)
        .bind(&input.batch_number)
        .bind(input.quantity)
        .bind(received_date)
        .bind(input.expiry_date)
        .bind(input.cost)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE ingredients
            SET current_stock = current_stock + $1, updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(input.quantity)
        .bind(ingredient_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO activities (action, details, recorded_by) VALUES ($1, $2, $3)")
            .bind(ActivityAction::IngredientRestocked.as_str())
            .bind(format!(
                "Restocked {} with {} {} (batch {})",
                ingredient.1, input.quantity, ingredient.2, input.batch_number
            ))
            .bind(&input.recorded_by)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(row.into())
    }
}
