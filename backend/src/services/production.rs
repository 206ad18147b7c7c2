//! Production recording service
//!
//! Records a production run against a recipe: validates stock sufficiency
//! across expiry-dated batches, consumes them oldest-first for both
//! productive usage and wastage, and writes the usage/audit ledgers, all
//! inside one unit of work. Nothing from a failed run is ever visible.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::{
    check_sufficiency, deduct, order_fifo, validate_quantity, ActivityAction, BatchAllocation,
    BatchSnapshot, BatchUsage, DeductionError, PaginatedResponse, Pagination, PaginationMeta,
    ProductionRecord, StockLine, StockRequirement, UsageReason, UsageRecord,
};

/// Fixed productive draw per listed ingredient.
// TODO: confirm with product whether the productive draw should scale with
// recipe composition and produced quantity; recording has always deducted a
// single unit per listed ingredient, with only wastage caller-controlled.
const UNIT_DRAW: Decimal = Decimal::ONE;

/// Production service for recording runs and reading the history ledger
#[derive(Clone)]
pub struct ProductionService {
    db: PgPool,
}

/// Input for recording a production run
#[derive(Debug, Deserialize)]
pub struct RecordProductionInput {
    pub recipe_id: Uuid,
    pub quantity: Decimal,
    pub notes: Option<String>,
    pub recorded_by: Option<String>,
    pub ingredients: Vec<ProductionIngredientInput>,
}

/// One ingredient line in a production request
#[derive(Debug, Deserialize)]
pub struct ProductionIngredientInput {
    pub id: Uuid,
    /// Amount spoiled during the run; drawn from the same batches as usage
    pub wasted: Option<Decimal>,
}

/// Filter parameters for the production history view
#[derive(Debug, Default, Deserialize)]
pub struct ProductionFilter {
    pub recipe_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub batch_number: Option<String>,
}

/// A usage record together with its per-batch allocations
#[derive(Debug, Serialize)]
pub struct UsageWithAllocations {
    #[serde(flatten)]
    pub usage: UsageRecord,
    pub batch_usages: Vec<BatchUsage>,
}

/// A production record with its full usage ledger
#[derive(Debug, Serialize)]
pub struct ProductionDetail {
    pub production: ProductionRecord,
    pub usages: Vec<UsageWithAllocations>,
}

/// Ingredient fields the processor works with
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IngredientRef {
    pub id: Uuid,
    pub name: String,
    pub unit: String,
}

/// Fields for a new production record
#[derive(Debug, Clone)]
pub struct NewProduction {
    pub recipe_id: Uuid,
    pub quantity: Decimal,
    pub batch_number: String,
    pub notes: Option<String>,
    pub recorded_by: Option<String>,
}

/// Unit-of-work boundary for one production event
///
/// Every read and mutation of a production event goes through one store
/// instance. The Postgres implementation wraps a single transaction with
/// row-locked batch reads; tests substitute an in-memory ledger. On error
/// the owner of the store discards the whole unit of work.
#[async_trait]
pub trait ProductionStore: Send {
    /// Load an ingredient's identity, locking the row for the unit of work
    async fn load_ingredient(&mut self, ingredient_id: Uuid) -> AppResult<Option<IngredientRef>>;

    /// Load the ingredient's non-exhausted batches, locking the rows
    async fn load_batches(&mut self, ingredient_id: Uuid) -> AppResult<Vec<BatchSnapshot>>;

    async fn insert_production(
        &mut self,
        production: &NewProduction,
    ) -> AppResult<ProductionRecord>;

    async fn insert_usage(
        &mut self,
        production_id: Uuid,
        ingredient_id: Uuid,
        quantity: Decimal,
        reason: UsageReason,
    ) -> AppResult<Uuid>;

    async fn insert_batch_usage(
        &mut self,
        usage_id: Uuid,
        allocation: &BatchAllocation,
    ) -> AppResult<()>;

    /// Decrement a batch's remaining quantity by the allocated amount
    async fn apply_allocation(&mut self, allocation: &BatchAllocation) -> AppResult<()>;

    /// Decrement the ingredient's cached aggregate stock
    async fn decrement_stock(&mut self, ingredient_id: Uuid, amount: Decimal) -> AppResult<()>;

    async fn insert_activity(
        &mut self,
        action: ActivityAction,
        details: &str,
        recorded_by: Option<&str>,
    ) -> AppResult<()>;
}

/// Per-ingredient working state for one production event
struct IngredientLine {
    ingredient: IngredientRef,
    usage: Decimal,
    wastage: Decimal,
    batches: Vec<BatchSnapshot>,
}

/// Run the gather -> validate -> deduct -> persist sequence against a store
///
/// The caller owns the transaction boundary: on `Err`, the surrounding unit
/// of work must be discarded so that no mutation becomes visible.
pub async fn execute_production(
    store: &mut dyn ProductionStore,
    input: &RecordProductionInput,
    batch_number: String,
) -> AppResult<ProductionRecord> {
    // Gather: lock rows and snapshot each ingredient's batches, combining
    // usage and wastage into one required quantity (they draw from the same
    // physical batches)
    let mut lines = Vec::with_capacity(input.ingredients.len());
    for entry in &input.ingredients {
        let ingredient = store
            .load_ingredient(entry.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Ingredient {}", entry.id)))?;

        let mut batches = store.load_batches(entry.id).await?;
        order_fifo(&mut batches);

        let wastage = entry
            .wasted
            .filter(|w| *w > Decimal::ZERO)
            .unwrap_or(Decimal::ZERO);

        lines.push(IngredientLine {
            ingredient,
            usage: UNIT_DRAW,
            wastage,
            batches,
        });
    }

    // Validate sufficiency on the locked snapshots, reporting every
    // shortage at once
    let stock_lines: Vec<StockLine> = lines
        .iter()
        .map(|line| StockLine {
            requirement: StockRequirement {
                ingredient_id: line.ingredient.id,
                name: line.ingredient.name.clone(),
                unit: line.ingredient.unit.clone(),
                needed: line.usage + line.wastage,
            },
            batches: line.batches.clone(),
        })
        .collect();
    check_sufficiency(&stock_lines).map_err(AppError::InsufficientStock)?;

    let production = store
        .insert_production(&NewProduction {
            recipe_id: input.recipe_id,
            quantity: input.quantity,
            batch_number,
            notes: input.notes.clone(),
            recorded_by: input.recorded_by.clone(),
        })
        .await?;

    // Usage first, then wastage against the now-updated remainders: one
    // FIFO timeline per ingredient
    for line in lines.iter_mut() {
        let usage_amount = line.usage;
        let wastage_amount = line.wastage;

        apply_draw(store, &production, line, UsageReason::Production, usage_amount).await?;
        if wastage_amount > Decimal::ZERO {
            apply_draw(
                store,
                &production,
                line,
                UsageReason::ProductionWastage,
                wastage_amount,
            )
            .await?;
        }
    }

    store
        .insert_activity(
            ActivityAction::ProductionCompleted,
            &format!(
                "Completed production {} for recipe {} (quantity {})",
                production.batch_number, production.recipe_id, production.quantity
            ),
            production.recorded_by.as_deref(),
        )
        .await?;

    Ok(production)
}

/// Deduct one draw (usage or wastage) for one ingredient and persist its
/// slice of the ledger
async fn apply_draw(
    store: &mut dyn ProductionStore,
    production: &ProductionRecord,
    line: &mut IngredientLine,
    reason: UsageReason,
    amount: Decimal,
) -> AppResult<()> {
    if amount <= Decimal::ZERO {
        return Ok(());
    }

    let allocations = deduct(&mut line.batches, amount).map_err(|err| match err {
        DeductionError::Shortfall {
            requested,
            remaining,
        } => {
            tracing::error!(
                ingredient_id = %line.ingredient.id,
                ingredient = %line.ingredient.name,
                %requested,
                %remaining,
                snapshot = ?line.batches,
                "FIFO walk could not cover a validated amount; aborting production"
            );
            AppError::StockConsistency {
                ingredient_id: line.ingredient.id,
                requested,
                remaining,
            }
        }
    })?;

    let usage_id = store
        .insert_usage(production.id, line.ingredient.id, amount, reason)
        .await?;

    for allocation in &allocations {
        store.apply_allocation(allocation).await?;
        store.insert_batch_usage(usage_id, allocation).await?;
    }

    store.decrement_stock(line.ingredient.id, amount).await?;

    let (action, details) = match reason {
        UsageReason::Production => (
            ActivityAction::IngredientUsed,
            format!(
                "Used {} {} of {} for production {}",
                amount, line.ingredient.unit, line.ingredient.name, production.batch_number
            ),
        ),
        UsageReason::ProductionWastage => (
            ActivityAction::IngredientWasted,
            format!(
                "Recorded {} {} of {} as wastage for production {}",
                amount, line.ingredient.unit, line.ingredient.name, production.batch_number
            ),
        ),
    };
    store
        .insert_activity(action, &details, production.recorded_by.as_deref())
        .await?;

    Ok(())
}

/// Postgres-backed unit of work over a single transaction
pub struct PgProductionStore<'a> {
    pub tx: Transaction<'a, Postgres>,
}

#[async_trait]
impl<'a> ProductionStore for PgProductionStore<'a> {
    async fn load_ingredient(&mut self, ingredient_id: Uuid) -> AppResult<Option<IngredientRef>> {
        let ingredient = sqlx::query_as::<_, IngredientRef>(
            "SELECT id, name, unit FROM ingredients WHERE id = $1 FOR UPDATE",
        )
        .bind(ingredient_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(ingredient)
    }

    async fn load_batches(&mut self, ingredient_id: Uuid) -> AppResult<Vec<BatchSnapshot>> {
        let rows = sqlx::query_as::<_, (Uuid, String, Decimal, NaiveDate)>(
            r#"
            SELECT id, batch_number, remaining_quantity, received_date
            FROM batches
            WHERE ingredient_id = $1 AND remaining_quantity > 0
            ORDER BY received_date ASC, batch_number ASC
            FOR UPDATE
            "#,
        )
        .bind(ingredient_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, batch_number, remaining_quantity, received_date)| BatchSnapshot {
                id,
                batch_number,
                remaining_quantity,
                received_date,
            })
            .collect())
    }

    async fn insert_production(
        &mut self,
        production: &NewProduction,
    ) -> AppResult<ProductionRecord> {
        let row = sqlx::query_as::<_, ProductionRow>(
            r#"
            INSERT INTO production_records (recipe_id, quantity, batch_number, notes, recorded_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, recipe_id, quantity, batch_number, notes, recorded_by, created_at
            "#,
        )
        .bind(production.recipe_id)
        .bind(production.quantity)
        .bind(&production.batch_number)
        .bind(&production.notes)
        .bind(&production.recorded_by)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(row.into())
    }

    async fn insert_usage(
        &mut self,
        production_id: Uuid,
        ingredient_id: Uuid,
        quantity: Decimal,
        reason: UsageReason,
    ) -> AppResult<Uuid> {
        let usage_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO usage_records (ingredient_id, production_id, quantity, reason)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(ingredient_id)
        .bind(production_id)
        .bind(quantity)
        .bind(reason.as_str())
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(usage_id)
    }

    async fn insert_batch_usage(
        &mut self,
        usage_id: Uuid,
        allocation: &BatchAllocation,
    ) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO batch_usages (usage_id, batch_id, quantity_used) VALUES ($1, $2, $3)",
        )
        .bind(usage_id)
        .bind(allocation.batch_id)
        .bind(allocation.quantity_taken)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn apply_allocation(&mut self, allocation: &BatchAllocation) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE batches
            SET remaining_quantity = remaining_quantity - $1
            WHERE id = $2 AND remaining_quantity >= $1
            "#,
        )
        .bind(allocation.quantity_taken)
        .bind(allocation.batch_id)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Internal(format!(
                "batch {} cannot cover an allocation of {}",
                allocation.batch_id, allocation.quantity_taken
            )));
        }

        Ok(())
    }

    async fn decrement_stock(&mut self, ingredient_id: Uuid, amount: Decimal) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE ingredients
            SET current_stock = current_stock - $1, updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(amount)
        .bind(ingredient_id)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn insert_activity(
        &mut self,
        action: ActivityAction,
        details: &str,
        recorded_by: Option<&str>,
    ) -> AppResult<()> {
        sqlx::query("INSERT INTO activities (action, details, recorded_by) VALUES ($1, $2, $3)")
            .bind(action.as_str())
            .bind(details)
            .bind(recorded_by)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }
}

/// Database row for a production record
#[derive(Debug, sqlx::FromRow)]
struct ProductionRow {
    id: Uuid,
    recipe_id: Uuid,
    quantity: Decimal,
    batch_number: String,
    notes: Option<String>,
    recorded_by: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ProductionRow> for ProductionRecord {
    fn from(row: ProductionRow) -> Self {
        ProductionRecord {
            id: row.id,
            recipe_id: row.recipe_id,
            quantity: row.quantity,
            batch_number: row.batch_number,
            notes: row.notes,
            recorded_by: row.recorded_by,
            created_at: row.created_at,
        }
    }
}

/// Database row for a usage record
#[derive(Debug, sqlx::FromRow)]
struct UsageRow {
    id: Uuid,
    ingredient_id: Uuid,
    production_id: Uuid,
    quantity: Decimal,
    reason: String,
    created_at: DateTime<Utc>,
}

impl ProductionService {
    /// Create a new ProductionService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a production run
    ///
    /// Validates the request, then runs the whole deduction/ledger sequence
    /// inside one transaction. Either everything commits, or nothing does.
    pub async fn process(&self, input: RecordProductionInput) -> AppResult<ProductionRecord> {
        validate_production_input(&input)?;

        let batch_number = next_run_number();
        let tx = self.db.begin().await?;
        let mut store = PgProductionStore { tx };

        match execute_production(&mut store, &input, batch_number).await {
            Ok(record) => {
                store.tx.commit().await?;
                tracing::info!(
                    production_id = %record.id,
                    recipe_id = %record.recipe_id,
                    batch_number = %record.batch_number,
                    "production recorded"
                );
                Ok(record)
            }
            Err(err) => {
                store.tx.rollback().await.ok();
                Err(err)
            }
        }
    }

    /// Get a production record with its full usage ledger
    pub async fn get_production(&self, production_id: Uuid) -> AppResult<ProductionDetail> {
        let production: ProductionRecord = sqlx::query_as::<_, ProductionRow>(
            r#"
            SELECT id, recipe_id, quantity, batch_number, notes, recorded_by, created_at
            FROM production_records
            WHERE id = $1
            "#,
        )
        .bind(production_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Production record".to_string()))?
        .into();

        let usage_rows = sqlx::query_as::<_, UsageRow>(
            r#"
            SELECT id, ingredient_id, production_id, quantity, reason, created_at
            FROM usage_records
            WHERE production_id = $1
            ORDER BY seq ASC
            "#,
        )
        .bind(production_id)
        .fetch_all(&self.db)
        .await?;

        let allocation_rows = sqlx::query_as::<_, (Uuid, Uuid, Uuid, Decimal)>(
            r#"
            SELECT bu.id, bu.usage_id, bu.batch_id, bu.quantity_used
            FROM batch_usages bu
            JOIN usage_records ur ON ur.id = bu.usage_id
            WHERE ur.production_id = $1
            ORDER BY bu.seq ASC
            "#,
        )
        .bind(production_id)
        .fetch_all(&self.db)
        .await?;

        let mut allocations_by_usage: std::collections::HashMap<Uuid, Vec<BatchUsage>> =
            std::collections::HashMap::new();
        for (id, usage_id, batch_id, quantity_used) in allocation_rows {
            allocations_by_usage
                .entry(usage_id)
                .or_default()
                .push(BatchUsage {
                    id,
                    usage_id,
                    batch_id,
                    quantity_used,
                });
        }

        let mut usages = Vec::with_capacity(usage_rows.len());
        for row in usage_rows {
            let reason = UsageReason::from_str(&row.reason)
                .ok_or_else(|| AppError::Internal(format!("unknown usage reason: {}", row.reason)))?;
            let batch_usages = allocations_by_usage.remove(&row.id).unwrap_or_default();
            usages.push(UsageWithAllocations {
                usage: UsageRecord {
                    id: row.id,
                    ingredient_id: row.ingredient_id,
                    production_id: row.production_id,
                    quantity: row.quantity,
                    reason,
                    created_at: row.created_at,
                },
                batch_usages,
            });
        }

        Ok(ProductionDetail { production, usages })
    }

    /// List production records, newest first, with filters and pagination
    pub async fn list_productions(
        &self,
        filter: &ProductionFilter,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<ProductionRecord>> {
        let start = filter
            .start_date
            .unwrap_or(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap());
        let end = filter
            .end_date
            .unwrap_or(NaiveDate::from_ymd_opt(2100, 12, 31).unwrap());

        let total_items = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM production_records
            WHERE ($1::uuid IS NULL OR recipe_id = $1)
              AND created_at::date BETWEEN $2 AND $3
              AND ($4::text IS NULL OR batch_number = $4)
            "#,
        )
        .bind(filter.recipe_id)
        .bind(start)
        .bind(end)
        .bind(&filter.batch_number)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, ProductionRow>(
            r#"
            SELECT id, recipe_id, quantity, batch_number, notes, recorded_by, created_at
            FROM production_records
            WHERE ($1::uuid IS NULL OR recipe_id = $1)
              AND created_at::date BETWEEN $2 AND $3
              AND ($4::text IS NULL OR batch_number = $4)
            ORDER BY created_at DESC
            LIMIT $5 OFFSET $6
            "#,
        )
        .bind(filter.recipe_id)
        .bind(start)
        .bind(end)
        .bind(&filter.batch_number)
        .bind(i64::from(pagination.per_page))
        .bind(i64::from(pagination.offset()))
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: rows.into_iter().map(Into::into).collect(),
            pagination: PaginationMeta::new(pagination, total_items as u64),
        })
    }

    /// Export production history as CSV
    pub async fn export_csv(&self, filter: &ProductionFilter) -> AppResult<String> {
        let page = self
            .list_productions(
                filter,
                Pagination {
                    page: 1,
                    per_page: u32::MAX,
                },
            )
            .await?;

        Self::export_to_csv(&page.data)
    }

    /// Serialize records to a CSV string
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for row in data {
            wtr.serialize(row)
                .map_err(|e| AppError::Internal(e.to_string()))?;
        }
        let csv_data = String::from_utf8(
            wtr.into_inner()
                .map_err(|e| AppError::Internal(e.to_string()))?,
        )
        .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(csv_data)
    }
}

/// Reject malformed production requests before any I/O
pub fn validate_production_input(input: &RecordProductionInput) -> AppResult<()> {
    validate_quantity(input.quantity).map_err(|msg| AppError::Validation {
        field: "quantity".to_string(),
        message: msg.to_string(),
    })?;

    let mut seen = std::collections::HashSet::new();
    for entry in &input.ingredients {
        if !seen.insert(entry.id) {
            return Err(AppError::Validation {
                field: "ingredients".to_string(),
                message: format!("Duplicate ingredient entry: {}", entry.id),
            });
        }
    }

    Ok(())
}

/// Generate a production run identifier, e.g. "PRD-20250806-4F2A9C"
fn next_run_number() -> String {
    let today = Utc::now().date_naive().format("%Y%m%d");
    let suffix = Uuid::new_v4().simple().to_string();
    format!("PRD-{}-{}", today, suffix[..6].to_uppercase())
}
