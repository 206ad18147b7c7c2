//! HTTP handlers for production recording and history endpoints

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::production::{
    ProductionDetail, ProductionFilter, ProductionService, RecordProductionInput,
};
use crate::AppState;
use shared::{PaginatedResponse, Pagination, ProductionRecord};

/// Query parameters for the production history view
#[derive(Debug, Deserialize)]
pub struct ProductionHistoryQuery {
    pub recipe_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub batch_number: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ProductionHistoryQuery {
    fn filter(&self) -> ProductionFilter {
        ProductionFilter {
            recipe_id: self.recipe_id,
            start_date: self.start_date,
            end_date: self.end_date,
            batch_number: self.batch_number.clone(),
        }
    }

    fn pagination(&self) -> Pagination {
        let default = Pagination::default();
        Pagination {
            page: self.page.unwrap_or(default.page).max(1),
            per_page: self.per_page.unwrap_or(default.per_page).clamp(1, 100),
        }
    }
}

/// Record a production run
pub async fn record_production(
    State(state): State<AppState>,
    Json(input): Json<RecordProductionInput>,
) -> AppResult<Json<ProductionRecord>> {
    let service = ProductionService::new(state.db);
    let production = service.process(input).await?;
    Ok(Json(production))
}

/// List production records with filters and pagination
pub async fn list_productions(
    State(state): State<AppState>,
    Query(query): Query<ProductionHistoryQuery>,
) -> AppResult<Json<PaginatedResponse<ProductionRecord>>> {
    let service = ProductionService::new(state.db);
    let page = service
        .list_productions(&query.filter(), query.pagination())
        .await?;
    Ok(Json(page))
}

/// Get a production record with its usage ledger
pub async fn get_production(
    State(state): State<AppState>,
    Path(production_id): Path<Uuid>,
) -> AppResult<Json<ProductionDetail>> {
    let service = ProductionService::new(state.db);
    let detail = service.get_production(production_id).await?;
    Ok(Json(detail))
}

/// Export production history as CSV
pub async fn export_productions(
    State(state): State<AppState>,
    Query(query): Query<ProductionHistoryQuery>,
) -> AppResult<impl IntoResponse> {
    let service = ProductionService::new(state.db);
    let csv = service.export_csv(&query.filter()).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"production-history.csv\"",
            ),
        ],
        csv,
    ))
}
