//! HTTP handlers for the audit log endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::error::AppResult;
use crate::services::activity::ActivityService;
use crate::AppState;
use shared::{Activity, PaginatedResponse, Pagination};

/// Query parameters for the activity log
#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// List audit log entries, newest first
pub async fn list_activities(
    State(state): State<AppState>,
    Query(query): Query<ActivityQuery>,
) -> AppResult<Json<PaginatedResponse<Activity>>> {
    let default = Pagination::default();
    let pagination = Pagination {
        page: query.page.unwrap_or(default.page).max(1),
        per_page: query.per_page.unwrap_or(default.per_page).clamp(1, 100),
    };

    let service = ActivityService::new(state.db);
    let page = service.list_activities(pagination).await?;
    Ok(Json(page))
}
