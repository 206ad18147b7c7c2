//! Audit log read service

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use shared::{Activity, PaginatedResponse, Pagination, PaginationMeta};

/// Activity service for reading the append-only audit log
#[derive(Clone)]
pub struct ActivityService {
    db: PgPool,
}

/// Database row for an activity entry
#[derive(Debug, sqlx::FromRow)]
struct ActivityRow {
    id: Uuid,
    action: String,
    details: String,
    recorded_by: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ActivityRow> for Activity {
    fn from(row: ActivityRow) -> Self {
        Activity {
            id: row.id,
            action: row.action,
            details: row.details,
            recorded_by: row.recorded_by,
            created_at: row.created_at,
        }
    }
}

impl ActivityService {
    /// Create a new ActivityService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List activity entries, newest first
    pub async fn list_activities(
        &self,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<Activity>> {
        let total_items = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM activities")
            .fetch_one(&self.db)
            .await?;

        let rows = sqlx::query_as::<_, ActivityRow>(
            r#"
            SELECT id, action, details, recorded_by, created_at
            FROM activities
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(i64::from(pagination.per_page))
        .bind(i64::from(pagination.offset()))
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: rows.into_iter().map(Into::into).collect(),
            pagination: PaginationMeta::new(pagination, total_items as u64),
        })
    }
}
