//! HTTP handlers for ingredient and batch stock endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::ingredient::{CreateIngredientInput, IngredientService, RestockInput};
use crate::AppState;
use shared::{Batch, Ingredient};

/// Create an ingredient
pub async fn create_ingredient(
    State(state): State<AppState>,
    Json(input): Json<CreateIngredientInput>,
) -> AppResult<Json<Ingredient>> {
    let service = IngredientService::new(state.db);
    let ingredient = service.create_ingredient(input).await?;
    Ok(Json(ingredient))
}

/// List active ingredients
pub async fn list_ingredients(State(state): State<AppState>) -> AppResult<Json<Vec<Ingredient>>> {
    let service = IngredientService::new(state.db);
    let ingredients = service.list_ingredients().await?;
    Ok(Json(ingredients))
}

/// Get an ingredient by ID
pub async fn get_ingredient(
    State(state): State<AppState>,
    Path(ingredient_id): Path<Uuid>,
) -> AppResult<Json<Ingredient>> {
    let service = IngredientService::new(state.db);
    let ingredient = service.get_ingredient(ingredient_id).await?;
    Ok(Json(ingredient))
}

/// List an ingredient's batches, oldest first
pub async fn list_ingredient_batches(
    State(state): State<AppState>,
    Path(ingredient_id): Path<Uuid>,
) -> AppResult<Json<Vec<Batch>>> {
    let service = IngredientService::new(state.db);
    let batches = service.list_batches(ingredient_id).await?;
    Ok(Json(batches))
}

/// List ingredients at or below their minimum stock level
pub async fn list_low_stock(State(state): State<AppState>) -> AppResult<Json<Vec<Ingredient>>> {
    let service = IngredientService::new(state.db);
    let ingredients = service.list_low_stock().await?;
    Ok(Json(ingredients))
}

/// Record a restock delivery for an ingredient
pub async fn restock_ingredient(
    State(state): State<AppState>,
    Path(ingredient_id): Path<Uuid>,
    Json(input): Json<RestockInput>,
) -> AppResult<Json<Batch>> {
    let service = IngredientService::new(state.db);
    let batch = service.restock(ingredient_id, input).await?;
    Ok(Json(batch))
}
