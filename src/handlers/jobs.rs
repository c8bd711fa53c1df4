use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use super::{Filters, ValidJson};
use crate::error::ApiError;
use crate::middleware::Admin;
use crate::models::{JobUpdate, Jobs, NewJob};
use crate::sql::JobFilter;
use crate::state::AppState;

/// POST /jobs
pub async fn create(
    _admin: Admin,
    State(state): State<AppState>,
    ValidJson(data): ValidJson<NewJob>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let job = Jobs::new(state.db()).create(&data).await?;
    Ok((StatusCode::CREATED, Json(json!({ "job": job }))))
}

/// GET /jobs?title=&minSalary=&hasEquity=
pub async fn list(
    State(state): State<AppState>,
    Filters(filter): Filters<JobFilter>,
) -> Result<Json<Value>, ApiError> {
    let jobs = Jobs::new(state.db()).find_all(&filter).await?;
    Ok(Json(json!({ "jobs": jobs })))
}

// Ids are taken as text so a non-numeric id is a 404, not an extractor 400.

/// GET /jobs/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    let job = Jobs::new(state.db()).get(&id).await?;
    Ok(Json(json!({ "job": job })))
}

/// PATCH /jobs/:id
pub async fn update(
    _admin: Admin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidJson(data): ValidJson<JobUpdate>,
) -> Result<Json<Value>, ApiError> {
    let job = Jobs::new(state.db()).update(&id, data).await?;
    Ok(Json(json!({ "job": job })))
}

/// DELETE /jobs/:id
pub async fn remove(
    _admin: Admin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let deleted = Jobs::new(state.db()).remove(&id).await?;
    Ok(Json(json!({ "deleted": deleted })))
}
