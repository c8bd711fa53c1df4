use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use super::{Filters, ValidJson};
use crate::error::ApiError;
use crate::middleware::Admin;
use crate::models::{Companies, CompanyUpdate, NewCompany};
use crate::sql::CompanyFilter;
use crate::state::AppState;

/// POST /companies
pub async fn create(
    _admin: Admin,
    State(state): State<AppState>,
    ValidJson(data): ValidJson<NewCompany>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let company = Companies::new(state.db()).create(&data).await?;
    Ok((StatusCode::CREATED, Json(json!({ "company": company }))))
}

/// GET /companies?name=&minEmployees=&maxEmployees=
pub async fn list(
    State(state): State<AppState>,
    Filters(filter): Filters<CompanyFilter>,
) -> Result<Json<Value>, ApiError> {
    filter.check_range()?;
    let companies = Companies::new(state.db()).find_all(&filter).await?;
    Ok(Json(json!({ "companies": companies })))
}

/// GET /companies/:handle
pub async fn get(State(state): State<AppState>, Path(handle): Path<String>) -> Result<Json<Value>, ApiError> {
    let company = Companies::new(state.db()).get(&handle).await?;
    Ok(Json(json!({ "company": company })))
}

/// PATCH /companies/:handle
pub async fn update(
    _admin: Admin,
    State(state): State<AppState>,
    Path(handle): Path<String>,
    ValidJson(data): ValidJson<CompanyUpdate>,
) -> Result<Json<Value>, ApiError> {
    let company = Companies::new(state.db()).update(&handle, data).await?;
    Ok(Json(json!({ "company": company })))
}

/// DELETE /companies/:handle
pub async fn remove(
    _admin: Admin,
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<Json<Value>, ApiError> {
    Companies::new(state.db()).remove(&handle).await?;
    Ok(Json(json!({ "deleted": handle })))
}
