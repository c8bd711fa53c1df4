use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::info;

use super::ValidJson;
use crate::error::ApiError;
use crate::middleware::{Admin, LoggedIn};
use crate::models::{NewUser, UserUpdate, Users};
use crate::state::AppState;

/// POST /users - admin-only; unlike /auth/register this may create admins
pub async fn create(
    Admin(admin): Admin,
    State(state): State<AppState>,
    ValidJson(data): ValidJson<NewUser>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let user = Users::new(state.db()).register(&data, state.bcrypt_cost()).await?;
    info!(username = %user.username, is_admin = user.is_admin, by = %admin.username, "Created user");

    let token = state.tokens().create_token(&user.username, user.is_admin)?;
    Ok((StatusCode::CREATED, Json(json!({ "user": user, "token": token }))))
}

/// GET /users
pub async fn list(_admin: Admin, State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let users = Users::new(state.db()).find_all().await?;
    Ok(Json(json!({ "users": users })))
}

/// GET /users/:username
pub async fn get(
    LoggedIn(current): LoggedIn,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Value>, ApiError> {
    current.ensure_admin_or_self(&username)?;
    let user = Users::new(state.db()).get(&username).await?;
    Ok(Json(json!({ "user": user })))
}

/// PATCH /users/:username
pub async fn update(
    LoggedIn(current): LoggedIn,
    State(state): State<AppState>,
    Path(username): Path<String>,
    ValidJson(data): ValidJson<UserUpdate>,
) -> Result<Json<Value>, ApiError> {
    current.ensure_admin_or_self(&username)?;
    let user = Users::new(state.db()).update(&username, data, state.bcrypt_cost()).await?;
    Ok(Json(json!({ "user": user })))
}

/// DELETE /users/:username
pub async fn remove(
    LoggedIn(current): LoggedIn,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Value>, ApiError> {
    current.ensure_admin_or_self(&username)?;
    Users::new(state.db()).remove(&username).await?;
    Ok(Json(json!({ "deleted": username })))
}

/// POST /users/:username/jobs/:id
pub async fn apply(
    LoggedIn(current): LoggedIn,
    State(state): State<AppState>,
    Path((username, job_id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    current.ensure_admin_or_self(&username)?;
    let applied = Users::new(state.db()).apply_to_job(&username, &job_id).await?;
    Ok(Json(json!({ "applied": applied })))
}
