use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use tracing::info;

use super::ValidJson;
use crate::error::ApiError;
use crate::models::{LoginRequest, NewUser, Users};
use crate::state::AppState;

/// POST /auth/token - exchange credentials for a token
pub async fn token(
    State(state): State<AppState>,
    ValidJson(login): ValidJson<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let user = Users::new(state.db())
        .authenticate(&login)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid username/password"))?;

    let token = state.tokens().create_token(&user.username, user.is_admin)?;
    Ok(Json(json!({ "token": token })))
}

/// POST /auth/register - self sign-up; never creates an admin
pub async fn register(
    State(state): State<AppState>,
    ValidJson(mut data): ValidJson<NewUser>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    data.is_admin = false;
    let user = Users::new(state.db()).register(&data, state.bcrypt_cost()).await?;
    info!(username = %user.username, "Registered user");

    let token = state.tokens().create_token(&user.username, user.is_admin)?;
    Ok((StatusCode::CREATED, Json(json!({ "token": token }))))
}
