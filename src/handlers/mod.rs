//! Route handlers. Each one guards access, runs a repository call and shapes
//! the JSON body; errors leave as [`ApiError`].

pub mod auth;
pub mod companies;
pub mod health;
pub mod jobs;
pub mod users;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::models::Validate;

/// A JSON body that deserialized and passed [`Validate`].
///
/// Malformed JSON and unknown fields are `INVALID_JSON`; rule violations are
/// `VALIDATION_ERROR` with per-field messages. Both are 400.
#[derive(Debug)]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::invalid_json(rejection.body_text()))?;
        value.validate()?;
        Ok(ValidJson(value))
    }
}

/// Query-string filters; unknown keys or unparsable values are a 400.
#[derive(Debug)]
pub struct Filters<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for Filters<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        Ok(Filters(value))
    }
}
