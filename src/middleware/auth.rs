use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::auth::Claims;
use crate::error::ApiError;
use crate::state::AppState;

/// Identity carried by a verified token
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurrentUser {
    pub username: String,
    pub is_admin: bool,
}

impl From<Claims> for CurrentUser {
    fn from(claims: Claims) -> Self {
        Self {
            username: claims.username,
            is_admin: claims.is_admin,
        }
    }
}

impl CurrentUser {
    /// Admins may act on anyone; everyone else only on themselves.
    pub fn ensure_admin_or_self(&self, username: &str) -> Result<(), ApiError> {
        if self.is_admin || self.username == username {
            Ok(())
        } else {
            Err(unauthorized())
        }
    }
}

/// Attach a [`CurrentUser`] when the request carries a valid bearer token.
///
/// Missing or invalid tokens are not an error here; the request simply
/// continues as anonymous and the route extractors decide.
pub async fn authenticate_jwt(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    if let Some(token) = bearer_token(request.headers()) {
        match state.tokens().decode(token) {
            Ok(claims) => {
                request.extensions_mut().insert(CurrentUser::from(claims));
            }
            Err(e) => debug!("Ignoring bearer token: {}", e),
        }
    }
    next.run(request).await
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

fn unauthorized() -> ApiError {
    ApiError::unauthorized("Unauthorized")
}

/// Any authenticated user
#[derive(Clone, Debug)]
pub struct LoggedIn(pub CurrentUser);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for LoggedIn {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .map(LoggedIn)
            .ok_or_else(unauthorized)
    }
}

/// An authenticated user whose token says `isAdmin`
#[derive(Clone, Debug)]
pub struct Admin(pub CurrentUser);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Admin {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let LoggedIn(user) = LoggedIn::from_request_parts(parts, state).await?;
        if user.is_admin {
            Ok(Admin(user))
        } else {
            Err(unauthorized())
        }
    }
}
