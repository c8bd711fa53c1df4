use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{AppConfig, SecurityConfig};
use crate::error::ApiError;
use crate::handlers::{auth, companies, health, jobs, users};
use crate::middleware::authenticate_jwt;
use crate::state::AppState;

/// Build the full application router.
pub fn app(state: AppState, config: &AppConfig) -> Router {
    let router = Router::new()
        .route("/health", get(health::health))
        .merge(auth_routes())
        .merge(company_routes())
        .merge(job_routes())
        .merge(user_routes())
        .fallback(not_found)
        // Global middleware
        .layer(middleware::from_fn_with_state(state.clone(), authenticate_jwt))
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    match cors_layer(&config.security) {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/token", post(auth::token))
        .route("/auth/register", post(auth::register))
}

fn company_routes() -> Router<AppState> {
    Router::new()
        .route("/companies", get(companies::list).post(companies::create))
        .route(
            "/companies/:handle",
            get(companies::get).patch(companies::update).delete(companies::remove),
        )
}

fn job_routes() -> Router<AppState> {
    Router::new()
        .route("/jobs", get(jobs::list).post(jobs::create))
        .route("/jobs/:id", get(jobs::get).patch(jobs::update).delete(jobs::remove))
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(users::list).post(users::create))
        .route(
            "/users/:username",
            get(users::get).patch(users::update).delete(users::remove),
        )
        .route("/users/:username/jobs/:id", post(users::apply))
}

async fn not_found() -> ApiError {
    ApiError::not_found("Not Found")
}

fn cors_layer(security: &SecurityConfig) -> Option<CorsLayer> {
    if !security.enable_cors {
        return None;
    }
    if security.cors_origins.iter().any(|o| o == "*") {
        return Some(CorsLayer::permissive());
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    Some(CorsLayer::new().allow_origin(origins).allow_methods(Any).allow_headers(Any))
}
