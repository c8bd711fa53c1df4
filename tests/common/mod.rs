#![allow(dead_code)]

use std::borrow::Cow;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use jobly_api::auth::TokenService;
use jobly_api::config::{AppConfig, Environment};
use jobly_api::database::{DatabaseError, JsonRow, QueryExecutor};
use jobly_api::{app, AppState};

pub const BCRYPT_COST: u32 = 4;

/// In-memory executor: records every statement and answers from a script.
///
/// Each call pops the next scripted result; an exhausted script yields no rows.
#[derive(Default)]
pub struct ScriptedExecutor {
    script: Mutex<VecDeque<Result<Vec<JsonRow>, DatabaseError>>>,
    calls: Mutex<Vec<(String, Vec<Value>)>>,
}

impl ScriptedExecutor {
    pub fn push_rows(&self, rows: Vec<Value>) {
        let rows = rows
            .into_iter()
            .map(|row| match row {
                Value::Object(map) => map,
                other => panic!("scripted row must be an object, got {}", other),
            })
            .collect();
        self.script.lock().unwrap().push_back(Ok(rows));
    }

    pub fn push_err(&self, err: DatabaseError) {
        self.script.lock().unwrap().push_back(Err(err));
    }

    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call(&self, index: usize) -> (String, Vec<Value>) {
        self.calls()
            .get(index)
            .cloned()
            .unwrap_or_else(|| panic!("no query #{} was executed", index))
    }

    fn next(&self, sql: &str, params: &[Value]) -> Result<Vec<JsonRow>, DatabaseError> {
        self.calls.lock().unwrap().push((sql.to_string(), params.to_vec()));
        self.script.lock().unwrap().pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }
}

#[async_trait]
impl QueryExecutor for ScriptedExecutor {
    async fn fetch_all(&self, sql: &str, params: &[Value]) -> Result<Vec<JsonRow>, DatabaseError> {
        self.next(sql, params)
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64, DatabaseError> {
        self.next(sql, params).map(|rows| rows.len() as u64)
    }
}

pub struct TestApp {
    pub router: Router,
    pub db: Arc<ScriptedExecutor>,
    pub tokens: TokenService,
}

pub fn test_app() -> TestApp {
    let config = AppConfig::for_environment(Environment::Test);
    let db = Arc::new(ScriptedExecutor::default());
    let tokens = TokenService::new(&config.security.jwt_secret, config.security.jwt_expiry_hours)
        .expect("test secret is set");

    let state = AppState::new(db.clone(), tokens.clone(), BCRYPT_COST);
    TestApp {
        router: app(state, &config),
        db,
        tokens,
    }
}

impl TestApp {
    pub fn admin_token(&self) -> String {
        self.tokens.create_token("admin", true).unwrap()
    }

    pub fn user_token(&self, username: &str) -> String {
        self.tokens.create_token(username, false).unwrap()
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        self.send(Method::PATCH, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.send(Method::DELETE, uri, token, None).await
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };
        self.send_request(request).await
    }

    pub async fn send_request(&self, request: Request<Body>) -> Result<(StatusCode, Value)> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((status, body))
    }
}

pub fn company_row(handle: &str, name: &str) -> Value {
    serde_json::json!({
        "handle": handle,
        "name": name,
        "description": format!("Desc {}", handle),
        "numEmployees": 10,
        "logoUrl": null
    })
}

pub fn user_row(username: &str, is_admin: bool) -> Value {
    serde_json::json!({
        "username": username,
        "firstName": "F",
        "lastName": "L",
        "email": format!("{}@example.com", username),
        "isAdmin": is_admin
    })
}

/// Postgres-style error carrying a SQLSTATE code and the server's raw message.
#[derive(Debug)]
struct DriverError {
    code: &'static str,
    message: String,
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for DriverError {}

impl sqlx::error::DatabaseError for DriverError {
    fn message(&self) -> &str {
        &self.message
    }

    fn code(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(self.code))
    }

    fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
        self
    }

    fn kind(&self) -> sqlx::error::ErrorKind {
        sqlx::error::ErrorKind::Other
    }
}

/// The repository-facing error a real driver failure with `code` turns into.
pub fn driver_error(code: &'static str, message: &str) -> DatabaseError {
    sqlx::Error::Database(Box::new(DriverError { code, message: message.to_string() })).into()
}
