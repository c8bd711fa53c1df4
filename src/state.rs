use std::sync::Arc;

use crate::auth::TokenService;
use crate::database::QueryExecutor;

/// Shared per-process handles, cloned into every request
#[derive(Clone)]
pub struct AppState {
    db: Arc<dyn QueryExecutor>,
    tokens: TokenService,
    bcrypt_cost: u32,
}

impl AppState {
    pub fn new(db: Arc<dyn QueryExecutor>, tokens: TokenService, bcrypt_cost: u32) -> Self {
        Self { db, tokens, bcrypt_cost }
    }

    pub fn db(&self) -> &dyn QueryExecutor {
        self.db.as_ref()
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn bcrypt_cost(&self) -> u32 {
        self.bcrypt_cost
    }
}
