pub mod executor;
pub mod manager;

pub use executor::{JsonRow, PgExecutor, QueryExecutor};
pub use manager::{DatabaseError, DatabaseManager};
