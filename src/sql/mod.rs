//! Parameterized SQL fragments: partial-update SET lists and filter predicates.
//!
//! Nothing here touches the database. Fragments are built per request and
//! handed to a [`crate::database::QueryExecutor`] together with their values.

pub mod error;
pub mod filter_where;
pub mod filters;
pub mod partial_update;

pub use error::SqlError;
pub use filter_where::{FilterWhere, WhereClause};
pub use filters::{CompanyFilter, FilterSpec, JobFilter};
pub use partial_update::{sql_for_partial_update, ColumnAlias, SetFragment, UpdateRequest};

/// Positional placeholder for the 1-based parameter `index`.
pub(crate) fn placeholder(index: usize) -> String {
    format!("${}", index)
}
