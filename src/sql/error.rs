use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SqlError {
    #[error("No data")]
    NoFieldsProvided,

    #[error("Invalid field: {0}")]
    InvalidField(String),

    #[error("{min_field} ({min}) cannot be greater than {max_field} ({max})")]
    InvalidRange {
        min_field: &'static str,
        max_field: &'static str,
        min: i64,
        max: i64,
    },
}
