//! Entity repositories and their request payloads.
//!
//! Each repository borrows a [`QueryExecutor`] and assembles full statements
//! from the fragments in [`crate::sql`].

pub mod company;
pub mod job;
pub mod user;

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::database::{DatabaseError, JsonRow};

pub use company::{Companies, Company, CompanyDetail, CompanyUpdate, NewCompany};
pub use job::{Job, JobDetail, JobUpdate, Jobs, NewJob};
pub use user::{LoginRequest, NewUser, User, UserDetail, UserUpdate, Users};

/// Per-field validation messages for a request payload
#[derive(Debug, Default)]
pub struct FieldErrors(HashMap<String, String>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.insert(field.to_string(), message.into());
    }

    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add(field, message);
        }
    }

    /// Flag an explicit `null` on a NOT NULL field; yields the value when one was given.
    pub fn not_null<'v, T>(&mut self, value: &'v Option<Option<T>>, field: &str) -> Option<&'v T> {
        match value {
            Some(None) => {
                self.add(field, "cannot be null");
                None
            }
            Some(Some(v)) => Some(v),
            None => None,
        }
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub fn into_inner(self) -> HashMap<String, String> {
        self.0
    }
}

pub trait Validate {
    fn validate(&self) -> Result<(), FieldErrors>;
}

pub(crate) fn from_row<T: DeserializeOwned>(row: JsonRow) -> Result<T, DatabaseError> {
    serde_json::from_value(Value::Object(row)).map_err(|e| DatabaseError::Decode(e.to_string()))
}

pub(crate) fn from_rows<T: DeserializeOwned>(rows: Vec<JsonRow>) -> Result<Vec<T>, DatabaseError> {
    rows.into_iter().map(from_row).collect()
}

/// Distinguishes an explicit `null` (Some(None)) from an absent field (None).
pub(crate) fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

pub(crate) fn len_between(value: &str, min: usize, max: usize) -> bool {
    (min..=max).contains(&value.chars().count())
}

/// Fits a non-negative INTEGER column
pub(crate) fn non_negative_int4(value: i64) -> bool {
    (0..=i64::from(i32::MAX)).contains(&value)
}
