use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{double_option, from_row, from_rows, len_between, non_negative_int4, FieldErrors, Validate};
use crate::database::{DatabaseError, QueryExecutor};
use crate::sql::{sql_for_partial_update, ColumnAlias, CompanyFilter, FilterSpec, FilterWhere, UpdateRequest};

/// Updatable company fields and their physical columns
pub const COMPANY_COLUMNS: ColumnAlias = ColumnAlias::new(&[("numEmployees", "num_employees"), ("logoUrl", "logo_url")])
    .allow(&["name", "description", "numEmployees", "logoUrl"]);

pub(crate) const COMPANY_FIELDS: &str = r#"handle, name, description, num_employees AS "numEmployees", logo_url AS "logoUrl""#;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub handle: String,
    pub name: String,
    pub description: String,
    pub num_employees: Option<i64>,
    pub logo_url: Option<String>,
}

/// A job as listed under its company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyJob {
    pub id: i64,
    pub title: String,
    pub salary: Option<i64>,
    pub equity: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyDetail {
    #[serde(flatten)]
    pub company: Company,
    pub jobs: Vec<CompanyJob>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct NewCompany {
    pub handle: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub num_employees: Option<i64>,
    pub logo_url: Option<String>,
}

impl Validate for NewCompany {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        errors.check(len_between(&self.handle, 1, 25), "handle", "must be 1-25 characters");
        errors.check(self.handle == self.handle.to_lowercase(), "handle", "must be lowercase");
        errors.check(len_between(&self.name, 1, 255), "name", "must be 1-255 characters");
        errors.check(self.num_employees.map_or(true, non_negative_int4), "numEmployees", EMPLOYEES_RANGE);
        errors.check(self.logo_url.as_deref().map_or(true, is_url), "logoUrl", "must be an http(s) URL");
        errors.into_result()
    }
}

const EMPLOYEES_RANGE: &str = "must be between 0 and 2147483647";

/// PATCH body; `Some(None)` sets a nullable column to NULL and is rejected
/// by validation for `name` and `description`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CompanyUpdate {
    #[serde(default, deserialize_with = "double_option")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub num_employees: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub logo_url: Option<Option<String>>,
}

impl CompanyUpdate {
    pub fn into_request(self) -> UpdateRequest {
        let mut request = UpdateRequest::new();
        request
            .set_opt("name", self.name.map(|v| json!(v)))
            .set_opt("description", self.description.map(|v| json!(v)))
            .set_opt("numEmployees", self.num_employees.map(|v| json!(v)))
            .set_opt("logoUrl", self.logo_url.map(|v| json!(v)));
        request
    }
}

impl Validate for CompanyUpdate {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        if let Some(name) = errors.not_null(&self.name, "name") {
            errors.check(len_between(name, 1, 255), "name", "must be 1-255 characters");
        }
        errors.not_null(&self.description, "description");
        if let Some(Some(n)) = self.num_employees {
            errors.check(non_negative_int4(n), "numEmployees", EMPLOYEES_RANGE);
        }
        if let Some(Some(url)) = &self.logo_url {
            errors.check(is_url(url), "logoUrl", "must be an http(s) URL");
        }
        errors.into_result()
    }
}

fn is_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

pub struct Companies<'a> {
    db: &'a dyn QueryExecutor,
}

impl<'a> Companies<'a> {
    pub fn new(db: &'a dyn QueryExecutor) -> Self {
        Self { db }
    }

    /// Insert a company. Duplicate handles are a `Conflict`.
    pub async fn create(&self, data: &NewCompany) -> Result<Company, DatabaseError> {
        let sql = format!(
            "INSERT INTO companies (handle, name, description, num_employees, logo_url) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {}",
            COMPANY_FIELDS
        );
        let params = [
            json!(data.handle),
            json!(data.name),
            json!(data.description),
            json!(data.num_employees),
            json!(data.logo_url),
        ];

        let row = match self.db.fetch_optional(&sql, &params).await {
            Err(DatabaseError::Conflict(_)) => {
                return Err(DatabaseError::Conflict(format!("Duplicate company: {}", data.handle)))
            }
            other => other?,
        };
        let row = row.ok_or_else(|| DatabaseError::Decode("INSERT returned no row".to_string()))?;
        from_row(row)
    }

    /// All companies matching `filter`, ordered by name
    pub async fn find_all(&self, filter: &CompanyFilter) -> Result<Vec<Company>, DatabaseError> {
        let clause = filter.to_where();
        let sql = format!("SELECT {} FROM companies{} ORDER BY name", COMPANY_FIELDS, clause.to_clause());
        let rows = self.db.fetch_all(&sql, &clause.params).await?;
        from_rows(rows)
    }

    /// A company with its jobs
    pub async fn get(&self, handle: &str) -> Result<CompanyDetail, DatabaseError> {
        let sql = format!("SELECT {} FROM companies WHERE handle = $1", COMPANY_FIELDS);
        let row = self
            .db
            .fetch_optional(&sql, &[json!(handle)])
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("No company: {}", handle)))?;
        let company: Company = from_row(row)?;

        let jobs = self
            .db
            .fetch_all(
                "SELECT id, title, salary, equity FROM jobs WHERE company_handle = $1 ORDER BY id",
                &[json!(handle)],
            )
            .await?;

        Ok(CompanyDetail { company, jobs: from_rows(jobs)? })
    }

    /// Partial update; only the fields present in `data` change.
    pub async fn update(&self, handle: &str, data: CompanyUpdate) -> Result<Company, DatabaseError> {
        let set = sql_for_partial_update(data.into_request(), &COMPANY_COLUMNS)?;

        let mut key = FilterWhere::starting_at(set.values.len());
        key.eq("handle", handle);
        let key = key.build();

        let sql = format!(
            "UPDATE companies SET {} WHERE {} RETURNING {}",
            set.set_cols, key.sql, COMPANY_FIELDS
        );
        let params: Vec<_> = set.values.into_iter().chain(key.params).collect();

        // `name` is the only updatable UNIQUE column
        let row = self
            .db
            .fetch_optional(&sql, &params)
            .await
            .map_err(|e| match e {
                DatabaseError::Conflict(_) => DatabaseError::Conflict("Duplicate company name".to_string()),
                other => other,
            })?
            .ok_or_else(|| DatabaseError::NotFound(format!("No company: {}", handle)))?;
        from_row(row)
    }

    pub async fn remove(&self, handle: &str) -> Result<(), DatabaseError> {
        self.db
            .fetch_optional("DELETE FROM companies WHERE handle = $1 RETURNING handle", &[json!(handle)])
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("No company: {}", handle)))?;
        Ok(())
    }
}
