use serde::{Deserialize, Serialize};
use serde_json::json;

use super::company::{Company, COMPANY_FIELDS};
use super::{double_option, from_row, from_rows, len_between, non_negative_int4, FieldErrors, Validate};
use crate::database::{DatabaseError, QueryExecutor};
use crate::sql::{sql_for_partial_update, ColumnAlias, FilterSpec, FilterWhere, JobFilter, UpdateRequest};

pub const JOB_COLUMNS: ColumnAlias = ColumnAlias::new(&[("companyHandle", "company_handle")])
    .allow(&["title", "salary", "equity", "companyHandle"]);

const JOB_FIELDS: &str = r#"id, title, salary, equity, company_handle AS "companyHandle""#;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i64,
    pub title: String,
    pub salary: Option<i64>,
    /// NUMERIC text, e.g. "0.1"
    pub equity: Option<String>,
    pub company_handle: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobDetail {
    pub id: i64,
    pub title: String,
    pub salary: Option<i64>,
    pub equity: Option<String>,
    pub company: Option<Company>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct NewJob {
    pub title: String,
    pub salary: Option<i64>,
    pub equity: Option<f64>,
    pub company_handle: String,
}

impl Validate for NewJob {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        errors.check(len_between(&self.title, 1, 255), "title", "must be 1-255 characters");
        errors.check(self.salary.map_or(true, non_negative_int4), "salary", SALARY_RANGE);
        errors.check(self.equity.map_or(true, valid_equity), "equity", "must be between 0 and 1");
        errors.check(len_between(&self.company_handle, 1, 25), "companyHandle", "must be 1-25 characters");
        errors.into_result()
    }
}

const SALARY_RANGE: &str = "must be between 0 and 2147483647";

/// PATCH body. The id is never updatable; unknown keys fail to deserialize.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct JobUpdate {
    #[serde(default, deserialize_with = "double_option")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub salary: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub equity: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub company_handle: Option<Option<String>>,
}

impl JobUpdate {
    pub fn into_request(self) -> UpdateRequest {
        let mut request = UpdateRequest::new();
        request
            .set_opt("title", self.title.map(|v| json!(v)))
            .set_opt("salary", self.salary.map(|v| json!(v)))
            .set_opt("equity", self.equity.map(|v| json!(v)))
            .set_opt("companyHandle", self.company_handle.map(|v| json!(v)));
        request
    }
}

impl Validate for JobUpdate {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        if let Some(title) = errors.not_null(&self.title, "title") {
            errors.check(len_between(title, 1, 255), "title", "must be 1-255 characters");
        }
        if let Some(Some(salary)) = self.salary {
            errors.check(non_negative_int4(salary), "salary", SALARY_RANGE);
        }
        if let Some(Some(equity)) = self.equity {
            errors.check(valid_equity(equity), "equity", "must be between 0 and 1");
        }
        if let Some(handle) = errors.not_null(&self.company_handle, "companyHandle") {
            errors.check(len_between(handle, 1, 25), "companyHandle", "must be 1-25 characters");
        }
        errors.into_result()
    }
}

fn valid_equity(equity: f64) -> bool {
    (0.0..=1.0).contains(&equity)
}

/// Job ids arrive as path text; anything non-numeric cannot exist.
fn parse_id(id: &str) -> Result<i64, DatabaseError> {
    id.parse().map_err(|_| DatabaseError::NotFound(format!("No job: {}", id)))
}

pub struct Jobs<'a> {
    db: &'a dyn QueryExecutor,
}

impl<'a> Jobs<'a> {
    pub fn new(db: &'a dyn QueryExecutor) -> Self {
        Self { db }
    }

    pub async fn create(&self, data: &NewJob) -> Result<Job, DatabaseError> {
        let sql = format!(
            "INSERT INTO jobs (title, salary, equity, company_handle) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {}",
            JOB_FIELDS
        );
        let params = [
            json!(data.title),
            json!(data.salary),
            json!(data.equity),
            json!(data.company_handle),
        ];

        let row = match self.db.fetch_optional(&sql, &params).await {
            Err(DatabaseError::InvalidReference(_)) => {
                return Err(DatabaseError::InvalidReference(format!("No company: {}", data.company_handle)))
            }
            other => other?,
        };
        let row = row.ok_or_else(|| DatabaseError::Decode("INSERT returned no row".to_string()))?;
        from_row(row)
    }

    /// All jobs matching `filter`, ordered by title
    pub async fn find_all(&self, filter: &JobFilter) -> Result<Vec<Job>, DatabaseError> {
        let clause = filter.to_where();
        let sql = format!("SELECT {} FROM jobs{} ORDER BY title, id", JOB_FIELDS, clause.to_clause());
        let rows = self.db.fetch_all(&sql, &clause.params).await?;
        from_rows(rows)
    }

    /// A job with its company nested in place of the handle
    pub async fn get(&self, id: &str) -> Result<JobDetail, DatabaseError> {
        let job_id = parse_id(id)?;
        let sql = format!("SELECT {} FROM jobs WHERE id = $1", JOB_FIELDS);
        let row = self
            .db
            .fetch_optional(&sql, &[json!(job_id)])
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("No job: {}", id)))?;
        let job: Job = from_row(row)?;

        let sql = format!("SELECT {} FROM companies WHERE handle = $1", COMPANY_FIELDS);
        let company = self
            .db
            .fetch_optional(&sql, &[json!(job.company_handle)])
            .await?
            .map(from_row)
            .transpose()?;

        Ok(JobDetail {
            id: job.id,
            title: job.title,
            salary: job.salary,
            equity: job.equity,
            company,
        })
    }

    pub async fn update(&self, id: &str, data: JobUpdate) -> Result<Job, DatabaseError> {
        let company_handle = data.company_handle.clone().flatten();
        // Reject empty bodies before even looking at the id
        let set = sql_for_partial_update(data.into_request(), &JOB_COLUMNS)?;
        let job_id = parse_id(id)?;

        let mut key = FilterWhere::starting_at(set.values.len());
        key.eq("id", job_id);
        let key = key.build();

        let sql = format!("UPDATE jobs SET {} WHERE {} RETURNING {}", set.set_cols, key.sql, JOB_FIELDS);
        let params: Vec<_> = set.values.into_iter().chain(key.params).collect();

        let row = self
            .db
            .fetch_optional(&sql, &params)
            .await
            .map_err(|e| match (e, &company_handle) {
                (DatabaseError::InvalidReference(_), Some(handle)) => {
                    DatabaseError::InvalidReference(format!("No company: {}", handle))
                }
                (other, _) => other,
            })?
            .ok_or_else(|| DatabaseError::NotFound(format!("No job: {}", id)))?;
        from_row(row)
    }

    /// Delete a job; returns its numeric id.
    pub async fn remove(&self, id: &str) -> Result<i64, DatabaseError> {
        let job_id = parse_id(id)?;
        self.db
            .fetch_optional("DELETE FROM jobs WHERE id = $1 RETURNING id", &[json!(job_id)])
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("No job: {}", id)))?;
        Ok(job_id)
    }
}
