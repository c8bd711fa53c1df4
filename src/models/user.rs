use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::{double_option, from_row, from_rows, len_between, FieldErrors, Validate};
use crate::database::{DatabaseError, QueryExecutor};
use crate::sql::{sql_for_partial_update, ColumnAlias, FilterWhere, UpdateRequest};

pub const USER_COLUMNS: ColumnAlias = ColumnAlias::new(&[("firstName", "first_name"), ("lastName", "last_name")])
    .allow(&["firstName", "lastName", "password", "email"]);

const USER_FIELDS: &str =
    r#"username, first_name AS "firstName", last_name AS "lastName", email, is_admin AS "isAdmin""#;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_admin: bool,
}

/// A user with the ids of the jobs they applied to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: User,
    pub jobs: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        errors.check(len_between(&self.username, 1, 25), "username", "must be 1-25 characters");
        errors.check(!self.password.is_empty(), "password", "is required");
        errors.into_result()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
}

impl Validate for NewUser {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        errors.check(len_between(&self.username, 1, 25), "username", "must be 1-25 characters");
        errors.check(len_between(&self.password, 5, 20), "password", "must be 5-20 characters");
        errors.check(len_between(&self.first_name, 1, 30), "firstName", "must be 1-30 characters");
        errors.check(len_between(&self.last_name, 1, 30), "lastName", "must be 1-30 characters");
        errors.check(is_email(&self.email), "email", "must be a 6-60 character email address");
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(default, deserialize_with = "double_option")]
    pub first_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub last_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub password: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub email: Option<Option<String>>,
}

impl UserUpdate {
    /// `password` must already be hashed by the caller.
    pub fn into_request(self) -> UpdateRequest {
        let mut request = UpdateRequest::new();
        request
            .set_opt("firstName", self.first_name.map(|v| json!(v)))
            .set_opt("lastName", self.last_name.map(|v| json!(v)))
            .set_opt("password", self.password.map(|v| json!(v)))
            .set_opt("email", self.email.map(|v| json!(v)));
        request
    }
}

impl Validate for UserUpdate {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        if let Some(first_name) = errors.not_null(&self.first_name, "firstName") {
            errors.check(len_between(first_name, 1, 30), "firstName", "must be 1-30 characters");
        }
        if let Some(last_name) = errors.not_null(&self.last_name, "lastName") {
            errors.check(len_between(last_name, 1, 30), "lastName", "must be 1-30 characters");
        }
        if let Some(password) = errors.not_null(&self.password, "password") {
            errors.check(len_between(password, 5, 20), "password", "must be 5-20 characters");
        }
        if let Some(email) = errors.not_null(&self.email, "email") {
            errors.check(is_email(email), "email", "must be a 6-60 character email address");
        }
        errors.into_result()
    }
}

/// 6-60 characters with an `@` that is not the first character
fn is_email(value: &str) -> bool {
    len_between(value, 6, 60) && value.find('@').map_or(false, |at| at > 0)
}

pub struct Users<'a> {
    db: &'a dyn QueryExecutor,
}

impl<'a> Users<'a> {
    pub fn new(db: &'a dyn QueryExecutor) -> Self {
        Self { db }
    }

    /// The user matching `username`/`password`, or `None` on bad credentials.
    pub async fn authenticate(&self, login: &LoginRequest) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {}, password FROM users WHERE username = $1", USER_FIELDS);
        let Some(mut row) = self.db.fetch_optional(&sql, &[json!(login.username)]).await? else {
            debug!(username = %login.username, "login for unknown user");
            return Ok(None);
        };

        let hash = row
            .remove("password")
            .and_then(|v| v.as_str().map(str::to_string))
            .ok_or_else(|| DatabaseError::Decode("users.password is not text".to_string()))?;

        if bcrypt::verify(&login.password, &hash)? {
            Ok(Some(from_row(row)?))
        } else {
            debug!(username = %login.username, "login with wrong password");
            Ok(None)
        }
    }

    /// Insert a user with a bcrypt-hashed password. Duplicate usernames are a `Conflict`.
    pub async fn register(&self, data: &NewUser, bcrypt_cost: u32) -> Result<User, DatabaseError> {
        let hashed = bcrypt::hash(&data.password, bcrypt_cost)?;
        let sql = format!(
            "INSERT INTO users (username, password, first_name, last_name, email, is_admin) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {}",
            USER_FIELDS
        );
        let params = [
            json!(data.username),
            json!(hashed),
            json!(data.first_name),
            json!(data.last_name),
            json!(data.email),
            json!(data.is_admin),
        ];

        let row = match self.db.fetch_optional(&sql, &params).await {
            Err(DatabaseError::Conflict(_)) => {
                return Err(DatabaseError::Conflict(format!("Duplicate username: {}", data.username)))
            }
            other => other?,
        };
        let row = row.ok_or_else(|| DatabaseError::Decode("INSERT returned no row".to_string()))?;
        from_row(row)
    }

    pub async fn find_all(&self) -> Result<Vec<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users ORDER BY username", USER_FIELDS);
        from_rows(self.db.fetch_all(&sql, &[]).await?)
    }

    pub async fn get(&self, username: &str) -> Result<UserDetail, DatabaseError> {
        let sql = format!("SELECT {} FROM users WHERE username = $1", USER_FIELDS);
        let row = self
            .db
            .fetch_optional(&sql, &[json!(username)])
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("No user: {}", username)))?;
        let user: User = from_row(row)?;

        let applications = self
            .db
            .fetch_all(
                "SELECT job_id FROM applications WHERE username = $1 ORDER BY job_id",
                &[json!(username)],
            )
            .await?;
        let jobs = applications
            .iter()
            .map(|row| {
                row.get("job_id")
                    .and_then(|v| v.as_i64())
                    .ok_or_else(|| DatabaseError::Decode("applications.job_id is not an integer".to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(UserDetail { user, jobs })
    }

    /// Partial update. A new password is hashed before it is stored.
    pub async fn update(&self, username: &str, mut data: UserUpdate, bcrypt_cost: u32) -> Result<User, DatabaseError> {
        if let Some(Some(password)) = &data.password {
            let hashed = bcrypt::hash(password, bcrypt_cost)?;
            data.password = Some(Some(hashed));
        }
        let set = sql_for_partial_update(data.into_request(), &USER_COLUMNS)?;

        let mut key = FilterWhere::starting_at(set.values.len());
        key.eq("username", username);
        let key = key.build();

        let sql = format!("UPDATE users SET {} WHERE {} RETURNING {}", set.set_cols, key.sql, USER_FIELDS);
        let params: Vec<_> = set.values.into_iter().chain(key.params).collect();

        let row = self
            .db
            .fetch_optional(&sql, &params)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("No user: {}", username)))?;
        from_row(row)
    }

    pub async fn remove(&self, username: &str) -> Result<(), DatabaseError> {
        self.db
            .fetch_optional("DELETE FROM users WHERE username = $1 RETURNING username", &[json!(username)])
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("No user: {}", username)))?;
        Ok(())
    }

    /// Record an application of `username` to job `job_id`; returns the job id.
    pub async fn apply_to_job(&self, username: &str, job_id: &str) -> Result<i64, DatabaseError> {
        let id: i64 = job_id
            .parse()
            .map_err(|_| DatabaseError::NotFound(format!("No job: {}", job_id)))?;

        self.db
            .fetch_optional("SELECT id FROM jobs WHERE id = $1", &[json!(id)])
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("No job: {}", id)))?;
        self.db
            .fetch_optional("SELECT username FROM users WHERE username = $1", &[json!(username)])
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("No username: {}", username)))?;

        let inserted = self
            .db
            .execute(
                "INSERT INTO applications (job_id, username) VALUES ($1, $2)",
                &[json!(id), json!(username)],
            )
            .await;
        match inserted {
            Err(DatabaseError::Conflict(_)) => {
                Err(DatabaseError::Conflict(format!("Already applied to job: {}", id)))
            }
            // Job or user deleted between the lookups and the insert
            Err(DatabaseError::InvalidReference(_)) => Err(DatabaseError::NotFound(format!("No job: {}", id))),
            other => other.map(|_| id),
        }
    }
}
