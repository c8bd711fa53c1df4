mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{company_row, test_app};
use jobly_api::database::DatabaseError;

fn job_row(id: i64, title: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "salary": 100,
        "equity": "0.1",
        "companyHandle": "c1"
    })
}

#[tokio::test]
async fn list_with_title_and_equity() -> Result<()> {
    let app = test_app();
    app.db.push_rows(vec![job_row(1, "Engineer")]);

    let (status, body) = app.get("/jobs?title=eng&hasEquity=true", None).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["jobs"][0]["companyHandle"], "c1");

    let (sql, params) = app.db.call(0);
    assert!(sql.contains(" WHERE title ILIKE $1 AND equity > 0 ORDER BY title"));
    assert_eq!(params, vec![json!("%eng%")]);
    Ok(())
}

#[tokio::test]
async fn has_equity_false_adds_nothing() -> Result<()> {
    let app = test_app();

    app.get("/jobs?hasEquity=false", None).await?;

    let (sql, params) = app.db.call(0);
    assert!(!sql.contains("WHERE"));
    assert!(params.is_empty());
    Ok(())
}

#[tokio::test]
async fn min_salary_filter() -> Result<()> {
    let app = test_app();

    app.get("/jobs?minSalary=200", None).await?;

    let (sql, params) = app.db.call(0);
    assert!(sql.contains(" WHERE salary >= $1 "));
    assert_eq!(params, vec![json!(200)]);
    Ok(())
}

#[tokio::test]
async fn non_numeric_salary_is_rejected() -> Result<()> {
    let app = test_app();

    let (status, _) = app.get("/jobs?minSalary=lots", None).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.db.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn get_nests_company() -> Result<()> {
    let app = test_app();
    app.db.push_rows(vec![job_row(7, "J")]);
    app.db.push_rows(vec![company_row("c1", "C1")]);

    let (status, body) = app.get("/jobs/7", None).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["job"]["id"], 7);
    assert_eq!(body["job"]["company"]["handle"], "c1");
    assert!(body["job"].get("companyHandle").is_none());

    let (_, params) = app.db.call(0);
    assert_eq!(params, vec![json!(7)]);
    Ok(())
}

#[tokio::test]
async fn non_numeric_id_is_not_found() -> Result<()> {
    let app = test_app();

    let (status, body) = app.get("/jobs/abc", None).await?;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No job: abc");
    assert!(app.db.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn admin_creates_job() -> Result<()> {
    let app = test_app();
    app.db.push_rows(vec![job_row(9, "New")]);
    let token = app.admin_token();

    let (status, body) = app
        .post(
            "/jobs",
            Some(&token),
            json!({ "title": "New", "salary": 100, "equity": 0.1, "companyHandle": "c1" }),
        )
        .await?;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["job"]["id"], 9);

    let (_, params) = app.db.call(0);
    assert_eq!(params, vec![json!("New"), json!(100), json!(0.1), json!("c1")]);
    Ok(())
}

#[tokio::test]
async fn create_for_unknown_company_is_bad_request() -> Result<()> {
    let app = test_app();
    app.db.push_err(DatabaseError::InvalidReference("jobs_company_handle_fkey".into()));
    let token = app.admin_token();

    let (status, body) = app
        .post("/jobs", Some(&token), json!({ "title": "New", "companyHandle": "nope" }))
        .await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No company: nope");
    Ok(())
}

#[tokio::test]
async fn equity_above_one_fails_validation() -> Result<()> {
    let app = test_app();
    let token = app.admin_token();

    let (status, body) = app
        .post("/jobs", Some(&token), json!({ "title": "New", "equity": 1.5, "companyHandle": "c1" }))
        .await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["field_errors"]["equity"].is_string());
    Ok(())
}

#[tokio::test]
async fn patch_salary() -> Result<()> {
    let app = test_app();
    app.db.push_rows(vec![job_row(7, "J")]);
    let token = app.admin_token();

    let (status, _) = app.patch("/jobs/7", Some(&token), json!({ "salary": 500 })).await?;

    assert_eq!(status, StatusCode::OK);
    let (sql, params) = app.db.call(0);
    assert!(sql.starts_with("UPDATE jobs SET \"salary\"=$1 WHERE id = $2 RETURNING"));
    assert_eq!(params, vec![json!(500), json!(7)]);
    Ok(())
}

#[tokio::test]
async fn patch_cannot_change_id() -> Result<()> {
    let app = test_app();
    let token = app.admin_token();

    let (status, _) = app.patch("/jobs/7", Some(&token), json!({ "id": 1000 })).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.db.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn patch_requires_admin() -> Result<()> {
    let app = test_app();
    let token = app.user_token("u1");

    let (status, _) = app.patch("/jobs/7", Some(&token), json!({ "title": "X" })).await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn delete_returns_numeric_id() -> Result<()> {
    let app = test_app();
    app.db.push_rows(vec![json!({ "id": 7 })]);
    let token = app.admin_token();

    let (status, body) = app.delete("/jobs/7", Some(&token)).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "deleted": 7 }));
    Ok(())
}

#[tokio::test]
async fn patch_to_unknown_company_names_the_handle() -> Result<()> {
    let app = test_app();
    app.db.push_err(common::driver_error(
        "23503",
        "insert or update on table \"jobs\" violates foreign key constraint \"jobs_company_handle_fkey\"",
    ));
    let token = app.admin_token();

    let (status, body) = app
        .patch("/jobs/7", Some(&token), json!({ "companyHandle": "nope" }))
        .await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No company: nope");
    assert!(!body.to_string().contains("fkey"));
    Ok(())
}

#[tokio::test]
async fn salary_beyond_integer_range_fails_validation() -> Result<()> {
    let app = test_app();
    let token = app.admin_token();

    let (status, body) = app
        .post(
            "/jobs",
            Some(&token),
            json!({ "title": "Rich", "salary": 3_000_000_000i64, "companyHandle": "c1" }),
        )
        .await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["salary"].is_string());
    assert!(app.db.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn out_of_range_from_the_database_is_a_bad_request() -> Result<()> {
    let app = test_app();
    app.db.push_err(common::driver_error("22003", "integer out of range"));
    let token = app.admin_token();

    let (status, body) = app.patch("/jobs/7", Some(&token), json!({ "salary": 5 })).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Numeric value out of range");
    Ok(())
}

#[tokio::test]
async fn patch_null_title_is_not_silently_dropped() -> Result<()> {
    let app = test_app();
    let token = app.admin_token();

    let (status, body) = app
        .patch("/jobs/7", Some(&token), json!({ "title": null, "salary": 5 }))
        .await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["field_errors"]["title"], "cannot be null");
    assert!(app.db.calls().is_empty());
    Ok(())
}
