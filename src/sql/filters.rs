use serde::Deserialize;

use super::error::SqlError;
use super::filter_where::{FilterWhere, WhereClause};

/// A fixed set of optional list filters for one entity.
///
/// Predicates are emitted in a documented, fixed order so identical input
/// always yields identical SQL and placeholder numbering.
pub trait FilterSpec {
    fn to_where(&self) -> WhereClause;
}

/// `GET /companies` filters. Order: name, minEmployees, maxEmployees.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CompanyFilter {
    #[serde(alias = "nameLike")]
    pub name: Option<String>,
    pub min_employees: Option<i64>,
    pub max_employees: Option<i64>,
}

impl CompanyFilter {
    /// Reject `minEmployees > maxEmployees`. The composer itself stays mechanical.
    pub fn check_range(&self) -> Result<(), SqlError> {
        match (self.min_employees, self.max_employees) {
            (Some(min), Some(max)) if min > max => Err(SqlError::InvalidRange {
                min_field: "minEmployees",
                max_field: "maxEmployees",
                min,
                max,
            }),
            _ => Ok(()),
        }
    }
}

impl FilterSpec for CompanyFilter {
    fn to_where(&self) -> WhereClause {
        let mut w = FilterWhere::new();
        if let Some(name) = &self.name {
            w.ilike_contains("name", name);
        }
        if let Some(min) = self.min_employees {
            w.gte("num_employees", min);
        }
        if let Some(max) = self.max_employees {
            w.lte("num_employees", max);
        }
        w.build()
    }
}

/// `GET /jobs` filters. Order: title, minSalary, hasEquity.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct JobFilter {
    pub title: Option<String>,
    pub min_salary: Option<i64>,
    pub has_equity: Option<bool>,
}

impl FilterSpec for JobFilter {
    fn to_where(&self) -> WhereClause {
        let mut w = FilterWhere::new();
        if let Some(title) = &self.title {
            w.ilike_contains("title", title);
        }
        if let Some(min) = self.min_salary {
            w.gte("salary", min);
        }
        if self.has_equity == Some(true) {
            w.condition("equity > 0");
        }
        w.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn no_filters_no_clause() {
        let clause = JobFilter::default().to_where();
        assert_eq!(clause.sql, "");
        assert!(clause.params.is_empty());

        let clause = CompanyFilter::default().to_where();
        assert_eq!(clause.sql, "");
        assert!(clause.params.is_empty());
    }

    #[test]
    fn min_salary_only() {
        let filter = JobFilter { min_salary: Some(200), ..Default::default() };
        let clause = filter.to_where();
        assert_eq!(clause.sql, "salary >= $1");
        assert_eq!(clause.params, vec![json!(200)]);
    }

    #[test]
    fn has_equity_adds_predicate_without_param() {
        let filter = JobFilter { title: Some("eng".into()), has_equity: Some(true), ..Default::default() };
        let clause = filter.to_where();
        assert_eq!(clause.sql, "title ILIKE $1 AND equity > 0");
        assert_eq!(clause.params, vec![json!("%eng%")]);
    }

    #[test]
    fn has_equity_false_is_ignored() {
        let filter = JobFilter { has_equity: Some(false), ..Default::default() };
        assert!(filter.to_where().is_empty());
    }

    #[test]
    fn all_job_filters_in_fixed_order() {
        let filter = JobFilter { title: Some("dev".into()), min_salary: Some(5), has_equity: Some(true) };
        let clause = filter.to_where();
        assert_eq!(clause.sql, "title ILIKE $1 AND salary >= $2 AND equity > 0");
        assert_eq!(clause.params, vec![json!("%dev%"), json!(5)]);
    }

    #[test]
    fn all_company_filters_in_fixed_order() {
        let filter = CompanyFilter { name: Some("c".into()), min_employees: Some(1), max_employees: Some(2) };
        let clause = filter.to_where();
        assert_eq!(clause.sql, "name ILIKE $1 AND num_employees >= $2 AND num_employees <= $3");
        assert_eq!(clause.params, vec![json!("%c%"), json!(1), json!(2)]);
        assert_eq!(filter.to_where(), clause);
    }

    #[test]
    fn inverted_bounds_still_compose() {
        let filter = CompanyFilter { min_employees: Some(5), max_employees: Some(1), ..Default::default() };
        assert_eq!(filter.to_where().sql, "num_employees >= $1 AND num_employees <= $2");
        assert_eq!(
            filter.check_range(),
            Err(SqlError::InvalidRange { min_field: "minEmployees", max_field: "maxEmployees", min: 5, max: 1 })
        );
    }

    #[test]
    fn deserializes_query_style_keys() {
        let filter: CompanyFilter = serde_json::from_value(json!({ "nameLike": "net", "minEmployees": 3 })).unwrap();
        assert_eq!(filter.name.as_deref(), Some("net"));
        assert_eq!(filter.min_employees, Some(3));

        let unknown = serde_json::from_value::<JobFilter>(json!({ "salary": 3 }));
        assert!(unknown.is_err());
    }
}
