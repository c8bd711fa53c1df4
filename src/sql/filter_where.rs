use serde_json::Value;

use super::placeholder;

/// Accumulates AND-joined predicates and their positional parameters.
///
/// Column names and parameterless predicates are `&'static str`, so only
/// identifiers written in code can reach the SQL text; every runtime value
/// goes through [`FilterWhere::param`].
#[derive(Debug, Default)]
pub struct FilterWhere {
    param_values: Vec<Value>,
    param_index: usize,
    conditions: Vec<String>,
}

impl FilterWhere {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue numbering after `offset` parameters that precede this clause.
    pub fn starting_at(offset: usize) -> Self {
        Self { param_index: offset, ..Self::default() }
    }

    pub fn eq(&mut self, column: &'static str, value: impl Into<Value>) -> &mut Self {
        let p = self.param(value.into());
        self.conditions.push(format!("{} = {}", column, p));
        self
    }

    pub fn gte(&mut self, column: &'static str, value: impl Into<Value>) -> &mut Self {
        let p = self.param(value.into());
        self.conditions.push(format!("{} >= {}", column, p));
        self
    }

    pub fn lte(&mut self, column: &'static str, value: impl Into<Value>) -> &mut Self {
        let p = self.param(value.into());
        self.conditions.push(format!("{} <= {}", column, p));
        self
    }

    /// Case-insensitive substring match; LIKE metacharacters in `needle` match literally.
    pub fn ilike_contains(&mut self, column: &'static str, needle: &str) -> &mut Self {
        let p = self.param(Value::String(format!("%{}%", escape_like(needle))));
        self.conditions.push(format!("{} ILIKE {}", column, p));
        self
    }

    /// Predicate with no bound parameter, e.g. `equity > 0`.
    pub fn condition(&mut self, predicate: &'static str) -> &mut Self {
        self.conditions.push(predicate.to_string());
        self
    }

    pub fn build(self) -> WhereClause {
        WhereClause {
            sql: self.conditions.join(" AND "),
            params: self.param_values,
        }
    }

    fn param(&mut self, value: Value) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        placeholder(self.param_index)
    }
}

/// Predicate text (without the `WHERE` keyword) and its bound values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereClause {
    pub sql: String,
    pub params: Vec<Value>,
}

impl WhereClause {
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    /// ` WHERE <predicates>`, or nothing when there are no predicates.
    pub fn to_clause(&self) -> String {
        if self.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.sql)
        }
    }
}

/// Escape `\`, `%` and `_` for use inside a LIKE pattern (default escape char).
pub fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn joins_predicates_with_and_in_call_order() {
        let mut w = FilterWhere::new();
        w.ilike_contains("name", "ac").gte("num_employees", 10).lte("num_employees", 50);
        let clause = w.build();

        assert_eq!(clause.sql, "name ILIKE $1 AND num_employees >= $2 AND num_employees <= $3");
        assert_eq!(clause.params, vec![json!("%ac%"), json!(10), json!(50)]);
        assert_eq!(clause.to_clause(), " WHERE name ILIKE $1 AND num_employees >= $2 AND num_employees <= $3");
    }

    #[test]
    fn static_condition_binds_nothing() {
        let mut w = FilterWhere::new();
        w.condition("equity > 0").gte("salary", 1);
        let clause = w.build();

        assert_eq!(clause.sql, "equity > 0 AND salary >= $1");
        assert_eq!(clause.params, vec![json!(1)]);
    }

    #[test]
    fn starting_at_continues_numbering() {
        let mut w = FilterWhere::starting_at(3);
        w.eq("handle", "c1");
        let clause = w.build();

        assert_eq!(clause.sql, "handle = $4");
        assert_eq!(clause.params, vec![json!("c1")]);
    }

    #[test]
    fn empty_builder_gives_empty_clause() {
        let w = FilterWhere::new();
        let clause = w.build();
        assert!(clause.is_empty());
        assert_eq!(clause.to_clause(), "");
        assert!(clause.params.is_empty());
    }

    #[test]
    fn escapes_like_metacharacters() {
        assert_eq!(escape_like("100%_off\\"), "100\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");

        let mut w = FilterWhere::new();
        w.ilike_contains("title", "50%");
        assert_eq!(w.build().params, vec![json!("%50\\%%")]);
    }
}
