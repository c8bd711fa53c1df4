use serde_json::Value;

use super::error::SqlError;
use super::placeholder;

/// Sparse field -> value mapping for a partial update, in insertion order.
///
/// Keys are logical (API-facing) field names; [`ColumnAlias`] maps them to
/// physical columns when the two differ.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateRequest {
    fields: Vec<(String, Value)>,
}

impl UpdateRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field. Setting the same field twice replaces the value in place.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let field = field.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some(entry) => entry.1 = value,
            None => self.fields.push((field, value)),
        }
        self
    }

    /// Set a field only when a value was supplied (None => skip).
    pub fn set_opt<V: Into<Value>>(&mut self, field: &str, value: Option<V>) -> &mut Self {
        if let Some(v) = value {
            self.set(field, v);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for UpdateRequest {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut request = Self::new();
        for (k, v) in iter {
            request.set(k, v);
        }
        request
    }
}

/// Logical field name -> physical column name, for the names that differ.
///
/// An optional allowlist restricts which logical names may be updated at all.
#[derive(Debug, Clone, Copy)]
pub struct ColumnAlias {
    aliases: &'static [(&'static str, &'static str)],
    allowed: Option<&'static [&'static str]>,
}

impl ColumnAlias {
    pub const fn new(aliases: &'static [(&'static str, &'static str)]) -> Self {
        Self { aliases, allowed: None }
    }

    pub const fn allow(self, fields: &'static [&'static str]) -> Self {
        Self { aliases: self.aliases, allowed: Some(fields) }
    }

    /// Physical column for a logical field; unknown names pass through.
    pub fn resolve<'a>(&self, field: &'a str) -> &'a str {
        self.aliases
            .iter()
            .find(|(logical, _)| *logical == field)
            .map(|(_, physical)| *physical)
            .unwrap_or(field)
    }

    fn check(&self, field: &str) -> Result<(), SqlError> {
        if !is_identifier(field) {
            return Err(SqlError::InvalidField(field.to_string()));
        }
        if let Some(allowed) = self.allowed {
            if !allowed.contains(&field) {
                return Err(SqlError::InvalidField(field.to_string()));
            }
        }
        Ok(())
    }
}

/// SET portion of an UPDATE plus its bound values.
#[derive(Debug, Clone, PartialEq)]
pub struct SetFragment {
    pub set_cols: String,
    pub values: Vec<Value>,
}

impl SetFragment {
    /// Placeholder number the caller must use for the next parameter.
    pub fn next_placeholder(&self) -> usize {
        self.values.len() + 1
    }
}

/// Build `"col1"=$1, "col2"=$2, ...` for the fields present in `update`.
///
/// `{firstName: 'Aliya', age: 32}` => `"first_name"=$1, "age"=$2`
pub fn sql_for_partial_update(update: UpdateRequest, aliases: &ColumnAlias) -> Result<SetFragment, SqlError> {
    if update.is_empty() {
        return Err(SqlError::NoFieldsProvided);
    }

    let mut cols = Vec::with_capacity(update.len());
    let mut values = Vec::with_capacity(update.len());
    for (idx, (field, value)) in update.fields.into_iter().enumerate() {
        aliases.check(&field)?;
        cols.push(format!("\"{}\"={}", aliases.resolve(&field), placeholder(idx + 1)));
        values.push(value);
    }

    Ok(SetFragment { set_cols: cols.join(", "), values })
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
