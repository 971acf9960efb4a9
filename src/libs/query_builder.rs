use serde_json::Value;
use std::collections::HashMap;

/// Column name to PostgreSQL type name (`udt_name`), as read from
/// `information_schema.columns`.
pub type ColumnTypes = HashMap<String, String>;

/// `$n`, or `$n::"type"` when the column type is known.
///
/// Values arrive as text; the explicit cast lets PostgreSQL convert them into
/// integer, date and other non-text columns.
pub fn placeholder(index: usize, cast: Option<&str>) -> String {
    match cast {
        Some(ty) => format!("${}::\"{}\"", index, ty.replace('"', "\"\"")),
        None => format!("${}", index),
    }
}

// Unquoted identifiers are folded to lower case by the server.
fn cast_for<'t>(types: &'t ColumnTypes, column: &str) -> Option<&'t str> {
    types
        .get(column)
        .or_else(|| types.get(&column.to_lowercase()))
        .map(String::as_str)
}

pub struct QueryBuilder<'a> {
    table: String,
    types: Option<&'a ColumnTypes>,
    wheres: Vec<String>,
    limit_clause: Option<String>,
    params: Vec<Value>,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            types: None,
            wheres: vec![],
            limit_clause: None,
            params: Vec::new(),
        }
    }

    /// Cast each bound value to the type of the column it is compared with.
    pub fn with_types(mut self, types: &'a ColumnTypes) -> Self {
        self.types = Some(types);
        self
    }

    /// `column = $n`, ANDed with any earlier condition.
    pub fn r#where(mut self, column: &str, value: Value) -> Self {
        let cast = self.types.and_then(|t| cast_for(t, column));
        self.wheres.push(format!(
            "{} = {}",
            column,
            placeholder(self.params.len() + 1, cast)
        ));
        self.params.push(value);
        self
    }

    /// One equality condition per column/value pair, ANDed together.
    pub fn where_eq<S: AsRef<str>>(mut self, columns: &[S], values: &[Value]) -> Self {
        for (column, value) in columns.iter().zip(values) {
            self = self.r#where(column.as_ref(), value.clone());
        }
        self
    }

    pub fn limit(mut self, n: i64) -> Self {
        self.limit_clause = Some(format!("LIMIT {}", n));
        self
    }

    pub fn build_sql(&self) -> String {
        let mut sql = format!("SELECT * FROM {}", self.table);
        if !self.wheres.is_empty() {
            sql += &format!(" WHERE {}", self.wheres.join(" AND "));
        }
        if let Some(limit) = &self.limit_clause {
            sql += &format!(" {}", limit);
        }
        sql
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }
}

pub struct InsertBuilder<'a> {
    table: String,
    types: Option<&'a ColumnTypes>,
    columns: Vec<String>,
    placeholders: Vec<String>,
    params: Vec<Value>,
}

impl<'a> InsertBuilder<'a> {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            types: None,
            columns: Vec::new(),
            placeholders: Vec::new(),
            params: Vec::new(),
        }
    }

    pub fn with_types(mut self, types: &'a ColumnTypes) -> Self {
        self.types = Some(types);
        self
    }

    pub fn value(mut self, column: &str, value: Value) -> Self {
        let cast = self.types.and_then(|t| cast_for(t, column));
        self.placeholders
            .push(placeholder(self.params.len() + 1, cast));
        self.columns.push(column.to_string());
        self.params.push(value);
        self
    }

    pub fn values<S: AsRef<str>>(mut self, columns: &[S], values: &[Value]) -> Self {
        for (column, value) in columns.iter().zip(values) {
            self = self.value(column.as_ref(), value.clone());
        }
        self
    }

    pub fn build_sql(&self) -> String {
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            self.columns.join(", "),
            self.placeholders.join(", ")
        )
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }
}
