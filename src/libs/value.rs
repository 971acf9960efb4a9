use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::{Map, Value};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{Column, Decode, Postgres, Row, Type, TypeInfo};

/// One result row, keyed by column name.
pub type JsonRow = Map<String, Value>;

pub type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

pub fn bind_value<'q>(query: PgQuery<'q>, value: &Value) -> PgQuery<'q> {
    match value {
        Value::String(s) => query.bind(s.clone()),
        Value::Number(n) => query.bind(n.to_string()),
        Value::Bool(b) => query.bind(*b),
        Value::Null => query.bind(None::<String>),
        other => query.bind(other.to_string()),
    }
}

pub fn bind_all<'q>(query: PgQuery<'q>, params: &[Value]) -> PgQuery<'q> {
    params.iter().fold(query, bind_value)
}

pub fn row_to_json(row: &PgRow) -> JsonRow {
    let mut map = Map::new();
    for (index, col) in row.columns().iter().enumerate() {
        map.insert(col.name().to_string(), decode_column(row, index));
    }
    map
}

fn decode_column(row: &PgRow, index: usize) -> Value {
    match row.columns()[index].type_info().name() {
        "BOOL" => get(row, index, |v: bool| Value::from(v)),
        "INT2" => get(row, index, |v: i16| Value::from(v)),
        "INT4" => get(row, index, |v: i32| Value::from(v)),
        "INT8" => get(row, index, |v: i64| Value::from(v)),
        "FLOAT4" => get(row, index, |v: f32| Value::from(f64::from(v))),
        "FLOAT8" => get(row, index, |v: f64| Value::from(v)),
        "DATE" => get(row, index, |v: NaiveDate| Value::from(v.to_string())),
        "TIME" => get(row, index, |v: NaiveTime| Value::from(v.to_string())),
        "TIMESTAMP" => get(row, index, |v: NaiveDateTime| Value::from(v.to_string())),
        "TIMESTAMPTZ" => get(row, index, |v: DateTime<Utc>| Value::from(v.to_rfc3339())),
        "JSON" | "JSONB" => get(row, index, |v: Value| v),
        _ => get(row, index, |v: String| Value::from(v)),
    }
}

/// NULL and undecodable values both come back as `Value::Null`.
fn get<'r, T, F>(row: &'r PgRow, index: usize, f: F) -> Value
where
    T: Decode<'r, Postgres> + Type<Postgres>,
    F: FnOnce(T) -> Value,
{
    match row.try_get::<Option<T>, _>(index) {
        Ok(Some(v)) => f(v),
        _ => Value::Null,
    }
}
