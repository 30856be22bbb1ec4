use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;
use sqlx::mysql::MySqlArguments;
use sqlx::query::QueryAs;
use sqlx::{Executor, MySql};

use crate::error::ApiError;

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    I64(i64),
    U64(u64),
    F64(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Null,
}

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// Maps an accepted JSON key to its column.
pub type ColumnMap<'a> = &'a [(&'a str, &'a str)];

/// ===============================
/// Build dynamic UPDATE SQL
/// ===============================
///
/// Only keys listed in `columns` are accepted; anything else is rejected so
/// request bodies never reach the SQL text.
pub fn build_update_sql(
    table: &str,
    payload: &Value,
    columns: ColumnMap<'_>,
    id_column: &str,
    id_value: u64,
) -> Result<SqlUpdate, ApiError> {
    let obj = payload
        .as_object()
        .ok_or_else(|| ApiError::bad_request("Payload must be a JSON object"))?;

    if obj.is_empty() {
        return Err(ApiError::bad_request("No fields provided for update"));
    }

    let mut assignments = Vec::with_capacity(obj.len());
    let mut values = Vec::with_capacity(obj.len() + 1);

    for (key, value) in obj {
        let column = columns
            .iter()
            .find(|(json_key, _)| json_key == key)
            .map(|(_, column)| *column)
            .ok_or_else(|| ApiError::bad_request(format!("Field `{key}` cannot be updated")))?;

        assignments.push(format!("{column} = ?"));
        values.push(to_sql_value(value)?);
    }

    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ?",
        table,
        assignments.join(", "),
        id_column
    );

    // WHERE id = ?
    values.push(SqlValue::U64(id_value));

    Ok(SqlUpdate { sql, values })
}

fn to_sql_value(value: &Value) -> Result<SqlValue, ApiError> {
    Ok(match value {
        Value::String(s) => {
            if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                SqlValue::Date(d)
            } else if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
                SqlValue::DateTime(dt)
            } else {
                SqlValue::String(s.clone())
            }
        }
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                SqlValue::U64(u)
            } else if let Some(i) = n.as_i64() {
                SqlValue::I64(i)
            } else if let Some(f) = n.as_f64() {
                SqlValue::F64(f)
            } else {
                return Err(ApiError::bad_request("Unsupported number"));
            }
        }
        Value::Bool(b) => SqlValue::Bool(*b),
        Value::Null => SqlValue::Null,
        _ => return Err(ApiError::bad_request("Unsupported JSON value type")),
    })
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update<'c, E>(executor: E, update: SqlUpdate) -> Result<u64, sqlx::Error>
where
    E: Executor<'c, Database = MySql>,
{
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::I64(v) => query.bind(v),
            SqlValue::U64(v) => query.bind(v),
            SqlValue::F64(v) => query.bind(v),
            SqlValue::Bool(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
            SqlValue::DateTime(v) => query.bind(v),
            SqlValue::Null => query.bind(None::<String>),
        };
    }

    let result = query.execute(executor).await?;
    Ok(result.rows_affected())
}

/// Binds dynamically collected filter values in order.
pub fn bind_values<'q, O>(
    mut query: QueryAs<'q, MySql, O, MySqlArguments>,
    values: Vec<SqlValue>,
) -> QueryAs<'q, MySql, O, MySqlArguments> {
    for value in values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::I64(v) => query.bind(v),
            SqlValue::U64(v) => query.bind(v),
            SqlValue::F64(v) => query.bind(v),
            SqlValue::Bool(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
            SqlValue::DateTime(v) => query.bind(v),
            SqlValue::Null => query.bind(None::<String>),
        };
    }
    query
}

/// `%value%` for a `LIKE ... ESCAPE` match, with backslash, `%` and `_` taken literally.
pub fn contains_pattern(value: &str) -> String {
    let mut pattern = String::with_capacity(value.len() + 2);
    pattern.push('%');
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const COLUMNS: ColumnMap<'static> = &[
        ("firstName", "first_name"),
        ("joiningDate", "joining_date"),
        ("ctc", "ctc"),
    ];

    #[test]
    fn maps_json_keys_to_columns() {
        let update = build_update_sql(
            "employees",
            &json!({"firstName": "Asha", "ctc": 42000.5}),
            COLUMNS,
            "id",
            9,
        )
        .unwrap();

        assert_eq!(
            update.sql,
            "UPDATE employees SET first_name = ?, ctc = ? WHERE id = ?"
        );
        assert_eq!(
            update.values,
            vec![
                SqlValue::String("Asha".into()),
                SqlValue::F64(42000.5),
                SqlValue::U64(9)
            ]
        );
    }

    #[test]
    fn parses_dates() {
        let update = build_update_sql(
            "employees",
            &json!({"joiningDate": "2024-02-29"}),
            COLUMNS,
            "id",
            1,
        )
        .unwrap();

        assert_eq!(
            update.values[0],
            SqlValue::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())
        );
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = build_update_sql(
            "employees",
            &json!({"id = 1; DROP TABLE employees; --": 1}),
            COLUMNS,
            "id",
            1,
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn rejects_empty_and_non_object_payloads() {
        assert!(build_update_sql("employees", &json!({}), COLUMNS, "id", 1).is_err());
        assert!(build_update_sql("employees", &json!([1, 2]), COLUMNS, "id", 1).is_err());
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(contains_pattern("asha"), "%asha%");
        assert_eq!(contains_pattern("_"), "%\\_%");
        assert_eq!(contains_pattern("50%"), "%50\\%%");
        assert_eq!(contains_pattern(r"a\b"), r"%a\\b%");
    }
}
