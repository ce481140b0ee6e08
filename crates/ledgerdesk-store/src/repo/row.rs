//! Mapping between JSON values and SQLite values
//!
//! Rows are read generically by column name so one code path serves every
//! table. Values have already been through the codec on the way in, so
//! structured values only reach this layer as text.

use base64::Engine as _;
use ledgerdesk_core::model::Record;
use rusqlite::types::{Value as SqlValue, ValueRef};
use serde_json::{Number, Value};

/// Convert an encoded JSON value to a bindable SQLite value
pub fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => n.as_f64().map(SqlValue::Real).unwrap_or(SqlValue::Null),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        Value::Array(_) | Value::Object(_) => SqlValue::Text(value.to_string()),
    }
}

/// Convert a column value read from SQLite to JSON
///
/// BLOBs are never written by the engine; if one appears it is returned
/// base64-encoded rather than failing the read.
pub fn from_sql_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => {
            Value::String(base64::engine::general_purpose::STANDARD.encode(bytes))
        }
    }
}

/// Read every column of `row` into a raw (not yet decoded) record
pub fn read_row(row: &rusqlite::Row<'_>, columns: &[String]) -> rusqlite::Result<Record> {
    let mut record = Record::new();
    for (idx, name) in columns.iter().enumerate() {
        record.insert(name.clone(), from_sql_ref(row.get_ref(idx)?));
    }
    Ok(record)
}
