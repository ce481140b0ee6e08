//! Record codec
//!
//! Bridges the in-memory record model and the flat relational row:
//!
//! - structured values (objects, arrays) are written as JSON text
//! - booleans in boolean columns are written as 0/1
//! - on read, JSON columns holding text are parsed back and boolean
//!   columns are converted by truthiness
//!
//! A JSON column whose stored text does not parse is returned unchanged.
//! The anomaly is logged and reported to an optional [`DecodeHook`] so a
//! single malformed legacy value never poisons a whole read.

use crate::errors::{unknown_column, Result};
use crate::model::{ColumnType, EntityDescriptor, Record};
use serde_json::{Number, Value};
use std::sync::Arc;

/// A JSON column that could not be parsed on read
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeAnomaly {
    pub table: String,
    pub column: String,
    pub raw: String,
    pub error: String,
}

/// Diagnostic callback invoked for every [`DecodeAnomaly`]
pub type DecodeHook = Arc<dyn Fn(&DecodeAnomaly) + Send + Sync>;

/// Serialize structured values to JSON text; everything else passes through
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Object(_) | Value::Array(_) => Value::String(value.to_string()),
        other => other.clone(),
    }
}

/// Encode every field of `record` for writing to `descriptor`'s table
///
/// Fails with `InvalidInput` if a field is not a declared column. The
/// returned pairs keep the record's field order and use the descriptor's
/// static column names. Values are normalized to their column's storage
/// class (see [`normalize_for_column`]) so every backend stores the same
/// thing.
pub fn encode_record(
    descriptor: &EntityDescriptor,
    record: &Record,
    op: &str,
) -> Result<Vec<(&'static str, Value)>> {
    record
        .iter()
        .map(|(key, value)| {
            let column = descriptor
                .column(key)
                .ok_or_else(|| unknown_column(op, descriptor.table, key))?;
            Ok((column.name, normalize_for_column(column.ty, value)))
        })
        .collect()
}

/// Coerce a value to the storage class of a column
///
/// Mirrors SQLite column affinity, applied before the write:
///
/// - `Real`: numbers and numeric strings become floats
/// - `Integer`: integral numbers and numeric strings become integers;
///   fractional values stay floats
/// - `Boolean`: `true`/`false` become 1/0, otherwise as `Integer`
/// - `Text`: numbers and booleans become their JSON text
/// - `Json`: structures and non-string scalars become JSON text, so decode
///   restores them exactly; strings are stored as given
///
/// Null, and strings that are not numbers, pass through unchanged.
pub fn normalize_for_column(ty: ColumnType, value: &Value) -> Value {
    match (ty, value) {
        (_, Value::Null) => Value::Null,
        (ColumnType::Json, Value::String(_)) => value.clone(),
        (ColumnType::Json, other) => Value::String(other.to_string()),
        (ColumnType::Text, Value::Number(_) | Value::Bool(_)) => Value::String(value.to_string()),
        (ColumnType::Text, _) => encode_value(value),
        (ColumnType::Boolean, Value::Bool(b)) => Value::from(i64::from(*b)),
        (ColumnType::Integer, Value::Bool(b)) => Value::from(i64::from(*b)),
        (ColumnType::Real, Value::Bool(b)) => Value::from(f64::from(u8::from(*b))),
        (ColumnType::Real, _) => match numeric(value) {
            Some(f) => float_value(f),
            None => encode_value(value),
        },
        (ColumnType::Integer | ColumnType::Boolean, _) => {
            if let Some(i) = value.as_i64() {
                return Value::from(i);
            }
            match numeric(value) {
                Some(f) if is_exact_integer(f) => Value::from(f as i64),
                Some(f) => float_value(f),
                None => encode_value(value),
            }
        }
    }
}

/// Numeric reading of a number or a numeric string
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn float_value(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

/// Integral and within the range where f64 represents integers exactly
fn is_exact_integer(f: f64) -> bool {
    const EXACT: f64 = 9_007_199_254_740_992.0;
    f.fract() == 0.0 && f.abs() <= EXACT
}

/// Decode a raw row read from `table`
///
/// `json_fields` present as strings are parsed; `bool_fields` present are
/// converted by truthiness. All other fields are returned as read.
pub fn decode_record(
    table: &str,
    mut row: Record,
    json_fields: &[&str],
    bool_fields: &[&str],
    hook: Option<&DecodeHook>,
) -> Record {
    for &field in json_fields {
        let Some(Value::String(raw)) = row.get(field) else {
            continue;
        };
        let raw = raw.clone();
        match serde_json::from_str::<Value>(&raw) {
            Ok(parsed) => {
                row.insert(field, parsed);
            }
            Err(e) => {
                tracing::warn!(
                    table = table,
                    column = field,
                    error = %e,
                    "Stored JSON column did not parse; returning raw text"
                );
                if let Some(hook) = hook {
                    hook(&DecodeAnomaly {
                        table: table.to_string(),
                        column: field.to_string(),
                        raw,
                        error: e.to_string(),
                    });
                }
            }
        }
    }

    for &field in bool_fields {
        if let Some(value) = row.get(field) {
            let flag = truthy(value);
            row.insert(field, Value::Bool(flag));
        }
    }

    row
}

/// Decode a raw row using the allowlists of `descriptor`
///
/// Integral values in `Real` columns come back as JSON integers: JSON
/// numbers carry no float/integer distinction, and `100` must read back
/// equal to what was written.
pub fn decode_for(
    descriptor: &EntityDescriptor,
    row: Record,
    hook: Option<&DecodeHook>,
) -> Record {
    let mut row = decode_record(
        descriptor.table,
        row,
        &descriptor.json_columns(),
        &descriptor.bool_columns(),
        hook,
    );
    for column in descriptor.columns.iter().filter(|c| c.ty == ColumnType::Real) {
        let integral = match row.get(column.name) {
            Some(Value::Number(n)) if n.is_f64() => n
                .as_f64()
                .filter(|f| is_exact_integer(*f))
                .map(|f| f as i64),
            _ => None,
        };
        if let Some(i) = integral {
            row.insert(column.name, Value::from(i));
        }
    }
    row
}

/// Truthiness used for boolean columns
///
/// Non-zero numbers and non-empty strings are true; null is false.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ExErrorKind;
    use crate::model::Entity;
    use serde_json::json;
    use std::sync::Mutex;

    #[test]
    fn test_encode_value_serializes_structures_only() {
        assert_eq!(encode_value(&json!({"2024": "abc"})), json!("{\"2024\":\"abc\"}"));
        assert_eq!(encode_value(&json!(["a", "b"])), json!("[\"a\",\"b\"]"));
        assert_eq!(encode_value(&json!(null)), json!(null));
        assert_eq!(encode_value(&json!("text")), json!("text"));
        assert_eq!(encode_value(&json!(9.99)), json!(9.99));
        assert_eq!(encode_value(&json!(true)), json!(true));
    }

    #[test]
    fn test_encode_record_converts_declared_booleans() {
        let d = Entity::Products.descriptor();
        let record = Record::new()
            .with("id", json!("p1"))
            .with("active", json!(true));

        let encoded = encode_record(d, &record, "upsert").unwrap();
        assert!(encoded.contains(&("active", json!(1))));
        assert!(encoded.contains(&("id", json!("p1"))));
    }

    #[test]
    fn test_encode_record_normalizes_to_column_storage_class() {
        // Given values whose JSON type differs from their column type
        let products = Entity::Products.descriptor();
        let record = Record::new()
            .with("id", json!("p1"))
            .with("name", json!(5))
            .with("price", json!(10))
            .with("stock", json!("42"))
            .with("active", json!("1"));

        // When encoded
        let encoded = encode_record(products, &record, "upsert").unwrap();

        // Then each lands in its column's storage class
        assert!(encoded.contains(&("name", json!("5"))));
        assert!(encoded.contains(&("price", json!(10.0))));
        assert!(encoded.contains(&("stock", json!(42))));
        assert!(encoded.contains(&("active", json!(1))));
    }

    #[test]
    fn test_normalize_integer_and_real_edges() {
        assert_eq!(normalize_for_column(ColumnType::Integer, &json!(7.0)), json!(7));
        assert_eq!(normalize_for_column(ColumnType::Integer, &json!(7.5)), json!(7.5));
        assert_eq!(normalize_for_column(ColumnType::Integer, &json!(" 12 ")), json!(12));
        assert_eq!(normalize_for_column(ColumnType::Integer, &json!("abc")), json!("abc"));
        assert_eq!(normalize_for_column(ColumnType::Integer, &json!(false)), json!(0));
        assert_eq!(normalize_for_column(ColumnType::Real, &json!("9.99")), json!(9.99));
        assert_eq!(normalize_for_column(ColumnType::Real, &json!(true)), json!(1.0));
        assert_eq!(normalize_for_column(ColumnType::Real, &json!("n/a")), json!("n/a"));
        assert_eq!(normalize_for_column(ColumnType::Text, &json!(false)), json!("false"));
        assert_eq!(normalize_for_column(ColumnType::Real, &json!(null)), json!(null));
    }

    #[test]
    fn test_json_scalars_survive_encode_and_decode() {
        let insights = Entity::Insights.descriptor();
        for data in [json!(true), json!(5), json!(2.5)] {
            let record = Record::new().with("id", json!("i1")).with("data", data.clone());
            let stored: Record = encode_record(insights, &record, "upsert")
                .unwrap()
                .into_iter()
                .map(|(column, value)| (column.to_string(), value))
                .collect();
            assert!(stored.get("data").unwrap().is_string());

            let decoded = decode_for(insights, stored, None);
            assert_eq!(decoded.get("data"), Some(&data));
        }
    }

    #[test]
    fn test_decode_reads_integral_reals_as_integers() {
        let transactions = Entity::Transactions.descriptor();
        let row = Record::new()
            .with("id", json!("t1"))
            .with("value", json!(100.0))
            .with("status", json!("paid"));

        let decoded = decode_for(transactions, row, None);
        assert_eq!(decoded.get("value"), Some(&json!(100)));

        let row = Record::new().with("id", json!("t2")).with("value", json!(9.99));
        let decoded = decode_for(transactions, row, None);
        assert_eq!(decoded.get("value"), Some(&json!(9.99)));
    }

    #[test]
    fn test_encode_record_rejects_unknown_column() {
        let d = Entity::Clients.descriptor();
        let record = Record::new()
            .with("id", json!("c1"))
            .with("favourite_colour", json!("blue"));

        let err = encode_record(d, &record, "upsert").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidInput);
        assert_eq!(err.table(), Some("clients"));
        assert!(err.message().contains("favourite_colour"));
    }

    #[test]
    fn test_decode_parses_json_and_coerces_booleans() {
        let row = Record::new()
            .with("id", json!("system-config"))
            .with("sheet_ids", json!("{\"2024\":\"abc\"}"))
            .with("require_auth", json!(1))
            .with("sync_enabled", json!(0));

        let decoded = decode_for(Entity::SystemConfig.descriptor(), row, None);
        assert_eq!(decoded.get("sheet_ids"), Some(&json!({"2024": "abc"})));
        assert_eq!(decoded.get("require_auth"), Some(&json!(true)));
        assert_eq!(decoded.get("sync_enabled"), Some(&json!(false)));
    }

    #[test]
    fn test_decode_leaves_malformed_json_and_reports_it() {
        let seen: Arc<Mutex<Vec<DecodeAnomaly>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let hook: DecodeHook = Arc::new(move |a: &DecodeAnomaly| {
            sink.lock().unwrap().push(a.clone());
        });

        let row = Record::new()
            .with("id", json!("c1"))
            .with("tags", json!("vip, wholesale"));
        let decoded = decode_record("clients", row, &["tags"], &[], Some(&hook));

        assert_eq!(decoded.get("tags"), Some(&json!("vip, wholesale")));
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].column, "tags");
        assert_eq!(seen[0].raw, "vip, wholesale");
    }

    #[test]
    fn test_decode_skips_absent_and_non_string_json_fields() {
        let row = Record::new()
            .with("id", json!("s1"))
            .with("data", json!(null));
        let decoded = decode_record("syncData", row.clone(), &["data", "tags"], &[], None);
        assert_eq!(decoded, row);
    }

    #[test]
    fn test_truthiness() {
        assert!(truthy(&json!(1)));
        assert!(truthy(&json!(-2.5)));
        assert!(!truthy(&json!(0)));
        assert!(!truthy(&json!(0.0)));
        assert!(truthy(&json!("0")));
        assert!(!truthy(&json!("")));
        assert!(!truthy(&json!(null)));
        assert!(truthy(&json!([])));
    }

    #[test]
    fn test_other_columns_are_identity() {
        let row = Record::new()
            .with("id", json!("p1"))
            .with("name", json!("{\"not\":\"decoded\"}"))
            .with("stock", json!(1));
        let decoded = decode_for(Entity::Products.descriptor(), row.clone(), None);
        assert_eq!(decoded, row);
    }
}
