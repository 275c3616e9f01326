/// Row codec - converts between model values and SQLite's native values
///
/// Everything passes through unchanged except dates, which travel as epoch
/// seconds (sub-second precision is dropped), and bits, which travel as 0/1.
use crate::error::{MiniDbError, Result};
use crate::model::{Model, Record};
use crate::types::{from_epoch_secs, to_epoch_secs, ColumnType, TableMetadata, Value};
use rusqlite::types::Value as SqlValue;

/// Encode a value for binding against a column of `column_type`
///
/// Values carry their own tag, so the column type never changes the
/// encoding; `null` stays `null` for every type.
pub fn encode(value: &Value, _column_type: ColumnType) -> SqlValue {
    encode_untyped(value)
}

/// Encode a value bound outside any column (raw statements)
pub fn encode_untyped(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Date(d) => SqlValue::Integer(to_epoch_secs(d)),
        Value::Integer(i) => SqlValue::Integer(*i),
        Value::Float(f) => SqlValue::Real(*f),
        Value::Text(s) => SqlValue::Text(s.clone()),
        Value::Blob(b) => SqlValue::Blob(b.clone()),
        Value::Bit(b) => SqlValue::Integer(*b as i64),
    }
}

/// Decode a stored value of a column of `column_type`
pub fn decode(value: SqlValue, column_type: ColumnType) -> Result<Value> {
    let decoded = match (column_type, value) {
        (_, SqlValue::Null) => Value::Null,
        (ColumnType::Date, SqlValue::Integer(secs)) => Value::Date(from_epoch_secs(secs)?),
        (ColumnType::Date, SqlValue::Real(secs)) => Value::Date(from_epoch_secs(secs.trunc() as i64)?),
        (ColumnType::Bit, SqlValue::Integer(i)) => Value::Bit(i != 0),
        (ColumnType::Float, SqlValue::Integer(i)) => Value::Float(i as f64),
        (ColumnType::Float, SqlValue::Real(f)) => Value::Float(f),
        (ColumnType::Integer, SqlValue::Integer(i)) => Value::Integer(i),
        (ColumnType::String, SqlValue::Text(s)) => Value::Text(s),
        (ColumnType::Blob, SqlValue::Blob(b)) => Value::Blob(b),
        (column_type, other) => {
            return Err(MiniDbError::TypeError(format!(
                "cannot decode {:?} as {:?}",
                other.data_type(),
                column_type
            )))
        }
    };
    Ok(decoded)
}

/// Decode without a declared column type (raw queries)
pub fn decode_untyped(value: SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(i) => Value::Integer(i),
        SqlValue::Real(f) => Value::Float(f),
        SqlValue::Text(s) => Value::Text(s),
        SqlValue::Blob(b) => Value::Blob(b),
    }
}

/// Rebuild a model from a row selected in column-declaration order
pub fn row_to_model<M: Model>(row: &rusqlite::Row<'_>, table: &TableMetadata) -> Result<M> {
    let mut model = M::default();
    for (i, (name, column)) in table.columns.iter().enumerate() {
        let raw: SqlValue = row.get(i)?;
        model.set(name, decode(raw, column.column_type)?)?;
    }
    Ok(model)
}

/// Untyped row, columns named as reported by the statement
pub fn row_to_record(row: &rusqlite::Row<'_>, column_names: &[String]) -> Result<Record> {
    let mut record = Record::new();
    for (i, name) in column_names.iter().enumerate() {
        let raw: SqlValue = row.get(i)?;
        record.push(name.clone(), decode_untyped(raw));
    }
    Ok(record)
}
