//! Arrow interop
//!
//! Result sets come out as a [`RecordBatch`] typed from the row description,
//! and record batches go back in as `insert into ... values` statements.

use super::Cursor;
use crate::catalog::sanitize_str;
use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::paramstyle::Paramstyle;
use crate::result::{ColumnKind, ColumnLayout};
use crate::types::{Params, Row, Value};
use arrow::array::{
    Array, ArrayRef, AsArray, BinaryArray, BooleanArray, Date32Array, Float32Array, Float64Array,
    Int16Array, Int32Array, Int64Array, StringArray, TimestampMicrosecondArray,
};
use arrow::compute::cast;
use arrow::datatypes::{
    DataType, Field, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, Schema,
    TimeUnit, UInt16Type, UInt32Type, UInt64Type, UInt8Type,
};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use arrow::util::display::{ArrayFormatter, FormatOptions};
use chrono::NaiveDate;
use std::sync::Arc;

/// Widest precision `Decimal128` can hold
const MAX_DECIMAL128_PRECISION: u8 = 38;

static NULL: Value = Value::Null;

// ============================================================================
// Result set to Arrow
// ============================================================================

impl<C: Connection + ?Sized> Cursor<'_, C> {
    /// Fetch `num` rows (all remaining when `None` or zero) as a record batch
    ///
    /// Column names are the lower-cased description labels.
    pub fn fetch_dataframe(&mut self, num: Option<usize>) -> Result<RecordBatch> {
        let rows = match num {
            Some(n) if n > 0 => self.fetchmany(Some(n))?,
            _ => self.fetchall()?,
        };

        let (names, kinds) = match (self.description(), self.column_layout()) {
            (Some(description), Some(layout)) => (
                description
                    .iter()
                    .map(|col| col.label.to_lowercase())
                    .collect::<Vec<_>>(),
                layout.columns.clone(),
            ),
            _ => {
                tracing::warn!(
                    "No row description was found. Record batch will be missing column labels."
                );
                let width = rows.iter().map(Vec::len).max().unwrap_or(0);
                (
                    (0..width).map(|i| format!("column_{i}")).collect(),
                    vec![ColumnKind::Text; width],
                )
            }
        };

        rows_to_record_batch(&names, &ColumnLayout { columns: kinds }, &rows)
    }

    /// Fetch rows as bare Arrow columns
    pub fn fetch_numpy_array(&mut self, num: Option<usize>) -> Result<Vec<ArrayRef>> {
        Ok(self.fetch_dataframe(num)?.columns().to_vec())
    }

    /// Insert every row of `batch` into `table`
    ///
    /// An empty batch does nothing. Any failure, including an unknown table,
    /// is reported as a single interface error; the cause is logged.
    pub fn write_dataframe(&mut self, batch: &RecordBatch, table: &str) -> Result<()> {
        if batch.num_rows() == 0 {
            return Ok(());
        }
        self.insert_record_batch(batch, table).map_err(|e| {
            tracing::debug!("Record batch insert into {} failed: {}", table, e);
            Error::interface(format!(
                "An error occurred when attempting to insert the record batch into {table}"
            ))
        })
    }

    fn insert_record_batch(&mut self, batch: &RecordBatch, table: &str) -> Result<()> {
        if !self.is_valid_table(table)? {
            return Err(Error::interface(format!(
                "Invalid table name passed to write_dataframe: {table}"
            )));
        }
        let placeholders = vec!["%s"; batch.num_columns()].join(", ");
        let sql = format!("insert into {} values ({})", sanitize_str(table), placeholders);
        let mut rows = record_batch_to_rows(batch)?;

        let mut guard = self.with_paramstyle(Paramstyle::Format);
        if rows.len() == 1 {
            let row = rows.remove(0);
            guard.execute(&sql, Params::Positional(row))?;
        } else {
            guard.executemany(&sql, rows)?;
        }
        Ok(())
    }
}

fn arrow_type(kind: ColumnKind) -> DataType {
    match kind {
        ColumnKind::Bool => DataType::Boolean,
        ColumnKind::Int16 => DataType::Int16,
        ColumnKind::Int32 => DataType::Int32,
        ColumnKind::Int64 => DataType::Int64,
        ColumnKind::Float32 => DataType::Float32,
        ColumnKind::Float64 => DataType::Float64,
        ColumnKind::Numeric { precision, scale } if precision <= MAX_DECIMAL128_PRECISION => {
            DataType::Decimal128(precision, scale)
        }
        ColumnKind::Numeric { .. } => DataType::Utf8,
        ColumnKind::Date => DataType::Date32,
        ColumnKind::Timestamp => DataType::Timestamp(TimeUnit::Microsecond, None),
        ColumnKind::TimestampTz => DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
        ColumnKind::Binary => DataType::Binary,
        ColumnKind::Text => DataType::Utf8,
    }
}

fn rows_to_record_batch(names: &[String], layout: &ColumnLayout, rows: &[Row]) -> Result<RecordBatch> {
    let mut fields = Vec::with_capacity(names.len());
    let mut columns = Vec::with_capacity(names.len());
    for (index, (name, kind)) in names.iter().zip(&layout.columns).enumerate() {
        let values: Vec<&Value> = rows
            .iter()
            .map(|row| row.get(index).unwrap_or(&NULL))
            .collect();
        let data_type = arrow_type(*kind);
        columns.push(build_column(&values, &data_type)?);
        fields.push(Field::new(name, data_type, true));
    }

    let options = RecordBatchOptions::new().with_row_count(Some(rows.len()));
    let batch = RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), columns, &options)?;
    Ok(batch)
}

#[allow(clippy::cast_precision_loss)]
fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Float(f) => Some(*f),
        Value::Int(i) => Some(*i as f64),
        Value::Numeric(s) | Value::Text(s) => s.parse().ok(),
        _ => None,
    }
}

fn build_column(values: &[&Value], data_type: &DataType) -> Result<ArrayRef> {
    let array: ArrayRef = match data_type {
        DataType::Boolean => Arc::new(
            values
                .iter()
                .map(|v| match v {
                    Value::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect::<BooleanArray>(),
        ),
        DataType::Int16 => Arc::new(
            values
                .iter()
                .map(|v| v.as_i64().and_then(|i| i16::try_from(i).ok()))
                .collect::<Int16Array>(),
        ),
        DataType::Int32 => Arc::new(
            values
                .iter()
                .map(|v| v.as_i64().and_then(|i| i32::try_from(i).ok()))
                .collect::<Int32Array>(),
        ),
        DataType::Int64 => Arc::new(values.iter().map(|v| v.as_i64()).collect::<Int64Array>()),
        DataType::Float32 => Arc::new(
            values
                .iter()
                .map(|v| as_f64(v).map(|f| f as f32))
                .collect::<Float32Array>(),
        ),
        DataType::Float64 => Arc::new(values.iter().map(|v| as_f64(v)).collect::<Float64Array>()),
        DataType::Decimal128(..) => {
            let text = text_column(values);
            cast(text.as_ref(), data_type)?
        }
        DataType::Date32 => {
            let epoch = NaiveDate::default();
            Arc::new(
                values
                    .iter()
                    .map(|v| match v {
                        Value::Date(d) => i32::try_from((*d - epoch).num_days()).ok(),
                        _ => None,
                    })
                    .collect::<Date32Array>(),
            )
        }
        DataType::Timestamp(_, tz) => {
            let micros: TimestampMicrosecondArray = values
                .iter()
                .map(|v| match v {
                    Value::Timestamp(ts) => Some(ts.and_utc().timestamp_micros()),
                    Value::TimestampTz(ts) => Some(ts.timestamp_micros()),
                    _ => None,
                })
                .collect();
            Arc::new(micros.with_timezone_opt(tz.clone()))
        }
        DataType::Binary => Arc::new(
            values
                .iter()
                .map(|v| match v {
                    Value::Bytes(b) => Some(b.as_slice()),
                    _ => None,
                })
                .collect::<BinaryArray>(),
        ),
        _ => text_column(values),
    };
    Ok(array)
}

fn text_column(values: &[&Value]) -> ArrayRef {
    Arc::new(
        values
            .iter()
            .map(|v| (!v.is_null()).then(|| v.to_string()))
            .collect::<StringArray>(),
    )
}

// ============================================================================
// Arrow to parameter rows
// ============================================================================

fn record_batch_to_rows(batch: &RecordBatch) -> Result<Vec<Row>> {
    let options = FormatOptions::default();
    let mut rows: Vec<Row> = vec![Vec::with_capacity(batch.num_columns()); batch.num_rows()];
    for column in batch.columns() {
        let formatter = ArrayFormatter::try_new(column.as_ref(), &options)?;
        for (index, row) in rows.iter_mut().enumerate() {
            row.push(array_value(column, &formatter, index));
        }
    }
    Ok(rows)
}

/// One cell as a parameter; types without a direct mapping are sent as text
fn array_value(array: &ArrayRef, formatter: &ArrayFormatter<'_>, index: usize) -> Value {
    if array.is_null(index) {
        return Value::Null;
    }
    match array.data_type() {
        DataType::Boolean => Value::Bool(array.as_boolean().value(index)),
        DataType::Int8 => Value::Int(array.as_primitive::<Int8Type>().value(index).into()),
        DataType::Int16 => Value::Int(array.as_primitive::<Int16Type>().value(index).into()),
        DataType::Int32 => Value::Int(array.as_primitive::<Int32Type>().value(index).into()),
        DataType::Int64 => Value::Int(array.as_primitive::<Int64Type>().value(index)),
        DataType::UInt8 => Value::Int(array.as_primitive::<UInt8Type>().value(index).into()),
        DataType::UInt16 => Value::Int(array.as_primitive::<UInt16Type>().value(index).into()),
        DataType::UInt32 => Value::Int(array.as_primitive::<UInt32Type>().value(index).into()),
        DataType::UInt64 => {
            let v = array.as_primitive::<UInt64Type>().value(index);
            i64::try_from(v).map_or_else(|_| Value::Numeric(v.to_string()), Value::Int)
        }
        DataType::Float32 => Value::Float(array.as_primitive::<Float32Type>().value(index).into()),
        DataType::Float64 => Value::Float(array.as_primitive::<Float64Type>().value(index)),
        DataType::Utf8 => Value::Text(array.as_string::<i32>().value(index).to_string()),
        DataType::LargeUtf8 => Value::Text(array.as_string::<i64>().value(index).to_string()),
        DataType::Binary => Value::Bytes(array.as_binary::<i32>().value(index).to_vec()),
        DataType::Decimal128(..) | DataType::Decimal256(..) => {
            Value::Numeric(formatter.value(index).to_string())
        }
        _ => Value::Text(formatter.value(index).to_string()),
    }
}
