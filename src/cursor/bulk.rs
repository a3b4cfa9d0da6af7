//! Batched inserts from a delimited file
//!
//! Rows are read with the `csv` crate and sent as multi-row
//! `INSERT ... VALUES (...), (...)` statements, `batch_size` rows at a time.

use super::Cursor;
use crate::connection::Connection;
use crate::error::{Error, Result, ResultExt};
use crate::paramstyle::Paramstyle;
use crate::types::{Params, Value};
use std::fs::File;
use std::path::PathBuf;

/// Parameters for [`Cursor::insert_data_bulk`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkInsert {
    /// Delimited file to read
    pub filename: PathBuf,
    /// `table` or `schema.table`
    pub table_name: String,
    /// Zero-based field positions read from every record
    pub parameter_indices: Vec<usize>,
    /// Target columns, one per parameter index
    pub column_names: Vec<String>,
    /// Field separator, `,` by default
    pub delimiter: u8,
    /// Records per `INSERT` statement
    pub batch_size: usize,
}

impl BulkInsert {
    /// Insert into `table_name` from `filename`, one record per statement
    pub fn new(filename: impl Into<PathBuf>, table_name: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            table_name: table_name.into(),
            parameter_indices: Vec::new(),
            column_names: Vec::new(),
            delimiter: b',',
            batch_size: 1,
        }
    }

    /// Map field `index` of each record to `column`
    #[must_use]
    pub fn with_column(mut self, index: usize, column: impl Into<String>) -> Self {
        self.parameter_indices.push(index);
        self.column_names.push(column.into());
        self
    }

    /// Replace the whole field-to-column mapping
    #[must_use]
    pub fn with_columns<S: Into<String>>(
        mut self,
        parameter_indices: Vec<usize>,
        column_names: impl IntoIterator<Item = S>,
    ) -> Self {
        self.parameter_indices = parameter_indices;
        self.column_names = column_names.into_iter().map(Into::into).collect();
        self
    }

    /// Field separator byte
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Records sent per statement; must be at least 1
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// `INSERT INTO  <table> (<cols>) VALUES ` prefix
    fn base_statement(&self) -> String {
        format!(
            "INSERT INTO  {} ({}) VALUES ",
            self.table_name,
            self.column_names.join(", ")
        )
    }

    /// One `(%s, ...)` group per row
    fn row_template(&self) -> String {
        format!("({})", vec!["%s"; self.parameter_indices.len()].join(", "))
    }
}

/// `(table, schema)` from a possibly qualified name, `None` if it has more than two parts
fn split_table_name(table: &str) -> Option<(&str, Option<&str>)> {
    let parts: Vec<&str> = table.split('.').collect();
    match parts.as_slice() {
        [name] => Some((*name, None)),
        [schema, name] => Some((*name, Some(*schema))),
        _ => None,
    }
}

impl<C: Connection + ?Sized> Cursor<'_, C> {
    /// Insert the rows of a delimited file into `table_name`
    ///
    /// The first line is treated as a header and skipped. Every value is sent
    /// as text and cast by the server.
    pub fn insert_data_bulk(&mut self, bulk: &BulkInsert) -> Result<&mut Self> {
        if bulk.batch_size < 1 {
            return Err(Error::interface("batch_size must be greater than 1"));
        }
        if bulk.column_names.len() != bulk.parameter_indices.len() {
            return Err(Error::interface(
                "Column names and parameter indexes must be the same length",
            ));
        }
        if !self.is_valid_table(&bulk.table_name)? {
            return Err(Error::interface(format!(
                "Invalid table name passed to insert_data_bulk: {}",
                bulk.table_name
            )));
        }
        if !self.has_valid_columns(&bulk.table_name, &bulk.column_names)? {
            return Err(Error::interface(format!(
                "Invalid column names passed to insert_data_bulk: {}",
                bulk.table_name
            )));
        }

        let file = File::open(&bulk.filename)
            .with_context(|| format!("Failed to open {}", bulk.filename.display()))?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(bulk.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let base = bulk.base_statement();
        let template = bulk.row_template();
        let mut guard = self.with_paramstyle(Paramstyle::Format);
        let mut values: Vec<Value> = Vec::new();
        let mut rows_in_batch = 0;

        for (line, record) in reader.records().enumerate() {
            let record = record?;
            if rows_in_batch == bulk.batch_size {
                flush_batch(&mut *guard, &base, &template, rows_in_batch, &mut values)?;
                rows_in_batch = 0;
            }
            for &index in &bulk.parameter_indices {
                let field = record.get(index).ok_or_else(|| {
                    Error::interface(format!(
                        "Row {} of {} has no field at index {}",
                        line + 1,
                        bulk.filename.display(),
                        index
                    ))
                })?;
                values.push(Value::Text(field.to_string()));
            }
            rows_in_batch += 1;
        }
        if rows_in_batch > 0 {
            flush_batch(&mut *guard, &base, &template, rows_in_batch, &mut values)?;
        }
        drop(guard);
        Ok(self)
    }

    /// Whether `table` (optionally `schema.table`) exists in any visible database
    pub fn is_valid_table(&mut self, table: &str) -> Result<bool> {
        let Some((name, schema)) = split_table_name(table) else {
            return Ok(false);
        };
        let mut sql = String::from("select 1 from pg_catalog.svv_all_tables where table_name = ?");
        let mut args = vec![Value::from(name)];
        if let Some(schema) = schema {
            sql.push_str(" and schema_name = ?");
            args.push(Value::from(schema));
        }

        let mut guard = self.with_paramstyle(Paramstyle::Qmark);
        guard.execute(&sql, args)?;
        let row = guard.fetchone()?;
        Ok(row
            .and_then(|row| row.first().and_then(Value::as_i64))
            .is_some_and(|v| v == 1))
    }

    /// Whether every column exists on `table`
    ///
    /// A column with no match is an error rather than `false`.
    pub fn has_valid_columns(&mut self, table: &str, columns: &[String]) -> Result<bool> {
        let Some((name, schema)) = split_table_name(table) else {
            return Ok(false);
        };
        let mut sql = String::from(
            "select 1 from pg_catalog.svv_all_columns where table_name = ? and column_name = ?",
        );
        if schema.is_some() {
            sql.push_str(" and schema_name = ?");
        }

        let mut guard = self.with_paramstyle(Paramstyle::Qmark);
        for column in columns {
            let mut args = vec![Value::from(name), Value::from(column.as_str())];
            if let Some(schema) = schema {
                args.push(Value::from(schema));
            }
            guard.execute(&sql, args.clone())?;
            let Some(row) = guard.fetchone()? else {
                return Err(Error::interface(format!(
                    "Invalid column name. No results were returned when performing column name validity check. Query: {} Parameters: {:?}",
                    sql, args
                )));
            };
            if row.first().and_then(Value::as_i64) != Some(1) {
                return Err(Error::interface(format!(
                    "Invalid column name: {} specified for table: {}",
                    column, table
                )));
            }
        }
        Ok(true)
    }
}

fn flush_batch<C: Connection + ?Sized>(
    cursor: &mut Cursor<'_, C>,
    base: &str,
    template: &str,
    rows: usize,
    values: &mut Vec<Value>,
) -> Result<()> {
    let statement = format!("{}{};", base, vec![template; rows].join(", "));
    tracing::debug!("Flushing bulk insert batch of {} rows", rows);
    cursor.execute(&statement, Params::Positional(std::mem::take(values)))?;
    Ok(())
}
