//! DB-API cursor
//!
//! A cursor borrows its connection mutably for as long as it lives, runs
//! statements through it and hands the resulting rows back one at a time.
//!
//! # Overview
//!
//! - `execute` / `executemany` / `callproc` - statement execution
//! - `fetchone` / `fetchmany` / `fetchall` and `Iterator` - forward-only retrieval
//! - `insert_data_bulk` - batched inserts from a delimited file (see [`bulk`])
//! - `fetch_dataframe` / `write_dataframe` - Arrow interop (see [`dataframe`])
//! - `get_tables`, `get_columns`, ... - catalog reflection (see [`crate::catalog`])

pub mod bulk;
pub mod dataframe;

use crate::catalog::sanitize_str;
use crate::config::CursorConfig;
use crate::connection::{Connection, CopyStream, ExecuteOptions, ExecuteRequest};
use crate::error::{Error, Result};
use crate::paramstyle::{convert_paramstyle, Paramstyle};
use crate::result::{ColumnDescription, ColumnLayout, ResultSet, StatementResult};
use crate::types::{Params, Row, Value};
use once_cell::unsync::OnceCell;
use std::ops::{Deref, DerefMut};

pub use bulk::BulkInsert;

/// Sentinel for "no row count"
pub const UNKNOWN_ROW_COUNT: i64 = -1;

// ============================================================================
// Cursor
// ============================================================================

/// Statement execution context bound to one connection
pub struct Cursor<'c, C: Connection + ?Sized> {
    conn: Option<&'c mut C>,
    arraysize: usize,
    result: Option<ResultSet>,
    row_count: i64,
    redshift_row_count: i64,
    paramstyle: Paramstyle,
    layout: OnceCell<ColumnLayout>,
}

impl<'c, C: Connection + ?Sized> Cursor<'c, C> {
    /// Create a cursor with default settings
    pub fn new(conn: &'c mut C) -> Self {
        Self::with_config(conn, &CursorConfig::default())
    }

    /// Create a cursor from explicit settings
    pub fn with_config(conn: &'c mut C, config: &CursorConfig) -> Self {
        tracing::debug!("Cursor.paramstyle={}", config.paramstyle);
        Self {
            conn: Some(conn),
            arraysize: config.arraysize.max(1),
            result: None,
            row_count: UNKNOWN_ROW_COUNT,
            redshift_row_count: UNKNOWN_ROW_COUNT,
            paramstyle: config.paramstyle,
            layout: OnceCell::new(),
        }
    }

    // ========================================================================
    // Attributes
    // ========================================================================

    /// Placeholder style `execute` expects
    pub fn paramstyle(&self) -> Paramstyle {
        self.paramstyle
    }

    /// Change the placeholder style for later statements
    pub fn set_paramstyle(&mut self, paramstyle: Paramstyle) {
        self.paramstyle = paramstyle;
    }

    /// Switch paramstyle until the returned guard is dropped
    pub fn with_paramstyle(&mut self, paramstyle: Paramstyle) -> ParamstyleGuard<'_, 'c, C> {
        let previous = std::mem::replace(&mut self.paramstyle, paramstyle);
        ParamstyleGuard {
            cursor: self,
            previous,
        }
    }

    /// Default row count for `fetchmany`
    pub fn arraysize(&self) -> usize {
        self.arraysize
    }

    /// Set the default `fetchmany` size
    pub fn set_arraysize(&mut self, arraysize: usize) {
        self.arraysize = arraysize;
    }

    /// Rows produced or affected by the last statement as reported by the
    /// server, -1 when unknown
    pub fn rowcount(&self) -> i64 {
        self.row_count
    }

    /// Rows produced by the last statement as counted by the driver, -1 when
    /// unknown
    pub fn redshift_rowcount(&self) -> i64 {
        self.redshift_row_count
    }

    /// Columns of the last statement's result set
    ///
    /// `None` before any statement ran and for statements without a result set.
    pub fn description(&self) -> Option<&[ColumnDescription]> {
        self.result
            .as_ref()
            .filter(|result| result.has_columns())
            .map(ResultSet::description)
    }

    /// Decoder layout of the current result set, computed once per statement
    pub fn column_layout(&self) -> Option<&ColumnLayout> {
        let result = self.result.as_ref()?;
        Some(
            self.layout
                .get_or_init(|| ColumnLayout::from_description(result.description())),
        )
    }

    /// The bound connection (DB-API extension)
    pub fn connection(&mut self) -> Option<&mut C> {
        tracing::warn!("DB-API extension cursor.connection used");
        self.conn.as_deref_mut()
    }

    /// Whether `close` was called
    pub fn is_closed(&self) -> bool {
        self.conn.is_none()
    }

    /// Release the connection binding; the connection itself stays open
    pub fn close(&mut self) {
        self.conn = None;
    }

    /// Present for DB-API compliance; does nothing
    pub fn setinputsizes(&mut self, _sizes: &[usize]) {}

    /// Present for DB-API compliance; does nothing
    pub fn setoutputsize(&mut self, _size: usize, _column: Option<usize>) {}

    pub(crate) fn is_single_database_metadata(&self) -> Result<bool> {
        self.conn
            .as_deref()
            .map(|conn| conn.is_single_database_metadata())
            .ok_or_else(|| Error::interface("connection is closed"))
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Execute a statement written in the cursor's paramstyle
    pub fn execute(&mut self, statement: &str, params: impl Into<Params>) -> Result<&mut Self> {
        self.execute_with(statement, params, ExecuteOptions::default())
    }

    /// Execute a statement with a COPY stream or transport options
    pub fn execute_with(
        &mut self,
        statement: &str,
        params: impl Into<Params>,
        options: ExecuteOptions<'_>,
    ) -> Result<&mut Self> {
        let conn = self
            .conn
            .as_deref_mut()
            .ok_or_else(|| Error::interface("Cursor closed"))?;
        if !conn.is_open() {
            return Err(Error::interface("connection is closed"));
        }

        // column layout can change between statements
        self.layout = OnceCell::new();
        self.result = None;

        let converted = convert_paramstyle(self.paramstyle, statement)?;
        let args = converted.make_args(&params.into())?;

        tracing::debug!("Executing query: {}", converted.sql);

        let request = ExecuteRequest {
            sql: &converted.sql,
            args: &args,
            // shorten the stream's trait-object lifetime to the request's
            stream: options.stream.map(|stream| match stream {
                CopyStream::From(reader) => CopyStream::From(reader),
                CopyStream::To(writer) => CopyStream::To(writer),
            }),
            merge_socket_read: options.merge_socket_read,
        };

        let outcome = run_in_transaction(&mut *conn, request);
        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                tracing::debug!("Cursor's connection socket state: {}", conn.socket_state());
                self.row_count = UNKNOWN_ROW_COUNT;
                self.redshift_row_count = UNKNOWN_ROW_COUNT;
                return Err(e);
            }
        };

        let StatementResult {
            description,
            rows,
            row_count,
            redshift_row_count,
        } = result;
        self.row_count = row_count;
        self.redshift_row_count = redshift_row_count;
        self.result = Some(ResultSet::new(description, rows));
        Ok(self)
    }

    /// Execute a statement once per parameter set, stopping at the first error
    pub fn executemany<I, P>(&mut self, statement: &str, param_sets: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<Params>,
    {
        let mut row_counts = Vec::new();
        let mut redshift_row_counts = Vec::new();
        for params in param_sets {
            self.execute(statement, params)?;
            row_counts.push(self.row_count);
            redshift_row_counts.push(self.redshift_row_count);
        }

        self.row_count = combine_row_counts(&row_counts);
        self.redshift_row_count = combine_row_counts(&redshift_row_counts);
        Ok(self)
    }

    /// Call a stored procedure: `CALL name(%s, ...)`
    pub fn callproc(&mut self, procname: &str, params: Vec<Value>) -> Result<&mut Self> {
        let placeholders = vec!["%s"; params.len()].join(", ");
        let operation = format!("CALL {}({})", sanitize_str(procname), placeholders);
        {
            let mut guard = self.with_paramstyle(Paramstyle::Format);
            guard.execute(&operation, Params::Positional(params))?;
        }
        Ok(self)
    }

    // ========================================================================
    // Retrieval
    // ========================================================================

    /// Pop the next row
    ///
    /// Fails when no statement ran or the last one produced no result set;
    /// `Ok(None)` once the rows are exhausted.
    pub fn next_row(&mut self) -> Result<Option<Row>> {
        let Some(result) = self.result.as_mut() else {
            return Err(Error::programming("A query hasn't been issued."));
        };
        if let Some(row) = result.next_row() {
            return Ok(Some(row));
        }
        if !result.has_columns() {
            return Err(Error::programming("no result set"));
        }
        Ok(None)
    }

    /// Next row, or `None` when exhausted
    pub fn fetchone(&mut self) -> Result<Option<Row>> {
        self.next_row()
    }

    /// Up to `num` rows (default `arraysize`)
    pub fn fetchmany(&mut self, num: Option<usize>) -> Result<Vec<Row>> {
        let num = num.unwrap_or(self.arraysize);
        let mut rows = Vec::new();
        while rows.len() < num {
            match self.next_row()? {
                Some(row) => rows.push(row),
                None => break,
            }
        }
        Ok(rows)
    }

    /// All remaining rows
    pub fn fetchall(&mut self) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        while let Some(row) = self.next_row()? {
            rows.push(row);
        }
        Ok(rows)
    }
}

impl<C: Connection + ?Sized> Iterator for Cursor<'_, C> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}

impl<C: Connection + ?Sized> std::fmt::Debug for Cursor<'_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("closed", &self.is_closed())
            .field("arraysize", &self.arraysize)
            .field("paramstyle", &self.paramstyle)
            .field("rowcount", &self.row_count)
            .field("redshift_rowcount", &self.redshift_row_count)
            .finish_non_exhaustive()
    }
}

/// Issue `begin transaction` first when the connection is neither in a
/// transaction nor in autocommit mode.
fn run_in_transaction<C: Connection + ?Sized>(
    conn: &mut C,
    request: ExecuteRequest<'_>,
) -> Result<StatementResult> {
    if !conn.in_transaction() && !conn.autocommit() {
        conn.execute(ExecuteRequest::new("begin transaction", &[]))?;
    }
    conn.execute(request)
}

/// -1 if any count is unknown, else the sum
fn combine_row_counts(counts: &[i64]) -> i64 {
    if counts.contains(&UNKNOWN_ROW_COUNT) {
        UNKNOWN_ROW_COUNT
    } else {
        counts.iter().sum()
    }
}

// ============================================================================
// Paramstyle guard
// ============================================================================

/// Restores the cursor's previous paramstyle when dropped
pub struct ParamstyleGuard<'a, 'c, C: Connection + ?Sized> {
    cursor: &'a mut Cursor<'c, C>,
    previous: Paramstyle,
}

impl<'c, C: Connection + ?Sized> Deref for ParamstyleGuard<'_, 'c, C> {
    type Target = Cursor<'c, C>;

    fn deref(&self) -> &Self::Target {
        &*self.cursor
    }
}

impl<C: Connection + ?Sized> DerefMut for ParamstyleGuard<'_, '_, C> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.cursor
    }
}

impl<C: Connection + ?Sized> Drop for ParamstyleGuard<'_, '_, C> {
    fn drop(&mut self) {
        self.cursor.paramstyle = self.previous;
    }
}
