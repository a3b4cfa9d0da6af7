//! Statement results
//!
//! Row descriptions, the row buffer the transport fills, and the result set
//! a cursor drains.

use crate::types::Row;
use std::collections::VecDeque;

// ============================================================================
// Type OIDs
// ============================================================================

/// `bool`
pub const BOOL_OID: u32 = 16;
/// `bytea`
pub const BYTEA_OID: u32 = 17;
/// `name`
pub const NAME_OID: u32 = 19;
/// `int8` / `bigint`
pub const INT8_OID: u32 = 20;
/// `int2` / `smallint`
pub const INT2_OID: u32 = 21;
/// `int4` / `integer`
pub const INT4_OID: u32 = 23;
/// `text`
pub const TEXT_OID: u32 = 25;
/// `oid`
pub const OID_OID: u32 = 26;
/// `float4` / `real`
pub const FLOAT4_OID: u32 = 700;
/// `float8` / `double precision`
pub const FLOAT8_OID: u32 = 701;
/// `bpchar` / `char(n)`
pub const BPCHAR_OID: u32 = 1042;
/// `varchar`
pub const VARCHAR_OID: u32 = 1043;
/// `date`
pub const DATE_OID: u32 = 1082;
/// `timestamp`
pub const TIMESTAMP_OID: u32 = 1114;
/// `timestamptz`
pub const TIMESTAMPTZ_OID: u32 = 1184;
/// `numeric` / `decimal`
pub const NUMERIC_OID: u32 = 1700;

// ============================================================================
// Row description
// ============================================================================

/// DB-API view of one description entry:
/// `(name, type_code, display_size, internal_size, precision, scale, null_ok)`
pub type DescriptionTuple = (
    String,
    u32,
    Option<i32>,
    Option<i32>,
    Option<i32>,
    Option<i32>,
    Option<bool>,
);

/// One column of a row description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescription {
    /// Column name
    pub label: String,
    /// Server type OID
    pub type_oid: u32,
    /// Type modifier as sent by the server, -1 when absent
    pub type_modifier: i32,
}

impl ColumnDescription {
    /// A column without a type modifier
    pub fn new(label: impl Into<String>, type_oid: u32) -> Self {
        Self {
            label: label.into(),
            type_oid,
            type_modifier: -1,
        }
    }

    /// Build from a raw label as received on the wire
    pub fn from_label(label: &[u8], type_oid: u32, type_modifier: i32) -> Self {
        let label = match std::str::from_utf8(label) {
            Ok(s) => s.to_string(),
            Err(e) => {
                tracing::warn!("failed to decode column name: {:?} ({})", label, e);
                String::from_utf8_lossy(label).into_owned()
            }
        };
        Self {
            label,
            type_oid,
            type_modifier,
        }
    }

    /// Set the type modifier, e.g. packed numeric precision and scale
    #[must_use]
    pub fn with_type_modifier(mut self, type_modifier: i32) -> Self {
        self.type_modifier = type_modifier;
        self
    }

    /// The 7-tuple shape; only name and type code are provided
    pub fn as_tuple(&self) -> DescriptionTuple {
        (self.label.clone(), self.type_oid, None, None, None, None, None)
    }

    /// `(precision, scale)` for a numeric column declared with a type modifier
    pub fn numeric_precision_scale(&self) -> Option<(u8, i8)> {
        if self.type_oid != NUMERIC_OID || self.type_modifier < 4 {
            return None;
        }
        let packed = self.type_modifier - 4;
        let precision = ((packed >> 16) & 0xFFFF) as u8;
        let scale = (packed & 0xFFFF) as i8;
        Some((precision, scale))
    }
}

// ============================================================================
// Column layout
// ============================================================================

/// Decoder-facing summary of a description, cached per statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    /// One entry per description column
    pub columns: Vec<ColumnKind>,
}

/// What a column decodes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// `bool`
    Bool,
    /// `int2`
    Int16,
    /// `int4`
    Int32,
    /// `int8`
    Int64,
    /// `float4`
    Float32,
    /// `float8`
    Float64,
    /// `numeric` with a declared precision
    Numeric {
        /// Total digits
        precision: u8,
        /// Digits after the decimal point
        scale: i8,
    },
    /// `date`
    Date,
    /// `timestamp`
    Timestamp,
    /// `timestamptz`
    TimestampTz,
    /// `bytea`
    Binary,
    /// Everything else, including unconstrained numerics
    Text,
}

impl ColumnLayout {
    /// Classify each column by its type OID
    pub fn from_description(description: &[ColumnDescription]) -> Self {
        let columns = description
            .iter()
            .map(|col| match col.type_oid {
                BOOL_OID => ColumnKind::Bool,
                INT2_OID => ColumnKind::Int16,
                INT4_OID => ColumnKind::Int32,
                INT8_OID | OID_OID => ColumnKind::Int64,
                FLOAT4_OID => ColumnKind::Float32,
                FLOAT8_OID => ColumnKind::Float64,
                NUMERIC_OID => match col.numeric_precision_scale() {
                    Some((precision, scale)) if precision > 0 => {
                        ColumnKind::Numeric { precision, scale }
                    }
                    _ => ColumnKind::Text,
                },
                DATE_OID => ColumnKind::Date,
                TIMESTAMP_OID => ColumnKind::Timestamp,
                TIMESTAMPTZ_OID => ColumnKind::TimestampTz,
                BYTEA_OID => ColumnKind::Binary,
                _ => ColumnKind::Text,
            })
            .collect();
        Self { columns }
    }
}

// ============================================================================
// Row buffer
// ============================================================================

/// FIFO of decoded rows staged by the transport
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowBuffer {
    rows: VecDeque<Row>,
}

impl RowBuffer {
    /// An empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row at the back
    pub fn push(&mut self, row: Row) {
        self.rows.push_back(row);
    }

    /// Take the oldest row
    pub fn pop(&mut self) -> Option<Row> {
        self.rows.pop_front()
    }

    /// Rows still buffered
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no rows are buffered
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Drop every buffered row
    pub fn clear(&mut self) {
        self.rows.clear();
    }
}

impl From<Vec<Row>> for RowBuffer {
    fn from(rows: Vec<Row>) -> Self {
        Self { rows: rows.into() }
    }
}

impl FromIterator<Row> for RowBuffer {
    fn from_iter<I: IntoIterator<Item = Row>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

// ============================================================================
// Statement result
// ============================================================================

/// What the transport returns for one statement
#[derive(Debug, Clone, PartialEq)]
pub struct StatementResult {
    /// Empty when the statement produced no result set
    pub description: Vec<ColumnDescription>,
    /// Decoded rows in server order
    pub rows: RowBuffer,
    /// Count reported by the server, -1 when none
    pub row_count: i64,
    /// Count computed by the driver, -1 when none
    pub redshift_row_count: i64,
}

impl StatementResult {
    /// A row-returning statement; both counts default to the number of rows
    pub fn query(description: Vec<ColumnDescription>, rows: Vec<Row>) -> Self {
        let count = rows.len() as i64;
        Self {
            description,
            rows: rows.into(),
            row_count: count,
            redshift_row_count: count,
        }
    }

    /// A statement with no result set, e.g. DML or DDL
    pub fn command(row_count: i64) -> Self {
        Self {
            description: Vec::new(),
            rows: RowBuffer::new(),
            row_count,
            redshift_row_count: row_count,
        }
    }

    /// Override the server-reported count
    #[must_use]
    pub fn with_row_count(mut self, row_count: i64) -> Self {
        self.row_count = row_count;
        self
    }
}

// ============================================================================
// Result set
// ============================================================================

/// The cursor's view of the last statement; rows are consumed in place
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    description: Vec<ColumnDescription>,
    rows: RowBuffer,
}

impl ResultSet {
    /// Wrap a statement's description and rows
    pub fn new(description: Vec<ColumnDescription>, rows: RowBuffer) -> Self {
        Self { description, rows }
    }

    /// Column descriptions, empty for statements without a result set
    pub fn description(&self) -> &[ColumnDescription] {
        &self.description
    }

    /// Whether the statement produced a result set
    pub fn has_columns(&self) -> bool {
        !self.description.is_empty()
    }

    /// Rows not yet consumed
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }

    /// Consume the next row
    pub fn next_row(&mut self) -> Option<Row> {
        self.rows.pop()
    }
}
