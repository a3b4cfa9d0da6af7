//! Catalog reflection
//!
//! JDBC/ODBC shaped metadata queries against the Redshift system catalog.
//! Each call first decides which catalog source applies to the requested
//! schema pattern, builds the matching query, then runs it through the
//! cursor's regular execute/fetch path.
//!
//! # Overview
//!
//! - [`SchemaPatternMode`] - local, universal or external catalog source
//! - `Cursor::get_tables`, `get_columns`, `get_schemas`, `get_catalogs`,
//!   `get_primary_keys`, `get_procedures`
//! - `get_pk_constraint`, `get_foreign_keys`, `get_unique_constraints`,
//!   `get_check_constraints` - parsed constraints of one relation
//! - `has_table`, `get_table_names`, `get_view_names`, `get_view_definition`,
//!   `get_table_options` - relation listing and distribution settings
//! - [`RelationKey`], [`ForeignKey`] - relation identity and parsed constraints
//! - [`sanitize_str`], [`escape_quotes`] - identifier scrubbing for the queries
//!   that still interpolate literals

mod columns;
mod keys;
mod procedures;
mod relations;
mod schemas;
mod tables;
pub mod type_map;

pub use keys::{
    parse_check_constraint, parse_foreign_key, parse_primary_key, CheckConstraint, ForeignKey,
    PrimaryKeyConstraint, RelationKey, UniqueConstraint,
};
pub use relations::{Relation, TableOptions};
pub use tables::TABLE_TYPES;

use crate::connection::Connection;
use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::paramstyle::Paramstyle;
use crate::types::{Row, Value};
use regex::Regex;
use std::sync::LazyLock;

// ============================================================================
// Identifier scrubbing
// ============================================================================

static UNSAFE_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"[-;/'"\n\r ]"#).unwrap());

/// Strip characters that could end a literal or start a comment
pub fn sanitize_str(s: &str) -> String {
    UNSAFE_CHARS.replace_all(s, "").into_owned()
}

/// Sanitize and wrap in single quotes
pub fn escape_quotes(s: &str) -> String {
    format!("'{}'", sanitize_str(s))
}

/// Treat empty filter strings as absent
pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

// ============================================================================
// Query plumbing
// ============================================================================

/// Which catalog views answer a reflection call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaPatternMode {
    /// Native `pg_catalog` tables of the connected database
    Local,
    /// `svv_*` views spanning local, datashare and external objects
    Universal,
    /// `svv_external_*` views for Spectrum schemas
    External,
}

/// SQL plus the values bound to its `?` placeholders
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct CatalogQuery {
    pub sql: String,
    pub args: Vec<Value>,
}

impl CatalogQuery {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            args: Vec::new(),
        }
    }

    /// Append ` <clause>` binding `value` to its placeholder
    pub fn bind(&mut self, clause: &str, value: impl Into<Value>) {
        self.sql.push_str(clause);
        self.args.push(value.into());
    }
}

/// `AND` condition restricting results to one database
///
/// Single-database metadata and APIs that only describe the connected
/// database compare against `current_database()`; otherwise the database
/// column of the view is used.
pub(crate) fn catalog_filter(
    catalog: Option<&str>,
    connected_database_only: bool,
    database_column: Option<&str>,
) -> String {
    let Some(catalog) = non_empty(catalog) else {
        return String::new();
    };
    if connected_database_only {
        format!(" AND current_database() = {}", escape_quotes(catalog))
    } else {
        let column = non_empty(database_column).unwrap_or("database_name");
        format!(" AND {} = {}", sanitize_str(column), escape_quotes(catalog))
    }
}

impl<C: Connection + ?Sized> Cursor<'_, C> {
    /// Decide which catalog source serves `schema_pattern`
    ///
    /// With single-database metadata a non-empty pattern is checked against
    /// `svv_external_schemas`; everything else goes to the universal views.
    pub fn schema_pattern_match(&mut self, schema_pattern: Option<&str>) -> Result<SchemaPatternMode> {
        let single_database = self.is_single_database_metadata()?;
        let Some(pattern) = non_empty(schema_pattern) else {
            return Ok(SchemaPatternMode::Universal);
        };
        if !single_database {
            return Ok(SchemaPatternMode::Universal);
        }

        let sql = format!(
            "select 1 from svv_external_schemas where schemaname like {}",
            escape_quotes(pattern)
        );
        let rows = {
            let mut guard = self.with_paramstyle(Paramstyle::Qmark);
            guard.execute(&sql, Vec::<Value>::new())?;
            guard.fetchall()?
        };

        let mode = if rows.is_empty() {
            SchemaPatternMode::Local
        } else {
            SchemaPatternMode::External
        };
        tracing::debug!("Schema pattern '{}' resolved to {:?}", pattern, mode);
        Ok(mode)
    }

    /// Run a catalog query with qmark binding and return every row
    pub(crate) fn run_catalog_query(&mut self, query: CatalogQuery) -> Result<Vec<Row>> {
        let mut guard = self.with_paramstyle(Paramstyle::Qmark);
        guard.execute(&query.sql, query.args)?;
        guard.fetchall()
    }

    pub(crate) fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(Error::interface("connection is closed"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
