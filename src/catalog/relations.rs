//! Relation listing and physical table options
//!
//! Native relations come from `pg_class`; Spectrum tables are unioned in as
//! plain tables with no owner-side metadata.

use super::keys::{RelationKey, DEFAULT_SCHEMA};
use super::{non_empty, CatalogQuery};
use crate::connection::Connection;
use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::types::{Row, Value};
use serde::Serialize;
use std::collections::HashMap;

/// A table, view or other relation as listed by the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relation {
    /// Schema and name
    pub key: RelationKey,
    /// `pg_class.relkind`: `r` table, `v` view, `m` materialized view,
    /// `S` sequence, `f` foreign table
    pub relkind: String,
    /// `EVEN`, `KEY` or `ALL`; `None` for views and external tables
    pub diststyle: Option<String>,
    /// Owning user
    pub owner_name: Option<String>,
    /// `SELECT` text of a view, without the trailing semicolon
    pub view_definition: Option<String>,
}

/// Distribution and sort settings of a table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableOptions {
    /// Distribution style of the table
    pub diststyle: Option<String>,
    /// First column marked as the distribution key
    pub distkey: Option<String>,
    /// Compound sort key columns in key order
    pub sortkey: Option<Vec<String>>,
    /// Interleaved sort key columns; set instead of `sortkey`
    pub interleaved_sortkey: Option<Vec<String>>,
}

pub(crate) fn relations_query(schema: Option<&str>, table: Option<&str>) -> CatalogQuery {
    let mut query = CatalogQuery::new(
        "SELECT c.relkind, n.nspname AS schema, c.relname, \
         CASE c.reldiststyle WHEN 0 THEN 'EVEN' WHEN 1 THEN 'KEY' WHEN 8 THEN 'ALL' END AS diststyle, \
         u.usename AS owner_name, \
         TRIM(TRAILING ';' FROM pg_catalog.pg_get_viewdef(c.oid, true)) AS view_definition \
         FROM pg_catalog.pg_class c \
         LEFT JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace \
         JOIN pg_catalog.pg_user u ON u.usesysid = c.relowner \
         WHERE c.relkind IN ('r', 'v', 'm', 'S', 'f') AND n.nspname !~ '^pg_'",
    );
    push_relation_filters(&mut query, "n.nspname", "c.relname", schema, table);
    query.sql.push_str(
        " UNION \
         SELECT 'r' AS relkind, s.schemaname AS schema, t.tablename AS relname, \
         NULL AS diststyle, u.usename AS owner_name, NULL AS view_definition \
         FROM svv_external_tables t \
         JOIN svv_external_schemas s ON s.schemaname = t.schemaname \
         JOIN pg_catalog.pg_user u ON u.usesysid = s.esowner \
         WHERE true",
    );
    push_relation_filters(&mut query, "s.schemaname", "t.tablename", schema, table);
    query.sql.push_str(" ORDER BY relkind, schema, relname");
    query
}

/// Column-level distribution and sort settings, one row per column
pub(crate) fn column_options_query(schema: &str, table: &str) -> CatalogQuery {
    let mut query = CatalogQuery::new(
        "SELECT n.nspname AS schema, c.relname AS table_name, att.attname AS name, \
         att.attisdistkey AS distkey, att.attsortkeyord AS sortkey, att.attnum \
         FROM pg_catalog.pg_class c \
         LEFT JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace \
         JOIN pg_catalog.pg_attribute att ON att.attrelid = c.oid \
         WHERE n.nspname !~ '^pg_' AND att.attnum > 0 AND NOT att.attisdropped",
    );
    push_relation_filters(&mut query, "n.nspname", "c.relname", Some(schema), Some(table));
    query.sql.push_str(
        " UNION \
         SELECT c.schemaname AS schema, c.tablename AS table_name, c.columnname AS name, \
         false AS distkey, 0 AS sortkey, c.columnnum AS attnum \
         FROM svv_external_columns c \
         WHERE true",
    );
    push_relation_filters(&mut query, "c.schemaname", "c.tablename", Some(schema), Some(table));
    query.sql.push_str(" ORDER BY schema, table_name, attnum");
    query
}

fn push_relation_filters(
    query: &mut CatalogQuery,
    schema_column: &str,
    table_column: &str,
    schema: Option<&str>,
    table: Option<&str>,
) {
    if let Some(schema) = non_empty(schema) {
        query.bind(&format!(" AND {schema_column} = ?"), schema.to_string());
    }
    if let Some(table) = non_empty(table) {
        query.bind(&format!(" AND {table_column} = ?"), table.to_string());
    }
}

fn optional_text(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::to_string)
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Int(i)) => *i != 0,
        Some(Value::Text(s)) => matches!(s.as_str(), "t" | "true" | "1"),
        _ => false,
    }
}

pub(crate) fn relations_from_rows(rows: &[Row]) -> HashMap<RelationKey, Relation> {
    rows.iter()
        .filter_map(|row| {
            let relkind = row.first().and_then(Value::as_str)?;
            let schema = row.get(1).and_then(Value::as_str)?;
            let name = row.get(2).and_then(Value::as_str)?;
            let key = RelationKey::new(name, Some(schema));
            Some((
                key.clone(),
                Relation {
                    key,
                    relkind: relkind.to_string(),
                    diststyle: optional_text(row.get(3)),
                    owner_name: optional_text(row.get(4)),
                    view_definition: optional_text(row.get(5)),
                },
            ))
        })
        .collect()
}

/// Sort key columns ordered by key position; interleaved keys carry
/// alternating negative positions
pub(crate) fn table_options(relation: &Relation, columns: &[Row]) -> TableOptions {
    let mut sort_columns: Vec<(i64, String)> = columns
        .iter()
        .filter_map(|row| {
            let position = row.get(4).and_then(Value::as_i64).filter(|p| *p != 0)?;
            Some((position, row.get(2).and_then(Value::as_str)?.to_string()))
        })
        .collect();
    sort_columns.sort_by_key(|(position, _)| position.abs());
    let interleaved = sort_columns.iter().any(|(position, _)| *position < 0);
    let names: Vec<String> = sort_columns.into_iter().map(|(_, name)| name).collect();

    let distkey = columns
        .iter()
        .find(|row| is_truthy(row.get(3)))
        .and_then(|row| optional_text(row.get(2)));

    let (sortkey, interleaved_sortkey) = if interleaved {
        (None, Some(names))
    } else {
        (Some(names), None)
    };
    TableOptions {
        diststyle: relation.diststyle.clone(),
        distkey,
        sortkey,
        interleaved_sortkey,
    }
}

impl<C: Connection + ?Sized> Cursor<'_, C> {
    fn relations(&mut self, schema: Option<&str>, table: Option<&str>) -> Result<HashMap<RelationKey, Relation>> {
        self.ensure_open()?;
        let rows = self.run_catalog_query(relations_query(schema, table))?;
        Ok(relations_from_rows(&rows))
    }

    /// Look up one relation, trying the name as given then unquoted
    pub fn get_relation(&mut self, schema: Option<&str>, table: &str) -> Result<Relation> {
        let key = RelationKey::lookup(table, schema);
        let lookup = key.unquoted();
        let relations = self.relations(lookup.schema.as_deref(), Some(&lookup.name))?;
        key.find_in(&relations)
            .cloned()
            .ok_or_else(|| Error::programming(format!("No such table: {key}")))
    }

    /// Whether a table or view named `table` exists; `schema` defaults to `public`
    pub fn has_table(&mut self, schema: Option<&str>, table: &str) -> Result<bool> {
        let lookup = RelationKey::lookup(table, schema).unquoted();
        let relations = self.relations(lookup.schema.as_deref(), Some(&lookup.name))?;
        Ok(!relations.is_empty())
    }

    fn relation_names(&mut self, schema: Option<&str>, relkind: &str) -> Result<Vec<String>> {
        let schema = non_empty(schema).unwrap_or(DEFAULT_SCHEMA);
        let relations = self.relations(Some(schema), None)?;
        let mut names: Vec<String> = relations
            .into_values()
            .filter(|r| r.key.schema.as_deref() == Some(schema) && r.relkind == relkind)
            .map(|r| r.key.name)
            .collect();
        names.sort();
        Ok(names)
    }

    /// Names of ordinary and external tables in `schema` (default `public`)
    pub fn get_table_names(&mut self, schema: Option<&str>) -> Result<Vec<String>> {
        self.relation_names(schema, "r")
    }

    /// Names of views in `schema` (default `public`)
    pub fn get_view_names(&mut self, schema: Option<&str>) -> Result<Vec<String>> {
        self.relation_names(schema, "v")
    }

    /// `SELECT` text of a view; `None` when the relation is not a view
    pub fn get_view_definition(&mut self, schema: Option<&str>, view: &str) -> Result<Option<String>> {
        Ok(self.get_relation(schema, view)?.view_definition)
    }

    /// Diststyle, distkey and sort key of a table
    pub fn get_table_options(&mut self, schema: Option<&str>, table: &str) -> Result<TableOptions> {
        let relation = self.get_relation(schema, table)?;
        let (schema_name, table_name) = (
            relation.key.schema.clone().unwrap_or_default(),
            relation.key.name.clone(),
        );
        let columns = self.run_catalog_query(column_options_query(&schema_name, &table_name))?;
        Ok(table_options(&relation, &columns))
    }
}
