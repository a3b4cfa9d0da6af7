//! `get_tables`

use super::{catalog_filter, non_empty, sanitize_str, CatalogQuery, SchemaPatternMode};
use crate::connection::Connection;
use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::types::Row;

/// Valid `types` filter values with the `pg_class` condition each one selects
///
/// `EXTERNAL TABLE` has no native relkind and only filters the `svv_*` views.
pub const TABLE_TYPES: &[(&str, Option<&str>)] = &[
    (
        "TABLE",
        Some("c.relkind = 'r' AND n.nspname !~ '^pg_' AND n.nspname <> 'information_schema'"),
    ),
    (
        "PARTITIONED TABLE",
        Some("c.relkind = 'p' AND n.nspname !~ '^pg_' AND n.nspname <> 'information_schema'"),
    ),
    (
        "VIEW",
        Some("c.relkind = 'v' AND n.nspname <> 'pg_catalog' AND n.nspname <> 'information_schema'"),
    ),
    (
        "INDEX",
        Some("c.relkind = 'i' AND n.nspname !~ '^pg_' AND n.nspname <> 'information_schema'"),
    ),
    ("SEQUENCE", Some("c.relkind = 'S'")),
    (
        "TYPE",
        Some("c.relkind = 'c' AND n.nspname !~ '^pg_' AND n.nspname <> 'information_schema'"),
    ),
    (
        "SYSTEM TABLE",
        Some("c.relkind = 'r' AND (n.nspname = 'pg_catalog' OR n.nspname = 'information_schema')"),
    ),
    (
        "SYSTEM TOAST TABLE",
        Some("c.relkind = 'r' AND n.nspname = 'pg_toast'"),
    ),
    (
        "SYSTEM TOAST INDEX",
        Some("c.relkind = 'i' AND n.nspname = 'pg_toast'"),
    ),
    (
        "SYSTEM VIEW",
        Some("c.relkind = 'v' AND (n.nspname = 'pg_catalog' OR n.nspname = 'information_schema')"),
    ),
    (
        "SYSTEM INDEX",
        Some("c.relkind = 'i' AND (n.nspname = 'pg_catalog' OR n.nspname = 'information_schema')"),
    ),
    (
        "TEMPORARY TABLE",
        Some("c.relkind IN ('r', 'p') AND n.nspname ~ '^pg_temp_'"),
    ),
    (
        "TEMPORARY INDEX",
        Some("c.relkind = 'i' AND n.nspname ~ '^pg_temp_'"),
    ),
    (
        "TEMPORARY VIEW",
        Some("c.relkind = 'v' AND n.nspname ~ '^pg_temp_'"),
    ),
    (
        "TEMPORARY SEQUENCE",
        Some("c.relkind = 'S' AND n.nspname ~ '^pg_temp_'"),
    ),
    ("FOREIGN TABLE", Some("c.relkind = 'f'")),
    ("MATERIALIZED VIEW", Some("c.relkind = 'm'")),
    ("EXTERNAL TABLE", None),
];

const ORDER_BY: &str = " ORDER BY TABLE_TYPE,TABLE_SCHEM,TABLE_NAME ";

const JDBC_TAIL_COLUMNS: &str = " '' as TYPE_CAT, '' as TYPE_SCHEM, '' as TYPE_NAME, \
     '' AS SELF_REFERENCING_COL_NAME, '' AS REF_GENERATION ";

fn table_type_clause(table_type: &str) -> Result<Option<&'static str>> {
    TABLE_TYPES
        .iter()
        .find(|(name, _)| *name == table_type)
        .map(|(_, clause)| *clause)
        .ok_or_else(|| {
            let valid: Vec<&str> = TABLE_TYPES.iter().map(|(name, _)| *name).collect();
            Error::interface(format!(
                "Invalid type: {table_type} provided. types may only contain: {}",
                valid.join(", ")
            ))
        })
}

/// Append the schema, name and type filters
fn push_table_filters(
    query: &mut CatalogQuery,
    schema_pattern: Option<&str>,
    table_name_pattern: Option<&str>,
    types: &[&str],
    mode: SchemaPatternMode,
) -> Result<()> {
    if let Some(schema) = non_empty(schema_pattern) {
        query.bind(" AND TABLE_SCHEM LIKE ?", sanitize_str(schema));
    }
    if let Some(table) = non_empty(table_name_pattern) {
        query.bind(" AND TABLE_NAME LIKE ?", sanitize_str(table));
    }
    if types.is_empty() {
        return Ok(());
    }

    match mode {
        SchemaPatternMode::Local => {
            let mut clause = String::from(" AND (false ");
            for table_type in types {
                if let Some(condition) = table_type_clause(table_type)? {
                    clause.push_str(&format!(" OR ( {condition} ) "));
                }
            }
            clause.push_str(") ");
            query.sql.push_str(&clause);
        }
        SchemaPatternMode::Universal | SchemaPatternMode::External => {
            for table_type in types {
                table_type_clause(table_type)?;
            }
            let placeholders = vec!["?"; types.len()].join(", ");
            query.sql.push_str(&format!(" AND TABLE_TYPE IN ( {placeholders}) "));
            query
                .args
                .extend(types.iter().map(|table_type| (*table_type).into()));
        }
    }
    Ok(())
}

pub(crate) fn local_tables_query(
    catalog: Option<&str>,
    schema_pattern: Option<&str>,
    table_name_pattern: Option<&str>,
    types: &[&str],
) -> Result<CatalogQuery> {
    let mut query = CatalogQuery::new(format!(
        "SELECT CAST(current_database() AS VARCHAR(124)) AS TABLE_CAT, n.nspname AS TABLE_SCHEM, c.relname AS TABLE_NAME, \
         CASE n.nspname ~ '^pg_' OR n.nspname = 'information_schema' \
         WHEN true THEN CASE \
         WHEN n.nspname = 'pg_catalog' OR n.nspname = 'information_schema' THEN CASE c.relkind \
          WHEN 'r' THEN 'SYSTEM TABLE' \
          WHEN 'v' THEN 'SYSTEM VIEW' \
          WHEN 'i' THEN 'SYSTEM INDEX' \
          ELSE NULL \
          END \
         WHEN n.nspname = 'pg_toast' THEN CASE c.relkind \
          WHEN 'r' THEN 'SYSTEM TOAST TABLE' \
          WHEN 'i' THEN 'SYSTEM TOAST INDEX' \
          ELSE NULL \
          END \
         ELSE CASE c.relkind \
          WHEN 'r' THEN 'TEMPORARY TABLE' \
          WHEN 'p' THEN 'TEMPORARY TABLE' \
          WHEN 'i' THEN 'TEMPORARY INDEX' \
          WHEN 'S' THEN 'TEMPORARY SEQUENCE' \
          WHEN 'v' THEN 'TEMPORARY VIEW' \
          ELSE NULL \
          END \
         END \
         WHEN false THEN CASE c.relkind \
         WHEN 'r' THEN 'TABLE' \
         WHEN 'p' THEN 'PARTITIONED TABLE' \
         WHEN 'i' THEN 'INDEX' \
         WHEN 'S' THEN 'SEQUENCE' \
         WHEN 'v' THEN 'VIEW' \
         WHEN 'c' THEN 'TYPE' \
         WHEN 'f' THEN 'FOREIGN TABLE' \
         WHEN 'm' THEN 'MATERIALIZED VIEW' \
         ELSE NULL \
         END \
         ELSE NULL \
         END \
         AS TABLE_TYPE, d.description AS REMARKS, {JDBC_TAIL_COLUMNS}\
         FROM pg_catalog.pg_namespace n, pg_catalog.pg_class c \
         LEFT JOIN pg_catalog.pg_description d ON (c.oid = d.objoid AND d.objsubid = 0) \
         LEFT JOIN pg_catalog.pg_class dc ON (d.classoid=dc.oid AND dc.relname='pg_class') \
         LEFT JOIN pg_catalog.pg_namespace dn ON (dn.oid=dc.relnamespace AND dn.nspname='pg_catalog') \
         WHERE c.relnamespace = n.oid "
    ));
    query.sql.push_str(&catalog_filter(catalog, true, None));
    push_table_filters(
        &mut query,
        schema_pattern,
        table_name_pattern,
        types,
        SchemaPatternMode::Local,
    )?;
    query.sql.push_str(ORDER_BY);
    Ok(query)
}

pub(crate) fn universal_tables_query(
    catalog: Option<&str>,
    schema_pattern: Option<&str>,
    table_name_pattern: Option<&str>,
    types: &[&str],
) -> Result<CatalogQuery> {
    let mut query = CatalogQuery::new(format!(
        "SELECT * FROM (SELECT CAST(current_database() AS VARCHAR(124)) AS TABLE_CAT, \
         table_schema AS TABLE_SCHEM, \
         table_name AS TABLE_NAME, \
         CAST( \
         CASE table_type \
         WHEN 'BASE TABLE' THEN CASE \
         WHEN table_schema = 'pg_catalog' OR table_schema = 'information_schema' THEN 'SYSTEM TABLE' \
         WHEN table_schema = 'pg_toast' THEN 'SYSTEM TOAST TABLE' \
         WHEN table_schema ~ '^pg_' AND table_schema != 'pg_toast' THEN 'TEMPORARY TABLE' \
         ELSE 'TABLE' \
         END \
         WHEN 'VIEW' THEN CASE \
         WHEN table_schema = 'pg_catalog' OR table_schema = 'information_schema' THEN 'SYSTEM VIEW' \
         WHEN table_schema = 'pg_toast' THEN NULL \
         WHEN table_schema ~ '^pg_' AND table_schema != 'pg_toast' THEN 'TEMPORARY VIEW' \
         ELSE 'VIEW' \
         END \
         WHEN 'EXTERNAL TABLE' THEN 'EXTERNAL TABLE' \
         END \
         AS VARCHAR(124)) AS TABLE_TYPE, \
         REMARKS, {JDBC_TAIL_COLUMNS}\
         FROM svv_tables) \
         WHERE true "
    ));
    query.sql.push_str(&catalog_filter(catalog, true, None));
    push_table_filters(
        &mut query,
        schema_pattern,
        table_name_pattern,
        types,
        SchemaPatternMode::Universal,
    )?;
    query.sql.push_str(ORDER_BY);
    Ok(query)
}

/// Datasharing variant spanning every database the user can see
pub(crate) fn all_databases_tables_query(
    catalog: Option<&str>,
    schema_pattern: Option<&str>,
    table_name_pattern: Option<&str>,
    types: &[&str],
) -> Result<CatalogQuery> {
    let mut query = CatalogQuery::new(format!(
        "SELECT * FROM (SELECT CAST(DATABASE_NAME AS VARCHAR(124)) AS TABLE_CAT, \
         SCHEMA_NAME AS TABLE_SCHEM, \
         TABLE_NAME AS TABLE_NAME, \
         CAST( \
         CASE \
         WHEN SCHEMA_NAME='information_schema' AND TABLE_TYPE='TABLE' THEN 'SYSTEM TABLE' \
         WHEN SCHEMA_NAME='information_schema' AND TABLE_TYPE='VIEW' THEN 'SYSTEM VIEW' \
         ELSE TABLE_TYPE \
         END \
         AS VARCHAR(124)) AS TABLE_TYPE, \
         REMARKS, {JDBC_TAIL_COLUMNS}\
         FROM PG_CATALOG.SVV_ALL_TABLES) \
         WHERE true "
    ));
    query
        .sql
        .push_str(&catalog_filter(catalog, false, Some("TABLE_CAT")));
    push_table_filters(
        &mut query,
        schema_pattern,
        table_name_pattern,
        types,
        SchemaPatternMode::Universal,
    )?;
    query.sql.push_str(ORDER_BY);
    Ok(query)
}

pub(crate) fn external_tables_query(
    catalog: Option<&str>,
    schema_pattern: Option<&str>,
    table_name_pattern: Option<&str>,
    types: &[&str],
) -> Result<CatalogQuery> {
    let mut query = CatalogQuery::new(format!(
        "SELECT * FROM (SELECT CAST(current_database() AS VARCHAR(124)) AS TABLE_CAT, \
         schemaname AS table_schem, \
         tablename AS TABLE_NAME, \
         'EXTERNAL TABLE' AS TABLE_TYPE, \
         NULL AS REMARKS, {JDBC_TAIL_COLUMNS}\
         FROM svv_external_tables) \
         WHERE true "
    ));
    query.sql.push_str(&catalog_filter(catalog, true, None));
    push_table_filters(
        &mut query,
        schema_pattern,
        table_name_pattern,
        types,
        SchemaPatternMode::External,
    )?;
    query.sql.push_str(ORDER_BY);
    Ok(query)
}

impl<C: Connection + ?Sized> Cursor<'_, C> {
    /// Tables matching the patterns
    ///
    /// Columns: `TABLE_CAT, TABLE_SCHEM, TABLE_NAME, TABLE_TYPE, REMARKS,
    /// TYPE_CAT, TYPE_SCHEM, TYPE_NAME, SELF_REFERENCING_COL_NAME,
    /// REF_GENERATION`. An empty `types` slice does not filter by type.
    pub fn get_tables(
        &mut self,
        catalog: Option<&str>,
        schema_pattern: Option<&str>,
        table_name_pattern: Option<&str>,
        types: &[&str],
    ) -> Result<Vec<Row>> {
        self.ensure_open()?;
        // reject unknown types before any statement runs
        for table_type in types {
            table_type_clause(table_type)?;
        }

        let query = match self.schema_pattern_match(schema_pattern)? {
            SchemaPatternMode::Local => {
                local_tables_query(catalog, schema_pattern, table_name_pattern, types)?
            }
            SchemaPatternMode::Universal if self.is_single_database_metadata()? => {
                universal_tables_query(catalog, schema_pattern, table_name_pattern, types)?
            }
            SchemaPatternMode::Universal => {
                all_databases_tables_query(catalog, schema_pattern, table_name_pattern, types)?
            }
            SchemaPatternMode::External => {
                external_tables_query(catalog, schema_pattern, table_name_pattern, types)?
            }
        };
        self.run_catalog_query(query)
    }
}
