//! Table constraints
//!
//! Two families live here. `get_primary_keys` is the JDBC-shaped result set.
//! The rest (`get_pk_constraint`, `get_foreign_keys`, `get_unique_constraints`,
//! `get_check_constraints`) read `pg_constraint` once per relation and parse
//! the printed definitions into structs. Spectrum tables have no constraints
//! of their own, so each external column is reported as a one-column primary
//! key named `<table>_pkey`.

use super::{non_empty, sanitize_str, CatalogQuery};
use crate::connection::Connection;
use crate::cursor::Cursor;
use crate::error::Result;
use crate::types::{Row, Value};
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

static FOREIGN_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?x)
        ^FOREIGN\ KEY \s* \(
            (?P<columns>(?:\s*(?:[_a-zA-Z][\w$]*|(?:"[^"]+")+)\s*,?)+)
        \s* \) \s* REFERENCES \s*
        (?:(?P<referred_schema>[_a-zA-Z][\w$]*|(?:"[^"]*")+)\.)?
        (?P<referred_table>[_a-zA-Z][\w$]*|(?:"[^"]*")+)
        \s* \(
            (?P<referred_columns>(?:\s*(?:[_a-zA-Z][\w$]*|(?:"[^"]+")+)\s*,?)+)
        \s* \)
        "#,
    )
    .unwrap()
});

static PRIMARY_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?x)
        ^PRIMARY \s* KEY \s* \(
            (?P<columns>(?:\s*(?:[_a-zA-Z][\w$]*|(?:"[^"]*")+)\s*,?)+)
        \s* \) \s*
        "#,
    )
    .unwrap()
});

static CHECK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^CHECK *\((.+)\)( NOT VALID)?$").unwrap());

static OUTER_PARENS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^\s*\((.+)\)\s*$").unwrap());

static SQL_IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[_a-zA-Z][\w$]*|(?:"[^"]+")+"#).unwrap());

/// Schema used when a constraint lookup names none
pub(crate) const DEFAULT_SCHEMA: &str = "public";

// ============================================================================
// Relation identity
// ============================================================================

/// Schema-qualified relation name as it appears in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RelationKey {
    /// Table or view name, possibly double-quoted
    pub name: String,
    /// Owning schema, possibly double-quoted
    pub schema: Option<String>,
}

impl RelationKey {
    /// Key for `name` in `schema`
    pub fn new(name: impl Into<String>, schema: Option<&str>) -> Self {
        Self {
            name: name.into(),
            schema: schema.map(str::to_string),
        }
    }

    /// Same key with one level of double quotes removed from each part
    ///
    /// Redshift stores keyword-named relations unquoted in its system tables.
    pub fn unquoted(&self) -> Self {
        Self {
            name: unquote(&self.name),
            schema: self.schema.as_deref().map(unquote),
        }
    }

    /// Key for a user-supplied name, `schema` defaulting to `public`
    pub(crate) fn lookup(name: &str, schema: Option<&str>) -> Self {
        Self::new(name, Some(non_empty(schema).unwrap_or(DEFAULT_SCHEMA)))
    }

    /// Find this key in `map`, falling back to its unquoted form
    pub(crate) fn find_in<'m, V>(&self, map: &'m HashMap<RelationKey, V>) -> Option<&'m V> {
        map.get(self).or_else(|| map.get(&self.unquoted()))
    }
}

impl fmt::Display for RelationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

fn unquote(part: &str) -> String {
    if part.len() >= 2 && part.starts_with('"') && part.ends_with('"') {
        part[1..part.len() - 1].to_string()
    } else {
        part.to_string()
    }
}

fn identifiers(text: &str) -> Vec<String> {
    SQL_IDENTIFIER_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

// ============================================================================
// Parsed constraints
// ============================================================================

/// A parsed `FOREIGN KEY` constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKey {
    /// Constraint name
    pub name: String,
    /// Referring columns, in declaration order
    pub constrained_columns: Vec<String>,
    /// Schema of the referred table when the definition qualifies it
    pub referred_schema: Option<String>,
    /// Referred table
    pub referred_table: String,
    /// Referred columns, in declaration order
    pub referred_columns: Vec<String>,
}

/// Primary key of a relation; empty name and columns when it has none
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PrimaryKeyConstraint {
    /// Constraint name
    pub name: String,
    /// Key columns, in declaration order
    pub constrained_columns: Vec<String>,
}

/// A `UNIQUE` constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UniqueConstraint {
    /// Constraint name
    pub name: String,
    /// Columns in key order
    pub column_names: Vec<String>,
}

/// A `CHECK` constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckConstraint {
    /// Constraint name
    pub name: String,
    /// Check expression with the outer parentheses removed, empty if unparsable
    pub sqltext: String,
    /// Declared `NOT VALID`
    pub not_valid: bool,
}

/// Parse a constraint definition as printed by `pg_get_constraintdef`
///
/// Returns `None` for anything that is not a foreign key. Identifiers are
/// returned exactly as printed, quotes included.
pub fn parse_foreign_key(name: &str, condef: &str) -> Option<ForeignKey> {
    let caps = FOREIGN_KEY_RE.captures(condef)?;
    Some(ForeignKey {
        name: name.to_string(),
        constrained_columns: identifiers(caps.name("columns")?.as_str()),
        referred_schema: caps.name("referred_schema").map(|m| m.as_str().to_string()),
        referred_table: caps.name("referred_table")?.as_str().to_string(),
        referred_columns: identifiers(caps.name("referred_columns")?.as_str()),
    })
}

/// Column list of a `PRIMARY KEY (...)` definition
pub fn parse_primary_key(condef: &str) -> Option<Vec<String>> {
    let caps = PRIMARY_KEY_RE.captures(condef)?;
    Some(identifiers(caps.name("columns")?.as_str()))
}

/// Parse a `CHECK (...)` definition, keeping unparsable ones with empty text
pub fn parse_check_constraint(name: &str, src: &str) -> CheckConstraint {
    let Some(caps) = CHECK_RE.captures(src) else {
        tracing::warn!("Could not parse CHECK constraint text: {}", src);
        return CheckConstraint {
            name: name.to_string(),
            sqltext: String::new(),
            not_valid: false,
        };
    };
    let body = caps.get(1).map_or("", |m| m.as_str());
    CheckConstraint {
        name: name.to_string(),
        sqltext: OUTER_PARENS_RE.replace(body, "${1}").into_owned(),
        not_valid: caps.get(2).is_some(),
    }
}

// ============================================================================
// Constraint rows
// ============================================================================

/// One `(constraint, column)` pair from the constraint query
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ConstraintRow {
    pub contype: String,
    pub conname: String,
    /// Column numbers in key order
    pub conkey: Vec<i64>,
    pub attnum: i64,
    pub attname: String,
    pub condef: String,
}

pub(crate) fn constraints_query(schema: &str, table: &str) -> CatalogQuery {
    let mut query = CatalogQuery::new(
        "SELECT n.nspname AS schema, c.relname AS table_name, t.contype, t.conname, \
         pg_catalog.array_to_string(t.conkey, ',') AS conkey, a.attnum, a.attname, \
         pg_catalog.pg_get_constraintdef(t.oid, true)::varchar(512) AS condef \
         FROM pg_catalog.pg_class c \
         LEFT JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace \
         JOIN pg_catalog.pg_constraint t ON t.conrelid = c.oid \
         JOIN pg_catalog.pg_attribute a ON t.conrelid = a.attrelid AND a.attnum = ANY(t.conkey) \
         WHERE n.nspname !~ '^pg_'",
    );
    query.bind(" AND n.nspname = ?", schema.to_string());
    query.bind(" AND c.relname = ?", table.to_string());
    query.sql.push_str(
        " UNION \
         SELECT s.schemaname AS schema, c.tablename AS table_name, 'p' AS contype, \
         c.tablename || '_pkey' AS conname, '1' AS conkey, 1 AS attnum, c.columnname AS attname, \
         'PRIMARY KEY (' || c.columnname || ')'::VARCHAR(512) AS condef \
         FROM svv_external_columns c \
         JOIN svv_external_schemas s ON s.schemaname = c.schemaname \
         WHERE true",
    );
    query.bind(" AND s.schemaname = ?", schema.to_string());
    query.bind(" AND c.tablename = ?", table.to_string());
    query.sql.push_str(" ORDER BY schema, table_name");
    query
}

fn parse_conkey(value: Option<&Value>) -> Vec<i64> {
    match value {
        Some(Value::Int(i)) => vec![*i],
        Some(v) => v
            .as_str()
            .unwrap_or_default()
            .trim_matches(|c| c == '{' || c == '}')
            .split(',')
            .filter_map(|n| n.trim().parse().ok())
            .collect(),
        None => Vec::new(),
    }
}

/// Group constraint rows by relation, in query order
pub(crate) fn group_constraints(rows: &[Row]) -> HashMap<RelationKey, Vec<ConstraintRow>> {
    let mut grouped: HashMap<RelationKey, Vec<ConstraintRow>> = HashMap::new();
    for row in rows {
        let text = |i: usize| row.get(i).and_then(Value::as_str);
        let (Some(schema), Some(table), Some(contype), Some(conname), Some(attname), Some(condef)) =
            (text(0), text(1), text(2), text(3), text(6), text(7))
        else {
            tracing::warn!("Skipping malformed constraint row: {:?}", row);
            continue;
        };
        grouped
            .entry(RelationKey::new(table, Some(schema)))
            .or_default()
            .push(ConstraintRow {
                contype: contype.to_string(),
                conname: conname.to_string(),
                conkey: parse_conkey(row.get(4)),
                attnum: row.get(5).and_then(Value::as_i64).unwrap_or_default(),
                attname: attname.to_string(),
                condef: condef.to_string(),
            });
    }
    grouped
}

/// First row of each constraint of type `contype`, in query order
fn distinct_constraints<'r>(rows: &'r [ConstraintRow], contype: &str) -> Vec<&'r ConstraintRow> {
    let mut seen: Vec<&ConstraintRow> = Vec::new();
    for row in rows.iter().filter(|r| r.contype == contype) {
        if !seen.iter().any(|s| s.conname == row.conname) {
            seen.push(row);
        }
    }
    seen
}

fn unique_constraints(rows: &[ConstraintRow]) -> Vec<UniqueConstraint> {
    distinct_constraints(rows, "u")
        .into_iter()
        .map(|first| {
            let columns: HashMap<i64, &str> = rows
                .iter()
                .filter(|r| r.contype == "u" && r.conname == first.conname)
                .map(|r| (r.attnum, r.attname.as_str()))
                .collect();
            UniqueConstraint {
                name: first.conname.clone(),
                column_names: first
                    .conkey
                    .iter()
                    .filter_map(|n| columns.get(n).map(|c| (*c).to_string()))
                    .collect(),
            }
        })
        .collect()
}

pub(crate) fn check_constraints_query(schema: &str, table: &str) -> CatalogQuery {
    let mut query = CatalogQuery::new(
        "SELECT cons.conname AS name, pg_catalog.pg_get_constraintdef(cons.oid) AS src \
         FROM pg_catalog.pg_constraint cons \
         JOIN pg_catalog.pg_class c ON c.oid = cons.conrelid \
         JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace \
         WHERE cons.contype = 'c'",
    );
    query.bind(" AND n.nspname = ?", schema.to_string());
    query.bind(" AND c.relname = ?", table.to_string());
    query
}

// ============================================================================
// Primary keys
// ============================================================================

pub(crate) fn primary_keys_query(schema: Option<&str>, table: Option<&str>) -> CatalogQuery {
    let mut query = CatalogQuery::new(
        "SELECT current_database() AS TABLE_CAT, n.nspname AS TABLE_SCHEM, \
         ct.relname AS TABLE_NAME, a.attname AS COLUMN_NAME, a.attnum AS KEY_SEQ, \
         ci.relname AS PK_NAME \
         FROM pg_catalog.pg_namespace n, pg_catalog.pg_class ct, pg_catalog.pg_class ci, \
         pg_catalog.pg_attribute a, pg_catalog.pg_index i \
         WHERE ct.oid=i.indrelid AND ci.oid=i.indexrelid AND a.attrelid=ci.oid \
         AND i.indisprimary AND ct.relnamespace = n.oid",
    );
    if let Some(schema) = non_empty(schema) {
        query.bind(" AND n.nspname = ?", sanitize_str(schema));
    }
    if let Some(table) = non_empty(table) {
        query.bind(" AND ct.relname = ?", sanitize_str(table));
    }
    query.sql.push_str(" ORDER BY table_name, pk_name, key_seq");
    query
}

impl<C: Connection + ?Sized> Cursor<'_, C> {
    /// Primary key columns of the connected database
    ///
    /// Columns: `TABLE_CAT, TABLE_SCHEM, TABLE_NAME, COLUMN_NAME, KEY_SEQ, PK_NAME`.
    /// `catalog` is accepted for signature parity; the query always reads
    /// the connected database.
    pub fn get_primary_keys(
        &mut self,
        _catalog: Option<&str>,
        schema: Option<&str>,
        table: Option<&str>,
    ) -> Result<Vec<Row>> {
        self.ensure_open()?;
        self.run_catalog_query(primary_keys_query(schema, table))
    }

    /// Constraint rows of one relation; `schema` defaults to `public`
    fn relation_constraints(&mut self, schema: Option<&str>, table: &str) -> Result<Vec<ConstraintRow>> {
        self.ensure_open()?;
        let key = RelationKey::lookup(table, schema);
        let lookup = key.unquoted();
        let schema_name = lookup.schema.clone().unwrap_or_default();

        let rows = self.run_catalog_query(constraints_query(&schema_name, &lookup.name))?;
        let mut grouped = group_constraints(&rows);
        let found = if grouped.contains_key(&key) { key.clone() } else { lookup };
        Ok(grouped.remove(&found).unwrap_or_else(|| {
            tracing::debug!("No constraints found for {}", key);
            Vec::new()
        }))
    }

    /// Primary key constraint of `table`
    pub fn get_pk_constraint(&mut self, schema: Option<&str>, table: &str) -> Result<PrimaryKeyConstraint> {
        let rows = self.relation_constraints(schema, table)?;
        let Some(pk) = rows.iter().find(|r| r.contype == "p") else {
            return Ok(PrimaryKeyConstraint::default());
        };
        let constrained_columns = parse_primary_key(&pk.condef).unwrap_or_else(|| {
            tracing::warn!("Could not parse PRIMARY KEY constraint text: {}", pk.condef);
            Vec::new()
        });
        Ok(PrimaryKeyConstraint {
            name: pk.conname.clone(),
            constrained_columns,
        })
    }

    /// Foreign keys declared on `table`
    ///
    /// `schema` defaults to `public`. Quoted names match either as given or
    /// with their quotes removed.
    pub fn get_foreign_keys(&mut self, schema: Option<&str>, table: &str) -> Result<Vec<ForeignKey>> {
        let rows = self.relation_constraints(schema, table)?;
        Ok(distinct_constraints(&rows, "f")
            .into_iter()
            .filter_map(|row| parse_foreign_key(&row.conname, &row.condef))
            .collect())
    }

    /// Unique constraints of `table`, columns in key order
    pub fn get_unique_constraints(&mut self, schema: Option<&str>, table: &str) -> Result<Vec<UniqueConstraint>> {
        let rows = self.relation_constraints(schema, table)?;
        Ok(unique_constraints(&rows))
    }

    /// Check constraints of `table`
    pub fn get_check_constraints(&mut self, schema: Option<&str>, table: &str) -> Result<Vec<CheckConstraint>> {
        self.ensure_open()?;
        let lookup = RelationKey::lookup(table, schema).unquoted();
        let schema_name = lookup.schema.clone().unwrap_or_default();
        let rows = self.run_catalog_query(check_constraints_query(&schema_name, &lookup.name))?;
        Ok(rows
            .iter()
            .filter_map(|row| {
                let name = row.first().and_then(Value::as_str)?;
                let src = row.get(1).and_then(Value::as_str)?;
                Some(parse_check_constraint(name, src))
            })
            .collect())
    }
}
