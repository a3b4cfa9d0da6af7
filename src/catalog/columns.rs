//! `get_columns`
//!
//! Four query shapes, one per catalog source. The local shape also pulls in
//! late-binding view columns, which `pg_attribute` does not describe.

use super::type_map::{
    char_octet_length_sql, column_size_sql, data_type_sql, decimal_digits_sql, type_name_sql,
    TypeSource,
};
use super::{catalog_filter, escape_quotes, non_empty, CatalogQuery, SchemaPatternMode};
use crate::connection::Connection;
use crate::cursor::Cursor;
use crate::error::Result;
use crate::types::Row;

/// Columns shared by every shape after `CHAR_OCTET_LENGTH`
const SCOPE_COLUMNS: &str =
    "NULL AS SCOPE_CATALOG, NULL AS SCOPE_SCHEMA, NULL AS SCOPE_TABLE";

/// Every shape reports a decimal radix, floating point included
const NUM_PREC_RADIX: &str = "10 AS NUM_PREC_RADIX";

/// ` AND <column> LIKE '<escaped>'` for each pattern given
fn like_filters(filters: [(&str, Option<&str>); 3]) -> String {
    filters
        .iter()
        .filter_map(|(column, pattern)| {
            non_empty(*pattern).map(|p| format!(" AND {column} LIKE {}", escape_quotes(p)))
        })
        .collect()
}

fn native_columns_sql(
    catalog: Option<&str>,
    schema_pattern: Option<&str>,
    table_name_pattern: Option<&str>,
    column_name_pattern: Option<&str>,
) -> String {
    let mut sql = format!(
        "SELECT * FROM ( \
         SELECT current_database() AS TABLE_CAT, n.nspname AS TABLE_SCHEM, c.relname AS TABLE_NAME, \
         a.attname AS COLUMN_NAME, \
         {data_type} AS DATA_TYPE, \
         {type_name} AS TYPE_NAME, \
         {column_size} AS COLUMN_SIZE, \
         NULL AS BUFFER_LENGTH, \
         {decimal_digits} AS DECIMAL_DIGITS, \
         {NUM_PREC_RADIX}, \
         CASE a.attnotnull OR (t.typtype = 'd' AND t.typnotnull) WHEN 'false' THEN 1 WHEN NULL THEN 2 ELSE 0 END AS NULLABLE, \
         dsc.description AS REMARKS, \
         pg_catalog.pg_get_expr(def.adbin, def.adrelid) AS COLUMN_DEF, \
         {data_type} AS SQL_DATA_TYPE, \
         CAST(NULL AS SMALLINT) AS SQL_DATETIME_SUB, \
         {octet_length} AS CHAR_OCTET_LENGTH, \
         a.attnum AS ORDINAL_POSITION, \
         CASE a.attnotnull OR (t.typtype = 'd' AND t.typnotnull) WHEN 'false' THEN 'YES' WHEN NULL THEN '' ELSE 'NO' END AS IS_NULLABLE, \
         {SCOPE_COLUMNS}, \
         t.typbasetype AS SOURCE_DATA_TYPE, \
         CASE WHEN left(pg_catalog.pg_get_expr(def.adbin, def.adrelid), 16) = 'default_identity' THEN 'YES' ELSE 'NO' END AS IS_AUTOINCREMENT, \
         CASE WHEN left(pg_catalog.pg_get_expr(def.adbin, def.adrelid), 16) = 'default_identity' THEN 'YES' ELSE 'NO' END AS IS_GENERATEDCOLUMN \
         FROM pg_catalog.pg_namespace n \
         JOIN pg_catalog.pg_class c ON (c.relnamespace = n.oid) \
         JOIN pg_catalog.pg_attribute a ON (a.attrelid = c.oid) \
         JOIN pg_catalog.pg_type t ON (a.atttypid = t.oid) \
         LEFT JOIN pg_catalog.pg_attrdef def ON (a.attrelid = def.adrelid AND a.attnum = def.adnum) \
         LEFT JOIN pg_catalog.pg_description dsc ON (c.oid = dsc.objoid AND a.attnum = dsc.objsubid) \
         LEFT JOIN pg_catalog.pg_class dc ON (dc.oid = dsc.classoid AND dc.relname = 'pg_class') \
         LEFT JOIN pg_catalog.pg_namespace dn ON (dc.relnamespace = dn.oid AND dn.nspname = 'pg_catalog') \
         WHERE a.attnum > 0 AND NOT a.attisdropped ",
        data_type = data_type_sql(TypeSource::Native),
        type_name = type_name_sql(TypeSource::Native),
        column_size = column_size_sql(TypeSource::Native),
        decimal_digits = decimal_digits_sql(TypeSource::Native),
        octet_length = char_octet_length_sql(TypeSource::Native),
    );
    sql.push_str(&catalog_filter(catalog, true, None));
    sql.push_str(&like_filters([
        ("n.nspname", schema_pattern),
        ("c.relname", table_name_pattern),
        ("attname", column_name_pattern),
    ]));
    sql.push_str(" ORDER BY TABLE_SCHEM, c.relname, attnum )");
    sql
}

fn late_binding_columns_sql(
    schema_pattern: Option<&str>,
    table_name_pattern: Option<&str>,
    column_name_pattern: Option<&str>,
) -> String {
    let mut sql = format!(
        "SELECT current_database() AS TABLE_CAT, schemaname AS TABLE_SCHEM, tablename AS TABLE_NAME, \
         columnname AS COLUMN_NAME, \
         {data_type} AS DATA_TYPE, \
         {type_name} AS TYPE_NAME, \
         {column_size} AS COLUMN_SIZE, \
         NULL AS BUFFER_LENGTH, \
         {decimal_digits} AS DECIMAL_DIGITS, \
         {NUM_PREC_RADIX}, \
         NULL AS NULLABLE, \
         NULL AS REMARKS, \
         NULL AS COLUMN_DEF, \
         {data_type} AS SQL_DATA_TYPE, \
         CAST(NULL AS SMALLINT) AS SQL_DATETIME_SUB, \
         {octet_length} AS CHAR_OCTET_LENGTH, \
         columnnum AS ORDINAL_POSITION, \
         NULL AS IS_NULLABLE, \
         {SCOPE_COLUMNS}, \
         NULL AS SOURCE_DATA_TYPE, \
         'NO' AS IS_AUTOINCREMENT, \
         'NO' AS IS_GENERATEDCOLUMN \
         FROM (SELECT lbv_cols.schemaname, lbv_cols.tablename, lbv_cols.columnname, \
         REGEXP_REPLACE(REGEXP_REPLACE(lbv_cols.columntype, '\\\\(.*\\\\)'), '^_.+', 'ARRAY') AS columntype_rep, \
         columntype, lbv_cols.columnnum \
         FROM pg_get_late_binding_view_cols() lbv_cols( \
         schemaname name, tablename name, columnname name, columntype text, columnnum int)) lbv_columns \
         WHERE true",
        data_type = data_type_sql(TypeSource::LateBinding),
        type_name = type_name_sql(TypeSource::LateBinding),
        column_size = column_size_sql(TypeSource::LateBinding),
        decimal_digits = decimal_digits_sql(TypeSource::LateBinding),
        octet_length = char_octet_length_sql(TypeSource::LateBinding),
    );
    sql.push_str(&like_filters([
        ("schemaname", schema_pattern),
        ("tablename", table_name_pattern),
        ("columnname", column_name_pattern),
    ]));
    sql
}

/// Native `pg_catalog` columns plus late-binding view columns
pub(crate) fn local_columns_query(
    catalog: Option<&str>,
    schema_pattern: Option<&str>,
    table_name_pattern: Option<&str>,
    column_name_pattern: Option<&str>,
) -> CatalogQuery {
    CatalogQuery::new(format!(
        "{} UNION ALL {}",
        native_columns_sql(catalog, schema_pattern, table_name_pattern, column_name_pattern),
        late_binding_columns_sql(schema_pattern, table_name_pattern, column_name_pattern),
    ))
}

/// Shared select list for `svv_columns` and `svv_all_columns`
///
/// Only `svv_columns` carries `domain_name`; without it the source type is
/// always reported.
fn svv_columns_select(catalog_column: &str, schema_column: &str, with_domains: bool) -> String {
    let (type_name, source_data_type) = if with_domains {
        (
            format!("COALESCE(domain_name, {})", type_name_sql(TypeSource::Universal)),
            "CASE WHEN domain_name IS NOT NULL THEN data_type END",
        )
    } else {
        (type_name_sql(TypeSource::Universal), "data_type")
    };
    format!(
        "SELECT {catalog_column} AS TABLE_CAT, {schema_column} AS TABLE_SCHEM, table_name, \
         COLUMN_NAME, \
         {data_type} AS DATA_TYPE, \
         {type_name} AS TYPE_NAME, \
         {column_size} AS COLUMN_SIZE, \
         NULL AS BUFFER_LENGTH, \
         {decimal_digits} AS DECIMAL_DIGITS, \
         {NUM_PREC_RADIX}, \
         CASE is_nullable WHEN 'YES' THEN 1 WHEN 'NO' THEN 0 ELSE 2 END AS NULLABLE, \
         REMARKS, \
         column_default AS COLUMN_DEF, \
         {data_type} AS SQL_DATA_TYPE, \
         CAST(NULL AS SMALLINT) AS SQL_DATETIME_SUB, \
         {octet_length} AS CHAR_OCTET_LENGTH, \
         ordinal_position AS ORDINAL_POSITION, \
         is_nullable AS IS_NULLABLE, \
         {SCOPE_COLUMNS}, \
         {source_data_type} AS SOURCE_DATA_TYPE, \
         CASE WHEN left(column_default, 10) = '\"identity\"' THEN 'YES' \
         WHEN left(column_default, 16) = 'default_identity' THEN 'YES' \
         ELSE 'NO' END AS IS_AUTOINCREMENT, \
         IS_AUTOINCREMENT AS IS_GENERATEDCOLUMN",
        data_type = data_type_sql(TypeSource::Universal),
        column_size = column_size_sql(TypeSource::Universal),
        decimal_digits = decimal_digits_sql(TypeSource::Universal),
        octet_length = char_octet_length_sql(TypeSource::Universal),
    )
}

pub(crate) fn universal_columns_query(
    catalog: Option<&str>,
    schema_pattern: Option<&str>,
    table_name_pattern: Option<&str>,
    column_name_pattern: Option<&str>,
) -> CatalogQuery {
    let mut query = CatalogQuery::new(format!(
        "{} FROM svv_columns WHERE true ",
        svv_columns_select("current_database()", "table_schema", true)
    ));
    query.sql.push_str(&catalog_filter(catalog, true, None));
    query.sql.push_str(&like_filters([
        ("table_schema", schema_pattern),
        ("table_name", table_name_pattern),
        ("column_name", column_name_pattern),
    ]));
    query
        .sql
        .push_str(" ORDER BY table_schem,table_name,ORDINAL_POSITION ");
    query
}

/// Datasharing variant spanning every database the user can see
pub(crate) fn all_databases_columns_query(
    catalog: Option<&str>,
    schema_pattern: Option<&str>,
    table_name_pattern: Option<&str>,
    column_name_pattern: Option<&str>,
) -> CatalogQuery {
    let mut query = CatalogQuery::new(format!(
        "{} FROM PG_CATALOG.svv_all_columns WHERE true ",
        svv_columns_select("database_name", "schema_name", false)
    ));
    query.sql.push_str(&catalog_filter(catalog, false, None));
    query.sql.push_str(&like_filters([
        ("schema_name", schema_pattern),
        ("table_name", table_name_pattern),
        ("column_name", column_name_pattern),
    ]));
    query
        .sql
        .push_str(" ORDER BY TABLE_CAT, TABLE_SCHEM, TABLE_NAME, ORDINAL_POSITION ");
    query
}

pub(crate) fn external_columns_query(
    catalog: Option<&str>,
    schema_pattern: Option<&str>,
    table_name_pattern: Option<&str>,
    column_name_pattern: Option<&str>,
) -> CatalogQuery {
    let mut query = CatalogQuery::new(format!(
        "SELECT * FROM (SELECT current_database() AS TABLE_CAT, schemaname AS TABLE_SCHEM, \
         tablename AS TABLE_NAME, columnname AS COLUMN_NAME, \
         {data_type} AS DATA_TYPE, \
         {type_name} AS TYPE_NAME, \
         {column_size} AS COLUMN_SIZE, \
         NULL AS BUFFER_LENGTH, \
         {decimal_digits} AS DECIMAL_DIGITS, \
         {NUM_PREC_RADIX}, \
         NULL AS NULLABLE, \
         NULL AS REMARKS, \
         NULL AS COLUMN_DEF, \
         {data_type} AS SQL_DATA_TYPE, \
         CAST(NULL AS SMALLINT) AS SQL_DATETIME_SUB, \
         {octet_length} AS CHAR_OCTET_LENGTH, \
         columnnum AS ORDINAL_POSITION, \
         NULL AS IS_NULLABLE, \
         {SCOPE_COLUMNS}, \
         NULL AS SOURCE_DATA_TYPE, \
         'NO' AS IS_AUTOINCREMENT, \
         'NO' AS IS_GENERATEDCOLUMN \
         FROM svv_external_columns) WHERE true ",
        data_type = data_type_sql(TypeSource::External),
        type_name = type_name_sql(TypeSource::External),
        column_size = column_size_sql(TypeSource::External),
        decimal_digits = decimal_digits_sql(TypeSource::External),
        octet_length = char_octet_length_sql(TypeSource::External),
    ));
    query.sql.push_str(&catalog_filter(catalog, true, None));
    query.sql.push_str(&like_filters([
        ("TABLE_SCHEM", schema_pattern),
        ("TABLE_NAME", table_name_pattern),
        ("COLUMN_NAME", column_name_pattern),
    ]));
    query
        .sql
        .push_str(" ORDER BY TABLE_SCHEM,TABLE_NAME,ORDINAL_POSITION ");
    query
}

impl<C: Connection + ?Sized> Cursor<'_, C> {
    /// Columns matching the patterns, in the 24-column JDBC shape
    ///
    /// `TABLE_CAT, TABLE_SCHEM, TABLE_NAME, COLUMN_NAME, DATA_TYPE, TYPE_NAME,
    /// COLUMN_SIZE, BUFFER_LENGTH, DECIMAL_DIGITS, NUM_PREC_RADIX, NULLABLE,
    /// REMARKS, COLUMN_DEF, SQL_DATA_TYPE, SQL_DATETIME_SUB, CHAR_OCTET_LENGTH,
    /// ORDINAL_POSITION, IS_NULLABLE, SCOPE_CATALOG, SCOPE_SCHEMA, SCOPE_TABLE,
    /// SOURCE_DATA_TYPE, IS_AUTOINCREMENT, IS_GENERATEDCOLUMN`
    pub fn get_columns(
        &mut self,
        catalog: Option<&str>,
        schema_pattern: Option<&str>,
        table_name_pattern: Option<&str>,
        column_name_pattern: Option<&str>,
    ) -> Result<Vec<Row>> {
        self.ensure_open()?;
        let query = match self.schema_pattern_match(schema_pattern)? {
            SchemaPatternMode::Local => {
                local_columns_query(
                    catalog,
                    schema_pattern,
                    table_name_pattern,
                    column_name_pattern,
                )
            }
            SchemaPatternMode::Universal if self.is_single_database_metadata()? => {
                universal_columns_query(
                    catalog,
                    schema_pattern,
                    table_name_pattern,
                    column_name_pattern,
                )
            }
            SchemaPatternMode::Universal => all_databases_columns_query(
                catalog,
                schema_pattern,
                table_name_pattern,
                column_name_pattern,
            ),
            SchemaPatternMode::External => external_columns_query(
                catalog,
                schema_pattern,
                table_name_pattern,
                column_name_pattern,
            ),
        };
        self.run_catalog_query(query)
    }
}
