//! `get_schemas` and `get_catalogs`

use super::{catalog_filter, non_empty, sanitize_str, CatalogQuery};
use crate::connection::Connection;
use crate::cursor::Cursor;
use crate::error::Result;
use crate::types::Row;

pub(crate) fn schemas_query(
    single_database: bool,
    catalog: Option<&str>,
    schema_pattern: Option<&str>,
) -> CatalogQuery {
    let (mut query, schema_column, order_by) = if single_database {
        let mut query = CatalogQuery::new(
            "SELECT nspname AS TABLE_SCHEM, NULL AS TABLE_CATALOG FROM pg_catalog.pg_namespace \
             WHERE nspname <> 'pg_toast' \
             AND (nspname !~ '^pg_temp_' OR nspname = (pg_catalog.current_schemas(true))[1]) \
             AND (nspname !~ '^pg_toast_temp_' OR nspname = replace((pg_catalog.current_schemas(true))[1], 'pg_temp_', 'pg_toast_temp_'))",
        );
        query.sql.push_str(&catalog_filter(catalog, true, None));
        (query, "nspname", " ORDER BY TABLE_SCHEM")
    } else {
        let mut query = CatalogQuery::new(
            "SELECT CAST(schema_name AS varchar(124)) AS TABLE_SCHEM, \
             CAST(database_name AS varchar(124)) AS TABLE_CATALOG \
             FROM PG_CATALOG.SVV_ALL_SCHEMAS WHERE TRUE",
        );
        query.sql.push_str(&catalog_filter(catalog, false, None));
        (query, "schema_name", " ORDER BY TABLE_CATALOG, TABLE_SCHEM")
    };

    if let Some(schema) = non_empty(schema_pattern) {
        query.bind(&format!(" AND {schema_column} LIKE ?"), sanitize_str(schema));
    }
    query.sql.push_str(order_by);
    query
}

pub(crate) fn catalogs_query(single_database: bool) -> CatalogQuery {
    let sql = if single_database {
        "select current_database as TABLE_CAT FROM current_database()"
    } else {
        "SELECT CAST(database_name AS varchar(124)) AS TABLE_CAT FROM PG_CATALOG.SVV_REDSHIFT_DATABASES "
    };
    CatalogQuery::new(format!("{sql} ORDER BY TABLE_CAT"))
}

impl<C: Connection + ?Sized> Cursor<'_, C> {
    /// Schemas, as `TABLE_SCHEM, TABLE_CATALOG`
    pub fn get_schemas(
        &mut self,
        catalog: Option<&str>,
        schema_pattern: Option<&str>,
    ) -> Result<Vec<Row>> {
        self.ensure_open()?;
        let single_database = self.is_single_database_metadata()?;
        self.run_catalog_query(schemas_query(single_database, catalog, schema_pattern))
    }

    /// Databases, as `TABLE_CAT`
    pub fn get_catalogs(&mut self) -> Result<Vec<Row>> {
        self.ensure_open()?;
        let single_database = self.is_single_database_metadata()?;
        self.run_catalog_query(catalogs_query(single_database))
    }
}
