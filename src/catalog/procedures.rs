//! `get_procedures`

use super::{catalog_filter, non_empty, sanitize_str, CatalogQuery};
use crate::connection::Connection;
use crate::cursor::Cursor;
use crate::error::Result;
use crate::types::Row;

pub(crate) fn procedures_query(
    catalog: Option<&str>,
    schema_pattern: Option<&str>,
    procedure_name_pattern: Option<&str>,
) -> CatalogQuery {
    let mut query = CatalogQuery::new(
        "SELECT current_database() AS PROCEDURE_CAT, n.nspname AS PROCEDURE_SCHEM, \
         p.proname AS PROCEDURE_NAME, NULL, NULL, NULL, d.description AS REMARKS, \
         CASE p.prokind WHEN 'f' THEN 2 WHEN 'p' THEN 1 ELSE 0 END AS PROCEDURE_TYPE, \
         p.proname || '_' || p.prooid AS SPECIFIC_NAME \
         FROM pg_catalog.pg_namespace n, pg_catalog.pg_proc_info p \
         LEFT JOIN pg_catalog.pg_description d ON (p.prooid=d.objoid) \
         LEFT JOIN pg_catalog.pg_class c ON (d.classoid=c.oid AND c.relname='pg_proc') \
         LEFT JOIN pg_catalog.pg_namespace pn ON (c.relnamespace=pn.oid AND pn.nspname='pg_catalog') \
         WHERE p.pronamespace=n.oid",
    );
    query.sql.push_str(&catalog_filter(catalog, true, None));
    match non_empty(schema_pattern) {
        Some(schema) => query.bind(" AND n.nspname LIKE ?", sanitize_str(schema)),
        None => query.sql.push_str(" and pg_function_is_visible(p.prooid)"),
    }
    if let Some(name) = non_empty(procedure_name_pattern) {
        query.bind(" AND p.proname LIKE ?", sanitize_str(name));
    }
    query
        .sql
        .push_str(" ORDER BY PROCEDURE_SCHEM, PROCEDURE_NAME, p.prooid::text ");
    query
}

impl<C: Connection + ?Sized> Cursor<'_, C> {
    /// Stored procedures and functions
    ///
    /// Without a schema pattern only objects visible on the search path are
    /// listed.
    pub fn get_procedures(
        &mut self,
        catalog: Option<&str>,
        schema_pattern: Option<&str>,
        procedure_name_pattern: Option<&str>,
    ) -> Result<Vec<Row>> {
        self.ensure_open()?;
        self.run_catalog_query(procedures_query(
            catalog,
            schema_pattern,
            procedure_name_pattern,
        ))
    }
}
