//! Tests for catalog reflection

use super::*;
use crate::result::{ColumnDescription, StatementResult, INT4_OID, VARCHAR_OID};
use crate::testing::ScriptedConnection;
use pretty_assertions::assert_eq;
use test_case::test_case;

fn external_schema_found(found: bool) -> StatementResult {
    let rows = if found { vec![vec![Value::Int(1)]] } else { vec![] };
    StatementResult::query(vec![ColumnDescription::new("?column?", INT4_OID)], rows)
}

fn empty_catalog() -> StatementResult {
    StatementResult::query(vec![ColumnDescription::new("TABLE_CAT", VARCHAR_OID)], vec![])
}

// ============================================================================
// Sanitizer
// ============================================================================

#[test_case("my_table", "my_table")]
#[test_case("my table", "mytable")]
#[test_case("x'; drop table y; --", "xdroptabley")]
#[test_case("a/*b*/", "a*b*")]
#[test_case("\"quoted\"\r\n", "quoted")]
fn test_sanitize_str(input: &str, expected: &str) {
    assert_eq!(sanitize_str(input), expected);
}

#[test]
fn test_escape_quotes() {
    assert_eq!(escape_quotes("o'brien"), "'obrien'");
}

#[test]
fn test_catalog_filter() {
    assert_eq!(catalog_filter(None, true, None), "");
    assert_eq!(catalog_filter(Some(""), false, None), "");
    assert_eq!(
        catalog_filter(Some("dev"), true, None),
        " AND current_database() = 'dev'"
    );
    assert_eq!(
        catalog_filter(Some("dev"), false, None),
        " AND database_name = 'dev'"
    );
    assert_eq!(
        catalog_filter(Some("dev"), false, Some("TABLE_CAT")),
        " AND TABLE_CAT = 'dev'"
    );
}

// ============================================================================
// Schema pattern matching
// ============================================================================

#[test]
fn test_schema_pattern_match_modes() {
    let mut conn = ScriptedConnection::new().on("svv_external_schemas", external_schema_found(true));
    let mut cursor = Cursor::new(&mut conn);
    assert_eq!(
        cursor.schema_pattern_match(Some("spectrum")).unwrap(),
        SchemaPatternMode::External
    );
    assert_eq!(cursor.schema_pattern_match(None).unwrap(), SchemaPatternMode::Universal);
    assert_eq!(cursor.schema_pattern_match(Some("")).unwrap(), SchemaPatternMode::Universal);
    assert_eq!(cursor.paramstyle(), Paramstyle::Format);
    drop(cursor);

    // the lookup runs once, for the non-empty pattern
    assert_eq!(
        conn.statements(),
        vec!["select 1 from svv_external_schemas where schemaname like 'spectrum'"]
    );

    let mut conn = ScriptedConnection::new().on("svv_external_schemas", external_schema_found(false));
    let mut cursor = Cursor::new(&mut conn);
    assert_eq!(
        cursor.schema_pattern_match(Some("public")).unwrap(),
        SchemaPatternMode::Local
    );

    let mut conn = ScriptedConnection::new().with_single_database_metadata(false);
    let mut cursor = Cursor::new(&mut conn);
    assert_eq!(
        cursor.schema_pattern_match(Some("public")).unwrap(),
        SchemaPatternMode::Universal
    );
    drop(cursor);
    assert!(conn.executed().is_empty());
}

#[test]
fn test_schema_lookup_failure_restores_paramstyle() {
    let mut conn = ScriptedConnection::new().fail("svv_external_schemas", "permission denied");
    let mut cursor = Cursor::new(&mut conn);
    assert!(cursor.get_tables(None, Some("public"), None, &[]).is_err());
    assert_eq!(cursor.paramstyle(), Paramstyle::Format);
}

// ============================================================================
// Tables
// ============================================================================

#[test]
fn test_local_tables_query_type_filter() {
    let query =
        tables::local_tables_query(None, Some("public"), Some("sales%"), &["TABLE", "VIEW"])
            .unwrap();
    assert!(query.sql.contains(" AND TABLE_SCHEM LIKE ? AND TABLE_NAME LIKE ?"));
    assert!(query.sql.contains(" AND (false  OR ( c.relkind = 'r'"));
    assert!(query.sql.contains(" OR ( c.relkind = 'v'"));
    assert!(query.sql.ends_with(" ORDER BY TABLE_TYPE,TABLE_SCHEM,TABLE_NAME "));
    assert_eq!(query.args, vec![Value::from("public"), Value::from("sales%")]);
}

#[test]
fn test_universal_tables_query_binds_types() {
    let query = tables::universal_tables_query(Some("dev"), None, None, &["TABLE", "EXTERNAL TABLE"])
        .unwrap();
    assert!(query.sql.contains("FROM svv_tables"));
    assert!(query.sql.contains(" AND current_database() = 'dev'"));
    assert!(query.sql.contains(" AND TABLE_TYPE IN ( ?, ?) "));
    assert_eq!(query.args, vec![Value::from("TABLE"), Value::from("EXTERNAL TABLE")]);
}

#[test]
fn test_all_databases_tables_query() {
    let query = tables::all_databases_tables_query(Some("dev"), Some("pub%"), None, &[]).unwrap();
    assert!(query.sql.contains("FROM PG_CATALOG.SVV_ALL_TABLES"));
    assert!(query.sql.contains(" AND TABLE_CAT = 'dev'"));
    assert_eq!(query.args, vec![Value::from("pub%")]);
}

#[test]
fn test_external_tables_query() {
    let query = tables::external_tables_query(None, Some("spectrum"), None, &[]).unwrap();
    assert!(query.sql.contains("FROM svv_external_tables"));
    assert!(query.sql.contains("'EXTERNAL TABLE' AS TABLE_TYPE"));
}

#[test]
fn test_get_tables_unknown_type() {
    let mut conn = ScriptedConnection::new();
    let mut cursor = Cursor::new(&mut conn);
    let err = cursor
        .get_tables(None, None, None, &["TABLE", "BOGUS"])
        .unwrap_err();
    assert!(err.is_interface());
    assert!(err
        .to_string()
        .contains("Invalid type: BOGUS provided. types may only contain:"));
    drop(cursor);
    assert!(conn.executed().is_empty());
}

#[test]
fn test_get_tables_local_mode() {
    let mut conn = ScriptedConnection::new()
        .on("svv_external_schemas", external_schema_found(false))
        .on("pg_catalog.pg_namespace n, pg_catalog.pg_class c", empty_catalog());
    let mut cursor = Cursor::new(&mut conn);
    let rows = cursor
        .get_tables(None, Some("public"), Some("t%"), &["TABLE"])
        .unwrap();
    assert!(rows.is_empty());
    drop(cursor);

    let executed = conn.executed();
    assert_eq!(executed.len(), 2);
    assert!(executed[1].sql.contains("TABLE_SCHEM LIKE $1 AND TABLE_NAME LIKE $2"));
    assert_eq!(executed[1].args, vec![Value::from("public"), Value::from("t%")]);
}

#[test]
fn test_every_table_type_is_accepted() {
    let types: Vec<&str> = TABLE_TYPES.iter().map(|(name, _)| *name).collect();
    assert!(tables::local_tables_query(None, None, None, &types).is_ok());
    assert!(tables::universal_tables_query(None, None, None, &types).is_ok());
}

// ============================================================================
// Columns
// ============================================================================

#[test]
fn test_local_columns_query_unions_late_binding() {
    let query = columns::local_columns_query(None, Some("public"), Some("t"), Some("c%"));
    assert!(query.args.is_empty());
    assert!(query.sql.contains("WHERE a.attnum > 0 AND NOT a.attisdropped"));
    assert!(query.sql.contains(" AND n.nspname LIKE 'public'"));
    assert!(query.sql.contains(" AND attname LIKE 'c%'"));
    assert!(query.sql.contains(" UNION ALL "));
    assert!(query.sql.contains("pg_get_late_binding_view_cols()"));
    assert!(query.sql.contains(" AND columnname LIKE 'c%'"));
}

#[test]
fn test_universal_columns_query() {
    let query = columns::universal_columns_query(None, Some("public"), Some("t"), None);
    assert!(query.sql.contains("FROM svv_columns"));
    assert!(query.sql.contains("COALESCE(domain_name,"));
    assert!(query
        .sql
        .contains(" AND table_schema LIKE 'public' AND table_name LIKE 't'"));
    assert!(query.sql.ends_with(" ORDER BY table_schem,table_name,ORDINAL_POSITION "));
    assert!(query.args.is_empty());
}

#[test]
fn test_all_databases_columns_query() {
    let query = columns::all_databases_columns_query(Some("dev"), None, None, Some("id"));
    assert!(query.sql.contains("FROM PG_CATALOG.svv_all_columns"));
    assert!(!query.sql.contains("domain_name"));
    assert!(query.sql.contains(" AND database_name = 'dev' AND column_name LIKE 'id'"));
}

#[test]
fn test_external_columns_query() {
    let query = columns::external_columns_query(None, Some("spectrum"), None, None);
    assert!(query.sql.contains("FROM svv_external_columns"));
    assert!(query.sql.contains("left(external_type, 7) = 'varchar'"));
    assert!(query.sql.contains(" AND TABLE_SCHEM LIKE 'spectrum'"));
}

#[test]
fn test_columns_radix_and_nullability() {
    let local = columns::local_columns_query(None, Some("public"), None, None);
    let universal = columns::universal_columns_query(None, Some("public"), None, None);
    let all = columns::all_databases_columns_query(None, None, None, None);
    let external = columns::external_columns_query(None, Some("spectrum"), None, None);

    // one for the native shape, one for late-binding views
    assert_eq!(local.sql.matches("10 AS NUM_PREC_RADIX").count(), 2);
    for query in [&local, &universal, &all, &external] {
        assert!(!query.sql.contains("THEN 2 ELSE 10"));
        assert!(!query.sql.contains("THEN 2 WHEN"));
        assert!(query.sql.contains("10 AS NUM_PREC_RADIX"));
    }

    assert!(external.sql.contains("NULL AS NULLABLE"));
    assert!(external.sql.contains("NULL AS IS_NULLABLE"));
    assert!(!external.sql.contains("is_nullable"));
    assert!(local.sql.contains("ELSE 0 END AS NULLABLE"));
    assert!(universal.sql.contains("is_nullable AS IS_NULLABLE"));
}

#[test]
fn test_get_columns_external_mode() {
    let mut conn = ScriptedConnection::new()
        .on("svv_external_schemas", external_schema_found(true))
        .on("svv_external_columns", empty_catalog());
    let mut cursor = Cursor::new(&mut conn);
    cursor
        .get_columns(None, Some("spectrum"), None, None)
        .unwrap();
    drop(cursor);
    assert!(conn.statements()[1].contains("FROM svv_external_columns"));
}

// ============================================================================
// Schemas, catalogs, procedures and keys
// ============================================================================

#[test]
fn test_schemas_query_modes() {
    let query = schemas::schemas_query(true, None, Some("pub%"));
    assert!(query.sql.contains("FROM pg_catalog.pg_namespace"));
    assert!(query.sql.contains(" AND nspname LIKE ?"));
    assert!(query.sql.ends_with(" ORDER BY TABLE_SCHEM"));

    let query = schemas::schemas_query(false, Some("dev"), None);
    assert!(query.sql.contains("FROM PG_CATALOG.SVV_ALL_SCHEMAS WHERE TRUE AND database_name = 'dev'"));
    assert!(query.sql.ends_with(" ORDER BY TABLE_CATALOG, TABLE_SCHEM"));
    assert!(query.args.is_empty());
}

#[test]
fn test_catalogs_query_modes() {
    assert_eq!(
        schemas::catalogs_query(true).sql,
        "select current_database as TABLE_CAT FROM current_database() ORDER BY TABLE_CAT"
    );
    assert!(schemas::catalogs_query(false)
        .sql
        .contains("PG_CATALOG.SVV_REDSHIFT_DATABASES"));
}

#[test]
fn test_get_catalogs_returns_rows() {
    let mut conn = ScriptedConnection::new().on(
        "current_database()",
        StatementResult::query(
            vec![ColumnDescription::new("table_cat", VARCHAR_OID)],
            vec![vec![Value::from("dev")]],
        ),
    );
    let mut cursor = Cursor::new(&mut conn);
    assert_eq!(cursor.get_catalogs().unwrap(), vec![vec![Value::from("dev")]]);
}

#[test]
fn test_procedures_query() {
    let query = procedures::procedures_query(None, None, Some("my_%"));
    assert!(query.sql.contains(" and pg_function_is_visible(p.prooid)"));
    assert!(query.sql.contains(" AND p.proname LIKE ?"));
    assert_eq!(query.args, vec![Value::from("my_%")]);

    let query = procedures::procedures_query(Some("dev"), Some("public"), None);
    assert!(!query.sql.contains("pg_function_is_visible"));
    assert!(query.sql.contains(" AND current_database() = 'dev'"));
    assert!(query.sql.contains(" AND n.nspname LIKE ?"));
}

#[test]
fn test_primary_keys_query() {
    let query = keys::primary_keys_query(Some("public"), Some("orders"));
    assert!(query.sql.contains("i.indisprimary"));
    assert!(!query.sql.contains("current_database() ="));
    assert!(query.sql.ends_with(" AND n.nspname = ? AND ct.relname = ? ORDER BY table_name, pk_name, key_seq"));
    assert_eq!(query.args, vec![Value::from("public"), Value::from("orders")]);

    let query = keys::primary_keys_query(Some("pub'lic"), None);
    assert_eq!(query.args, vec![Value::from("public")]);
}

#[test]
fn test_get_primary_keys_ignores_catalog() {
    let mut conn = ScriptedConnection::new().on("indisprimary", empty_catalog());
    let mut cursor = Cursor::new(&mut conn);
    cursor
        .get_primary_keys(Some("other_db"), Some("public"), Some("orders"))
        .unwrap();
    drop(cursor);
    assert!(!conn.statements()[0].contains("other_db"));
}

#[test]
fn test_relation_key() {
    let key = RelationKey::new("\"Orders\"", Some("\"Sales\""));
    assert_eq!(key.to_string(), "\"Sales\".\"Orders\"");
    assert_eq!(key.unquoted(), RelationKey::new("Orders", Some("Sales")));
    assert_eq!(RelationKey::new("t", None).to_string(), "t");
    assert_eq!(RelationKey::new("\"", None).unquoted().name, "\"");
}

// ============================================================================
// Constraints
// ============================================================================

fn constraint_row(
    table: &str,
    contype: &str,
    conname: &str,
    conkey: &str,
    attnum: i64,
    attname: &str,
    condef: &str,
) -> Row {
    vec![
        Value::from("public"),
        Value::from(table),
        Value::from(contype),
        Value::from(conname),
        Value::from(conkey),
        Value::Int(attnum),
        Value::from(attname),
        Value::from(condef),
    ]
}

fn constraints(rows: Vec<Row>) -> StatementResult {
    let columns = [
        "schema", "table_name", "contype", "conname", "conkey", "attnum", "attname", "condef",
    ];
    StatementResult::query(
        columns
            .iter()
            .map(|c| ColumnDescription::new(*c, VARCHAR_OID))
            .collect(),
        rows,
    )
}

#[test]
fn test_parse_foreign_key() {
    let fk = parse_foreign_key(
        "orders_customer_fk",
        "FOREIGN KEY (customer_id, \"Region\") REFERENCES sales.customers(id, region)",
    )
    .unwrap();
    assert_eq!(fk.constrained_columns, vec!["customer_id", "\"Region\""]);
    assert_eq!(fk.referred_schema.as_deref(), Some("sales"));
    assert_eq!(fk.referred_table, "customers");
    assert_eq!(fk.referred_columns, vec!["id", "region"]);

    assert!(parse_foreign_key("pk", "PRIMARY KEY (id)").is_none());
}

#[test_case("FOREIGN KEY (a) REFERENCES other(b)", None, "other" ; "unquoted")]
#[test_case("FOREIGN KEY (a) REFERENCES \"Other\"(b)", None, "\"Other\"" ; "quoted table")]
#[test_case("FOREIGN KEY (a) REFERENCES \"My Schema\".\"Other\"(b)", Some("\"My Schema\""), "\"Other\"" ; "quoted schema and table")]
fn test_parse_foreign_key_keeps_quotes(condef: &str, schema: Option<&str>, table: &str) {
    let fk = parse_foreign_key("fk", condef).unwrap();
    assert_eq!(fk.referred_schema.as_deref(), schema);
    assert_eq!(fk.referred_table, table);
}

#[test]
fn test_parse_primary_key() {
    assert_eq!(
        parse_primary_key("PRIMARY KEY (id, \"Region\")").unwrap(),
        vec!["id", "\"Region\""]
    );
    assert!(parse_primary_key("UNIQUE (id)").is_none());
}

#[test_case("CHECK (((a > 1) AND (a < 5)))", "(a > 1) AND (a < 5)", false ; "nested parens")]
#[test_case("CHECK (((a > 1) AND (a < 5))) NOT VALID", "(a > 1) AND (a < 5)", true ; "not valid")]
#[test_case("CHECK (some_boolean_function(a))", "some_boolean_function(a)", false ; "function call")]
#[test_case("CHECK (((a\n < 1)\n OR\n (a\n >= 5))\n)", "(a\n < 1)\n OR\n (a\n >= 5)", false ; "multi line")]
#[test_case("UNIQUE (a)", "", false ; "unparsable")]
fn test_parse_check_constraint(src: &str, sqltext: &str, not_valid: bool) {
    let check = parse_check_constraint("ck", src);
    assert_eq!(check.name, "ck");
    assert_eq!(check.sqltext, sqltext);
    assert_eq!(check.not_valid, not_valid);
}

#[test]
fn test_constraints_query_includes_external_pkey() {
    let query = keys::constraints_query("spectrum", "events");
    assert!(query.sql.contains("a.attnum = ANY(t.conkey)"));
    assert!(query.sql.contains(" UNION "));
    assert!(query.sql.contains("c.tablename || '_pkey' AS conname"));
    assert!(query.sql.contains("'PRIMARY KEY (' || c.columnname || ')'"));
    assert!(query.sql.ends_with(" ORDER BY schema, table_name"));
    assert_eq!(
        query.args,
        vec![
            Value::from("spectrum"),
            Value::from("events"),
            Value::from("spectrum"),
            Value::from("events"),
        ]
    );
}

#[test]
fn test_get_foreign_keys() {
    let fk = "FOREIGN KEY (customer_id) REFERENCES customers(id)";
    let rows = vec![
        constraint_row("orders", "f", "orders_customer_fk", "2", 2, "customer_id", fk),
        // one row per constrained column; duplicates collapse by name
        constraint_row("orders", "f", "orders_customer_fk", "2", 2, "customer_id", fk),
        constraint_row("orders", "p", "orders_pkey", "1", 1, "id", "PRIMARY KEY (id)"),
    ];
    let mut conn = ScriptedConnection::new().on("pg_constraint", constraints(rows));
    let mut cursor = Cursor::new(&mut conn);
    let fks = cursor.get_foreign_keys(None, "\"orders\"").unwrap();
    assert_eq!(fks.len(), 1);
    assert_eq!(fks[0].name, "orders_customer_fk");
    assert_eq!(fks[0].referred_table, "customers");
    drop(cursor);

    assert_eq!(
        conn.executed()[0].args[..2].to_vec(),
        vec![Value::from("public"), Value::from("orders")]
    );
}

#[test]
fn test_get_pk_constraint() {
    let rows = vec![
        constraint_row("orders", "p", "orders_pkey", "1,2", 1, "id", "PRIMARY KEY (id, region)"),
        constraint_row("orders", "p", "orders_pkey", "1,2", 2, "region", "PRIMARY KEY (id, region)"),
    ];
    let mut conn = ScriptedConnection::new().on("pg_constraint", constraints(rows));
    let mut cursor = Cursor::new(&mut conn);

    let pk = cursor.get_pk_constraint(Some("public"), "orders").unwrap();
    assert_eq!(pk.name, "orders_pkey");
    assert_eq!(pk.constrained_columns, vec!["id", "region"]);
}

#[test]
fn test_get_pk_constraint_missing() {
    let mut conn = ScriptedConnection::new().on("pg_constraint", constraints(vec![]));
    let mut cursor = Cursor::new(&mut conn);
    assert_eq!(
        cursor.get_pk_constraint(None, "orders").unwrap(),
        PrimaryKeyConstraint::default()
    );
}

#[test]
fn test_get_pk_constraint_external_table() {
    let rows = vec![
        vec![
            Value::from("spectrum"),
            Value::from("events"),
            Value::from("p"),
            Value::from("events_pkey"),
            Value::from("1"),
            Value::Int(1),
            Value::from("event_id"),
            Value::from("PRIMARY KEY (event_id)"),
        ],
        vec![
            Value::from("spectrum"),
            Value::from("events"),
            Value::from("p"),
            Value::from("events_pkey"),
            Value::from("1"),
            Value::Int(1),
            Value::from("payload"),
            Value::from("PRIMARY KEY (payload)"),
        ],
    ];
    let mut conn = ScriptedConnection::new().on("svv_external_columns", constraints(rows));
    let mut cursor = Cursor::new(&mut conn);
    let pk = cursor.get_pk_constraint(Some("spectrum"), "events").unwrap();
    assert_eq!(pk.name, "events_pkey");
    assert_eq!(pk.constrained_columns, vec!["event_id"]);
}

#[test]
fn test_get_unique_constraints_key_order() {
    // key declared as (region, id) while attnums ascend
    let rows = vec![
        constraint_row("orders", "u", "orders_region_id_key", "3,1", 1, "id", "UNIQUE (region, id)"),
        constraint_row("orders", "u", "orders_region_id_key", "3,1", 3, "region", "UNIQUE (region, id)"),
        constraint_row("orders", "u", "orders_code_key", "{4}", 4, "code", "UNIQUE (code)"),
        constraint_row("orders", "p", "orders_pkey", "1", 1, "id", "PRIMARY KEY (id)"),
    ];
    let mut conn = ScriptedConnection::new().on("pg_constraint", constraints(rows));
    let mut cursor = Cursor::new(&mut conn);
    let uniques = cursor.get_unique_constraints(None, "orders").unwrap();
    assert_eq!(
        uniques,
        vec![
            UniqueConstraint {
                name: "orders_region_id_key".into(),
                column_names: vec!["region".into(), "id".into()],
            },
            UniqueConstraint {
                name: "orders_code_key".into(),
                column_names: vec!["code".into()],
            },
        ]
    );
}

#[test]
fn test_get_check_constraints() {
    let result = StatementResult::query(
        vec![
            ColumnDescription::new("name", VARCHAR_OID),
            ColumnDescription::new("src", VARCHAR_OID),
        ],
        vec![vec![Value::from("qty_positive"), Value::from("CHECK ((qty > 0))")]],
    );
    let mut conn = ScriptedConnection::new().on("cons.contype = 'c'", result);
    let mut cursor = Cursor::new(&mut conn);
    let checks = cursor.get_check_constraints(None, "\"orders\"").unwrap();
    assert_eq!(checks.len(), 1);
    assert_eq!(checks[0].sqltext, "qty > 0");
    drop(cursor);
    assert_eq!(conn.executed()[0].args, vec![Value::from("public"), Value::from("orders")]);
}

// ============================================================================
// Relations
// ============================================================================

fn relation_row(relkind: &str, schema: &str, name: &str, diststyle: Option<&str>, viewdef: Option<&str>) -> Row {
    vec![
        Value::from(relkind),
        Value::from(schema),
        Value::from(name),
        Value::from(diststyle),
        Value::from("admin"),
        Value::from(viewdef),
    ]
}

fn relations(rows: Vec<Row>) -> StatementResult {
    let columns = ["relkind", "schema", "relname", "diststyle", "owner_name", "view_definition"];
    StatementResult::query(
        columns
            .iter()
            .map(|c| ColumnDescription::new(*c, VARCHAR_OID))
            .collect(),
        rows,
    )
}

#[test]
fn test_relations_query_filters_both_sources() {
    let query = relations::relations_query(Some("public"), Some("orders"));
    assert!(query.sql.contains("c.relkind IN ('r', 'v', 'm', 'S', 'f')"));
    assert!(query.sql.contains(" AND n.nspname = ? AND c.relname = ? UNION "));
    assert!(query.sql.contains("FROM svv_external_tables t"));
    assert!(query.sql.contains(" AND s.schemaname = ? AND t.tablename = ?"));
    assert_eq!(query.args.len(), 4);

    let query = relations::relations_query(Some("public"), None);
    assert!(!query.sql.contains("c.relname = ?"));
    assert_eq!(query.args, vec![Value::from("public"), Value::from("public")]);
}

#[test]
fn test_has_table() {
    let mut conn = ScriptedConnection::new()
        .on("svv_external_tables", relations(vec![relation_row("r", "public", "orders", Some("KEY"), None)]));
    let mut cursor = Cursor::new(&mut conn);
    assert!(cursor.has_table(None, "\"orders\"").unwrap());
    drop(cursor);
    assert_eq!(
        conn.executed()[0].args,
        vec![
            Value::from("public"),
            Value::from("orders"),
            Value::from("public"),
            Value::from("orders"),
        ]
    );

    let mut conn = ScriptedConnection::new().on("svv_external_tables", relations(vec![]));
    let mut cursor = Cursor::new(&mut conn);
    assert!(!cursor.has_table(Some("sales"), "missing").unwrap());
}

#[test]
fn test_table_and_view_names() {
    let rows = vec![
        relation_row("r", "public", "orders", Some("EVEN"), None),
        relation_row("r", "public", "customers", Some("ALL"), None),
        relation_row("v", "public", "recent_orders", None, Some("SELECT * FROM orders")),
        relation_row("S", "public", "order_seq", None, None),
    ];
    let mut conn = ScriptedConnection::new().on("svv_external_tables", relations(rows));
    let mut cursor = Cursor::new(&mut conn);
    assert_eq!(cursor.get_table_names(None).unwrap(), vec!["customers", "orders"]);
    assert_eq!(cursor.get_view_names(Some("public")).unwrap(), vec!["recent_orders"]);
}

#[test]
fn test_get_view_definition() {
    let rows = vec![relation_row("v", "public", "recent_orders", None, Some("SELECT id FROM orders"))];
    let mut conn = ScriptedConnection::new().on("svv_external_tables", relations(rows));
    let mut cursor = Cursor::new(&mut conn);
    assert_eq!(
        cursor.get_view_definition(None, "recent_orders").unwrap().as_deref(),
        Some("SELECT id FROM orders")
    );
}

#[test]
fn test_get_view_definition_unknown_relation() {
    let mut conn = ScriptedConnection::new().on("svv_external_tables", relations(vec![]));
    let mut cursor = Cursor::new(&mut conn);
    let err = cursor.get_view_definition(Some("sales"), "nope").unwrap_err();
    assert!(err.is_programming());
    assert!(err.to_string().contains("sales.nope"));
}

fn column_options(rows: Vec<(&str, bool, i64)>) -> StatementResult {
    let columns = ["schema", "table_name", "name", "distkey", "sortkey", "attnum"];
    StatementResult::query(
        columns
            .iter()
            .map(|c| ColumnDescription::new(*c, VARCHAR_OID))
            .collect(),
        rows.into_iter()
            .enumerate()
            .map(|(i, (name, distkey, sortkey))| {
                vec![
                    Value::from("public"),
                    Value::from("orders"),
                    Value::from(name),
                    Value::Bool(distkey),
                    Value::Int(sortkey),
                    Value::Int(i as i64 + 1),
                ]
            })
            .collect(),
    )
}

#[test]
fn test_get_table_options_compound() {
    let mut conn = ScriptedConnection::new()
        .on("svv_external_tables", relations(vec![relation_row("r", "public", "orders", Some("KEY"), None)]))
        .on(
            "attsortkeyord",
            column_options(vec![("id", false, 2), ("customer_id", true, 0), ("created_at", false, 1)]),
        );
    let mut cursor = Cursor::new(&mut conn);
    let options = cursor.get_table_options(None, "orders").unwrap();
    assert_eq!(
        options,
        TableOptions {
            diststyle: Some("KEY".into()),
            distkey: Some("customer_id".into()),
            sortkey: Some(vec!["created_at".into(), "id".into()]),
            interleaved_sortkey: None,
        }
    );
}

#[test]
fn test_get_table_options_interleaved() {
    let mut conn = ScriptedConnection::new()
        .on("svv_external_tables", relations(vec![relation_row("r", "public", "orders", Some("EVEN"), None)]))
        .on("attsortkeyord", column_options(vec![("a", false, 1), ("b", false, -2), ("c", false, 0)]));
    let mut cursor = Cursor::new(&mut conn);
    let options = cursor.get_table_options(None, "orders").unwrap();
    assert_eq!(options.distkey, None);
    assert_eq!(options.sortkey, None);
    assert_eq!(options.interleaved_sortkey, Some(vec!["a".into(), "b".into()]));
}
