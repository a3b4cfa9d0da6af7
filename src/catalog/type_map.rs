//! Type name to JDBC type mapping
//!
//! Every reflection query reports `DATA_TYPE`, `COLUMN_SIZE`,
//! `DECIMAL_DIGITS` and friends by switching over a type name in SQL. The
//! tables below are the only copy of that mapping; each catalog source renders
//! its own `CASE` expression from them.

/// Where a query reads its column type from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TypeSource {
    /// `pg_type.typname` with `pg_attribute.atttypmod`
    Native,
    /// `svv_columns` / `svv_all_columns`: `data_type` plus length and precision columns
    Universal,
    /// `pg_get_late_binding_view_cols()`: `columntype` text such as `varchar(256)`
    LateBinding,
    /// `svv_external_columns.external_type`, matched by prefix
    External,
}

// ============================================================================
// Tables
// ============================================================================

/// `(type name, JDBC type code)` in match order
pub const TYPE_CODES: &[(&str, i16)] = &[
    ("text", 12),
    ("bit", -7),
    ("bool", -7),
    ("boolean", -7),
    ("varchar", 12),
    ("character varying", 12),
    ("char", 1),
    ("\"char\"", 1),
    ("character", 1),
    ("nchar", 1),
    ("bpchar", 1),
    ("nvarchar", 12),
    ("date", 91),
    ("timestamp", 93),
    ("timestamp without time zone", 93),
    ("timestamp with time zone", 2014),
    ("smallint", 5),
    ("int2", 5),
    ("integer", 4),
    ("int", 4),
    ("int4", 4),
    ("bigint", -5),
    ("int8", -5),
    ("decimal", 3),
    ("real", 7),
    ("float4", 7),
    ("double precision", 8),
    ("float8", 8),
    ("float", 6),
    ("numeric", 2),
    ("timestamptz", 2014),
    ("bytea", -2),
    ("oid", -5),
    ("name", 12),
    ("ARRAY", 2003),
    ("geometry", -4),
    ("super", -16),
    ("varbyte", -4),
    ("geography", -4),
    ("intervaly2m", 1111),
    ("intervald2s", 1111),
];

/// Code for any name not in the table (`OTHER`)
pub const OTHER_TYPE_CODE: i16 = 1111;

/// Array type names as they appear in `pg_type`
const NATIVE_ARRAY_TYPES: &[(&str, i16)] = &[
    ("_float4", 2003),
    ("_aclitem", 2003),
    ("_text", 2003),
    ("_int4", 2003),
    ("_int2", 2003),
];

/// Spectrum spellings reported by external tables
const EXTERNAL_ALIASES: &[(&str, i16)] = &[
    ("_int2", 5),
    ("_int4", 4),
    ("_float4", 7),
    ("double", 8),
    ("_float8", 8),
];

/// Types declared with a length or precision, e.g. `varchar(256)`
const PARAMETERIZED: &[&str] = &[
    "varchar",
    "character varying",
    "char",
    "character",
    "nchar",
    "bpchar",
    "nvarchar",
    "decimal",
    "numeric",
];

const CHARACTER_TYPES: &[&str] = &[
    "varchar",
    "character varying",
    "char",
    "character",
    "nchar",
    "bpchar",
    "nvarchar",
];

#[derive(Debug, Clone, Copy)]
enum Size {
    Fixed(i32),
    Null,
    CharLength,
    Precision,
}

/// Column size for each type; character and numeric sizes come from the column
const COLUMN_SIZES: &[(&str, Size)] = &[
    ("int4", Size::Fixed(10)),
    ("bit", Size::Fixed(1)),
    ("bool", Size::Fixed(1)),
    ("boolean", Size::Fixed(1)),
    ("varchar", Size::CharLength),
    ("character varying", Size::CharLength),
    ("char", Size::CharLength),
    ("character", Size::CharLength),
    ("nchar", Size::CharLength),
    ("bpchar", Size::CharLength),
    ("nvarchar", Size::CharLength),
    ("date", Size::Fixed(13)),
    ("timestamp", Size::Fixed(29)),
    ("timestamp without time zone", Size::Fixed(29)),
    ("smallint", Size::Fixed(5)),
    ("int2", Size::Fixed(5)),
    ("integer", Size::Fixed(10)),
    ("int", Size::Fixed(10)),
    ("bigint", Size::Fixed(19)),
    ("int8", Size::Fixed(19)),
    ("decimal", Size::Precision),
    ("real", Size::Fixed(8)),
    ("float4", Size::Fixed(8)),
    ("double precision", Size::Fixed(17)),
    ("float8", Size::Fixed(17)),
    ("float", Size::Fixed(17)),
    ("numeric", Size::Precision),
    ("_float4", Size::Fixed(8)),
    ("timestamptz", Size::Fixed(35)),
    ("timestamp with time zone", Size::Fixed(35)),
    ("oid", Size::Fixed(10)),
    ("_int4", Size::Fixed(10)),
    ("_int2", Size::Fixed(5)),
    ("geometry", Size::Null),
    ("super", Size::Null),
    ("varbyte", Size::Null),
    ("geography", Size::Null),
    ("intervaly2m", Size::Fixed(32)),
    ("intervald2s", Size::Fixed(64)),
];

/// Size reported for unbounded or unknown types
pub const UNKNOWN_COLUMN_SIZE: i32 = 2_147_483_647;

#[derive(Debug, Clone, Copy)]
enum Digits {
    Fixed(i32),
    Null,
    Scale,
}

const DECIMAL_DIGITS: &[(&str, Digits)] = &[
    ("real", Digits::Fixed(8)),
    ("float4", Digits::Fixed(8)),
    ("double precision", Digits::Fixed(17)),
    ("float8", Digits::Fixed(17)),
    ("decimal", Digits::Scale),
    ("numeric", Digits::Scale),
    ("timestamp", Digits::Fixed(6)),
    ("timestamp without time zone", Digits::Fixed(6)),
    ("geometry", Digits::Null),
    ("super", Digits::Null),
    ("varbyte", Digits::Null),
    ("geography", Digits::Null),
    ("intervaly2m", Digits::Fixed(32)),
    ("intervald2s", Digits::Fixed(64)),
];

/// Long type names reported as their short `pg_type` spelling; only
/// `information_schema` style sources spell these out
const LOCAL_TYPE_NAME_ALIASES: &[(&str, &str)] = &[
    ("boolean", "bool"),
    ("character varying", "varchar"),
    ("\"char\"", "char"),
    ("smallint", "int2"),
    ("integer", "int4"),
    ("bigint", "int8"),
    ("real", "float4"),
    ("double precision", "float8"),
];

/// Long names shared by local and external sources
const EXTERNAL_TYPE_NAME_ALIASES: &[(&str, &str)] = &[
    ("timestamp without time zone", "timestamp"),
    ("timestamp with time zone", "timestamptz"),
];

// ============================================================================
// Lookups
// ============================================================================

/// JDBC type code for an exact type name
pub fn jdbc_type_code(type_name: &str) -> i16 {
    TYPE_CODES
        .iter()
        .chain(NATIVE_ARRAY_TYPES)
        .find(|(name, _)| *name == type_name)
        .map_or(OTHER_TYPE_CODE, |(_, code)| *code)
}

/// Whether the type carries a length or precision in its declaration
pub fn is_parameterized(type_name: &str) -> bool {
    PARAMETERIZED.contains(&type_name)
}

// ============================================================================
// SQL rendering
// ============================================================================

fn quote(name: &str) -> String {
    format!("'{name}'")
}

/// `WHEN ... THEN` condition for a type name
fn when_name(source: TypeSource, column: &str, name: &str) -> String {
    match source {
        TypeSource::External if is_parameterized(name) => {
            format!(" WHEN left({column}, {}) = {}", name.len(), quote(name))
        }
        TypeSource::External => format!(" WHEN {column} = {}", quote(name)),
        _ => format!(" WHEN {}", quote(name)),
    }
}

/// Opening of the `CASE` expression
fn case_head(source: TypeSource, column: &str) -> String {
    match source {
        TypeSource::External => "CASE".to_string(),
        _ => format!("CASE {column}"),
    }
}

/// Digits following a type name inside its declaration
fn declared_length(column: &str, name: &str) -> String {
    format!("regexp_substr({column}, '[0-9]+', {})::integer", name.len())
}

/// `DATA_TYPE` expression
pub(crate) fn data_type_sql(source: TypeSource) -> String {
    let (switch, extras): (&str, &[(&str, i16)]) = match source {
        TypeSource::Native => ("typname", NATIVE_ARRAY_TYPES),
        TypeSource::Universal => ("regexp_replace(data_type, '^_.+', 'ARRAY')", &[]),
        TypeSource::LateBinding => ("columntype_rep", &[]),
        TypeSource::External => ("external_type", EXTERNAL_ALIASES),
    };

    let mut sql = format!("CAST({}", case_head(source, switch));
    for (name, code) in TYPE_CODES.iter().chain(extras) {
        sql.push_str(&when_name(source, switch, name));
        sql.push_str(&format!(" THEN {code}"));
    }
    sql.push_str(&format!(" ELSE {OTHER_TYPE_CODE} END AS SMALLINT)"));
    sql
}

/// `TYPE_NAME` expression
pub(crate) fn type_name_sql(source: TypeSource) -> String {
    match source {
        TypeSource::Native => "t.typname".to_string(),
        TypeSource::Universal => type_name_case("data_type"),
        TypeSource::LateBinding => type_name_case("columntype"),
        TypeSource::External => {
            let column = "external_type";
            let mut sql = String::from("CASE");
            for (prefix, short) in [
                ("character varying", "varchar"),
                ("varchar", "varchar"),
                ("char", "char"),
                ("decimal", "numeric"),
                ("numeric", "numeric"),
            ] {
                sql.push_str(&format!(
                    " WHEN left({column}, {}) = '{prefix}' THEN '{short}'",
                    prefix.len()
                ));
            }
            sql.push_str(&format!(" WHEN {column} = 'double' THEN 'double precision'"));
            for (long, short) in EXTERNAL_TYPE_NAME_ALIASES {
                sql.push_str(&format!(" WHEN {column} = '{long}' THEN '{short}'"));
            }
            sql.push_str(&format!(" ELSE {column} END"));
            sql
        }
    }
}

fn type_name_case(column: &str) -> String {
    let mut sql = format!("CASE {column}");
    for (long, short) in LOCAL_TYPE_NAME_ALIASES.iter().chain(EXTERNAL_TYPE_NAME_ALIASES) {
        sql.push_str(&format!(" WHEN {} THEN '{short}'", quote(long)));
    }
    sql.push_str(&format!(" ELSE {column} END"));
    sql
}

/// `COLUMN_SIZE` expression
pub(crate) fn column_size_sql(source: TypeSource) -> String {
    let (switch, raw) = match source {
        TypeSource::Native => ("typname", "atttypmod"),
        TypeSource::Universal => ("data_type", "data_type"),
        TypeSource::LateBinding => ("columntype_rep", "columntype"),
        TypeSource::External => ("external_type", "external_type"),
    };

    let mut sql = case_head(source, switch);
    for (name, size) in COLUMN_SIZES {
        let value = match size {
            Size::Fixed(n) => n.to_string(),
            Size::Null => "NULL".to_string(),
            Size::CharLength => match source {
                TypeSource::Native => {
                    "CASE atttypmod WHEN -1 THEN 0 ELSE atttypmod - 4 END".to_string()
                }
                TypeSource::Universal => "character_maximum_length".to_string(),
                _ => declared_length(raw, name),
            },
            Size::Precision => match source {
                TypeSource::Native => "((atttypmod - 4) >> 16) & 65535".to_string(),
                TypeSource::Universal => "numeric_precision".to_string(),
                _ => declared_length(raw, name),
            },
        };
        sql.push_str(&when_name(source, switch, name));
        sql.push_str(&format!(" THEN {value}"));
    }
    if source == TypeSource::External {
        sql.push_str(&format!(" WHEN {switch} = 'double' THEN 17"));
    }
    sql.push_str(&format!(" ELSE {UNKNOWN_COLUMN_SIZE} END"));
    sql
}

/// `DECIMAL_DIGITS` expression
pub(crate) fn decimal_digits_sql(source: TypeSource) -> String {
    let (switch, raw) = match source {
        TypeSource::Native => ("typname", "atttypmod"),
        TypeSource::Universal => ("data_type", "data_type"),
        TypeSource::LateBinding => ("columntype_rep", "columntype"),
        TypeSource::External => ("external_type", "external_type"),
    };

    let mut sql = case_head(source, switch);
    for (name, digits) in DECIMAL_DIGITS {
        let value = match digits {
            Digits::Fixed(n) => n.to_string(),
            Digits::Null => "NULL".to_string(),
            Digits::Scale => match source {
                TypeSource::Native => "(atttypmod - 4) & 65535".to_string(),
                TypeSource::Universal => "numeric_scale".to_string(),
                _ => format!("regexp_substr({raw}, '[0-9]+', charindex(',', {raw}))::integer"),
            },
        };
        sql.push_str(&when_name(source, switch, name));
        sql.push_str(&format!(" THEN {value}"));
    }
    if source == TypeSource::External {
        sql.push_str(&format!(" WHEN {switch} = 'double' THEN 17"));
    }
    sql.push_str(" ELSE 0 END");
    sql
}

/// `CHAR_OCTET_LENGTH` expression
pub(crate) fn char_octet_length_sql(source: TypeSource) -> String {
    match source {
        TypeSource::Native | TypeSource::Universal => column_size_sql(source),
        TypeSource::LateBinding | TypeSource::External => {
            let column = match source {
                TypeSource::LateBinding => "columntype",
                _ => "external_type",
            };
            let mut sql = String::from("CASE");
            for name in CHARACTER_TYPES {
                sql.push_str(&format!(
                    " WHEN left({column}, {}) = {} THEN {}",
                    name.len(),
                    quote(name),
                    declared_length(column, name)
                ));
            }
            sql.push_str(&format!(" WHEN {column} = 'string' THEN 16383 ELSE NULL END"));
            sql
        }
    }
}
