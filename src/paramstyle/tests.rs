//! Tests for paramstyle conversion

use super::*;
use pretty_assertions::assert_eq;
use test_case::test_case;

// ============================================================================
// Paramstyle parsing
// ============================================================================

#[test_case("qmark", Paramstyle::Qmark)]
#[test_case("numeric", Paramstyle::Numeric)]
#[test_case("named", Paramstyle::Named)]
#[test_case("format", Paramstyle::Format)]
#[test_case("pyformat", Paramstyle::Pyformat)]
fn test_paramstyle_from_str(input: &str, expected: Paramstyle) {
    let parsed: Paramstyle = input.parse().unwrap();
    assert_eq!(parsed, expected);
    assert_eq!(parsed.to_string(), input);
}

#[test_case("QMARK")]
#[test_case("dollar")]
#[test_case("")]
fn test_paramstyle_rejects_unknown(input: &str) {
    let err = input.parse::<Paramstyle>().unwrap_err();
    assert!(err.is_interface());
}

#[test]
fn test_paramstyle_default_is_format() {
    assert_eq!(Paramstyle::default(), Paramstyle::Format);
}

#[test]
fn test_paramstyle_serde_lowercase() {
    let style: Paramstyle = serde_yaml::from_str("named").unwrap();
    assert_eq!(style, Paramstyle::Named);
    assert_eq!(serde_json::to_string(&Paramstyle::Qmark).unwrap(), "\"qmark\"");
}

// ============================================================================
// Rewriting
// ============================================================================

#[test_case(Paramstyle::Qmark, "select * from t where a = ? and b = ?", "select * from t where a = $1 and b = $2")]
#[test_case(Paramstyle::Numeric, "select * from t where a = :1 and b = :2", "select * from t where a = $1 and b = $2")]
#[test_case(Paramstyle::Named, "select * from t where a = :a and b = :b", "select * from t where a = $1 and b = $2")]
#[test_case(Paramstyle::Format, "select * from t where a = %s and b = %s", "select * from t where a = $1 and b = $2")]
#[test_case(Paramstyle::Pyformat, "select * from t where a = %(a)s and b = %(b)s", "select * from t where a = $1 and b = $2")]
fn test_convert_basic(style: Paramstyle, query: &str, expected: &str) {
    let converted = convert_paramstyle(style, query).unwrap();
    assert_eq!(converted.sql, expected);
}

#[test_case(Paramstyle::Qmark, "select '?' , \"?\" -- ?\n, ?", "select '?' , \"?\" -- ?\n, $1")]
#[test_case(Paramstyle::Format, "select '%s', /* %s */ %s", "select '%s', /* %s */ $1")]
#[test_case(Paramstyle::Named, "select ':a', \":a\", :a", "select ':a', \":a\", $1")]
#[test_case(Paramstyle::Qmark, "select 'it''s ?', ?", "select 'it''s ?', $1")]
#[test_case(Paramstyle::Qmark, "select E'\\'?', ?", "select E'\\'?', $1")]
fn test_convert_skips_literals_and_comments(style: Paramstyle, query: &str, expected: &str) {
    let converted = convert_paramstyle(style, query).unwrap();
    assert_eq!(converted.sql, expected);
}

#[test_case(Paramstyle::Numeric, "select sum(x)::float, :1", "select sum(x)::float, $1")]
#[test_case(Paramstyle::Named, "select x::int from t where a = :a", "select x::int from t where a = $1")]
#[test_case(Paramstyle::Named, "select a := 1", "select a := 1")]
fn test_convert_preserves_casts(style: Paramstyle, query: &str, expected: &str) {
    let converted = convert_paramstyle(style, query).unwrap();
    assert_eq!(converted.sql, expected);
}

#[test]
fn test_convert_trailing_colon_is_literal() {
    let converted = convert_paramstyle(Paramstyle::Named, "select 1:").unwrap();
    assert_eq!(converted.sql, "select 1:");
    assert_eq!(converted.placeholders(), Some(&[][..]));
}

#[test]
fn test_convert_named_reuses_index() {
    let converted =
        convert_paramstyle(Paramstyle::Named, "select :a, :b, :a, :c_1").unwrap();
    assert_eq!(converted.sql, "select $1, $2, $1, $3");
    assert_eq!(
        converted.placeholders().unwrap(),
        &["a".to_string(), "b".to_string(), "c_1".to_string()]
    );
}

#[test]
fn test_convert_pyformat_reuses_index() {
    let converted =
        convert_paramstyle(Paramstyle::Pyformat, "select %(x)s, %(y)s, %(x)s").unwrap();
    assert_eq!(converted.sql, "select $1, $2, $1");
    assert_eq!(
        converted.placeholders().unwrap(),
        &["x".to_string(), "y".to_string()]
    );
}

#[test]
fn test_convert_format_percent_escape() {
    let converted =
        convert_paramstyle(Paramstyle::Format, "select * from t where a like 'x%' and b like %s || '%%' and c = 10%%").unwrap();
    assert_eq!(
        converted.sql,
        "select * from t where a like 'x%' and b like $1 || '%%' and c = 10%"
    );
}

#[test]
fn test_convert_format_rejects_other_directives() {
    let err = convert_paramstyle(Paramstyle::Format, "select %d").unwrap_err();
    assert!(err.is_interface());
    assert_eq!(
        err.to_string(),
        "Interface error: Only %s and %% are supported in the query."
    );
}

#[test]
fn test_convert_pyformat_switches_to_format() {
    let converted = convert_paramstyle(Paramstyle::Pyformat, "select %s, %s").unwrap();
    assert_eq!(converted.sql, "select $1, $2");
    assert_eq!(converted.placeholders(), None);

    let args = converted
        .make_args(&Params::positional([1, 2]))
        .unwrap();
    assert_eq!(args, vec![Value::Int(1), Value::Int(2)]);
}

#[test]
fn test_convert_is_stateless_between_calls() {
    let first = convert_paramstyle(Paramstyle::Qmark, "select ?, ?").unwrap();
    let second = convert_paramstyle(Paramstyle::Qmark, "select ?").unwrap();
    assert_eq!(first.sql, "select $1, $2");
    assert_eq!(second.sql, "select $1");
}

#[test]
fn test_convert_unicode_text() {
    let converted = convert_paramstyle(Paramstyle::Qmark, "select 'héllo', ?").unwrap();
    assert_eq!(converted.sql, "select 'héllo', $1");
}

// ============================================================================
// Argument mapping
// ============================================================================

#[test]
fn test_make_args_positional_passthrough() {
    let converted = convert_paramstyle(Paramstyle::Qmark, "select ?, ?").unwrap();
    let args = converted.make_args(&Params::positional(["a", "b"])).unwrap();
    assert_eq!(args, vec![Value::from("a"), Value::from("b")]);

    let args = converted.make_args(&Params::None).unwrap();
    assert!(args.is_empty());
}

#[test]
fn test_make_args_named_in_placeholder_order() {
    let converted =
        convert_paramstyle(Paramstyle::Named, "select :b, :a, :b").unwrap();
    let args = converted
        .make_args(&Params::named([("a", 1), ("b", 2)]))
        .unwrap();
    assert_eq!(args, vec![Value::Int(2), Value::Int(1)]);
}

#[test]
fn test_make_args_missing_name() {
    let converted = convert_paramstyle(Paramstyle::Named, "select :a, :b").unwrap();
    let err = converted
        .make_args(&Params::named([("a", 1)]))
        .unwrap_err();
    assert!(err.is_programming());
    assert!(err.to_string().contains("'b'"));
}

#[test]
fn test_make_args_sequence_for_named_statement() {
    let converted = convert_paramstyle(Paramstyle::Pyformat, "select %(a)s").unwrap();
    let err = converted.make_args(&Params::positional([1])).unwrap_err();
    assert!(err.is_programming());
}

#[test]
fn test_make_args_mapping_for_positional_statement() {
    let converted = convert_paramstyle(Paramstyle::Format, "select %s").unwrap();
    let err = converted.make_args(&Params::named([("a", 1)])).unwrap_err();
    assert!(err.is_programming());
}

#[test]
fn test_marker_count_matches_args() {
    let query = "insert into t values (:x, :y, :z)";
    let converted = convert_paramstyle(Paramstyle::Named, query).unwrap();
    let markers = converted.sql.matches('$').count();
    let args = converted
        .make_args(&Params::named([("x", 1), ("y", 2), ("z", 3)]))
        .unwrap();
    assert_eq!(markers, args.len());
    assert_eq!(args, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
}
