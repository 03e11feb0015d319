use super::*;
use std::collections::BTreeMap;

fn text(values: &[&str]) -> Vec<Value> {
    values.iter().map(|v| Value::from(*v)).collect()
}

#[test]
fn equal_on_unique_key_filter() {
    let mut params = Vec::new();
    let sql = build_where(
        Dialect::Postgres,
        TemplateType::Equal,
        ConstraintType::AllOf,
        &mut params,
        [("status", "open")],
    );
    assert_eq!(sql, "TRUE AND (status = ?)");
    assert_eq!(params, text(&["open"]));
}

#[test]
fn equal_and_not_equal_skip_empty_values() {
    let mut params = Vec::new();
    let sql = build_where_not_equal(&mut params, [("a", "1"), ("b", ""), ("c", "3")]);
    assert_eq!(sql, "TRUE AND (a != ?) AND (c != ?)");
    assert_eq!(params, text(&["1", "3"]));
}

#[test]
fn like_any_of_skips_wildcards() {
    let mut params = Vec::new();
    let sql = build_where(
        Dialect::Ansi,
        TemplateType::Like,
        ConstraintType::AnyOf,
        &mut params,
        [("name", "*"), ("city", "Berlin")],
    );
    assert_eq!(sql, "((city LIKE ?))");
    assert_eq!(params, text(&["Berlin"]));
}

#[test]
fn like_with_nothing_bound_is_true() {
    let mut params = Vec::new();
    let sql = build_where_like(
        Dialect::Postgres,
        ConstraintType::AllOf,
        &mut params,
        [("a", ""), ("b", "%"), ("c", "*")],
    );
    assert_eq!(sql, "TRUE");
    assert!(params.is_empty());
}

#[test]
fn regex_all_of_joins_with_and() {
    let mut params = Vec::new();
    let sql = build_where_regex(
        Dialect::Postgres,
        ConstraintType::AllOf,
        &mut params,
        [("a", "^x"), ("b", ".*"), ("c", "y$")],
    );
    assert_eq!(sql, "((a ~* ?) AND (c ~* ?))");
    assert_eq!(params, text(&["^x", "y$"]));
}

#[test]
fn substring_and_prefix_wrap_the_value() {
    let mut params = Vec::new();
    let sql = build_where_substring(Dialect::Oracle, &mut params, [("name", "ann")]);
    assert_eq!(sql, "TRUE AND (LOWER(name) LIKE ?)");
    let sql = build_where_prefix(Dialect::Ansi, &mut params, [("name", "ann")]);
    assert_eq!(sql, "TRUE AND (name LIKE ?)");
    assert_eq!(params, text(&["%ann%", "ann%"]));
}

#[test]
fn auto_parses_each_spec_in_order() {
    let mut filters = BTreeMap::new();
    filters.insert("name", "^jo");
    filters.insert("status", "!closed");
    filters.insert("tag", "");

    let mut params = Vec::new();
    let sql = build_where_auto(Dialect::Postgres, &mut params, &filters);
    assert_eq!(sql, "TRUE AND (name ILIKE ?) AND (status != ?)");
    assert_eq!(params, text(&["jo%", "closed"]));
}

#[test]
fn params_append_to_existing_list() {
    let mut params = vec![Value::from(7)];
    build_where_equal(&mut params, [("a", "x")]);
    assert_eq!(params, vec![Value::from(7), Value::from("x")]);
}

#[test]
fn template_codes() {
    assert_eq!(TemplateType::from_code(0), TemplateType::Auto);
    assert_eq!(TemplateType::from_code(4), TemplateType::StartsWith);
    assert_eq!(TemplateType::from_code(6), TemplateType::Regex);
    assert_eq!(TemplateType::from_code(99), TemplateType::Like);
    assert_eq!(TemplateType::from_code(-3), TemplateType::Like);
    assert_eq!(TemplateType::default(), TemplateType::Auto);

    assert_eq!(ConstraintType::from_code(1), ConstraintType::AllOf);
    assert_eq!(ConstraintType::from_code(0), ConstraintType::AnyOf);
    assert_eq!(ConstraintType::from_code(5), ConstraintType::AnyOf);
    assert_eq!(ConstraintType::default(), ConstraintType::AllOf);
}

#[test]
fn unknown_code_uses_like_strategy() {
    let mut params = Vec::new();
    let sql = build_where(
        Dialect::MySql,
        TemplateType::from_code(42),
        ConstraintType::from_code(42),
        &mut params,
        [("a", "x"), ("b", "y")],
    );
    assert_eq!(sql, "((a LIKE ?) OR (b LIKE ?))");
}

#[test]
fn equal_values_binds_typed_values() {
    let mut params = Vec::new();
    let sql = build_where_equal_values(&mut params, [("id", Value::from(4)), ("k", Value::Null)]);
    assert_eq!(sql, "TRUE AND (id = ?) AND (k = ?)");
    assert_eq!(params, vec![Value::from(4), Value::Null]);
}

#[test]
fn build_set_renders_assignments() {
    let mut params = Vec::new();
    let sql = build_set(&mut params, [("a", Value::from(1)), ("b", Value::from("z"))]);
    assert_eq!(sql, "a=?, b=?");
    assert_eq!(params, vec![Value::from(1), Value::from("z")]);
}

#[test]
fn template_query_renders_select() {
    let mut params = Vec::new();
    let sql = TemplateQuery::new("users")
        .columns(["id", "name"])
        .filter("status", "open")
        .suffix("ORDER BY id")
        .template(TemplateType::Equal)
        .to_sql(Dialect::Ansi, &mut params);
    assert_eq!(
        sql,
        "SELECT id,name FROM users WHERE TRUE AND (status = ?) ORDER BY id"
    );
    assert_eq!(params, text(&["open"]));
}

#[test]
fn template_query_defaults_to_star_and_auto() {
    let mut params = Vec::new();
    let sql = TemplateQuery::new("t")
        .filters([("a", "+x,y")])
        .to_sql(Dialect::Ansi, &mut params);
    assert_eq!(sql, "SELECT * FROM t WHERE TRUE AND (FALSE OR (a = ?) OR (a = ?))");
    assert_eq!(params.len(), 2);
}

#[test]
fn placeholder_count_matches_params() {
    let filters = [("a", "x"), ("b", "*"), ("c", "+p,-q"), ("d", "")];
    for dialect in Dialect::ALL {
        for code in 0..=6 {
            let mut params = Vec::new();
            let sql = build_where(
                dialect,
                TemplateType::from_code(code),
                ConstraintType::AnyOf,
                &mut params,
                filters,
            );
            assert_eq!(sql.matches('?').count(), params.len(), "{dialect} {code}: {sql}");
        }
    }
}
