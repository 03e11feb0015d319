//! `Dao` statement building and dispatch against a recording executor.

mod common;

use std::collections::HashMap;

use common::{Recorder, text};
use sqldao::{
    Args, ConstraintType, Dao, DaoConfig, DaoError, Dialect, MapListHandler, ResultSet,
    TemplateQuery, TemplateType, Value, dispatch_query, dispatch_update,
};

fn users() -> ResultSet {
    ResultSet::empty(["id", "name"])
        .with_row([Value::from(1), Value::from("ann")])
        .with_row([Value::from(2), Value::from("bob")])
}

#[tokio::test]
async fn positional_args_are_sent_unchanged() {
    let dao = Dao::with_dialect(Recorder::returning(users()), Dialect::Postgres);
    let rows = dao
        .query_for_map_list("SELECT * FROM users WHERE a = ? AND b = ?", (1, "x"))
        .await
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].get("NAME"), Some(&Value::from("bob")));

    let call = dao.executor().last();
    assert_eq!(call.kind, "query");
    assert_eq!(call.sql, "SELECT * FROM users WHERE a = ? AND b = ?");
    assert_eq!(call.params, vec![Value::from(1), Value::from("x")]);
}

#[tokio::test]
async fn named_args_are_rewritten_before_dispatch() {
    let dao = Dao::with_dialect(Recorder::returning(users()), Dialect::Postgres);
    let vars = HashMap::from([("id", 5)]);
    let first = dao
        .query_for_scalar("SELECT name FROM users WHERE id = ?{id} OR parent = ?{ID}", vars)
        .await
        .unwrap();

    assert_eq!(first, Some(Value::from(1)));
    let call = dao.executor().last();
    assert_eq!(call.sql, "SELECT name FROM users WHERE id = ? OR parent = ?");
    assert_eq!(call.params, vec![Value::from(5), Value::from(5)]);
}

#[tokio::test]
async fn single_row_shapes_report_no_rows_as_none() {
    let dao = Dao::with_dialect(Recorder::returning(ResultSet::empty(["id"])), Dialect::Postgres);
    assert_eq!(dao.query_for_map("SELECT id FROM t", ()).await.unwrap(), None);
    assert_eq!(dao.query_for_scalar("SELECT id FROM t", ()).await.unwrap(), None);
}

#[tokio::test]
async fn single_map_argument_is_treated_as_named() {
    let dao = Dao::with_dialect(Recorder::new(), Dialect::Ansi);
    dao.query_for_map_list("SELECT * FROM t WHERE id=?{id}", HashMap::from([("id", 7)]))
        .await
        .unwrap();

    let call = dao.executor().last();
    assert_eq!(call.sql, "SELECT * FROM t WHERE id=?");
    assert_eq!(call.params, vec![Value::from(7)]);
}

#[tokio::test]
async fn unresolved_named_placeholder_binds_its_name() {
    let dao = Dao::with_dialect(Recorder::new(), Dialect::Ansi);
    let vars: HashMap<String, Value> = HashMap::new();
    dao.query_for_map_list("SELECT * FROM t WHERE a = ?{missing}", vars)
        .await
        .unwrap();
    assert_eq!(dao.executor().last().params, text(&["{MISSING}"]));
}

#[tokio::test]
async fn template_query_uses_the_dao_dialect() {
    let dao = Dao::with_dialect(Recorder::new(), Dialect::Postgres);
    let query = TemplateQuery::new("users")
        .filter("status", "!closed")
        .filter("name", "^jo")
        .suffix("ORDER BY id");
    dao.query_template_for_map_list(query).await.unwrap();

    let call = dao.executor().last();
    assert_eq!(
        call.sql,
        "SELECT * FROM users WHERE TRUE AND (status != ?) AND (name ILIKE ?) ORDER BY id"
    );
    assert_eq!(call.params, text(&["closed", "jo%"]));
}

#[tokio::test]
async fn template_variants_select_their_columns() {
    let dao = Dao::with_dialect(Recorder::new(), Dialect::MySql);
    let query = TemplateQuery::new("users")
        .columns(["ignored"])
        .filters([("name", "a*"), ("city", "*")])
        .template(TemplateType::Like)
        .constraint(ConstraintType::AnyOf);

    dao.query_template_for_kv_map(query.clone(), "id", "name")
        .await
        .unwrap();
    assert_eq!(
        dao.executor().last().sql,
        "SELECT id,name FROM users WHERE ((name LIKE ?))"
    );

    dao.query_template_for_scalar(query, "count(*)").await.unwrap();
    let call = dao.executor().last();
    assert_eq!(call.sql, "SELECT count(*) FROM users WHERE ((name LIKE ?))");
    assert_eq!(call.params, text(&["a*"]));
}

#[tokio::test]
async fn kv_map_last_write_wins() {
    let rs = ResultSet::empty(["k", "v"])
        .with_row(["a", "1"])
        .with_row(["b", "2"])
        .with_row(["a", "3"]);
    let dao = Dao::with_dialect(Recorder::returning(rs), Dialect::Ansi);
    let map = dao.query_for_kv_map("SELECT k, v FROM t", ()).await.unwrap();

    assert_eq!(map.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    assert_eq!(map.get("a").map(String::as_str), Some("3"));
}

#[tokio::test]
async fn insert_renders_column_list() {
    let dao = Dao::with_dialect(Recorder::affecting(1), Dialect::Postgres);
    let n = dao
        .insert("audit", [("action", Value::from("export")), ("actor", Value::from(7))])
        .await
        .unwrap();

    assert_eq!(n, 1);
    let call = dao.executor().last();
    assert_eq!(call.kind, "execute");
    assert_eq!(call.sql, "INSERT INTO audit ( action,actor ) VALUES (?,? ) ");
    assert_eq!(call.params, vec![Value::from("export"), Value::from(7)]);
}

#[tokio::test]
async fn mysql_only_statements_are_rejected_elsewhere() {
    let dao = Dao::with_dialect(Recorder::new(), Dialect::Postgres);

    let err = dao.insert_set("t", [("a", 1)]).await.unwrap_err();
    assert!(err.is_configuration());
    let err = dao.insert_upsert("t", [("a", 1)], None).await.unwrap_err();
    assert!(err.is_configuration());
    let err = dao.insert_set_upsert("t", [("a", 1)], None).await.unwrap_err();
    assert!(err.is_configuration());

    assert!(dao.executor().calls().is_empty());
}

#[tokio::test]
async fn mysql_insert_set_and_upserts() {
    let dao = Dao::with_dialect(Recorder::affecting(2), Dialect::MySql);

    dao.insert_set("t", [("a", 1), ("b", 2)]).await.unwrap();
    let call = dao.executor().last();
    assert_eq!(call.sql, "INSERT INTO t SET a=?, b=?");
    assert_eq!(call.params, vec![Value::from(1), Value::from(2)]);

    dao.insert_set_upsert("t", [("a", 1), ("b", 2)], Some(&["b"][..]))
        .await
        .unwrap();
    let call = dao.executor().last();
    assert_eq!(call.sql, "INSERT INTO t SET a=?, b=? ON DUPLICATE KEY UPDATE b=?");
    assert_eq!(call.params, vec![Value::from(1), Value::from(2), Value::from(2)]);

    dao.insert_upsert("t", [("a", 1), ("b", 2)], None).await.unwrap();
    let call = dao.executor().last();
    assert_eq!(
        call.sql,
        "INSERT INTO t ( a,b ) VALUES (?,? )  ON DUPLICATE KEY UPDATE a=?, b=?"
    );
    assert_eq!(call.params.len(), 4);
}

#[tokio::test]
async fn read_only_dao_rejects_writes() {
    let dao = Dao::new(Recorder::new(), DaoConfig::new(Dialect::MySql).read_only(true));

    assert!(dao.update("DELETE FROM t", ()).await.unwrap_err().is_configuration());
    assert!(dao.insert("t", [("a", 1)]).await.unwrap_err().is_configuration());
    assert!(dao.insert_set("t", [("a", 1)]).await.unwrap_err().is_configuration());

    // Reads still go through.
    dao.query_for_map_list("SELECT 1", ()).await.unwrap();
    assert_eq!(dao.executor().calls().len(), 1);
}

#[tokio::test]
async fn query_field_list_statement_per_dialect() {
    let rs = ResultSet::empty(["COLUMN_NAME"]).with_row(["id"]).with_row(["name"]);

    let dao = Dao::with_dialect(Recorder::returning(rs.clone()), Dialect::MySql);
    let names = dao.query_field_list("app", "users").await.unwrap();
    assert_eq!(names, vec!["id".to_string(), "name".to_string()]);
    let call = dao.executor().last();
    assert!(call.sql.ends_with("TABLE_SCHEMA=? ORDER BY ORDINAL_POSITION"));
    assert_eq!(call.params, text(&["users", "app"]));

    let dao = Dao::with_dialect(Recorder::returning(rs), Dialect::Postgres);
    dao.query_field_list("public", "users").await.unwrap();
    assert!(dao.executor().last().sql.ends_with("TABLE_SCHEMA=? "));
}

#[tokio::test]
async fn on_runs_against_another_executor() {
    let dao = Dao::with_dialect(Recorder::new(), Dialect::Ansi);
    let other = Recorder::affecting(3);

    let n = dao.on(&other).update("UPDATE t SET a = ?", (1,)).await.unwrap();
    assert_eq!(n, 3);
    assert_eq!(other.calls().len(), 1);
    assert!(dao.executor().calls().is_empty());
}

#[tokio::test]
async fn dispatch_functions_work_on_borrowed_executors() {
    let conn = Recorder::returning(users());
    let config = DaoConfig::new(Dialect::Ansi).log_sql(false);

    let rows = dispatch_query(&config, &conn, &MapListHandler, "SELECT * FROM users", Args::None)
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);

    let n = dispatch_update(&config, &&conn, "DELETE FROM users", Args::from((1,)))
        .await
        .unwrap();
    assert_eq!(n, 0);
    assert_eq!(conn.calls().len(), 2);
}

#[tokio::test]
async fn missing_column_surfaces_as_decode_error() {
    let dao = Dao::with_dialect(Recorder::returning(users()), Dialect::Ansi);
    let rows = dao.query_for_map_list("SELECT * FROM users", ()).await.unwrap();
    let err = rows[0].try_get::<String>("email").unwrap_err();
    assert!(matches!(err, DaoError::Decode { ref column, .. } if column == "email"));
}
