//! Statement dispatch: resolve arguments, log, execute, shape.

use crate::args::Args;
use crate::dao::DaoConfig;
use crate::error::DaoResult;
use crate::executor::Executor;
use crate::handler::RowHandler;

/// Run a row-returning statement on `conn` and shape the result with `handler`.
pub async fn dispatch_query<E, H>(
    config: &DaoConfig,
    conn: &E,
    handler: &H,
    sql: &str,
    args: Args,
) -> DaoResult<H::Output>
where
    E: Executor + ?Sized,
    H: RowHandler + ?Sized,
{
    let (sql, params) = args.resolve(sql);
    log_statement(config, "query", &sql, params.len());
    let rs = conn.query(&sql, &params).await?;
    handler.handle(rs)
}

/// Run a write statement on `conn` and return the affected row count.
pub async fn dispatch_update<E>(
    config: &DaoConfig,
    conn: &E,
    sql: &str,
    args: Args,
) -> DaoResult<u64>
where
    E: Executor + ?Sized,
{
    let (sql, params) = args.resolve(sql);
    log_statement(config, "update", &sql, params.len());
    conn.execute(&sql, &params).await
}

fn log_statement(config: &DaoConfig, kind: &'static str, sql: &str, param_count: usize) {
    if !config.log_sql {
        return;
    }
    let sql = match config.max_sql_length {
        Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
        _ => sql.to_string(),
    };
    tracing::debug!(
        target: "sqldao.sql",
        kind,
        dialect = %config.dialect,
        param_count,
        sql = %sql,
    );
}

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
