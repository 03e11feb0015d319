//! The `Dao` facade.
//!
//! A [`Dao`] pairs a default [`Executor`] with a [`DaoConfig`]. Every method resolves its
//! [`Args`], dispatches one statement and shapes the result with a [`RowHandler`].
//!
//! # Example
//!
//! ```ignore
//! use sqldao::{Dao, DaoConfig, Dialect, TemplateQuery};
//!
//! let dao = Dao::new(client, DaoConfig::new(Dialect::Postgres));
//!
//! let users = dao.query_for_map_list("SELECT * FROM users WHERE id > ?", (10,)).await?;
//! let open = dao
//!     .query_template_for_map_list(TemplateQuery::new("tickets").filter("status", "!closed"))
//!     .await?;
//!
//! // Run the same operations on a transaction instead of the default connection.
//! let tx = client.transaction().await?;
//! dao.on(&tx).insert("audit", [("action", "export")]).await?;
//! tx.commit().await?;
//! ```

use crate::args::Args;
use crate::dialect::Dialect;
use crate::dispatch::{dispatch_query, dispatch_update};
use crate::error::{DaoError, DaoResult};
use crate::executor::Executor;
use crate::handler::{
    ArrayListHandler, ColumnListHandler, KvListMapHandler, KvMapHandler, MapHandler,
    MapListHandler, RecordHandler, RecordListHandler, RecordMapHandler, RowHandler, ScalarHandler,
};
use crate::predicate::{TemplateQuery, build_set, build_where_equal_values};
use crate::record::{FromRecord, Record, extract_columns, extract_id_kv};
use crate::rows::{OrderedMap, RowMap};
use crate::value::Value;

/// Per-`Dao` settings.
#[derive(Debug, Clone)]
pub struct DaoConfig {
    /// SQL dialect used when rendering LIKE/regex operators and dialect-only statements.
    pub dialect: Dialect,
    /// Reject every write statement with a configuration error.
    pub read_only: bool,
    /// Emit a `tracing` debug event (target `sqldao.sql`) for each dispatched statement.
    pub log_sql: bool,
    /// Truncate logged SQL to this many bytes. `None` logs the full statement.
    pub max_sql_length: Option<usize>,
}

impl Default for DaoConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::Ansi,
            read_only: false,
            log_sql: true,
            max_sql_length: Some(200),
        }
    }
}

impl DaoConfig {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            ..Self::default()
        }
    }

    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn log_sql(mut self, enabled: bool) -> Self {
        self.log_sql = enabled;
        self
    }

    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation in log events.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }
}

/// Data-access facade over an [`Executor`].
#[derive(Debug, Clone)]
pub struct Dao<E> {
    config: DaoConfig,
    conn: E,
}

impl<E: Executor> Dao<E> {
    pub fn new(conn: E, config: DaoConfig) -> Self {
        Self { config, conn }
    }

    pub fn with_dialect(conn: E, dialect: Dialect) -> Self {
        Self::new(conn, DaoConfig::new(dialect))
    }

    pub fn config(&self) -> &DaoConfig {
        &self.config
    }

    pub fn dialect(&self) -> Dialect {
        self.config.dialect
    }

    /// The default executor.
    pub fn executor(&self) -> &E {
        &self.conn
    }

    pub fn into_executor(self) -> E {
        self.conn
    }

    /// A `Dao` with the same configuration that runs on `conn` instead.
    pub fn on<'a, C: Executor>(&self, conn: &'a C) -> Dao<&'a C> {
        Dao {
            config: self.config.clone(),
            conn,
        }
    }

    fn check_read_only(&self) -> DaoResult<()> {
        if self.config.read_only {
            return Err(DaoError::configuration("dao is read-only"));
        }
        Ok(())
    }

    fn require_mysql(&self) -> DaoResult<()> {
        if !self.config.dialect.supports_insert_set() {
            return Err(DaoError::configuration(format!(
                "dialect {} does not support this statement (mysql only)",
                self.config.dialect
            )));
        }
        Ok(())
    }

    // ==================== Raw SQL ====================

    /// Run `sql` and shape the rows with a caller-supplied handler.
    pub async fn query_with<H: RowHandler + Sync>(
        &self,
        handler: &H,
        sql: &str,
        args: impl Into<Args>,
    ) -> DaoResult<H::Output> {
        dispatch_query(&self.config, &self.conn, handler, sql, args.into()).await
    }

    pub async fn query_for_map_list(
        &self,
        sql: &str,
        args: impl Into<Args>,
    ) -> DaoResult<Vec<RowMap>> {
        self.query_with(&MapListHandler, sql, args).await
    }

    pub async fn query_for_map(&self, sql: &str, args: impl Into<Args>) -> DaoResult<Option<RowMap>> {
        self.query_with(&MapHandler, sql, args).await
    }

    pub async fn query_for_array_list(
        &self,
        sql: &str,
        args: impl Into<Args>,
    ) -> DaoResult<Vec<Vec<Value>>> {
        self.query_with(&ArrayListHandler, sql, args).await
    }

    /// The first column of every row.
    pub async fn query_for_column_list(
        &self,
        sql: &str,
        args: impl Into<Args>,
    ) -> DaoResult<Vec<Value>> {
        self.query_with(&ColumnListHandler::default(), sql, args).await
    }

    pub async fn query_for_scalar(&self, sql: &str, args: impl Into<Args>) -> DaoResult<Option<Value>> {
        self.query_with(&ScalarHandler, sql, args).await
    }

    pub async fn query_for_kv_map(
        &self,
        sql: &str,
        args: impl Into<Args>,
    ) -> DaoResult<OrderedMap<String>> {
        self.query_with(&KvMapHandler, sql, args).await
    }

    pub async fn query_for_kv_list_map(
        &self,
        sql: &str,
        args: impl Into<Args>,
    ) -> DaoResult<OrderedMap<Vec<String>>> {
        self.query_with(&KvListMapHandler, sql, args).await
    }

    pub async fn query_for_record<T: FromRecord>(
        &self,
        sql: &str,
        args: impl Into<Args>,
    ) -> DaoResult<Option<T>> {
        self.query_with(&RecordHandler::<T>::new(), sql, args).await
    }

    pub async fn query_for_record_list<T: FromRecord>(
        &self,
        sql: &str,
        args: impl Into<Args>,
    ) -> DaoResult<Vec<T>> {
        self.query_with(&RecordListHandler::<T>::new(), sql, args).await
    }

    /// Records keyed by the text of column 0.
    pub async fn query_for_record_map<T: FromRecord>(
        &self,
        sql: &str,
        args: impl Into<Args>,
    ) -> DaoResult<OrderedMap<T>> {
        self.query_with(&RecordMapHandler::<T>::new(), sql, args).await
    }

    // ==================== Template queries ====================

    /// Build `query` for this dao's dialect and shape the rows with `handler`.
    pub async fn query_template_with<H: RowHandler + Sync>(
        &self,
        handler: &H,
        query: &TemplateQuery,
    ) -> DaoResult<H::Output> {
        let mut params = Vec::new();
        let sql = query.to_sql(self.config.dialect, &mut params);
        self.query_with(handler, &sql, Args::Positional(params)).await
    }

    pub async fn query_template_for_map_list(&self, query: TemplateQuery) -> DaoResult<Vec<RowMap>> {
        self.query_template_with(&MapListHandler, &query).await
    }

    pub async fn query_template_for_map(&self, query: TemplateQuery) -> DaoResult<Option<RowMap>> {
        self.query_template_with(&MapHandler, &query).await
    }

    pub async fn query_template_for_array_list(
        &self,
        query: TemplateQuery,
    ) -> DaoResult<Vec<Vec<Value>>> {
        self.query_template_with(&ArrayListHandler, &query).await
    }

    /// Select only `column` and return it for every matching row.
    pub async fn query_template_for_column_list(
        &self,
        query: TemplateQuery,
        column: &str,
    ) -> DaoResult<Vec<Value>> {
        let query = query.columns([column]);
        self.query_template_with(&ColumnListHandler::default(), &query)
            .await
    }

    /// Select only `column` and return its value from the first matching row.
    pub async fn query_template_for_scalar(
        &self,
        query: TemplateQuery,
        column: &str,
    ) -> DaoResult<Option<Value>> {
        let query = query.columns([column]);
        self.query_template_with(&ScalarHandler, &query).await
    }

    pub async fn query_template_for_kv_map(
        &self,
        query: TemplateQuery,
        key_column: &str,
        value_column: &str,
    ) -> DaoResult<OrderedMap<String>> {
        let query = query.columns([key_column, value_column]);
        self.query_template_with(&KvMapHandler, &query).await
    }

    pub async fn query_template_for_kv_list_map(
        &self,
        query: TemplateQuery,
        key_column: &str,
        value_column: &str,
    ) -> DaoResult<OrderedMap<Vec<String>>> {
        let query = query.columns([key_column, value_column]);
        self.query_template_with(&KvListMapHandler, &query).await
    }

    pub async fn query_template_for_record<T: FromRecord>(
        &self,
        query: TemplateQuery,
    ) -> DaoResult<Option<T>> {
        self.query_template_with(&RecordHandler::<T>::new(), &query)
            .await
    }

    pub async fn query_template_for_record_list<T: FromRecord>(
        &self,
        query: TemplateQuery,
    ) -> DaoResult<Vec<T>> {
        self.query_template_with(&RecordListHandler::<T>::new(), &query)
            .await
    }

    // ==================== Writes ====================

    /// Run a write statement and return the affected row count.
    pub async fn update(&self, sql: &str, args: impl Into<Args>) -> DaoResult<u64> {
        self.check_read_only()?;
        dispatch_update(&self.config, &self.conn, sql, args.into()).await
    }

    /// Same as [`Dao::update`].
    pub async fn execute(&self, sql: &str, args: impl Into<Args>) -> DaoResult<u64> {
        self.update(sql, args).await
    }

    /// `INSERT INTO table ( a,b ) VALUES (?,? )`
    pub async fn insert<I, K, V>(&self, table: &str, cols: I) -> DaoResult<u64>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let cols = collect_columns(cols);
        let mut params = Vec::new();
        let sql = insert_values_sql(table, &cols, &mut params);
        self.update(&sql, Args::Positional(params)).await
    }

    /// [`Dao::insert`] followed by `ON DUPLICATE KEY UPDATE`. MySQL only.
    ///
    /// `update_fields` selects the columns to update on conflict; `None` updates all of them.
    pub async fn insert_upsert<I, K, V>(
        &self,
        table: &str,
        cols: I,
        update_fields: Option<&[&str]>,
    ) -> DaoResult<u64>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.require_mysql()?;
        let cols = collect_columns(cols);
        let mut params = Vec::new();
        let mut sql = insert_values_sql(table, &cols, &mut params);
        sql.push_str(" ON DUPLICATE KEY UPDATE ");
        sql.push_str(&build_set(&mut params, upsert_columns(&cols, update_fields)));
        self.update(&sql, Args::Positional(params)).await
    }

    /// `INSERT INTO table SET a=?, b=?`. MySQL only.
    pub async fn insert_set<I, K, V>(&self, table: &str, cols: I) -> DaoResult<u64>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.insert_set_inner(table, collect_columns(cols), None).await
    }

    /// [`Dao::insert_set`] followed by `ON DUPLICATE KEY UPDATE`. MySQL only.
    pub async fn insert_set_upsert<I, K, V>(
        &self,
        table: &str,
        cols: I,
        update_fields: Option<&[&str]>,
    ) -> DaoResult<u64>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.insert_set_inner(table, collect_columns(cols), Some(update_fields))
            .await
    }

    async fn insert_set_inner(
        &self,
        table: &str,
        cols: OrderedMap<Value>,
        upsert: Option<Option<&[&str]>>,
    ) -> DaoResult<u64> {
        self.require_mysql()?;
        let mut params = Vec::new();
        let mut sql = format!("INSERT INTO {table} SET ");
        sql.push_str(&build_set(
            &mut params,
            cols.iter().map(|(k, v)| (k, v.clone())),
        ));
        if let Some(update_fields) = upsert {
            sql.push_str(" ON DUPLICATE KEY UPDATE ");
            sql.push_str(&build_set(&mut params, upsert_columns(&cols, update_fields)));
        }
        self.update(&sql, Args::Positional(params)).await
    }

    // ==================== Records ====================

    /// Insert every mapped column of `record`, id fields included.
    pub async fn insert_record<T: Record + Sync>(&self, table: &str, record: &T) -> DaoResult<u64> {
        self.insert(table, extract_columns(record, true)).await
    }

    /// Run `sql` with the record's columns available as `?{column}` placeholders.
    pub async fn insert_record_by_sql<T: Record + Sync>(&self, sql: &str, record: &T) -> DaoResult<u64> {
        let vars = extract_columns(record, true).into_iter().collect();
        self.execute(sql, Args::Named(vars)).await
    }

    /// `UPDATE table SET <non-id columns> WHERE <id columns>`.
    pub async fn update_record<T: Record + Sync>(&self, table: &str, record: &T) -> DaoResult<u64> {
        let keys = extract_id_kv(record)?;
        let cols = extract_columns(record, false);

        let mut params = Vec::new();
        let set = build_set(&mut params, cols);
        let predicate = build_where_equal_values(&mut params, keys);
        let sql = format!("UPDATE {table} SET {set} WHERE {predicate}");
        self.update(&sql, Args::Positional(params)).await
    }

    /// [`Dao::update_record`] for each record; returns the summed row count.
    pub async fn update_records<T: Record + Sync>(&self, table: &str, records: &[T]) -> DaoResult<u64> {
        let mut total = 0;
        for record in records {
            total += self.update_record(table, record).await?;
        }
        Ok(total)
    }

    // ==================== Metadata ====================

    /// Column names of `schema.table` from `information_schema`.
    pub async fn query_field_list(&self, schema: &str, table: &str) -> DaoResult<Vec<String>> {
        let sql = match self.config.dialect {
            Dialect::Ansi | Dialect::MySql => {
                "SELECT COLUMN_NAME FROM information_schema.COLUMNS WHERE TABLE_NAME=? AND TABLE_SCHEMA=? ORDER BY ORDINAL_POSITION"
            }
            _ => "SELECT COLUMN_NAME FROM information_schema.COLUMNS WHERE TABLE_NAME=? AND TABLE_SCHEMA=? ",
        };
        let names = self.query_for_column_list(sql, (table, schema)).await?;
        Ok(names.iter().map(Value::to_string).collect())
    }
}

/// Keep only the columns of `row` named in `fields`, in the order of `fields`.
pub fn filter_fields<S: AsRef<str>>(row: &RowMap, fields: &[S]) -> RowMap {
    let mut out = RowMap::with_capacity(fields.len());
    for field in fields {
        let field = field.as_ref();
        if let Some(value) = row.get(field) {
            out.insert(field, value.clone());
        }
    }
    out
}

fn collect_columns<I, K, V>(cols: I) -> OrderedMap<Value>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    cols.into_iter().map(|(k, v)| (k, v.into())).collect()
}

fn insert_values_sql(table: &str, cols: &OrderedMap<Value>, params: &mut Vec<Value>) -> String {
    let names: Vec<&str> = cols.keys().collect();
    let marks = vec!["?"; names.len()].join(",");
    params.extend(cols.values().cloned());
    format!("INSERT INTO {table} ( {} ) VALUES ({marks} ) ", names.join(","))
}

/// Update assignments for an upsert. Fields missing from `cols` are bound as `Null`.
fn upsert_columns<'a>(
    cols: &'a OrderedMap<Value>,
    update_fields: Option<&'a [&'a str]>,
) -> Vec<(&'a str, Value)> {
    match update_fields {
        None => cols.iter().map(|(k, v)| (k, v.clone())).collect(),
        Some(fields) => fields
            .iter()
            .map(|f| (*f, cols.get(f).cloned().unwrap_or(Value::Null)))
            .collect(),
    }
}
