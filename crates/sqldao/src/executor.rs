//! The query-execution seam.

use std::future::Future;

use crate::error::DaoResult;
use crate::value::Value;

/// The rows returned by a query, already decoded into [`Value`]s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    /// A result with column names but no rows.
    pub fn empty<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Builder-style row append, mostly useful for tests and fixtures.
    pub fn with_row<I, V>(mut self, row: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.rows.push(row.into_iter().map(Into::into).collect());
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Case-insensitive column position lookup.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
    }
}

/// Something that can run SQL with positional `?` parameters.
///
/// Implemented for `tokio_postgres` clients/transactions and for deadpool pools (see
/// [`crate::postgres`]). Implementors receive SQL that uses `?` markers exclusively and
/// are responsible for translating them to the driver's own syntax.
pub trait Executor: Send + Sync {
    /// Run a statement that returns rows.
    fn query(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = DaoResult<ResultSet>> + Send;

    /// Run a statement and return the number of affected rows.
    fn execute(&self, sql: &str, params: &[Value]) -> impl Future<Output = DaoResult<u64>> + Send;
}

impl<E: Executor + ?Sized> Executor for &E {
    fn query(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = DaoResult<ResultSet>> + Send {
        (**self).query(sql, params)
    }

    fn execute(&self, sql: &str, params: &[Value]) -> impl Future<Output = DaoResult<u64>> + Send {
        (**self).execute(sql, params)
    }
}
