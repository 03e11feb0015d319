//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Mutex;

use sqldao::{DaoResult, Executor, ResultSet, Value};

/// One statement as it reached the executor.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub kind: &'static str,
    pub sql: String,
    pub params: Vec<Value>,
}

/// Executor that records every statement and replays a canned result.
#[derive(Debug, Default)]
pub struct Recorder {
    calls: Mutex<Vec<Call>>,
    result: ResultSet,
    affected: u64,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn returning(result: ResultSet) -> Self {
        Self {
            result,
            ..Self::default()
        }
    }

    pub fn affecting(affected: u64) -> Self {
        Self {
            affected,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last(&self) -> Call {
        self.calls().pop().expect("no statement was executed")
    }

    fn record(&self, kind: &'static str, sql: &str, params: &[Value]) {
        self.calls.lock().unwrap().push(Call {
            kind,
            sql: sql.to_string(),
            params: params.to_vec(),
        });
    }
}

impl Executor for Recorder {
    async fn query(&self, sql: &str, params: &[Value]) -> DaoResult<ResultSet> {
        self.record("query", sql, params);
        Ok(self.result.clone())
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> DaoResult<u64> {
        self.record("execute", sql, params);
        Ok(self.affected)
    }
}

pub fn text(values: &[&str]) -> Vec<Value> {
    values.iter().map(|v| Value::from(*v)).collect()
}
