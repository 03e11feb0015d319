//! Result-set consumers.
//!
//! A [`RowHandler`] turns the [`ResultSet`] of one query into the shape the caller asked
//! for. The `Dao::query_for_*` methods each pair a SQL path with one of these.

use std::marker::PhantomData;
use std::sync::OnceLock;

use crate::error::{DaoError, DaoResult};
use crate::executor::ResultSet;
use crate::record::FromRecord;
use crate::rows::{OrderedMap, RowMap};
use crate::value::Value;

/// Shapes a [`ResultSet`] into `Self::Output`.
pub trait RowHandler {
    type Output;

    fn handle(&self, rs: ResultSet) -> DaoResult<Self::Output>;
}

/// Converts raw rows into [`RowMap`]s and records.
#[derive(Debug, Default)]
pub struct RowProcessor {
    _private: (),
}

impl RowProcessor {
    /// The process-wide instance used by the built-in handlers.
    pub fn shared() -> &'static RowProcessor {
        static SHARED: OnceLock<RowProcessor> = OnceLock::new();
        SHARED.get_or_init(RowProcessor::default)
    }

    pub fn to_row_map(&self, columns: &[String], row: Vec<Value>) -> RowMap {
        let mut map = RowMap::with_capacity(columns.len());
        for (column, value) in columns.iter().zip(row) {
            map.insert(column.as_str(), value);
        }
        map
    }

    pub fn to_record<T: FromRecord>(&self, columns: &[String], row: Vec<Value>) -> DaoResult<T> {
        T::from_record(&self.to_row_map(columns, row))
    }
}

/// Every row as a [`RowMap`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MapListHandler;

impl RowHandler for MapListHandler {
    type Output = Vec<RowMap>;

    fn handle(&self, rs: ResultSet) -> DaoResult<Self::Output> {
        let processor = RowProcessor::shared();
        Ok(rs
            .rows
            .into_iter()
            .map(|row| processor.to_row_map(&rs.columns, row))
            .collect())
    }
}

/// The first row as a [`RowMap`], if there is one.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapHandler;

impl RowHandler for MapHandler {
    type Output = Option<RowMap>;

    fn handle(&self, rs: ResultSet) -> DaoResult<Self::Output> {
        let ResultSet { columns, rows } = rs;
        Ok(rows
            .into_iter()
            .next()
            .map(|row| RowProcessor::shared().to_row_map(&columns, row)))
    }
}

/// Every row as a positional value list.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrayListHandler;

impl RowHandler for ArrayListHandler {
    type Output = Vec<Vec<Value>>;

    fn handle(&self, rs: ResultSet) -> DaoResult<Self::Output> {
        Ok(rs.rows)
    }
}

/// One column of every row.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnListHandler {
    pub index: usize,
}

impl ColumnListHandler {
    pub fn new(index: usize) -> Self {
        Self { index }
    }
}

impl RowHandler for ColumnListHandler {
    type Output = Vec<Value>;

    fn handle(&self, rs: ResultSet) -> DaoResult<Self::Output> {
        let index = self.index;
        rs.rows
            .into_iter()
            .map(|row| {
                row.into_iter().nth(index).ok_or_else(|| {
                    DaoError::decode(format!("#{index}"), "column index out of range")
                })
            })
            .collect()
    }
}

/// The first column of the first row. `None` when the query returned no rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalarHandler;

impl RowHandler for ScalarHandler {
    type Output = Option<Value>;

    fn handle(&self, rs: ResultSet) -> DaoResult<Self::Output> {
        Ok(rs.rows.into_iter().next().and_then(|row| row.into_iter().next()))
    }
}

/// Column 0 → column 1, both rendered as text.
///
/// Rows with fewer than two columns are ignored. A repeated key overwrites the earlier
/// value but keeps its original position.
#[derive(Debug, Clone, Copy, Default)]
pub struct KvMapHandler;

impl RowHandler for KvMapHandler {
    type Output = OrderedMap<String>;

    fn handle(&self, rs: ResultSet) -> DaoResult<Self::Output> {
        let mut map = OrderedMap::new();
        for row in rs.rows {
            if let [key, value, ..] = row.as_slice() {
                map.insert(key.to_string(), value.to_string());
            }
        }
        Ok(map)
    }
}

/// Column 0 → every column-1 value seen for that key, in row order.
#[derive(Debug, Clone, Copy, Default)]
pub struct KvListMapHandler;

impl RowHandler for KvListMapHandler {
    type Output = OrderedMap<Vec<String>>;

    fn handle(&self, rs: ResultSet) -> DaoResult<Self::Output> {
        let mut map: OrderedMap<Vec<String>> = OrderedMap::new();
        for row in rs.rows {
            if let [key, value, ..] = row.as_slice() {
                map.get_or_insert_with(key.to_string(), Vec::new)
                    .push(value.to_string());
            }
        }
        Ok(map)
    }
}

/// The first row mapped into `T`.
pub struct RecordHandler<T>(PhantomData<fn() -> T>);

/// Every row mapped into `T`.
pub struct RecordListHandler<T>(PhantomData<fn() -> T>);

/// Every row mapped into `T`, keyed by the text of column 0.
pub struct RecordMapHandler<T>(PhantomData<fn() -> T>);

macro_rules! impl_record_handler_ctor {
    ($($name:ident),*) => {
        $(
            impl<T> $name<T> {
                pub fn new() -> Self {
                    Self(PhantomData)
                }
            }

            impl<T> Default for $name<T> {
                fn default() -> Self {
                    Self::new()
                }
            }

            impl<T> std::fmt::Debug for $name<T> {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    f.debug_tuple(stringify!($name))
                        .field(&std::any::type_name::<T>())
                        .finish()
                }
            }
        )*
    };
}

impl_record_handler_ctor!(RecordHandler, RecordListHandler, RecordMapHandler);

impl<T: FromRecord> RowHandler for RecordHandler<T> {
    type Output = Option<T>;

    fn handle(&self, rs: ResultSet) -> DaoResult<Self::Output> {
        let ResultSet { columns, rows } = rs;
        rows.into_iter()
            .next()
            .map(|row| RowProcessor::shared().to_record(&columns, row))
            .transpose()
    }
}

impl<T: FromRecord> RowHandler for RecordListHandler<T> {
    type Output = Vec<T>;

    fn handle(&self, rs: ResultSet) -> DaoResult<Self::Output> {
        let processor = RowProcessor::shared();
        rs.rows
            .into_iter()
            .map(|row| processor.to_record(&rs.columns, row))
            .collect()
    }
}

impl<T: FromRecord> RowHandler for RecordMapHandler<T> {
    type Output = OrderedMap<T>;

    fn handle(&self, rs: ResultSet) -> DaoResult<Self::Output> {
        let processor = RowProcessor::shared();
        let mut map = OrderedMap::new();
        for row in rs.rows {
            let key = row.first().map(Value::to_string).unwrap_or_default();
            map.insert(key, processor.to_record(&rs.columns, row)?);
        }
        Ok(map)
    }
}
