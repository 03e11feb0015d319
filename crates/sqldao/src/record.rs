//! Record mapping.
//!
//! A record is a plain struct with a static column table. `#[derive(Record)]` generates
//! the table together with [`FromRecord`] and [`Record`]; the helpers here use the table
//! to build insert and update column maps.
//!
//! ```ignore
//! use sqldao::Record;
//!
//! #[derive(Debug, Record)]
//! struct User {
//!     #[dao(id, column = "user_id")]
//!     id: i64,
//!     #[dao(column = "user_name")]
//!     name: String,
//!     email: Option<String>,
//! }
//! ```

use crate::error::{DaoError, DaoResult};
use crate::rows::{OrderedMap, RowMap};
use crate::value::Value;

/// One mapped field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMeta {
    /// Rust field name.
    pub field: &'static str,
    /// Column name used in SQL and matched (case-insensitively) against result columns.
    pub column: &'static str,
    /// Whether the field is part of the record's key.
    pub id: bool,
}

/// Static column table of a record type.
#[derive(Debug, Clone, Copy)]
pub struct RecordMeta {
    pub fields: &'static [FieldMeta],
}

impl RecordMeta {
    pub fn id_fields(&self) -> impl Iterator<Item = &'static FieldMeta> {
        self.fields.iter().filter(|f| f.id)
    }

    pub fn column(&self, field: &str) -> Option<&'static str> {
        self.fields
            .iter()
            .find(|f| f.field == field)
            .map(|f| f.column)
    }
}

/// Construct a value from a [`RowMap`].
pub trait FromRecord: Sized {
    fn from_record(row: &RowMap) -> DaoResult<Self>;
}

impl FromRecord for RowMap {
    fn from_record(row: &RowMap) -> DaoResult<Self> {
        Ok(row.clone())
    }
}

/// A type with a static column table whose field values can be read out.
pub trait Record {
    const META: RecordMeta;

    /// Every mapped column with the field's current value, in declaration order.
    fn column_values(&self) -> Vec<(&'static str, Value)>;
}

/// Column name of the single id field of `T`.
pub fn extract_id_name<T: Record>() -> DaoResult<&'static str> {
    let mut ids = T::META.id_fields();
    match (ids.next(), ids.next()) {
        (Some(id), None) => Ok(id.column),
        _ => Err(DaoError::mapping("improper id annotation")),
    }
}

/// Id columns of `record` with their values.
///
/// Fails whenever the type declares one or more id fields, so the only successful
/// result is an empty map for a record without ids.
// FIXME: this guard is the inverse of `extract_id_name`, so `Dao::update_record` fails
// for every keyed record type.
pub fn extract_id_kv<T: Record>(record: &T) -> DaoResult<OrderedMap<Value>> {
    if T::META.id_fields().next().is_some() {
        return Err(DaoError::mapping("improper id annotation"));
    }
    let id_columns: Vec<_> = T::META.id_fields().map(|f| f.column).collect();
    Ok(record
        .column_values()
        .into_iter()
        .filter(|(column, _)| id_columns.contains(column))
        .collect())
}

/// Mapped columns of `record`, optionally leaving out id fields.
pub fn extract_columns<T: Record>(record: &T, include_id: bool) -> OrderedMap<Value> {
    let ids: Vec<_> = T::META.id_fields().map(|f| f.column).collect();
    record
        .column_values()
        .into_iter()
        .filter(|(column, _)| include_id || !ids.contains(column))
        .collect()
}

/// [`extract_columns`] for every record in `records`.
pub fn extract_columns_list<T: Record>(records: &[T], include_id: bool) -> Vec<OrderedMap<Value>> {
    records
        .iter()
        .map(|record| extract_columns(record, include_id))
        .collect()
}
