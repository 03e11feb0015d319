//! Derive macros for sqldao
//!
//! Provides `#[derive(Record)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod common;
mod record;

/// Derive `Record` and `FromRecord` for a struct.
///
/// # Example
///
/// ```ignore
/// use sqldao::Record;
///
/// #[derive(Record)]
/// struct User {
///     #[dao(id)]
///     id: i64,
///     username: String,
///     #[dao(column = "email_address")]
///     email: Option<String>,
/// }
/// ```
///
/// # Generated
///
/// - `Record::META` - static column table (field, column, id flag) in declaration order
/// - `Record::column_values` - each mapped column with the field's current value
/// - `FromRecord::from_record` - build the struct from a `RowMap`
///
/// # Attributes
///
/// - `#[dao(column = "name")]` - Map field to a different column name
/// - `#[dao(id)]` - Mark field as part of the record key
///
/// Every field type must convert into `sqldao::Value` and implement `sqldao::FromValue`.
/// `Option<T>` fields read as `None` when the column is absent from the row.
#[proc_macro_derive(Record, attributes(dao))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
