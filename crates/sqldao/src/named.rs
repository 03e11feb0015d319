//! `?{name}` placeholder rewriting.

use std::collections::HashMap;

use crate::value::Value;

/// Variables available to named placeholders.
pub type VariableMap = HashMap<String, Value>;

/// Replace every `?{name}` in `sql` with `?` and append the bound value to `params`.
///
/// Names are looked up as written, then lower-cased, then upper-cased. A name that does
/// not resolve still produces a `?`, bound to the text `{NAME}` so the miss is visible
/// in the statement's parameters. A `?{` with no closing `}` is copied through as-is.
pub fn rewrite_named(sql: &str, params: &mut Vec<Value>, vars: &VariableMap) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut rest = sql;

    while let Some(start) = rest.find("?{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                out.push('?');
                params.push(resolve(name, vars));
                rest = &after[end + 1..];
            }
            None => {
                out.push_str("?{");
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

fn resolve(name: &str, vars: &VariableMap) -> Value {
    let found = vars
        .get(name)
        .or_else(|| vars.get(&name.to_lowercase()))
        .or_else(|| vars.get(&name.to_uppercase()));

    match found {
        Some(value) => value.clone(),
        None => {
            tracing::warn!(target: "sqldao.sql", name, "unresolved named placeholder");
            Value::Text(format!("{{{}}}", name.to_uppercase()))
        }
    }
}
