//! Filter-spec parsing.
//!
//! A filter spec is a compact per-field search string. The grammar, read left to right:
//!
//! | spec          | SQL                                     | bound        |
//! |---------------|-----------------------------------------|--------------|
//! | *(blank)*     | `TRUE`                                  | nothing      |
//! | `open`        | `(field = ?)`                           | `open`       |
//! | `!open`       | `(field != ?)`                          | `open`       |
//! | `~^a.c$`      | dialect regex                           | `^a.c$`      |
//! | `^foo`        | dialect LIKE                            | `foo%`       |
//! | `f*o`         | dialect LIKE                            | `f%o`        |
//! | `f%o`         | dialect LIKE                            | `f%o`        |
//! | `+a,b;-c`     | `(FALSE OR (a) OR (b) OR (NOT c))`      | one per term |
//! | `!+a,b`       | `(TRUE AND (NOT a) AND (NOT b))`        | one per term |
//!
//! In a list, a `+` item keeps the outer polarity, a `-` item flips it and an unsigned
//! item keeps it. Blank list items contribute neither a branch nor a parameter.
//!
//! Every `?` written to the output is matched by exactly one value pushed onto `params`.

use crate::dialect::Dialect;
use crate::value::Value;

/// Append the boolean fragment for `spec` applied to `field`.
pub fn parse_spec(
    dialect: Dialect,
    out: &mut String,
    params: &mut Vec<Value>,
    field: &str,
    spec: &str,
) {
    if spec.trim().is_empty() {
        out.push_str("TRUE");
        return;
    }

    let (invert, rest) = match spec.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, spec),
    };

    if rest.starts_with('+') || rest.starts_with('-') {
        let (seed, joiner) = if invert {
            ("(TRUE", " AND ")
        } else {
            ("(FALSE", " OR ")
        };
        out.push_str(seed);
        for item in rest.split([',', ';']) {
            let (item_invert, term) = if let Some(term) = item.strip_prefix('+') {
                (invert, term)
            } else if let Some(term) = item.strip_prefix('-') {
                (!invert, term)
            } else {
                (invert, item)
            };

            let mark = out.len();
            out.push_str(joiner);
            if !parse_term(dialect, out, params, field, term, item_invert) {
                out.truncate(mark);
            }
        }
        out.push(')');
        return;
    }

    // `!` followed by nothing: there is no term left to negate.
    if !parse_term(dialect, out, params, field, rest, invert) {
        out.push_str("TRUE");
    }
}

/// Append the fragment for a single term (no list, no leading `!`).
///
/// Returns `false` (and writes nothing) when the term is blank.
pub fn parse_term(
    dialect: Dialect,
    out: &mut String,
    params: &mut Vec<Value>,
    field: &str,
    term: &str,
    invert: bool,
) -> bool {
    if term.trim().is_empty() {
        return false;
    }

    let bound = if let Some(pattern) = term.strip_prefix('~') {
        push_group(out, &dialect.regex(field, "?", invert));
        pattern.to_string()
    } else if let Some(prefix) = term.strip_prefix('^') {
        push_group(out, &dialect.like(field, "?", invert));
        format!("{prefix}%")
    } else if term.contains('*') {
        push_group(out, &dialect.like(field, "?", invert));
        term.replace('*', "%")
    } else if term.contains('%') {
        push_group(out, &dialect.like(field, "?", invert));
        term.to_string()
    } else {
        let op = if invert { "!=" } else { "=" };
        push_group(out, &format!("{field} {op} ?"));
        term.to_string()
    };

    params.push(Value::Text(bound));
    true
}

/// Parse `spec` for `field` into a standalone fragment and its parameters.
pub fn filter_fragment(dialect: Dialect, field: &str, spec: &str) -> (String, Vec<Value>) {
    let mut out = String::new();
    let mut params = Vec::new();
    parse_spec(dialect, &mut out, &mut params, field, spec);
    (out, params)
}

fn push_group(out: &mut String, inner: &str) {
    out.push('(');
    out.push_str(inner);
    out.push(')');
}
