//! WHERE-clause construction from field → filter-spec maps.
//!
//! Every builder appends its bound values to the caller's parameter list in the order
//! the filter map yields its entries. Pass a `Vec<(K, V)>` or `BTreeMap` when the
//! placeholder order has to be predictable; a `HashMap` works but is unordered.

use crate::dialect::Dialect;
use crate::filter::parse_spec;
use crate::value::Value;

/// Strategy used to interpret a filter map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TemplateType {
    /// Parse each value with the full filter-spec grammar.
    #[default]
    Auto,
    /// `field = value`
    Equal,
    /// `field != value`
    NotEqual,
    /// LIKE `%value%`
    Substring,
    /// LIKE `value%`
    StartsWith,
    /// LIKE with the value as the pattern, combined by [`ConstraintType`].
    Like,
    /// Regex with the value as the pattern, combined by [`ConstraintType`].
    Regex,
}

impl TemplateType {
    pub fn code(self) -> i32 {
        match self {
            TemplateType::Auto => 0,
            TemplateType::Equal => 1,
            TemplateType::NotEqual => 2,
            TemplateType::Substring => 3,
            TemplateType::StartsWith => 4,
            TemplateType::Like => 5,
            TemplateType::Regex => 6,
        }
    }

    /// Look up a strategy by numeric code; unknown codes select [`TemplateType::Like`].
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => TemplateType::Auto,
            1 => TemplateType::Equal,
            2 => TemplateType::NotEqual,
            3 => TemplateType::Substring,
            4 => TemplateType::StartsWith,
            6 => TemplateType::Regex,
            _ => TemplateType::Like,
        }
    }
}

/// How per-field conditions are combined by the `Like` and `Regex` strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConstraintType {
    /// OR
    AnyOf,
    /// AND
    #[default]
    AllOf,
}

impl ConstraintType {
    pub fn code(self) -> i32 {
        match self {
            ConstraintType::AnyOf => 0,
            ConstraintType::AllOf => 1,
        }
    }

    /// Unknown codes combine with OR.
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => ConstraintType::AllOf,
            _ => ConstraintType::AnyOf,
        }
    }

    fn joiner(self) -> &'static str {
        match self {
            ConstraintType::AnyOf => " OR ",
            ConstraintType::AllOf => " AND ",
        }
    }
}

/// Build a WHERE expression for `filters` using the strategy selected by `template`.
pub fn build_where<I, K, V>(
    dialect: Dialect,
    template: TemplateType,
    constraint: ConstraintType,
    params: &mut Vec<Value>,
    filters: I,
) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    match template {
        TemplateType::Auto => build_where_auto(dialect, params, filters),
        TemplateType::Equal => build_where_equal(params, filters),
        TemplateType::NotEqual => build_where_not_equal(params, filters),
        TemplateType::Substring => build_where_substring(dialect, params, filters),
        TemplateType::StartsWith => build_where_prefix(dialect, params, filters),
        TemplateType::Like => build_where_like(dialect, constraint, params, filters),
        TemplateType::Regex => build_where_regex(dialect, constraint, params, filters),
    }
}

/// `TRUE AND <spec> AND <spec> ...`, one filter-spec fragment per non-empty value.
pub fn build_where_auto<I, K, V>(dialect: Dialect, params: &mut Vec<Value>, filters: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut out = String::from("TRUE");
    for (field, spec) in filters {
        let spec = spec.as_ref();
        if spec.is_empty() {
            continue;
        }
        out.push_str(" AND ");
        parse_spec(dialect, &mut out, params, field.as_ref(), spec);
    }
    out
}

pub fn build_where_equal<I, K, V>(params: &mut Vec<Value>, filters: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    build_anded(params, filters, |field| format!("{field} = ?"), str::to_string)
}

pub fn build_where_not_equal<I, K, V>(params: &mut Vec<Value>, filters: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    build_anded(params, filters, |field| format!("{field} != ?"), str::to_string)
}

pub fn build_where_substring<I, K, V>(
    dialect: Dialect,
    params: &mut Vec<Value>,
    filters: I,
) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    build_anded(
        params,
        filters,
        |field| dialect.like(field, "?", false),
        |v| format!("%{v}%"),
    )
}

pub fn build_where_prefix<I, K, V>(dialect: Dialect, params: &mut Vec<Value>, filters: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    build_anded(
        params,
        filters,
        |field| dialect.like(field, "?", false),
        |v| format!("{v}%"),
    )
}

/// LIKE per field, combined by `constraint`. `""`, `"*"` and `"%"` are skipped.
pub fn build_where_like<I, K, V>(
    dialect: Dialect,
    constraint: ConstraintType,
    params: &mut Vec<Value>,
    filters: I,
) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    build_combined(constraint, params, filters, &["", "*", "%"], |field| {
        dialect.like(field, "?", false)
    })
}

/// Regex per field, combined by `constraint`. `""`, `"*"` and `".*"` are skipped.
pub fn build_where_regex<I, K, V>(
    dialect: Dialect,
    constraint: ConstraintType,
    params: &mut Vec<Value>,
    filters: I,
) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    build_combined(constraint, params, filters, &["", "*", ".*"], |field| {
        dialect.regex(field, "?", false)
    })
}

fn build_anded<I, K, V>(
    params: &mut Vec<Value>,
    filters: I,
    condition: impl Fn(&str) -> String,
    bind: impl Fn(&str) -> String,
) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut out = String::from("TRUE");
    for (field, value) in filters {
        let value = value.as_ref();
        if value.is_empty() {
            continue;
        }
        out.push_str(" AND (");
        out.push_str(&condition(field.as_ref()));
        out.push(')');
        params.push(Value::Text(bind(value)));
    }
    out
}

fn build_combined<I, K, V>(
    constraint: ConstraintType,
    params: &mut Vec<Value>,
    filters: I,
    wildcards: &[&str],
    condition: impl Fn(&str) -> String,
) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut conditions = Vec::new();
    for (field, value) in filters {
        let value = value.as_ref();
        if wildcards.contains(&value) {
            continue;
        }
        conditions.push(format!("({})", condition(field.as_ref())));
        params.push(Value::Text(value.to_string()));
    }

    if conditions.is_empty() {
        return "TRUE".to_string();
    }
    format!("({})", conditions.join(constraint.joiner()))
}

/// [`build_where_equal`] over typed values. Every entry is bound, including `Null`.
pub fn build_where_equal_values<I, K, V>(params: &mut Vec<Value>, filters: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<Value>,
{
    let mut out = String::from("TRUE");
    for (field, value) in filters {
        out.push_str(" AND (");
        out.push_str(field.as_ref());
        out.push_str(" = ?)");
        params.push(value.into());
    }
    out
}

/// Render `a=?, b=?` for `columns`, appending each value to `params`.
pub fn build_set<I, K, V>(params: &mut Vec<Value>, columns: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<Value>,
{
    let mut out = String::new();
    for (column, value) in columns {
        if !out.is_empty() {
            out.push_str(", ");
        }
        out.push_str(column.as_ref());
        out.push_str("=?");
        params.push(value.into());
    }
    out
}

/// A `SELECT ... FROM ... WHERE <template>` statement built from a filter map.
///
/// # Example
///
/// ```ignore
/// use sqldao::{Dialect, TemplateQuery, TemplateType};
///
/// let mut params = Vec::new();
/// let sql = TemplateQuery::new("users")
///     .columns(["id", "name"])
///     .filter("status", "open")
///     .filter("name", "^jo")
///     .suffix("ORDER BY id")
///     .to_sql(Dialect::Postgres, &mut params);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TemplateQuery {
    pub table: String,
    pub columns: Option<Vec<String>>,
    pub filters: Vec<(String, String)>,
    pub suffix: Option<String>,
    pub template: TemplateType,
    pub constraint: ConstraintType,
}

impl TemplateQuery {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    /// Select these columns instead of `*`.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Add one field → filter-spec entry.
    pub fn filter(mut self, field: impl Into<String>, spec: impl Into<String>) -> Self {
        self.filters.push((field.into(), spec.into()));
        self
    }

    /// Add several field → filter-spec entries, keeping their iteration order.
    pub fn filters<I, K, V>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.filters
            .extend(filters.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Raw SQL appended after the WHERE expression (ORDER BY, LIMIT, ...).
    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    pub fn template(mut self, template: TemplateType) -> Self {
        self.template = template;
        self
    }

    pub fn constraint(mut self, constraint: ConstraintType) -> Self {
        self.constraint = constraint;
        self
    }

    /// Render the statement, appending the WHERE parameters to `params`.
    pub fn to_sql(&self, dialect: Dialect, params: &mut Vec<Value>) -> String {
        let columns = match &self.columns {
            Some(cols) if !cols.is_empty() => cols.join(","),
            _ => "*".to_string(),
        };
        let predicate = build_where(
            dialect,
            self.template,
            self.constraint,
            params,
            self.filters.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        );

        let mut sql = format!("SELECT {columns} FROM {} WHERE {predicate}", self.table);
        if let Some(suffix) = &self.suffix {
            sql.push(' ');
            sql.push_str(suffix);
        }
        sql
    }
}

#[cfg(test)]
mod tests;
