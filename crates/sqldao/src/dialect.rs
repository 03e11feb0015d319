//! Database dialects and per-dialect rendering of pattern-match operators.
//!
//! The dialect only changes how `LIKE` and regular-expression matches are spelled.
//! Everything else the builders emit is plain ANSI SQL with `?` placeholders.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Supported database dialects.
///
/// The numeric codes (see [`Dialect::code`]) are stable and match the values used in
/// existing configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Ansi,
    #[serde(alias = "mariadb")]
    MySql,
    Oracle,
    #[serde(alias = "postgresql")]
    Postgres,
    #[serde(alias = "sqlserver")]
    MsSql,
    Sybase,
    Db2,
    H2,
    Sqlite,
    Crate,
}

impl Dialect {
    pub const ALL: [Dialect; 10] = [
        Dialect::Ansi,
        Dialect::MySql,
        Dialect::Oracle,
        Dialect::Postgres,
        Dialect::MsSql,
        Dialect::Sybase,
        Dialect::Db2,
        Dialect::H2,
        Dialect::Sqlite,
        Dialect::Crate,
    ];

    /// Numeric code of this dialect.
    pub fn code(self) -> i32 {
        match self {
            Dialect::Ansi => 0,
            Dialect::MySql => 1,
            Dialect::Oracle => 2,
            Dialect::Postgres => 3,
            Dialect::MsSql => 4,
            Dialect::Sybase => 5,
            Dialect::Db2 => 6,
            Dialect::H2 => 7,
            Dialect::Sqlite => 8,
            Dialect::Crate => 9,
        }
    }

    /// Look up a dialect by numeric code. Unknown codes fall back to [`Dialect::Ansi`].
    pub fn from_code(code: i32) -> Self {
        Self::ALL
            .into_iter()
            .find(|d| d.code() == code)
            .unwrap_or(Dialect::Ansi)
    }

    pub fn name(self) -> &'static str {
        match self {
            Dialect::Ansi => "ansi",
            Dialect::MySql => "mysql",
            Dialect::Oracle => "oracle",
            Dialect::Postgres => "postgres",
            Dialect::MsSql => "mssql",
            Dialect::Sybase => "sybase",
            Dialect::Db2 => "db2",
            Dialect::H2 => "h2",
            Dialect::Sqlite => "sqlite",
            Dialect::Crate => "crate",
        }
    }

    /// Render a (case-insensitive where the dialect allows it) LIKE match.
    pub fn like(self, left: &str, right: &str, invert: bool) -> String {
        render_like(self, left, right, invert)
    }

    /// Render a case-insensitive regular-expression match.
    pub fn regex(self, left: &str, right: &str, invert: bool) -> String {
        render_regex(self, left, right, invert)
    }

    /// Whether `INSERT ... SET` and `ON DUPLICATE KEY UPDATE` are available.
    pub fn supports_insert_set(self) -> bool {
        matches!(self, Dialect::MySql)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown dialect name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown dialect: {0}")]
pub struct UnknownDialect(pub String);

impl FromStr for Dialect {
    type Err = UnknownDialect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let dialect = match lower.as_str() {
            "ansi" => Dialect::Ansi,
            "mysql" | "mariadb" => Dialect::MySql,
            "oracle" => Dialect::Oracle,
            "postgres" | "postgresql" => Dialect::Postgres,
            "mssql" | "sqlserver" => Dialect::MsSql,
            "sybase" => Dialect::Sybase,
            "db2" => Dialect::Db2,
            "h2" => Dialect::H2,
            "sqlite" => Dialect::Sqlite,
            "crate" => Dialect::Crate,
            _ => return Err(UnknownDialect(s.to_string())),
        };
        Ok(dialect)
    }
}

/// Render `left LIKE right` for `dialect`.
///
/// Postgres uses `ILIKE`; Oracle and MSSQL lower-case the left expression.
pub fn render_like(dialect: Dialect, left: &str, right: &str, invert: bool) -> String {
    let not = if invert { " NOT" } else { "" };
    match dialect {
        Dialect::Postgres => format!("{left}{not} ILIKE {right}"),
        Dialect::Oracle | Dialect::MsSql => format!("LOWER({left}){not} LIKE {right}"),
        _ => format!("{left}{not} LIKE {right}"),
    }
}

/// Render a regular-expression match of `left` against `right` for `dialect`.
pub fn render_regex(dialect: Dialect, left: &str, right: &str, invert: bool) -> String {
    match dialect {
        Dialect::Postgres => {
            let op = if invert { "!~*" } else { "~*" };
            format!("{left} {op} {right}")
        }
        Dialect::Oracle => {
            let not = if invert { "NOT " } else { "" };
            format!("{not}REGEXP_LIKE({left}, {right}, 'i')")
        }
        Dialect::MySql => {
            let not = if invert { " NOT" } else { "" };
            format!("{left}{not} RLIKE {right}")
        }
        _ => {
            let not = if invert { " NOT" } else { "" };
            format!("{left}{not} REGEXP {right}")
        }
    }
}
