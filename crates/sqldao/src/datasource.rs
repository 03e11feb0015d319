//! Datasource definitions discovered from configuration directories.
//!
//! Each `<name>.ds.toml` file in a scanned directory defines one datasource called
//! `<name>`:
//!
//! ```toml
//! url = "postgres://${DB_HOST}/reports"
//! dialect = "postgres"
//! user = "reporter"
//! password = "${REPORTS_PASSWORD}"
//! max_size = 8
//! read_only = true
//!
//! [options]
//! application_name = "nightly-export"
//! ```
//!
//! `${VAR}` references in string values are replaced from the process environment.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::dao::DaoConfig;
use crate::dialect::Dialect;
use crate::error::{DaoError, DaoResult};

/// File-name suffix that marks a datasource definition.
pub const DEFAULT_CONFIG_SUFFIX: &str = ".ds.toml";

/// One datasource definition.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataSourceConfig {
    pub url: String,
    #[serde(default)]
    pub dialect: Dialect,
    pub user: Option<String>,
    pub password: Option<String>,
    #[serde(default = "default_max_size")]
    pub max_size: usize,
    #[serde(default)]
    pub read_only: bool,
    /// Server runtime parameters, sent as connection options.
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

fn default_max_size() -> usize {
    16
}

impl DataSourceConfig {
    pub fn new(url: impl Into<String>, dialect: Dialect) -> Self {
        Self {
            url: url.into(),
            dialect,
            user: None,
            password: None,
            max_size: default_max_size(),
            read_only: false,
            options: BTreeMap::new(),
        }
    }

    /// Parse a definition, expand environment references and validate it.
    ///
    /// `origin` names the source in error messages (usually the file path).
    pub fn from_toml_str(raw: &str, origin: &str) -> DaoResult<Self> {
        let mut config: DataSourceConfig = toml::from_str(raw).map_err(|e| DaoError::Config {
            path: origin.to_string(),
            message: e.to_string(),
        })?;
        config.expand_env(origin)?;
        config.validate()?;
        Ok(config)
    }

    fn expand_env(&mut self, origin: &str) -> DaoResult<()> {
        self.url = expand_env_vars(&self.url, origin)?;
        if let Some(user) = self.user.as_mut() {
            *user = expand_env_vars(user, origin)?;
        }
        if let Some(password) = self.password.as_mut() {
            *password = expand_env_vars(password, origin)?;
        }
        for v in self.options.values_mut() {
            *v = expand_env_vars(v, origin)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> DaoResult<()> {
        if self.url.trim().is_empty() {
            return Err(DaoError::configuration("datasource url must not be empty"));
        }
        if self.max_size == 0 {
            return Err(DaoError::configuration(
                "datasource max_size must be greater than zero",
            ));
        }
        Ok(())
    }

    /// [`DaoConfig`] matching this datasource's dialect and read-only flag.
    pub fn dao_config(&self) -> DaoConfig {
        DaoConfig::new(self.dialect).read_only(self.read_only)
    }

    /// Build a connection pool for this datasource. Postgres only.
    #[cfg(feature = "pool")]
    pub fn connect(&self) -> DaoResult<deadpool_postgres::Pool> {
        if self.dialect != Dialect::Postgres {
            return Err(DaoError::configuration(format!(
                "cannot open a pool for dialect {}",
                self.dialect
            )));
        }
        crate::postgres::build_pool(self.pg_config()?, self.max_size)
    }

    /// Driver configuration: the url overlaid with `user`, `password` and `options`.
    #[cfg(feature = "pool")]
    fn pg_config(&self) -> DaoResult<tokio_postgres::Config> {
        let mut pg_config: tokio_postgres::Config = self
            .url
            .parse()
            .map_err(|e: tokio_postgres::Error| DaoError::Connection(e.to_string()))?;
        if let Some(user) = &self.user {
            pg_config.user(user);
        }
        if let Some(password) = &self.password {
            pg_config.password(password);
        }
        if !self.options.is_empty() {
            let options = self
                .options
                .iter()
                .map(|(k, v)| format!("-c {k}={v}"))
                .collect::<Vec<_>>()
                .join(" ");
            pg_config.options(&options);
        }
        Ok(pg_config)
    }
}

/// Read and parse one datasource file.
pub fn load_datasource_file(path: &Path) -> DaoResult<DataSourceConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| DaoError::Io {
        path: path.display().to_string(),
        source,
    })?;
    DataSourceConfig::from_toml_str(&raw, &path.display().to_string())
}

/// Add every `*<suffix>` file in `dir` to `registry`, keyed by file name minus suffix.
///
/// Files that fail to load are logged and skipped. Returns how many entries were added.
/// A path that is not a directory adds nothing.
pub fn scan_directory(
    dir: &Path,
    suffix: &str,
    registry: &mut BTreeMap<String, DataSourceConfig>,
) -> DaoResult<usize> {
    if !dir.is_dir() {
        tracing::warn!(dir = %dir.display(), "datasource directory not found");
        return Ok(0);
    }

    let entries = std::fs::read_dir(dir).map_err(|source| DaoError::Io {
        path: dir.display().to_string(),
        source,
    })?;

    let mut added = 0;
    for entry in entries {
        let entry = entry.map_err(|source| DaoError::Io {
            path: dir.display().to_string(),
            source,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_suffix(suffix))
        else {
            continue;
        };

        match load_datasource_file(&path) {
            Ok(config) => {
                tracing::info!(name, path = %path.display(), dialect = %config.dialect, "loaded datasource");
                registry.insert(name.to_string(), config);
                added += 1;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping datasource file");
            }
        }
    }
    Ok(added)
}

/// Scan every directory in `dirs` for datasource files.
///
/// Each entry may hold several directories separated by `;`. Directories that cannot be
/// read are logged and skipped. Later definitions of the same name replace earlier ones.
pub fn scan_datasource_directories<I, S>(dirs: I, suffix: &str) -> BTreeMap<String, DataSourceConfig>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut registry = BTreeMap::new();
    for entry in dirs {
        for dir in entry.as_ref().split(';').map(str::trim) {
            if dir.is_empty() {
                continue;
            }
            tracing::info!(dir, "scanning datasource directory");
            if let Err(e) = scan_directory(Path::new(dir), suffix, &mut registry) {
                tracing::warn!(dir, error = %e, "failed to scan datasource directory");
            }
        }
    }
    registry
}

/// Replace each `${VAR}` in a datasource field with the variable's value.
///
/// A reference to an unset variable, an unclosed `${` or an empty `${}` fails the whole
/// file; the error names the file and the variable.
fn expand_env_vars(field: &str, origin: &str) -> DaoResult<String> {
    let invalid = |message: String| DaoError::Config {
        path: origin.to_string(),
        message,
    };

    let mut out = String::with_capacity(field.len());
    let mut rest = field;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let reference = &rest[start + 2..];
        let Some(end) = reference.find('}') else {
            return Err(invalid("unclosed `${` in datasource field".to_string()));
        };
        let var = &reference[..end];
        if var.is_empty() {
            return Err(invalid("empty `${}` reference in datasource field".to_string()));
        }
        match std::env::var(var) {
            Ok(value) => out.push_str(&value),
            Err(std::env::VarError::NotPresent) => {
                return Err(invalid(format!("environment variable {var} is not set")));
            }
            Err(std::env::VarError::NotUnicode(_)) => {
                return Err(invalid(format!("environment variable {var} is not valid unicode")));
            }
        }
        rest = &reference[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply() {
        let config = DataSourceConfig::from_toml_str(r#"url = "postgres://localhost/db""#, "inline")
            .unwrap();
        assert_eq!(config.dialect, Dialect::Ansi);
        assert_eq!(config.max_size, 16);
        assert!(!config.read_only);
        assert!(config.options.is_empty());
    }

    #[test]
    fn full_definition_parses() {
        let raw = r#"
            url = "mysql://db/app"
            dialect = "mysql"
            user = "app"
            max_size = 4
            read_only = true

            [options]
            sql_mode = "ANSI"
        "#;
        let config = DataSourceConfig::from_toml_str(raw, "inline").unwrap();
        assert_eq!(config.dialect, Dialect::MySql);
        assert_eq!(config.user.as_deref(), Some("app"));
        assert_eq!(config.options.get("sql_mode").map(String::as_str), Some("ANSI"));

        let dao = config.dao_config();
        assert_eq!(dao.dialect, Dialect::MySql);
        assert!(dao.read_only);
    }

    #[test]
    fn unknown_keys_and_bad_values_are_rejected() {
        let err = DataSourceConfig::from_toml_str("url = \"x\"\nurll = \"y\"", "a.ds.toml").unwrap_err();
        assert!(matches!(err, DaoError::Config { ref path, .. } if path == "a.ds.toml"));

        let err = DataSourceConfig::from_toml_str("url = \"  \"", "b").unwrap_err();
        assert!(err.is_configuration());

        let err = DataSourceConfig::from_toml_str("url = \"x\"\nmax_size = 0", "c").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn env_references_are_expanded() {
        // SAFETY: test-only; the variable name is unique to this test.
        unsafe { std::env::set_var("SQLDAO_TEST_DS_HOST", "db.internal") };
        let config =
            DataSourceConfig::from_toml_str(r#"url = "postgres://${SQLDAO_TEST_DS_HOST}/x""#, "inline")
                .unwrap();
        assert_eq!(config.url, "postgres://db.internal/x");
    }

    #[test]
    fn expansion_errors_name_the_file_and_variable() {
        let err = expand_env_vars("${SQLDAO_TEST_SURELY_UNSET_VAR}", "reports.ds.toml").unwrap_err();
        assert!(matches!(
            err,
            DaoError::Config { ref path, ref message }
                if path == "reports.ds.toml" && message.contains("SQLDAO_TEST_SURELY_UNSET_VAR")
        ));

        assert!(expand_env_vars("${unterminated", "x").is_err());
        assert!(expand_env_vars("${}", "x").is_err());
        assert_eq!(expand_env_vars("plain $ sign {}", "x").unwrap(), "plain $ sign {}");
    }

    #[test]
    fn unset_variable_fails_the_definition() {
        let raw = r#"
            url = "postgres://db/app"
            password = "${SQLDAO_TEST_UNSET_PASSWORD}"
        "#;
        let err = DataSourceConfig::from_toml_str(raw, "app.ds.toml").unwrap_err();
        assert!(err.to_string().contains("app.ds.toml"));
        assert!(err.to_string().contains("SQLDAO_TEST_UNSET_PASSWORD"));
    }

    #[cfg(feature = "pool")]
    #[test]
    fn connect_requires_postgres() {
        let config = DataSourceConfig::new("mysql://db/app", Dialect::MySql);
        assert!(config.connect().unwrap_err().is_configuration());
    }

    #[cfg(feature = "pool")]
    #[test]
    fn credentials_and_options_overlay_the_url() {
        let mut config = DataSourceConfig::new("postgres://localhost/reports", Dialect::Postgres);
        config.user = Some("reporter".into());
        config.password = Some("secret".into());
        config.options.insert("application_name".into(), "export".into());

        let pg = config.pg_config().unwrap();
        assert_eq!(pg.get_user(), Some("reporter"));
        assert_eq!(pg.get_password(), Some(&b"secret"[..]));
        assert_eq!(pg.get_options(), Some("-c application_name=export"));

        // Pools connect lazily, so building one needs no server.
        let pool = config.connect().unwrap();
        assert_eq!(pool.status().max_size, 16);
    }
}
