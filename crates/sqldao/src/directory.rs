//! In-process naming directory for discovered datasources.
//!
//! Names are `/`-separated paths. A scheme prefix such as `java:` stays part of the
//! first component, so `java:ds/reports` is the entry `reports` inside the context
//! `java:ds`. Empty components are ignored.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use serde::Deserialize;

use crate::datasource::{DEFAULT_CONFIG_SUFFIX, DataSourceConfig, scan_datasource_directories};
use crate::error::{DaoError, DaoResult};

#[derive(Debug)]
enum Entry<T> {
    Bound(T),
    Context(Arc<NamingContext<T>>),
}

/// A thread-safe hierarchy of named values.
#[derive(Debug)]
pub struct NamingContext<T> {
    name: String,
    entries: RwLock<BTreeMap<String, Entry<T>>>,
}

impl<T> Default for NamingContext<T> {
    fn default() -> Self {
        Self::new("")
    }
}

fn components(name: &str) -> Vec<&str> {
    name.split('/').filter(|c| !c.is_empty()).collect()
}

impl<T> NamingContext<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// Full path of this context from the root it was created under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names bound directly in this context (values and subcontexts).
    pub fn names(&self) -> Vec<String> {
        let entries = self.entries.read().expect("naming context lock poisoned");
        entries.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries
            .read()
            .expect("naming context lock poisoned")
            .is_empty()
    }

    fn child(&self, component: &str) -> DaoResult<Arc<NamingContext<T>>> {
        let mut entries = self.entries.write().expect("naming context lock poisoned");
        match entries.get(component) {
            Some(Entry::Context(ctx)) => Ok(Arc::clone(ctx)),
            Some(Entry::Bound(_)) => Err(DaoError::configuration(format!(
                "{component} is bound to a value, not a context"
            ))),
            None => {
                let path = if self.name.is_empty() {
                    component.to_string()
                } else {
                    format!("{}/{component}", self.name)
                };
                let ctx = Arc::new(NamingContext::new(path));
                entries.insert(component.to_string(), Entry::Context(Arc::clone(&ctx)));
                Ok(ctx)
            }
        }
    }

    fn existing_child(&self, component: &str) -> Option<Arc<NamingContext<T>>> {
        let entries = self.entries.read().expect("naming context lock poisoned");
        match entries.get(component) {
            Some(Entry::Context(ctx)) => Some(Arc::clone(ctx)),
            _ => None,
        }
    }

    /// Resolve `path` to a nested context, creating every missing level.
    pub fn subcontext(&self, path: &str) -> DaoResult<Arc<NamingContext<T>>> {
        let parts = components(path);
        let Some((first, rest)) = parts.split_first() else {
            return Err(DaoError::configuration("empty context path"));
        };
        let mut ctx = self.child(first)?;
        for part in rest {
            ctx = ctx.child(part)?;
        }
        Ok(ctx)
    }

    /// Bind `value` at `name`, creating intermediate contexts. An existing value is replaced.
    pub fn bind(&self, name: &str, value: T) -> DaoResult<()> {
        let parts = components(name);
        let Some((leaf, parents)) = parts.split_last() else {
            return Err(DaoError::configuration("cannot bind an empty name"));
        };

        let parent = match parents {
            [] => None,
            _ => Some(self.subcontext(&parents.join("/"))?),
        };
        let target = parent.as_deref().unwrap_or(self);

        let mut entries = target.entries.write().expect("naming context lock poisoned");
        if let Some(Entry::Context(_)) = entries.get(*leaf) {
            return Err(DaoError::configuration(format!(
                "{name} is bound to a context"
            )));
        }
        entries.insert(leaf.to_string(), Entry::Bound(value));
        Ok(())
    }

    /// Remove the value bound at `name`. Returns whether anything was removed.
    pub fn unbind(&self, name: &str) -> bool {
        let parts = components(name);
        let Some((leaf, parents)) = parts.split_last() else {
            return false;
        };

        let mut parent: Option<Arc<NamingContext<T>>> = None;
        for part in parents {
            let next = match &parent {
                None => self.existing_child(part),
                Some(ctx) => ctx.existing_child(part),
            };
            match next {
                Some(ctx) => parent = Some(ctx),
                None => {
                    tracing::debug!(name, missing = *part, "unbind: context not found");
                    return false;
                }
            }
        }
        let target = parent.as_deref().unwrap_or(self);

        let mut entries = target.entries.write().expect("naming context lock poisoned");
        match entries.get(*leaf) {
            Some(Entry::Bound(_)) => {
                entries.remove(*leaf);
                true
            }
            _ => false,
        }
    }
}

impl<T: Clone> NamingContext<T> {
    /// The value bound at `name`, if any.
    pub fn lookup(&self, name: &str) -> Option<T> {
        let parts = components(name);
        let (leaf, parents) = parts.split_last()?;

        let mut parent: Option<Arc<NamingContext<T>>> = None;
        for part in parents {
            let next = match &parent {
                None => self.existing_child(part),
                Some(ctx) => ctx.existing_child(part),
            };
            parent = Some(next?);
        }
        let target = parent.as_deref().unwrap_or(self);

        let entries = target.entries.read().expect("naming context lock poisoned");
        match entries.get(*leaf) {
            Some(Entry::Bound(value)) => Some(value.clone()),
            _ => None,
        }
    }
}

/// Bind every entry of `sources` into `ctx`. Returns the names that were bound.
pub fn register_all<T: Clone>(
    ctx: &NamingContext<T>,
    sources: &BTreeMap<String, T>,
) -> DaoResult<Vec<String>> {
    let mut bound = Vec::with_capacity(sources.len());
    for (name, value) in sources {
        ctx.bind(name, value.clone())?;
        tracing::info!(context = ctx.name(), name = %name, "registered datasource");
        bound.push(name.clone());
    }
    Ok(bound)
}

/// Unbind every name in `names` from `ctx`. Returns how many were removed.
pub fn unregister_all<T, I, S>(ctx: &NamingContext<T>, names: I) -> usize
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut removed = 0;
    for name in names {
        let name = name.as_ref();
        if ctx.unbind(name) {
            tracing::info!(context = ctx.name(), name, "unregistered datasource");
            removed += 1;
        }
    }
    removed
}

/// Scan `dirs` for datasource files and bind each one into `ctx`.
pub fn register_from_directories<I, S>(
    dirs: I,
    suffix: &str,
    ctx: &NamingContext<DataSourceConfig>,
) -> DaoResult<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let sources = scan_datasource_directories(dirs, suffix);
    register_all(ctx, &sources)
}

/// Where [`DirectoryMount`] looks for datasource files and where it binds them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MountConfig {
    /// One or more directories, `;`-separated.
    pub config_dirs: String,
    pub registry_path: String,
    pub suffix: String,
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            config_dirs: "datasources".to_string(),
            registry_path: "java:ds".to_string(),
            suffix: DEFAULT_CONFIG_SUFFIX.to_string(),
        }
    }
}

/// Datasources registered from configuration directories for the lifetime of the mount.
///
/// Dropping the mount unbinds everything it registered.
///
/// ```ignore
/// let root = NamingContext::default();
/// let mount = DirectoryMount::mount(&root, MountConfig::default())?;
/// let reports = root.lookup("java:ds/reports");
/// drop(mount);
/// ```
#[derive(Debug)]
pub struct DirectoryMount {
    context: Arc<NamingContext<DataSourceConfig>>,
    names: Vec<String>,
}

impl DirectoryMount {
    pub fn mount(root: &NamingContext<DataSourceConfig>, config: MountConfig) -> DaoResult<Self> {
        let context = root.subcontext(&config.registry_path)?;
        let names = register_from_directories([config.config_dirs.as_str()], &config.suffix, &context)?;
        tracing::info!(
            context = context.name(),
            count = names.len(),
            "mounted datasource directory"
        );
        Ok(Self { context, names })
    }

    /// Names registered by this mount, relative to its context.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn context(&self) -> &Arc<NamingContext<DataSourceConfig>> {
        &self.context
    }
}

impl Drop for DirectoryMount {
    fn drop(&mut self) {
        unregister_all(self.context.as_ref(), &self.names);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_creates_intermediate_contexts() {
        let root = NamingContext::default();
        root.bind("java:ds/reports", 1).unwrap();
        assert_eq!(root.lookup("java:ds/reports"), Some(1));
        assert_eq!(root.names(), vec!["java:ds".to_string()]);

        let ds = root.subcontext("java:ds").unwrap();
        assert_eq!(ds.name(), "java:ds");
        assert_eq!(ds.lookup("reports"), Some(1));
    }

    #[test]
    fn rebind_replaces_value() {
        let root = NamingContext::default();
        root.bind("a/b", "old").unwrap();
        root.bind("a//b/", "new").unwrap();
        assert_eq!(root.lookup("a/b"), Some("new"));
    }

    #[test]
    fn unbind_reports_whether_something_was_removed() {
        let root = NamingContext::default();
        root.bind("a/b", 1).unwrap();
        assert!(!root.unbind("missing/b"));
        assert!(!root.unbind("a/c"));
        assert!(!root.unbind("a"));
        assert!(root.unbind("a/b"));
        assert_eq!(root.lookup("a/b"), None);
        assert!(!root.unbind("a/b"));
    }

    #[test]
    fn values_and_contexts_do_not_mix() {
        let root = NamingContext::default();
        root.bind("a", 1).unwrap();
        assert!(root.bind("a/b", 2).is_err());
        root.bind("c/d", 3).unwrap();
        assert!(root.bind("c", 4).is_err());
        assert!(root.bind("", 5).is_err());
        assert!(root.subcontext("/").is_err());
    }

    #[test]
    fn register_and_unregister_all() {
        let root = NamingContext::default();
        let ctx = root.subcontext("java:ds").unwrap();
        let sources: BTreeMap<String, i32> =
            [("a".to_string(), 1), ("b".to_string(), 2)].into_iter().collect();

        let names = register_all(&ctx, &sources).unwrap();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(root.lookup("java:ds/b"), Some(2));

        assert_eq!(unregister_all(&ctx, ["a", "b", "c"]), 2);
        assert!(ctx.is_empty());
    }

    #[test]
    fn default_mount_config() {
        let config = MountConfig::default();
        assert_eq!(config.config_dirs, "datasources");
        assert_eq!(config.registry_path, "java:ds");
        assert_eq!(config.suffix, ".ds.toml");
    }
}
