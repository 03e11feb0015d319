//! Datasource file discovery and naming-directory registration.

use std::fs;
use std::path::Path;

use sqldao::{
    DEFAULT_CONFIG_SUFFIX, DaoError, Dialect, DirectoryMount, MountConfig, NamingContext,
    load_datasource_file, register_from_directories, scan_datasource_directories, scan_directory,
};

fn write(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).unwrap();
}

#[test]
fn scan_names_entries_by_file_stem_and_skips_bad_files() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "reports.ds.toml", "url = \"postgres://db/reports\"\ndialect = \"postgres\"\n");
    write(dir.path(), "legacy.ds.toml", "url = \"mysql://db/legacy\"\ndialect = \"mysql\"\nread_only = true\n");
    write(dir.path(), "broken.ds.toml", "url = ");
    write(dir.path(), "notes.txt", "url = \"x\"");
    fs::create_dir(dir.path().join("nested.ds.toml")).unwrap();

    let mut registry = Default::default();
    let added = scan_directory(dir.path(), DEFAULT_CONFIG_SUFFIX, &mut registry).unwrap();

    assert_eq!(added, 2);
    assert_eq!(
        registry.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["legacy", "reports"]
    );
    assert_eq!(registry["reports"].dialect, Dialect::Postgres);
    assert!(registry["legacy"].read_only);
}

#[test]
fn semicolon_separated_dirs_and_missing_dirs() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    write(first.path(), "a.ds.toml", "url = \"postgres://one/a\"");
    write(first.path(), "shared.ds.toml", "url = \"postgres://one/shared\"");
    write(second.path(), "shared.ds.toml", "url = \"postgres://two/shared\"");

    let joined = format!(
        "{} ; /definitely/not/a/dir;{}",
        first.path().display(),
        second.path().display()
    );
    let registry = scan_datasource_directories([joined.as_str()], DEFAULT_CONFIG_SUFFIX);

    assert_eq!(registry.len(), 2);
    assert_eq!(registry["shared"].url, "postgres://two/shared");
}

#[test]
fn custom_suffix() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.conf", "url = \"postgres://x/a\"");
    write(dir.path(), "b.ds.toml", "url = \"postgres://x/b\"");

    let registry = scan_datasource_directories([dir.path().to_str().unwrap()], ".conf");
    assert_eq!(registry.keys().collect::<Vec<_>>(), vec!["a"]);
}

#[test]
fn load_reports_io_and_parse_errors() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_datasource_file(&dir.path().join("missing.ds.toml")).unwrap_err();
    assert!(matches!(err, DaoError::Io { .. }));

    write(dir.path(), "bad.ds.toml", "url = \"x\"\ndialect = \"nosql\"");
    let err = load_datasource_file(&dir.path().join("bad.ds.toml")).unwrap_err();
    assert!(matches!(err, DaoError::Config { .. }));
}

#[test]
fn register_from_directories_binds_into_context() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "reports.ds.toml", "url = \"postgres://db/reports\"");

    let root = NamingContext::default();
    let ctx = root.subcontext("java:ds").unwrap();
    let names =
        register_from_directories([dir.path().to_str().unwrap()], DEFAULT_CONFIG_SUFFIX, &ctx)
            .unwrap();

    assert_eq!(names, vec!["reports".to_string()]);
    let found = root.lookup("java:ds/reports").unwrap();
    assert_eq!(found.url, "postgres://db/reports");
}

#[test]
fn mount_registers_and_drop_unregisters() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.ds.toml", "url = \"postgres://db/a\"");
    write(dir.path(), "b.ds.toml", "url = \"postgres://db/b\"");

    let root = NamingContext::default();
    let config = MountConfig {
        config_dirs: dir.path().display().to_string(),
        registry_path: "java:comp/env/jdbc".to_string(),
        ..MountConfig::default()
    };

    let mount = DirectoryMount::mount(&root, config).unwrap();
    assert_eq!(mount.names(), ["a".to_string(), "b".to_string()]);
    assert_eq!(mount.context().name(), "java:comp/env/jdbc");
    assert!(root.lookup("java:comp/env/jdbc/b").is_some());

    drop(mount);
    assert!(root.lookup("java:comp/env/jdbc/a").is_none());
    assert!(root.lookup("java:comp/env/jdbc/b").is_none());
}
