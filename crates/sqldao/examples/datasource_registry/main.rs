//! Example: discover datasource files and bind them into a naming directory.
//!
//! Run with:
//!   cargo run --example datasource_registry -p sqldao
//!
//! Reads `*.ds.toml` files from the directories in `SQLDAO_DATASOURCES`
//! (`;`-separated). Without it, a couple of sample files are written to a
//! temporary directory first.

use sqldao::{DaoResult, DirectoryMount, MountConfig, NamingContext};
use std::env;

fn main() -> DaoResult<()> {
    dotenvy::dotenv().ok();

    let sample = tempfile::tempdir().map_err(|e| sqldao::DaoError::Other(e.to_string()))?;
    let config_dirs = match env::var("SQLDAO_DATASOURCES") {
        Ok(dirs) => dirs,
        Err(_) => {
            write_samples(sample.path())?;
            sample.path().display().to_string()
        }
    };

    let root = NamingContext::default();
    let mount = DirectoryMount::mount(
        &root,
        MountConfig {
            config_dirs,
            ..MountConfig::default()
        },
    )?;

    for name in mount.names() {
        let path = format!("java:ds/{name}");
        if let Some(ds) = root.lookup(&path) {
            let dao_config = ds.dao_config();
            println!(
                "{path}: {} (dialect {}, read_only {}, pool size {})",
                ds.url, dao_config.dialect, dao_config.read_only, ds.max_size
            );
        }
    }

    drop(mount);
    println!("after unmount: {:?}", root.lookup("java:ds/reports").map(|ds| ds.url));
    Ok(())
}

fn write_samples(dir: &std::path::Path) -> DaoResult<()> {
    let files = [
        (
            "reports.ds.toml",
            "url = \"postgres://localhost/reports\"\ndialect = \"postgres\"\nmax_size = 4\nread_only = true\n",
        ),
        (
            "legacy.ds.toml",
            "url = \"mysql://localhost/legacy\"\ndialect = \"mysql\"\n\n[options]\nsql_mode = \"ANSI\"\n",
        ),
    ];
    for (name, contents) in files {
        let path = dir.join(name);
        std::fs::write(&path, contents).map_err(|source| sqldao::DaoError::Io {
            path: path.display().to_string(),
            source,
        })?;
    }
    Ok(())
}
