use std::collections::{BTreeMap, HashMap};
use std::env;
use std::num::NonZeroU32;
use std::path::PathBuf;

use anyhow::{Context, Result};
use config::{Config as HierarchicalConfig, Environment};
use library_catalog::DEFAULT_CATALOG_URL;
use serde::{Deserialize, Serialize};
use tracing::debug;
use xdg::BaseDirectories;

use crate::controllers::list::DEFAULT_PAGE_SIZE;

/// Name of library managed directories
const LIBRARY_DIR_NAME: &str = "library";
const LIBRARY_CONFIG_DIR_VAR: &str = "LIBRARY_CONFIG_DIR";
const LIBRARY_ENV_PREFIX: &str = "LIBRARY_";
pub const LIBRARY_CONFIG_FILE: &str = "library.toml";

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 15;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Clone, Debug, Deserialize, Default, Serialize)]
pub struct Config {
    /// library configuration options
    #[serde(default, flatten)]
    pub library: LibraryConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct LibraryConfig {
    /// Base URL of the catalog API
    // Using a URL here adds an extra trailing slash,
    // so just use a String.
    pub catalog_url: String,

    /// How many books `library books list` shows per page
    pub page_size: NonZeroU32,

    /// Seconds to wait for a connection to the catalog
    pub connect_timeout_secs: u64,

    /// Seconds to wait for a complete response from the catalog
    pub request_timeout_secs: u64,

    /// Headers added to every catalog request, e.g. for an auth proxy
    #[serde(default)]
    pub extra_headers: BTreeMap<String, String>,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            extra_headers: BTreeMap::new(),
        }
    }
}

impl Config {
    fn read_raw_config() -> Result<HierarchicalConfig> {
        let library_dirs = BaseDirectories::with_prefix(LIBRARY_DIR_NAME);

        let mut builder = HierarchicalConfig::builder()
            .set_default("catalog_url", DEFAULT_CATALOG_URL)?
            .set_default("page_size", i64::from(DEFAULT_PAGE_SIZE.get()))?
            .set_default("connect_timeout_secs", DEFAULT_CONNECT_TIMEOUT_SECS)?
            .set_default("request_timeout_secs", DEFAULT_REQUEST_TIMEOUT_SECS)?;

        // read from /etc
        builder = builder.add_source(
            config::File::from(PathBuf::from("/etc").join(LIBRARY_CONFIG_FILE))
                .format(config::FileFormat::Toml)
                .required(false),
        );

        // look for files in XDG_CONFIG_DIRS locations
        for file in library_dirs.find_config_files(LIBRARY_CONFIG_FILE) {
            debug!(file = %file.display(), "reading config file");
            builder = builder.add_source(config::File::from(file).format(config::FileFormat::Toml));
        }

        // Add explicit LIBRARY_CONFIG_DIR file last
        if let Ok(config_dir) = env::var(LIBRARY_CONFIG_DIR_VAR) {
            debug!("`${LIBRARY_CONFIG_DIR_VAR}` set: {config_dir}");
            builder = builder.add_source(
                config::File::from(PathBuf::from(config_dir).join(LIBRARY_CONFIG_FILE))
                    .format(config::FileFormat::Toml)
                    .required(false),
            );
        }

        // override via env variables
        let library_envs: HashMap<String, String> = env::vars()
            .filter_map(|(k, v)| k.strip_prefix(LIBRARY_ENV_PREFIX).map(|k| (k.to_owned(), v)))
            .collect();

        let builder = builder.add_source(
            Environment::default()
                .source(Some(library_envs))
                .try_parsing(true),
        );

        Ok(builder.build()?)
    }

    /// Creates a [Config] from the config files and environment
    pub fn parse() -> Result<Config> {
        let final_config = Self::read_raw_config()?;
        let cli_config: Config = final_config
            .try_deserialize()
            .context("Could not parse config")?;
        Ok(cli_config)
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use serial_test::serial;

    use super::*;

    /// Run `f` with no user or system config in the way.
    fn with_isolated_env<R>(vars: &[(&str, Option<&str>)], f: impl FnOnce() -> R) -> R {
        let home = tempfile::tempdir().unwrap();
        let home = home.path().to_string_lossy().into_owned();
        let isolation: [(&str, Option<&str>); 6] = [
            ("HOME", Some(home.as_str())),
            ("XDG_CONFIG_HOME", Some(home.as_str())),
            ("XDG_CONFIG_DIRS", Some(home.as_str())),
            (LIBRARY_CONFIG_DIR_VAR, None),
            ("LIBRARY_CATALOG_URL", None),
            ("LIBRARY_PAGE_SIZE", None),
        ];
        let all_vars: Vec<(&str, Option<&str>)> = isolation
            .into_iter()
            .filter(|(key, _)| !vars.iter().any(|(set, _)| set == key))
            .chain(vars.iter().copied())
            .collect();
        temp_env::with_vars(all_vars, f)
    }

    #[test]
    #[serial]
    fn defaults_without_sources() {
        let config = with_isolated_env(&[], Config::parse).unwrap();
        assert_eq!(config.library, LibraryConfig::default());
        assert_eq!(config.library.catalog_url, "http://127.0.0.1:8000/api/v1");
        assert_eq!(config.library.page_size.get(), 10);
    }

    #[test]
    #[serial]
    fn config_dir_file_is_read() {
        let config_dir = tempfile::tempdir().unwrap();
        std::fs::write(
            config_dir.path().join(LIBRARY_CONFIG_FILE),
            indoc! {r#"
                catalog_url = "https://books.example.com/api/v1"
                page_size = 25

                [extra_headers]
                x-library-branch = "north"
            "#},
        )
        .unwrap();
        let config_dir = config_dir.path().to_string_lossy().into_owned();

        let config = with_isolated_env(
            &[(LIBRARY_CONFIG_DIR_VAR, Some(config_dir.as_str()))],
            Config::parse,
        )
        .unwrap();

        assert_eq!(config.library.catalog_url, "https://books.example.com/api/v1");
        assert_eq!(config.library.page_size.get(), 25);
        assert_eq!(
            config.library.extra_headers.get("x-library-branch").map(String::as_str),
            Some("north")
        );
        assert_eq!(config.library.request_timeout_secs, 60);
    }

    #[test]
    #[serial]
    fn env_overrides_file() {
        let config_dir = tempfile::tempdir().unwrap();
        std::fs::write(config_dir.path().join(LIBRARY_CONFIG_FILE), "page_size = 25\n").unwrap();
        let config_dir = config_dir.path().to_string_lossy().into_owned();

        let config = with_isolated_env(
            &[
                (LIBRARY_CONFIG_DIR_VAR, Some(config_dir.as_str())),
                ("LIBRARY_PAGE_SIZE", Some("5")),
                ("LIBRARY_CATALOG_URL", Some("http://localhost:9000/api/v1")),
            ],
            Config::parse,
        )
        .unwrap();

        assert_eq!(config.library.page_size.get(), 5);
        assert_eq!(config.library.catalog_url, "http://localhost:9000/api/v1");
    }

    #[test]
    #[serial]
    fn zero_page_size_is_rejected() {
        let result = with_isolated_env(&[("LIBRARY_PAGE_SIZE", Some("0"))], Config::parse);
        assert!(result.is_err());
    }
}
