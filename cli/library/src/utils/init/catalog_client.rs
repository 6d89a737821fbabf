use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use library_catalog::{CatalogClient, CatalogClientConfig, Client, MockClient};
use tracing::debug;

use crate::config::Config;

/// Path to a JSON file of canned responses.
/// When set, commands run against a [MockClient] instead of the service.
pub const LIBRARY_CATALOG_MOCK_VAR: &str = "LIBRARY_CATALOG_MOCK";

/// Initialize the catalog client
///
/// - Initialize a mock client if `LIBRARY_CATALOG_MOCK` points to mock data
/// - Initialize a real client otherwise
pub fn init_catalog_client(config: &Config) -> Result<Client> {
    if let Ok(path_str) = std::env::var(LIBRARY_CATALOG_MOCK_VAR) {
        let path = PathBuf::from(path_str);
        if !path.exists() {
            bail!("path to mock data file doesn't exist: {}", path.display());
        }

        debug!(mock_data_path = %path.display(), "using mock catalog client");
        let client = MockClient::from_file(&path)
            .with_context(|| format!("could not load mock data from {}", path.display()))?;
        return Ok(client.into());
    }

    let client_config = CatalogClientConfig {
        catalog_url: config.library.catalog_url.clone(),
        extra_headers: config.library.extra_headers.clone(),
        user_agent: None,
        connect_timeout: Duration::from_secs(config.library.connect_timeout_secs),
        request_timeout: Duration::from_secs(config.library.request_timeout_secs),
    };

    debug!(catalog_url = %client_config.catalog_url, "using catalog client");
    let client = CatalogClient::new(client_config).context("could not create catalog client")?;
    Ok(client.into())
}
