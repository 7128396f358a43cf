//! HTTP registry backend speaking the npm registry protocol.

use reqwest::blocking::Client;
use reqwest::StatusCode;
use tracing::debug;

use crate::client::{RegistryBackend, TarballStream};
use crate::error::{RegistryError, Result};
use crate::metadata::PackageMetadata;
use crate::name::{registry_path, validate_name};

/// Public npm registry.
pub const DEFAULT_REGISTRY: &str = "https://registry.npmjs.org";

/// Registry reached over HTTP(S).
pub struct HttpRegistry {
    /// Base URL of the registry, without trailing slash.
    base_url: String,
    client: Client,
}

impl HttpRegistry {
    /// Create a client for the registry at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .user_agent(concat!("tarn/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RegistryError::network(&base_url, e))?;
        Ok(Self { base_url, client })
    }

    /// Base URL requests are made against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of the metadata document for `name`.
    pub fn metadata_url(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, registry_path(name))
    }
}

impl RegistryBackend for HttpRegistry {
    fn fetch_metadata(&self, name: &str) -> Result<PackageMetadata> {
        validate_name(name)?;
        let url = self.metadata_url(name);
        debug!("GET {url}");

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .map_err(|e| RegistryError::network(&url, e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound {
                name: name.to_string(),
            });
        }
        if !status.is_success() {
            return Err(RegistryError::network(&url, format!("HTTP {status}")));
        }

        let body = response
            .text()
            .map_err(|e| RegistryError::network(&url, e))?;
        PackageMetadata::from_json(name, &body)
    }

    fn open_tarball(&self, url: &str) -> Result<TarballStream> {
        debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| RegistryError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::network(url, format!("HTTP {status}")));
        }
        Ok(Box::new(response))
    }
}
