//! HTTP client for the results server

use crate::error::{Error, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use std::future::Future;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Default timeout of a single request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Something that can GET a server path
pub trait Fetcher: Clone + Send + Sync + 'static {
    /// GET `path` (relative to the server root) with an encoded query string
    fn get(&self, path: &str, query: &str) -> impl Future<Output = Result<String>> + Send;
}

/// Results server client
#[derive(Debug, Clone)]
pub struct ServerClient {
    client: reqwest::Client,
    base: Url,
}

impl ServerClient {
    /// Create a client for the server at `base`
    pub fn new(base: &str) -> Result<Self> {
        Self::with_timeout(base, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base: &str, timeout: Duration) -> Result<Self> {
        let mut base = Url::parse(base)?;
        if base.cannot_be_a_base() {
            return Err(Error::ConfigError(format!("Not a server URL: {}", base)));
        }
        // Endpoint paths are joined relative to the base
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/html;q=0.9"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("benchview"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self { client, base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Full URL of a server path plus query
    pub fn url_for(&self, path: &str, query: &str) -> Result<Url> {
        let mut url = self.base.join(path.trim_start_matches('/'))?;
        if !query.is_empty() {
            url.set_query(Some(query));
        }
        Ok(url)
    }
}

impl Fetcher for ServerClient {
    fn get(&self, path: &str, query: &str) -> impl Future<Output = Result<String>> + Send {
        let url = self.url_for(path, query);
        let client = self.client.clone();

        async move {
            let url = url?;
            debug!("GET {}", url);

            let response = client.get(url.clone()).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(Error::ServerError {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
            }

            Ok(response.text().await?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for_joins_relative_to_base() {
        let client = ServerClient::new("http://speed.example.org/codespeed").unwrap();
        assert_eq!(client.base().as_str(), "http://speed.example.org/codespeed/");

        let url = client.url_for("timeline/json/", "exe=1%2C2&ben=grid").unwrap();
        assert_eq!(
            url.as_str(),
            "http://speed.example.org/codespeed/timeline/json/?exe=1%2C2&ben=grid"
        );

        let url = client.url_for("/comparison/json/", "").unwrap();
        assert_eq!(url.as_str(), "http://speed.example.org/codespeed/comparison/json/");
    }

    #[test]
    fn test_rejects_bad_base() {
        assert!(ServerClient::new("not a url").is_err());
        assert!(ServerClient::new("mailto:someone@example.org").is_err());
    }
}
