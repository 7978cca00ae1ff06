use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, error};

use crate::cli::config::ScraperConfig;
use crate::error::{FetchError, ScrapeError};
use crate::identity::IdentityPool;

/// A successfully fetched document
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub status: StatusCode,
    pub body: String,
}

/// Connection context shared by every request of a run
///
/// Built once at startup with a random default identity; each request then
/// overrides the identity with a fresh pick from the pool.
pub struct HttpSession {
    /// HTTP client with cookie store
    client: Client,

    /// Identities rotated per request
    identities: IdentityPool,
}

impl HttpSession {
    /// Create a new session
    pub fn new(identities: IdentityPool, connect_timeout: Option<Duration>) -> Result<Self, ScrapeError> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .default_headers(identities.random_headers());

        if let Some(timeout) = connect_timeout {
            builder = builder.connect_timeout(timeout);
        }

        let client = builder.build().map_err(ScrapeError::Client)?;
        debug!("HTTP session ready with {} identities", identities.identity_count());

        Ok(Self { client, identities })
    }

    /// Create a session from the loaded configuration
    pub fn from_config(config: &ScraperConfig) -> Result<Self, ScrapeError> {
        Self::new(
            IdentityPool::new(config.identity.user_agents.clone()),
            config.download.connect_timeout_secs.map(Duration::from_secs),
        )
    }

    /// Issue a GET with a random identity and require a success status
    pub async fn get(&self, url: &str) -> Result<Response, FetchError> {
        debug!("GET {}", url);
        let response = self.client
            .get(url)
            .headers(self.identities.random_headers())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        Ok(response)
    }

    /// Fetch a document, returning the error to the caller
    pub async fn try_fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let response = self.get(url).await?;
        let status = response.status();
        let body = response.text().await?;

        Ok(FetchedPage {
            url: url.to_string(),
            status,
            body,
        })
    }

    /// Fetch a document, logging any failure and returning `None`
    pub async fn fetch(&self, url: &str) -> Option<FetchedPage> {
        match self.try_fetch(url).await {
            Ok(page) => Some(page),
            Err(e) => {
                error!("Request to {} failed: {}", url, e);
                None
            }
        }
    }
}
