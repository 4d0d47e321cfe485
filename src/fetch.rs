//! Fetches raw page markup over HTTP.

use std::time::Duration;

use reqwest::Client;
use url::Url;

use crate::types::SearchError;

/// Browser-style agent; some sites refuse obviously non-browser clients.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Thin HTTP wrapper around [`reqwest::Client`].
///
/// All network-level failures (DNS, timeout, non-2xx) surface as the single
/// [`SearchError::Fetch`] kind. The client is cheap to clone.
#[derive(Clone, Debug)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new() -> Result<Self, SearchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|err| SearchError::Internal(format!("failed to build HTTP client: {err}")))?;
        Ok(Self { client })
    }

    pub async fn fetch(&self, url: &Url) -> Result<String, SearchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|err| SearchError::Fetch(err.to_string()))?
            .error_for_status()
            .map_err(|err| SearchError::Fetch(err.to_string()))?;
        response
            .text()
            .await
            .map_err(|err| SearchError::Fetch(err.to_string()))
    }
}
