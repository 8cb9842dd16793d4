use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::Config;
use crate::constants::USER_AGENT;
use crate::error::{EmbedError, Result};
use crate::forum::models::{Group, GroupsResponse, TopicsResponse};

/// Authenticated, read-only client for the forum's JSON endpoints.
///
/// Each call is a single attempt; retrying is left to the caller.
#[derive(Debug, Clone)]
pub struct ForumClient {
    client: reqwest::Client,
    base_url: Option<String>,
    api_key: Option<String>,
    api_username: Option<String>,
}

impl ForumClient {
    /// Create a client from the forum settings in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| EmbedError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            api_username: config.api_username.clone(),
        })
    }

    /// The configured forum URL, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// GET `path` under the forum URL and decode the JSON body.
    ///
    /// # Errors
    ///
    /// - [`EmbedError::Configuration`] if the URL or credentials are missing,
    ///   or `path` is not absolute.
    /// - [`EmbedError::Network`] on transport failure or a non-2xx status.
    /// - [`EmbedError::Parse`] if the body is not the expected JSON.
    pub async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let (base_url, headers) = self.credentials()?;
        if !path.starts_with('/') {
            return Err(EmbedError::Configuration(format!(
                "request path must be absolute, got '{path}'"
            )));
        }
        let url = format!("{base_url}{path}");

        debug!(url = %url, "Fetching from forum");

        let response = self
            .client
            .get(&url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| EmbedError::network(&url, e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| EmbedError::network(&url, format!("failed to read body: {e}")))?;

        if !status.is_success() {
            return Err(EmbedError::from_status(&url, status, &body));
        }

        serde_json::from_str(&body).map_err(|source| EmbedError::Parse { url, source })
    }

    /// Fetch every group and drop the automatic (system-managed) ones.
    ///
    /// # Errors
    ///
    /// See [`ForumClient::fetch`].
    pub async fn fetch_groups(&self) -> Result<Vec<Group>> {
        let response: GroupsResponse = self.fetch("/groups.json").await?;
        let total = response.groups.len();
        let groups: Vec<Group> = response
            .groups
            .into_iter()
            .filter(|group| !group.automatic)
            .collect();
        debug!(total, non_automatic = groups.len(), "Fetched groups");
        Ok(groups)
    }

    /// Fetch a topic listing such as `/latest.json`.
    ///
    /// # Errors
    ///
    /// See [`ForumClient::fetch`].
    pub async fn fetch_topics(&self, path: &str) -> Result<TopicsResponse> {
        self.fetch(path).await
    }

    fn credentials(&self) -> Result<(&str, HeaderMap)> {
        let base_url = self
            .base_url
            .as_deref()
            .ok_or_else(|| EmbedError::Configuration("forum URL is not set".to_string()))?;
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| EmbedError::Configuration("API key is not set".to_string()))?;
        let api_username = self
            .api_username
            .as_deref()
            .ok_or_else(|| EmbedError::Configuration("API username is not set".to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert("api-key", header_value("Api-Key", api_key)?);
        headers.insert("api-username", header_value("Api-Username", api_username)?);
        Ok((base_url, headers))
    }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| EmbedError::Configuration(format!("{name} contains invalid header characters")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_credentials_is_configuration_error() {
        let client = ForumClient::new(&Config::default()).unwrap();
        let err = client.fetch_groups().await.unwrap_err();
        assert!(matches!(err, EmbedError::Configuration(_)));

        let config = Config {
            api_key: None,
            ..Config::for_forum("https://forum.example.com")
        };
        let client = ForumClient::new(&config).unwrap();
        let err = client.fetch_groups().await.unwrap_err();
        assert!(err.to_string().contains("API key"));
    }

    #[tokio::test]
    async fn test_relative_path_rejected() {
        let client = ForumClient::new(&Config::for_forum("https://forum.example.com")).unwrap();
        let err = client.fetch_topics("latest.json").await.unwrap_err();
        assert!(matches!(err, EmbedError::Configuration(_)));
    }
}
