//! Fetches the published plan document over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{error, info};

use crate::config::CheckConfig;
use crate::contract::{Downloader, RawDocument};
use crate::error::{body_snippet, ConfigError, DownloadError};

/// How long one plan fetch may take before it is abandoned.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Downloads the plan from a basic-auth protected URL.
pub struct HttpDownloader {
    client: Client,
    url: String,
    username: String,
    password: String,
}

impl HttpDownloader {
    /// Builds a downloader from the resolved configuration.
    ///
    /// Fails before any network access when the locator or either
    /// credential is blank.
    pub fn new(config: &CheckConfig) -> Result<Self, ConfigError> {
        let mut missing = Vec::new();
        if config.plan_url.trim().is_empty() {
            missing.push("PDF_URL".to_string());
        }
        if config.auth_username.trim().is_empty() {
            missing.push("AUTH_USERNAME".to_string());
        }
        if config.auth_password.trim().is_empty() {
            missing.push("AUTH_PASSWORD".to_string());
        }
        if !missing.is_empty() {
            error!(missing = ?missing, "downloader is not configured");
            return Err(ConfigError { missing });
        }

        Ok(Self {
            client: Client::new(),
            url: config.plan_url.clone(),
            username: config.auth_username.clone(),
            password: config.auth_password.clone(),
        })
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self) -> Result<RawDocument, DownloadError> {
        info!(url = %self.url, "fetching plan document");

        let response = self
            .client
            .get(&self.url)
            .basic_auth(&self.username, Some(&self.password))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !plan_available(status) {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<Failed to decode response body>"));
            error!(status = %status, "plan server did not return the plan");
            return Err(DownloadError::Status {
                status: status.as_u16(),
                body_snippet: body_snippet(&body),
            });
        }

        let bytes = response.bytes().await?.to_vec();
        let document = RawDocument::from_bytes(bytes)?;
        info!(
            size_bytes = document.len(),
            artifact = %document.path().display(),
            "plan document stored"
        );
        Ok(document)
    }
}

/// Whether `status` is the answer the server gives for a published
/// plan. The server answers a successful fetch with exactly 200, so
/// every other status, other success codes included, is a failed
/// fetch.
fn plan_available(status: StatusCode) -> bool {
    status == StatusCode::OK
}
