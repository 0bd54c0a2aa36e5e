//! Microsoft Graph drive backend.
//!
//! Items are addressed by path (`{drive}/root:{encoded path}`) with a
//! bearer token; downloads go to the pre-signed URL Graph hands out and
//! need no credentials.

use async_trait::async_trait;
use drivegate_core::path::normalize;
use drivegate_core::AccessToken;
use futures_util::TryStreamExt;
use tracing::debug;

use crate::{Download, DriveItem, DriveStore, StoreConfig, StoreError, StoreResult};

/// `DriveStore` over the Graph REST API
#[derive(Debug, Clone)]
pub struct GraphDriveStore {
    client: reqwest::Client,
    config: StoreConfig,
}

impl GraphDriveStore {
    pub fn new(config: StoreConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Share a client (connection pool) with the rest of the process
    pub fn with_client(client: reqwest::Client, config: StoreConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Item endpoint for `path` under the configured base directory
    pub fn item_url(&self, path: &str) -> String {
        format!(
            "{}/root{}",
            self.config.drive_api,
            encode_item_path(&self.config.base_directory, path)
        )
    }

    async fn checked(response: reqwest::Response) -> StoreResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.bytes().await.map_err(StoreError::backend)?;
        Err(StoreError::status(status.as_u16(), &body))
    }
}

/// `:` followed by the percent-encoded joined path, or nothing for the drive root
pub fn encode_item_path(base_directory: &str, path: &str) -> String {
    let joined = normalize(&format!("{}/{}", base_directory, path));
    if joined == "/" {
        return String::new();
    }
    format!(":{}", urlencoding::encode(&joined))
}

#[async_trait]
impl DriveStore for GraphDriveStore {
    async fn item(&self, path: &str, token: &AccessToken, fields: &[&str]) -> StoreResult<DriveItem> {
        let url = self.item_url(path);
        debug!(%url, "drive item lookup");

        let response = self
            .client
            .get(&url)
            .bearer_auth(token.secret())
            .query(&[("select", fields.join(","))])
            .send()
            .await
            .map_err(StoreError::backend)?;

        Self::checked(response)
            .await?
            .json::<DriveItem>()
            .await
            .map_err(StoreError::backend)
    }

    async fn open(&self, url: &str) -> StoreResult<Download> {
        let response = self.client.get(url).send().await.map_err(StoreError::backend)?;
        let response = Self::checked(response).await?;

        let status = response.status();
        let headers = response.headers().clone();
        let stream = response.bytes_stream().map_err(std::io::Error::other);

        Ok(Download {
            status,
            headers,
            stream: Box::pin(stream),
        })
    }
}
