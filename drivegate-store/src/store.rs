use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use drivegate_core::AccessToken;
use futures_core::Stream;
use futures_util::StreamExt;
use http::{HeaderMap, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use crate::StoreResult;

/// Stream of bytes for file content
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Field carrying the pre-signed download URL in Graph answers
pub const DOWNLOAD_URL_FIELD: &str = "@microsoft.graph.downloadUrl";

/// Fields requested for a file lookup.
///
/// Exactly this set: some regional Graph deployments omit the download URL
/// for any other selection.
pub const METADATA_FIELDS: &[&str] = &["id", "size", DOWNLOAD_URL_FIELD];

/// Storage operations the gateway needs - implemented by every drive backend
#[async_trait]
pub trait DriveStore: Send + Sync {
    /// Path-addressed item lookup selecting exactly `fields`
    async fn item(&self, path: &str, token: &AccessToken, fields: &[&str]) -> StoreResult<DriveItem>;

    /// Open a streaming read of a pre-signed download URL
    async fn open(&self, url: &str) -> StoreResult<Download>;

    /// Read a (small) download completely as text
    async fn read_text(&self, url: &str) -> StoreResult<String> {
        let mut stream = self.open(url).await?.stream;
        let mut buf = Vec::new();
        while let Some(chunk) = stream.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// A drive item as returned by a `select`ed lookup
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DriveItem {
    pub id: Option<String>,
    pub size: Option<u64>,
    #[serde(rename = "@microsoft.graph.downloadUrl")]
    pub download_url: Option<String>,
    pub file: Option<Value>,
}

/// An open download: upstream status and headers plus the body stream.
///
/// Dropping it releases the upstream connection.
pub struct Download {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub stream: ByteStream,
}

impl std::fmt::Debug for Download {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Download")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}
