use std::sync::Arc;

use drivegate_core::{AccessToken, FileMetadata, GateError, GateResult, ResolvedPath};
use tracing::debug;

use crate::{DriveStore, METADATA_FIELDS};

/// Returned when a path resolves to something without a download URL
/// (a folder, or a stale reference).
pub const NOT_FOUND_MESSAGE: &str = "Hash broken, try again!";

/// Looks up file metadata for a resolved path
pub struct MetadataResolver {
    store: Arc<dyn DriveStore>,
}

impl MetadataResolver {
    pub fn new(store: Arc<dyn DriveStore>) -> Self {
        Self { store }
    }

    /// One authenticated lookup of `{id, size, downloadUrl}`; never cached.
    pub async fn resolve(&self, path: &ResolvedPath, token: &AccessToken) -> GateResult<FileMetadata> {
        let item = self
            .store
            .item(path.as_str(), token, METADATA_FIELDS)
            .await
            .map_err(|e| GateError::from(e).into_anyhow())?;

        let Some(download_url) = item.download_url else {
            debug!(%path, "item has no download url");
            return Err(GateError::not_found(NOT_FOUND_MESSAGE).into_anyhow());
        };

        Ok(FileMetadata {
            id: item.id,
            size: item.size,
            download_url,
        })
    }
}
