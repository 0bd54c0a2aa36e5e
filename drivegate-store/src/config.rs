/// Default Microsoft Graph endpoint for the signed-in user's drive
pub const DEFAULT_DRIVE_API: &str = "https://graph.microsoft.com/v1.0/me/drive";

/// Configuration for the Graph-backed store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Drive endpoint, without trailing slash
    pub drive_api: String,

    /// Directory every resolved path is joined under
    pub base_directory: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            drive_api: DEFAULT_DRIVE_API.to_string(),
            base_directory: "/".to_string(),
        }
    }
}

impl StoreConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the drive endpoint
    pub fn with_drive_api<S: Into<String>>(mut self, api: S) -> Self {
        self.drive_api = api.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the base directory
    pub fn with_base_directory<S: Into<String>>(mut self, dir: S) -> Self {
        self.base_directory = dir.into();
        self
    }
}
