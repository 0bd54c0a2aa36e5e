use std::collections::HashMap;

use axum::http::HeaderMap;
use drivegate_auth::{CredentialCarrier, PROTECTED_TOKEN_HEADER, PROTECTED_TOKEN_QUERY};

pub const REQUEST_MODE_PARAM: &str = "requestMode";
pub const HASH_PARAM: &str = "hash";
pub const PROXY_PARAM: &str = "proxy";

/// Everything the file access endpoint reads from a request.
#[derive(Debug, Clone, Default)]
pub struct FileAccessParams {
    pub request_mode: Option<String>,
    pub hash: Option<String>,
    pub proxy: bool,
    pub protected_token: Option<String>,
    pub odpt: Option<String>,
}

impl FileAccessParams {
    pub fn from_parts(headers: &HeaderMap, mut query: HashMap<String, String>) -> Self {
        let protected_token = headers
            .get(PROTECTED_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        Self {
            request_mode: query.remove(REQUEST_MODE_PARAM),
            hash: query.remove(HASH_PARAM),
            proxy: query.get(PROXY_PARAM).is_some_and(|v| parse_flag(v)),
            protected_token,
            odpt: query.remove(PROTECTED_TOKEN_QUERY),
        }
    }
}

// A present but empty header still counts as the credential.
impl CredentialCarrier for FileAccessParams {
    fn header(&self, name: &str) -> Option<&str> {
        (name == PROTECTED_TOKEN_HEADER)
            .then_some(self.protected_token.as_deref())
            .flatten()
    }

    fn query(&self, name: &str) -> Option<&str> {
        (name == PROTECTED_TOKEN_QUERY)
            .then_some(self.odpt.as_deref())
            .flatten()
    }
}

/// `true`, `1`, `yes` and `on` (any case); everything else is off.
pub fn parse_flag(value: &str) -> bool {
    ["true", "1", "yes", "on"]
        .iter()
        .any(|yes| value.trim().eq_ignore_ascii_case(yes))
}
