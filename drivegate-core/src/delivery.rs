//! Proxy-or-redirect decision for a resolved file.

use serde::{Deserialize, Serialize};

/// Files below this size may be streamed through the gateway (4 MiB).
pub const PROXY_SIZE_LIMIT: u64 = 4 * 1024 * 1024;

/// Default `Cache-Control` for proxied content.
pub const DEFAULT_CACHE_CONTROL: &str = "max-age=0, s-maxage=60, stale-while-revalidate";

/// `Cache-Control` for content behind a protected route.
pub const NO_CACHE: &str = "no-cache";

/// Metadata of a downloadable file, fresh for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub id: Option<String>,
    pub size: Option<u64>,
    pub download_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    Redirect,
    Proxy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub mode: DeliveryMode,
    /// The upstream download URL, either redirected to or streamed from.
    pub target: String,
}

/// Proxy iff the caller asked for it and the size is known and below
/// `threshold` (exclusive).
pub fn decide(meta: &FileMetadata, proxy_requested: bool, threshold: u64) -> Delivery {
    let small = meta.size.is_some_and(|size| size < threshold);
    let mode = if proxy_requested && small {
        DeliveryMode::Proxy
    } else {
        DeliveryMode::Redirect
    };

    Delivery {
        mode,
        target: meta.download_url.clone(),
    }
}

/// The `Cache-Control` value a successful delivery carries, if any.
///
/// Protected content is never cacheable, whatever the mode. Otherwise only
/// proxied responses get the policy; redirects keep upstream semantics.
pub fn cache_control<'a>(mode: DeliveryMode, protected: bool, policy: &'a str) -> Option<&'a str> {
    if protected {
        return Some(NO_CACHE);
    }
    match mode {
        DeliveryMode::Proxy => Some(policy),
        DeliveryMode::Redirect => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(size: Option<u64>) -> FileMetadata {
        FileMetadata {
            id: Some("01ABC".to_string()),
            size,
            download_url: "https://cdn.example.com/d/1".to_string(),
        }
    }

    #[test]
    fn proxies_small_files_on_request() {
        let d = decide(&meta(Some(1000)), true, PROXY_SIZE_LIMIT);
        assert_eq!(d.mode, DeliveryMode::Proxy);
        assert_eq!(d.target, "https://cdn.example.com/d/1");
    }

    #[test]
    fn threshold_is_exclusive() {
        assert_eq!(decide(&meta(Some(PROXY_SIZE_LIMIT - 1)), true, PROXY_SIZE_LIMIT).mode, DeliveryMode::Proxy);
        assert_eq!(decide(&meta(Some(PROXY_SIZE_LIMIT)), true, PROXY_SIZE_LIMIT).mode, DeliveryMode::Redirect);
    }

    #[test]
    fn redirects_without_proxy_flag_or_size() {
        assert_eq!(decide(&meta(Some(10)), false, PROXY_SIZE_LIMIT).mode, DeliveryMode::Redirect);
        assert_eq!(decide(&meta(None), true, PROXY_SIZE_LIMIT).mode, DeliveryMode::Redirect);
    }

    #[test]
    fn no_cache_wins_for_protected_content() {
        assert_eq!(cache_control(DeliveryMode::Proxy, true, DEFAULT_CACHE_CONTROL), Some(NO_CACHE));
        assert_eq!(cache_control(DeliveryMode::Redirect, true, DEFAULT_CACHE_CONTROL), Some(NO_CACHE));
        assert_eq!(cache_control(DeliveryMode::Proxy, false, "max-age=5"), Some("max-age=5"));
        assert_eq!(cache_control(DeliveryMode::Redirect, false, DEFAULT_CACHE_CONTROL), None);
    }
}
