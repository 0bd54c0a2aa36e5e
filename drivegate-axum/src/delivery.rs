// Turns a delivery decision into an HTTP response.

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use drivegate_core::delivery::{cache_control, DEFAULT_CACHE_CONTROL};
use drivegate_core::{Delivery, DeliveryMode, GateError, GateResult, PROXY_SIZE_LIMIT};
use drivegate_store::DriveStore;

/// Headers that describe one connection and are never forwarded.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Proxy threshold and caching policy for successful deliveries.
#[derive(Debug, Clone)]
pub struct DeliveryPolicy {
    /// `Cache-Control` put on proxied responses of unprotected files.
    pub cache_control: String,
    /// Files at or above this size are always redirected.
    pub proxy_threshold: u64,
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self {
            cache_control: DEFAULT_CACHE_CONTROL.to_string(),
            proxy_threshold: PROXY_SIZE_LIMIT,
        }
    }
}

impl DeliveryPolicy {
    pub fn with_cache_control(mut self, value: impl Into<String>) -> Self {
        self.cache_control = value.into();
        self
    }

    pub fn with_proxy_threshold(mut self, bytes: u64) -> Self {
        self.proxy_threshold = bytes;
        self
    }
}

pub async fn deliver(
    store: &dyn DriveStore,
    delivery: &Delivery,
    protected: bool,
    policy: &DeliveryPolicy,
) -> GateResult<Response> {
    let cache = cache_control(delivery.mode, protected, &policy.cache_control)
        .map(header_value)
        .transpose()?;

    match delivery.mode {
        DeliveryMode::Redirect => {
            let mut headers = HeaderMap::new();
            headers.insert(header::LOCATION, header_value(&delivery.target)?);
            if let Some(cache) = cache {
                headers.insert(header::CACHE_CONTROL, cache);
            }
            Ok((StatusCode::FOUND, headers).into_response())
        }
        DeliveryMode::Proxy => {
            let download = store
                .open(&delivery.target)
                .await
                .map_err(|e| GateError::from(e).into_anyhow())?;

            let mut headers = forwarded_headers(&download.headers);
            if let Some(cache) = cache {
                headers.insert(header::CACHE_CONTROL, cache);
            }

            // Dropping the body on disconnect drops the upstream stream with it.
            Ok((download.status, headers, Body::from_stream(download.stream)).into_response())
        }
    }
}

/// Upstream headers minus the hop-by-hop ones.
pub fn forwarded_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(upstream.len());
    for (name, value) in upstream {
        if !is_hop_by_hop(name) {
            out.append(name.clone(), value.clone());
        }
    }
    out
}

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

fn header_value(value: &str) -> GateResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| GateError::upstream(None, None).with_source(e.into()).into_anyhow())
}
