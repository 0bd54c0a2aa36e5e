use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use drivegate_core::delivery::NO_CACHE;
use drivegate_core::errors::{ErrorKind, GateError, INTERNAL_ERROR_MESSAGE};

/// A failed request, rendered as `{ "error": ..., "homepage": ... }`.
#[derive(Debug)]
pub struct GateAxumError {
    pub error: anyhow::Error,
    pub homepage: Option<Arc<str>>,
    /// Adds `Cache-Control: no-cache` (failures after a protected route
    /// granted access).
    pub no_cache: bool,
}

impl GateAxumError {
    pub fn new(error: anyhow::Error, homepage: Option<Arc<str>>) -> Self {
        Self {
            error,
            homepage,
            no_cache: false,
        }
    }

    pub fn with_no_cache(mut self, no_cache: bool) -> Self {
        self.no_cache = no_cache;
        self
    }
}

impl From<anyhow::Error> for GateAxumError {
    fn from(e: anyhow::Error) -> Self {
        Self::new(e, None)
    }
}

impl IntoResponse for GateAxumError {
    fn into_response(self) -> Response {
        // A GateError anywhere in the chain keeps its status and message
        let safe = match self.error.chain().find_map(|e| e.downcast_ref::<GateError>()) {
            Some(gate) => gate.sanitize_for_client(),
            None => GateError::new(ErrorKind::Upstream, INTERNAL_ERROR_MESSAGE),
        };

        let status = StatusCode::from_u16(safe.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut res = (status, Json(safe.to_json(self.homepage.as_deref()))).into_response();
        if self.no_cache {
            res.headers_mut()
                .insert(header::CACHE_CONTROL, HeaderValue::from_static(NO_CACHE));
        }
        res
    }
}
