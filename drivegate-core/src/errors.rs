//! # Errors
//!
//! drivegate reports every failure to the caller as a single structured
//! error. Core goals:
//! - one kind per failure class, each with its HTTP status
//! - can be carried through `anyhow::Error` across crate boundaries
//! - transport-agnostic (the server crate decides how to write it out)

use std::fmt;

use anyhow::Error as AnyError;
use serde_json::{json, Value};

/// A convenience result type for drivegate APIs.
pub type GateResult<T> = std::result::Result<T, AnyError>;

/// Message used when an upstream failure carries no body of its own.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error.";

/// Failure classes of the file access pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MissingAccessToken, // 403
    BadRequest,         // 400
    Auth,               // status chosen by the authorization gate
    NotFound,           // 404
    Upstream,           // status passed through from the storage API
}

impl ErrorKind {
    pub fn default_status(&self) -> u16 {
        match self {
            ErrorKind::MissingAccessToken => 403,
            ErrorKind::BadRequest => 400,
            ErrorKind::Auth => 401,
            ErrorKind::NotFound => 404,
            ErrorKind::Upstream => 500,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::MissingAccessToken => "MissingAccessToken",
            ErrorKind::BadRequest => "BadRequest",
            ErrorKind::Auth => "Auth",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Upstream => "Upstream",
        }
    }

    /// Whether the JSON payload advertises the site homepage.
    ///
    /// Gate verdicts and upstream passthrough carry only what they were given.
    pub fn links_homepage(&self) -> bool {
        !matches!(self, ErrorKind::Auth | ErrorKind::Upstream)
    }
}

/// A structured drivegate error that can live inside `anyhow::Error`.
#[derive(Debug)]
pub struct GateError {
    pub kind: ErrorKind,
    pub code: u16,
    pub message: String,
    /// Upstream payload, forwarded verbatim for `Upstream` errors.
    pub body: Option<Value>,
    pub source: Option<AnyError>,
}

impl GateError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: kind.default_status(),
            message: message.into(),
            body: None,
            source: None,
        }
    }

    pub fn with_code(mut self, code: u16) -> Self {
        self.code = code;
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_source(mut self, source: AnyError) -> Self {
        self.source = Some(source);
        self
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Convert into `anyhow::Error` so it can cross `?` boundaries.
    pub fn into_anyhow(self) -> AnyError {
        AnyError::new(self)
    }

    /// Downcast an `anyhow::Error` to a `GateError` if possible.
    pub fn from_anyhow(err: &AnyError) -> Option<&GateError> {
        err.downcast_ref::<GateError>()
    }

    /// Turn any error into a GateError:
    /// - if it's already a GateError, keep it (lossless)
    /// - otherwise wrap as a 500 upstream failure
    pub fn normalize(err: AnyError) -> GateError {
        match err.downcast::<GateError>() {
            Ok(gate) => gate,
            Err(other) => GateError::new(ErrorKind::Upstream, INTERNAL_ERROR_MESSAGE).with_source(other),
        }
    }

    /// A copy suitable for returning to clients (drops the inner `source`).
    pub fn sanitize_for_client(&self) -> GateError {
        GateError {
            kind: self.kind,
            code: self.code,
            message: self.message.clone(),
            body: self.body.clone(),
            source: None,
        }
    }

    // ---- Constructors ----

    pub fn missing_access_token(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::MissingAccessToken, msg)
    }
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, msg)
    }
    pub fn auth(code: u16, msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Auth, msg).with_code(code)
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, msg)
    }

    /// Upstream failure; `status` defaults to 500 when the call never got an answer.
    pub fn upstream(status: Option<u16>, body: Option<Value>) -> Self {
        let mut err = Self::new(ErrorKind::Upstream, INTERNAL_ERROR_MESSAGE)
            .with_code(status.unwrap_or(500));
        err.body = body;
        err
    }

    /// Client payload: `{ "error": ..., "homepage": ... }`.
    pub fn to_json(&self, homepage: Option<&str>) -> Value {
        let error = match (&self.kind, &self.body) {
            (ErrorKind::Upstream, Some(body)) => body.clone(),
            _ => Value::String(self.message.clone()),
        };

        let mut out = json!({ "error": error });
        if let Some(home) = homepage.filter(|_| self.kind.links_homepage()) {
            out["homepage"] = Value::String(home.to_string());
        }
        out
    }
}

impl fmt::Display for GateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.code(), self.message)
    }
}

impl std::error::Error for GateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| &**e as &(dyn std::error::Error + 'static))
    }
}

/// Convenience helper for "bail with GateError".
#[macro_export]
macro_rules! bail_gate {
    ($ctor:ident, $msg:expr) => {
        return Err($crate::errors::GateError::$ctor($msg).into_anyhow());
    };
    ($ctor:ident, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::errors::GateError::$ctor(format!($fmt, $($arg)*)).into_anyhow());
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_request_links_homepage() {
        let err = GateError::bad_request("No hash specified.");
        assert_eq!(err.code(), 400);
        let body = err.to_json(Some("https://example.com"));
        assert_eq!(body["error"], "No hash specified.");
        assert_eq!(body["homepage"], "https://example.com");
    }

    #[test]
    fn homepage_is_omitted_when_not_configured() {
        let body = GateError::not_found("gone").to_json(None);
        assert!(body.get("homepage").is_none());
    }

    #[test]
    fn upstream_passthrough_keeps_status_and_body() {
        let payload = json!({"error": {"code": "itemNotFound"}});
        let err = GateError::upstream(Some(404), Some(payload.clone()));
        assert_eq!(err.code(), 404);

        let body = err.to_json(Some("https://example.com"));
        assert_eq!(body["error"], payload);
        assert!(body.get("homepage").is_none());
    }

    #[test]
    fn upstream_without_answer_is_generic_500() {
        let err = GateError::upstream(None, None);
        assert_eq!(err.code(), 500);
        assert_eq!(err.to_json(None)["error"], INTERNAL_ERROR_MESSAGE);
    }

    #[test]
    fn auth_verdict_carries_only_its_message() {
        let body = GateError::auth(401, "Password required.").to_json(Some("https://example.com"));
        assert_eq!(body, json!({"error": "Password required."}));
    }

    #[test]
    fn normalize_keeps_gate_errors_and_wraps_others() {
        let kept = GateError::normalize(GateError::not_found("x").into_anyhow());
        assert_eq!(kept.kind, ErrorKind::NotFound);

        let wrapped = GateError::normalize(anyhow::anyhow!("boom"));
        assert_eq!(wrapped.kind, ErrorKind::Upstream);
        assert_eq!(wrapped.code(), 500);
        assert!(wrapped.sanitize_for_client().source.is_none());
    }
}
