//! Path codec: turns the opaque `hash` token of a file link into a
//! canonical absolute path.
//!
//! The token is the standard base64 of the path's UTF-8 bytes. Decoding
//! runs three steps, each with its own failure:
//!
//! ```text
//! token --unwrap_base64--> bytes --escape_bytes--> "%2f%64..." --unescape_text--> "/docs/a.pdf"
//! ```
//!
//! and the result is then POSIX-normalized against `/`.

use std::fmt;

use base64::alphabet;
use base64::engine::general_purpose::STANDARD;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use thiserror::Error;

use crate::errors::GateError;

/// Value an unresolved catch-all route parameter degrades to.
pub const PATH_PLACEHOLDER: &str = "[...path]";

// Browsers' atob(): padding optional, trailing bits ignored.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

#[derive(Debug, Error)]
pub enum PathError {
    #[error("no hash specified")]
    Missing,

    #[error("hash is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("hash does not decode to UTF-8 text")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("hash decodes to an unusable path")]
    InvalidPath,
}

impl PathError {
    /// The token could not be turned into text at all.
    pub fn is_decode_error(&self) -> bool {
        matches!(self, PathError::Base64(_) | PathError::Utf8(_))
    }

    pub fn client_message(&self) -> &'static str {
        match self {
            PathError::Missing => "No hash specified.",
            _ => "Hash query invalid.",
        }
    }
}

impl From<PathError> for GateError {
    fn from(err: PathError) -> Self {
        GateError::bad_request(err.client_message()).with_source(err.into())
    }
}

/// An absolute, normalized POSIX path. Always starts with `/` and never
/// contains `.` or `..` segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedPath(String);

impl ResolvedPath {
    /// Normalize `raw` against the root.
    pub fn new(raw: &str) -> Self {
        Self(normalize(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ResolvedPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResolvedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Step 1: standard base64 to raw bytes.
///
/// Query-string decoding turns an unescaped `+` into a space, so spaces are
/// read back as `+`; other ASCII whitespace is skipped.
pub fn unwrap_base64(token: &str) -> Result<Vec<u8>, PathError> {
    let cleaned: String = token
        .chars()
        .filter(|c| !matches!(c, '\t' | '\n' | '\r' | '\x0c'))
        .map(|c| if c == ' ' { '+' } else { c })
        .collect();
    Ok(LENIENT.decode(cleaned)?)
}

/// Step 2: every byte as a `%xx` escape.
pub fn escape_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for b in bytes {
        out.push_str(&format!("%{:02x}", b));
    }
    out
}

/// Step 3: percent escapes back to text; fails on invalid UTF-8.
pub fn unescape_text(escaped: &str) -> Result<String, PathError> {
    Ok(urlencoding::decode(escaped)?.into_owned())
}

/// Resolve `path` against `/`, dropping empty and `.` segments and
/// applying `..` (which never climbs above the root).
pub fn normalize(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    format!("/{}", segments.join("/"))
}

/// Decode a link token into the path it addresses.
pub fn decode(token: &str) -> Result<ResolvedPath, PathError> {
    let token = token.trim();
    if token.is_empty() || token == PATH_PLACEHOLDER {
        return Err(PathError::Missing);
    }

    let bytes = unwrap_base64(token)?;
    let text = unescape_text(&escape_bytes(&bytes))?;

    if text == PATH_PLACEHOLDER {
        return Err(PathError::Missing);
    }
    if text.chars().any(char::is_control) {
        return Err(PathError::InvalidPath);
    }

    Ok(ResolvedPath::new(&text))
}

/// Build the token for `path`; inverse of [`decode`] up to normalization.
pub fn encode(path: &str) -> String {
    STANDARD.encode(path.as_bytes())
}
