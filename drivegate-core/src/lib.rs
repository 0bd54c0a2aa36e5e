//! drivegate-core: transport-agnostic core for drivegate.
//!
//! Pure pieces of the file access pipeline: decoding link tokens into
//! paths, choosing between proxy and redirect, and the error and
//! configuration types every other crate shares.

pub mod config;
pub mod delivery;
pub mod errors;
pub mod path;
pub mod token;

pub use config::{GateConfig, GateConfigSnapshot};
pub use delivery::{decide, Delivery, DeliveryMode, FileMetadata, PROXY_SIZE_LIMIT};
pub use errors::{ErrorKind, GateError, GateResult};
pub use path::{PathError, ResolvedPath};
pub use token::AccessToken;

/// `requestMode` value identifying a file access request.
pub const FILE_ACCESS_MODE: &str = "fileAccess";
