//! drivegate-auth: per-path authorization.
//!
//! Folders listed as protected routes hold a marker file whose content is
//! the route's secret. Callers unlock the route by presenting the SHA-256
//! of that secret, in the `od-protected-token` header or the `odpt` query
//! parameter.

pub mod credential;
pub mod gate;
pub mod hash;
pub mod routes;
pub mod verdict;

pub use credential::{caller_credential, CredentialCarrier, CredentialSource, PROTECTED_TOKEN_HEADER, PROTECTED_TOKEN_QUERY};
pub use gate::{AuthorizationGate, DEFAULT_MARKER_FILE};
pub use hash::{hash_token, verify_token};
pub use routes::ProtectedRoutes;
pub use verdict::AccessVerdict;
