use drivegate_core::{GateError, GateResult};

pub const PASSWORD_REQUIRED: &str = "Password required.";
pub const AUTHENTICATED: &str = "Authenticated.";

/// Outcome of checking a path against the protected routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessVerdict {
    /// No protected route covers the path; responses may be cached.
    Unprotected,
    /// A protected route covers the path.
    Protected { verified: bool },
}

impl AccessVerdict {
    pub fn is_protected(&self) -> bool {
        matches!(self, AccessVerdict::Protected { .. })
    }

    /// Legacy `{statusCode, message}` view of the verdict.
    pub fn status_code(&self) -> u16 {
        match self {
            AccessVerdict::Protected { verified: false } => 401,
            _ => 200,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            AccessVerdict::Unprotected => "",
            AccessVerdict::Protected { verified: true } => AUTHENTICATED,
            AccessVerdict::Protected { verified: false } => PASSWORD_REQUIRED,
        }
    }

    /// Fail with the verdict's status unless access is granted.
    pub fn require_verified(self) -> GateResult<Self> {
        match self {
            AccessVerdict::Protected { verified: false } => {
                Err(GateError::auth(self.status_code(), self.message()).into_anyhow())
            }
            granted => Ok(granted),
        }
    }
}
