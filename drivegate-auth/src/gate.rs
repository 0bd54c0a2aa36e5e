// Authorization gate.

use std::sync::Arc;

use drivegate_core::errors::INTERNAL_ERROR_MESSAGE;
use drivegate_core::{AccessToken, GateError, GateResult, ResolvedPath};
use drivegate_store::{DriveStore, StoreError, StoreResult, DOWNLOAD_URL_FIELD};
use tracing::{debug, warn};

use crate::hash::verify_token;
use crate::routes::ProtectedRoutes;
use crate::verdict::AccessVerdict;

/// File holding the secret of a protected route, inside the route's folder.
pub const DEFAULT_MARKER_FILE: &str = ".password";

pub const MISSING_MARKER_MESSAGE: &str = "You didn't set a password.";

const MARKER_FIELDS: &[&str] = &[DOWNLOAD_URL_FIELD, "file"];

pub struct AuthorizationGate {
    routes: ProtectedRoutes,
    store: Arc<dyn DriveStore>,
}

impl AuthorizationGate {
    pub fn new(routes: ProtectedRoutes, store: Arc<dyn DriveStore>) -> Self {
        Self { routes, store }
    }

    /// Check `path` against the protected routes and, when one applies,
    /// `credential` against the route's marker file.
    ///
    /// Errors carry the status the caller should see: 404 when the route
    /// has no marker, 500 for any other marker lookup failure.
    pub async fn authorize(
        &self,
        path: &ResolvedPath,
        token: &AccessToken,
        credential: Option<&str>,
    ) -> GateResult<AccessVerdict> {
        let Some(route) = self.routes.matching_route(path) else {
            return Ok(AccessVerdict::Unprotected);
        };

        let marker = format!("{route}{DEFAULT_MARKER_FILE}");
        debug!(%path, %marker, "protected route matched");

        let secret = self
            .read_marker(&marker, token)
            .await
            .map_err(|err| marker_failure(&marker, err).into_anyhow())?;

        let verified = credential.is_some_and(|c| verify_token(c, &secret));
        Ok(AccessVerdict::Protected { verified })
    }

    async fn read_marker(&self, marker: &str, token: &AccessToken) -> StoreResult<String> {
        let item = self.store.item(marker, token, MARKER_FIELDS).await?;
        let url = item
            .download_url
            .ok_or(StoreError::Status { status: 404, body: None })?;
        self.store.read_text(&url).await
    }
}

fn marker_failure(marker: &str, err: StoreError) -> GateError {
    match err.upstream_status() {
        Some(404) => GateError::auth(404, MISSING_MARKER_MESSAGE),
        _ => {
            warn!(%marker, error = %err, "protected route marker lookup failed");
            GateError::auth(500, INTERNAL_ERROR_MESSAGE).with_source(err.into())
        }
    }
}
