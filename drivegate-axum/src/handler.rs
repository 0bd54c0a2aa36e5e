use std::fmt;
use std::sync::Arc;

use axum::response::Response;
use drivegate_auth::{caller_credential, AccessVerdict, AuthorizationGate};
use drivegate_core::path::{self, PATH_PLACEHOLDER};
use drivegate_core::{bail_gate, decide, AccessToken, GateError, GateResult, FILE_ACCESS_MODE};
use drivegate_oauth::AccessTokenProvider;
use drivegate_store::{DriveStore, MetadataResolver};
use tracing::{debug, info, warn};

use crate::delivery::{deliver, DeliveryPolicy};
use crate::params::FileAccessParams;

pub const NO_ACCESS_TOKEN: &str = "No access token.";
pub const INVALID_REQUEST_MODE: &str = "Invalid Request Mode.";

/// Pipeline step a request failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Token,
    Mode,
    Decode,
    Authorize,
    Resolve,
    Deliver,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Token => "token",
            Stage::Mode => "mode",
            Stage::Decode => "decode",
            Stage::Authorize => "authorize",
            Stage::Resolve => "resolve",
            Stage::Deliver => "deliver",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request that stopped before delivery.
#[derive(Debug)]
pub struct Failure {
    pub error: anyhow::Error,
    /// Set once a protected route has granted access; the error response
    /// must not be cached either.
    pub protected: bool,
}

impl From<anyhow::Error> for Failure {
    fn from(error: anyhow::Error) -> Self {
        Self { error, protected: false }
    }
}

/// Runs one file access request from token acquisition to delivery.
///
/// Each request walks the steps in order and stops at the first failure;
/// nothing is retried and nothing is shared between requests except the
/// token provider.
pub struct RequestHandler {
    tokens: Arc<dyn AccessTokenProvider>,
    gate: AuthorizationGate,
    resolver: MetadataResolver,
    store: Arc<dyn DriveStore>,
    policy: DeliveryPolicy,
}

impl RequestHandler {
    pub fn new(
        tokens: Arc<dyn AccessTokenProvider>,
        gate: AuthorizationGate,
        store: Arc<dyn DriveStore>,
    ) -> Self {
        Self {
            tokens,
            gate,
            resolver: MetadataResolver::new(Arc::clone(&store)),
            store,
            policy: DeliveryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: DeliveryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &DeliveryPolicy {
        &self.policy
    }

    pub async fn handle(&self, params: &FileAccessParams) -> Result<Response, Failure> {
        let token = self.access_token().await.map_err(failed(Stage::Token))?;

        check_mode(params).map_err(failed(Stage::Mode))?;

        let hash = params.hash.as_deref().unwrap_or(PATH_PLACEHOLDER);
        let path = path::decode(hash)
            .map_err(|e| GateError::from(e).into_anyhow())
            .map_err(failed(Stage::Decode))?;
        debug!(%path, "hash decoded");

        let verdict = self
            .gate
            .authorize(&path, &token, caller_credential(params))
            .await
            .and_then(AccessVerdict::require_verified)
            .map_err(failed(Stage::Authorize))?;
        let protected = verdict.is_protected();
        debug!(protected, "authorized");
        let after_auth = move |error| Failure { error, protected };

        let meta = self
            .resolver
            .resolve(&path, &token)
            .await
            .map_err(failed(Stage::Resolve))
            .map_err(after_auth)?;

        let delivery = decide(&meta, params.proxy, self.policy.proxy_threshold);
        let response = deliver(self.store.as_ref(), &delivery, protected, &self.policy)
            .await
            .map_err(failed(Stage::Deliver))
            .map_err(after_auth)?;

        info!(
            %path,
            mode = ?delivery.mode,
            size = meta.size,
            status = response.status().as_u16(),
            "delivered"
        );
        Ok(response)
    }

    async fn access_token(&self) -> GateResult<AccessToken> {
        match self.tokens.access_token().await {
            Ok(token) if !token.is_empty() => Ok(token),
            Ok(_) => Err(GateError::missing_access_token(NO_ACCESS_TOKEN).into_anyhow()),
            Err(err) => Err(GateError::missing_access_token(NO_ACCESS_TOKEN)
                .with_source(err)
                .into_anyhow()),
        }
    }
}

fn check_mode(params: &FileAccessParams) -> GateResult<()> {
    if params.request_mode.as_deref() != Some(FILE_ACCESS_MODE) {
        bail_gate!(bad_request, INVALID_REQUEST_MODE);
    }
    Ok(())
}

fn failed(stage: Stage) -> impl FnOnce(anyhow::Error) -> anyhow::Error {
    move |err| {
        let status = GateError::from_anyhow(&err).map_or(500, GateError::code);
        warn!(%stage, status, error = %cause_chain(&err), "request failed");
        err
    }
}

/// The error and every cause below it, on one line.
fn cause_chain(err: &anyhow::Error) -> String {
    format!("{err:#}")
}
