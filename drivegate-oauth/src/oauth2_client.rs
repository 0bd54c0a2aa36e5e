use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use drivegate_core::AccessToken;
use oauth2::basic::BasicClient;
use oauth2::reqwest::async_http_client;
use oauth2::{AuthType, AuthUrl, ClientId, ClientSecret, RefreshToken, Scope, TokenResponse, TokenUrl};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::provider::AccessTokenProvider;

pub const MICROSOFT_AUTH_URL: &str = "https://login.microsoftonline.com/common/oauth2/v2.0/authorize";
pub const MICROSOFT_TOKEN_URL: &str = "https://login.microsoftonline.com/common/oauth2/v2.0/token";
pub const DEFAULT_SCOPE: &str = "user.read files.read.all offline_access";

/// Tokens closer than this to expiry are refreshed before use.
pub const EXPIRY_SKEW: Duration = Duration::from_secs(60);

// Assumed when the issuer omits `expires_in`.
const DEFAULT_LIFETIME: Duration = Duration::from_secs(3600);

struct CachedToken {
    token: AccessToken,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self, now: Instant) -> bool {
        self.expires_at.saturating_duration_since(now) > EXPIRY_SKEW
    }
}

struct RefreshState {
    refresh_token: RefreshToken,
    cached: Option<CachedToken>,
}

/// Keeps a drive access token alive with the OAuth2 refresh-token grant.
pub struct OAuth2RefreshTokenProvider {
    client: BasicClient,
    scopes: Vec<String>,
    state: Mutex<RefreshState>,
}

impl OAuth2RefreshTokenProvider {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
        auth_url: impl Into<String>,
        token_url: impl Into<String>,
        scope: &str,
    ) -> Result<Self> {
        let client = BasicClient::new(
            ClientId::new(client_id.into()),
            Some(ClientSecret::new(client_secret.into())),
            AuthUrl::new(auth_url.into())?,
            Some(TokenUrl::new(token_url.into())?),
        )
        .set_auth_type(AuthType::RequestBody);

        Ok(Self {
            client,
            scopes: scope.split_whitespace().map(str::to_string).collect(),
            state: Mutex::new(RefreshState {
                refresh_token: RefreshToken::new(refresh_token.into()),
                cached: None,
            }),
        })
    }

    /// Microsoft identity platform endpoints and the default drive scope.
    pub fn microsoft(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Result<Self> {
        Self::new(
            client_id,
            client_secret,
            refresh_token,
            MICROSOFT_AUTH_URL,
            MICROSOFT_TOKEN_URL,
            DEFAULT_SCOPE,
        )
    }

    async fn refresh(&self, state: &mut RefreshState) -> Result<AccessToken> {
        let mut req = self.client.exchange_refresh_token(&state.refresh_token);
        for s in &self.scopes {
            req = req.add_scope(Scope::new(s.clone()));
        }

        let response = req.request_async(async_http_client).await.map_err(|err| {
            warn!(error = %err, "refresh token grant failed");
            anyhow!("refresh token grant failed: {err}")
        })?;

        let token = AccessToken::new(response.access_token().secret().clone());
        let lifetime = response.expires_in().unwrap_or(DEFAULT_LIFETIME);
        if let Some(rotated) = response.refresh_token() {
            state.refresh_token = rotated.clone();
        }
        debug!(lifetime_secs = lifetime.as_secs(), "access token refreshed");

        state.cached = Some(CachedToken {
            token: token.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(token)
    }
}

#[async_trait]
impl AccessTokenProvider for OAuth2RefreshTokenProvider {
    async fn access_token(&self) -> Result<AccessToken> {
        let mut state = self.state.lock().await;
        if let Some(cached) = state.cached.as_ref().filter(|c| c.is_fresh(Instant::now())) {
            return Ok(cached.token.clone());
        }
        self.refresh(&mut state).await
    }
}
