//! Wiring for the drivegate binary: configuration, upstream clients and
//! the HTTP router.

pub mod settings;

use std::sync::Arc;

use anyhow::Result;
use drivegate_auth::{AuthorizationGate, ProtectedRoutes};
use drivegate_axum::{AxumGate, DeliveryPolicy, GateState, RequestHandler};
use drivegate_core::GateConfig;
use drivegate_oauth::{AccessTokenProvider, OAuth2RefreshTokenProvider, StaticTokenProvider};
use drivegate_store::{DriveStore, GraphDriveStore, StoreConfig};
use tracing::info;

pub use settings::{apply_defaults, RefreshSettings, Settings, TokenSettings};

/// Environment variables with this prefix configure the gateway.
pub const ENV_PREFIX: &str = "DRIVEGATE__";

/// Defaults overlaid with the process environment.
pub fn load_config() -> GateConfig {
    let mut config = GateConfig::new();
    config.load_env(ENV_PREFIX);
    apply_defaults(&mut config);
    config
}

pub fn token_provider(tokens: &TokenSettings) -> Result<Arc<dyn AccessTokenProvider>> {
    Ok(match tokens {
        TokenSettings::Static(token) => Arc::new(StaticTokenProvider::new(token.clone())),
        TokenSettings::Refresh(r) => Arc::new(OAuth2RefreshTokenProvider::new(
            r.client_id.clone(),
            r.client_secret.clone(),
            r.refresh_token.clone(),
            r.auth_url.clone(),
            r.token_url.clone(),
            &r.scope,
        )?),
    })
}

pub fn build(settings: &Settings) -> Result<AxumGate> {
    let store: Arc<dyn DriveStore> = Arc::new(GraphDriveStore::new(
        StoreConfig::new()
            .with_drive_api(settings.drive_api.clone())
            .with_base_directory(settings.base_directory.clone()),
    ));

    let routes = ProtectedRoutes::new(&settings.protected_routes);
    info!(protected_routes = settings.protected_routes.len(), "authorization gate ready");

    let gate = AuthorizationGate::new(routes, Arc::clone(&store));
    let policy = DeliveryPolicy::default()
        .with_cache_control(settings.cache_control.clone())
        .with_proxy_threshold(settings.proxy_threshold);
    let handler = RequestHandler::new(token_provider(&settings.tokens)?, gate, store).with_policy(policy);

    let mut state = GateState::new(handler);
    if let Some(homepage) = &settings.homepage {
        state = state.with_homepage(homepage.clone());
    }

    Ok(AxumGate::new(state, &settings.route))
}
