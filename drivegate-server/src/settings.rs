use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use drivegate_core::delivery::DEFAULT_CACHE_CONTROL;
use drivegate_core::{GateConfig, GateConfigSnapshot, PROXY_SIZE_LIMIT};
use drivegate_oauth::{DEFAULT_SCOPE, MICROSOFT_AUTH_URL, MICROSOFT_TOKEN_URL};
use drivegate_store::DEFAULT_DRIVE_API;

/// Fill in every key that has a default and is not configured yet.
pub fn apply_defaults(config: &mut GateConfig) {
    config.set_default("http.host", "127.0.0.1");
    config.set_default("http.port", "3030");
    config.set_default("http.route", "/api/raw");
    config.set_default("drive.api", DEFAULT_DRIVE_API);
    config.set_default("drive.base_directory", "/");
    config.set_default("delivery.cache_control", DEFAULT_CACHE_CONTROL);
    config.set_default("delivery.proxy_threshold_bytes", PROXY_SIZE_LIMIT.to_string());
    config.set_default("oauth.auth_url", MICROSOFT_AUTH_URL);
    config.set_default("oauth.token_url", MICROSOFT_TOKEN_URL);
    config.set_default("oauth.scope", DEFAULT_SCOPE);
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub route: String,
    pub drive_api: String,
    pub base_directory: String,
    pub homepage: Option<String>,
    pub protected_routes: Vec<String>,
    pub cache_control: String,
    pub proxy_threshold: u64,
    pub tokens: TokenSettings,
}

#[derive(Clone)]
pub enum TokenSettings {
    Static(String),
    Refresh(RefreshSettings),
}

#[derive(Clone)]
pub struct RefreshSettings {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub auth_url: String,
    pub token_url: String,
    pub scope: String,
}

impl fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenSettings::Static(_) => f.write_str("Static(***)"),
            TokenSettings::Refresh(r) => f
                .debug_struct("Refresh")
                .field("client_id", &r.client_id)
                .field("token_url", &r.token_url)
                .field("scope", &r.scope)
                .finish_non_exhaustive(),
        }
    }
}

impl Settings {
    pub fn from_config(config: &GateConfigSnapshot) -> Result<Self> {
        let route = required(config, "http.route")?;
        if !route.starts_with('/') {
            bail!("http.route must start with '/', got {route:?}");
        }

        Ok(Self {
            host: required(config, "http.host")?,
            port: parsed(config, "http.port")?,
            route,
            drive_api: required(config, "drive.api")?,
            base_directory: required(config, "drive.base_directory")?,
            homepage: config.get_string("site.homepage"),
            protected_routes: config.get_list("site.protected_routes"),
            cache_control: required(config, "delivery.cache_control")?,
            proxy_threshold: parsed(config, "delivery.proxy_threshold_bytes")?,
            tokens: token_settings(config)?,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn token_settings(config: &GateConfigSnapshot) -> Result<TokenSettings> {
    if let Some(token) = config.get_string("oauth.access_token") {
        return Ok(TokenSettings::Static(token));
    }

    let client_id = config.get_string("oauth.client_id");
    let client_secret = config.get_string("oauth.client_secret");
    let refresh_token = config.get_string("oauth.refresh_token");
    match (client_id, client_secret, refresh_token) {
        (Some(client_id), Some(client_secret), Some(refresh_token)) => {
            Ok(TokenSettings::Refresh(RefreshSettings {
                client_id,
                client_secret,
                refresh_token,
                auth_url: required(config, "oauth.auth_url")?,
                token_url: required(config, "oauth.token_url")?,
                scope: required(config, "oauth.scope")?,
            }))
        }
        _ => bail!(
            "no upstream credentials: set oauth.access_token, or oauth.client_id, \
             oauth.client_secret and oauth.refresh_token"
        ),
    }
}

fn required(config: &GateConfigSnapshot, key: &str) -> Result<String> {
    config
        .get_string(key)
        .ok_or_else(|| anyhow!("missing configuration value {key}"))
}

fn parsed<T>(config: &GateConfigSnapshot, key: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = required(config, key)?;
    raw.parse::<T>()
        .with_context(|| format!("invalid {key}: {raw:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(pairs: &[(&str, &str)]) -> GateConfig {
        let mut config = GateConfig::new();
        for (k, v) in pairs {
            config.set(*k, *v);
        }
        apply_defaults(&mut config);
        config
    }

    #[test]
    fn defaults() {
        let settings = Settings::from_config(&config(&[("oauth.access_token", "t")]).snapshot()).unwrap();

        assert_eq!(settings.addr(), "127.0.0.1:3030");
        assert_eq!(settings.route, "/api/raw");
        assert_eq!(settings.drive_api, DEFAULT_DRIVE_API);
        assert_eq!(settings.base_directory, "/");
        assert_eq!(settings.proxy_threshold, 4_194_304);
        assert_eq!(settings.cache_control, DEFAULT_CACHE_CONTROL);
        assert!(settings.homepage.is_none());
        assert!(settings.protected_routes.is_empty());
        assert!(matches!(settings.tokens, TokenSettings::Static(_)));
    }

    #[test]
    fn environment_overrides() {
        let mut config = GateConfig::new();
        config.load_vars(
            "DRIVEGATE__",
            [
                ("DRIVEGATE__HTTP__PORT".to_string(), "8080".to_string()),
                ("DRIVEGATE__SITE__PROTECTED_ROUTES".to_string(), "/private, /team".to_string()),
                ("DRIVEGATE__SITE__HOMEPAGE".to_string(), "https://example.com".to_string()),
                ("DRIVEGATE__OAUTH__CLIENT_ID".to_string(), "id".to_string()),
                ("DRIVEGATE__OAUTH__CLIENT_SECRET".to_string(), "secret".to_string()),
                ("DRIVEGATE__OAUTH__REFRESH_TOKEN".to_string(), "refresh".to_string()),
                ("OTHER_VAR".to_string(), "ignored".to_string()),
            ],
        );
        apply_defaults(&mut config);

        let settings = Settings::from_config(&config.snapshot()).unwrap();
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.protected_routes, vec!["/private", "/team"]);
        assert_eq!(settings.homepage.as_deref(), Some("https://example.com"));
        match settings.tokens {
            TokenSettings::Refresh(r) => {
                assert_eq!(r.token_url, MICROSOFT_TOKEN_URL);
                assert_eq!(r.scope, DEFAULT_SCOPE);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn static_token_wins() {
        let settings = Settings::from_config(
            &config(&[
                ("oauth.access_token", "t"),
                ("oauth.client_id", "id"),
                ("oauth.client_secret", "s"),
                ("oauth.refresh_token", "r"),
            ])
            .snapshot(),
        )
        .unwrap();
        assert!(matches!(settings.tokens, TokenSettings::Static(_)));
    }

    #[test]
    fn misconfiguration_is_reported() {
        assert!(Settings::from_config(&config(&[]).snapshot()).is_err());
        assert!(Settings::from_config(&config(&[("oauth.client_id", "id")]).snapshot()).is_err());

        let err = Settings::from_config(&config(&[("oauth.access_token", "t"), ("http.port", "http")]).snapshot())
            .unwrap_err();
        assert!(err.to_string().contains("http.port"));

        let err = Settings::from_config(
            &config(&[("oauth.access_token", "t"), ("delivery.proxy_threshold_bytes", "4MB")]).snapshot(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("proxy_threshold_bytes"));

        assert!(Settings::from_config(&config(&[("oauth.access_token", "t"), ("http.route", "api")]).snapshot()).is_err());
    }

    #[test]
    fn debug_hides_secrets() {
        let tokens = TokenSettings::Static("very-secret".into());
        assert!(!format!("{tokens:?}").contains("very-secret"));
    }
}
