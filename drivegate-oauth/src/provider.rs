// Access-token providers.

use anyhow::Result;
use async_trait::async_trait;
use drivegate_core::AccessToken;

/// Supplies the bearer token used for upstream drive calls.
///
/// Shared by every request. Implementations either return a token that is
/// valid right now or fail; callers never retry.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<AccessToken>;
}

/// A fixed token, e.g. one minted out of band for a deployment.
pub struct StaticTokenProvider {
    token: AccessToken,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: AccessToken::new(token),
        }
    }
}

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<AccessToken> {
        if self.token.is_empty() {
            anyhow::bail!("no access token configured");
        }
        Ok(self.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_token_is_returned() {
        let provider = StaticTokenProvider::new("abc");
        assert_eq!(provider.access_token().await.unwrap().secret(), "abc");
    }

    #[tokio::test]
    async fn empty_token_is_a_failure() {
        let provider = StaticTokenProvider::new("");
        assert!(provider.access_token().await.is_err());
    }
}
