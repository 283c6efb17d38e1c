use crate::config::ClientConfig;
use crate::transport::Transport;
use crate::types::TokenState;
use std::sync::Arc;

use super::tokens::TokenStore;

/// Client for the auth and data services.
///
/// Owns its token state; two clients never share credentials. All operations
/// take `&self`, so one instance can be shared across tasks behind an `Arc`.
pub struct RestbaseClient {
    pub(crate) config: ClientConfig,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) tokens: TokenStore,
}

impl RestbaseClient {
    /// Create a client with the default HTTP transport.
    pub fn new(config: ClientConfig) -> crate::Result<Self> {
        crate::client::builder::RestbaseClientBuilder::new(config).build()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Snapshot of the held tokens.
    pub async fn token_state(&self) -> TokenState {
        self.tokens.snapshot().await
    }

    pub async fn access_token(&self) -> Option<String> {
        self.tokens.access_token().await
    }

    pub async fn refresh_token_value(&self) -> Option<String> {
        self.tokens.refresh_token().await
    }

    pub async fn is_authenticated(&self) -> bool {
        self.tokens.access_token().await.is_some()
    }

    /// Restore previously persisted tokens.
    pub async fn set_tokens(&self, tokens: TokenState) {
        self.tokens.set(tokens).await;
    }

    /// Forget both tokens; later calls go out without `Authorization`.
    pub async fn clear_tokens(&self) {
        self.tokens.clear().await;
    }
}

impl std::fmt::Debug for RestbaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestbaseClient")
            .field("auth_base_url", &self.config.auth_base_url)
            .field("data_base_url", &self.config.data_base_url)
            .finish_non_exhaustive()
    }
}
