use crate::client::core::RestbaseClient;
use crate::client::tokens::TokenStore;
use crate::config::ClientConfig;
use crate::transport::{HttpTransport, Transport};
use crate::types::TokenState;
use crate::Result;
use std::sync::Arc;
use std::time::Duration;

/// Builder for creating clients with custom configuration.
///
/// Keep this surface area small and predictable.
pub struct RestbaseClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    tokens: Option<TokenState>,
}

impl RestbaseClientBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            transport: None,
            tokens: None,
        }
    }

    /// Replace the default reqwest transport (tests, custom stacks).
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Override the per-attempt timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_timeout(timeout);
        self
    }

    /// Start with previously persisted tokens.
    pub fn tokens(mut self, tokens: TokenState) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Build the client. Fails fast on invalid configuration.
    pub fn build(self) -> Result<RestbaseClient> {
        self.config.validate()?;

        let transport = match self.transport {
            Some(t) => t,
            None => Arc::new(HttpTransport::new(&self.config)?),
        };

        let tokens = TokenStore::with_state(self.tokens.unwrap_or_default());

        Ok(RestbaseClient {
            config: self.config,
            transport,
            tokens,
        })
    }
}
