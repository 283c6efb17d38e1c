use crate::types::TokenState;
use tokio::sync::{Mutex, MutexGuard, RwLock};

/// Token state owned by one client instance.
///
/// Reads and writes go through an async `RwLock`. Refreshes are serialized by
/// a separate gate so that at most one refresh is in flight per client.
#[derive(Debug, Default)]
pub(crate) struct TokenStore {
    state: RwLock<TokenState>,
    refresh_gate: Mutex<()>,
}

impl TokenStore {
    pub fn with_state(state: TokenState) -> Self {
        Self {
            state: RwLock::new(state),
            refresh_gate: Mutex::new(()),
        }
    }

    pub async fn snapshot(&self) -> TokenState {
        self.state.read().await.clone()
    }

    pub async fn access_token(&self) -> Option<String> {
        self.state.read().await.access_token.clone()
    }

    pub async fn refresh_token(&self) -> Option<String> {
        self.state.read().await.refresh_token.clone()
    }

    pub async fn has_refresh_token(&self) -> bool {
        self.state.read().await.refresh_token.is_some()
    }

    pub async fn set(&self, tokens: TokenState) {
        *self.state.write().await = tokens;
    }

    pub async fn set_access_token(&self, token: String) {
        self.state.write().await.access_token = Some(token);
    }

    pub async fn clear(&self) {
        *self.state.write().await = TokenState::default();
    }

    pub async fn refresh_gate(&self) -> MutexGuard<'_, ()> {
        self.refresh_gate.lock().await
    }
}
