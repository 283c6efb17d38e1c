//! Auth-service operations.

use crate::transport::Method;
use crate::types::wire::{
    AuthTokens, LoginRequest, RefreshRequest, RefreshedToken, SignupRequest,
};
use crate::types::{Payload, TokenState};
use crate::{Error, ErrorContext, Result};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use super::core::RestbaseClient;
use super::endpoint;
use super::request::RequestDescriptor;

impl RestbaseClient {
    /// Log in and keep the returned token pair.
    ///
    /// The response must carry both `accessToken` and `refreshToken`.
    pub async fn login(&self, email: &str, password: &str) -> Result<Value> {
        let body = serde_json::to_value(LoginRequest { email, password })?;
        let client_request_id = Uuid::new_v4().to_string();
        let payload = self
            .execute_traced(
                &RequestDescriptor::auth(Method::Post, endpoint::LOGIN).with_body(body),
                &client_request_id,
            )
            .await?;

        let json = require_json(payload, endpoint::LOGIN)
            .map_err(|e| e.with_request_id(&client_request_id))?;
        let tokens: AuthTokens = serde_json::from_value(json.clone()).map_err(|e| {
            Error::invalid_format_with_context(
                format!("login response lacks tokens: {}", e),
                ErrorContext::new()
                    .with_endpoint(endpoint::LOGIN)
                    .with_request_id(client_request_id.as_str())
                    .with_source("login"),
            )
        })?;

        self.tokens
            .set(TokenState::new(tokens.access_token, tokens.refresh_token))
            .await;
        info!("login succeeded, tokens stored");
        Ok(json)
    }

    /// Create an account. Does not start a session.
    pub async fn register(&self, email: &str, password: &str, name: &str) -> Result<Payload> {
        let body = serde_json::to_value(SignupRequest {
            email,
            password,
            name,
        })?;
        self.execute(&RequestDescriptor::auth(Method::Post, endpoint::SIGNUP).with_body(body))
            .await
    }

    /// Mint a new access token from the stored refresh token.
    ///
    /// Only the access token is replaced. Concurrent refreshes on the same
    /// client are serialized.
    pub async fn refresh_access_token(&self) -> Result<String> {
        let _gate = self.tokens.refresh_gate().await;
        self.refresh_locked(&Uuid::new_v4().to_string()).await
    }

    /// Refresh with a caller-supplied token; client state is left untouched.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<Payload> {
        let body = serde_json::to_value(RefreshRequest { refresh_token })?;
        self.execute(
            &RequestDescriptor::auth(Method::Post, endpoint::REFRESH_TOKEN).with_body(body),
        )
        .await
    }

    /// End the session identified by `access_token` on the server.
    ///
    /// Authenticates with the given token rather than stored state, and does
    /// not clear stored state: call [`RestbaseClient::clear_tokens`] as well.
    pub async fn logout(&self, access_token: &str) -> Result<Payload> {
        self.execute(
            &RequestDescriptor::auth(Method::Post, endpoint::LOGOUT)
                .with_header("Authorization", format!("Bearer {}", access_token)),
        )
        .await
    }

    /// Caller must hold the refresh gate.
    pub(crate) async fn refresh_locked(&self, client_request_id: &str) -> Result<String> {
        let refresh_token = self
            .tokens
            .refresh_token()
            .await
            .ok_or(Error::MissingRefreshToken)?;

        let body = serde_json::to_value(RefreshRequest {
            refresh_token: &refresh_token,
        })?;
        let payload = self
            .execute_once(
                &RequestDescriptor::auth(Method::Post, endpoint::REFRESH_TOKEN).with_body(body),
                client_request_id,
            )
            .await?;

        let refreshed: RefreshedToken = payload
            .into_json()
            .and_then(|v| serde_json::from_value(v).ok())
            .ok_or_else(|| Error::InvalidRefreshResponse {
                message: "response has no accessToken".to_string(),
            })?;

        self.tokens
            .set_access_token(refreshed.access_token.clone())
            .await;
        info!("access token refreshed");
        Ok(refreshed.access_token)
    }
}

fn require_json(payload: Payload, endpoint: &str) -> Result<Value> {
    match payload {
        Payload::Json(v) => Ok(v),
        Payload::Raw(raw) => Err(Error::invalid_format_with_context(
            "expected a JSON body",
            ErrorContext::new()
                .with_endpoint(endpoint)
                .with_details(raw),
        )),
        Payload::Empty => Err(Error::invalid_format_with_context(
            "expected a JSON body, got none",
            ErrorContext::new().with_endpoint(endpoint),
        )),
    }
}
