//! Request execution: one timed dispatch per attempt, response classification,
//! and the single refresh-and-retry on an expired access token.

use crate::transport::HttpResponse;
use crate::types::Payload;
use crate::{Error, Result};
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::classification::{classify_response, UNAUTHORIZED};
use super::core::RestbaseClient;
use super::request::{build_http_request, RequestDescriptor};

impl RestbaseClient {
    /// Execute one logical call.
    ///
    /// A data-service call answered with 401 while a refresh token is held is
    /// retried exactly once after refreshing the access token. The retry's own
    /// outcome is final, including a second 401.
    pub async fn execute(&self, request: &RequestDescriptor) -> Result<Payload> {
        let client_request_id = Uuid::new_v4().to_string();
        self.execute_traced(request, &client_request_id).await
    }

    /// [`RestbaseClient::execute`] under a caller-chosen correlation id, so
    /// errors built after the call can carry the same id.
    pub(crate) async fn execute_traced(
        &self,
        request: &RequestDescriptor,
        client_request_id: &str,
    ) -> Result<Payload> {
        let (response, sent_token) = self.dispatch(request, client_request_id).await?;

        if response.status == UNAUTHORIZED
            && !request.is_auth_request()
            && self.tokens.has_refresh_token().await
        {
            info!(
                endpoint = request.endpoint.as_str(),
                client_request_id,
                "access token rejected, refreshing before retry"
            );
            if let Err(e) = self
                .refresh_after_rejection(sent_token.as_deref(), client_request_id)
                .await
            {
                warn!(
                    endpoint = request.endpoint.as_str(),
                    client_request_id,
                    error = %e,
                    "token refresh failed"
                );
                return Err(Error::AuthExpired {
                    source: Box::new(e),
                });
            }

            let (retried, _) = self.dispatch(request, client_request_id).await?;
            return self.classify(request, &retried, client_request_id);
        }

        self.classify(request, &response, client_request_id)
    }

    /// Single attempt without the refresh protocol (used by refresh itself).
    pub(crate) async fn execute_once(
        &self,
        request: &RequestDescriptor,
        client_request_id: &str,
    ) -> Result<Payload> {
        let (response, _) = self.dispatch(request, client_request_id).await?;
        self.classify(request, &response, client_request_id)
    }

    /// Send one attempt under a fresh timeout window.
    ///
    /// Returns the response together with the stored access token the attempt
    /// was built with.
    async fn dispatch(
        &self,
        request: &RequestDescriptor,
        client_request_id: &str,
    ) -> Result<(HttpResponse, Option<String>)> {
        let access_token = self.tokens.access_token().await;
        let http_request = build_http_request(&self.config, request, access_token.as_deref())?;
        let timeout = self.config.timeout;

        debug!(
            method = request.method.as_str(),
            service = request.service.as_str(),
            endpoint = request.endpoint.as_str(),
            client_request_id,
            "dispatching request"
        );

        let start = Instant::now();
        let response = match tokio::time::timeout(timeout, self.transport.send(http_request)).await
        {
            Ok(Ok(resp)) => resp,
            Ok(Err(e)) => {
                let err =
                    Error::from_transport(e, timeout).with_request_id(client_request_id);
                warn!(
                    endpoint = request.endpoint.as_str(),
                    client_request_id,
                    duration_ms = start.elapsed().as_millis() as u64,
                    error = %err,
                    "transport failure"
                );
                return Err(err);
            }
            Err(_) => {
                warn!(
                    endpoint = request.endpoint.as_str(),
                    client_request_id,
                    timeout_ms = timeout.as_millis() as u64,
                    "request timed out"
                );
                return Err(Error::Timeout { after: timeout });
            }
        };

        debug!(
            http_status = response.status,
            endpoint = request.endpoint.as_str(),
            client_request_id,
            duration_ms = start.elapsed().as_millis() as u64,
            "response received"
        );

        Ok((response, access_token))
    }

    fn classify(
        &self,
        request: &RequestDescriptor,
        response: &HttpResponse,
        client_request_id: &str,
    ) -> Result<Payload> {
        let result =
            classify_response(response).map_err(|e| e.with_request_id(client_request_id));
        if let Err(ref e) = result {
            info!(
                http_status = response.status,
                service = request.service.as_str(),
                endpoint = request.endpoint.as_str(),
                client_request_id,
                error = %e,
                "restbase request failed"
            );
        }
        result
    }

    /// Refresh after a 401, unless a concurrent call already replaced the
    /// token the failed attempt carried.
    async fn refresh_after_rejection(
        &self,
        stale_token: Option<&str>,
        client_request_id: &str,
    ) -> Result<()> {
        let _gate = self.tokens.refresh_gate().await;
        let current = self.tokens.access_token().await;
        if current.is_some() && current.as_deref() != stale_token {
            debug!("access token already refreshed by a concurrent call");
            return Ok(());
        }
        self.refresh_locked(client_request_id).await.map(|_| ())
    }
}
