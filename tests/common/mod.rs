//! Shared fixtures: a mockito backend and a scripted in-process transport.
#![allow(dead_code)]

use async_trait::async_trait;
use mockito::{Server, ServerGuard};
use restbase::{
    ClientConfig, HttpRequest, HttpResponse, RestbaseClient, RestbaseClientBuilder, TokenState,
    Transport, TransportError,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Mock backend serving the auth service under `/auth` and the data service under `/data`.
pub struct MockBackend {
    pub server: ServerGuard,
}

impl MockBackend {
    pub async fn new() -> Self {
        init_tracing();
        Self {
            server: Server::new_async().await,
        }
    }

    pub fn config(&self) -> ClientConfig {
        let base = self.server.url();
        ClientConfig::new(format!("{}/auth", base), format!("{}/data", base))
    }

    pub fn client(&self) -> RestbaseClient {
        RestbaseClientBuilder::new(self.config())
            .build()
            .expect("client should build")
    }

    pub fn client_with_tokens(&self, tokens: TokenState) -> RestbaseClient {
        RestbaseClientBuilder::new(self.config())
            .tokens(tokens)
            .build()
            .expect("client should build")
    }
}

pub enum Step {
    Respond(u16, &'static str),
    RespondBytes(u16, &'static [u8]),
    Delay(Duration, u16, &'static str),
    Fail(fn() -> TransportError),
}

/// Plays back a fixed sequence of responses and records every request.
#[derive(Default)]
pub struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Respond(status, body)) => Ok(HttpResponse::new(status, body)),
            Some(Step::RespondBytes(status, body)) => Ok(HttpResponse::new(status, body)),
            Some(Step::Delay(delay, status, body)) => {
                tokio::time::sleep(delay).await;
                Ok(HttpResponse::new(status, body))
            }
            Some(Step::Fail(make)) => Err(make()),
            None => Err(TransportError::Other("script exhausted".into())),
        }
    }
}

pub fn scripted_client(
    transport: Arc<ScriptedTransport>,
    tokens: TokenState,
    timeout: Duration,
) -> RestbaseClient {
    init_tracing();
    RestbaseClientBuilder::new(ClientConfig::new(
        "https://auth.example.com",
        "https://data.example.com",
    ))
    .transport(transport)
    .tokens(tokens)
    .timeout(timeout)
    .build()
    .expect("client should build")
}
