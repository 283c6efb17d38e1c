//! Request descriptors and their assembly into concrete HTTP requests.

use crate::config::ClientConfig;
use crate::transport::{HttpRequest, Method};
use crate::{Error, ErrorContext, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

/// Which backend service a call targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    Auth,
    Data,
}

impl Service {
    pub fn as_str(&self) -> &'static str {
        match self {
            Service::Auth => "auth",
            Service::Data => "data",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything needed to issue (and re-issue) one logical call.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: Method,
    pub endpoint: String,
    pub body: Option<Value>,
    pub query: Vec<(String, String)>,
    pub service: Service,
    pub extra_headers: Vec<(String, String)>,
}

impl RequestDescriptor {
    pub fn new(service: Service, method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            body: None,
            query: Vec::new(),
            service,
            extra_headers: Vec::new(),
        }
    }

    pub fn auth(method: Method, endpoint: impl Into<String>) -> Self {
        Self::new(Service::Auth, method, endpoint)
    }

    pub fn data(method: Method, endpoint: impl Into<String>) -> Self {
        Self::new(Service::Data, method, endpoint)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.push((name.into(), value.into()));
        self
    }

    pub fn is_auth_request(&self) -> bool {
        self.service == Service::Auth
    }
}

/// Join base and endpoint with exactly one `/` and append URL-encoded query pairs.
pub fn build_url(base: &str, endpoint: &str, query: &[(String, String)]) -> Result<Url> {
    let joined = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    );
    let mut url = Url::parse(&joined).map_err(|e| {
        Error::configuration_with_context(
            format!("cannot build request URL: {}", e),
            ErrorContext::new()
                .with_endpoint(endpoint)
                .with_details(joined.clone())
                .with_source("url_assembly"),
        )
    })?;
    if !query.is_empty() {
        url.query_pairs_mut()
            .extend_pairs(query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }
    Ok(url)
}

/// Insert or replace a header, matching names case-insensitively.
fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    if let Some(slot) = headers
        .iter_mut()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
    {
        slot.1 = value.to_string();
    } else {
        headers.push((name.to_string(), value.to_string()));
    }
}

/// Merge order: content type, service defaults, call extras, then the bearer
/// token unless some layer already set `Authorization`.
pub fn merge_headers(
    defaults: &BTreeMap<String, String>,
    extra: &[(String, String)],
    access_token: Option<&str>,
) -> Vec<(String, String)> {
    let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
    for (k, v) in defaults {
        set_header(&mut headers, k, v);
    }
    for (k, v) in extra {
        set_header(&mut headers, k, v);
    }
    let has_auth = headers
        .iter()
        .any(|(k, _)| k.eq_ignore_ascii_case("authorization"));
    if !has_auth {
        if let Some(token) = access_token {
            headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
        }
    }
    headers
}

/// Assemble the concrete request for one attempt.
pub fn build_http_request(
    config: &ClientConfig,
    request: &RequestDescriptor,
    access_token: Option<&str>,
) -> Result<HttpRequest> {
    let (base, defaults) = match request.service {
        Service::Auth => (&config.auth_base_url, &config.auth_headers),
        Service::Data => (&config.data_base_url, &config.data_headers),
    };

    let url = build_url(base, &request.endpoint, &request.query)?;
    let headers = merge_headers(defaults, &request.extra_headers, access_token);
    let body = match (&request.body, request.method.carries_body()) {
        (Some(body), true) => Some(serde_json::to_string(body)?),
        _ => None,
    };

    Ok(HttpRequest {
        method: request.method,
        url,
        headers,
        body,
    })
}
