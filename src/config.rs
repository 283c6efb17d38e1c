//! Client configuration: the two service base URLs, their default headers
//! and the per-attempt timeout.

use crate::{Error, ErrorContext, Result};
use std::collections::BTreeMap;
use std::env;
use std::time::Duration;
use url::Url;

/// Default per-attempt timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Immutable configuration consumed read-only by the client.
///
/// Every `with_*` method consumes the value and returns a new one, so a
/// shared configuration is "copied with" changes via `config.clone().with_...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub auth_base_url: String,
    pub data_base_url: String,
    pub auth_headers: BTreeMap<String, String>,
    pub data_headers: BTreeMap<String, String>,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(auth_base_url: impl Into<String>, data_base_url: impl Into<String>) -> Self {
        Self {
            auth_base_url: auth_base_url.into(),
            data_base_url: data_base_url.into(),
            auth_headers: BTreeMap::new(),
            data_headers: BTreeMap::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Build from the environment.
    ///
    /// - `RESTBASE_AUTH_URL` (required)
    /// - `RESTBASE_DATA_URL` (required)
    /// - `RESTBASE_HTTP_TIMEOUT_SECS` (default 30)
    pub fn from_env() -> Result<Self> {
        let auth = required_env("RESTBASE_AUTH_URL")?;
        let data = required_env("RESTBASE_DATA_URL")?;
        let timeout_secs = env::var("RESTBASE_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|s| *s > 0)
            .unwrap_or(DEFAULT_TIMEOUT.as_secs());

        let config = Self::new(auth, data).with_timeout(Duration::from_secs(timeout_secs));
        config.validate()?;
        Ok(config)
    }

    pub fn with_auth_base_url(mut self, url: impl Into<String>) -> Self {
        self.auth_base_url = url.into();
        self
    }

    pub fn with_data_base_url(mut self, url: impl Into<String>) -> Self {
        self.data_base_url = url.into();
        self
    }

    pub fn with_auth_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.auth_headers.insert(name.into(), value.into());
        self
    }

    pub fn with_data_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.data_headers.insert(name.into(), value.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Put a static bearer token into both default header sets.
    ///
    /// A default `Authorization` header suppresses the client's automatic
    /// token injection for every call.
    pub fn with_bearer_token(self, token: &str) -> Self {
        let value = format!("Bearer {}", token);
        self.with_auth_header("Authorization", value.clone())
            .with_data_header("Authorization", value)
    }

    /// Fail fast unless both base URLs are absolute.
    pub fn validate(&self) -> Result<()> {
        check_absolute("auth_base_url", &self.auth_base_url)?;
        check_absolute("data_base_url", &self.data_base_url)?;
        if self.timeout.is_zero() {
            return Err(Error::configuration_with_context(
                "timeout must be greater than zero",
                ErrorContext::new()
                    .with_details("timeout")
                    .with_source("config_validation"),
            ));
        }
        Ok(())
    }
}

fn required_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| {
        Error::configuration_with_context(
            format!("{} is not set", name),
            ErrorContext::new().with_source("config_env"),
        )
    })
}

fn check_absolute(field: &str, raw: &str) -> Result<()> {
    let invalid = |why: &str| {
        Error::configuration_with_context(
            format!("{} must be an absolute URL", field),
            ErrorContext::new()
                .with_details(format!("'{}': {}", raw, why))
                .with_source("config_validation"),
        )
    };
    let url = Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;
    if url.cannot_be_a_base() || !url.has_host() {
        return Err(invalid("missing host"));
    }
    Ok(())
}
