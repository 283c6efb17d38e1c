//! Response classification: 2xx bodies into [`Payload`], everything else into [`Error`].

use crate::transport::HttpResponse;
use crate::types::Payload;
use crate::{Error, ErrorContext, Result};
use serde_json::Value;

/// Status the refresh-and-retry protocol reacts to.
pub(crate) const UNAUTHORIZED: u16 = 401;

/// A 2xx body that is not UTF-8 is a format error; error bodies are decoded lossily
/// since they only feed the message.
pub(crate) fn classify_response(response: &HttpResponse) -> Result<Payload> {
    if response.is_success() {
        let body = response.text().map_err(|e| {
            Error::invalid_format_with_context(
                "response body is not valid UTF-8",
                ErrorContext::new()
                    .with_details(e.to_string())
                    .with_source("classification"),
            )
        })?;
        return Ok(Payload::from_body(body));
    }
    let body = String::from_utf8_lossy(&response.body);
    Err(Error::Http {
        status: response.status,
        message: error_message_from_body(&body),
    })
}

/// Prefer a JSON object's `message` field; fall back to the raw text.
pub(crate) fn error_message_from_body(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("message") {
            Some(Value::String(s)) => s.clone(),
            Some(other) if !other.is_null() => other.to_string(),
            _ => body.to_string(),
        },
        _ => body.to_string(),
    }
}
