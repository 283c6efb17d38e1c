use serde_json::Value;

/// Body of a successful (2xx) response.
///
/// A body that is not valid JSON is kept as [`Payload::Raw`] instead of failing
/// the call, so callers expecting structured data must handle that case.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Raw(String),
    Empty,
}

impl Payload {
    /// Classify a success body: empty, JSON, or raw text.
    pub fn from_body(body: &str) -> Self {
        if body.trim().is_empty() {
            return Payload::Empty;
        }
        match serde_json::from_str::<Value>(body) {
            Ok(v) => Payload::Json(v),
            Err(_) => Payload::Raw(body.to_string()),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Payload::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_json(self) -> Option<Value> {
        match self {
            Payload::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Payload::Empty)
    }
}
