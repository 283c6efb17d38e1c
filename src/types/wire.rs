//! JSON bodies of the fixed auth and data endpoints.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identity column every data-service row is addressed by.
pub const ID_COLUMN: &str = "_id";

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SignupRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

/// Token pair a login response must carry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshedToken {
    pub access_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTableRequest<'a> {
    pub table_name: &'a str,
    pub description: &'a str,
    pub columns: &'a [Value],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertRequest<'a> {
    pub table_name: &'a str,
    pub records: Vec<&'a Map<String, Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest<'a> {
    pub table_name: &'a str,
    pub id_column: &'a str,
    pub id_value: &'a Value,
    pub updates: Map<String, Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest<'a> {
    pub table_name: &'a str,
    pub id_column: &'a str,
    pub id_value: &'a Value,
}

/// Drop identity keys; they are never part of an update payload.
pub fn strip_identity(patch: &Map<String, Value>) -> Map<String, Value> {
    patch
        .iter()
        .filter(|(k, _)| k.as_str() != ID_COLUMN && k.as_str() != "id")
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}
