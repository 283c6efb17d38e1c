//! Data-service operations: table management and record CRUD.

use crate::transport::Method;
use crate::types::wire::{
    strip_identity, CreateTableRequest, DeleteRequest, InsertRequest, UpdateRequest, ID_COLUMN,
};
use crate::types::Payload;
use crate::{Error, Result};
use serde_json::{Map, Value};

use super::core::RestbaseClient;
use super::endpoint;
use super::request::RequestDescriptor;

impl RestbaseClient {
    pub async fn create_table(&self, name: &str, columns: &[Value]) -> Result<()> {
        self.create_table_with_description(name, "", columns).await
    }

    pub async fn create_table_with_description(
        &self,
        name: &str,
        description: &str,
        columns: &[Value],
    ) -> Result<()> {
        let body = serde_json::to_value(CreateTableRequest {
            table_name: name,
            description,
            columns,
        })?;
        self.execute(&RequestDescriptor::data(Method::Post, endpoint::CREATE_TABLE).with_body(body))
            .await?;
        Ok(())
    }

    pub async fn get_table_data(&self, schema: &str, table: &str) -> Result<Payload> {
        self.execute(
            &RequestDescriptor::data(Method::Get, endpoint::TABLE_DATA)
                .with_query("schema", schema)
                .with_query("table", table),
        )
        .await
    }

    /// Insert one record and return the stored row.
    ///
    /// The response must be an object: its first `inserted` row is returned
    /// when present, otherwise the object itself.
    pub async fn create(&self, table: &str, record: &Map<String, Value>) -> Result<Value> {
        let body = serde_json::to_value(InsertRequest {
            table_name: table,
            records: vec![record],
        })?;
        let payload = self
            .execute(&RequestDescriptor::data(Method::Post, endpoint::INSERT).with_body(body))
            .await?;

        inserted_row(payload).ok_or_else(|| Error::RecordNotInserted {
            table: table.to_string(),
        })
    }

    /// Read rows, optionally filtered by column equality.
    ///
    /// Accepts a bare array or `{"data": [...]}`; any other shape reads as no rows.
    pub async fn read(&self, table: &str, filters: Option<&Map<String, Value>>) -> Result<Vec<Value>> {
        let mut request =
            RequestDescriptor::data(Method::Get, endpoint::READ).with_query("tableName", table);
        if let Some(filters) = filters {
            for (k, v) in filters {
                request = request.with_query(k.as_str(), query_value(v));
            }
        }
        let payload = self.execute(&request).await?;
        Ok(rows(payload))
    }

    /// Patch the row whose `_id` is `id`. Identity keys in `patch` are dropped.
    pub async fn update(
        &self,
        table: &str,
        id: impl Into<Value>,
        patch: &Map<String, Value>,
    ) -> Result<Payload> {
        let id = id.into();
        let body = serde_json::to_value(UpdateRequest {
            table_name: table,
            id_column: ID_COLUMN,
            id_value: &id,
            updates: strip_identity(patch),
        })?;
        self.execute(&RequestDescriptor::data(Method::Put, endpoint::UPDATE).with_body(body))
            .await
    }

    pub async fn delete(&self, table: &str, id: impl Into<Value>) -> Result<Payload> {
        let id = id.into();
        let body = serde_json::to_value(DeleteRequest {
            table_name: table,
            id_column: ID_COLUMN,
            id_value: &id,
        })?;
        self.execute(&RequestDescriptor::data(Method::Delete, endpoint::DELETE).with_body(body))
            .await
    }

    pub async fn get_all(&self, table: &str) -> Result<Vec<Value>> {
        self.read(table, None).await
    }

    /// First row whose `_id` equals `id`.
    pub async fn get_by_id(&self, table: &str, id: impl Into<Value>) -> Result<Option<Value>> {
        let id = id.into();
        let mut filters = Map::new();
        filters.insert(ID_COLUMN.to_string(), id.clone());
        let found = self.read(table, Some(&filters)).await?;
        Ok(found
            .into_iter()
            .find(|row| row.get(ID_COLUMN) == Some(&id)))
    }

    pub async fn get_where(&self, table: &str, filters: &Map<String, Value>) -> Result<Vec<Value>> {
        self.read(table, Some(filters)).await
    }
}

fn inserted_row(payload: Payload) -> Option<Value> {
    let Value::Object(mut map) = payload.into_json()? else {
        return None;
    };
    if let Some(Value::Array(inserted)) = map.get_mut("inserted") {
        if !inserted.is_empty() {
            return Some(inserted.swap_remove(0));
        }
    }
    Some(Value::Object(map))
}

fn rows(payload: Payload) -> Vec<Value> {
    match payload.into_json() {
        Some(Value::Array(rows)) => rows,
        Some(Value::Object(mut map)) => match map.remove("data") {
            Some(Value::Array(rows)) => rows,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Query strings carry strings as-is and everything else as JSON text.
fn query_value(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
