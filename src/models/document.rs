//! Schemaless documents as held by the document store.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use sqlx::FromRow;

/// Raw row of the `documents` table.
#[derive(Clone, FromRow, Debug)]
pub struct DocumentRow {
    pub collection: String,
    pub id: String,
    pub data: String,
    pub created_at: DateTime<Utc>,
}

/// A JSON document plus the fields the store assigns itself.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

impl Document {
    /// Decode into a typed record, exposing the store-assigned `id` and
    /// `createdAt` alongside the stored fields.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        let mut fields = self.data.clone();
        fields.insert("id".into(), Value::String(self.id.clone()));
        fields.insert("createdAt".into(), serde_json::to_value(self.created_at)?);
        serde_json::from_value(Value::Object(fields))
    }

    /// Read a single string field, if present.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(Value::as_str)
    }
}

impl TryFrom<DocumentRow> for Document {
    type Error = serde_json::Error;

    fn try_from(row: DocumentRow) -> Result<Self, Self::Error> {
        let data = match serde_json::from_str::<Value>(&row.data)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Ok(Self {
            id: row.id,
            data,
            created_at: row.created_at,
        })
    }
}
