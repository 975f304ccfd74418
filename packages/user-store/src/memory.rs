use crate::store::{StoreError, UserStore};
use crate::types::{Item, USER_ID_ATTRIBUTE};
use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::info;

/// Fixed set of items held in memory, for local runs and tests
#[derive(Clone, Debug, Default)]
pub struct MemoryUserStore {
    table: String,
    items: Vec<Item>,
}

impl MemoryUserStore {
    pub fn new(table: impl Into<String>, items: Vec<Item>) -> Self {
        Self {
            table: table.into(),
            items,
        }
    }

    /// Load a JSON array of plain user objects
    pub fn from_json_file<P: AsRef<Path>>(table: impl Into<String>, path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .context(format!("Failed to read seed file: {:?}", path))?;
        let value: Value = serde_json::from_str(&raw).context("Failed to parse seed file")?;

        let store = Self::from_json(table, value)?;
        info!(path = ?path, items = store.items.len(), "Loaded in-memory users");
        Ok(store)
    }

    pub fn from_json(table: impl Into<String>, value: Value) -> Result<Self> {
        let Value::Array(entries) = value else {
            anyhow::bail!("Seed data must be a JSON array of objects");
        };

        let items = entries
            .into_iter()
            .enumerate()
            .map(|(idx, entry)| match attribute_from_json(entry) {
                AttributeValue::M(item) => Ok(item),
                _ => Err(anyhow::anyhow!("Seed entry {} is not a JSON object", idx)),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(table, items))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn query_by_user_id(&self, user_id: &str) -> Result<Vec<Item>, StoreError> {
        Ok(self
            .items
            .iter()
            .filter(|item| {
                matches!(item.get(USER_ID_ATTRIBUTE), Some(AttributeValue::S(id)) if id == user_id)
            })
            .cloned()
            .collect())
    }

    fn table_name(&self) -> &str {
        &self.table
    }
}

/// Map a JSON value onto the closest DynamoDB attribute type
pub fn attribute_from_json(value: Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s),
        Value::Array(values) => {
            AttributeValue::L(values.into_iter().map(attribute_from_json).collect())
        }
        Value::Object(map) => AttributeValue::M(
            map.into_iter()
                .map(|(k, v)| (k, attribute_from_json(v)))
                .collect(),
        ),
    }
}
