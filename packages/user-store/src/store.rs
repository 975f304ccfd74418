use crate::types::Item;
use async_trait::async_trait;

/// The lookup itself failed (transport, permissions, throttling, bad request...)
#[derive(Debug, Clone, thiserror::Error)]
#[error("query against table `{table}` failed: {reason}")]
pub struct StoreError {
    pub table: String,
    pub reason: String,
}

impl StoreError {
    pub fn new(table: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            reason: reason.into(),
        }
    }
}

/// Read-only access to the users table.
///
/// One instance is built per process and shared across concurrent requests,
/// so implementations hold no per-request state.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// All items whose `user_id` equals `user_id` exactly, in store order
    async fn query_by_user_id(&self, user_id: &str) -> Result<Vec<Item>, StoreError>;

    fn table_name(&self) -> &str;
}
