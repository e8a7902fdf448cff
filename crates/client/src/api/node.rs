//! Node administration endpoints.

use crate::client::QortalClient;
use crate::error::QortalResult;
use serde_json::Value;

/// Node API for status and build information.
pub struct NodeApi<'a> {
    client: &'a QortalClient,
}

impl<'a> NodeApi<'a> {
    pub(crate) fn new(client: &'a QortalClient) -> Self {
        Self { client }
    }

    /// Synchronization and connectivity state. Requires the API key.
    pub async fn status(&self) -> QortalResult<Value> {
        self.client.http.get(&["admin", "status"], &[], true).await
    }

    /// Build version, uptime and node identifiers.
    pub async fn info(&self) -> QortalResult<Value> {
        self.client.http.get(&["admin", "info"], &[], false).await
    }

    /// Transaction and block counters. Requires the API key.
    pub async fn summary(&self) -> QortalResult<Value> {
        self.client.http.get(&["admin", "summary"], &[], true).await
    }

    /// Uptime in milliseconds.
    pub async fn uptime(&self) -> QortalResult<Value> {
        self.client.http.get(&["admin", "uptime"], &[], false).await
    }
}
