//! Registered name endpoints.

use super::push_param;
use crate::client::QortalClient;
use crate::error::QortalResult;
use serde_json::Value;

/// Pagination for name listings.
#[derive(Debug, Clone, Default)]
pub struct NamesQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub reverse: Option<bool>,
}

/// Names API.
pub struct NamesApi<'a> {
    client: &'a QortalClient,
}

impl<'a> NamesApi<'a> {
    pub(crate) fn new(client: &'a QortalClient) -> Self {
        Self { client }
    }

    /// Details of a registered name.
    pub async fn info(&self, name: &str) -> QortalResult<Value> {
        self.client.http.get(&["names", name], &[], false).await
    }

    /// Names owned by `address`.
    pub async fn by_owner(&self, address: &str, query: &NamesQuery) -> QortalResult<Value> {
        let mut params = Vec::new();
        push_param(&mut params, "limit", query.limit);
        push_param(&mut params, "offset", query.offset);
        push_param(&mut params, "reverse", query.reverse);

        self.client
            .http
            .get(&["names", "address", address], &params, false)
            .await
    }

    /// Primary name of `address`.
    pub async fn primary(&self, address: &str) -> QortalResult<Value> {
        self.client
            .http
            .get(&["names", "primary", address], &[], false)
            .await
    }
}
