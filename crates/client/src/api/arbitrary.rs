//! QDN (arbitrary data) endpoints.

use super::push_param;
use crate::client::QortalClient;
use crate::error::QortalResult;
use serde_json::Value;

/// Filters for a QDN resource search.
#[derive(Debug, Clone, Default)]
pub struct QdnSearchQuery {
    pub address: Option<String>,
    pub service: Option<u16>,
    pub limit: Option<u32>,
}

/// Arbitrary API.
pub struct ArbitraryApi<'a> {
    client: &'a QortalClient,
}

impl<'a> ArbitraryApi<'a> {
    pub(crate) fn new(client: &'a QortalClient) -> Self {
        Self { client }
    }

    /// Search published resources by publisher address and/or service code.
    pub async fn search(&self, query: &QdnSearchQuery) -> QortalResult<Value> {
        let mut params = Vec::new();
        push_param(&mut params, "address", query.address.as_deref());
        push_param(&mut params, "service", query.service);
        push_param(&mut params, "limit", query.limit);

        self.client
            .http
            .get(&["arbitrary", "resources", "search"], &params, false)
            .await
    }
}
