//! Account endpoints.

use crate::client::QortalClient;
use crate::error::QortalResult;
use serde_json::Value;

/// Addresses API for account info and balances.
pub struct AddressesApi<'a> {
    client: &'a QortalClient,
}

impl<'a> AddressesApi<'a> {
    pub(crate) fn new(client: &'a QortalClient) -> Self {
        Self { client }
    }

    /// Base account information (public key, level, blocks minted).
    pub async fn info(&self, address: &str) -> QortalResult<Value> {
        self.client.http.get(&["addresses", address], &[], false).await
    }

    /// Balance of `asset_id` held by `address`. Asset 0 is QORT.
    pub async fn balance(&self, address: &str, asset_id: u64) -> QortalResult<Value> {
        self.client
            .http
            .get(
                &["addresses", "balance", address],
                &[("assetId", asset_id.to_string())],
                false,
            )
            .await
    }
}
