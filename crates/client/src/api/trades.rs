//! Cross-chain trade portal endpoints.

use super::push_param;
use crate::client::QortalClient;
use crate::error::QortalResult;
use serde_json::Value;

/// Filters for open trade offers.
#[derive(Debug, Clone, Default)]
pub struct TradeOffersQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub reverse: Option<bool>,
    /// Upper-case chain name, e.g. `LITECOIN`.
    pub foreign_blockchain: Option<String>,
}

/// Trades API.
pub struct TradesApi<'a> {
    client: &'a QortalClient,
}

impl<'a> TradesApi<'a> {
    pub(crate) fn new(client: &'a QortalClient) -> Self {
        Self { client }
    }

    /// Open cross-chain trade offers.
    pub async fn offers(&self, query: &TradeOffersQuery) -> QortalResult<Value> {
        let mut params = Vec::new();
        push_param(&mut params, "limit", query.limit);
        push_param(&mut params, "offset", query.offset);
        push_param(&mut params, "reverse", query.reverse);
        push_param(&mut params, "foreignBlockchain", query.foreign_blockchain.as_deref());

        self.client
            .http
            .get(&["crosschain", "tradeoffers"], &params, false)
            .await
    }
}
