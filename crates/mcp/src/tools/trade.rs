// Trade Portal tools

use super::{
    backend_failure, first_present, json_schema_boolean, json_schema_integer, json_schema_object,
    json_schema_string, limit_schema, parse_args, to_text, Tool, ToolLimits, ToolOutcome,
    INVALID_PARAMETERS,
};
use crate::protocol::ToolSchema;
use crate::validators::clamp_limit;
use anyhow::Result;
use qortal_client::{QortalClient, TradeOffersQuery};
use serde::Deserialize;
use serde_json::{json, Map, Value};

/// Foreign chains the Trade Portal supports.
pub const FOREIGN_BLOCKCHAINS: &[&str] = &[
    "BITCOIN",
    "LITECOIN",
    "DOGECOIN",
    "DIGIBYTE",
    "RAVENCOIN",
    "PIRATECHAIN",
];

/// Flatten one offer. Field names moved around between Core releases, so
/// each output field takes the first populated candidate.
fn normalize_offer(raw: &Value) -> Value {
    let field = |keys: &[&str]| first_present(raw, keys).cloned().unwrap_or(Value::Null);
    let amount = |keys: &[&str]| {
        first_present(raw, keys)
            .map(to_text)
            .unwrap_or_else(|| "0".to_string())
    };

    json!({
        "tradeAddress": field(&["tradeAddress", "qortalCreatorTradeAddress", "qortalAtAddress"]),
        "creator": field(&["creator", "qortalCreator"]),
        "offeringQort": amount(&["qortAmount", "offeringQort"]),
        "expectedForeign": amount(&[
            "expectedForeign",
            "expectedForeignAmount",
            "expectedBitcoin",
            "foreignAmount",
        ]),
        "foreignCurrency": field(&["foreignCurrency", "foreignBlockchain"]),
        "mode": raw.get("mode").cloned().unwrap_or(Value::Null),
        "timestamp": field(&["timestamp", "creationTimestamp"]),
    })
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TradeOffersArgs {
    #[serde(default)]
    limit: Option<i64>,
    #[serde(default)]
    offset: Option<i64>,
    #[serde(default)]
    reverse: Option<bool>,
    #[serde(default)]
    foreign_blockchain: Option<String>,
}

pub struct TradeOffersTool {
    client: QortalClient,
    limits: ToolLimits,
}

impl TradeOffersTool {
    pub fn new(client: QortalClient, limits: ToolLimits) -> Self {
        Self { client, limits }
    }
}

#[async_trait::async_trait]
impl Tool for TradeOffersTool {
    fn schema(&self) -> ToolSchema {
        let mut chain = json_schema_string("Only offers for this foreign chain (optional)");
        chain["enum"] = json!(FOREIGN_BLOCKCHAINS);

        ToolSchema {
            name: "list_trade_offers".to_string(),
            description: "List open cross-chain trade offers (limit enforced).".to_string(),
            input_schema: json_schema_object(
                json!({
                    "limit": limit_schema(self.limits.max_trade_offers),
                    "offset": json_schema_integer(
                        "Offset for pagination (optional)",
                        0,
                        Some(i64::from(self.limits.max_trade_offers)),
                    ),
                    "reverse": json_schema_boolean("Reverse sort order (optional)"),
                    "foreign_blockchain": chain
                }),
                vec![],
            ),
        }
    }

    async fn execute(&self, arguments: Map<String, Value>) -> Result<ToolOutcome> {
        let Some(args) = parse_args::<TradeOffersArgs>("list_trade_offers", arguments) else {
            return Ok(ToolOutcome::failure(INVALID_PARAMETERS));
        };

        let limit = clamp_limit(
            args.limit,
            self.limits.default_trade_offers,
            self.limits.max_trade_offers,
        );
        let offset = clamp_limit(args.offset, 0, self.limits.max_trade_offers);

        let foreign_blockchain = match args.foreign_blockchain.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(chain) => {
                let chain = chain.to_ascii_uppercase();
                if !FOREIGN_BLOCKCHAINS.contains(&chain.as_str()) {
                    return Ok(ToolOutcome::failure("Invalid foreign blockchain."));
                }
                Some(chain)
            }
        };

        let query = TradeOffersQuery {
            limit: Some(limit),
            offset: Some(offset),
            reverse: args.reverse,
            foreign_blockchain,
        };

        let raw = match self.client.trades().offers(&query).await {
            Ok(raw) => raw,
            Err(e) => return backend_failure("list_trade_offers", e),
        };

        let offers: Vec<Value> = raw
            .as_array()
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .filter(|entry| entry.is_object())
            .take(limit as usize)
            .map(normalize_offer)
            .collect();

        Ok(ToolOutcome::success(offers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{args, client_for, dead_client};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_offers_are_normalized_and_capped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/crosschain/tradeoffers"))
            .and(query_param("limit", "1"))
            .and(query_param("foreignBlockchain", "LITECOIN"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "qortalAtAddress": "AT1",
                    "qortalCreator": "Qcreator",
                    "qortAmount": 10.5,
                    "expectedForeignAmount": "0.1",
                    "foreignBlockchain": "LITECOIN",
                    "mode": "OFFERING",
                    "creationTimestamp": 1700000000000u64
                },
                {"qortalAtAddress": "AT2"}
            ])))
            .mount(&server)
            .await;

        let outcome = TradeOffersTool::new(client_for(&server), ToolLimits::default())
            .execute(args(json!({"limit": 1, "foreign_blockchain": " litecoin "})))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ToolOutcome::success(json!([{
                "tradeAddress": "AT1",
                "creator": "Qcreator",
                "offeringQort": "10.5",
                "expectedForeign": "0.1",
                "foreignCurrency": "LITECOIN",
                "mode": "OFFERING",
                "timestamp": 1700000000000u64
            }]))
        );
    }

    #[tokio::test]
    async fn test_default_limit_and_missing_amounts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/crosschain/tradeoffers"))
            .and(query_param("limit", "25"))
            .and(query_param("offset", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"tradeAddress": "AT"}])))
            .mount(&server)
            .await;

        let outcome = TradeOffersTool::new(client_for(&server), ToolLimits::default())
            .execute(Map::new())
            .await
            .unwrap();

        let ToolOutcome::Success(value) = outcome else {
            panic!("expected success");
        };
        assert_eq!(value[0]["offeringQort"], "0");
        assert_eq!(value[0]["expectedForeign"], "0");
        assert_eq!(value[0]["creator"], Value::Null);
    }

    #[tokio::test]
    async fn test_unknown_chain_is_rejected() {
        let outcome = TradeOffersTool::new(dead_client(), ToolLimits::default())
            .execute(args(json!({"foreign_blockchain": "ETHEREUM"})))
            .await
            .unwrap();
        assert_eq!(outcome, ToolOutcome::failure("Invalid foreign blockchain."));
    }

    #[tokio::test]
    async fn test_non_list_payload_yields_empty_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/crosschain/tradeoffers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"unexpected": 1})))
            .mount(&server)
            .await;

        let outcome = TradeOffersTool::new(client_for(&server), ToolLimits::default())
            .execute(Map::new())
            .await
            .unwrap();
        assert_eq!(outcome, ToolOutcome::success(json!([])));
    }
}
