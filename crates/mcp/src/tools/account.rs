// Account tools: overview, balance and address validation

use super::{
    address_schema, backend_failure, extract_names, json_schema_integer, json_schema_object,
    parse_args, to_int, to_text, Tool, ToolLimits, ToolOutcome, INVALID_ADDRESS,
    INVALID_PARAMETERS,
};
use crate::protocol::ToolSchema;
use crate::validators::is_valid_qortal_address;
use anyhow::Result;
use qortal_client::{NamesQuery, QortalClient, QortalError};
use serde::Deserialize;
use serde_json::{json, Map, Value};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AddressArgs {
    address: String,
}

/// Balance as a decimal string. Core usually sends a bare number or string;
/// some versions wrap it in an object.
fn normalize_balance(payload: &Value) -> String {
    match payload {
        Value::String(_) | Value::Number(_) | Value::Bool(_) => to_text(payload),
        Value::Object(map) => map
            .get("balance")
            .or_else(|| map.get("available"))
            .filter(|v| !v.is_null())
            .map(to_text)
            .unwrap_or_else(|| "0".to_string()),
        _ => "0".to_string(),
    }
}

/// Account info, QORT balance and owned names in one call.
pub struct AccountOverviewTool {
    client: QortalClient,
    limits: ToolLimits,
}

impl AccountOverviewTool {
    pub fn new(client: QortalClient, limits: ToolLimits) -> Self {
        Self { client, limits }
    }
}

#[async_trait::async_trait]
impl Tool for AccountOverviewTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_account_overview".to_string(),
            description: "Return account info, QORT balance, and names for an address.".to_string(),
            input_schema: json_schema_object(
                json!({ "address": address_schema("Qortal address (Q-prefixed Base58)") }),
                vec!["address"],
            ),
        }
    }

    async fn execute(&self, arguments: Map<String, Value>) -> Result<ToolOutcome> {
        let Some(args) = parse_args::<AddressArgs>("get_account_overview", arguments) else {
            return Ok(ToolOutcome::failure(INVALID_PARAMETERS));
        };
        if !is_valid_qortal_address(&args.address) {
            return Ok(ToolOutcome::failure(INVALID_ADDRESS));
        }
        let address = args.address.trim();

        let info = match self.client.addresses().info(address).await {
            Ok(info) => info,
            Err(e) => return backend_failure("get_account_overview", e),
        };

        let balance = match self.client.addresses().balance(address, 0).await {
            Ok(payload) => normalize_balance(&payload),
            Err(e) => return backend_failure("get_account_overview", e),
        };

        // Names are optional in this view; only transport and auth problems
        // fail the whole call.
        let names = match self.client.names().by_owner(address, &NamesQuery::default()).await {
            Ok(payload) => extract_names(&payload, self.limits.max_names as usize),
            Err(e @ (QortalError::Unreachable | QortalError::Unauthorized { .. })) => {
                return backend_failure("get_account_overview", e);
            }
            Err(e) => {
                tracing::warn!(address, error = ?e, "Name lookup failed");
                Vec::new()
            }
        };

        Ok(ToolOutcome::success(json!({
            "address": info.get("address").cloned().unwrap_or_else(|| address.into()),
            "publicKey": info.get("publicKey").cloned().unwrap_or(Value::Null),
            "blocksMinted": to_int(info.get("blocksMinted")).unwrap_or(0),
            "level": to_int(info.get("level")).unwrap_or(0),
            "balance": balance,
            "assetBalances": [],
            "names": names,
        })))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BalanceArgs {
    address: String,
    #[serde(default)]
    asset_id: Option<i64>,
}

pub struct BalanceTool {
    client: QortalClient,
}

impl BalanceTool {
    pub fn new(client: QortalClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Tool for BalanceTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_balance".to_string(),
            description: "Return balance for a given address and assetId (default 0/QORT)."
                .to_string(),
            input_schema: json_schema_object(
                json!({
                    "address": address_schema("Qortal address (Q-prefixed Base58)"),
                    "asset_id": json_schema_integer("Asset id (default 0 for QORT)", 0, None)
                }),
                vec!["address"],
            ),
        }
    }

    async fn execute(&self, arguments: Map<String, Value>) -> Result<ToolOutcome> {
        let Some(args) = parse_args::<BalanceArgs>("get_balance", arguments) else {
            return Ok(ToolOutcome::failure(INVALID_PARAMETERS));
        };
        if !is_valid_qortal_address(&args.address) {
            return Ok(ToolOutcome::failure(INVALID_ADDRESS));
        }
        let Ok(asset_id) = u64::try_from(args.asset_id.unwrap_or(0)) else {
            return Ok(ToolOutcome::failure("Invalid asset id."));
        };
        let address = args.address.trim();

        match self.client.addresses().balance(address, asset_id).await {
            Ok(payload) => Ok(ToolOutcome::success(json!({
                "address": address,
                "assetId": asset_id,
                "balance": normalize_balance(&payload),
            }))),
            Err(e) => backend_failure("get_balance", e),
        }
    }
}

/// Offline address format check.
pub struct ValidateAddressTool;

#[async_trait::async_trait]
impl Tool for ValidateAddressTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "validate_address".to_string(),
            description: "Validate Qortal address format without calling Core.".to_string(),
            input_schema: json_schema_object(
                json!({ "address": address_schema("Qortal address (Q-prefixed Base58)") }),
                vec!["address"],
            ),
        }
    }

    async fn execute(&self, arguments: Map<String, Value>) -> Result<ToolOutcome> {
        let Some(args) = parse_args::<AddressArgs>("validate_address", arguments) else {
            return Ok(ToolOutcome::failure(INVALID_PARAMETERS));
        };
        Ok(ToolOutcome::success(json!({
            "isValid": is_valid_qortal_address(&args.address)
        })))
    }
}
