//! x402 protocol documents.
//!
//! Only the fields this client reads are typed; the raw JSON is kept
//! alongside so that it can be echoed back or reported verbatim.

use serde::{Deserialize, Serialize};
use serde_json::Value;

const fn default_version() -> u8 {
    1
}

/// Payment requirements returned by a server in a 402 response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequired {
    #[serde(default = "default_version")]
    pub x402_version: u8,
    /// Resource description (version 2 object, or a bare url)
    #[serde(default)]
    pub resource: Option<Value>,
    /// Accepted payment options, kept raw
    #[serde(default)]
    pub accepts: Vec<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl PaymentRequired {
    /// Interpret a decoded document, if it has the expected shape.
    pub fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }

    /// Accepted options that parse, paired with their raw form.
    pub fn options(&self) -> impl Iterator<Item = (&Value, PaymentOption)> {
        self.accepts
            .iter()
            .filter_map(|raw| serde_json::from_value(raw.clone()).ok().map(|opt| (raw, opt)))
    }

    /// The first accepted option, used for summaries.
    pub fn first_option(&self) -> Option<PaymentOption> {
        self.options().next().map(|(_, opt)| opt)
    }

    /// Url of the paid resource, from the document or its first option.
    pub fn resource_url(&self) -> Option<String> {
        let from_value = |v: &Value| match v {
            Value::String(url) => Some(url.clone()),
            Value::Object(obj) => obj.get("url").and_then(Value::as_str).map(str::to_string),
            _ => None,
        };

        self.resource
            .as_ref()
            .and_then(from_value)
            .or_else(|| self.accepts.first().and_then(|a| a.get("resource")).and_then(from_value))
            .filter(|url| !url.is_empty())
    }
}

/// One accepted way to pay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOption {
    pub scheme: String,
    /// CAIP-2 id (`eip155:8453`) or, in version 1, a network name
    pub network: String,
    /// Amount in atomic units, base-10
    #[serde(alias = "maxAmountRequired")]
    pub amount: String,
    /// Token contract address
    pub asset: String,
    #[serde(alias = "payToAddress")]
    pub pay_to: String,
    #[serde(default)]
    pub max_timeout_seconds: u64,
    #[serde(default)]
    pub extra: Option<OptionExtra>,
}

impl PaymentOption {
    /// Asset display name, falling back to the asset identifier.
    pub fn asset_name(&self) -> &str {
        self.extra
            .as_ref()
            .and_then(|e| e.name.as_deref())
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.asset)
    }
}

/// Scheme-specific metadata; for EVM tokens the EIP-712 domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionExtra {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

/// Settlement result returned with the paid response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub transaction: Option<String>,
    #[serde(default)]
    pub network: Option<String>,
    #[serde(default)]
    pub payer: Option<String>,
    #[serde(default)]
    pub error_reason: Option<String>,
}

impl SettlementResponse {
    pub fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}
