use serde::{Deserialize, Serialize};

use super::{EntityId, MinorUnits};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Wallet {
    #[serde(default)]
    pub balance_minor: MinorUnits,
}

/// Payment methods offered at top-up
pub const PAYMENT_METHODS: &[&str] = &["blik", "card", "transfer"];

pub const DEFAULT_PAYMENT_METHOD: &str = "blik";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopUpRequest {
    pub amount_minor: MinorUnits,
    pub payment_method: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopUpReceipt {
    #[serde(rename = "paymentId", default)]
    pub payment_id: Option<EntityId>,
    #[serde(rename = "newBalance", default)]
    pub new_balance: MinorUnits,
}
