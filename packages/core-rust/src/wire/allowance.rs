use serde::{Deserialize, Serialize};

/// Body of `GET /allowance`. Amounts are decimal strings because `uint256`
/// does not fit in a JSON number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowanceResponse {
    pub allowance: String,
    pub facilitator_address: String,
    pub owner_address: String,
}

/// Body of `POST /approve`; an absent `amount` means the maximum.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
}

/// Response of `POST /approve`. The transaction is submitted, not confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveResponse {
    pub transaction_hash: String,
    pub facilitator_address: String,
    pub amount: String,
}
