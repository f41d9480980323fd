//! Data Transfer Objects (DTOs) for requests and responses.
//!
//! Request bodies use `deny_unknown_fields`: an unrecognized JSON member is
//! malformed input, rejected at the boundary with 400.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ─────────────────────────────────────────────────────────────────────────────
// Rate DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to record a new exchange rate observation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateRateRequest {
    /// Rate value; must be strictly positive
    #[schema(example = 90.5)]
    pub value: f64,
}

/// Average of the most recent rate observations.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AverageResponse {
    /// Arithmetic mean of the rates read; 0 when none are recorded
    #[schema(example = 92.25)]
    pub average: f64,
    /// Number of rates the average was computed over
    #[schema(example = 3)]
    pub count: i64,
}

/// Simple success envelope.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Wallet DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to create a wallet or apply a signed balance delta.
///
/// A positive amount deposits (creating the wallet if absent); a negative
/// amount withdraws.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct BalanceUpdateRequest {
    /// Target wallet number (exactly 7 digits)
    #[schema(example = "1234567")]
    pub wallet_number: String,
    /// Signed delta: positive = deposit, negative = withdrawal
    #[schema(example = 100.5)]
    pub amount: f64,
}

/// Response after a balance mutation attempt.
///
/// Also used as the 409 body for insufficient funds, in which case
/// `new_balance` is the unchanged current balance.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BalanceUpdateResponse {
    #[schema(example = "1234567")]
    pub wallet_number: String,
    #[schema(example = 100.5)]
    pub new_balance: f64,
    pub message: String,
}

/// A wallet as listed by `GET /wallets`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WalletEntry {
    #[schema(example = "1234567")]
    pub number: String,
    #[schema(example = 100.5)]
    pub balance: f64,
}

/// Response listing all wallets.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ListWalletsResponse {
    pub wallets: Vec<WalletEntry>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Conversion DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to convert and deduct from a source wallet.
///
/// `first_name`, `last_name` and `user_id` are accepted for API
/// compatibility but carry no business logic.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ConvertRequest {
    /// Source wallet number (exactly 7 digits)
    #[schema(example = "1234567")]
    pub source_wallet_number: String,
    /// Quantity to convert; must be strictly positive
    #[schema(example = 1.5)]
    pub amount_to_convert: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Response after a conversion attempt.
///
/// Also used as the 409 body for insufficient funds, in which case
/// `remaining_balance` is the unchanged current balance.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConvertResponse {
    #[schema(example = "1234567")]
    pub source_wallet_number: String,
    #[schema(example = 64.25)]
    pub remaining_balance: f64,
    /// Amount deducted from the source wallet (`amount_to_convert * rate`)
    #[schema(example = 135.75)]
    pub converted_amount: f64,
    /// The rate the conversion was computed with
    #[schema(example = 90.5)]
    pub rate_used: f64,
    pub message: String,
}
