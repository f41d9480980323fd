//! OpenAPI specification and documentation.

#![allow(dead_code)] // Path functions are only used by utoipa for documentation generation

use currency_types::dto::{
    AverageResponse, BalanceUpdateRequest, BalanceUpdateResponse, ConvertRequest, ConvertResponse,
    CreateRateRequest, ListWalletsResponse, MessageResponse, WalletEntry,
};
use utoipa::OpenApi;

// Dummy functions to generate path documentation
// These are not the actual handlers, just for OpenAPI path generation

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service and storage are reachable", body = inline(serde_json::Value), example = json!({"status": "healthy"})),
        (status = 503, description = "Storage unreachable")
    )
)]
async fn health() {}

/// Record a rate observation
#[utoipa::path(
    post,
    path = "/api/v1/rates",
    tag = "rates",
    request_body = CreateRateRequest,
    responses(
        (status = 201, description = "Rate recorded", body = MessageResponse),
        (status = 400, description = "Missing, unknown, or non-positive value")
    )
)]
async fn create_rate() {}

/// Average of the most recent rates
#[utoipa::path(
    get,
    path = "/api/v1/rates/average",
    tag = "rates",
    params(
        ("limit" = Option<i64>, Query, description = "How many recent rates to average (default 10)")
    ),
    responses(
        (status = 200, description = "Average and count; zero values when no rates exist", body = AverageResponse),
        (status = 400, description = "Non-positive or malformed limit")
    )
)]
async fn average_rate() {}

/// Create a wallet or apply a signed balance delta
#[utoipa::path(
    post,
    path = "/api/v1/wallets/balance",
    tag = "wallets",
    request_body = BalanceUpdateRequest,
    responses(
        (status = 200, description = "Wallet created or balance updated", body = BalanceUpdateResponse),
        (status = 400, description = "Malformed body, bad wallet number, or withdrawal from a nonexistent wallet"),
        (status = 409, description = "Insufficient funds (body carries the unchanged balance) or a retryable creation conflict", body = BalanceUpdateResponse)
    )
)]
async fn update_balance() {}

/// List all wallets
#[utoipa::path(
    get,
    path = "/api/v1/wallets",
    tag = "wallets",
    responses(
        (status = 200, description = "All wallets, oldest first", body = ListWalletsResponse)
    )
)]
async fn list_wallets() {}

/// Convert at the latest rate and deduct from the source wallet
#[utoipa::path(
    post,
    path = "/api/v1/wallets/convert",
    tag = "wallets",
    request_body = ConvertRequest,
    responses(
        (status = 200, description = "Conversion applied", body = ConvertResponse),
        (status = 400, description = "Malformed body, bad wallet number, or non-positive amount"),
        (status = 404, description = "Source wallet not found"),
        (status = 409, description = "Insufficient funds (body carries the unchanged balance)", body = ConvertResponse),
        (status = 503, description = "No exchange rate recorded yet")
    )
)]
async fn convert() {}

/// OpenAPI document for the currency service.
#[derive(OpenApi)]
#[openapi(
    paths(health, create_rate, average_rate, update_balance, list_wallets, convert),
    components(schemas(
        CreateRateRequest,
        MessageResponse,
        AverageResponse,
        BalanceUpdateRequest,
        BalanceUpdateResponse,
        WalletEntry,
        ListWalletsResponse,
        ConvertRequest,
        ConvertResponse,
    )),
    tags(
        (name = "rates", description = "Exchange rate recording and averaging"),
        (name = "wallets", description = "Wallet balance mutations and conversion"),
        (name = "health", description = "Service health")
    ),
    info(
        title = "Currency Service API",
        description = "Currency exchange rates and wallet balances",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;
