//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRequest, Query, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use currency_types::{
    AppError, BalanceUpdateRequest, BalanceUpdateResponse, ConvertRequest, ConvertResponse,
    CreateRateRequest, CurrencyRepository, ListWalletsResponse, MessageResponse, MutationOutcome,
    WalletEntry,
};

use crate::CurrencyService;

/// Rates to average when the client does not pass a limit.
const DEFAULT_AVERAGE_LIMIT: i64 = 10;

/// Application state shared across handlers.
pub struct AppState<R: CurrencyRepository> {
    pub service: CurrencyService<R>,
}

/// Wrapper to implement IntoResponse for AppError (orphan rule workaround).
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::RateUnavailable => (StatusCode::SERVICE_UNAVAILABLE, self.0.to_string()),
            AppError::Internal(msg) => {
                // Full detail goes to the log; the caller gets an opaque body.
                tracing::error!(error = %msg, "internal failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = match &self.0 {
            // A creation race is safe to retry: nothing was committed.
            AppError::Conflict(_) => serde_json::json!({
                "error": message,
                "code": status.as_u16(),
                "retryable": true
            }),
            _ => serde_json::json!({
                "error": message,
                "code": status.as_u16()
            }),
        };

        (status, Json(body)).into_response()
    }
}

/// `Json` extractor that reports every rejection as a 400 with the standard
/// error envelope. Axum's own extractor splits malformed bodies across 400
/// (syntax) and 422 (data); here a body with unknown or ill-typed fields is
/// malformed input, full stop.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: serde::de::DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(ApiError(AppError::BadRequest(rejection.body_text()))),
        }
    }
}

fn mutation_message(outcome: &MutationOutcome) -> &'static str {
    match outcome {
        MutationOutcome::Created { .. } => "Wallet created",
        MutationOutcome::Deposited { .. } => "Deposit applied",
        MutationOutcome::Withdrawn { .. } => "Withdrawal applied",
        MutationOutcome::InsufficientFunds { .. } => "Insufficient funds for withdrawal",
    }
}

/// Health check endpoint; reports storage reachability.
pub async fn health<R: CurrencyRepository>(State(state): State<Arc<AppState<R>>>) -> Response {
    match state.service.health().await {
        Ok(()) => Json(serde_json::json!({ "status": "healthy" })).into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "status": "unavailable" })),
            )
                .into_response()
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rates
// ─────────────────────────────────────────────────────────────────────────────

/// Record a new rate observation.
#[tracing::instrument(skip(state), fields(value = req.value))]
pub async fn create_rate<R: CurrencyRepository>(
    State(state): State<Arc<AppState<R>>>,
    ApiJson(req): ApiJson<CreateRateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.service.record_rate(req.value).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Rate recorded".into(),
        }),
    ))
}

/// Query parameters for the average-rate endpoint.
#[derive(Debug, Deserialize)]
pub struct AverageRateParams {
    pub limit: Option<i64>,
}

/// Average of the most recent rates.
#[tracing::instrument(skip(state))]
pub async fn average_rate<R: CurrencyRepository>(
    State(state): State<Arc<AppState<R>>>,
    Query(params): Query<AverageRateParams>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_AVERAGE_LIMIT);

    let average = state.service.average_rate(limit).await?;
    Ok(Json(average))
}

// ─────────────────────────────────────────────────────────────────────────────
// Wallets
// ─────────────────────────────────────────────────────────────────────────────

/// Create a wallet or apply a signed balance delta.
///
/// Insufficient funds is not an error envelope: the same body shape comes
/// back with status 409 and the unchanged balance.
#[tracing::instrument(skip(state), fields(wallet = %req.wallet_number, amount = req.amount))]
pub async fn update_balance<R: CurrencyRepository>(
    State(state): State<Arc<AppState<R>>>,
    ApiJson(req): ApiJson<BalanceUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.service.update_balance(req).await?;

    let status = match outcome {
        MutationOutcome::InsufficientFunds { .. } => StatusCode::CONFLICT,
        _ => StatusCode::OK,
    };

    let body = BalanceUpdateResponse {
        wallet_number: outcome.number().to_string(),
        new_balance: outcome.balance(),
        message: mutation_message(&outcome).to_string(),
    };

    Ok((status, Json(body)))
}

/// List all wallets.
#[tracing::instrument(skip(state))]
pub async fn list_wallets<R: CurrencyRepository>(
    State(state): State<Arc<AppState<R>>>,
) -> Result<impl IntoResponse, ApiError> {
    let wallets = state.service.list_wallets().await?;

    let wallets = wallets
        .into_iter()
        .map(|w| WalletEntry {
            number: w.number.into_string(),
            balance: w.balance,
        })
        .collect();

    Ok(Json(ListWalletsResponse { wallets }))
}

/// Convert at the latest rate and deduct from the source wallet.
#[tracing::instrument(
    skip(state),
    fields(wallet = %req.source_wallet_number, amount = req.amount_to_convert)
)]
pub async fn convert<R: CurrencyRepository>(
    State(state): State<Arc<AppState<R>>>,
    ApiJson(req): ApiJson<ConvertRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let conversion = state.service.convert_and_deduct(req).await?;

    let (status, message) = match conversion.outcome {
        MutationOutcome::Withdrawn { .. } => {
            (StatusCode::OK, "Conversion applied and amount deducted")
        }
        MutationOutcome::InsufficientFunds { .. } => {
            (StatusCode::CONFLICT, "Insufficient funds for conversion")
        }
        _ => {
            return Err(ApiError(AppError::Internal(
                "unexpected outcome from deduction".into(),
            )));
        }
    };

    let body = ConvertResponse {
        source_wallet_number: conversion.number.to_string(),
        remaining_balance: conversion.outcome.balance(),
        converted_amount: conversion.converted_amount,
        rate_used: conversion.rate_used,
        message: message.to_string(),
    };

    Ok((status, Json(body)))
}
