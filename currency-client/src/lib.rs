//! # Currency Client SDK
//!
//! A typed Rust client for the Currency API.

use currency_types::{
    AverageResponse, BalanceUpdateRequest, BalanceUpdateResponse, ConvertRequest, ConvertResponse,
    CreateRateRequest, ListWalletsResponse, MessageResponse,
};
use reqwest::Client;
use serde::de::DeserializeOwned;

/// Error type for client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Currency API client.
pub struct CurrencyClient {
    base_url: String,
    http: Client,
}

impl CurrencyClient {
    /// Creates a new client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    /// Checks if the API is healthy.
    pub async fn health(&self) -> Result<bool, ClientError> {
        let resp = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        Ok(resp.status().is_success())
    }

    /// Records a new rate observation.
    pub async fn record_rate(&self, value: f64) -> Result<MessageResponse, ClientError> {
        let req = CreateRateRequest { value };
        self.post("/api/v1/rates", &req).await
    }

    /// Fetches the average of the `limit` most recent rates.
    pub async fn average_rate(&self, limit: i64) -> Result<AverageResponse, ClientError> {
        self.get(&format!("/api/v1/rates/average?limit={}", limit))
            .await
    }

    /// Creates a wallet or applies a signed balance delta.
    pub async fn update_balance(
        &self,
        wallet_number: &str,
        amount: f64,
    ) -> Result<BalanceUpdateResponse, ClientError> {
        let req = BalanceUpdateRequest {
            wallet_number: wallet_number.to_string(),
            amount,
        };
        self.post("/api/v1/wallets/balance", &req).await
    }

    /// Lists all wallets.
    pub async fn list_wallets(&self) -> Result<ListWalletsResponse, ClientError> {
        self.get("/api/v1/wallets").await
    }

    /// Converts a quantity at the latest rate and deducts it from the
    /// source wallet.
    pub async fn convert(
        &self,
        source_wallet_number: &str,
        amount_to_convert: f64,
    ) -> Result<ConvertResponse, ClientError> {
        let req = ConvertRequest {
            source_wallet_number: source_wallet_number.to_string(),
            amount_to_convert,
            first_name: None,
            last_name: None,
            user_id: None,
        };
        self.post("/api/v1/wallets/convert", &req).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let resp = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await?;
        self.handle_response(resp).await
    }

    async fn post<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let resp = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await?;
        self.handle_response(resp).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            Ok(serde_json::from_str(&body)?)
        } else {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| {
                    // Business rejections (409) carry a `message`; error
                    // envelopes carry `error`.
                    v.get("error")
                        .or_else(|| v.get("message"))
                        .and_then(|e| e.as_str())
                        .map(String::from)
                })
                .unwrap_or(body);
            Err(ClientError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}
