//! HTTP Server configuration and startup.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use currency_types::CurrencyRepository;

use super::handlers::{self, AppState};
use crate::CurrencyService;
use crate::openapi::ApiDoc;

/// HTTP Server for the Currency API.
pub struct HttpServer<R: CurrencyRepository> {
    state: Arc<AppState<R>>,
}

impl<R: CurrencyRepository> HttpServer<R> {
    /// Creates a new HTTP server with the given service.
    pub fn new(service: CurrencyService<R>) -> Self {
        Self {
            state: Arc::new(AppState { service }),
        }
    }

    /// Builds the Axum router with all routes.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(handlers::health::<R>))
            .route("/api/v1/rates", post(handlers::create_rate::<R>))
            .route("/api/v1/rates/average", get(handlers::average_rate::<R>))
            .route("/api/v1/wallets", get(handlers::list_wallets::<R>))
            .route("/api/v1/wallets/balance", post(handlers::update_balance::<R>))
            .route("/api/v1/wallets/convert", post(handlers::convert::<R>))
            .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", ApiDoc::openapi()))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Runs the server on the given address with graceful shutdown.
    pub async fn run(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Server listening on {}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
