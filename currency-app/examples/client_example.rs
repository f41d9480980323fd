//! Client example demonstrating full wallet flows against a running server.
//!
//! Run with: cargo run -p currency-app --example client_example --no-default-features --features sqlite

use std::net::SocketAddr;

use tempfile::tempdir;
use tokio::net::TcpListener;

use currency_client::CurrencyClient;
use currency_hex::{CurrencyService, inbound::HttpServer};
use currency_repo::build_repo;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt().with_env_filter("info").init();

    // Find an available port
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr: SocketAddr = listener.local_addr()?;
    let port = addr.port();
    drop(listener);

    // Use a temp file-backed SQLite DB
    let tmp = tempdir()?;
    let db_path = tmp.path().join("currency.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    println!("Starting server on port {port}...");
    println!("   Database: {db_url}");

    // Build repository (handles connection and migration)
    let repo = build_repo(&db_url).await?;

    // Start server in background
    let service = CurrencyService::new(repo);
    let server = HttpServer::new(service);
    let router = server.router();

    let server_addr = format!("127.0.0.1:{port}");
    tokio::spawn(async move {
        axum::serve(
            TcpListener::bind(&server_addr).await.unwrap(),
            router.into_make_service(),
        )
        .await
        .unwrap();
    });

    // Wait for server to start
    tokio::time::sleep(std::time::Duration::from_millis(500)).await;

    // Create client
    let base_url = format!("http://127.0.0.1:{port}");
    let client = CurrencyClient::new(&base_url);

    // ─────────────────────────────────────────────────────────────────────────
    // Demo: Full wallet flow
    // ─────────────────────────────────────────────────────────────────────────

    // Health check
    let health = client.health().await?;
    println!("Server health: {health}");

    // Record some rates
    for value in [88.0, 89.5, 90.5] {
        client.record_rate(value).await?;
    }
    println!("Recorded 3 rates");

    let average = client.average_rate(3).await?;
    println!(
        "   Average of last {} rates: {:.4}",
        average.count, average.average
    );

    // Create a wallet with an initial deposit
    let created = client.update_balance("1234567", 200.0).await?;
    println!("{}: balance {:.2}", created.message, created.new_balance);

    // Deposit and withdraw
    let deposited = client.update_balance("1234567", 49.5).await?;
    println!("{}: balance {:.2}", deposited.message, deposited.new_balance);

    let withdrawn = client.update_balance("1234567", -49.5).await?;
    println!("{}: balance {:.2}", withdrawn.message, withdrawn.new_balance);

    // Convert at the latest rate
    let conversion = client.convert("1234567", 1.5).await?;
    println!(
        "{}: deducted {:.2} at rate {:.2}, remaining {:.2}",
        conversion.message,
        conversion.converted_amount,
        conversion.rate_used,
        conversion.remaining_balance
    );

    // List all wallets
    let listing = client.list_wallets().await?;
    println!("\nAll wallets:");
    for wallet in listing.wallets {
        println!("   - {}: {:.2}", wallet.number, wallet.balance);
    }

    println!("\nExample completed successfully!");

    Ok(())
}
