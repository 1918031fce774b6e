//! # Storefront Checkout
//!
//! Checkout proxy between the storefront cart and PayPal.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export PAYPAL_CLIENT_ID=...
//! export PAYPAL_CLIENT_SECRET=...
//! export PUBLIC_BASE_URL=https://shop.example
//!
//! # Run the server (LOG_FORMAT=json for structured logs)
//! storefront-checkout
//! ```

use checkout_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    // Initialize application state
    let state = AppState::new()?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!(
        "PayPal: base={}, env={}, credentials={}",
        state.paypal.api_base_url,
        state.paypal.environment(),
        state.paypal.credentials().is_ok()
    );
    info!(
        "Policy: minimum_total={}, tolerance_minor={}, currency={}",
        state.config.policy.minimum_total,
        state.config.policy.tolerance_minor,
        state.config.policy.default_currency
    );
    info!("CORS origins: {:?}", state.config.cors_origins());

    // Create router
    let app = routes::create_router(state);

    info!("Storefront checkout listening on http://{}", addr);
    if !is_prod {
        info!("Create order: POST http://{}/api/paypal/orders", addr);
        info!("Capture: POST http://{}/api/paypal/orders/{{id}}/capture", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
