use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, DEFAULT_REST_ADDR};
use refiner_core::config::lookup_timeout_from_env_value;
use refiner_core::constants::DEFAULT_TCR_URL;
use refiner_core::{CoreConfig, RefinerService};

/// Main entry point for the message refiner
///
/// Resolves configuration once, then serves the REST API (with OpenAPI/Swagger UI).
///
/// # Environment Variables
/// - `REFINER_REST_ADDR`: REST server address (default: "0.0.0.0:8080")
/// - `TCR_URL`: Base address of the Reference Lookup Service (default: "http://localhost:8081")
/// - `REFINER_LOOKUP_TIMEOUT_SECS`: Per-lookup timeout in seconds (default: none)
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration is invalid or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("refiner_run=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("refiner_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("REFINER_REST_ADDR").unwrap_or_else(|_| DEFAULT_REST_ADDR.into());
    let tcr_url = std::env::var("TCR_URL").unwrap_or_else(|_| DEFAULT_TCR_URL.into());
    let lookup_timeout =
        lookup_timeout_from_env_value(std::env::var("REFINER_LOOKUP_TIMEOUT_SECS").ok())?;

    let cfg = CoreConfig::new(&tcr_url, lookup_timeout)?;
    let refiner = RefinerService::new(&cfg)?;

    tracing::info!("++ Reference lookups against {}", cfg.reference_base_url());
    tracing::info!("++ Starting message refiner REST on {}", rest_addr);

    let app = api_rest::app(AppState::new(refiner));
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
