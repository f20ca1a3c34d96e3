use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use marketlens_core::config::Config;
use marketlens_csv::{DatasetCache, SourceFiles};
use marketlens_server::state::AppState;

/// `marketlens health`: liveness probe for container healthchecks.
///
/// Calls `GET http://localhost:$MARKETLENS_PORT/health`.
/// Exits 0 if the server responds with HTTP 200, exits 1 otherwise.
fn run_health_check() -> ! {
    let port = std::env::var("MARKETLENS_PORT").unwrap_or_else(|_| "3000".to_string());
    let url = format!("http://localhost:{}/health", port);
    match ureq::get(&url).call() {
        Ok(resp) if resp.status() == 200 => std::process::exit(0),
        _ => std::process::exit(1),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(|s| s.as_str()) == Some("health") {
        run_health_check();
    }
    // Structured JSON logging. Level controlled via RUST_LOG.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("marketlens=info".parse()?),
        )
        .json()
        .init();

    let cfg = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    // A broken source file fails startup.
    let cache = DatasetCache::new(SourceFiles::from_config(&cfg));
    let dataset = tokio::task::block_in_place(|| cache.get())?;
    info!(
        business_days = dataset.business().len(),
        ad_rows = dataset.ads().len(),
        "Dataset ready"
    );

    let state = Arc::new(AppState::new(cache, cfg.clone()));

    let addr = format!("0.0.0.0:{}", cfg.port);
    let app = marketlens_server::app::build_app(Arc::clone(&state));

    info!(port = cfg.port, data_dir = %cfg.data_dir, "MarketLens listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    info!("MarketLens stopped");
    Ok(())
}
