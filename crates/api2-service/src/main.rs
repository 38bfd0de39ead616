//! api2 service entry point.
//!
//! # Configuration
//!
//! - `AIRTABLE_API_KEY` - Access credential (required)
//! - `APP_ENV` - `production`, `development` (default) or `test`
//! - `PORT` - HTTP port (default: 5000)
//! - `AIRTABLE_API_URL`, `AIRTABLE_TIMEOUT_SECS`, `AIRTABLE_BASES` - Upstream settings
//! - `RUST_LOG` - Log level (default: info)
//! - `LOG_FORMAT` - Log format: json (default) or text
//! - `METRICS_ENABLED`, `METRICS_PATH` - Prometheus endpoint

use std::net::SocketAddr;

use tracing::{error, info, warn};

use api2_service::router;
use api2_service_shared::{
    AppState, LoggingConfig, MetricsConfig, ServiceConfig, init_logging, init_metrics,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logging_config = LoggingConfig::from_env().with_service("api2");
    init_logging(&logging_config);

    let config = ServiceConfig::from_env().inspect_err(|e| {
        error!(error = %e, "invalid configuration");
    })?;

    let metrics_config = MetricsConfig::from_env();
    let metrics_path = match init_metrics(&metrics_config) {
        Ok(()) => Some(metrics_config.path.as_str()),
        Err(e) => {
            // Metrics are optional; serve without the endpoint.
            warn!(error = %e, "continuing without metrics");
            None
        }
    };

    info!(mode = %config.mode, port = config.port, "starting api2");

    let state = AppState::from_config(&config)?;
    let app = router(state, metrics_path);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound = listener.local_addr()?;
    info!(addr = %bound, "Up and listening on {}", bound.port());

    axum::serve(listener, app).await?;

    Ok(())
}
