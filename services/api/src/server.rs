use crate::cli::ServeArgs;
use crate::infra::{self, AppState};
use crate::routes::with_operational_routes;
use axum::http::HeaderValue;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use propertypro::api_router;
use propertypro::config::{AppConfig, ConfigError};
use propertypro::error::AppError;
use propertypro::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = infra::open_store(&config).await?;
    let api_state = infra::api_state(&config, store)?;

    let app = with_operational_routes(api_router(api_state))
        .layer(cors(&config.server.cors_origin)?)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "propertypro api ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("propertypro api stopped");
    Ok(())
}

/// Credentialed CORS for the single configured frontend origin.
fn cors(origin: &str) -> Result<CorsLayer, ConfigError> {
    let origin = HeaderValue::from_str(origin).map_err(|_| ConfigError::Invalid {
        name: "CORS_ALLOWED_ORIGIN",
        expected: "a valid origin",
    })?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "unable to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
