use metrics_exporter_prometheus::PrometheusHandle;
use propertypro::accounts::TokenIssuer;
use propertypro::assistant::OpenAiChatClient;
use propertypro::config::AppConfig;
use propertypro::db::{self, SqliteStore};
use propertypro::error::AppError;
use propertypro::mail::{DepartmentRoutes, SmtpMailer};
use propertypro::policies::PolicyLibrary;
use propertypro::qube::{QubeClient, WebhookVerifier};
use propertypro::{ApiState, Integrations};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Opens the configured database and brings its schema up to date.
pub(crate) async fn open_store(config: &AppConfig) -> Result<SqliteStore, AppError> {
    let pool = db::connect(&config.database).await?;
    db::migrate(&pool).await?;
    info!(path = %config.database.path.display(), "database ready");
    Ok(SqliteStore::new(pool))
}

/// Concrete clients for every external system.
pub(crate) fn integrations(config: &AppConfig) -> Result<Integrations, AppError> {
    let policies = PolicyLibrary::load(&config.policies.directory)?;
    info!(documents = policies.len(), "policy library loaded");

    if config.llm.api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set; ticket replies fall back to the default text");
    }

    Ok(Integrations {
        llm: Arc::new(OpenAiChatClient::new(&config.llm)?),
        mailer: Arc::new(SmtpMailer::new(&config.smtp)?),
        cases: Arc::new(QubeClient::new(&config.qube)?),
        policies: Arc::new(policies),
    })
}

pub(crate) fn api_state(config: &AppConfig, store: SqliteStore) -> Result<ApiState, AppError> {
    Ok(ApiState::new(
        store,
        TokenIssuer::new(&config.auth),
        DepartmentRoutes::new(config.routing.clone()),
        WebhookVerifier::new(config.qube.webhook_secret.clone()),
        integrations(config)?,
    ))
}
