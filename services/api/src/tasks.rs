use crate::cli::ScanArgs;
use crate::infra;
use propertypro::assistant::OpenAiChatClient;
use propertypro::config::AppConfig;
use propertypro::error::AppError;
use propertypro::mail::{DepartmentRoutes, ImapMailbox, InboxScanner, MailClassifier, SmtpMailer};
use propertypro::telemetry;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub(crate) async fn migrate() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    infra::open_store(&config).await?;
    info!("migrations applied");
    Ok(())
}

/// One inbox pass, or repeated passes when an interval is given. A failed
/// pass in repeat mode is logged and retried on the next tick.
pub(crate) async fn scan_inbox(args: ScanArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let scanner = InboxScanner::new(
        Arc::new(ImapMailbox::new(&config.imap)?),
        MailClassifier::new(Arc::new(OpenAiChatClient::new(&config.llm)?)),
        DepartmentRoutes::new(config.routing.clone()),
        Arc::new(SmtpMailer::new(&config.smtp)?),
    );

    let Some(interval) = args.interval_secs.map(Duration::from_secs) else {
        let processed = scanner.scan_once().await?;
        info!(processed = processed.len(), "inbox scan complete");
        return Ok(());
    };

    info!(interval_secs = interval.as_secs(), "scanning inbox until interrupted");
    loop {
        match scanner.scan_once().await {
            Ok(processed) => info!(processed = processed.len(), "inbox scan complete"),
            Err(err) => warn!(error = %err, "inbox scan failed"),
        }
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("inbox scanner stopped");
                return Ok(());
            }
        }
    }
}
