use crate::{server, tasks};
use clap::{Args, Parser, Subcommand};
use propertypro::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "PropertyPro",
    about = "Run the PropertyPro API and its mail and database maintenance tasks",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Classify unseen inbox mail and forward it to department mailboxes
    ScanInbox(ScanArgs),
    /// Create or upgrade the database schema and exit
    Migrate,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ScanArgs {
    /// Keep scanning, pausing this many seconds between passes
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub(crate) interval_secs: Option<u64>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::ScanInbox(args) => tasks::scan_inbox(args).await,
        Command::Migrate => tasks::migrate().await,
    }
}
