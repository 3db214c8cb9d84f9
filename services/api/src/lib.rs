mod cli;
mod infra;
mod routes;
mod server;
mod tasks;

use propertypro::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
