mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use pension_stats::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
