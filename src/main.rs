use clap::Parser;
use ip_reporter::cli::Cli;
use ip_reporter::errors;
use ip_reporter::run;

#[tokio::main]
async fn main() -> Result<(), errors::AppError> {
    run(Cli::parse()).await
}
