mod cli;
mod error;
mod observability;
mod server;

use clap::Parser;
use std::process::ExitCode;

use findata_core::ToolDispatcher;

use crate::cli::Cli;
use crate::error::ServerError;
use crate::server::McpServer;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run() -> Result<(), ServerError> {
    let cli = Cli::parse();
    observability::init_tracing();

    let config = cli.client_config()?;
    tracing::info!(
        base_url = config.base_url(),
        timeout_ms = config.timeout_ms(),
        max_retries = config.retry().max_retries,
        "configuration loaded"
    );

    let server = McpServer::new(ToolDispatcher::from_config(config));
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    server.serve(stdin, tokio::io::stdout()).await
}
