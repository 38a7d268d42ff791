use crate::server::ServerConfig;
use anyhow::Result;
use clap::Parser;

mod bmi;
mod cli;
mod logs;
mod server;
mod utils;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = cli::Cli::parse();
    // Run the specified command
    match cli.command {
        cli::Commands::Start {
            bind_address,
            log_dir,
            log_file,
        } => {
            // Create the server config
            let config = ServerConfig {
                bind_address,
                log_dir: log_dir.into(),
                log_file,
            };
            server::start_server(config).await
        }
    }
}
