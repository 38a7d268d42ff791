use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bmi-api")]
#[command(about = "BMI Calculator API Server")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    Start {
        /// The HTTP server bind address (host:port)
        #[arg(long, env = "BMI_API_BIND_ADDRESS", default_value = "0.0.0.0:5000")]
        bind_address: String,
        /// The directory where the log file is written
        #[arg(long, env = "BMI_API_LOG_DIR", default_value = "logs")]
        log_dir: String,
        /// The name of the append-only log file
        #[arg(long, env = "BMI_API_LOG_FILE", default_value = "bmi-api.log")]
        log_file: String,
    },
}
