//! Solace CLI: the main entry point.
//!
//! Commands:
//! - `onboard`: Write a default config file
//! - `chat`: Interactive or single-message chat through the reply pipeline
//! - `daemon`: Serve JSON requests on stdin with maintenance running
//! - `stats`: Run sample requests and print service statistics
//! - `status`: Show configuration status
//! - `doctor`: Diagnose configuration and provider health

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "solace",
    about = "Solace — reply orchestration for mental-health chat",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration file
    Onboard {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Chat through the reply pipeline
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Conversation to continue (a new one is created by default)
        #[arg(short, long)]
        conversation: Option<String>,

        /// Requester ID attached to every request
        #[arg(short, long, default_value = "cli-user")]
        user: String,

        /// Print the full reply as JSON
        #[arg(long)]
        json: bool,
    },

    /// Serve line-delimited JSON requests on stdin, with maintenance jobs
    Daemon,

    /// Run sample requests and print per-provider statistics
    Stats {
        /// How many sample requests to send
        #[arg(short, long, default_value_t = 5)]
        samples: usize,
    },

    /// Show configuration status
    Status,

    /// Diagnose configuration and provider health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Onboard { force } => commands::onboard::run(force).await?,
        Commands::Chat {
            message,
            conversation,
            user,
            json,
        } => commands::chat::run(message, conversation, user, json).await?,
        Commands::Daemon => commands::daemon::run().await?,
        Commands::Stats { samples } => commands::stats::run(samples).await?,
        Commands::Status => commands::status::run().await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
