//! ThinkFirst CLI — the main entry point.
//!
//! Commands:
//! - `onboard`  — Write the default config
//! - `chat`     — Interactive tutoring session or a single message
//! - `gateway`  — Start the HTTP API server
//! - `classify` — Show how a message would be classified, offline
//! - `doctor`   — Diagnose configuration

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "thinkfirst",
    about = "ThinkFirst — a tutor that hints before it tells",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration file
    Onboard,

    /// Chat with the tutor
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Unlock hints over time as well as by attempts
        #[arg(long)]
        time_travel: bool,
    },

    /// Start the HTTP gateway server
    Gateway {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Classify a message and print the resulting context and instruction
    Classify {
        /// The user message
        message: String,

        /// Previous conversation context as JSON
        #[arg(long)]
        context: Option<String>,

        /// Conversation history as a JSON array of {role, text}
        #[arg(long)]
        history: Option<String>,
    },

    /// Diagnose configuration and connectivity
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Chat {
            message,
            time_travel,
        } => commands::chat::run(message, time_travel).await?,
        Commands::Gateway { port } => commands::gateway::run(port).await?,
        Commands::Classify {
            message,
            context,
            history,
        } => commands::classify::run(&message, context.as_deref(), history.as_deref())?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
