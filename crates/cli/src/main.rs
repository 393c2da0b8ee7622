//! Peerbook CLI - Database migrations and address book tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! peerbook migrate
//!
//! # Add a user to the directory
//! peerbook user add --username alice
//!
//! # Register a device as if the client had reported it
//! peerbook report --user 1 --device dev-1 --hostname h1 --platform linux
//!
//! # Show a user's address book
//! peerbook list --user 1 [--label 2024-01-01]
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "peerbook")]
#[command(author, version, about = "Peerbook CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage directory users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Submit a first-install report
    Report {
        /// Target user ID
        #[arg(short, long)]
        user: i64,

        /// Client device ID
        #[arg(short, long)]
        device: String,

        /// Device hostname
        #[arg(long)]
        hostname: Option<String>,

        /// Device platform (windows, linux, mac, android, ios)
        #[arg(short, long)]
        platform: Option<String>,
    },
    /// List a user's collections, or the devices in one
    List {
        /// User ID
        #[arg(short, long)]
        user: i64,

        /// Collection label (YYYY-MM-DD)
        #[arg(short, long)]
        label: Option<String>,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Add a user to the directory
    Add {
        /// Unique username
        #[arg(short, long)]
        username: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::Add { username } => {
                commands::users::add(&username).await?;
            }
        },
        Commands::Report {
            user,
            device,
            hostname,
            platform,
        } => commands::report::submit(user, device, hostname, platform).await?,
        Commands::List { user, label } => commands::list::run(user, label.as_deref()).await?,
    }
    Ok(())
}
