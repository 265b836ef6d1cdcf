//! # Leadsplit CLI
//!
//! The `leadsplit` binary is the operational interface for the service.
//!
//! ## Usage
//!
//! ```bash
//! leadsplit --config ./config/leadsplit.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `leadsplit init` | Create the SQLite database and run schema migrations |
//! | `leadsplit serve` | Start the HTTP API server |
//! | `leadsplit agents add` | Register a sales agent |
//! | `leadsplit agents list` | Show active agents |

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use leadsplit::models::{validate_agent_fields, NewAgent};
use leadsplit::store::{AgentDirectory, SqliteStore};
use leadsplit::{config, db, migrate, server};

/// Leadsplit — contact-list ingestion and distribution for sales agent teams.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/leadsplit.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "leadsplit",
    about = "Contact-list ingestion and distribution service for sales agent teams",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/leadsplit.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and all required tables (agents,
    /// lists, distributions, list_items). Idempotent — running it multiple
    /// times is safe.
    Init,

    /// Start the HTTP API server.
    ///
    /// Binds to `[server].bind` and serves the agent and list endpoints.
    /// Requires at least one entry under `[auth.tokens]`.
    Serve,

    /// Manage sales agents.
    Agents {
        #[command(subcommand)]
        action: AgentsAction,
    },
}

/// Agent management subcommands.
#[derive(Subcommand)]
enum AgentsAction {
    /// Register a new agent (active by default).
    Add {
        /// Display name.
        #[arg(long)]
        name: String,
        /// Unique email address.
        #[arg(long)]
        email: String,
        /// Mobile number with country code (e.g. +14155550123).
        #[arg(long)]
        mobile: String,
    },
    /// List active agents.
    List,
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("leadsplit=info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Agents { action } => match action {
            AgentsAction::Add {
                name,
                email,
                mobile,
            } => {
                validate_agent_fields(Some(&name), Some(&email), Some(&mobile))
                    .map_err(|message| anyhow::anyhow!(message))?;
                let pool = db::connect(&cfg).await?;
                let store = SqliteStore::new(pool);
                let agent = store.create_agent(&NewAgent {
                    name,
                    email,
                    mobile,
                })
                .await?;
                println!("Added agent {} <{}> ({})", agent.name, agent.email, agent.id);
            }
            AgentsAction::List => {
                let pool = db::connect(&cfg).await?;
                let store = SqliteStore::new(pool);
                let agents = store.list_active().await?;
                println!("{} active agent(s)", agents.len());
                for agent in agents {
                    println!("  {}  {} <{}>  {}", agent.id, agent.name, agent.email, agent.mobile);
                }
            }
        },
    }

    Ok(())
}
