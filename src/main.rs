//! riskagg - temporal risk aggregation for peer-support conversations.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use riskagg::cli::{self, App};
use riskagg::config::Config;
use riskagg::Error;

#[derive(Parser)]
#[command(name = "riskagg")]
#[command(about = "riskagg - temporal risk aggregation for peer-support conversations")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.riskagg/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Fusion thresholds as JSON, overriding the [fusion] config block
    #[arg(long, global = true)]
    fusion: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Store classified messages from a JSON Lines file
    Ingest {
        /// Input file, one record per line
        file: PathBuf,
    },

    /// Recompute and show one user's profile
    Profile {
        user_id: String,

        /// Last login time (RFC 3339)
        #[arg(long)]
        login: Option<DateTime<Utc>>,
    },

    /// List stored profiles, highest risk first
    Profiles,

    /// List users silent with their buddies
    Silent {
        /// Minimum days without a buddy message
        #[arg(long)]
        days: Option<i64>,
    },

    /// Log an intervention
    Intervene {
        user_id: String,

        /// Intervention type, e.g. buddy_nudge or counselor_alert
        #[arg(long = "type")]
        intervention_type: String,

        /// Context as a JSON object
        #[arg(long)]
        context: Option<String>,

        /// Outcome (pending, engaged, ignored, escalated)
        #[arg(long)]
        outcome: Option<String>,
    },

    /// Show a user's intervention history
    History {
        user_id: String,

        /// How many days back
        #[arg(long)]
        days: Option<i64>,
    },

    /// Recompute every user's profile
    Recompute,

    /// Show how many users carry each risk label
    Stats {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config_path = cli.config.clone().unwrap_or_else(Config::path);
    let config = Config::load(Some(config_path.as_path()))?;

    // Initialize logging
    let directive = format!("riskagg={}", config.daemon.log_level)
        .parse::<Directive>()
        .map_err(|e| Error::InvalidConfig(format!("log_level: {}", e)))?;
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(directive))
        .init();

    // Thresholds are required; fail before touching the database.
    let fusion = config.fusion(cli.fusion.as_deref())?;

    if matches!(command, Commands::Config) {
        return cli::config::show(&config, &config_path, &fusion);
    }

    let app = App::open(config, fusion)?;
    match command {
        Commands::Ingest { file } => {
            cli::ingest::run(&app, &file).await?;
        }
        Commands::Profile { user_id, login } => {
            cli::profile::show(&app, &user_id, login).await?;
        }
        Commands::Profiles => {
            cli::profile::list(&app).await?;
        }
        Commands::Silent { days } => {
            cli::silent::run(&app, days).await?;
        }
        Commands::Intervene {
            user_id,
            intervention_type,
            context,
            outcome,
        } => {
            cli::intervene::run(
                &app,
                &user_id,
                &intervention_type,
                context.as_deref(),
                outcome.as_deref(),
            )
            .await?;
        }
        Commands::History { user_id, days } => {
            cli::history::run(&app, &user_id, days).await?;
        }
        Commands::Recompute => {
            cli::recompute::run(&app).await?;
        }
        Commands::Stats { json } => {
            cli::stats::run(&app, json).await?;
        }
        Commands::Config => {}
    }

    Ok(())
}
