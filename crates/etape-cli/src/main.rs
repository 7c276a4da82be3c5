mod config;
mod destination_cmds;
mod serve_cmd;
mod step_cmds;
mod view_cmds;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use etape_db::pool;

use config::EtapeConfig;

#[derive(Parser)]
#[command(name = "etape", about = "Bicycle-travel itinerary planner")]
struct Cli {
    /// Database URL (overrides ETAPE_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write an étape config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/etape")]
        db_url: String,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Initialize the étape database (create + migrate)
    DbInit,
    /// Destination management
    Destination {
        #[command(subcommand)]
        command: DestinationCommands,
    },
    /// Step management
    Step {
        #[command(subcommand)]
        command: StepCommands,
    },
    /// Show the itinerary bucketed by month, grouped by destination
    Months,
    /// Show the current step for today's date
    Current,
    /// Serve the HTTP API
    Serve {
        /// Bind address (default: config file `[serve]` or 127.0.0.1)
        #[arg(long)]
        bind: Option<String>,
        /// Port to listen on (default: config file `[serve]` or 3000)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum DestinationCommands {
    /// Add a destination
    Add {
        /// Destination name (e.g. "Lyon")
        name: String,
        /// Latitude in decimal degrees
        #[arg(long)]
        lat: f64,
        /// Longitude in decimal degrees
        #[arg(long)]
        lng: f64,
        /// Street address
        #[arg(long)]
        address: Option<String>,
        /// Free-form category (e.g. city, campsite)
        #[arg(long)]
        category: Option<String>,
        /// Human-readable description
        #[arg(long)]
        description: Option<String>,
    },
    /// List all destinations
    List,
    /// Remove a destination (refused while steps reference it)
    Remove {
        /// Destination ID to remove
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum StepCommands {
    /// Add a step at the end of the itinerary
    Add {
        /// Destination ID the step is bound to
        destination_id: i64,
        /// Date of the step (YYYY-MM-DD)
        #[arg(long)]
        date: String,
        /// Free-text notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// List all steps in sequence order
    List,
    /// Show one step with its activities
    Show {
        /// Step ID to show
        id: i64,
    },
    /// Edit a step (only the provided fields change)
    Edit {
        /// Step ID to edit
        id: i64,
        /// New date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
        /// New destination ID
        #[arg(long)]
        destination_id: Option<i64>,
        /// New notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// Remove a step (positions of other steps are untouched)
    Remove {
        /// Step ID to remove
        id: i64,
    },
    /// Move a step to another step's slot and renumber 1..N
    Move {
        /// Step ID to move
        source_id: i64,
        /// Step ID whose slot the source takes
        target_id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { db_url, force } => {
            cmd_init(&db_url, force)?;
        }
        Commands::DbInit => {
            cmd_db_init(cli.database_url.as_deref()).await?;
        }
        Commands::Destination { command } => {
            let db_pool = open_pool(cli.database_url.as_deref()).await?;
            let result = destination_cmds::run(&db_pool, command).await;
            db_pool.close().await;
            result?;
        }
        Commands::Step { command } => {
            let db_pool = open_pool(cli.database_url.as_deref()).await?;
            let result = step_cmds::run(&db_pool, command).await;
            db_pool.close().await;
            result?;
        }
        Commands::Months => {
            let db_pool = open_pool(cli.database_url.as_deref()).await?;
            let result = view_cmds::cmd_months(&db_pool).await;
            db_pool.close().await;
            result?;
        }
        Commands::Current => {
            let db_pool = open_pool(cli.database_url.as_deref()).await?;
            let result = view_cmds::cmd_current(&db_pool).await;
            db_pool.close().await;
            result?;
        }
        Commands::Serve { bind, port } => {
            let resolved = EtapeConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let bind = bind.unwrap_or(resolved.serve.bind);
            let port = port.unwrap_or(resolved.serve.port);
            serve_cmd::run_serve(db_pool, &bind, port).await?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "etape", &mut std::io::stdout());
        }
    }

    Ok(())
}

/// Resolve the config chain and open a connection pool.
async fn open_pool(cli_db_url: Option<&str>) -> Result<sqlx::PgPool> {
    let resolved = EtapeConfig::resolve(cli_db_url)?;
    pool::create_pool(&resolved.db_config).await
}

/// Execute the `etape init` command: write config file.
fn cmd_init(db_url: &str, force: bool) -> Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
        serve: config::ServeSection::default(),
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!();
    println!("Next: run `etape db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `etape db-init` command: create database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> Result<()> {
    let resolved = EtapeConfig::resolve(cli_db_url)?;

    println!("Initializing étape database...");

    // 1. Create the database if it does not exist.
    pool::ensure_database_exists(&resolved.db_config).await?;

    // 2. Connect to the target database.
    let db_pool = pool::create_pool(&resolved.db_config).await?;

    // 3. Run migrations.
    pool::run_migrations(&db_pool).await?;

    // 4. Print success with table counts.
    let counts = pool::table_counts(&db_pool).await?;
    println!(
        "Database ready: {} destinations, {} steps, {} activities.",
        counts.destinations, counts.steps, counts.activities
    );

    // 5. Clean shutdown.
    db_pool.close().await;

    println!("etape db-init complete.");
    Ok(())
}
