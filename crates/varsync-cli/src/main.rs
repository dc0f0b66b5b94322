mod batch;
mod sync;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;
use varsync_core::{AppConfig, ConfigError};
use varsync_db::{connect_pool, PoolConfig};

use crate::sync::{MatchArgs, SyncArgs};

#[derive(Debug, Parser)]
#[command(name = "varsync")]
#[command(about = "Sync product variants into the external catalog")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// List the variant combinations a selection would produce
    Combos {
        /// Parent product code used to build variant names
        #[arg(long)]
        code: String,
        /// Selected attribute value ids, comma separated
        #[arg(long = "values", value_delimiter = ',')]
        value_ids: Vec<i64>,
    },
    /// Create one product and its variants in the catalog
    Sync(SyncArgs),
    /// Sync every product in a YAML file and track the batch to completion
    Batch {
        /// YAML file with a top-level `products` list
        file: PathBuf,
    },
    /// Re-dispatch the failed items of an earlier batch as a new batch
    RetryFailed {
        /// Batch id printed by `batch`
        batch_id: Uuid,
    },
    /// Check variant descriptors for equivalence
    Match(MatchArgs),
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Apply pending migrations
    Migrate,
    /// Check database connectivity
    Ping,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // `match --against` is pure and must work without a configured database.
    let config = varsync_core::load_app_config();
    let log_level = config.as_ref().map_or("info", |c| c.log_level.as_str());
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_level))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Some(Commands::Db { command }) => {
            let config = require(config)?;
            let pool = open_pool(&config).await?;
            match command {
                DbCommands::Migrate => {
                    let applied = varsync_db::run_migrations(&pool).await?;
                    println!("migrations applied: {applied}");
                }
                DbCommands::Ping => {
                    varsync_db::ping(&pool).await?;
                    println!("database ok");
                }
            }
        }
        Some(Commands::Combos { code, value_ids }) => {
            let config = require(config)?;
            let pool = open_pool(&config).await?;
            sync::run_combos(&pool, &config, &code, &value_ids).await?;
        }
        Some(Commands::Sync(args)) => {
            let config = require(config)?;
            let pool = open_pool(&config).await?;
            sync::run_sync(&pool, &config, &args).await?;
        }
        Some(Commands::Batch { file }) => {
            let config = require(config)?;
            let requests = batch::load_batch_file(&file)?;
            let pool = open_pool(&config).await?;
            batch::run_batch(&pool, &config, requests).await?;
        }
        Some(Commands::RetryFailed { batch_id }) => {
            let config = require(config)?;
            let pool = open_pool(&config).await?;
            batch::run_retry_failed(&pool, &config, batch_id).await?;
        }
        Some(Commands::Match(args)) => {
            if args.parent.is_some() {
                let config = require(config)?;
                let pool = open_pool(&config).await?;
                sync::run_match(Some(&pool), &args).await?;
            } else {
                sync::run_match(None, &args).await?;
            }
        }
        None => println!("varsync: no command given, see --help"),
    }

    Ok(())
}

fn require(config: Result<AppConfig, ConfigError>) -> anyhow::Result<AppConfig> {
    config.map_err(|e| anyhow::anyhow!("configuration error: {e}"))
}

async fn open_pool(config: &AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool_config = PoolConfig::from_app_config(config);
    let pool = connect_pool(&config.database_url, pool_config).await?;
    Ok(pool)
}
