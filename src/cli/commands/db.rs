use anyhow::{bail, Context};
use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::{open_store, OutputFormat};
use crate::config::{AppConfig, StoreBackend};
use crate::database::DatabaseManager;

#[derive(Subcommand)]
pub enum DbCommands {
    #[command(about = "Apply pending migrations")]
    Migrate,

    #[command(about = "Check that the store is reachable")]
    Ping,
}

pub async fn handle(cmd: DbCommands, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        DbCommands::Migrate => {
            if config.database.backend != StoreBackend::Postgres {
                bail!("Migrations only apply to the postgres store backend");
            }
            let mut database = config.database.clone();
            database.run_migrations = false;
            let pool = DatabaseManager::connect(&database)
                .await
                .context("failed to connect to the database")?;
            DatabaseManager::migrate(&pool).await.context("migration failed")?;
            output_success(output_format, "Migrations applied", None)
        }
        DbCommands::Ping => {
            let store = open_store(config).await?;
            store.ping().await.context("store did not answer")?;
            output_success(
                output_format,
                "Store is reachable",
                Some(json!({ "backend": format!("{:?}", config.database.backend) })),
            )
        }
    }
}
