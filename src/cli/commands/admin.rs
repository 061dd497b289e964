use anyhow::Context;
use clap::Subcommand;
use std::sync::Arc;

use crate::cli::utils::output_success;
use crate::cli::{open_store, OutputFormat};
use crate::config::AppConfig;
use crate::mailer::LogMailer;
use crate::services::UserService;
use crate::state::AppState;

#[derive(Subcommand)]
pub enum AdminCommands {
    #[command(about = "Create an admin account, or promote and reactivate an existing one")]
    Create {
        #[arg(long, help = "Account email address")]
        email: String,

        #[arg(long, help = "Display name")]
        name: String,

        #[arg(long, env = "ERP_ADMIN_PASSWORD", help = "Initial password")]
        password: String,
    },
}

pub async fn handle(cmd: AdminCommands, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AdminCommands::Create { email, name, password } => {
            let store = open_store(config).await?;
            let mailer = Arc::new(LogMailer::new(config.email.app_base_url.clone()));
            let state = AppState::new(store, config.clone(), mailer);

            let user = UserService::from_state(&state)
                .ensure_admin(&email, &name, &password)
                .await
                .context("could not create the admin account")?;
            output_success(output_format, "Admin account ready", Some(user))
        }
    }
}
