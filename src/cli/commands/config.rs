use clap::Subcommand;

use crate::cli::OutputFormat;
use crate::config::AppConfig;

#[derive(Subcommand)]
pub enum ConfigCommands {
    #[command(about = "Print the configuration resolved from the environment (secrets omitted)")]
    Show,
}

pub async fn handle(cmd: ConfigCommands, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ConfigCommands::Show => {
            match output_format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
                OutputFormat::Text => {
                    println!("environment:  {:?}", config.environment);
                    println!("port:         {}", config.server.port);
                    println!("store:        {:?}", config.database.backend);
                    println!("cors origins: {}", config.security.cors_origins.join(", "));
                    println!("jwt expiry:   {}h", config.security.jwt_expiry_hours);
                    println!("app base url: {}", config.email.app_base_url);
                    println!(
                        "smtp:         {}",
                        config.email.smtp.as_ref().map(|s| format!("{}:{}", s.host, s.port)).unwrap_or_else(|| "disabled (log only)".to_string())
                    );
                }
            }
            Ok(())
        }
    }
}
