use anyhow::{Context, Result};
use campus_config::{CampusConfig, ConfigLoader, LogLevel};
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info, warn};

mod cli;
mod commands;

use cli::{BranchCommands, Cli, Commands, ConfigCommands, TenantCommands, UserCommands};
use commands::{access, config as config_commands, directory, AppContext};

/// Load configuration from file or environment
fn load_config(config_path: Option<&PathBuf>) -> Result<CampusConfig> {
    let loader = ConfigLoader::new();

    match config_path {
        Some(path) => {
            if path.exists() {
                info!("Loading configuration from: {:?}", path);
                loader
                    .from_file(path)
                    .context(format!("Failed to load configuration from {:?}", path))
            } else {
                warn!("Configuration file not found: {:?}. Using defaults.", path);
                loader
                    .from_env()
                    .context("Failed to load configuration from environment")
            }
        }
        None => {
            debug!("No configuration file specified. Loading from environment or defaults.");
            loader
                .from_env()
                .context("Failed to load configuration from environment")
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_ref())?;
    if let Some(level) = cli.log_level.as_deref() {
        config.logging.level = level
            .parse::<LogLevel>()
            .map_err(|e| anyhow::anyhow!("Invalid --log-level: {}", e))?;
    }
    campus_logging::init_logging(&config.logging)?;

    // Commands that never touch the database
    if let Commands::Config { config_cmd } = &cli.command {
        return match config_cmd {
            ConfigCommands::Validate { config_file } => config_commands::validate(config_file),
            ConfigCommands::Generate { output, force } => config_commands::generate(output, *force),
            ConfigCommands::Show { format } => config_commands::show(&config, format),
        };
    }

    let ctx = AppContext::connect(&config).await?;

    match cli.command {
        Commands::Migrate => {
            ctx.database.migrate().await.context("Failed to run migrations")?;
            println!("✅ Migrations applied");
        }
        Commands::Seed { tenant_id, force } => {
            directory::seed(&ctx, tenant_id, force).await?;
        }
        Commands::Tenant { tenant_cmd } => match tenant_cmd {
            TenantCommands::Create { name, display_name } => {
                directory::create_tenant(&ctx, &name, &display_name).await?
            }
            TenantCommands::List { all } => directory::list_tenants(&ctx, all).await?,
        },
        Commands::Branch { branch_cmd } => match branch_cmd {
            BranchCommands::Create { tenant, name, code } => {
                directory::create_branch(&ctx, tenant, &name, code.as_deref()).await?
            }
            BranchCommands::List { tenant } => directory::list_branches(&ctx, tenant).await?,
        },
        Commands::User { user_cmd } => match user_cmd {
            UserCommands::Create {
                email,
                display_name,
                user_type,
                tenant,
                superuser,
            } => directory::create_user(&ctx, &email, display_name, user_type, tenant, superuser).await?,
        },
        Commands::Check {
            user,
            permission,
            branch,
        } => {
            if !access::check(&ctx, user, &permission, branch).await? {
                std::process::exit(1);
            }
        }
        Commands::Assign {
            user,
            role,
            tenant,
            branch,
            by,
            valid_days,
        } => {
            access::assign(&ctx, user, role, tenant, branch, by, valid_days).await?;
        }
        Commands::Revoke { assignment, by } => access::revoke(&ctx, assignment, by).await?,
        Commands::Roles { tenant, user, all } => access::roles(&ctx, tenant, user, all).await?,
        Commands::Permissions { category } => access::list_permissions(&ctx, category.as_deref()).await?,
        Commands::Summary { branch } => access::summary(&ctx, branch).await?,
        Commands::Audit { user, limit } => access::audit(&ctx, user, limit).await?,
        // Handled before connecting
        Commands::Config { .. } => {}
    }

    ctx.database.close().await.context("Failed to close database")?;
    Ok(())
}
