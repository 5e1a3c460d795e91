use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "closetbot-cli")]
#[command(about = "closetbot command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database management commands
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Instagram business-discovery account checks
    Account {
        #[command(subcommand)]
        command: AccountCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Test the database connection
    Ping,
    /// Run pending migrations
    Migrate,
    /// Seed the fashion-category taxonomy if the table is empty
    Seed,
}

#[derive(Debug, Subcommand)]
enum AccountCommands {
    /// Check whether a handle resolves to an accessible business account
    Validate {
        /// Instagram handle to check, with or without a leading '@'
        handle: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| {
        let level = std::env::var("CLOSETBOT_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        EnvFilter::try_new(level)
    })?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Db { command }) => match command {
            DbCommands::Ping => run_db_health_check().await?,
            DbCommands::Migrate => run_db_migrate().await?,
            DbCommands::Seed => run_db_seed().await?,
        },
        Some(Commands::Account { command }) => match command {
            AccountCommands::Validate { handle } => run_account_validate(&handle).await?,
        },
        None => println!("closetbot-cli scaffold ready"),
    }

    Ok(())
}

async fn run_db_health_check() -> anyhow::Result<()> {
    let pool = connect_or_exit().await;
    closetbot_db::health_check(&pool).await?;
    println!("database is healthy");
    Ok(())
}

async fn run_db_migrate() -> anyhow::Result<()> {
    let pool = connect_or_exit().await;
    let applied = closetbot_db::run_migrations(&pool).await?;
    if applied == 0 {
        println!("0 pending migrations — database is up to date");
    } else {
        println!("applied {applied} migration(s) successfully");
    }
    Ok(())
}

async fn run_db_seed() -> anyhow::Result<()> {
    let pool = connect_or_exit().await;
    let inserted = closetbot_db::seed_category_taxonomy_if_empty(&pool).await?;
    if inserted == 0 {
        println!("category_taxonomy already populated — nothing to seed");
    } else {
        println!("seeded {inserted} categories");
    }
    Ok(())
}

async fn run_account_validate(handle: &str) -> anyhow::Result<()> {
    let config = load_config_or_exit();
    let client = closetbot_discovery::DiscoveryClient::new(
        &config.discovery_base_url,
        &config.discovery_business_account_id,
        &config.discovery_access_token,
        config.discovery_request_timeout_secs,
    )?;

    let handle = handle.trim_start_matches('@');
    let validation = client.validate_account(handle).await;

    if validation.valid {
        println!("{handle}: valid business account");
    } else {
        println!(
            "{handle}: not usable ({})",
            validation.error.as_deref().unwrap_or("unknown reason")
        );
    }
    Ok(())
}

fn load_config_or_exit() -> closetbot_core::AppConfig {
    closetbot_core::load_app_config().unwrap_or_else(|e| {
        eprintln!("error: invalid configuration: {e}");
        std::process::exit(1);
    })
}

async fn connect_or_exit() -> sqlx::PgPool {
    closetbot_db::connect_pool_from_env().await.unwrap_or_else(|e| {
        match &e {
            closetbot_db::DbError::Sqlx(sql_err) => {
                eprintln!("error: failed to connect to database: {sql_err}");
                eprintln!("hint: ensure postgres is running");
            }
            closetbot_db::DbError::Migration(mig_err) => {
                eprintln!("error: unexpected migration error during connect: {mig_err}");
            }
            closetbot_db::DbError::NotFound => {
                eprintln!("error: unexpected not-found during connect");
            }
            closetbot_db::DbError::InvalidJobTransition { id, expected_status } => {
                eprintln!("error: unexpected job state for id {id}: expected '{expected_status}'");
            }
            closetbot_db::DbError::Config(cfg_err) => {
                eprintln!("error: invalid configuration: {cfg_err}");
                eprintln!("hint: copy .env.example to .env and fill required values");
            }
        }
        std::process::exit(1);
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_db_ping_command() {
        let cli = Cli::try_parse_from(["closetbot-cli", "db", "ping"]).expect("expected valid cli args");
        assert!(matches!(cli.command, Some(Commands::Db { command: DbCommands::Ping })));
    }

    #[test]
    fn parses_db_migrate_command() {
        let cli = Cli::try_parse_from(["closetbot-cli", "db", "migrate"]).expect("expected valid cli args");
        assert!(matches!(cli.command, Some(Commands::Db { command: DbCommands::Migrate })));
    }

    #[test]
    fn parses_db_seed_command() {
        let cli = Cli::try_parse_from(["closetbot-cli", "db", "seed"]).expect("expected valid cli args");
        assert!(matches!(cli.command, Some(Commands::Db { command: DbCommands::Seed })));
    }

    #[test]
    fn parses_account_validate_command() {
        let cli = Cli::try_parse_from(["closetbot-cli", "account", "validate", "brandx"]).expect("expected valid cli args");
        assert!(matches!(
            cli.command,
            Some(Commands::Account { command: AccountCommands::Validate { ref handle } }) if handle == "brandx"
        ));
    }

    #[test]
    fn no_command_is_none() {
        let cli = Cli::try_parse_from(["closetbot-cli"]).expect("expected valid cli args");
        assert!(cli.command.is_none());
    }
}
