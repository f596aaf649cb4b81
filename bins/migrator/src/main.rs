//! Database migration runner for Tally.
//!
//! Connects through the same `AppConfig` as the auditor, so `TALLY__DATABASE__URL`
//! and `config/*.toml` apply here too.
//!
//! Usage:
//!   migrator [up]     - Run all pending migrations
//!   migrator down [N] - Roll back the last N migrations (default 1)
//!   migrator status   - List migrations and whether they are applied
//!   migrator fresh    - Drop everything and re-run all migrations

use anyhow::{Context, bail};
use sea_orm_migration::MigratorTrait;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tally_db::connect;
use tally_db::migration::Migrator;
use tally_shared::AppConfig;

enum Command {
    Up,
    Down(u32),
    Status,
    Fresh,
}

fn parse_command() -> anyhow::Result<Command> {
    let mut args = std::env::args().skip(1);
    let command = match args.next().as_deref() {
        None | Some("up") => Command::Up,
        Some("down") => {
            let steps = match args.next() {
                Some(n) => n.parse().with_context(|| format!("Invalid step count '{n}'"))?,
                None => 1,
            };
            Command::Down(steps)
        }
        Some("status") => Command::Status,
        Some("fresh") => Command::Fresh,
        Some(other) => bail!("Unknown command '{other}' (expected up, down, status or fresh)"),
    };
    if let Some(extra) = args.next() {
        bail!("Unexpected argument '{extra}'");
    }
    Ok(command)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tally=debug,sea_orm_migration=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let command = parse_command()?;
    let config = AppConfig::load().context("Failed to load configuration")?;
    let db = connect(&config.database).await?;

    match command {
        Command::Up => {
            Migrator::up(&db, None).await?;
            info!("Migrations applied");
        }
        Command::Down(steps) => {
            Migrator::down(&db, Some(steps)).await?;
            info!(steps, "Migrations rolled back");
        }
        Command::Status => {
            for migration in Migrator::get_migration_with_status(&db).await? {
                info!(name = migration.name(), status = ?migration.status(), "Migration");
            }
        }
        Command::Fresh => {
            Migrator::fresh(&db).await?;
            info!("Schema recreated");
        }
    }
    Ok(())
}
