//! Tally ledger auditor.
//!
//! Scans stored ledgers for rows the engine would never write: sign
//! mismatches, orphan or over-populated transfer links, same-direction
//! pairs, pairs with diverging delete state.
//!
//! Usage:
//!   auditor                 - audit every group
//!   auditor <GROUP_ID>...   - audit the given groups
//!   auditor --json ...      - also print each report as JSON on stdout
//!
//! Exits with status 1 when any finding is reported.

use std::process::ExitCode;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use tally_db::{GroupRepository, SeaLedgerStore, connect};
use tally_shared::AppConfig;
use tally_shared::types::GroupId;

struct Args {
    json: bool,
    groups: Vec<GroupId>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = Args {
        json: false,
        groups: Vec::new(),
    };
    for arg in std::env::args().skip(1) {
        if arg == "--json" {
            args.json = true;
        } else {
            let id = Uuid::parse_str(&arg).with_context(|| format!("Invalid group id '{arg}'"))?;
            args.groups.push(id.into());
        }
    }
    Ok(args)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tally=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = parse_args()?;
    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = connect(&config.database).await?;
    info!("Connected to database");

    let groups = if args.groups.is_empty() {
        GroupRepository::new(db.clone()).list_group_ids().await?
    } else {
        args.groups
    };

    let store = SeaLedgerStore::with_isolation(db, config.database.isolation);
    let mut dirty_groups = 0usize;

    for group_id in groups {
        let report = store.audit_group(group_id).await?;

        for finding in &report.findings {
            warn!(group_id = %group_id, %finding, "Ledger invariant violated");
        }
        info!(
            group_id = %group_id,
            entries = report.entries_checked,
            links = report.links_checked,
            findings = report.findings.len(),
            "Group audited"
        );
        if args.json {
            println!("{}", serde_json::to_string(&report)?);
        }
        if !report.is_clean() {
            dirty_groups += 1;
        }
    }

    if dirty_groups > 0 {
        warn!(groups = dirty_groups, "Audit found broken ledgers");
        return Ok(ExitCode::FAILURE);
    }
    info!("All ledgers consistent");
    Ok(ExitCode::SUCCESS)
}
