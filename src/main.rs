//! Stowage CLI
//!
//! Inspect and maintain saved bank ledgers.
//!
//! # Usage
//!
//! ```bash
//! # Everything known for a player
//! stowage show --identity zezima
//!
//! # Where one item is stored
//! stowage locate --identity zezima --item 995
//!
//! # Feed a recorded event log through the ledger
//! stowage replay --identity zezima events.jsonl
//!
//! # Wipe the ledger
//! stowage reset --identity zezima
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use stowage::display;
use stowage::{
    BalanceStore, ItemId, Ledger, LedgerConfig, LedgerService, LedgerStore, ObservedTotals,
    Quantity, RegionId, WorldPoint, APP_NAME, APP_VERSION,
};

// =============================================================================
// CLI
// =============================================================================

/// Location-aware bank ledger
#[derive(Parser, Debug)]
#[command(name = APP_NAME)]
#[command(about = "Inspect and maintain per-site bank ledgers")]
#[command(version)]
struct Cli {
    /// Ledger data directory (overrides STOWAGE_DATA_DIR)
    #[arg(long)]
    data_dir: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print every tracked item with its per-site breakdown
    Show {
        /// Player name the ledger belongs to
        #[arg(long)]
        identity: String,
    },
    /// Print where one item is stored
    Locate {
        #[arg(long)]
        identity: String,
        /// Item id
        #[arg(long)]
        item: ItemId,
    },
    /// Wipe the ledger and save it empty
    Reset {
        #[arg(long)]
        identity: String,
    },
    /// Replay a JSON-lines event log through the ledger, then save
    Replay {
        #[arg(long)]
        identity: String,
        /// Event log path
        events: PathBuf,
    },
}

/// One line of a replay log.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum ReplayEvent {
    /// Bank opened, by region id or world position
    Open {
        region: Option<u32>,
        point: Option<WorldPoint>,
    },
    /// Bank contents as shown
    Snapshot { totals: BTreeMap<ItemId, Quantity> },
    /// A withdraw menu option was clicked
    Withdraw { item: ItemId, option: String },
    /// Full wipe
    Reset,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("{} v{}", APP_NAME, APP_VERSION);

    let mut config = LedgerConfig::from_env();
    if let Some(dir) = &cli.data_dir {
        config = config.with_data_dir(dir);
    }
    tracing::info!(data_dir = %config.data_dir.display(), "Configuration loaded");

    let store = Arc::new(LedgerStore::new(&config.data_dir));

    match cli.command {
        Commands::Show { identity } => {
            let ledger = store.load(&identity).unwrap_or_default();
            print_ledger(&identity, &ledger);
        }
        Commands::Locate { identity, item } => {
            let ledger = store.load(&identity).unwrap_or_default();
            let line = ledger
                .per_site(item)
                .and_then(|per_site| display::locations_line(&format!("Item {}", item), &per_site));
            match line {
                Some(line) => println!("{}", line),
                None => println!("No known storage for item {} yet.", item),
            }
        }
        Commands::Reset { identity } => {
            let mut service = LedgerService::new(config);
            service.init(Some(store.clone()), &identity);
            let items = service.ledger().len();
            service.reset();
            service.shutdown().await;
            println!("Reset ledger for {} ({} items removed)", identity, items);
        }
        Commands::Replay { identity, events } => {
            let mut service = LedgerService::new(config);
            service.init(Some(store.clone()), &identity);
            replay(&mut service, &events)?;
            print_ledger(&identity, service.ledger());
            service.shutdown().await;
        }
    }

    Ok(())
}

// =============================================================================
// Commands
// =============================================================================

fn replay(service: &mut LedgerService, path: &Path) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read event log {}", path.display()))?;

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let event: ReplayEvent = serde_json::from_str(line)
            .with_context(|| format!("invalid event on line {}", index + 1))?;

        match event {
            ReplayEvent::Open { region, point } => {
                let site = match point {
                    Some(point) => service.open_site(Some(point)),
                    None => service.open_region(region.map(RegionId)),
                };
                println!("open     {}", site);
            }
            ReplayEvent::Snapshot { totals } => {
                let observed: ObservedTotals = totals.into_iter().collect();
                let outcome = service.observe(&observed);
                println!("snapshot {} item(s) changed", outcome.changes.len());
            }
            ReplayEvent::Withdraw { item, option } => {
                let decision = service.check_withdraw(item, &option);
                match decision.message() {
                    None => println!("allow    {} on item {}", option, item),
                    Some(reason) => println!("deny     {} on item {}: {}", option, item, reason),
                }
            }
            ReplayEvent::Reset => {
                service.reset();
                println!("reset");
            }
        }
    }

    Ok(())
}

fn print_ledger(identity: &str, ledger: &Ledger) {
    if ledger.is_empty() {
        println!("No balances for {}", identity);
        return;
    }

    println!("Balances for {} ({} items)", identity, ledger.len());
    for item in ledger.items() {
        let Some(per_site) = ledger.per_site(item) else {
            continue;
        };
        let sites: Vec<String> = per_site
            .iter()
            .map(|(site, qty)| format!("{}={}", site, qty))
            .collect();
        println!(
            "  {:>6}  total {:>8}  {}",
            item,
            display::format_quantity(u64::from(ledger.global_quantity(item))),
            sites.join(", ")
        );
    }
}
