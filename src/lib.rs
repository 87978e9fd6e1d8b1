//! Stowage - Location-Aware Bank Ledger
//!
//! Tracks how much of each item is stored at each bank site when the host
//! only ever shows the combined contents of all banks.
//!
//! Features:
//! - Per-site balances rebuilt from aggregate snapshots
//! - Withdraw admission control against the open site's balance
//! - Obfuscated per-identity ledger files, saved in the background
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   site    ┌──────────────────────────────┐
//! │ SiteResolver │ ────────▶ │         LedgerService        │
//! └──────────────┘           │  ┌────────┐   ┌───────────┐  │
//!   snapshot  ─────────────▶ │  │reconcile│─▶│  Ledger   │  │
//!   withdraw  ─────────────▶ │  └────────┘   └───────────┘  │
//!                            │  AdmissionControl ◀──┘       │
//!                            └──────────────┬───────────────┘
//!                                           │ snapshot
//!                                   ┌───────▼───────┐
//!                                   │ PersistWriter │──▶ BalanceStore
//!                                   └───────────────┘
//! ```
//!
//! The per-site split is an estimate. Changes made while no bank is open
//! are attributed to whichever bank is open next.

pub mod admission;
pub mod codec;
pub mod config;
pub mod display;
pub mod ledger;
pub mod reconcile;
pub mod service;
pub mod site;
pub mod store;
pub mod writer;

pub use admission::{AdmissionControl, Decision, DenialReason, WithdrawKind};
pub use config::LedgerConfig;
pub use ledger::{ItemId, Ledger, LedgerSnapshot, Quantity};
pub use reconcile::{reconcile, ItemChange, ObservedTotals, Reconciliation};
pub use service::LedgerService;
pub use site::{RegionId, RegionTable, Site, SiteResolver, WorldPoint};
pub use store::{BalanceStore, LedgerStore, MemoryStore, StoreError};

/// Application name
pub const APP_NAME: &str = "stowage";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
