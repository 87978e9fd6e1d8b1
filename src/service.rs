//! Ledger Service
//!
//! TigerStyle: One explicitly constructed owner for the ledger.
//!
//! The service holds the ledger, the currently open site and the persistence
//! wiring. It is driven from a single context (the host's event callback):
//! `observe` and `reset` take `&mut self`, so no internal locking is needed.
//!
//! Lifecycle:
//! 1. `LedgerService::new(config)`
//! 2. `init(store, identity)` loads the saved ledger (blocking) and starts the
//!    background writer. Call from inside a Tokio runtime.
//! 3. `open_site` / `observe` / `check_withdraw` as host events arrive
//! 4. `shutdown().await` saves, drains the writer and clears state

use crate::admission::{AdmissionControl, Decision, WithdrawKind};
use crate::config::LedgerConfig;
use crate::display::{self, ItemLocationInfo};
use crate::ledger::{ItemId, Ledger, Quantity};
use crate::reconcile::{self, ObservedTotals, Reconciliation};
use crate::site::{RegionId, RegionTable, Site, SiteResolver, WorldPoint};
use crate::store::{self, BalanceStore};
use crate::writer::PersistWriter;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;

struct Persistence {
    writer: PersistWriter,
}

/// Owner of the ledger and its lifecycle.
pub struct LedgerService {
    config: LedgerConfig,
    admission: AdmissionControl,
    resolver: Box<dyn SiteResolver + Send + Sync>,
    ledger: Ledger,
    current_site: Option<Site>,
    identity: String,
    persistence: Option<Persistence>,
    active_info: Option<ItemLocationInfo>,
}

impl LedgerService {
    /// Service with the built-in region table.
    pub fn new(config: LedgerConfig) -> Self {
        Self::with_resolver(config, RegionTable)
    }

    pub fn with_resolver<R>(config: LedgerConfig, resolver: R) -> Self
    where
        R: SiteResolver + Send + Sync + 'static,
    {
        Self {
            admission: AdmissionControl::new(&config),
            config,
            resolver: Box::new(resolver),
            ledger: Ledger::new(),
            current_site: None,
            identity: store::IDENTITY_FALLBACK.to_string(),
            persistence: None,
            active_info: None,
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Load the saved ledger for `identity` and start the writer.
    ///
    /// Without a store the ledger stays empty and in memory only.
    pub fn init(&mut self, store: Option<Arc<dyn BalanceStore>>, identity: &str) {
        self.identity = identity.to_string();

        let Some(store) = store else {
            tracing::warn!(identity, "Ledger persistence not wired, skipping load");
            return;
        };

        self.ledger = store.load(identity).unwrap_or_default();
        tracing::info!(identity, items = self.ledger.len(), "Ledger initialised");

        match tokio::runtime::Handle::try_current() {
            Ok(_) => {
                self.persistence = Some(Persistence {
                    writer: PersistWriter::spawn(store),
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "No Tokio runtime, ledger changes will not be saved");
            }
        }
    }

    /// Save, wait for pending writes, then clear in-memory state.
    pub async fn shutdown(&mut self) {
        self.persist();
        if let Some(persistence) = self.persistence.take() {
            persistence.writer.close().await;
        }

        self.ledger = Ledger::new();
        self.current_site = None;
        self.active_info = None;
        tracing::info!(identity = %self.identity, "Ledger service stopped");
    }

    // -------------------------------------------------------------------------
    // Site
    // -------------------------------------------------------------------------

    /// The bank UI opened with the player at `position`.
    pub fn open_site(&mut self, position: Option<WorldPoint>) -> Site {
        let site = self.resolver.resolve_point(position);
        tracing::info!(
            %site,
            region = ?position.map(|p| p.region_id().0),
            "Bank opened"
        );
        self.current_site = Some(site);
        site
    }

    /// Same as [`open_site`](Self::open_site) but from a region key.
    pub fn open_region(&mut self, region: Option<RegionId>) -> Site {
        let site = self.resolver.resolve(region);
        tracing::info!(%site, region = ?region.map(|r| r.0), "Bank opened");
        self.current_site = Some(site);
        site
    }

    pub fn current_site(&self) -> Option<Site> {
        self.current_site
    }

    /// A site is set and it is not `Unknown`.
    pub fn has_known_site(&self) -> bool {
        self.current_site.is_some_and(|site| site.is_known())
    }

    // -------------------------------------------------------------------------
    // Reconciliation
    // -------------------------------------------------------------------------

    /// Fold a fresh bank snapshot into the ledger, saving if anything changed.
    pub fn observe(&mut self, observed: &ObservedTotals) -> Reconciliation {
        if !self.config.enable_local_banks {
            return Reconciliation::default();
        }

        let outcome = reconcile::reconcile(&mut self.ledger, self.current_site, observed);
        if !outcome.is_empty() {
            tracing::debug!(
                site = ?outcome.site,
                changed = outcome.changes.len(),
                "Ledger reconciled"
            );
            self.persist();
        }
        outcome
    }

    /// Wipe every balance and save the empty ledger.
    pub fn reset(&mut self) {
        self.ledger.reset();
        self.active_info = None;
        self.persist();
    }

    fn persist(&self) {
        match &self.persistence {
            Some(persistence) => persistence.writer.submit(&self.identity, self.ledger.snapshot()),
            None => tracing::warn!(identity = %self.identity, "Ledger persistence not wired, skipping save"),
        }
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Quantity at the open site
    pub fn local_quantity(&self, item: ItemId) -> Quantity {
        self.ledger.local_quantity(item, self.current_site)
    }

    pub fn global_quantity(&self, item: ItemId) -> Quantity {
        self.ledger.global_quantity(item)
    }

    pub fn per_site(&self, item: ItemId) -> Option<BTreeMap<Site, Quantity>> {
        self.ledger.per_site(item)
    }

    /// `local/global` text for a bank slot, if the overlay is enabled.
    pub fn overlay_label(&self, item: ItemId) -> Option<String> {
        if !self.config.enable_local_banks || !self.config.show_local_global {
            return None;
        }
        display::overlay_label(self.local_quantity(item), self.global_quantity(item))
    }

    // -------------------------------------------------------------------------
    // Admission
    // -------------------------------------------------------------------------

    /// Check a bank menu option such as `Withdraw-10` for `item`.
    pub fn check_withdraw(&self, item: ItemId, option: &str) -> Decision {
        self.check(item, &WithdrawKind::parse(option))
    }

    pub fn check(&self, item: ItemId, kind: &WithdrawKind) -> Decision {
        self.admission
            .check(&self.ledger, self.current_site, item, kind)
    }

    // -------------------------------------------------------------------------
    // Item locations
    // -------------------------------------------------------------------------

    /// Build and remember the location breakdown for `item`.
    pub fn show_item_locations(
        &mut self,
        item: ItemId,
        name: &str,
        now: DateTime<Utc>,
    ) -> Option<&ItemLocationInfo> {
        self.active_info = self
            .ledger
            .per_site(item)
            .and_then(|per_site| ItemLocationInfo::new(item, name.to_string(), per_site, now));
        self.active_info.as_ref()
    }

    /// The remembered breakdown, dropped once it has expired.
    pub fn active_item_info(&mut self, now: DateTime<Utc>) -> Option<&ItemLocationInfo> {
        if self.active_info.as_ref().is_some_and(|info| info.is_expired(now)) {
            self.active_info = None;
        }
        self.active_info.as_ref()
    }
}

// =============================================================================
// Tests
// =============================================================================
