//! Location-Aware Ledger
//!
//! TigerStyle: Exclusive ownership of `item -> (site -> quantity)`.
//!
//! Invariants:
//! - Every stored quantity is >= 1. An entry that reaches zero is removed.
//! - No item is kept with an empty per-site map.
//!
//! Reads are public and return copies. Writes are crate-private and only
//! reachable through reconciliation and [`Ledger::reset`].

use crate::site::Site;
use std::collections::{BTreeMap, HashMap};

/// Item identifier as reported by the host.
pub type ItemId = u32;

/// Stack size.
pub type Quantity = u32;

/// Raw nested balances, as persisted.
pub type Balances = HashMap<ItemId, HashMap<Site, Quantity>>;

// =============================================================================
// Ledger
// =============================================================================

/// Per-site item quantities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    balances: Balances,
}

impl Ledger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from raw balances, dropping zero entries and empty items.
    pub fn from_balances(raw: Balances) -> Self {
        let mut dropped = 0usize;
        let balances: Balances = raw
            .into_iter()
            .filter_map(|(item, per_site)| {
                let before = per_site.len();
                let kept: HashMap<Site, Quantity> =
                    per_site.into_iter().filter(|(_, qty)| *qty > 0).collect();
                dropped += before - kept.len();
                (!kept.is_empty()).then_some((item, kept))
            })
            .collect();

        if dropped > 0 {
            tracing::warn!(dropped, "Dropped zero-quantity ledger entries");
        }

        Self { balances }
    }

    /// Quantity of `item` held at `site`. Absent site or entry reads as 0.
    pub fn local_quantity(&self, item: ItemId, site: Option<Site>) -> Quantity {
        let Some(site) = site else {
            return 0;
        };

        self.balances
            .get(&item)
            .and_then(|per_site| per_site.get(&site))
            .copied()
            .unwrap_or(0)
    }

    /// Quantity of `item` across every site.
    pub fn global_quantity(&self, item: ItemId) -> Quantity {
        self.balances
            .get(&item)
            .map(|per_site| {
                per_site
                    .values()
                    .fold(0u32, |total, qty| total.saturating_add(*qty))
            })
            .unwrap_or(0)
    }

    /// Site breakdown for `item`, or `None` if nothing is known.
    pub fn per_site(&self, item: ItemId) -> Option<BTreeMap<Site, Quantity>> {
        self.balances
            .get(&item)
            .map(|per_site| per_site.iter().map(|(site, qty)| (*site, *qty)).collect())
    }

    /// Tracked item ids, ascending
    pub fn items(&self) -> Vec<ItemId> {
        let mut items: Vec<ItemId> = self.balances.keys().copied().collect();
        items.sort_unstable();
        items
    }

    /// Number of tracked items
    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    /// Immutable copy for handing to a writer.
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            balances: self.balances.clone(),
        }
    }

    /// Wipe every balance. Irreversible.
    pub fn reset(&mut self) {
        tracing::warn!(items = self.balances.len(), "Resetting all ledger balances");
        self.balances.clear();
    }

    // -------------------------------------------------------------------------
    // Crate-private mutation
    // -------------------------------------------------------------------------

    /// Store `qty` at `(item, site)`, removing the entry when zero.
    pub(crate) fn set_local(&mut self, item: ItemId, site: Site, qty: Quantity) {
        if qty == 0 {
            if let Some(per_site) = self.balances.get_mut(&item) {
                per_site.remove(&site);
            }
        } else {
            self.balances.entry(item).or_default().insert(site, qty);
        }
    }

    /// Drop `item` if its map is empty, or unconditionally when `force`.
    pub(crate) fn prune_item(&mut self, item: ItemId, force: bool) {
        let empty = self
            .balances
            .get(&item)
            .map(HashMap::is_empty)
            .unwrap_or(false);

        if force || empty {
            self.balances.remove(&item);
        }
    }

    pub(crate) fn item_ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.balances.keys().copied()
    }
}

// =============================================================================
// Snapshot
// =============================================================================

/// Owned, immutable copy of the ledger at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerSnapshot {
    balances: Balances,
}

impl LedgerSnapshot {
    pub fn balances(&self) -> &Balances {
        &self.balances
    }

    pub fn into_ledger(self) -> Ledger {
        Ledger {
            balances: self.balances,
        }
    }

    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
