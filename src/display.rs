//! Display Helpers
//!
//! Text the host shows next to bank items and in chat. Drawing is left to
//! the host; these only build strings.

use crate::ledger::{ItemId, Quantity};
use crate::site::Site;
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;

// =============================================================================
// TigerStyle Constants
// =============================================================================

/// How long a requested location breakdown stays on screen
pub const ITEM_INFO_LIFETIME_SECS: i64 = 10;

const THOUSAND: u64 = 1_000;
const MILLION: u64 = 1_000_000;
const BILLION: u64 = 1_000_000_000;

// =============================================================================
// Quantities
// =============================================================================

/// Compact stack size: `999`, `1.5K`, `2M`, `1.2B`.
pub fn format_quantity(qty: u64) -> String {
    let (scaled, unit) = if qty >= BILLION {
        (qty as f64 / BILLION as f64, "B")
    } else if qty >= MILLION {
        (qty as f64 / MILLION as f64, "M")
    } else if qty >= THOUSAND {
        (qty as f64 / THOUSAND as f64, "K")
    } else {
        return qty.to_string();
    };

    format!("{:.1}{}", scaled, unit).replace(".0", "")
}

/// `local/global` label for a bank slot, `None` when nothing is tracked.
pub fn overlay_label(local: Quantity, global: Quantity) -> Option<String> {
    if global == 0 {
        return None;
    }
    Some(format!(
        "{}/{}",
        format_quantity(u64::from(local)),
        format_quantity(u64::from(global))
    ))
}

/// `"<item> > Lumbridge: 10, Varrock west: 5"`, or `None` if no site holds any.
pub fn locations_line(item_name: &str, per_site: &BTreeMap<Site, Quantity>) -> Option<String> {
    let parts: Vec<String> = per_site
        .iter()
        .filter(|(_, qty)| **qty > 0)
        .map(|(site, qty)| format!("{}: {}", site.display_name(), qty))
        .collect();

    if parts.is_empty() {
        return None;
    }
    Some(format!("{} > {}", item_name, parts.join(", ")))
}

// =============================================================================
// Item Location Info
// =============================================================================

/// A short-lived per-site breakdown for one item.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemLocationInfo {
    pub item: ItemId,
    pub name: String,
    pub per_site: BTreeMap<Site, Quantity>,
    pub created_at: DateTime<Utc>,
}

impl ItemLocationInfo {
    /// Returns `None` when no site holds a positive quantity.
    pub fn new(
        item: ItemId,
        name: String,
        per_site: BTreeMap<Site, Quantity>,
        created_at: DateTime<Utc>,
    ) -> Option<Self> {
        let per_site: BTreeMap<Site, Quantity> =
            per_site.into_iter().filter(|(_, qty)| *qty > 0).collect();
        if per_site.is_empty() {
            return None;
        }
        Some(Self {
            item,
            name,
            per_site,
            created_at,
        })
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at > Duration::seconds(ITEM_INFO_LIFETIME_SECS)
    }

    pub fn summary(&self) -> Option<String> {
        locations_line(&self.name, &self.per_site)
    }
}

// =============================================================================
// Tests
// =============================================================================
