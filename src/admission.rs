//! Withdrawal Admission Control
//!
//! TigerStyle: Gate withdraw requests on the ledger's view of the open site.
//!
//! Decision rules:
//! 1. Nothing of the item at this site: deny every withdraw kind.
//! 2. An explicit count larger than the local stack: deny.
//! 3. "All", "All-but-1" and "X" can pull the entire stack, so they are only
//!    allowed at the site that holds all of it.
//! 4. A withdraw with an amount we can't read passes once there is local
//!    stock. Anything that is not a withdraw passes through.

use crate::config::LedgerConfig;
use crate::ledger::{ItemId, Ledger, Quantity};
use crate::site::Site;

// =============================================================================
// TigerStyle Constants
// =============================================================================

/// Menu option prefix for bank withdrawals
pub const WITHDRAW_PREFIX: &str = "Withdraw-";

/// Option label that opens the amount prompt
pub const PROMPT_OPTION: &str = "Withdraw-X";

// =============================================================================
// Types
// =============================================================================

/// What a withdraw-style request asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WithdrawKind {
    /// An explicit amount
    Count(u64),
    /// Whole stack
    All,
    /// Whole stack minus one
    AllButOne,
    /// Opens an amount prompt, which may ask for the whole stack
    PromptForAmount,
    /// A withdraw whose amount could not be read (`Withdraw-0`, `Withdraw-1x0`)
    Unrecognized(String),
    /// Not a withdraw (examine, tags, ...)
    Other(String),
}

impl WithdrawKind {
    /// Parse a host menu option label such as `Withdraw-1,000` or `Withdraw-All`.
    ///
    /// Numbers may carry thousands separators. A malformed number falls
    /// through to the keyword cases and ends up as
    /// [`WithdrawKind::Unrecognized`].
    pub fn parse(option: &str) -> Self {
        let Some(suffix) = option.strip_prefix(WITHDRAW_PREFIX) else {
            return Self::Other(option.to_string());
        };

        if let Ok(count) = suffix.replace(',', "").parse::<u64>() {
            if count > 0 {
                return Self::Count(count);
            }
        }

        match suffix {
            "All" => Self::All,
            "All-but-1" => Self::AllButOne,
            "X" => Self::PromptForAmount,
            _ => Self::Unrecognized(option.to_string()),
        }
    }

    /// True for the keywords that can remove the whole stack.
    pub fn is_unbounded(&self) -> bool {
        matches!(self, Self::All | Self::AllButOne | Self::PromptForAmount)
    }

    /// Label used in denial messages
    pub fn label(&self) -> String {
        match self {
            Self::Count(n) => format!("{}{}", WITHDRAW_PREFIX, n),
            Self::All => format!("{}All", WITHDRAW_PREFIX),
            Self::AllButOne => format!("{}All-but-1", WITHDRAW_PREFIX),
            Self::PromptForAmount => PROMPT_OPTION.to_string(),
            Self::Unrecognized(label) | Self::Other(label) => label.clone(),
        }
    }
}

/// Why a withdraw was refused. `Display` is the user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DenialReason {
    #[error("You don't have any of this item in this bank.")]
    NoLocalStock,

    #[error("You only have {available} of this item in this bank.")]
    InsufficientLocalStock { available: Quantity },

    #[error("'{option}' is only available at the bank that holds this stack.")]
    NotFullStackSite { option: String },
}

/// Outcome of an admission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenialReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Message to show the user, if denied
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Allow => None,
            Self::Deny(reason) => Some(reason.to_string()),
        }
    }
}

// =============================================================================
// Admission Control
// =============================================================================

/// Checks withdraw requests against a ledger.
#[derive(Debug, Clone, Copy)]
pub struct AdmissionControl {
    enforce: bool,
}

impl AdmissionControl {
    /// Enforcement is off when local banks are disabled or in debug mode.
    pub fn new(config: &LedgerConfig) -> Self {
        Self {
            enforce: config.enable_local_banks && !config.debug_mode,
        }
    }

    /// Always enforcing, regardless of configuration
    pub fn enforcing() -> Self {
        Self { enforce: true }
    }

    pub fn is_enforcing(&self) -> bool {
        self.enforce
    }

    /// Decide whether `kind` may be withdrawn for `item` at `site`.
    pub fn check(
        &self,
        ledger: &Ledger,
        site: Option<Site>,
        item: ItemId,
        kind: &WithdrawKind,
    ) -> Decision {
        if !self.enforce {
            return Decision::Allow;
        }
        if let WithdrawKind::Other(_) = kind {
            return Decision::Allow;
        }

        let local = ledger.local_quantity(item, site);
        let global = ledger.global_quantity(item);

        let decision = if local == 0 {
            Decision::Deny(DenialReason::NoLocalStock)
        } else {
            match kind {
                WithdrawKind::Count(requested) if *requested > u64::from(local) => {
                    Decision::Deny(DenialReason::InsufficientLocalStock { available: local })
                }
                unbounded if unbounded.is_unbounded() && global > local => {
                    Decision::Deny(DenialReason::NotFullStackSite {
                        option: unbounded.label(),
                    })
                }
                _ => Decision::Allow,
            }
        };

        if let Decision::Deny(reason) = &decision {
            tracing::info!(
                item,
                site = ?site,
                local,
                global,
                request = ?kind,
                %reason,
                "Withdraw denied"
            );
        }

        decision
    }
}

/// Bank menu entries removed before the menu is shown.
pub fn is_suppressed_option(option: &str) -> bool {
    option == PROMPT_OPTION
}

// =============================================================================
// Tests
// =============================================================================
