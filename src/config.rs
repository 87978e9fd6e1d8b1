//! Ledger Configuration
//!
//! Feature switches and the data directory. Values come from defaults,
//! then the process environment (a `.env` file is honoured).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// =============================================================================
// TigerStyle Constants
// =============================================================================

/// Default data directory (tilde expanded)
pub const DATA_DIR_DEFAULT: &str = "~/.stowage";

pub const ENV_ENABLE_LOCAL_BANKS: &str = "STOWAGE_ENABLE_LOCAL_BANKS";
pub const ENV_SHOW_LOCAL_GLOBAL: &str = "STOWAGE_SHOW_LOCAL_GLOBAL";
pub const ENV_DEBUG_MODE: &str = "STOWAGE_DEBUG_MODE";
pub const ENV_DATA_DIR: &str = "STOWAGE_DATA_DIR";

// =============================================================================
// Config
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Track per-site balances and enforce withdraw limits
    pub enable_local_banks: bool,
    /// Produce local/global overlay labels
    pub show_local_global: bool,
    /// Seeding mode: keep reconciling but never deny a withdraw
    pub debug_mode: bool,
    /// Where ledger files live
    pub data_dir: PathBuf,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            enable_local_banks: true,
            show_local_global: true,
            debug_mode: false,
            data_dir: expand_dir(DATA_DIR_DEFAULT),
        }
    }
}

impl LedgerConfig {
    /// Defaults overridden by `STOWAGE_*` environment variables.
    pub fn from_env() -> Self {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!(error = %e, "No .env file loaded");
        }

        let mut config = Self::default();
        config.apply(|key| std::env::var(key).ok());
        config
    }

    /// Override fields from a key lookup. Unparseable values are ignored.
    pub fn apply<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_ENABLE_LOCAL_BANKS).and_then(|v| parse_flag(&v)) {
            self.enable_local_banks = value;
        }
        if let Some(value) = lookup(ENV_SHOW_LOCAL_GLOBAL).and_then(|v| parse_flag(&v)) {
            self.show_local_global = value;
        }
        if let Some(value) = lookup(ENV_DEBUG_MODE).and_then(|v| parse_flag(&v)) {
            self.debug_mode = value;
        }
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|s| !s.trim().is_empty()) {
            self.data_dir = expand_dir(&dir);
        }
    }

    pub fn with_data_dir(mut self, dir: &str) -> Self {
        self.data_dir = expand_dir(dir);
        self
    }
}

fn expand_dir(dir: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(dir).to_string())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        other => {
            tracing::warn!(value = other, "Ignoring unrecognised boolean setting");
            None
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = LedgerConfig::default();
        assert!(config.enable_local_banks);
        assert!(config.show_local_global);
        assert!(!config.debug_mode);
        assert!(config.data_dir.ends_with(".stowage"));
    }

    #[test]
    fn test_apply_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_ENABLE_LOCAL_BANKS, "false"),
            (ENV_DEBUG_MODE, "YES"),
            (ENV_SHOW_LOCAL_GLOBAL, "maybe"),
            (ENV_DATA_DIR, "/tmp/stowage-test"),
        ]);

        let mut config = LedgerConfig::default();
        config.apply(|key| env.get(key).map(|v| v.to_string()));

        assert!(!config.enable_local_banks);
        assert!(config.debug_mode);
        assert!(config.show_local_global);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/stowage-test"));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: LedgerConfig = serde_json::from_str(r#"{"debug_mode": true}"#).unwrap();
        assert!(config.debug_mode);
        assert!(config.enable_local_banks);
    }
}
