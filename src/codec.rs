//! Ledger File Codec
//!
//! TigerStyle: JSON, XOR with a fixed byte, then base64.
//!
//! This only keeps the file from being casually edited in a text editor.
//! The key is a constant in this file; it provides no confidentiality.
//!
//! Logical schema:
//!
//! ```text
//! { "balances": { "<itemId>": { "<SITE_NAME>": <positive int>, ... }, ... } }
//! ```

use crate::ledger::{Balances, ItemId, Ledger, LedgerSnapshot, Quantity};
use crate::site::Site;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// TigerStyle Constants
// =============================================================================

/// Single-byte XOR key applied to the serialized JSON
pub const OBFUSCATION_KEY: u8 = 0x5A;

// =============================================================================
// Types
// =============================================================================

/// On-disk document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankData {
    /// item -> (site -> quantity). `null` in the file reads as `None`.
    #[serde(default)]
    pub balances: Option<BTreeMap<ItemId, BTreeMap<Site, Quantity>>>,
}

impl BankData {
    /// Document for a ledger snapshot. Zero entries are never written.
    pub fn from_snapshot(snapshot: &LedgerSnapshot) -> Self {
        let balances = snapshot
            .balances()
            .iter()
            .filter_map(|(item, per_site)| {
                let sites: BTreeMap<Site, Quantity> = per_site
                    .iter()
                    .filter(|(_, qty)| **qty > 0)
                    .map(|(site, qty)| (*site, *qty))
                    .collect();
                (!sites.is_empty()).then_some((*item, sites))
            })
            .collect();

        Self {
            balances: Some(balances),
        }
    }

    /// Ledger for this document, or `None` when the balances section is absent.
    pub fn into_ledger(self) -> Option<Ledger> {
        let balances: Balances = self
            .balances?
            .into_iter()
            .map(|(item, per_site)| (item, per_site.into_iter().collect()))
            .collect();
        Some(Ledger::from_balances(balances))
    }
}

// =============================================================================
// Encode / Decode
// =============================================================================

fn xor_bytes(input: &[u8]) -> Vec<u8> {
    input.iter().map(|b| b ^ OBFUSCATION_KEY).collect()
}

/// Serialize and obfuscate a document.
pub fn encode(data: &BankData) -> Result<String, CodecError> {
    let json = serde_json::to_vec(data)?;
    Ok(BASE64.encode(xor_bytes(&json)))
}

/// Reverse [`encode`]. Surrounding whitespace is ignored.
pub fn decode(raw: &[u8]) -> Result<BankData, CodecError> {
    let text = std::str::from_utf8(raw).map_err(|_| CodecError::NotText)?;
    let obfuscated = BASE64.decode(text.trim())?;
    let json = xor_bytes(&obfuscated);
    let data = serde_json::from_slice(&json)?;
    Ok(data)
}

// =============================================================================
// Errors
// =============================================================================

/// Codec errors
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("ledger file is not text")]
    NotText,

    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("invalid ledger document: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::{reconcile, ObservedTotals};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_encoded_form_is_obfuscated() {
        let mut ledger = Ledger::new();
        let observed: ObservedTotals = [(995, 1_000)].into_iter().collect();
        reconcile(&mut ledger, Some(Site::GrandExchange), &observed);

        let encoded = encode(&BankData::from_snapshot(&ledger.snapshot())).unwrap();
        assert!(!encoded.contains("GRAND_EXCHANGE"));

        let json = xor_bytes(&BASE64.decode(&encoded).unwrap());
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(value["balances"]["995"]["GRAND_EXCHANGE"], 1_000);
    }

    #[test]
    fn test_decode_round_trip() {
        let mut ledger = Ledger::new();
        let first: ObservedTotals = [(7, 10), (8, 1)].into_iter().collect();
        let second: ObservedTotals = [(7, 15), (8, 1)].into_iter().collect();
        reconcile(&mut ledger, Some(Site::Lumbridge), &first);
        reconcile(&mut ledger, Some(Site::Catherby), &second);

        let encoded = encode(&BankData::from_snapshot(&ledger.snapshot())).unwrap();
        let decoded = decode(format!("{}\n", encoded).as_bytes()).unwrap();
        assert_eq!(decoded.into_ledger(), Some(ledger));
    }

    #[test]
    fn test_random_ledgers_survive_encoding() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut ledger = Ledger::new();

        for step in 0..500 {
            let site = Site::ALL[rng.gen_range(0..Site::ALL.len())];
            let observed: ObservedTotals = (0..rng.gen_range(0..5))
                .map(|_| (rng.gen_range(1..20), rng.gen_range(0..=u32::MAX)))
                .collect();
            reconcile(&mut ledger, Some(site), &observed);

            let encoded = encode(&BankData::from_snapshot(&ledger.snapshot())).unwrap();
            let decoded = decode(encoded.as_bytes()).unwrap();
            assert_eq!(decoded.into_ledger(), Some(ledger.clone()), "step {}", step);
        }
    }

    #[test]
    fn test_null_balances_is_absent() {
        let json = br#"{"balances": null}"#;
        let encoded = BASE64.encode(xor_bytes(json));
        let decoded = decode(encoded.as_bytes()).unwrap();
        assert!(decoded.into_ledger().is_none());

        let encoded = BASE64.encode(xor_bytes(b"{}"));
        assert!(decode(encoded.as_bytes()).unwrap().into_ledger().is_none());
    }

    #[test]
    fn test_corrupt_input_errors() {
        assert!(matches!(decode(b"not base64 !!"), Err(CodecError::Base64(_))));
        assert!(matches!(decode(&[0xff, 0xfe]), Err(CodecError::NotText)));

        let garbage = BASE64.encode(b"plain json, not xored");
        assert!(matches!(decode(garbage.as_bytes()), Err(CodecError::Json(_))));
    }

    #[test]
    fn test_unknown_site_name_rejected() {
        let json = br#"{"balances": {"7": {"ATLANTIS": 3}}}"#;
        let encoded = BASE64.encode(xor_bytes(json));
        assert!(matches!(decode(encoded.as_bytes()), Err(CodecError::Json(_))));
    }
}
