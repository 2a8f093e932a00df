// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ledger blocks and their payloads.
//
// On disk a block looks like:
//
//   {
//     "block_index":    1,
//     "timestamp":      "2026-10-16T09:12:44.120931+00:00",
//     "transaction_id": "TXN-5F0C...",          -- absent on genesis
//     "data":           { "type": "erasure_certificate", ... },
//     "previous_hash":  "<64 hex>",
//     "block_hash":     "<64 hex>"
//   }
//
// `block_hash` is the SHA-256 of the canonical form of every other field.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use wipewerk_core::error::{Result, WipewerkError};

use crate::digest::{canonical_json, hash_bytes};

/// `previous_hash` of the genesis block.
pub const ZERO_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Message carried by the genesis block.
pub const GENESIS_MESSAGE: &str = "ERASH Ledger Genesis Block";

/// Fields of one erasure certificate as anchored in the ledger.
///
/// Unknown fields are rejected on read: the hash only covers the fields
/// modelled here, so anything extra could never be verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ErasureRecord {
    pub certificate_id: String,
    pub certificate_hash: String,
    pub device_serial: String,
    pub device_model: String,
    pub device_type: String,
    pub wipe_method: String,
    pub wipe_status: String,
    pub wipe_start: String,
    pub wipe_end: String,
    pub simulated: bool,
}

/// What a block records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum BlockPayload {
    Genesis { message: String },
    ErasureCertificate(ErasureRecord),
}

/// One immutable, hash-linked ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Block {
    #[serde(rename = "block_index")]
    pub index: u64,
    /// RFC 3339, recorded at append time.  Kept verbatim so re-hashing
    /// reproduces the stored digest byte for byte.
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    pub data: BlockPayload,
    pub previous_hash: String,
    pub block_hash: String,
}

impl Block {
    /// Build the genesis block, stamped now.
    pub fn genesis() -> Result<Self> {
        Self::seal(
            0,
            Utc::now().to_rfc3339(),
            None,
            BlockPayload::Genesis {
                message: GENESIS_MESSAGE.into(),
            },
            ZERO_HASH.into(),
        )
    }

    /// Assemble a block and compute its hash.
    pub fn seal(
        index: u64,
        timestamp: String,
        transaction_id: Option<String>,
        data: BlockPayload,
        previous_hash: String,
    ) -> Result<Self> {
        let mut block = Self {
            index,
            timestamp,
            transaction_id,
            data,
            previous_hash,
            block_hash: String::new(),
        };
        block.block_hash = block.compute_hash()?;
        Ok(block)
    }

    /// SHA-256 over the canonical form of every field except `block_hash`.
    pub fn compute_hash(&self) -> Result<String> {
        let mut value = serde_json::to_value(self)?;
        match value {
            Value::Object(ref mut map) => {
                map.remove("block_hash");
            }
            _ => {
                return Err(WipewerkError::Integrity(
                    "block did not serialize to an object".into(),
                ));
            }
        }
        Ok(hash_bytes(canonical_json(&value)?.as_bytes()))
    }

    /// Whether the stored hash matches a fresh recomputation.
    pub fn integrity_valid(&self) -> bool {
        self.compute_hash()
            .map(|h| h == self.block_hash)
            .unwrap_or(false)
    }

    pub fn erasure_record(&self) -> Option<&ErasureRecord> {
        match &self.data {
            BlockPayload::ErasureCertificate(record) => Some(record),
            BlockPayload::Genesis { .. } => None,
        }
    }
}

/// Derive the transaction id of an erasure block.
pub fn transaction_id(record: &ErasureRecord, timestamp: &str) -> String {
    let seed = format!(
        "{}_{}_{}",
        record.device_serial, record.certificate_id, timestamp
    );
    let digest = hash_bytes(seed.as_bytes());
    format!("TXN-{}", digest[..16].to_uppercase())
}

/// AND-filter over erasure records; an unset or empty field matches anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    pub certificate_id: Option<String>,
    pub device_serial: Option<String>,
    pub certificate_hash: Option<String>,
}

impl RecordFilter {
    /// True when no field would constrain the search.
    pub fn is_empty(&self) -> bool {
        [&self.certificate_id, &self.device_serial, &self.certificate_hash]
            .iter()
            .all(|f| given(f).is_none())
    }

    pub fn matches(&self, record: &ErasureRecord) -> bool {
        field_matches(&self.certificate_id, &record.certificate_id)
            && field_matches(&self.device_serial, &record.device_serial)
            && field_matches(&self.certificate_hash, &record.certificate_hash)
    }
}

fn given(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn field_matches(wanted: &Option<String>, actual: &str) -> bool {
    given(wanted).is_none_or(|w| w == actual)
}

/// Receipt returned to callers after an erasure block is appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub ledger_type: String,
    pub block_index: u64,
    pub block_hash: String,
    pub transaction_id: String,
    pub timestamp: String,
    pub previous_hash: String,
    pub certificate_hash: String,
}

impl LedgerEntry {
    /// `None` for genesis, which has no certificate to anchor.
    pub fn from_block(block: &Block) -> Option<Self> {
        let record = block.erasure_record()?;
        Some(Self {
            ledger_type: "local".into(),
            block_index: block.index,
            block_hash: block.block_hash.clone(),
            transaction_id: block.transaction_id.clone().unwrap_or_default(),
            timestamp: block.timestamp.clone(),
            previous_hash: block.previous_hash.clone(),
            certificate_hash: record.certificate_hash.clone(),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn record(cert_id: &str, serial: &str) -> ErasureRecord {
        ErasureRecord {
            certificate_id: cert_id.into(),
            certificate_hash: hash_bytes(cert_id.as_bytes()),
            device_serial: serial.into(),
            device_model: "WDC WD10EZEX".into(),
            device_type: "HDD".into(),
            wipe_method: "dodshort".into(),
            wipe_status: "completed".into(),
            wipe_start: "2026-10-16T09:00:00+00:00".into(),
            wipe_end: "2026-10-16T09:00:09+00:00".into(),
            simulated: true,
        }
    }

    #[test]
    fn genesis_is_self_consistent() {
        let genesis = Block::genesis().unwrap();
        assert_eq!(genesis.index, 0);
        assert_eq!(genesis.previous_hash, ZERO_HASH);
        assert!(genesis.transaction_id.is_none());
        assert!(genesis.integrity_valid());
        assert_eq!(genesis.block_hash.len(), 64);
    }

    #[test]
    fn genesis_hash_matches_erash_ledgers() {
        // Hash of the same genesis block as written by an ERASH ledger.
        let genesis = Block::seal(
            0,
            "2026-10-16T09:00:00".into(),
            None,
            BlockPayload::Genesis {
                message: GENESIS_MESSAGE.into(),
            },
            ZERO_HASH.into(),
        )
        .unwrap();
        assert_eq!(
            genesis.block_hash,
            "b4e00107f0b4e61e4dd8b06c590118f1a9b1a8767a20dfb3907cce8cebe94f39"
        );
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let block = Block::seal(
            1,
            "2026-10-16T09:00:10+00:00".into(),
            Some("TXN-0123456789ABCDEF".into()),
            BlockPayload::ErasureCertificate(record("ABC", "S1")),
            ZERO_HASH.into(),
        )
        .unwrap();
        let clean = serde_json::to_value(&block).unwrap();

        let mut in_data = clean.clone();
        in_data["data"]["note"] = "added later".into();
        assert!(serde_json::from_value::<Block>(in_data).is_err());

        let mut in_block = clean.clone();
        in_block["note"] = "added later".into();
        assert!(serde_json::from_value::<Block>(in_block).is_err());

        let mut in_genesis = serde_json::to_value(Block::genesis().unwrap()).unwrap();
        in_genesis["data"]["note"] = "added later".into();
        assert!(serde_json::from_value::<Block>(in_genesis).is_err());

        assert_eq!(serde_json::from_value::<Block>(clean).unwrap(), block);
    }

    #[test]
    fn payload_serializes_with_type_tag() {
        let block = Block::seal(
            1,
            "2026-10-16T09:00:10+00:00".into(),
            Some("TXN-0123456789ABCDEF".into()),
            BlockPayload::ErasureCertificate(record("ABC", "S1")),
            ZERO_HASH.into(),
        )
        .unwrap();
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["data"]["type"], "erasure_certificate");
        assert_eq!(value["block_index"], 1);
        assert_eq!(value["data"]["device_serial"], "S1");
    }

    #[test]
    fn any_field_change_breaks_integrity() {
        let mut block = Block::seal(
            3,
            "2026-10-16T09:00:10+00:00".into(),
            Some("TXN-0123456789ABCDEF".into()),
            BlockPayload::ErasureCertificate(record("ABC", "S1")),
            ZERO_HASH.into(),
        )
        .unwrap();
        assert!(block.integrity_valid());

        if let BlockPayload::ErasureCertificate(ref mut r) = block.data {
            r.simulated = false;
        }
        assert!(!block.integrity_valid());
    }

    #[test]
    fn hash_survives_a_disk_round_trip() {
        let block = Block::seal(
            1,
            "2026-10-16T09:00:10.123456+00:00".into(),
            Some("TXN-0123456789ABCDEF".into()),
            BlockPayload::ErasureCertificate(record("ABC", "S1")),
            ZERO_HASH.into(),
        )
        .unwrap();
        let json = serde_json::to_string_pretty(&block).unwrap();
        let back: Block = serde_json::from_str(&json).unwrap();
        assert!(back.integrity_valid());
        assert_eq!(back.block_hash, block.block_hash);
    }

    #[test]
    fn transaction_id_shape() {
        let id = transaction_id(&record("ABC", "S1"), "2026-10-16T09:00:10+00:00");
        assert!(id.starts_with("TXN-"));
        assert_eq!(id.len(), 20);
        assert_eq!(id[4..], id[4..].to_uppercase());
    }

    #[test]
    fn filter_uses_and_semantics() {
        let r = record("ABC", "S1");
        let by_serial = RecordFilter {
            device_serial: Some("S1".into()),
            ..Default::default()
        };
        assert!(by_serial.matches(&r));

        let both = RecordFilter {
            certificate_id: Some("ABC".into()),
            device_serial: Some("S2".into()),
            ..Default::default()
        };
        assert!(!both.matches(&r));
    }

    #[test]
    fn blank_filter_fields_are_unset() {
        let filter = RecordFilter {
            certificate_id: Some("  ".into()),
            ..Default::default()
        };
        assert!(filter.is_empty());
        assert!(filter.matches(&record("ABC", "S1")));
    }
}
