// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory copy of the whole ledger file and the read-only queries over it.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use wipewerk_core::error::Result;

use crate::block::{Block, RecordFilter, ZERO_HASH};

pub const LEDGER_VERSION: &str = "1.0";
pub const LEDGER_TYPE: &str = "local_immutable";
const LEDGER_DESCRIPTION: &str = "Immutable ledger for disk erasure certificates";

/// The ledger file: metadata envelope plus the append-ordered blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub ledger_version: String,
    pub created_at: String,
    pub ledger_type: String,
    pub description: String,
    pub blocks: Vec<Block>,
}

/// Result of checking a single block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockVerification {
    /// Stored hash matches the recomputed hash of this block alone.
    pub integrity_valid: bool,
    /// Every block from genesis up to this one links and hashes correctly.
    pub chain_valid: bool,
}

impl BlockVerification {
    pub fn is_valid(&self) -> bool {
        self.integrity_valid && self.chain_valid
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStats {
    pub ledger_type: String,
    pub total_blocks: usize,
    pub erasure_record_count: usize,
    pub created_at: String,
    pub last_block_time: Option<String>,
    pub chain_valid: bool,
}

/// One row of a search by device serial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialRecord {
    pub block_index: u64,
    pub timestamp: String,
    pub certificate_id: String,
    pub certificate_hash: String,
    pub wipe_method: String,
    pub wipe_status: String,
}

impl LedgerSnapshot {
    /// A fresh ledger holding only the genesis block.
    pub fn with_genesis() -> Result<Self> {
        Ok(Self {
            ledger_version: LEDGER_VERSION.into(),
            created_at: Utc::now().to_rfc3339(),
            ledger_type: LEDGER_TYPE.into(),
            description: LEDGER_DESCRIPTION.into(),
            blocks: vec![Block::genesis()?],
        })
    }

    pub fn tail(&self) -> Option<&Block> {
        self.blocks.last()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Erasure blocks matching `filter`, in append order.
    pub fn find(&self, filter: &RecordFilter) -> Vec<&Block> {
        self.blocks
            .iter()
            .filter(|b| b.erasure_record().is_some_and(|r| filter.matches(r)))
            .collect()
    }

    /// Check linkage and hashes for blocks `0..=up_to`.
    ///
    /// Returns `false` at the first mismatch, and for any `up_to` beyond the
    /// tail.
    pub fn verify_chain(&self, up_to: u64) -> bool {
        let Ok(end) = usize::try_from(up_to) else {
            return false;
        };
        if end >= self.blocks.len() {
            return false;
        }

        let mut expected_prev = ZERO_HASH;
        for (position, block) in self.blocks[..=end].iter().enumerate() {
            if block.index != position as u64 {
                return false;
            }
            if block.previous_hash != expected_prev {
                return false;
            }
            if !block.integrity_valid() {
                return false;
            }
            expected_prev = &block.block_hash;
        }
        true
    }

    pub fn verify_one(&self, block: &Block) -> BlockVerification {
        BlockVerification {
            integrity_valid: block.integrity_valid(),
            chain_valid: self.verify_chain(block.index),
        }
    }

    /// Validity of the whole chain.
    pub fn chain_valid(&self) -> bool {
        match self.blocks.len() {
            0 => false,
            n => self.verify_chain(n as u64 - 1),
        }
    }

    pub fn stats(&self) -> LedgerStats {
        LedgerStats {
            ledger_type: "local".into(),
            total_blocks: self.blocks.len(),
            erasure_record_count: self
                .blocks
                .iter()
                .filter(|b| b.erasure_record().is_some())
                .count(),
            created_at: self.created_at.clone(),
            last_block_time: self.tail().map(|b| b.timestamp.clone()),
            chain_valid: self.chain_valid(),
        }
    }

    pub fn records_for_serial(&self, serial: &str) -> Vec<SerialRecord> {
        self.blocks
            .iter()
            .filter_map(|b| {
                let r = b.erasure_record()?;
                (r.device_serial == serial).then(|| SerialRecord {
                    block_index: b.index,
                    timestamp: b.timestamp.clone(),
                    certificate_id: r.certificate_id.clone(),
                    certificate_hash: r.certificate_hash.clone(),
                    wipe_method: r.wipe_method.clone(),
                    wipe_status: r.wipe_status.clone(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::tests::record;
    use crate::block::{BlockPayload, transaction_id};

    fn chain_of(n: usize) -> LedgerSnapshot {
        let mut snap = LedgerSnapshot::with_genesis().unwrap();
        for i in 0..n {
            let prev = snap.tail().unwrap().block_hash.clone();
            let r = record(&format!("CERT{i}"), if i % 2 == 0 { "S-EVEN" } else { "S-ODD" });
            let ts = format!("2026-10-16T09:00:{i:02}+00:00");
            let txn = transaction_id(&r, &ts);
            let block = Block::seal(
                snap.len() as u64,
                ts,
                Some(txn),
                BlockPayload::ErasureCertificate(r),
                prev,
            )
            .unwrap();
            snap.blocks.push(block);
        }
        snap
    }

    #[test]
    fn fresh_chain_verifies() {
        let snap = chain_of(5);
        for i in 0..6 {
            assert!(snap.verify_chain(i), "prefix up to {i} should verify");
        }
        assert!(!snap.verify_chain(6));
    }

    #[test]
    fn tampered_payload_invalidates_from_that_block() {
        let mut snap = chain_of(5);
        if let BlockPayload::ErasureCertificate(ref mut r) = snap.blocks[3].data {
            r.device_serial.push('X');
        }
        assert!(snap.verify_chain(2));
        for i in 3..6 {
            assert!(!snap.verify_chain(i));
        }
    }

    #[test]
    fn tampered_previous_hash_invalidates() {
        let mut snap = chain_of(3);
        let mut bytes = snap.blocks[2].previous_hash.clone().into_bytes();
        bytes[0] = if bytes[0] == b'a' { b'b' } else { b'a' };
        snap.blocks[2].previous_hash = String::from_utf8(bytes).unwrap();
        assert!(snap.verify_chain(1));
        assert!(!snap.verify_chain(2));
        assert!(!snap.verify_chain(3));
    }

    #[test]
    fn tampered_genesis_invalidates_everything() {
        let mut snap = chain_of(2);
        snap.blocks[0].timestamp.push('Z');
        for i in 0..3 {
            assert!(!snap.verify_chain(i));
        }
    }

    #[test]
    fn find_returns_matches_in_append_order() {
        let snap = chain_of(5);
        let filter = RecordFilter {
            device_serial: Some("S-EVEN".into()),
            ..Default::default()
        };
        let found: Vec<u64> = snap.find(&filter).iter().map(|b| b.index).collect();
        assert_eq!(found, vec![1, 3, 5]);
    }

    #[test]
    fn stats_count_erasure_records() {
        let snap = chain_of(4);
        let stats = snap.stats();
        assert_eq!(stats.total_blocks, 5);
        assert_eq!(stats.erasure_record_count, 4);
        assert!(stats.chain_valid);
        assert_eq!(
            stats.last_block_time.as_deref(),
            Some(snap.blocks[4].timestamp.as_str())
        );
    }

    #[test]
    fn serial_search_summarises_records() {
        let snap = chain_of(3);
        let rows = snap.records_for_serial("S-ODD");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].block_index, 2);
        assert_eq!(rows[0].certificate_id, "CERT1");
        assert!(snap.records_for_serial("NOPE").is_empty());
    }
}
