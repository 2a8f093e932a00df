// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ledger store — append-only hash chain persisted as one JSON file.
//
// Every operation takes the store lock and reads the whole file.  Appends
// write the whole file back through a temp file + rename.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::{debug, info, instrument};
use wipewerk_core::error::{Result, WipewerkError};

use crate::block::{Block, BlockPayload, ErasureRecord, RecordFilter, transaction_id};
use crate::snapshot::{
    BlockVerification, LEDGER_VERSION, LedgerSnapshot, LedgerStats, SerialRecord,
};

/// Append-only, hash-chained ledger backed by a single JSON file.
pub struct LedgerStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl LedgerStore {
    /// Open the ledger at `path`, creating it with a genesis block if absent.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        };
        store.init()?;
        debug!("ledger opened");
        Ok(store)
    }

    /// Create the ledger file with a genesis block.
    ///
    /// Idempotent: an existing ledger is never overwritten.  Returns `true`
    /// if a new ledger was written.
    pub fn init(&self) -> Result<bool> {
        let _guard = self.guard();
        if self.path.exists() {
            return Ok(false);
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let snapshot = LedgerSnapshot::with_genesis()?;
        self.write_locked(&snapshot)?;
        info!(path = %self.path.display(), "ledger created with genesis block");
        Ok(true)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Consistent copy of the whole ledger.
    pub fn snapshot(&self) -> Result<LedgerSnapshot> {
        let _guard = self.guard();
        self.read_locked()
    }

    /// Append a block carrying `payload` and return it.
    ///
    /// Exactly one append runs at a time: the read of the current tail, the
    /// index assignment and the rewrite of the file all happen under the
    /// store lock.
    #[instrument(skip_all)]
    pub fn append(&self, payload: BlockPayload) -> Result<Block> {
        let BlockPayload::ErasureCertificate(record) = payload else {
            return Err(WipewerkError::Validation(
                "only the ledger itself may create a genesis block".into(),
            ));
        };

        let _guard = self.guard();
        let mut snapshot = self.read_locked()?;
        let previous_hash = snapshot
            .tail()
            .map(|b| b.block_hash.clone())
            .ok_or_else(|| WipewerkError::Integrity("ledger has no genesis block".into()))?;

        let timestamp = Utc::now().to_rfc3339();
        let txn = transaction_id(&record, &timestamp);
        let block = Block::seal(
            snapshot.len() as u64,
            timestamp,
            Some(txn),
            BlockPayload::ErasureCertificate(record),
            previous_hash,
        )?;

        snapshot.blocks.push(block.clone());
        self.write_locked(&snapshot)?;

        info!(
            block_index = block.index,
            block_hash = %block.block_hash,
            "erasure block appended"
        );
        Ok(block)
    }

    /// Convenience wrapper for the common case.
    pub fn append_record(&self, record: ErasureRecord) -> Result<Block> {
        self.append(BlockPayload::ErasureCertificate(record))
    }

    /// Erasure blocks matching `filter`, in append order.
    pub fn find(&self, filter: &RecordFilter) -> Result<Vec<Block>> {
        let snapshot = self.snapshot()?;
        let found: Vec<Block> = snapshot.find(filter).into_iter().cloned().collect();
        debug!(matches = found.len(), "ledger search");
        Ok(found)
    }

    pub fn verify_chain(&self, up_to: u64) -> Result<bool> {
        Ok(self.snapshot()?.verify_chain(up_to))
    }

    pub fn verify_one(&self, block: &Block) -> Result<BlockVerification> {
        Ok(self.snapshot()?.verify_one(block))
    }

    pub fn stats(&self) -> Result<LedgerStats> {
        Ok(self.snapshot()?.stats())
    }

    pub fn search_by_serial(&self, serial: &str) -> Result<Vec<SerialRecord>> {
        Ok(self.snapshot()?.records_for_serial(serial))
    }

    /// Read-only copy of the full ledger for audit or backup.
    pub fn export(&self) -> Result<LedgerSnapshot> {
        self.snapshot()
    }

    /// Write a pretty-printed copy of the ledger into `dir`.
    #[instrument(skip_all, fields(dir = %dir.as_ref().display()))]
    pub fn export_to(&self, dir: impl AsRef<Path>) -> Result<(PathBuf, LedgerSnapshot)> {
        let snapshot = self.snapshot()?;
        fs::create_dir_all(dir.as_ref())?;
        let name = format!(
            "ledger_export_{}.json",
            Utc::now().format("%Y%m%d_%H%M%S")
        );
        let path = dir.as_ref().join(name);
        fs::write(&path, serde_json::to_string_pretty(&snapshot)?)?;
        info!(path = %path.display(), blocks = snapshot.len(), "ledger exported");
        Ok((path, snapshot))
    }

    // -- Locked file access ------------------------------------------------

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_locked(&self) -> Result<LedgerSnapshot> {
        let data = fs::read_to_string(&self.path)?;
        let snapshot: LedgerSnapshot = serde_json::from_str(&data).map_err(|e| {
            WipewerkError::Integrity(format!("ledger {} unreadable: {e}", self.path.display()))
        })?;
        // Block hashes are only reproducible under the canonical form of
        // the version that wrote them.
        if snapshot.ledger_version != LEDGER_VERSION {
            return Err(WipewerkError::Integrity(format!(
                "ledger {} has unsupported version {:?}",
                self.path.display(),
                snapshot.ledger_version
            )));
        }
        Ok(snapshot)
    }

    fn write_locked(&self, snapshot: &LedgerSnapshot) -> Result<()> {
        let json = serde_json::to_string_pretty(snapshot)?;
        let tmp = self.path.with_extension("json.tmp");
        {
            let mut file = File::create(&tmp)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
