// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// wipewerk-ledger — tamper-evident record of erasure certificates.
//
// A single-writer, single-file hash chain: every block stores the SHA-256 of
// its predecessor, so changing any stored byte breaks verification from that
// block onwards.  There is no peer validation; this is tamper evidence, not
// consensus.

pub mod block;
pub mod digest;
pub mod snapshot;
pub mod store;

pub use block::{Block, BlockPayload, ErasureRecord, LedgerEntry, RecordFilter, ZERO_HASH};
pub use digest::{digest_canonical, hash_bytes};
pub use snapshot::{BlockVerification, LedgerSnapshot, LedgerStats, SerialRecord};
pub use store::LedgerStore;
