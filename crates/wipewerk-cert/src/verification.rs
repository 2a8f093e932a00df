// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Outcome of checking a certificate against the ledger.

use serde::{Deserialize, Serialize};

use wipewerk_ledger::{Block, BlockVerification, ErasureRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    /// Block hash and chain up to it both check out.
    Valid,
    /// A matching block exists but the ledger has been altered.
    Invalid,
    NotFound,
    /// The ledger could not be read.
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    pub found: bool,
    pub verification_status: VerificationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integrity_valid: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_valid: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_index: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_data: Option<ErasureRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Verification {
    pub fn matched(block: &Block, check: BlockVerification) -> Self {
        let status = if check.is_valid() {
            VerificationStatus::Valid
        } else {
            VerificationStatus::Invalid
        };
        Self {
            found: true,
            verification_status: status,
            integrity_valid: Some(check.integrity_valid),
            chain_valid: Some(check.chain_valid),
            block_index: Some(block.index),
            block_hash: Some(block.block_hash.clone()),
            timestamp: Some(block.timestamp.clone()),
            transaction_id: block.transaction_id.clone(),
            certificate_data: block.erasure_record().cloned(),
            message: None,
        }
    }

    pub fn not_found() -> Self {
        Self::bare(
            VerificationStatus::NotFound,
            "No matching certificate found in ledger".into(),
        )
    }

    pub fn error(message: impl std::fmt::Display) -> Self {
        Self::bare(
            VerificationStatus::Error,
            format!("Error verifying certificate: {message}"),
        )
    }

    fn bare(status: VerificationStatus, message: String) -> Self {
        Self {
            found: false,
            verification_status: status,
            integrity_valid: None,
            chain_valid: None,
            block_index: None,
            block_hash: None,
            timestamp: None,
            transaction_id: None,
            certificate_data: None,
            message: Some(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_screaming() {
        let json = serde_json::to_string(&VerificationStatus::NotFound).unwrap();
        assert_eq!(json, "\"NOT_FOUND\"");
    }

    #[test]
    fn not_found_omits_block_fields() {
        let value = serde_json::to_value(Verification::not_found()).unwrap();
        assert_eq!(value["found"], false);
        assert_eq!(value["verification_status"], "NOT_FOUND");
        assert!(value.get("block_hash").is_none());
    }
}
