// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Certificate records and their derived identifiers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use wipewerk_core::error::Result;
use wipewerk_core::types::{DeviceInfo, JobId, WipeReport};
use wipewerk_ledger::{LedgerEntry, digest_canonical, hash_bytes};

/// Payload a verifier's QR scanner would carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrData {
    pub cert_id: String,
    pub serial: String,
    pub hash: String,
    pub verify_url: String,
}

/// A generated single-device certificate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Certificate {
    pub certificate_id: String,
    /// SHA-256 over the canonical `{device, wipe, cert_id}` record.
    pub certificate_hash: String,
    pub issue_time: DateTime<Utc>,
    pub device_info: DeviceInfo,
    pub wipe_report: WipeReport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger_entry: Option<LedgerEntry>,
    /// Document file name inside the certificates directory.
    pub filename: String,
    pub verification_url: String,
    pub qr_data: QrData,
}

/// Result of generating a bulk certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkCertificateOutput {
    pub filename: String,
    pub job_id: String,
    pub device_count: usize,
}

/// 16 uppercase hex digits derived from serial, job and generation time.
pub fn certificate_id(serial: &str, wipe_id: JobId, generated_at: DateTime<Utc>) -> String {
    let seed = format!("{serial}_{wipe_id}_{}", generated_at.to_rfc3339());
    hash_bytes(seed.as_bytes())[..16].to_uppercase()
}

/// Digest binding the device, the report and the certificate id together.
pub fn certificate_hash(device: &DeviceInfo, report: &WipeReport, cert_id: &str) -> Result<String> {
    digest_canonical(&json!({
        "device": device,
        "wipe": report,
        "cert_id": cert_id,
    }))
}

/// Reduce a device serial to characters safe in a file name.
pub fn filename_component(serial: &str) -> String {
    let cleaned: String = serial
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "UNKNOWN".into()
    } else {
        cleaned
    }
}

/// `YYYYmmdd_HHMMSS` stamp used in document names.
pub fn file_stamp(time: DateTime<Utc>) -> String {
    time.format("%Y%m%d_%H%M%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn id_is_sixteen_uppercase_hex_digits() {
        let at = Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap();
        let id = certificate_id("S1", JobId::new(), at);
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn id_changes_with_generation_time() {
        let job = JobId::new();
        let a = Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 1).unwrap();
        assert_ne!(certificate_id("S1", job, a), certificate_id("S1", job, b));
        assert_eq!(certificate_id("S1", job, a), certificate_id("S1", job, a));
    }

    #[test]
    fn serials_are_made_filename_safe() {
        assert_eq!(filename_component("WD-WCC 123/../x"), "WD-WCC_123____x");
        assert_eq!(filename_component("   "), "UNKNOWN");
    }

    #[test]
    fn stamp_format() {
        let at = Utc.with_ymd_and_hms(2026, 10, 16, 9, 5, 7).unwrap();
        assert_eq!(file_stamp(at), "20261016_090507");
    }
}
