// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Certificate content, independent of the output format.

use chrono::{DateTime, Utc};

use wipewerk_core::types::{DeviceInfo, WipeReport};

/// Longest serial shown in a bulk table row.
const BULK_SERIAL_CHARS: usize = 20;
/// Longest model shown in a bulk table row.
const BULK_MODEL_CHARS: usize = 25;

/// One visual line of a certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Title(String),
    /// Boxed notice under the title.
    Banner(String),
    Heading(String),
    /// Label/value pair in a two-column table.
    Field { label: String, value: String },
    /// Row of a multi-column table.
    Row(Vec<String>),
    Text(String),
    /// Fixed-width text for hashes and identifiers.
    Mono(String),
    /// Fine print.
    Small(String),
    Blank,
}

/// An ordered list of lines plus the document title.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificateDocument {
    pub title: String,
    pub lines: Vec<Line>,
}

impl CertificateDocument {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            lines: Vec::new(),
        }
    }

    pub fn push(&mut self, line: Line) -> &mut Self {
        self.lines.push(line);
        self
    }

    pub fn heading(&mut self, text: impl Into<String>) -> &mut Self {
        self.push(Line::Heading(text.into()))
    }

    pub fn field(&mut self, label: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.push(Line::Field {
            label: label.into(),
            value: value.into(),
        })
    }

    pub fn text(&mut self, text: impl Into<String>) -> &mut Self {
        self.push(Line::Text(text.into()))
    }

    pub fn blank(&mut self) -> &mut Self {
        self.push(Line::Blank)
    }

    /// Value of the first field labelled `label`.
    pub fn field_value(&self, label: &str) -> Option<&str> {
        self.lines.iter().find_map(|line| match line {
            Line::Field { label: l, value } if l == label => Some(value.as_str()),
            _ => None,
        })
    }
}

/// Ledger anchor printed on a certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSection<'a> {
    pub ledger_type: &'a str,
    pub block_index: u64,
    pub block_hash: &'a str,
    pub transaction_id: &'a str,
    pub timestamp: &'a str,
}

/// Everything printed on a single-device certificate.
#[derive(Debug, Clone)]
pub struct SingleCertificate<'a> {
    pub certificate_id: &'a str,
    pub certificate_hash: &'a str,
    pub issue_time: DateTime<Utc>,
    pub device: &'a DeviceInfo,
    pub report: &'a WipeReport,
    pub ledger: Option<LedgerSection<'a>>,
    pub verification_url: &'a str,
    /// JSON payload a QR encoder would carry; printed verbatim.
    pub qr_payload: &'a str,
}

/// Everything printed on a bulk certificate.
#[derive(Debug, Clone)]
pub struct BulkCertificate<'a> {
    pub job_id: &'a str,
    pub issue_time: DateTime<Utc>,
    pub entries: Vec<(&'a WipeReport, &'a DeviceInfo)>,
}

fn stamp(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn truncate(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

/// Lay out the certificate for one erased device.
pub fn single_certificate(cert: &SingleCertificate<'_>) -> CertificateDocument {
    let device = cert.device;
    let report = cert.report;
    let mut doc = CertificateDocument::new(format!("Erasure Certificate {}", cert.certificate_id));

    doc.push(Line::Title("CERTIFICATE OF SECURE DATA ERASURE".into()))
        .push(Line::Banner("*** IRREVERSIBLE ERASURE PERFORMED ***".into()))
        .blank()
        .field("Certificate ID:", cert.certificate_id)
        .field("Issue Date:", stamp(cert.issue_time))
        .blank();

    doc.heading("Device Information")
        .field("Device Path:", device.name.as_str())
        .field("Model:", device.model.as_str())
        .field("Serial Number:", device.serial.as_str())
        .field("Capacity:", device.size.as_str())
        .field("Type:", device.device_type.as_str())
        .field("Transport:", device.transport.as_str())
        .blank();

    doc.heading("Erasure Operation Details")
        .field("Wipe ID:", report.wipe_id.to_string())
        .field("Method:", report.method.as_str().to_uppercase())
        .field("Start Time:", report.start_time.to_rfc3339())
        .field(
            "End Time:",
            report
                .end_time
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "N/A".into()),
        )
        .field("Duration:", report.duration.as_str())
        .field("Status:", report.status.as_str().to_uppercase())
        .field("Verification:", report.verification.as_str())
        .field("Mode:", if report.simulated { "SIMULATED" } else { "REAL" })
        .blank();

    if let Some(ledger) = &cert.ledger {
        doc.heading("Ledger Anchor")
            .field("Ledger Type:", ledger.ledger_type)
            .field("Block Index:", ledger.block_index.to_string())
            .field("Block Hash:", ledger.block_hash)
            .field("Transaction ID:", ledger.transaction_id)
            .field("Timestamp:", ledger.timestamp)
            .blank();
    }

    doc.heading("Certificate Integrity")
        .text("SHA-256 Hash:")
        .push(Line::Mono(cert.certificate_hash.to_string()))
        .blank();

    doc.heading("Verification")
        .text(format!("Verify at: {}", cert.verification_url))
        .push(Line::Mono(cert.qr_payload.to_string()))
        .blank();

    doc.push(Line::Small(
        "This certificate confirms that the above device has been securely erased \
         using industry-standard methods."
            .into(),
    ))
    .push(Line::Small(format!(
        "Generated by Wipewerk v{} | {}",
        env!("CARGO_PKG_VERSION"),
        stamp(cert.issue_time)
    )));

    doc
}

/// Lay out one certificate covering several erased devices.
pub fn bulk_certificate(cert: &BulkCertificate<'_>) -> CertificateDocument {
    let mut doc = CertificateDocument::new(format!("Bulk Erasure Certificate {}", cert.job_id));

    doc.push(Line::Title("BULK ERASURE CERTIFICATE".into()))
        .blank()
        .field("Job ID:", cert.job_id)
        .field("Date:", stamp(cert.issue_time))
        .field("Total Devices:", cert.entries.len().to_string())
        .blank()
        .heading("Erased Devices")
        .push(Line::Row(
            ["#", "Serial Number", "Model", "Type", "Status"]
                .map(String::from)
                .to_vec(),
        ));

    for (n, (report, device)) in cert.entries.iter().enumerate() {
        doc.push(Line::Row(vec![
            (n + 1).to_string(),
            truncate(&device.serial, BULK_SERIAL_CHARS),
            truncate(&device.model, BULK_MODEL_CHARS),
            device.device_type.to_string(),
            report.status.as_str().to_uppercase(),
        ]));
    }

    doc
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeDelta;
    use wipewerk_core::types::{DeviceClass, JobId, JobStatus, WipeMethod};

    pub(crate) fn device(serial: &str) -> DeviceInfo {
        DeviceInfo {
            name: "/dev/sdb".into(),
            model: "WDC WD10EZEX-08WN4A0 with a long model".into(),
            serial: serial.into(),
            size: "1T".into(),
            device_type: DeviceClass::Hdd,
            rotational: true,
            transport: "sata".into(),
            partitions: Vec::new(),
            partition_count: 0,
        }
    }

    pub(crate) fn report() -> WipeReport {
        let start = Utc::now();
        WipeReport {
            wipe_id: JobId::new(),
            device: "/dev/sdb".into(),
            method: WipeMethod::DodShort,
            status: JobStatus::Completed,
            start_time: start,
            end_time: Some(start + TimeDelta::seconds(9)),
            duration: "0:00:09".into(),
            simulated: true,
            verification: "Passed".into(),
            log_summary: Vec::new(),
        }
    }

    fn single<'a>(
        device: &'a DeviceInfo,
        report: &'a WipeReport,
        ledger: Option<LedgerSection<'a>>,
    ) -> CertificateDocument {
        single_certificate(&SingleCertificate {
            certificate_id: "0123456789ABCDEF",
            certificate_hash: "ab".repeat(32).leak(),
            issue_time: Utc::now(),
            device,
            report,
            ledger,
            verification_url: "https://verify.example/cert/0123456789ABCDEF",
            qr_payload: "{}",
        })
    }

    #[test]
    fn single_certificate_lists_device_and_erasure() {
        let device = device("WD-WCC123456789");
        let report = report();
        let doc = single(&device, &report, None);

        assert_eq!(doc.field_value("Certificate ID:"), Some("0123456789ABCDEF"));
        assert_eq!(doc.field_value("Serial Number:"), Some("WD-WCC123456789"));
        assert_eq!(doc.field_value("Method:"), Some("DODSHORT"));
        assert_eq!(doc.field_value("Status:"), Some("COMPLETED"));
        assert_eq!(doc.field_value("Mode:"), Some("SIMULATED"));
        assert!(doc.field_value("Block Hash:").is_none());
    }

    #[test]
    fn ledger_section_only_when_recorded() {
        let device = device("S1");
        let report = report();
        let doc = single(
            &device,
            &report,
            Some(LedgerSection {
                ledger_type: "local",
                block_index: 4,
                block_hash: "ff00",
                transaction_id: "TXN-0123456789ABCDEF",
                timestamp: "2026-10-16T09:00:09+00:00",
            }),
        );
        assert_eq!(doc.field_value("Block Index:"), Some("4"));
        assert_eq!(doc.field_value("Transaction ID:"), Some("TXN-0123456789ABCDEF"));
    }

    #[test]
    fn bulk_rows_are_numbered_and_truncated() {
        let d1 = device("S-ONE-WITH-A-VERY-LONG-SERIAL");
        let d2 = device("S-TWO");
        let r = report();
        let doc = bulk_certificate(&BulkCertificate {
            job_id: "BULK_20261016_090000",
            issue_time: Utc::now(),
            entries: vec![(&r, &d1), (&r, &d2)],
        });

        let rows: Vec<&Vec<String>> = doc
            .lines
            .iter()
            .filter_map(|l| match l {
                Line::Row(cells) => Some(cells),
                _ => None,
            })
            .collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1][0], "1");
        assert_eq!(rows[1][1].chars().count(), 20);
        assert_eq!(rows[1][2].chars().count(), 25);
        assert_eq!(rows[2][1], "S-TWO");
        assert_eq!(rows[2][4], "COMPLETED");
        assert_eq!(doc.field_value("Total Devices:"), Some("2"));
    }
}
