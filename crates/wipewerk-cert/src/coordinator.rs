// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Certification coordinator.
//
// Builds certificates from finished wipe reports, writes their documents,
// and on request anchors them in the ledger with exactly one append.
// Verification is read-only: it never writes to the ledger, even when the
// ledger turns out to be unreadable.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, instrument, warn};

use wipewerk_core::config::AppConfig;
use wipewerk_core::error::{Result, WipewerkError};
use wipewerk_core::types::{DeviceInfo, JobId, WipeReport};
use wipewerk_document::{
    BulkCertificate, CertificateWriter, LedgerSection, SingleCertificate, StagedFile,
    bulk_certificate, single_certificate,
};
use wipewerk_ledger::{ErasureRecord, LedgerEntry, LedgerStore, RecordFilter, SerialRecord};
use wipewerk_wipe::{DeviceInventory, JobRegistry};

use crate::certificate::{
    BulkCertificateOutput, Certificate, QrData, certificate_hash, certificate_id, file_stamp,
    filename_component,
};
use crate::verification::Verification;

/// Where certificates go and how they point back to the verifier.
#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    pub certificates_dir: PathBuf,
    pub verify_base_url: String,
}

impl CoordinatorSettings {
    pub fn from_config(config: &AppConfig, data_dir: &Path) -> Self {
        Self {
            certificates_dir: data_dir.join(&config.certificates_dir),
            verify_base_url: config.verify_base_url.clone(),
        }
    }
}

pub struct CertificationCoordinator {
    ledger: Arc<LedgerStore>,
    registry: JobRegistry,
    inventory: DeviceInventory,
    writer: CertificateWriter,
    settings: CoordinatorSettings,
}

impl CertificationCoordinator {
    /// Create the coordinator, creating the certificates directory if needed.
    pub fn new(
        ledger: Arc<LedgerStore>,
        registry: JobRegistry,
        inventory: DeviceInventory,
        settings: CoordinatorSettings,
    ) -> Result<Self> {
        std::fs::create_dir_all(&settings.certificates_dir)?;
        Ok(Self {
            ledger,
            registry,
            inventory,
            writer: CertificateWriter::default(),
            settings,
        })
    }

    pub fn ledger(&self) -> &LedgerStore {
        &self.ledger
    }

    pub fn certificates_dir(&self) -> &Path {
        &self.settings.certificates_dir
    }

    // -- Issuing ----------------------------------------------------------------

    /// Certify one erasure.
    ///
    /// With `record_on_ledger` the certificate hash is appended to the ledger
    /// once and the resulting entry is embedded in both the certificate and
    /// its document.  The document file is opened before the append, so a
    /// missing or read-only certificates directory never leaves a ledger
    /// record behind.
    #[instrument(skip_all, fields(wipe_id = %report.wipe_id, serial = %device.serial, record_on_ledger = record_on_ledger))]
    pub fn certify(
        &self,
        report: &WipeReport,
        device: &DeviceInfo,
        record_on_ledger: bool,
    ) -> Result<Certificate> {
        let issue_time = Utc::now();
        let cert_id = certificate_id(&device.serial, report.wipe_id, issue_time);
        let cert_hash = certificate_hash(device, report, &cert_id)?;

        let verification_url = format!(
            "{}/{}",
            self.settings.verify_base_url.trim_end_matches('/'),
            cert_id
        );
        let qr_data = QrData {
            cert_id: cert_id.clone(),
            serial: device.serial.clone(),
            hash: cert_hash.clone(),
            verify_url: verification_url.clone(),
        };
        let qr_payload = serde_json::to_string(&qr_data)?;

        let filename = format!(
            "cert_{}_{}.pdf",
            filename_component(&device.serial),
            file_stamp(issue_time)
        );
        let staged = StagedFile::create(self.settings.certificates_dir.join(&filename))?;

        let ledger_entry = if record_on_ledger {
            let block = self.ledger.append_record(erasure_record(
                &cert_id, &cert_hash, device, report,
            ))?;
            LedgerEntry::from_block(&block)
        } else {
            None
        };

        let doc = single_certificate(&SingleCertificate {
            certificate_id: &cert_id,
            certificate_hash: &cert_hash,
            issue_time,
            device,
            report,
            ledger: ledger_entry.as_ref().map(|e| LedgerSection {
                ledger_type: &e.ledger_type,
                block_index: e.block_index,
                block_hash: &e.block_hash,
                transaction_id: &e.transaction_id,
                timestamp: &e.timestamp,
            }),
            verification_url: &verification_url,
            qr_payload: &qr_payload,
        });
        if let Err(e) = self.writer.write_staged(&doc, staged) {
            return Err(match &ledger_entry {
                Some(entry) => {
                    error!(certificate_id = %cert_id, block_index = entry.block_index, error = %e, "recorded certificate has no document");
                    WipewerkError::Document(format!(
                        "certificate {cert_id} is recorded in ledger block {} \
                         but its document could not be written: {e}",
                        entry.block_index
                    ))
                }
                None => e,
            });
        }

        info!(certificate_id = %cert_id, filename, recorded = ledger_entry.is_some(), "certificate issued");
        Ok(Certificate {
            certificate_id: cert_id,
            certificate_hash: cert_hash,
            issue_time,
            device_info: device.clone(),
            wipe_report: report.clone(),
            ledger_entry,
            filename,
            verification_url,
            qr_data,
        })
    }

    /// Report of the finished job `wipe_id` and its device from the
    /// inventory.
    pub async fn job_inputs(&self, wipe_id: JobId) -> Result<(WipeReport, DeviceInfo)> {
        let report = self.registry.report(wipe_id)?;
        if !report.status.is_terminal() {
            return Err(WipewerkError::Validation(format!(
                "wipe operation {wipe_id} is still {}",
                report.status
            )));
        }
        let device = self.device_for(&report.device).await;
        Ok((report, device))
    }

    /// Reports and devices for a bulk certificate.  Unknown ids are skipped.
    #[instrument(skip_all, fields(count = wipe_ids.len()))]
    pub async fn bulk_inputs(&self, wipe_ids: &[JobId]) -> Result<Vec<(WipeReport, DeviceInfo)>> {
        if wipe_ids.is_empty() {
            return Err(WipewerkError::Validation(
                "At least one wipe ID is required".into(),
            ));
        }

        let mut entries: Vec<(WipeReport, DeviceInfo)> = Vec::with_capacity(wipe_ids.len());
        for id in wipe_ids {
            match self.registry.report(*id) {
                Ok(report) => {
                    let device = self.device_for(&report.device).await;
                    entries.push((report, device));
                }
                Err(e) => warn!(wipe_id = %id, error = %e, "skipping wipe in bulk certificate"),
            }
        }
        if entries.is_empty() {
            return Err(WipewerkError::NotFound("No valid wipe reports found".into()));
        }
        Ok(entries)
    }

    /// Write one document covering every entry.
    pub fn write_bulk(
        &self,
        entries: &[(WipeReport, DeviceInfo)],
        job_id: Option<String>,
    ) -> Result<BulkCertificateOutput> {
        let issue_time = Utc::now();
        let job_id = job_id
            .map(|j| j.trim().to_string())
            .filter(|j| !j.is_empty())
            .unwrap_or_else(|| format!("BULK_{}", file_stamp(issue_time)));

        let doc = bulk_certificate(&BulkCertificate {
            job_id: &job_id,
            issue_time,
            entries: entries.iter().map(|(r, d)| (r, d)).collect(),
        });
        let filename = format!(
            "cert_bulk_{}_{}.pdf",
            filename_component(&job_id),
            file_stamp(issue_time)
        );
        self.writer
            .write_to_file(&doc, self.settings.certificates_dir.join(&filename))?;

        info!(job_id, filename, devices = entries.len(), "bulk certificate issued");
        Ok(BulkCertificateOutput {
            filename,
            job_id,
            device_count: entries.len(),
        })
    }

    async fn device_for(&self, path: &str) -> DeviceInfo {
        self.inventory
            .find(path)
            .await
            .unwrap_or_else(|| DeviceInfo::unknown(path))
    }

    // -- Verification -----------------------------------------------------------

    /// Check the most recent ledger record matching `filter`.
    ///
    /// Fails only when no filter field is given.  An unreadable ledger is
    /// reported as an `ERROR` verification, not as a failure.
    #[instrument(skip(self))]
    pub fn verify(&self, filter: &RecordFilter) -> Result<Verification> {
        if filter.is_empty() {
            return Err(WipewerkError::Validation(
                "At least one verification parameter required \
                 (certificate_id, serial_number, or certificate_hash)"
                    .into(),
            ));
        }

        let snapshot = match self.ledger.snapshot() {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "ledger unreadable during verification");
                return Ok(Verification::error(e));
            }
        };

        let verification = match snapshot.find(filter).last() {
            Some(block) => Verification::matched(block, snapshot.verify_one(block)),
            None => Verification::not_found(),
        };
        info!(status = ?verification.verification_status, "certificate verified");
        Ok(verification)
    }

    /// Every ledger record for `serial`, oldest first.
    pub fn search_by_serial(&self, serial: &str) -> Result<Vec<SerialRecord>> {
        self.ledger.search_by_serial(serial)
    }

    // -- Documents --------------------------------------------------------------

    /// Path of a generated document.
    ///
    /// Names containing path separators or `..` are treated as absent.
    pub fn certificate_path(&self, filename: &str) -> Result<PathBuf> {
        let bad = filename.is_empty()
            || filename.contains('/')
            || filename.contains('\\')
            || filename.contains("..");
        let path = self.settings.certificates_dir.join(filename);
        if bad || !path.is_file() {
            return Err(WipewerkError::NotFound(format!("certificate {filename}")));
        }
        Ok(path)
    }
}

fn erasure_record(
    cert_id: &str,
    cert_hash: &str,
    device: &DeviceInfo,
    report: &WipeReport,
) -> ErasureRecord {
    ErasureRecord {
        certificate_id: cert_id.to_string(),
        certificate_hash: cert_hash.to_string(),
        device_serial: device.serial.clone(),
        device_model: device.model.clone(),
        device_type: device.device_type.to_string(),
        wipe_method: report.method.to_string(),
        wipe_status: report.status.to_string(),
        wipe_start: report.start_time.to_rfc3339(),
        wipe_end: report
            .end_time
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "N/A".into()),
        simulated: report.simulated,
    }
}
