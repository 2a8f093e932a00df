// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Certificate generation, download and verification endpoints.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::{Value, json};

use wipewerk_core::WipewerkError;
use wipewerk_core::types::JobId;
use wipewerk_ledger::RecordFilter;

use super::error::ApiResult;
use crate::services::app_services::AppServices;

fn download_url(filename: &str) -> String {
    format!("/api/certificate/download/{filename}")
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    wipe_id: Option<String>,
    #[serde(default)]
    record_on_blockchain: bool,
}

/// `POST /api/certificate/generate`
pub async fn generate(
    State(svc): State<AppServices>,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(req) = body?;
    let wipe_id = req
        .wipe_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| WipewerkError::Validation("Wipe ID is required".into()))?;

    let (report, device) = svc.coordinator().job_inputs(wipe_id.parse::<JobId>()?).await?;
    let record = req.record_on_blockchain;
    let cert = svc
        .blocking(move |s| s.coordinator().certify(&report, &device, record))
        .await?;

    Ok(Json(json!({
        "success": true,
        "certificate": {
            "filename": cert.filename,
            "id": cert.certificate_id,
            "hash": cert.certificate_hash,
            "download_url": download_url(&cert.filename),
            "verification_url": cert.verification_url,
            "qr_data": cert.qr_data,
        },
        "ledger_entry": cert.ledger_entry,
    })))
}

#[derive(Debug, Deserialize)]
pub struct BulkRequest {
    #[serde(default)]
    wipe_ids: Vec<String>,
    #[serde(default)]
    job_id: Option<String>,
}

/// `POST /api/certificate/bulk`
pub async fn generate_bulk(
    State(svc): State<AppServices>,
    body: Result<Json<BulkRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(req) = body?;
    if req.wipe_ids.is_empty() {
        return Err(WipewerkError::Validation("At least one wipe ID is required".into()).into());
    }
    // Ids that do not even parse cannot name a report; skip them like
    // unknown ones.
    let ids: Vec<JobId> = req
        .wipe_ids
        .iter()
        .filter_map(|id| id.parse().ok())
        .collect();
    if ids.is_empty() {
        return Err(WipewerkError::NotFound("No valid wipe reports found".into()).into());
    }

    let entries = svc.coordinator().bulk_inputs(&ids).await?;
    let job_id = req.job_id;
    let out = svc
        .blocking(move |s| s.coordinator().write_bulk(&entries, job_id))
        .await?;
    Ok(Json(json!({
        "success": true,
        "certificate": {
            "download_url": download_url(&out.filename),
            "filename": out.filename,
            "job_id": out.job_id,
            "device_count": out.device_count,
        },
    })))
}

/// `GET /api/certificate/download/{filename}`
pub async fn download(
    State(svc): State<AppServices>,
    Path(filename): Path<String>,
) -> ApiResult<Response> {
    let name = filename.clone();
    let bytes = svc
        .blocking(move |s| Ok(std::fs::read(s.coordinator().certificate_path(&name)?)?))
        .await?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    #[serde(default)]
    certificate_id: Option<String>,
    #[serde(default)]
    serial_number: Option<String>,
    #[serde(default)]
    certificate_hash: Option<String>,
}

/// `POST /api/verify/certificate`
pub async fn verify(
    State(svc): State<AppServices>,
    body: Result<Json<VerifyRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(req) = body?;
    let filter = RecordFilter {
        certificate_id: req.certificate_id,
        device_serial: req.serial_number,
        certificate_hash: req.certificate_hash,
    };
    let verification = svc
        .blocking(move |s| s.coordinator().verify(&filter))
        .await?;
    Ok(Json(json!({ "success": true, "verification": verification })))
}

/// `GET /api/verify/serial/{serial}`
pub async fn search_serial(
    State(svc): State<AppServices>,
    Path(serial): Path<String>,
) -> ApiResult<Json<Value>> {
    let needle = serial.clone();
    let records = svc
        .blocking(move |s| s.coordinator().search_by_serial(&needle))
        .await?;
    Ok(Json(json!({
        "success": true,
        "serial_number": serial,
        "count": records.len(),
        "records": records,
    })))
}
