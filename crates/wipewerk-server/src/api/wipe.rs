// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Device listing and wipe job endpoints.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::warn;

use wipewerk_core::WipewerkError;
use wipewerk_core::types::{DeviceClass, JobId, WipeMethod};

use super::error::ApiResult;
use crate::services::app_services::AppServices;

#[derive(Debug, Deserialize)]
pub struct DeviceQuery {
    #[serde(rename = "type")]
    device_type: Option<String>,
    partitions: Option<String>,
}

/// `GET /api/devices?type=&partitions=`
pub async fn list_devices(
    State(svc): State<AppServices>,
    query: Result<Query<DeviceQuery>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(query) = query?;
    let class = match query.device_type.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => Some(t.parse::<DeviceClass>()?),
        _ => None,
    };
    let include_partitions = query
        .partitions
        .as_deref()
        .is_none_or(|p| p.trim().eq_ignore_ascii_case("true"));

    let devices = svc.inventory().list(class, include_partitions).await;
    let total_partitions: usize = devices.iter().map(|d| d.partition_count).sum();
    Ok(Json(json!({
        "success": true,
        "count": devices.len(),
        "total_partitions": total_partitions,
        "devices": devices,
    })))
}

fn default_method() -> String {
    WipeMethod::DodShort.as_str().to_string()
}

fn default_simulated() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct StartWipeRequest {
    #[serde(default)]
    device_path: Option<String>,
    #[serde(default = "default_method")]
    method: String,
    #[serde(default)]
    verification: bool,
    #[serde(default = "default_simulated")]
    simulated: bool,
    #[serde(default)]
    confirmation: bool,
}

/// `POST /api/wipe/start`
pub async fn start_wipe(
    State(svc): State<AppServices>,
    body: Result<Json<StartWipeRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(req) = body?;

    let device_path = req
        .device_path
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| WipewerkError::Validation("Device path is required".into()))?;
    if !req.confirmation {
        return Err(WipewerkError::Validation(
            "Confirmation required. This operation is IRREVERSIBLE!".into(),
        )
        .into());
    }
    let method: WipeMethod = req.method.parse()?;
    if !req.simulated {
        warn!(device = device_path, %method, "real erasure requested");
    }

    let id = svc
        .executor()
        .start(device_path, method, req.verification, req.simulated)?;
    Ok(Json(json!({
        "success": true,
        "wipe_id": id,
        "status": "started",
    })))
}

/// `GET /api/wipe/status/{id}`
pub async fn wipe_status(
    State(svc): State<AppServices>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let job = svc.registry().status(id.parse::<JobId>()?)?;
    Ok(Json(json!({ "success": true, "status": job })))
}

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    #[serde(default)]
    since: usize,
}

/// `GET /api/wipe/logs/{id}?since=N`
pub async fn wipe_logs(
    State(svc): State<AppServices>,
    Path(id): Path<String>,
    query: Result<Query<LogsQuery>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(query) = query?;
    let page = svc.registry().logs(id.parse::<JobId>()?, query.since)?;
    Ok(Json(json!({
        "success": true,
        "logs": page.logs,
        "total_count": page.total_count,
        "status": page.status,
        "progress": page.progress,
    })))
}

/// `GET /api/wipe/report/{id}`
pub async fn wipe_report(
    State(svc): State<AppServices>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let report = svc.registry().report(id.parse::<JobId>()?)?;
    Ok(Json(json!({ "success": true, "report": report })))
}
