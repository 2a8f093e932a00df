// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ledger statistics, export, and static system endpoints.

use axum::Json;
use axum::extract::State;
use chrono::Utc;
use serde_json::{Map, Value, json};
use tracing::warn;

use wipewerk_core::types::WipeMethod;
use wipewerk_ledger::snapshot::LEDGER_TYPE;

use super::error::ApiResult;
use crate::services::app_services::AppServices;

/// `GET /api/ledger/stats`
///
/// An unreadable ledger is reported inside `stats` with `chain_valid: false`
/// rather than as a failed request.
pub async fn stats(State(svc): State<AppServices>) -> Json<Value> {
    let stats = match svc.blocking(|s| s.ledger().stats()).await {
        Ok(stats) => json!(stats),
        Err(e) => {
            warn!(error = %e, "ledger statistics unavailable");
            json!({ "error": e.to_string(), "chain_valid": false })
        }
    };
    Json(json!({ "success": true, "stats": stats }))
}

/// `GET /api/ledger/export`
pub async fn export(State(svc): State<AppServices>) -> ApiResult<Json<Value>> {
    let (path, snapshot) = svc
        .blocking(|s| s.ledger().export_to(s.exports_dir()))
        .await?;
    Ok(Json(json!({
        "success": true,
        "exported": true,
        "path": path.display().to_string(),
        "total_blocks": snapshot.len(),
    })))
}

/// `GET /api/system/info`
pub async fn system_info() -> Json<Value> {
    let methods: Map<String, Value> = WipeMethod::ALL
        .into_iter()
        .map(|m| (m.as_str().to_string(), Value::from(m.description())))
        .collect();

    Json(json!({
        "success": true,
        "system": {
            "name": "Wipewerk",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Disk erasure coordinator with a hash-chained certificate ledger",
            "features": [
                "Device type filtering (HDD/SSD/USB/Virtual)",
                "Multiple wipe methods (DoD, Gutmann, Random, Zero)",
                "Incremental log polling",
                "PDF certificate generation",
                "Hash-chained local ledger",
                "Certificate verification",
                "Bulk certificates",
            ],
            "wipe_methods": methods,
            "ledger_type": LEDGER_TYPE,
            "safety_warning": "IRREVERSIBLE ACTION - All data will be permanently destroyed",
        },
    }))
}

/// `GET /api/health`
pub async fn health() -> Json<Value> {
    Json(json!({
        "success": true,
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
