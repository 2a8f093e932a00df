// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP JSON API.  Every response body carries a `success` flag.

pub mod certificates;
pub mod error;
pub mod ledger;
pub mod wipe;

use axum::Router;
use axum::routing::{get, post};

use crate::services::app_services::AppServices;

/// Build the full router with `svc` as shared state.
pub fn router(svc: AppServices) -> Router {
    Router::new()
        .route("/api/devices", get(wipe::list_devices))
        .route("/api/wipe/start", post(wipe::start_wipe))
        .route("/api/wipe/status/:id", get(wipe::wipe_status))
        .route("/api/wipe/logs/:id", get(wipe::wipe_logs))
        .route("/api/wipe/report/:id", get(wipe::wipe_report))
        .route("/api/certificate/generate", post(certificates::generate))
        .route("/api/certificate/bulk", post(certificates::generate_bulk))
        .route(
            "/api/certificate/download/:filename",
            get(certificates::download),
        )
        .route("/api/verify/certificate", post(certificates::verify))
        .route("/api/verify/serial/:serial", get(certificates::search_serial))
        .route("/api/ledger/stats", get(ledger::stats))
        .route("/api/ledger/export", get(ledger::export))
        .route("/api/system/info", get(ledger::system_info))
        .route("/api/health", get(ledger::health))
        .with_state(svc)
}
