// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Wipewerk — disk erasure coordinator
//
// Entry point. Initialises logging and backend services, then serves the
// HTTP API until Ctrl-C.

use std::process::ExitCode;

use tracing::{error, info, warn};

use wipewerk_server::{AppServices, router};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Wipewerk starting");
    warn!("this service can permanently erase disks; keep jobs simulated unless the target is disposable");

    match serve().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "server stopped");
            ExitCode::FAILURE
        }
    }
}

async fn serve() -> Result<(), Box<dyn std::error::Error>> {
    let svc = AppServices::init()?;
    let addr = svc.config().bind_addr.clone();

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, data_dir = %svc.data_dir().display(), "listening");

    axum::serve(listener, router(svc))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Ctrl-C received, shutting down");
}
