// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Wipewerk Server — HTTP front end over the wipe, ledger and certification
// crates.

pub mod api;
pub mod services;

pub use api::router;
pub use services::app_services::AppServices;
