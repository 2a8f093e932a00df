// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Wipewerk Cert — turns finished wipe jobs into certificates, optionally
// anchors them in the ledger, and verifies them later.

pub mod certificate;
pub mod coordinator;
pub mod verification;

pub use certificate::{BulkCertificateOutput, Certificate, QrData};
pub use coordinator::{CertificationCoordinator, CoordinatorSettings};
pub use verification::{Verification, VerificationStatus};
