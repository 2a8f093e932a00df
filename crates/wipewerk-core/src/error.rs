// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Wipewerk.

use thiserror::Error;

/// Top-level error type for all Wipewerk operations.
#[derive(Debug, Error)]
pub enum WipewerkError {
    // -- Request errors --
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    // -- Erasure errors --
    #[error("erasure failed: {0}")]
    Execution(String),

    #[error("external tool unavailable: {0}")]
    ExternalTool(String),

    // -- Ledger / certificate errors --
    #[error("ledger integrity error: {0}")]
    Integrity(String),

    #[error("certificate document error: {0}")]
    Document(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, WipewerkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_message_is_passed_through() {
        let err = WipewerkError::Conflict("Device is already being wiped".into());
        assert_eq!(err.to_string(), "Device is already being wiped");
    }
}
