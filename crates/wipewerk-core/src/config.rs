// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Name of the config file inside the data directory.
pub const CONFIG_FILE: &str = "config.json";

/// Persistent application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Listen address for the HTTP API.
    pub bind_addr: String,
    /// Ledger file name, relative to the data directory.
    pub ledger_file: String,
    /// Directory for generated certificate documents.
    pub certificates_dir: String,
    /// Directory for ledger exports.
    pub exports_dir: String,
    /// Pause between lines of the simulated erasure script.
    pub step_delay_ms: u64,
    /// External device inventory tool.
    pub inventory_program: String,
    pub inventory_timeout_secs: u64,
    /// External erasure tool.
    pub erasure_program: String,
    /// Prefix the erasure tool with `sudo`.
    pub use_sudo: bool,
    /// Base URL printed on certificates for third-party verification.
    pub verify_base_url: String,
}

impl AppConfig {
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    pub fn inventory_timeout(&self) -> Duration {
        Duration::from_secs(self.inventory_timeout_secs)
    }

    /// Load `config.json` from `data_dir`, or `None` if absent or unreadable.
    pub fn load(data_dir: &Path) -> Option<Self> {
        let data = std::fs::read_to_string(data_dir.join(CONFIG_FILE)).ok()?;
        serde_json::from_str(&data).ok()
    }

    /// Load `config.json`, writing the defaults out first if there is none.
    ///
    /// A file that exists but does not parse is left alone and the defaults
    /// are used in its place.
    pub fn load_or_create(data_dir: &Path) -> crate::error::Result<Self> {
        if data_dir.join(CONFIG_FILE).exists() {
            return Ok(Self::load(data_dir).unwrap_or_default());
        }
        std::fs::create_dir_all(data_dir)?;
        let config = Self::default();
        config.save(data_dir)?;
        Ok(config)
    }

    /// Persist as pretty-printed `config.json` in `data_dir`.
    pub fn save(&self, data_dir: &Path) -> crate::error::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(data_dir.join(CONFIG_FILE), json)?;
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".into(),
            ledger_file: "ledger.json".into(),
            certificates_dir: "certificates".into(),
            exports_dir: "exports".into(),
            step_delay_ms: 500,
            inventory_program: "lsblk".into(),
            inventory_timeout_secs: 5,
            erasure_program: "nwipe".into(),
            use_sudo: true,
            verify_base_url: "https://verify.erash.local/cert".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let cfg: AppConfig = serde_json::from_str(r#"{"step_delay_ms": 0}"#).unwrap();
        assert_eq!(cfg.step_delay(), Duration::ZERO);
        assert_eq!(cfg.erasure_program, "nwipe");
        assert_eq!(cfg.bind_addr, "0.0.0.0:5000");
    }

    #[test]
    fn missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AppConfig::load(dir.path()).is_none());
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = AppConfig {
            use_sudo: false,
            erasure_program: "/usr/local/bin/nwipe".into(),
            ..Default::default()
        };
        cfg.save(dir.path()).unwrap();

        let loaded = AppConfig::load(dir.path()).unwrap();
        assert!(!loaded.use_sudo);
        assert_eq!(loaded.erasure_program, "/usr/local/bin/nwipe");
    }

    #[test]
    fn first_start_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        let cfg = AppConfig::load_or_create(&data).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:5000");
        assert!(data.join(CONFIG_FILE).is_file());
        assert_eq!(AppConfig::load(&data).unwrap().erasure_program, "nwipe");
    }

    #[test]
    fn malformed_config_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "{ half written").unwrap();
        let cfg = AppConfig::load_or_create(dir.path()).unwrap();
        assert_eq!(cfg.step_delay_ms, 500);
        assert_eq!(
            std::fs::read_to_string(dir.path().join(CONFIG_FILE)).unwrap(),
            "{ half written"
        );
    }
}
