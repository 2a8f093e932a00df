// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Wipewerk erasure coordinator.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::WipewerkError;

/// Unique identifier for a wipe job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = WipewerkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| WipewerkError::NotFound(format!("wipe operation {s}")))
    }
}

/// Lifecycle states of a wipe job.
///
/// `Completed` and `Failed` are terminal: once reached, nothing moves the job
/// out of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Registered, worker not yet running.
    Starting,
    /// Worker is producing log lines.
    Running,
    /// Erasure finished successfully.
    Completed,
    /// Erasure failed; the job's error field says why.
    Failed,
}

impl JobStatus {
    /// A job in this state blocks new jobs on the same device.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Starting | Self::Running)
    }

    pub fn is_terminal(self) -> bool {
        !self.is_active()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supported erasure methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WipeMethod {
    /// DoD 5220.22-M, 3 passes.
    #[default]
    DodShort,
    /// DoD 5220.22-M, 7 passes.
    Dod,
    /// Gutmann, 35 passes.
    Gutmann,
    /// One pass of PRNG data.
    Random,
    /// One pass of zeros.
    Zero,
}

impl WipeMethod {
    pub const ALL: [WipeMethod; 5] = [
        Self::DodShort,
        Self::Dod,
        Self::Gutmann,
        Self::Random,
        Self::Zero,
    ];

    /// Keyword used in requests, reports and ledger records.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DodShort => "dodshort",
            Self::Dod => "dod",
            Self::Gutmann => "gutmann",
            Self::Random => "random",
            Self::Zero => "zero",
        }
    }

    /// Method identifier understood by the external erasure tool (nwipe).
    pub fn tool_method(self) -> &'static str {
        match self {
            Self::DodShort => "dod522022m",
            Self::Dod => "dodshort",
            Self::Gutmann => "gutmann",
            Self::Random => "prng",
            Self::Zero => "zero",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::DodShort => "DoD 5220.22-M (3 passes)",
            Self::Dod => "DoD 5220.22-M (7 passes)",
            Self::Gutmann => "Gutmann (35 passes)",
            Self::Random => "Random data (1 pass)",
            Self::Zero => "Zero fill (1 pass)",
        }
    }
}

impl std::fmt::Display for WipeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WipeMethod {
    type Err = WipewerkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| WipewerkError::Validation(format!("unknown wipe method: {s}")))
    }
}

/// One timestamped line of a job's log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

/// Live state of one wipe job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WipeJob {
    pub id: JobId,
    pub device_path: String,
    pub method: WipeMethod,
    pub simulated: bool,
    pub verification_requested: bool,
    pub status: JobStatus,
    /// Percent complete, 0–100.
    pub progress: u8,
    pub logs: Vec<LogEntry>,
    pub start_time: DateTime<Utc>,
    /// Set only at the terminal transition.
    pub end_time: Option<DateTime<Utc>>,
    /// Set only on failure.
    pub error: Option<String>,
}

impl WipeJob {
    pub fn new(
        device_path: String,
        method: WipeMethod,
        verification_requested: bool,
        simulated: bool,
    ) -> Self {
        Self {
            id: JobId::new(),
            device_path,
            method,
            simulated,
            verification_requested,
            status: JobStatus::Starting,
            progress: 0,
            logs: Vec::new(),
            start_time: Utc::now(),
            end_time: None,
            error: None,
        }
    }
}

/// Coarse storage class of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceClass {
    #[serde(rename = "HDD")]
    Hdd,
    #[serde(rename = "SSD")]
    Ssd,
    #[serde(rename = "USB")]
    Usb,
    Virtual,
    Unknown,
}

impl DeviceClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hdd => "HDD",
            Self::Ssd => "SSD",
            Self::Usb => "USB",
            Self::Virtual => "Virtual",
            Self::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceClass {
    type Err = WipewerkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hdd" => Ok(Self::Hdd),
            "ssd" => Ok(Self::Ssd),
            "usb" => Ok(Self::Usb),
            "virtual" => Ok(Self::Virtual),
            "unknown" => Ok(Self::Unknown),
            _ => Err(WipewerkError::Validation(format!("unknown device type: {s}"))),
        }
    }
}

/// A partition (or LVM volume) found on a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    pub name: String,
    pub size: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub mountpoint: Option<String>,
    pub fstype: Option<String>,
    pub label: Option<String>,
}

/// Descriptor of a block device as reported by the inventory collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Device path, e.g. `/dev/sda`.
    pub name: String,
    pub model: String,
    pub serial: String,
    pub size: String,
    #[serde(rename = "type")]
    pub device_type: DeviceClass,
    pub rotational: bool,
    pub transport: String,
    pub partitions: Vec<Partition>,
    pub partition_count: usize,
}

impl DeviceInfo {
    /// Placeholder descriptor for a device the inventory does not know.
    pub fn unknown(path: impl Into<String>) -> Self {
        Self {
            name: path.into(),
            model: "Unknown".into(),
            serial: "UNKNOWN".into(),
            size: "Unknown".into(),
            device_type: DeviceClass::Unknown,
            rotational: false,
            transport: "Unknown".into(),
            partitions: Vec::new(),
            partition_count: 0,
        }
    }
}

/// Summary of a wipe job, derived from its live state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WipeReport {
    pub wipe_id: JobId,
    pub device: String,
    pub method: WipeMethod,
    pub status: JobStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    /// `H:MM:SS`, or `In progress` while the job has no end time.
    pub duration: String,
    pub simulated: bool,
    /// `Passed` for completed jobs, `Failed` otherwise.
    pub verification: String,
    /// Last significant log lines; lossy, not used for integrity.
    pub log_summary: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_activity() {
        assert!(JobStatus::Starting.is_active());
        assert!(JobStatus::Running.is_active());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&JobStatus::Completed).unwrap();
        assert_eq!(json, "\"completed\"");
    }

    #[test]
    fn method_parses_case_insensitively() {
        assert_eq!("DodShort".parse::<WipeMethod>().unwrap(), WipeMethod::DodShort);
        assert_eq!("zero".parse::<WipeMethod>().unwrap(), WipeMethod::Zero);
        assert!(matches!(
            "shred".parse::<WipeMethod>(),
            Err(WipewerkError::Validation(_))
        ));
    }

    #[test]
    fn method_maps_to_tool_identifiers() {
        assert_eq!(WipeMethod::DodShort.tool_method(), "dod522022m");
        assert_eq!(WipeMethod::Dod.tool_method(), "dodshort");
        assert_eq!(WipeMethod::Random.tool_method(), "prng");
    }

    #[test]
    fn device_class_round_trips_through_serde_names() {
        let json = serde_json::to_string(&DeviceClass::Ssd).unwrap();
        assert_eq!(json, "\"SSD\"");
        assert_eq!("virtual".parse::<DeviceClass>().unwrap(), DeviceClass::Virtual);
    }

    #[test]
    fn malformed_job_id_is_not_found() {
        assert!(matches!(
            "wipe_123".parse::<JobId>(),
            Err(WipewerkError::NotFound(_))
        ));
    }

    #[test]
    fn new_job_starts_empty() {
        let job = WipeJob::new("/dev/sdx".into(), WipeMethod::Zero, false, true);
        assert_eq!(job.status, JobStatus::Starting);
        assert_eq!(job.progress, 0);
        assert!(job.logs.is_empty());
        assert!(job.end_time.is_none());
    }
}
