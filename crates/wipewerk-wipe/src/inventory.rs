// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Block device inventory.
//
// Two providers sit behind `InventoryProvider`: a live one that asks `lsblk`
// (bounded by a timeout) and a fixed demonstration set.  `DeviceInventory`
// picks the live provider when its tool is installed and falls back to the
// fixed set when it is missing or misbehaves.  Listing devices never fails.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use wipewerk_core::config::AppConfig;
use wipewerk_core::error::{Result, WipewerkError};
use wipewerk_core::types::{DeviceClass, DeviceInfo, Partition};

/// Columns requested from `lsblk`.
const LSBLK_COLUMNS: &str = "NAME,SIZE,TYPE,MODEL,SERIAL,ROTA,TRAN,MOUNTPOINT,FSTYPE,LABEL";

/// A source of block device descriptors.
#[async_trait]
pub trait InventoryProvider: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Whether this provider can be asked at all right now.
    fn is_available(&self) -> bool;

    /// Every whole disk, with its partitions.
    async fn devices(&self) -> Result<Vec<DeviceInfo>>;
}

// ---------------------------------------------------------------------------
// lsblk
// ---------------------------------------------------------------------------

/// Live inventory from `lsblk -J`.
#[derive(Debug, Clone)]
pub struct LsblkInventory {
    program: String,
    timeout: Duration,
}

impl LsblkInventory {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }
}

#[async_trait]
impl InventoryProvider for LsblkInventory {
    fn name(&self) -> &'static str {
        "lsblk"
    }

    fn is_available(&self) -> bool {
        program_on_path(&self.program)
    }

    #[instrument(skip(self), fields(program = %self.program))]
    async fn devices(&self) -> Result<Vec<DeviceInfo>> {
        let run = Command::new(&self.program)
            .args(["-J", "-o", LSBLK_COLUMNS])
            .kill_on_drop(true)
            .output();
        let output = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| {
                WipewerkError::ExternalTool(format!(
                    "{} timed out after {:?}",
                    self.program, self.timeout
                ))
            })?
            .map_err(|e| WipewerkError::ExternalTool(format!("{}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(WipewerkError::ExternalTool(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let devices = parse_lsblk(&output.stdout)?;
        debug!(count = devices.len(), "devices listed");
        Ok(devices)
    }
}

#[derive(Debug, Deserialize)]
struct LsblkOutput {
    #[serde(default)]
    blockdevices: Vec<LsblkDevice>,
}

#[derive(Debug, Deserialize)]
struct LsblkDevice {
    name: String,
    #[serde(default)]
    size: Option<Value>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    serial: Option<String>,
    /// `"0"`/`"1"` from older util-linux, `false`/`true` from newer.
    #[serde(default)]
    rota: Option<Value>,
    #[serde(default)]
    tran: Option<String>,
    #[serde(default)]
    mountpoint: Option<String>,
    #[serde(default)]
    fstype: Option<String>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    children: Vec<LsblkDevice>,
}

impl LsblkDevice {
    fn rotational(&self) -> Option<bool> {
        match self.rota.as_ref()? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.trim() {
                "1" => Some(true),
                "0" => Some(false),
                _ => None,
            },
            Value::Number(n) => n.as_u64().map(|n| n != 0),
            _ => None,
        }
    }

    fn size(&self) -> String {
        match &self.size {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => "Unknown".into(),
        }
    }
}

/// Parse `lsblk -J` output into whole-disk descriptors.
pub fn parse_lsblk(json: &[u8]) -> Result<Vec<DeviceInfo>> {
    let output: LsblkOutput = serde_json::from_slice(json)
        .map_err(|e| WipewerkError::ExternalTool(format!("unparseable lsblk output: {e}")))?;

    Ok(output
        .blockdevices
        .iter()
        .filter(|d| d.kind.as_deref() == Some("disk"))
        .map(|d| {
            let partitions: Vec<Partition> = d
                .children
                .iter()
                .filter(|c| matches!(c.kind.as_deref(), Some("part" | "lvm")))
                .map(|c| Partition {
                    name: format!("/dev/{}", c.name),
                    size: c.size(),
                    kind: c.kind.clone().unwrap_or_else(|| "part".into()),
                    mountpoint: c.mountpoint.clone(),
                    fstype: Some(c.fstype.clone().unwrap_or_else(|| "Unknown".into())),
                    label: Some(c.label.clone().unwrap_or_else(|| "No Label".into())),
                })
                .collect();

            DeviceInfo {
                name: format!("/dev/{}", d.name),
                model: trimmed_or(&d.model, "Unknown"),
                serial: trimmed_or(&d.serial, "N/A"),
                size: d.size(),
                device_type: classify(d),
                rotational: d.rotational() == Some(true),
                transport: d.tran.clone().unwrap_or_else(|| "Unknown".into()),
                partition_count: partitions.len(),
                partitions,
            }
        })
        .collect())
}

fn trimmed_or(value: &Option<String>, fallback: &str) -> String {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

/// Classify a disk: virtual first, then USB transport, then the rotation
/// flag, then model keywords.
fn classify(device: &LsblkDevice) -> DeviceClass {
    let name = device.name.to_lowercase();
    let model = device.model.as_deref().unwrap_or_default().to_lowercase();
    let tran = device.tran.as_deref().unwrap_or_default().to_lowercase();

    if name.contains("loop") || ["virtual", "vbox", "vmware"].iter().any(|k| model.contains(k)) {
        return DeviceClass::Virtual;
    }
    if tran == "usb" {
        return DeviceClass::Usb;
    }
    match device.rotational() {
        Some(false) => return DeviceClass::Ssd,
        Some(true) => return DeviceClass::Hdd,
        None => {}
    }
    if model.contains("ssd") {
        DeviceClass::Ssd
    } else if model.contains("usb") || model.contains("flash") {
        DeviceClass::Usb
    } else {
        DeviceClass::Hdd
    }
}

/// Whether `program` resolves to a file, either directly or via `$PATH`.
fn program_on_path(program: &str) -> bool {
    if program.contains(std::path::MAIN_SEPARATOR) {
        return Path::new(program).is_file();
    }
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
        .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Fixed set
// ---------------------------------------------------------------------------

/// Four demonstration devices, one of each class.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedInventory;

#[async_trait]
impl InventoryProvider for FixedInventory {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn devices(&self) -> Result<Vec<DeviceInfo>> {
        Ok(fixed_devices())
    }
}

fn part(name: &str, size: &str, mountpoint: Option<&str>, fstype: &str, label: &str) -> Partition {
    Partition {
        name: name.into(),
        size: size.into(),
        kind: "part".into(),
        mountpoint: mountpoint.map(Into::into),
        fstype: Some(fstype.into()),
        label: Some(label.into()),
    }
}

fn fixed_devices() -> Vec<DeviceInfo> {
    let disk = |name: &str,
                model: &str,
                serial: &str,
                size: &str,
                class: DeviceClass,
                rotational: bool,
                transport: &str,
                partitions: Vec<Partition>| DeviceInfo {
        name: name.into(),
        model: model.into(),
        serial: serial.into(),
        size: size.into(),
        device_type: class,
        rotational,
        transport: transport.into(),
        partition_count: partitions.len(),
        partitions,
    };

    vec![
        disk(
            "/dev/sda",
            "Samsung SSD 860 EVO",
            "S3Z9NB0M123456",
            "500G",
            DeviceClass::Ssd,
            false,
            "sata",
            vec![
                part("/dev/sda1", "500M", Some("/boot/efi"), "vfat", "EFI"),
                part("/dev/sda2", "499.5G", Some("/"), "ext4", "root"),
            ],
        ),
        disk(
            "/dev/sdb",
            "WDC WD10EZEX",
            "WD-WCC123456789",
            "1T",
            DeviceClass::Hdd,
            true,
            "sata",
            vec![part("/dev/sdb1", "1T", Some("/data"), "ext4", "DATA")],
        ),
        disk(
            "/dev/sdc",
            "SanDisk Ultra USB",
            "SD3210987654321",
            "32G",
            DeviceClass::Usb,
            false,
            "usb",
            vec![part("/dev/sdc1", "32G", None, "exfat", "USB_DRIVE")],
        ),
        disk(
            "/dev/vda",
            "VirtIO Disk",
            "VIRT-DEMO-001",
            "10G",
            DeviceClass::Virtual,
            false,
            "virtio",
            vec![part("/dev/vda1", "10G", None, "ext4", "VIRTUAL")],
        ),
    ]
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Device listing with automatic fallback.
#[derive(Clone)]
pub struct DeviceInventory {
    live: Arc<dyn InventoryProvider>,
    fallback: Arc<dyn InventoryProvider>,
}

impl DeviceInventory {
    pub fn new(live: Arc<dyn InventoryProvider>, fallback: Arc<dyn InventoryProvider>) -> Self {
        Self { live, fallback }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Arc::new(LsblkInventory::new(
                config.inventory_program.clone(),
                config.inventory_timeout(),
            )),
            Arc::new(FixedInventory),
        )
    }

    /// List disks, optionally filtered by class.
    ///
    /// With `include_partitions == false` every descriptor comes back with an
    /// empty partition list.
    pub async fn list(
        &self,
        class: Option<DeviceClass>,
        include_partitions: bool,
    ) -> Vec<DeviceInfo> {
        let mut devices = self.all().await;
        if let Some(class) = class {
            devices.retain(|d| d.device_type == class);
        }
        if !include_partitions {
            for device in &mut devices {
                device.partitions.clear();
                device.partition_count = 0;
            }
        }
        devices
    }

    /// Descriptor for the disk at `path`, if the inventory knows it.
    pub async fn find(&self, path: &str) -> Option<DeviceInfo> {
        self.all().await.into_iter().find(|d| d.name == path)
    }

    async fn all(&self) -> Vec<DeviceInfo> {
        if self.live.is_available() {
            match self.live.devices().await {
                Ok(devices) => return devices,
                Err(e) => warn!(
                    provider = self.live.name(),
                    error = %e,
                    "device inventory failed, using {} set",
                    self.fallback.name()
                ),
            }
        } else {
            debug!(
                provider = self.live.name(),
                "inventory tool not installed, using {} set",
                self.fallback.name()
            );
        }
        self.fallback.devices().await.unwrap_or_default()
    }
}
