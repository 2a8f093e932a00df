// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Wipewerk Wipe — in-memory job registry, the background erasure executor,
// and the block-device inventory.  Each job is driven by exactly one worker
// task; pollers read snapshots out of the shared registry.

pub mod events;
pub mod executor;
pub mod inventory;
pub mod registry;
pub mod report;

pub use events::{EventBus, JobEvent, JobUpdate};
pub use executor::WipeExecutor;
pub use inventory::{DeviceInventory, FixedInventory, InventoryProvider, LsblkInventory};
pub use registry::{JobRegistry, LogPage};
