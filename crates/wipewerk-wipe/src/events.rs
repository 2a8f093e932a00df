// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Job event stream.
//
// Workers publish ordered events for their job.  The registry always
// receives them first, synchronously, so a poller never sees a broadcast
// subscriber run ahead of the stored state.  Any number of optional
// subscribers may follow along through `subscribe()`.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;

use wipewerk_core::types::{JobId, JobStatus};

use crate::registry::JobRegistry;

/// Buffered updates per subscriber before the slowest one starts lagging.
const DEFAULT_CAPACITY: usize = 256;

/// One step of a job's progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "value", rename_all = "snake_case")]
pub enum JobEvent {
    Status(JobStatus),
    Progress(u8),
    Log(String),
    Completed,
    Failed(String),
}

/// An event tagged with the job it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobUpdate {
    pub job_id: JobId,
    #[serde(flatten)]
    pub event: JobEvent,
}

/// Fan-out from workers to the registry and optional subscribers.
#[derive(Clone)]
pub struct EventBus {
    registry: JobRegistry,
    sender: broadcast::Sender<JobUpdate>,
}

impl EventBus {
    pub fn new(registry: JobRegistry) -> Self {
        Self::with_capacity(registry, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(registry: JobRegistry, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { registry, sender }
    }

    /// Record `event` for `job_id` and forward it to subscribers.
    ///
    /// Events the registry rejects (unknown or finished job) are not
    /// forwarded.
    pub fn publish(&self, job_id: JobId, event: JobEvent) {
        if !self.registry.apply(job_id, &event) {
            return;
        }
        trace!(job_id = %job_id, ?event, "job event");
        // No receivers is the normal case.
        let _ = self.sender.send(JobUpdate { job_id, event });
    }

    /// A receiver for every update published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<JobUpdate> {
        self.sender.subscribe()
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }
}
