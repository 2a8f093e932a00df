// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory wipe job table.
//
// One mutex guards the whole table.  Every read copies out what it needs and
// every mutation is a single field update, so the lock is never held across
// a job's execution.  Jobs are retained for the life of the process.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use wipewerk_core::error::{Result, WipewerkError};
use wipewerk_core::types::{JobId, JobStatus, LogEntry, WipeJob, WipeReport};

use crate::events::JobEvent;
use crate::report::build_report;

/// Incremental log poll result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogPage {
    /// Entries from the requested index onwards.
    pub logs: Vec<LogEntry>,
    /// Total number of entries so far; pass as `since` on the next poll.
    pub total_count: usize,
    pub status: JobStatus,
    pub progress: u8,
}

/// Shared table of wipe jobs keyed by id.
#[derive(Clone, Default)]
pub struct JobRegistry {
    jobs: Arc<Mutex<HashMap<JobId, WipeJob>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, HashMap<JobId, WipeJob>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert `job` unless its device already has an active job.
    ///
    /// The check and the insert happen under one lock acquisition, so two
    /// concurrent starts for the same device cannot both succeed.
    #[instrument(skip(self, job), fields(job_id = %job.id, device = %job.device_path))]
    pub fn try_insert(&self, job: WipeJob) -> Result<JobId> {
        let mut jobs = self.table();
        let busy = jobs
            .values()
            .any(|j| j.device_path == job.device_path && j.status.is_active());
        if busy {
            return Err(WipewerkError::Conflict("Device is already being wiped".into()));
        }

        let id = job.id;
        jobs.insert(id, job);
        info!(job_id = %id, "wipe job registered");
        Ok(id)
    }

    /// Apply one worker event to the job's record.
    ///
    /// Returns `false` when the job is unknown or already terminal; terminal
    /// jobs are never modified.
    pub fn apply(&self, id: JobId, event: &JobEvent) -> bool {
        let mut jobs = self.table();
        let Some(job) = jobs.get_mut(&id) else {
            return false;
        };
        if job.status.is_terminal() {
            debug!(job_id = %id, ?event, "event after terminal state ignored");
            return false;
        }

        match event {
            JobEvent::Status(status) => {
                job.status = *status;
                if status.is_terminal() {
                    job.end_time = Some(Utc::now());
                }
            }
            JobEvent::Progress(percent) => {
                // Progress never moves backwards and never exceeds 100.
                job.progress = job.progress.max((*percent).min(100));
            }
            JobEvent::Log(message) => job.logs.push(LogEntry {
                timestamp: Utc::now(),
                message: message.clone(),
            }),
            JobEvent::Completed => {
                job.status = JobStatus::Completed;
                job.progress = 100;
                job.end_time = Some(Utc::now());
            }
            JobEvent::Failed(error) => {
                job.status = JobStatus::Failed;
                job.error = Some(error.clone());
                job.end_time = Some(Utc::now());
            }
        }
        true
    }

    /// Snapshot of one job.
    pub fn status(&self, id: JobId) -> Result<WipeJob> {
        self.table()
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    /// Log entries from index `since` onwards plus the current totals.
    ///
    /// A `since` past the end yields an empty page, not an error.
    pub fn logs(&self, id: JobId, since: usize) -> Result<LogPage> {
        let jobs = self.table();
        let job = jobs.get(&id).ok_or_else(|| not_found(id))?;
        Ok(LogPage {
            logs: job.logs.get(since..).unwrap_or_default().to_vec(),
            total_count: job.logs.len(),
            status: job.status,
            progress: job.progress,
        })
    }

    /// Summary of one job.
    pub fn report(&self, id: JobId) -> Result<WipeReport> {
        let jobs = self.table();
        let job = jobs.get(&id).ok_or_else(|| not_found(id))?;
        Ok(build_report(job))
    }

    pub fn len(&self) -> usize {
        self.table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table().is_empty()
    }
}

fn not_found(id: JobId) -> WipewerkError {
    WipewerkError::NotFound(format!("wipe operation {id}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wipewerk_core::types::WipeMethod;

    fn job(device: &str) -> WipeJob {
        WipeJob::new(device.into(), WipeMethod::Zero, false, true)
    }

    #[test]
    fn second_active_job_on_same_device_conflicts() {
        let registry = JobRegistry::new();
        registry.try_insert(job("/dev/sdx")).unwrap();

        let err = registry.try_insert(job("/dev/sdx")).unwrap_err();
        assert!(matches!(err, WipewerkError::Conflict(_)));
        assert_eq!(registry.len(), 1);

        registry.try_insert(job("/dev/sdy")).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn terminal_job_frees_the_device() {
        let registry = JobRegistry::new();
        let id = registry.try_insert(job("/dev/sdx")).unwrap();
        assert!(registry.apply(id, &JobEvent::Failed("boom".into())));

        registry.try_insert(job("/dev/sdx")).unwrap();
    }

    #[test]
    fn progress_is_clamped_and_monotonic() {
        let registry = JobRegistry::new();
        let id = registry.try_insert(job("/dev/sdx")).unwrap();

        registry.apply(id, &JobEvent::Progress(40));
        registry.apply(id, &JobEvent::Progress(25));
        assert_eq!(registry.status(id).unwrap().progress, 40);

        registry.apply(id, &JobEvent::Progress(250));
        assert_eq!(registry.status(id).unwrap().progress, 100);
    }

    #[test]
    fn terminal_states_are_final() {
        let registry = JobRegistry::new();
        let id = registry.try_insert(job("/dev/sdx")).unwrap();
        registry.apply(id, &JobEvent::Completed);

        assert!(!registry.apply(id, &JobEvent::Status(JobStatus::Running)));
        assert!(!registry.apply(id, &JobEvent::Log("late".into())));

        let snapshot = registry.status(id).unwrap();
        assert_eq!(snapshot.status, JobStatus::Completed);
        assert_eq!(snapshot.progress, 100);
        assert!(snapshot.logs.is_empty());
        assert!(snapshot.end_time.is_some());
    }

    #[test]
    fn failure_records_error_and_end_time() {
        let registry = JobRegistry::new();
        let id = registry.try_insert(job("/dev/sdx")).unwrap();
        registry.apply(id, &JobEvent::Status(JobStatus::Running));
        registry.apply(id, &JobEvent::Failed("nwipe exited with 1".into()));

        let snapshot = registry.status(id).unwrap();
        assert_eq!(snapshot.status, JobStatus::Failed);
        assert_eq!(snapshot.error.as_deref(), Some("nwipe exited with 1"));
        assert!(snapshot.end_time.is_some());
    }

    #[test]
    fn log_pages_slice_from_index() {
        let registry = JobRegistry::new();
        let id = registry.try_insert(job("/dev/sdx")).unwrap();
        for line in ["one", "two", "three"] {
            registry.apply(id, &JobEvent::Log(line.into()));
        }

        let page = registry.logs(id, 1).unwrap();
        let messages: Vec<&str> = page.logs.iter().map(|l| l.message.as_str()).collect();
        assert_eq!(messages, vec!["two", "three"]);
        assert_eq!(page.total_count, 3);

        let past_end = registry.logs(id, 10).unwrap();
        assert!(past_end.logs.is_empty());
        assert_eq!(past_end.total_count, 3);
    }

    #[test]
    fn unknown_job_is_not_found() {
        let registry = JobRegistry::new();
        let id = JobId::new();
        assert!(matches!(registry.status(id), Err(WipewerkError::NotFound(_))));
        assert!(matches!(registry.logs(id, 0), Err(WipewerkError::NotFound(_))));
        assert!(matches!(registry.report(id), Err(WipewerkError::NotFound(_))));
        assert!(!registry.apply(id, &JobEvent::Completed));
    }
}
