// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Wipe executor — launches one background worker per job.
//
// A worker moves its job `starting -> running -> completed | failed`.  It
// runs either a scripted simulation or the external erasure tool, and
// publishes every log line and progress change through the event bus.  A
// failing or panicking worker only ever fails its own job.

use std::process::Stdio;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{error, info, instrument, warn};

use wipewerk_core::config::AppConfig;
use wipewerk_core::error::{Result, WipewerkError};
use wipewerk_core::types::{JobId, JobStatus, WipeJob, WipeMethod};

use crate::events::{EventBus, JobEvent, JobUpdate};
use crate::registry::JobRegistry;

static PERCENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)%").expect("constant regex pattern is valid"));

/// Settings the executor reads from the application config.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Pause before each line of the simulated script.
    pub step_delay: Duration,
    pub erasure_program: String,
    pub use_sudo: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for ExecutorConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            step_delay: config.step_delay(),
            erasure_program: config.erasure_program.clone(),
            use_sudo: config.use_sudo,
        }
    }
}

/// Starts wipe jobs and owns the event bus that feeds the registry.
#[derive(Clone)]
pub struct WipeExecutor {
    bus: EventBus,
    config: Arc<ExecutorConfig>,
}

impl WipeExecutor {
    pub fn new(registry: JobRegistry, config: ExecutorConfig) -> Self {
        Self {
            bus: EventBus::new(registry),
            config: Arc::new(config),
        }
    }

    pub fn registry(&self) -> &JobRegistry {
        self.bus.registry()
    }

    /// Receiver for every job event published from now on.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<JobUpdate> {
        self.bus.subscribe()
    }

    /// Register a job for `device_path` and start its worker.
    ///
    /// Returns as soon as the job is registered.  Fails with `Conflict` if the
    /// device already has an active job.  Must be called from within a Tokio
    /// runtime.
    #[instrument(skip(self))]
    pub fn start(
        &self,
        device_path: &str,
        method: WipeMethod,
        verification: bool,
        simulated: bool,
    ) -> Result<JobId> {
        let device_path = device_path.trim();
        if device_path.is_empty() {
            return Err(WipewerkError::Validation("Device path required".into()));
        }

        let job = WipeJob::new(device_path.to_string(), method, verification, simulated);
        let id = self.registry().try_insert(job.clone())?;

        tokio::spawn(run_job(self.bus.clone(), Arc::clone(&self.config), job));
        info!(job_id = %id, device = device_path, simulated, "wipe started");
        Ok(id)
    }
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

/// Supervise one job: run it in its own task and turn every outcome,
/// including a panic, into a terminal event.
async fn run_job(bus: EventBus, config: Arc<ExecutorConfig>, job: WipeJob) {
    let id = job.id;
    let worker = tokio::spawn(execute(bus.clone(), config, job));

    match worker.await {
        Ok(Ok(())) => {
            info!(job_id = %id, "wipe completed");
            bus.publish(id, JobEvent::Completed);
        }
        Ok(Err(e)) => {
            warn!(job_id = %id, error = %e, "wipe failed");
            bus.publish(id, JobEvent::Failed(e.to_string()));
        }
        Err(join) => {
            error!(job_id = %id, error = %join, "wipe worker aborted");
            bus.publish(id, JobEvent::Failed(format!("worker aborted: {join}")));
        }
    }
}

async fn execute(bus: EventBus, config: Arc<ExecutorConfig>, job: WipeJob) -> Result<()> {
    bus.publish(job.id, JobEvent::Status(JobStatus::Running));
    if job.simulated {
        run_simulated(&bus, &config, &job).await
    } else {
        run_real(&bus, &config, &job).await
    }
}

/// The fixed demonstration script for a simulated wipe.
pub fn simulated_script(device_path: &str, method: WipeMethod) -> Vec<String> {
    vec![
        "Initializing wipe operation...".into(),
        format!("Target device: {device_path}"),
        format!("Method: {method}"),
        "Starting erasure process...".into(),
        "Pass 1/3: Writing random data...".into(),
        "Progress: 10%".into(),
        "Progress: 25%".into(),
        "Progress: 40%".into(),
        "Pass 2/3: Writing zeros...".into(),
        "Progress: 50%".into(),
        "Progress: 65%".into(),
        "Progress: 75%".into(),
        "Pass 3/3: Verification...".into(),
        "Progress: 85%".into(),
        "Progress: 95%".into(),
        "Progress: 100%".into(),
        "Wipe completed successfully!".into(),
        format!("Device {device_path} has been securely erased."),
    ]
}

async fn run_simulated(bus: &EventBus, config: &ExecutorConfig, job: &WipeJob) -> Result<()> {
    for line in simulated_script(&job.device_path, job.method) {
        if !config.step_delay.is_zero() {
            tokio::time::sleep(config.step_delay).await;
        }
        publish_line(bus, job.id, line);
    }
    Ok(())
}

/// Build the erasure tool's argument vector, program first.
pub fn erasure_command(config: &ExecutorConfig, job: &WipeJob) -> Vec<String> {
    let verify = if job.verification_requested { "last" } else { "off" };
    let mut argv = Vec::with_capacity(9);
    if config.use_sudo {
        argv.push("sudo".to_string());
    }
    argv.extend([
        config.erasure_program.clone(),
        "--autonuke".into(),
        "--method".into(),
        job.method.tool_method().into(),
        "--verify".into(),
        verify.into(),
        "--nogui".into(),
        job.device_path.clone(),
    ]);
    argv
}

#[instrument(skip_all, fields(job_id = %job.id, device = %job.device_path))]
async fn run_real(bus: &EventBus, config: &ExecutorConfig, job: &WipeJob) -> Result<()> {
    let argv = erasure_command(config, job);
    bus.publish(job.id, JobEvent::Log(format!("Executing: {}", argv.join(" "))));

    let (program, args) = argv
        .split_first()
        .ok_or_else(|| WipewerkError::ExternalTool("empty erasure command".into()))?;
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| WipewerkError::ExternalTool(format!("{program}: {e}")))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| WipewerkError::ExternalTool("erasure tool stdout unavailable".into()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| WipewerkError::ExternalTool("erasure tool stderr unavailable".into()))?;

    // Progress may arrive on either pipe.
    let mut out = BufReader::new(stdout).lines();
    let mut err = BufReader::new(stderr).lines();
    let (mut out_open, mut err_open) = (true, true);
    while out_open || err_open {
        tokio::select! {
            line = out.next_line(), if out_open => match line? {
                Some(line) => publish_trimmed(bus, job.id, &line),
                None => out_open = false,
            },
            line = err.next_line(), if err_open => match line? {
                Some(line) => publish_trimmed(bus, job.id, &line),
                None => err_open = false,
            },
        }
    }

    let status = child.wait().await?;
    if status.success() {
        Ok(())
    } else {
        Err(WipewerkError::Execution(format!(
            "{} exited with {status}",
            config.erasure_program
        )))
    }
}

fn publish_trimmed(bus: &EventBus, id: JobId, line: &str) {
    let line = line.trim();
    if !line.is_empty() {
        publish_line(bus, id, line.to_string());
    }
}

/// Log `line` and, if it carries a percentage, the progress it reports.
fn publish_line(bus: &EventBus, id: JobId, line: String) {
    let percent = parse_percent(&line);
    bus.publish(id, JobEvent::Log(line));
    if let Some(p) = percent {
        bus.publish(id, JobEvent::Progress(p));
    }
}

/// First `N%` in `line`, clamped to 100.
pub fn parse_percent(line: &str) -> Option<u8> {
    let caps = PERCENT.captures(line)?;
    let value: u64 = caps.get(1)?.as_str().parse().unwrap_or(u64::MAX);
    Some(value.min(100) as u8)
}
