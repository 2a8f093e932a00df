// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Wipe report derivation.

use chrono::TimeDelta;

use wipewerk_core::types::{JobStatus, WipeJob, WipeReport};

/// Number of significant log lines kept in a report.
const SUMMARY_LINES: usize = 10;

/// Lowercase substrings that mark a log line as worth summarising.
const SIGNIFICANT: [&str; 6] = [
    "starting",
    "completed",
    "pass",
    "progress: 100%",
    "error",
    "failed",
];

/// Build the summary of `job` as of now.
pub fn build_report(job: &WipeJob) -> WipeReport {
    let duration = match job.end_time {
        Some(end) => format_duration(end - job.start_time),
        None => "In progress".to_string(),
    };
    let verification = if job.status == JobStatus::Completed {
        "Passed"
    } else {
        "Failed"
    };

    WipeReport {
        wipe_id: job.id,
        device: job.device_path.clone(),
        method: job.method,
        status: job.status,
        start_time: job.start_time,
        end_time: job.end_time,
        duration,
        simulated: job.simulated,
        verification: verification.to_string(),
        log_summary: summarize_logs(job.logs.iter().map(|l| l.message.as_str())),
    }
}

/// `H:MM:SS` with whole seconds, prefixed with `N day(s), ` past 24 hours.
pub fn format_duration(delta: TimeDelta) -> String {
    let total = delta.num_seconds().max(0);
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;

    let clock = format!("{hours}:{minutes:02}:{seconds:02}");
    match days {
        0 => clock,
        1 => format!("1 day, {clock}"),
        n => format!("{n} days, {clock}"),
    }
}

/// The last few significant lines, oldest first.
pub fn summarize_logs<'a>(messages: impl Iterator<Item = &'a str>) -> Vec<String> {
    let significant: Vec<String> = messages
        .filter(|m| {
            let lower = m.to_lowercase();
            SIGNIFICANT.iter().any(|k| lower.contains(k))
        })
        .map(str::to_string)
        .collect();
    let skip = significant.len().saturating_sub(SUMMARY_LINES);
    significant.into_iter().skip(skip).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wipewerk_core::types::{LogEntry, WipeMethod};

    #[test]
    fn duration_formats() {
        assert_eq!(format_duration(TimeDelta::seconds(9)), "0:00:09");
        assert_eq!(format_duration(TimeDelta::seconds(3_725)), "1:02:05");
        assert_eq!(format_duration(TimeDelta::milliseconds(1_999)), "0:00:01");
        assert_eq!(format_duration(TimeDelta::seconds(90_061)), "1 day, 1:01:01");
        assert_eq!(format_duration(TimeDelta::seconds(2 * 86_400)), "2 days, 0:00:00");
    }

    #[test]
    fn summary_keeps_last_ten_significant_lines() {
        let lines: Vec<String> = (0..15).map(|i| format!("Pass {i}")).collect();
        let mut all: Vec<&str> = vec!["noise", "Progress: 40%"];
        all.extend(lines.iter().map(String::as_str));
        all.push("Progress: 100%");

        let summary = summarize_logs(all.into_iter());
        assert_eq!(summary.len(), 10);
        assert_eq!(summary[0], "Pass 6");
        assert_eq!(summary[9], "Progress: 100%");
    }

    #[test]
    fn in_progress_report() {
        let job = WipeJob::new("/dev/sdx".into(), WipeMethod::Gutmann, true, true);
        let report = build_report(&job);
        assert_eq!(report.duration, "In progress");
        assert_eq!(report.verification, "Failed");
        assert!(report.log_summary.is_empty());
    }

    #[test]
    fn completed_report_passes_verification() {
        let mut job = WipeJob::new("/dev/sdx".into(), WipeMethod::Zero, false, true);
        job.status = JobStatus::Completed;
        job.end_time = Some(job.start_time + TimeDelta::seconds(9));
        job.logs.push(LogEntry {
            timestamp: job.start_time,
            message: "Wipe completed successfully!".into(),
        });

        let report = build_report(&job);
        assert_eq!(report.duration, "0:00:09");
        assert_eq!(report.verification, "Passed");
        assert_eq!(report.log_summary, vec!["Wipe completed successfully!"]);
    }
}
