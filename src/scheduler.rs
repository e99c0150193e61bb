//! Grid Engine query commands (`qstat -j`, `qacct -j`) and their output parsers.
//!
//! [`Scheduler`] is the seam the runner and the status query depend on, so both
//! can be exercised without a cluster. [`GridEngine`] shells out to the real
//! commands.

use std::collections::HashMap;
use std::process::Stdio;

use tokio::process::Command;

use crate::error::{Result, WrapError};
use crate::job::JobId;

/// Read-only access to scheduler bookkeeping for one job.
///
/// Both queries return `Ok(None)` when the command ran but exited non-zero,
/// which is how Grid Engine reports a job id it does not (or no longer) know.
pub trait Scheduler {
    /// Live job record, `qstat -j <job_id>`.
    async fn job_info(&self, job_id: &JobId) -> Result<Option<String>>;

    /// Finished job record, `qacct -j <job_id>`.
    async fn accounting(&self, job_id: &JobId) -> Result<Option<String>>;
}

#[derive(Debug, Clone)]
pub struct GridEngine {
    qstat: String,
    qacct: String,
}

impl GridEngine {
    pub fn new(qstat: impl Into<String>, qacct: impl Into<String>) -> Self {
        Self {
            qstat: qstat.into(),
            qacct: qacct.into(),
        }
    }

    async fn query(program: &str, job_id: &JobId) -> Result<Option<String>> {
        tracing::debug!(program, job_id = %job_id, "Querying scheduler");

        let output = Command::new(program)
            .arg("-j")
            .arg(job_id.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| WrapError::Spawn {
                program: program.to_string(),
                source,
            })?;

        if !output.status.success() {
            tracing::debug!(
                program,
                job_id = %job_id,
                code = ?output.status.code(),
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "Scheduler has no record"
            );
            return Ok(None);
        }

        Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned()))
    }
}

impl Scheduler for GridEngine {
    async fn job_info(&self, job_id: &JobId) -> Result<Option<String>> {
        Self::query(&self.qstat, job_id).await
    }

    async fn accounting(&self, job_id: &JobId) -> Result<Option<String>> {
        Self::query(&self.qacct, job_id).await
    }
}

/// Resource usage lines of a `qstat -j` report, verbatim.
pub fn usage_lines(job_info: &str) -> Vec<&str> {
    job_info
        .lines()
        .filter(|line| line.starts_with("usage"))
        .collect()
}

/// Value of the `job_state:` line of a `qstat -j` report, e.g. `r` or `Eqw`.
pub fn parse_job_state(job_info: &str) -> Option<&str> {
    job_info
        .lines()
        .filter(|line| line.starts_with("job_state"))
        .filter_map(|line| line.split(':').nth(1))
        .map(str::trim)
        .last()
}

/// Key/value pairs of a `qacct -j` report. Lines without a value are skipped;
/// a key seen twice keeps its last value.
pub fn parse_accounting(report: &str) -> HashMap<&str, &str> {
    report
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            let (key, value) = line.split_once(char::is_whitespace)?;
            let value = value.trim();
            (!value.is_empty()).then_some((key, value))
        })
        .collect()
}
