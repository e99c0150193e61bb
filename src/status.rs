//! Job state as reported to the workflow engine: `running`, `success` or `failed`.

use std::fmt;

use serde::Serialize;

use crate::error::Result;
use crate::job::JobId;
use crate::scheduler::{Scheduler, parse_accounting, parse_job_state};
use crate::status_file::StatusFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Running,
    Success,
    Failed,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Running => write!(f, "running"),
            JobState::Success => write!(f, "success"),
            JobState::Failed => write!(f, "failed"),
        }
    }
}

impl JobState {
    fn from_exit_status(code: i32) -> Self {
        if code == 0 {
            JobState::Success
        } else {
            JobState::Failed
        }
    }
}

/// Where a [`JobState`] verdict came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StateSource {
    StatusFile,
    Qstat,
    Qacct,
    /// Neither the status file nor the scheduler knows the job.
    Unknown,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub job_id: JobId,
    pub state: JobState,
    pub source: StateSource,
}

/// Classifies a job, trying in order:
///
/// 1. the wrapper's own status file (last recorded exit status),
/// 2. `qstat -j` (an `E` in `job_state` means the job errored),
/// 3. `qacct -j` (success needs both `failed` and `exit_status` to be `0`).
///
/// A job none of them knows is reported as running; it is most likely between
/// leaving `qstat` and showing up in `qacct`.
pub async fn resolve(
    job_id: &JobId,
    status_file: &StatusFile,
    scheduler: &impl Scheduler,
) -> Result<StatusReport> {
    let report = |state, source| StatusReport {
        job_id: job_id.clone(),
        state,
        source,
    };

    if let Some(code) = status_file.last()? {
        return Ok(report(JobState::from_exit_status(code), StateSource::StatusFile));
    }

    if let Some(info) = scheduler.job_info(job_id).await? {
        let state = match parse_job_state(&info) {
            Some(s) if s.contains('E') => JobState::Failed,
            _ => JobState::Running,
        };
        return Ok(report(state, StateSource::Qstat));
    }

    if let Some(acct) = scheduler.accounting(job_id).await? {
        let props = parse_accounting(&acct);
        let failed = props.get("failed").copied().unwrap_or("1");
        let exit_status = props.get("exit_status").copied().unwrap_or("1");
        let state = if failed == "0" && exit_status == "0" {
            JobState::Success
        } else {
            JobState::Failed
        };
        return Ok(report(state, StateSource::Qacct));
    }

    tracing::debug!(job_id = %job_id, "Job unknown to scheduler, assuming transition");
    Ok(report(JobState::Running, StateSource::Unknown))
}
