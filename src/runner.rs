use std::os::unix::process::ExitStatusExt;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use chrono::Utc;
use tokio::process::Command;

use crate::error::{Result, WrapError};
use crate::job::{JobId, JobResult};
use crate::scheduler::{Scheduler, usage_lines};
use crate::status_file::StatusFile;

/// Runs one job command and records how it exited.
pub struct JobRunner<S> {
    job_id: JobId,
    output_dir: PathBuf,
    shell: String,
    atomic_write: bool,
    scheduler: S,
}

impl<S: Scheduler> JobRunner<S> {
    pub fn new(job_id: JobId, output_dir: impl Into<PathBuf>, scheduler: S) -> Self {
        Self {
            job_id,
            output_dir: output_dir.into(),
            shell: "/bin/sh".to_string(),
            atomic_write: true,
            scheduler,
        }
    }

    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    pub fn with_atomic_write(mut self, atomic: bool) -> Self {
        self.atomic_write = atomic;
        self
    }

    pub fn status_file(&self) -> StatusFile {
        StatusFile::new(&self.output_dir, self.job_id.clone()).atomic(self.atomic_write)
    }

    /// Executes `exec_job`, prints scheduler usage, then appends the exit
    /// status to the status file.
    ///
    /// The wrapped command failing is not an error: its status is returned in
    /// the [`JobResult`]. Errors are reserved for the wrapper itself (shell
    /// could not be spawned, status file could not be written).
    pub async fn run(&self, exec_job: &str) -> Result<JobResult> {
        tracing::info!(job_id = %self.job_id, "Running job");

        let started_at = Utc::now();
        let exit_status = self.execute(exec_job).await?;
        let result = JobResult {
            job_id: self.job_id.clone(),
            exit_status,
            output_dir: self.output_dir.clone(),
            started_at,
            finished_at: Utc::now(),
        };

        for line in self.usage().await {
            println!("{line}");
        }

        tracing::info!(
            job_id = %self.job_id,
            exit_status,
            success = result.succeeded(),
            duration_ms = result.duration_ms(),
            "Job exited"
        );

        let status_file = self.status_file();
        status_file.append(exit_status)?;
        tracing::debug!(path = %status_file.path().display(), "Exit status recorded");

        Ok(result)
    }

    async fn execute(&self, exec_job: &str) -> Result<i32> {
        tracing::debug!(shell = %self.shell, command = exec_job, "Spawning job shell");

        // A separate child process, but in the wrapper's process group: it keeps
        // the terminal for stdin and receives group-wide signals (Ctrl-C, qdel).
        let status = Command::new(&self.shell)
            .arg("-c")
            .arg(exec_job)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|source| WrapError::Spawn {
                program: self.shell.clone(),
                source,
            })?;

        Ok(exit_code(status))
    }

    /// `usage` lines for this job. Scheduler trouble is logged and yields no
    /// lines; it never stands between the job and its status file.
    pub async fn usage(&self) -> Vec<String> {
        match self.scheduler.job_info(&self.job_id).await {
            Ok(Some(info)) => usage_lines(&info).into_iter().map(String::from).collect(),
            Ok(None) => {
                tracing::warn!(job_id = %self.job_id, "No scheduler record for job usage");
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(job_id = %self.job_id, error = %e, "Scheduler usage query failed");
                Vec::new()
            }
        }
    }
}

/// Exit code the way a shell reports it: signal deaths become `128 + signal`.
fn exit_code(status: ExitStatus) -> i32 {
    match (status.code(), status.signal()) {
        (Some(code), _) => code,
        (None, Some(signal)) => 128 + signal,
        (None, None) => 1,
    }
}
