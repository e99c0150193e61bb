//! Command line of jobwrap.
//!
//! [`Cli`] carries the global flags (`--config`, `--verbose`) and one
//! [`Command`]: `run`, `status` or `jobscript`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Runs cluster jobs and records their exit status for workflow engines.
#[derive(Debug, Parser)]
#[command(name = "jobwrap", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Config file (defaults to ./jobwrap.toml when present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a command and record its exit status in <cluster-dir>/<job-id>.exit.
    Run {
        /// Scheduler job id.
        #[arg(long, env = "JOB_ID")]
        job_id: Option<String>,

        /// Directory for the status file.
        #[arg(long, env = "JOBWRAP_CLUSTER_DIR")]
        cluster_dir: Option<PathBuf>,

        /// Command to run; multiple words are joined with spaces.
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        exec_job: Vec<String>,
    },

    /// Print `running`, `success` or `failed` for a job.
    Status {
        /// Scheduler job id.
        job_id: String,

        /// Directory holding status files.
        #[arg(long, env = "JOBWRAP_CLUSTER_DIR")]
        cluster_dir: Option<PathBuf>,

        /// Print a JSON report instead of the bare state.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Print a job script that runs a command through `jobwrap run`.
    Jobscript {
        /// Job properties to embed as a comment.
        #[arg(long, default_value = "{}")]
        properties: String,

        /// Directory for the status file.
        #[arg(long, env = "JOBWRAP_CLUSTER_DIR")]
        cluster_dir: Option<PathBuf>,

        /// Command the job script runs.
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        exec_job: Vec<String>,
    },
}
