mod cli;
mod config;
mod error;
mod job;
mod jobscript;
mod runner;
mod scheduler;
mod status;
mod status_file;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use config::WrapperConfig;
use error::WrapError;
use job::JobId;
use jobscript::JobScript;
use runner::JobRunner;
use scheduler::GridEngine;
use status_file::StatusFile;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match WrapperConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("jobwrap: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config, cli.verbose);

    match dispatch(cli.command, config).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(config: &WrapperConfig, verbose: bool) {
    let filter = match std::env::var("RUST_LOG") {
        Ok(filter) if !filter.is_empty() => filter,
        _ if verbose => "debug".to_string(),
        _ => config.log_filter.clone(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn dispatch(command: Command, config: WrapperConfig) -> Result<ExitCode> {
    let scheduler = GridEngine::new(&config.qstat, &config.qacct);

    match command {
        Command::Run {
            job_id,
            cluster_dir,
            exec_job,
        } => {
            let job_id = JobId::new(job_id.ok_or(WrapError::MissingJobId)?)?;
            let cluster_dir = cluster_dir.unwrap_or(config.cluster_dir);

            let runner = JobRunner::new(job_id, cluster_dir, scheduler)
                .with_shell(config.shell)
                .with_atomic_write(config.atomic_write);
            let result = runner.run(&exec_job.join(" ")).await?;
            tracing::debug!(summary = %serde_json::to_string(&result)?, "Job result");

            // Exit statuses from a shell are 0..=255; anything else is not representable.
            Ok(ExitCode::from(u8::try_from(result.exit_status).unwrap_or(1)))
        }

        Command::Status {
            job_id,
            cluster_dir,
            json,
        } => {
            let job_id = JobId::new(job_id)?;
            let cluster_dir = cluster_dir.unwrap_or(config.cluster_dir);
            let status_file = StatusFile::new(cluster_dir, job_id.clone());

            let report = status::resolve(&job_id, &status_file, &scheduler).await?;
            if json {
                println!("{}", serde_json::to_string(&report)?);
            } else {
                println!("{}", report.state);
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::Jobscript {
            properties,
            cluster_dir,
            exec_job,
        } => {
            let program = std::env::current_exe()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_else(|_| "jobwrap".to_string());
            let script = JobScript {
                properties,
                exec_job: exec_job.join(" "),
                cluster_dir: cluster_dir.unwrap_or(config.cluster_dir),
                program,
            };
            print!("{}", script.render());
            Ok(ExitCode::SUCCESS)
        }
    }
}
