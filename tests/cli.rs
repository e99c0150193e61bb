//! Drives the built `jobwrap` binary end to end.

use std::fs;
use std::path::{Path, PathBuf};
use std::io::Write;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

const BIN: &str = env!("CARGO_BIN_EXE_jobwrap");

/// Temp workspace with a config whose scheduler commands never touch a cluster.
struct Harness {
    tmp: TempDir,
    config: PathBuf,
}

impl Harness {
    fn new(qstat: &str, qacct: &str) -> Self {
        let tmp = TempDir::new().unwrap();
        let config = tmp.path().join("jobwrap.toml");
        fs::write(
            &config,
            format!("qstat = \"{qstat}\"\nqacct = \"{qacct}\"\n"),
        )
        .unwrap();
        Self { tmp, config }
    }

    fn out_dir(&self) -> PathBuf {
        self.tmp.path().join("out")
    }

    fn jobwrap(&self, args: &[&str]) -> Output {
        Command::new(BIN)
            .arg("--config")
            .arg(&self.config)
            .args(args)
            .env_remove("JOB_ID")
            .env_remove("JOBWRAP_CLUSTER_DIR")
            .env_remove("RUST_LOG")
            .output()
            .unwrap()
    }

    fn run(&self, job_id: &str, exec_job: &str) -> Output {
        let out_dir = self.out_dir();
        self.jobwrap(&[
            "run",
            "--job-id",
            job_id,
            "--cluster-dir",
            out_dir.to_str().unwrap(),
            "--",
            exec_job,
        ])
    }

    fn status(&self, job_id: &str) -> String {
        let out_dir = self.out_dir();
        let out = self.jobwrap(&["status", job_id, "--cluster-dir", out_dir.to_str().unwrap()]);
        assert!(out.status.success());
        String::from_utf8(out.stdout).unwrap().trim().to_string()
    }
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn exit_zero_is_recorded_and_forwarded() {
    let h = Harness::new("false", "false");

    let out = h.run("123", "exit 0");

    assert_eq!(out.status.code(), Some(0));
    assert_eq!(read(&h.out_dir().join("123.exit")), "0\n");
}

#[test]
fn exit_42_is_recorded_and_forwarded() {
    let h = Harness::new("false", "false");

    let out = h.run("123", "exit 42");

    assert_eq!(out.status.code(), Some(42));
    assert_eq!(read(&h.out_dir().join("123.exit")), "42\n");
}

#[test]
fn second_run_appends() {
    let h = Harness::new("false", "false");

    h.run("7", "exit 1");
    h.run("7", "exit 0");

    assert_eq!(read(&h.out_dir().join("7.exit")), "1\n0\n");
}

#[test]
fn missing_scheduler_does_not_block_status_file() {
    let h = Harness::new("/nonexistent/qstat", "/nonexistent/qacct");

    let out = h.run("8", "exit 3");

    assert_eq!(out.status.code(), Some(3));
    assert_eq!(read(&h.out_dir().join("8.exit")), "3\n");
}

#[test]
fn job_reads_wrapper_stdin() {
    let h = Harness::new("false", "false");
    let out_dir = h.out_dir();

    let mut child = Command::new(BIN)
        .arg("--config")
        .arg(&h.config)
        .args(["run", "--job-id", "p1", "--cluster-dir"])
        .arg(&out_dir)
        .args(["--", "read x; test \"$x\" = hello && exit 7"])
        .env_remove("JOB_ID")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(b"hello\n").unwrap();
    let out = child.wait_with_output().unwrap();

    assert_eq!(out.status.code(), Some(7));
    assert_eq!(read(&out_dir.join("p1.exit")), "7\n");
}

#[test]
fn missing_job_id_fails_without_running() {
    let h = Harness::new("false", "false");
    let marker = h.tmp.path().join("ran");

    let out = h.jobwrap(&["run", "--", &format!("touch {}", marker.display())]);

    assert_eq!(out.status.code(), Some(1));
    assert!(!marker.exists());
    assert!(String::from_utf8_lossy(&out.stderr).contains("No job id given"));
}

#[test]
fn status_reads_status_file_then_scheduler() {
    let h = Harness::new("false", "false");

    assert_eq!(h.status("55"), "running");

    h.run("55", "exit 0");
    assert_eq!(h.status("55"), "success");

    h.run("55", "exit 2");
    assert_eq!(h.status("55"), "failed");
}

#[test]
fn jobscript_runs_through_wrapper() {
    let h = Harness::new("false", "false");
    let out_dir = h.out_dir();

    let out = h.jobwrap(&[
        "jobscript",
        "--properties",
        "{\"rule\": \"all\"}",
        "--cluster-dir",
        out_dir.to_str().unwrap(),
        "--",
        "echo 'quoted' >/dev/null; exit 6",
    ]);
    assert!(out.status.success());
    let script = String::from_utf8(out.stdout).unwrap();
    assert!(script.starts_with("#!/bin/sh\n# properties = {\"rule\": \"all\"}\n"));

    // The cluster dir is baked into the script; the test config is not.
    let script = script.replace(" run ", &format!(" --config '{}' run ", h.config.display()));
    let status = Command::new("/bin/sh")
        .arg("-c")
        .arg(&script)
        .env("JOB_ID", "66")
        .status()
        .unwrap();

    assert_eq!(status.code(), Some(6));
    assert_eq!(read(&out_dir.join("66.exit")), "6\n");
}
