//! jobwrap configuration loaded from `jobwrap.toml`.
//!
//! Every key is optional. Command-line flags and their environment variables
//! (`JOBWRAP_CLUSTER_DIR`, `JOB_ID`) take precedence over the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "jobwrap.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WrapperConfig {
    /// Directory that receives `<job_id>.exit` files.
    #[serde(default = "default_cluster_dir")]
    pub cluster_dir: PathBuf,

    /// Shell used as `<shell> -c <exec_job>`.
    #[serde(default = "default_shell")]
    pub shell: String,

    /// Live job query command.
    #[serde(default = "default_qstat")]
    pub qstat: String,

    /// Finished job accounting command.
    #[serde(default = "default_qacct")]
    pub qacct: String,

    /// Write status files through a temp file and rename instead of appending in place.
    #[serde(default = "default_atomic_write")]
    pub atomic_write: bool,

    /// Log filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_cluster_dir() -> PathBuf {
    PathBuf::from("cluster")
}

fn default_shell() -> String {
    "/bin/sh".to_string()
}

fn default_qstat() -> String {
    "qstat".to_string()
}

fn default_qacct() -> String {
    "qacct".to_string()
}

fn default_atomic_write() -> bool {
    true
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for WrapperConfig {
    fn default() -> Self {
        Self {
            cluster_dir: default_cluster_dir(),
            shell: default_shell(),
            qstat: default_qstat(),
            qacct: default_qacct(),
            atomic_write: default_atomic_write(),
            log_filter: default_log_filter(),
        }
    }
}

impl WrapperConfig {
    /// Loads an explicitly named config file, or `jobwrap.toml` from the
    /// current directory when it exists. An explicit path must exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_file(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }
}
