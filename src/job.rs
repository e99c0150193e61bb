use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, WrapError};

/// Scheduler-assigned job identifier.
///
/// The id is opaque, but it names the status file, so it has to be a plain
/// file name: non-empty, no path separators, not `.` or `..`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JobId(String);

impl JobId {
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        let bad = trimmed.is_empty()
            || trimmed == "."
            || trimmed == ".."
            || trimmed.contains(['/', '\\', '\0']);
        if bad {
            return Err(WrapError::InvalidJobId(raw));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for JobId {
    type Error = WrapError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<JobId> for String {
    fn from(id: JobId) -> Self {
        id.0
    }
}

/// Outcome of one wrapped command, built the moment the child exits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    pub job_id: JobId,
    pub exit_status: i32,
    pub output_dir: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl JobResult {
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }

    pub fn succeeded(&self) -> bool {
        self.exit_status == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn job_id_accepts_scheduler_ids() {
        assert_eq!(JobId::new("123").unwrap().as_str(), "123");
        assert_eq!(JobId::new("4567.1").unwrap().as_str(), "4567.1");
        assert_eq!(JobId::new(" 89\n").unwrap().as_str(), "89");
    }

    #[test]
    fn job_id_rejects_path_like_values() {
        for raw in ["", "   ", ".", "..", "a/b", "..\\x", "nul\0"] {
            assert!(
                matches!(JobId::new(raw), Err(WrapError::InvalidJobId(_))),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn job_id_deserialize_validates() {
        let ok: JobId = serde_json::from_str("\"77\"").unwrap();
        assert_eq!(ok.as_str(), "77");
        assert!(serde_json::from_str::<JobId>("\"../x\"").is_err());
    }

    #[test]
    fn job_result_duration_and_success() {
        let started_at = Utc::now();
        let result = JobResult {
            job_id: JobId::new("1").unwrap(),
            exit_status: 3,
            output_dir: PathBuf::from("/tmp/out"),
            started_at,
            finished_at: started_at + Duration::milliseconds(1500),
        };
        assert_eq!(result.duration_ms(), 1500);
        assert!(!result.succeeded());
    }
}
